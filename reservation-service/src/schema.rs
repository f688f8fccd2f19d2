diesel::table! {
    events (id) {
        id -> Uuid,
        title -> Varchar,
        description -> Nullable<Text>,
        photo_url -> Nullable<Text>,
        event_date -> Date,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    opening_hours (id) {
        id -> Uuid,
        day_of_week -> Varchar,
        open_time -> Time,
        close_time -> Time,
        is_open -> Bool,
        note -> Nullable<Text>,
    }
}

diesel::table! {
    reservation_slots (id) {
        id -> Uuid,
        slot_from -> Time,
        slot_to -> Time,
        active -> Bool,
        max_reservations -> Int4,
        current_reservations -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    reservations (id) {
        id -> Uuid,
        user_id -> Uuid,
        slot_id -> Uuid,
        reservation_date -> Date,
        guest_count -> Int4,
        status -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    users (id) {
        id -> Uuid,
        username -> Varchar,
        email -> Varchar,
        password_hash -> Varchar,
        enabled -> Bool,
        roles -> Array<Text>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(reservations -> reservation_slots (slot_id));
diesel::joinable!(reservations -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    events,
    opening_hours,
    reservation_slots,
    reservations,
    users,
);
