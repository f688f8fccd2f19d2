use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use diesel::prelude::*;
use shared::{
    DayOfWeek, EventView, OpeningHoursView, ReservationView, SlotView, UserView, ROLE_ADMIN,
};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = crate::schema::users)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub enabled: bool,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub enabled: bool,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = crate::schema::users)]
pub struct UserChanges {
    pub username: String,
    pub email: String,
    pub enabled: bool,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = crate::schema::reservation_slots)]
pub struct Slot {
    pub id: Uuid,
    pub slot_from: NaiveTime,
    pub slot_to: NaiveTime,
    pub active: bool,
    pub max_reservations: i32,
    pub current_reservations: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::reservation_slots)]
pub struct NewSlot {
    pub id: Uuid,
    pub slot_from: NaiveTime,
    pub slot_to: NaiveTime,
    pub active: bool,
    pub max_reservations: i32,
    pub current_reservations: i32,
    pub created_at: DateTime<Utc>,
}

// No current_reservations here: only the admission path writes the counter.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = crate::schema::reservation_slots)]
pub struct SlotChanges {
    pub slot_from: NaiveTime,
    pub slot_to: NaiveTime,
    pub active: bool,
    pub max_reservations: i32,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = crate::schema::reservations)]
pub struct Reservation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub slot_id: Uuid,
    pub reservation_date: NaiveDate,
    pub guest_count: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::reservations)]
pub struct NewReservation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub slot_id: Uuid,
    pub reservation_date: NaiveDate,
    pub guest_count: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = crate::schema::reservations)]
pub struct ReservationChanges {
    pub slot_id: Uuid,
    pub reservation_date: NaiveDate,
    pub guest_count: i32,
    pub status: String,
}

/// A reservation joined with its slot window and owner name.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationDetail {
    pub reservation: Reservation,
    pub slot: Slot,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = crate::schema::opening_hours)]
pub struct OpeningHours {
    pub id: Uuid,
    pub day_of_week: String,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
    pub is_open: bool,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::opening_hours)]
pub struct NewOpeningHours {
    pub id: Uuid,
    pub day_of_week: String,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
    pub is_open: bool,
    pub note: Option<String>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = crate::schema::opening_hours, treat_none_as_null = true)]
pub struct OpeningHoursChanges {
    pub day_of_week: String,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
    pub is_open: bool,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = crate::schema::events)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub event_date: NaiveDate,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::events)]
pub struct NewEvent {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub event_date: NaiveDate,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = crate::schema::events)]
pub struct EventChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        let mut roles = user.roles.clone();
        roles.sort();
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            enabled: user.enabled,
            roles,
        }
    }
}

impl From<&Slot> for SlotView {
    fn from(slot: &Slot) -> Self {
        Self {
            id: slot.id,
            slot_from: slot.slot_from,
            slot_to: slot.slot_to,
            active: slot.active,
            max_reservations: slot.max_reservations,
            current_reservations: slot.current_reservations,
        }
    }
}

impl From<&ReservationDetail> for ReservationView {
    fn from(detail: &ReservationDetail) -> Self {
        Self {
            id: detail.reservation.id,
            reservation_id: detail.reservation.id,
            username: detail.username.clone(),
            slot_id: detail.slot.id,
            slot_from: detail.slot.slot_from,
            slot_to: detail.slot.slot_to,
            reservation_date: detail.reservation.reservation_date,
            date: detail.reservation.reservation_date,
            guest_count: detail.reservation.guest_count,
            status: detail.reservation.status.clone(),
        }
    }
}

impl From<&Event> for EventView {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id,
            title: event.title.clone(),
            description: event.description.clone(),
            photo_url: event.photo_url.clone(),
            event_date: event.event_date,
            is_active: event.is_active,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}

impl TryFrom<&OpeningHours> for OpeningHoursView {
    type Error = AppError;

    fn try_from(hours: &OpeningHours) -> Result<Self, Self::Error> {
        let day_of_week = hours
            .day_of_week
            .parse::<DayOfWeek>()
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(Self {
            id: hours.id,
            day_of_week,
            open_time: hours.open_time,
            close_time: hours.close_time,
            is_open: hours.is_open,
            note: hours.note.clone(),
        })
    }
}
