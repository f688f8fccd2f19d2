use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use diesel::prelude::*;
use diesel_async::{pooled_connection::bb8::Pool, AsyncConnection, AsyncPgConnection, RunQueryDsl};
use futures::future::BoxFuture;
use uuid::Uuid;

use super::{
    EventCatalog, Ledger, OpeningHoursCatalog, ReservationLedger, SlotLedger, Store, UserDirectory,
};
use crate::error::{AppError, Resource, Result};
use crate::models::*;
use crate::schema::*;

pub type DbPool = Pool<AsyncPgConnection>;

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: for<'r> FnOnce(&'r mut dyn Ledger) -> BoxFuture<'r, Result<T>> + Send + 'static,
    {
        let mut pooled = self.pool.get().await?;
        let conn: &mut AsyncPgConnection = &mut pooled;

        conn.transaction::<T, AppError, _>(|conn| {
            Box::pin(async move {
                let ledger: &mut dyn Ledger = conn;
                f(ledger).await
            })
        })
        .await
    }
}

// Nil never matches a generated id, so it stands in for "exclude nothing".
fn excluded(except: Option<Uuid>) -> Uuid {
    except.unwrap_or_else(Uuid::nil)
}

#[async_trait]
impl UserDirectory for AsyncPgConnection {
    async fn list_users(&mut self) -> Result<Vec<User>> {
        Ok(users::table
            .order(users::created_at.asc())
            .select(User::as_select())
            .load(self)
            .await?)
    }

    async fn find_user(&mut self, id: Uuid) -> Result<Option<User>> {
        Ok(users::table
            .find(id)
            .select(User::as_select())
            .get_result(self)
            .await
            .optional()?)
    }

    async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>> {
        Ok(users::table
            .filter(users::username.eq(username))
            .select(User::as_select())
            .get_result(self)
            .await
            .optional()?)
    }

    async fn lock_user(&mut self, id: Uuid) -> Result<Option<User>> {
        Ok(users::table
            .find(id)
            .select(User::as_select())
            .for_update()
            .get_result(self)
            .await
            .optional()?)
    }

    async fn lock_user_by_username(&mut self, username: &str) -> Result<Option<User>> {
        Ok(users::table
            .filter(users::username.eq(username))
            .select(User::as_select())
            .for_update()
            .get_result(self)
            .await
            .optional()?)
    }

    async fn username_taken(&mut self, username: &str, except: Option<Uuid>) -> Result<bool> {
        let count: i64 = users::table
            .filter(users::username.eq(username))
            .filter(users::id.ne(excluded(except)))
            .count()
            .get_result(self)
            .await?;
        Ok(count > 0)
    }

    async fn email_taken(&mut self, email: &str, except: Option<Uuid>) -> Result<bool> {
        let count: i64 = users::table
            .filter(users::email.eq(email))
            .filter(users::id.ne(excluded(except)))
            .count()
            .get_result(self)
            .await?;
        Ok(count > 0)
    }

    async fn insert_user(&mut self, user: NewUser) -> Result<User> {
        Ok(diesel::insert_into(users::table)
            .values(&user)
            .returning(User::as_returning())
            .get_result(self)
            .await?)
    }

    async fn update_user(&mut self, id: Uuid, changes: UserChanges) -> Result<Option<User>> {
        Ok(diesel::update(users::table.find(id))
            .set(&changes)
            .returning(User::as_returning())
            .get_result(self)
            .await
            .optional()?)
    }
}

#[async_trait]
impl SlotLedger for AsyncPgConnection {
    async fn list_slots(&mut self) -> Result<Vec<Slot>> {
        Ok(reservation_slots::table
            .order((reservation_slots::slot_from.asc(), reservation_slots::slot_to.asc()))
            .select(Slot::as_select())
            .load(self)
            .await?)
    }

    async fn find_slot(&mut self, id: Uuid) -> Result<Option<Slot>> {
        Ok(reservation_slots::table
            .find(id)
            .select(Slot::as_select())
            .get_result(self)
            .await
            .optional()?)
    }

    async fn lock_slot(&mut self, id: Uuid) -> Result<Option<Slot>> {
        Ok(reservation_slots::table
            .find(id)
            .select(Slot::as_select())
            .for_update()
            .get_result(self)
            .await
            .optional()?)
    }

    async fn slot_range_taken(
        &mut self,
        slot_from: NaiveTime,
        slot_to: NaiveTime,
        except: Option<Uuid>,
    ) -> Result<bool> {
        let count: i64 = reservation_slots::table
            .filter(reservation_slots::slot_from.eq(slot_from))
            .filter(reservation_slots::slot_to.eq(slot_to))
            .filter(reservation_slots::id.ne(excluded(except)))
            .count()
            .get_result(self)
            .await?;
        Ok(count > 0)
    }

    async fn insert_slot(&mut self, slot: NewSlot) -> Result<Slot> {
        Ok(diesel::insert_into(reservation_slots::table)
            .values(&slot)
            .returning(Slot::as_returning())
            .get_result(self)
            .await?)
    }

    async fn update_slot(&mut self, id: Uuid, changes: SlotChanges) -> Result<Option<Slot>> {
        Ok(diesel::update(reservation_slots::table.find(id))
            .set(&changes)
            .returning(Slot::as_returning())
            .get_result(self)
            .await
            .optional()?)
    }

    async fn set_occupancy(&mut self, id: Uuid, current_reservations: i32) -> Result<Slot> {
        diesel::update(reservation_slots::table.find(id))
            .set(reservation_slots::current_reservations.eq(current_reservations))
            .returning(Slot::as_returning())
            .get_result(self)
            .await
            .optional()?
            .ok_or(AppError::NotFound(Resource::Slot))
    }

    async fn delete_slot(&mut self, id: Uuid) -> Result<bool> {
        let deleted = diesel::delete(reservation_slots::table.find(id))
            .execute(self)
            .await?;
        Ok(deleted > 0)
    }
}

type DetailRow = (Reservation, Slot, String);

fn into_detail((reservation, slot, username): DetailRow) -> ReservationDetail {
    ReservationDetail {
        reservation,
        slot,
        username,
    }
}

#[async_trait]
impl ReservationLedger for AsyncPgConnection {
    async fn lock_reservation(&mut self, id: Uuid) -> Result<Option<Reservation>> {
        Ok(reservations::table
            .find(id)
            .select(Reservation::as_select())
            .for_update()
            .get_result(self)
            .await
            .optional()?)
    }

    async fn reservation_detail(&mut self, id: Uuid) -> Result<Option<ReservationDetail>> {
        let row = reservations::table
            .inner_join(reservation_slots::table)
            .inner_join(users::table)
            .filter(reservations::id.eq(id))
            .select((Reservation::as_select(), Slot::as_select(), users::username))
            .get_result::<DetailRow>(self)
            .await
            .optional()?;
        Ok(row.map(into_detail))
    }

    async fn list_reservations(&mut self, owner: Option<Uuid>) -> Result<Vec<ReservationDetail>> {
        let mut query = reservations::table
            .inner_join(reservation_slots::table)
            .inner_join(users::table)
            .select((Reservation::as_select(), Slot::as_select(), users::username))
            .order((reservations::created_at.asc(), reservations::id.asc()))
            .into_boxed();
        if let Some(owner) = owner {
            query = query.filter(reservations::user_id.eq(owner));
        }
        let rows = query.load::<DetailRow>(self).await?;
        Ok(rows.into_iter().map(into_detail).collect())
    }

    async fn has_reservation_on(
        &mut self,
        user_id: Uuid,
        date: NaiveDate,
        except: Option<Uuid>,
    ) -> Result<bool> {
        let count: i64 = reservations::table
            .filter(reservations::user_id.eq(user_id))
            .filter(reservations::reservation_date.eq(date))
            .filter(reservations::id.ne(excluded(except)))
            .count()
            .get_result(self)
            .await?;
        Ok(count > 0)
    }

    async fn slot_has_reservations(&mut self, slot_id: Uuid) -> Result<bool> {
        let count: i64 = reservations::table
            .filter(reservations::slot_id.eq(slot_id))
            .count()
            .get_result(self)
            .await?;
        Ok(count > 0)
    }

    async fn insert_reservation(&mut self, reservation: NewReservation) -> Result<Reservation> {
        Ok(diesel::insert_into(reservations::table)
            .values(&reservation)
            .returning(Reservation::as_returning())
            .get_result(self)
            .await?)
    }

    async fn update_reservation(
        &mut self,
        id: Uuid,
        changes: ReservationChanges,
    ) -> Result<Reservation> {
        diesel::update(reservations::table.find(id))
            .set(&changes)
            .returning(Reservation::as_returning())
            .get_result(self)
            .await
            .optional()?
            .ok_or(AppError::NotFound(Resource::Reservation))
    }

    async fn delete_reservation(&mut self, id: Uuid) -> Result<bool> {
        let deleted = diesel::delete(reservations::table.find(id))
            .execute(self)
            .await?;
        Ok(deleted > 0)
    }
}

#[async_trait]
impl OpeningHoursCatalog for AsyncPgConnection {
    async fn list_opening_hours(&mut self) -> Result<Vec<OpeningHours>> {
        Ok(opening_hours::table
            .select(OpeningHours::as_select())
            .load(self)
            .await?)
    }

    async fn find_opening_hours(&mut self, id: Uuid) -> Result<Option<OpeningHours>> {
        Ok(opening_hours::table
            .find(id)
            .select(OpeningHours::as_select())
            .get_result(self)
            .await
            .optional()?)
    }

    async fn find_opening_hours_by_day(&mut self, day: &str) -> Result<Option<OpeningHours>> {
        Ok(opening_hours::table
            .filter(opening_hours::day_of_week.eq(day))
            .select(OpeningHours::as_select())
            .get_result(self)
            .await
            .optional()?)
    }

    async fn day_taken(&mut self, day: &str, except: Option<Uuid>) -> Result<bool> {
        let count: i64 = opening_hours::table
            .filter(opening_hours::day_of_week.eq(day))
            .filter(opening_hours::id.ne(excluded(except)))
            .count()
            .get_result(self)
            .await?;
        Ok(count > 0)
    }

    async fn insert_opening_hours(&mut self, hours: NewOpeningHours) -> Result<OpeningHours> {
        Ok(diesel::insert_into(opening_hours::table)
            .values(&hours)
            .returning(OpeningHours::as_returning())
            .get_result(self)
            .await?)
    }

    async fn update_opening_hours(
        &mut self,
        id: Uuid,
        changes: OpeningHoursChanges,
    ) -> Result<Option<OpeningHours>> {
        Ok(diesel::update(opening_hours::table.find(id))
            .set(&changes)
            .returning(OpeningHours::as_returning())
            .get_result(self)
            .await
            .optional()?)
    }

    async fn delete_opening_hours(&mut self, id: Uuid) -> Result<bool> {
        let deleted = diesel::delete(opening_hours::table.find(id))
            .execute(self)
            .await?;
        Ok(deleted > 0)
    }
}

#[async_trait]
impl EventCatalog for AsyncPgConnection {
    async fn list_events(&mut self, active_only: bool) -> Result<Vec<Event>> {
        let rows = if active_only {
            events::table
                .filter(events::is_active.eq(true))
                .order(events::event_date.desc())
                .select(Event::as_select())
                .load(self)
                .await?
        } else {
            events::table
                .order(events::created_at.desc())
                .select(Event::as_select())
                .load(self)
                .await?
        };
        Ok(rows)
    }

    async fn find_event(&mut self, id: Uuid) -> Result<Option<Event>> {
        Ok(events::table
            .find(id)
            .select(Event::as_select())
            .get_result(self)
            .await
            .optional()?)
    }

    async fn insert_event(&mut self, event: NewEvent) -> Result<Event> {
        Ok(diesel::insert_into(events::table)
            .values(&event)
            .returning(Event::as_returning())
            .get_result(self)
            .await?)
    }

    async fn update_event(&mut self, id: Uuid, changes: EventChanges) -> Result<Option<Event>> {
        Ok(diesel::update(events::table.find(id))
            .set(&changes)
            .returning(Event::as_returning())
            .get_result(self)
            .await
            .optional()?)
    }

    async fn delete_event(&mut self, id: Uuid) -> Result<bool> {
        let deleted = diesel::delete(events::table.find(id))
            .execute(self)
            .await?;
        Ok(deleted > 0)
    }
}
