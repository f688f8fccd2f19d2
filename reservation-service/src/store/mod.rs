//! Transactional access to the reservation tables.
//!
//! Every service operation runs inside [`Store::transaction`], receiving a
//! [`Ledger`] bound to a single database transaction. Check-then-mutate
//! sequences therefore commit or roll back as one unit, and row locks taken
//! through the `lock_*` methods serialize concurrent requests on the same slot
//! or user.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

#[cfg(test)]
pub mod memory;
pub mod postgres;

#[async_trait]
pub trait UserDirectory: Send {
    async fn list_users(&mut self) -> Result<Vec<User>>;
    async fn find_user(&mut self, id: Uuid) -> Result<Option<User>>;
    async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>>;
    /// Loads the user and holds a row lock until the transaction ends.
    async fn lock_user(&mut self, id: Uuid) -> Result<Option<User>>;
    async fn lock_user_by_username(&mut self, username: &str) -> Result<Option<User>>;
    async fn username_taken(&mut self, username: &str, except: Option<Uuid>) -> Result<bool>;
    async fn email_taken(&mut self, email: &str, except: Option<Uuid>) -> Result<bool>;
    async fn insert_user(&mut self, user: NewUser) -> Result<User>;
    async fn update_user(&mut self, id: Uuid, changes: UserChanges) -> Result<Option<User>>;
}

#[async_trait]
pub trait SlotLedger: Send {
    async fn list_slots(&mut self) -> Result<Vec<Slot>>;
    async fn find_slot(&mut self, id: Uuid) -> Result<Option<Slot>>;
    /// Loads the slot and holds a row lock until the transaction ends.
    async fn lock_slot(&mut self, id: Uuid) -> Result<Option<Slot>>;
    async fn slot_range_taken(
        &mut self,
        slot_from: NaiveTime,
        slot_to: NaiveTime,
        except: Option<Uuid>,
    ) -> Result<bool>;
    async fn insert_slot(&mut self, slot: NewSlot) -> Result<Slot>;
    async fn update_slot(&mut self, id: Uuid, changes: SlotChanges) -> Result<Option<Slot>>;
    async fn set_occupancy(&mut self, id: Uuid, current_reservations: i32) -> Result<Slot>;
    async fn delete_slot(&mut self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait ReservationLedger: Send {
    /// Loads the reservation and holds a row lock until the transaction ends.
    async fn lock_reservation(&mut self, id: Uuid) -> Result<Option<Reservation>>;
    async fn reservation_detail(&mut self, id: Uuid) -> Result<Option<ReservationDetail>>;
    /// Reservations in insertion order, optionally restricted to one owner.
    async fn list_reservations(&mut self, owner: Option<Uuid>) -> Result<Vec<ReservationDetail>>;
    async fn has_reservation_on(
        &mut self,
        user_id: Uuid,
        date: NaiveDate,
        except: Option<Uuid>,
    ) -> Result<bool>;
    async fn slot_has_reservations(&mut self, slot_id: Uuid) -> Result<bool>;
    async fn insert_reservation(&mut self, reservation: NewReservation) -> Result<Reservation>;
    async fn update_reservation(
        &mut self,
        id: Uuid,
        changes: ReservationChanges,
    ) -> Result<Reservation>;
    async fn delete_reservation(&mut self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait OpeningHoursCatalog: Send {
    async fn list_opening_hours(&mut self) -> Result<Vec<OpeningHours>>;
    async fn find_opening_hours(&mut self, id: Uuid) -> Result<Option<OpeningHours>>;
    async fn find_opening_hours_by_day(&mut self, day: &str) -> Result<Option<OpeningHours>>;
    async fn day_taken(&mut self, day: &str, except: Option<Uuid>) -> Result<bool>;
    async fn insert_opening_hours(&mut self, hours: NewOpeningHours) -> Result<OpeningHours>;
    async fn update_opening_hours(
        &mut self,
        id: Uuid,
        changes: OpeningHoursChanges,
    ) -> Result<Option<OpeningHours>>;
    async fn delete_opening_hours(&mut self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait EventCatalog: Send {
    /// Active events by event date (newest first), or every event by creation time (newest first).
    async fn list_events(&mut self, active_only: bool) -> Result<Vec<Event>>;
    async fn find_event(&mut self, id: Uuid) -> Result<Option<Event>>;
    async fn insert_event(&mut self, event: NewEvent) -> Result<Event>;
    async fn update_event(&mut self, id: Uuid, changes: EventChanges) -> Result<Option<Event>>;
    async fn delete_event(&mut self, id: Uuid) -> Result<bool>;
}

pub trait Ledger:
    UserDirectory + SlotLedger + ReservationLedger + OpeningHoursCatalog + EventCatalog + Send
{
}

impl<T> Ledger for T where
    T: UserDirectory + SlotLedger + ReservationLedger + OpeningHoursCatalog + EventCatalog + Send
{
}

#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Runs `f` inside one transaction. An `Err` from `f` rolls back everything it wrote.
    async fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: for<'r> FnOnce(&'r mut dyn Ledger) -> BoxFuture<'r, Result<T>> + Send + 'static;
}
