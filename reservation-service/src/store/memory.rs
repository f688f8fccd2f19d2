//! In-memory store for tests.
//!
//! A transaction works on a clone of the committed state and swaps it in only
//! when the closure succeeds, so rollback behaves like the database. The
//! constraints the migrations declare are mirrored here.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    EventCatalog, Ledger, OpeningHoursCatalog, ReservationLedger, SlotLedger, Store, UserDirectory,
};
use crate::auth::hash_password;
use crate::error::{AppError, ConflictKind, Resource, Result};
use crate::models::*;

#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    pub users: Vec<User>,
    pub slots: Vec<Slot>,
    pub reservations: Vec<Reservation>,
    pub opening_hours: Vec<OpeningHours>,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryLedger>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> MemoryLedger {
        self.state.lock().await.clone()
    }

    pub async fn slot(&self, id: Uuid) -> Slot {
        self.snapshot()
            .await
            .slots
            .into_iter()
            .find(|s| s.id == id)
            .expect("slot exists")
    }

    pub async fn seed_user(&self, username: &str, password: &str, roles: &[&str]) -> User {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: hash_password(password).expect("hash password"),
            enabled: true,
            roles: roles.iter().map(|r| r.to_string()).collect(),
            created_at: Utc::now(),
        };
        self.state.lock().await.users.push(user.clone());
        user
    }

    pub async fn seed_slot(&self, from: u32, to: u32, max_reservations: i32) -> Slot {
        let slot = Slot {
            id: Uuid::new_v4(),
            slot_from: NaiveTime::from_hms_opt(from, 0, 0).expect("valid hour"),
            slot_to: NaiveTime::from_hms_opt(to, 0, 0).expect("valid hour"),
            active: true,
            max_reservations,
            current_reservations: 0,
            created_at: Utc::now(),
        };
        self.state.lock().await.slots.push(slot.clone());
        slot
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: for<'r> FnOnce(&'r mut dyn Ledger) -> BoxFuture<'r, Result<T>> + Send + 'static,
    {
        let mut committed = self.state.lock().await;
        let mut working = committed.clone();
        let ledger: &mut dyn Ledger = &mut working;
        let output = f(ledger).await?;
        *committed = working;
        Ok(output)
    }
}

impl MemoryLedger {
    fn detail(&self, reservation: &Reservation) -> Option<ReservationDetail> {
        let slot = self.slots.iter().find(|s| s.id == reservation.slot_id)?;
        let user = self.users.iter().find(|u| u.id == reservation.user_id)?;
        Some(ReservationDetail {
            reservation: reservation.clone(),
            slot: slot.clone(),
            username: user.username.clone(),
        })
    }
}

#[async_trait]
impl UserDirectory for MemoryLedger {
    async fn list_users(&mut self) -> Result<Vec<User>> {
        Ok(self.users.clone())
    }

    async fn find_user(&mut self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>> {
        Ok(self.users.iter().find(|u| u.username == username).cloned())
    }

    async fn lock_user(&mut self, id: Uuid) -> Result<Option<User>> {
        self.find_user(id).await
    }

    async fn lock_user_by_username(&mut self, username: &str) -> Result<Option<User>> {
        self.find_user_by_username(username).await
    }

    async fn username_taken(&mut self, username: &str, except: Option<Uuid>) -> Result<bool> {
        Ok(self
            .users
            .iter()
            .any(|u| u.username == username && Some(u.id) != except))
    }

    async fn email_taken(&mut self, email: &str, except: Option<Uuid>) -> Result<bool> {
        Ok(self
            .users
            .iter()
            .any(|u| u.email == email && Some(u.id) != except))
    }

    async fn insert_user(&mut self, user: NewUser) -> Result<User> {
        if self.username_taken(&user.username, None).await? {
            return Err(AppError::Conflict(ConflictKind::UsernameTaken));
        }
        if self.email_taken(&user.email, None).await? {
            return Err(AppError::Conflict(ConflictKind::EmailTaken));
        }
        let user = User {
            id: user.id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            enabled: user.enabled,
            roles: user.roles,
            created_at: user.created_at,
        };
        self.users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&mut self, id: Uuid, changes: UserChanges) -> Result<Option<User>> {
        let Some(user) = self.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        user.username = changes.username;
        user.email = changes.email;
        user.enabled = changes.enabled;
        user.roles = changes.roles;
        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl SlotLedger for MemoryLedger {
    async fn list_slots(&mut self) -> Result<Vec<Slot>> {
        let mut slots = self.slots.clone();
        slots.sort_by_key(|s| (s.slot_from, s.slot_to));
        Ok(slots)
    }

    async fn find_slot(&mut self, id: Uuid) -> Result<Option<Slot>> {
        Ok(self.slots.iter().find(|s| s.id == id).cloned())
    }

    async fn lock_slot(&mut self, id: Uuid) -> Result<Option<Slot>> {
        self.find_slot(id).await
    }

    async fn slot_range_taken(
        &mut self,
        slot_from: NaiveTime,
        slot_to: NaiveTime,
        except: Option<Uuid>,
    ) -> Result<bool> {
        Ok(self
            .slots
            .iter()
            .any(|s| s.slot_from == slot_from && s.slot_to == slot_to && Some(s.id) != except))
    }

    async fn insert_slot(&mut self, slot: NewSlot) -> Result<Slot> {
        if self.slot_range_taken(slot.slot_from, slot.slot_to, None).await? {
            return Err(AppError::Conflict(ConflictKind::DuplicateSlot));
        }
        let slot = Slot {
            id: slot.id,
            slot_from: slot.slot_from,
            slot_to: slot.slot_to,
            active: slot.active,
            max_reservations: slot.max_reservations,
            current_reservations: slot.current_reservations,
            created_at: slot.created_at,
        };
        self.slots.push(slot.clone());
        Ok(slot)
    }

    async fn update_slot(&mut self, id: Uuid, changes: SlotChanges) -> Result<Option<Slot>> {
        let Some(slot) = self.slots.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        slot.slot_from = changes.slot_from;
        slot.slot_to = changes.slot_to;
        slot.active = changes.active;
        slot.max_reservations = changes.max_reservations;
        Ok(Some(slot.clone()))
    }

    async fn set_occupancy(&mut self, id: Uuid, current_reservations: i32) -> Result<Slot> {
        let slot = self
            .slots
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(AppError::NotFound(Resource::Slot))?;
        if current_reservations < 0 || current_reservations > slot.max_reservations {
            return Err(AppError::Conflict(ConflictKind::SlotFull));
        }
        slot.current_reservations = current_reservations;
        Ok(slot.clone())
    }

    async fn delete_slot(&mut self, id: Uuid) -> Result<bool> {
        if self.reservations.iter().any(|r| r.slot_id == id) {
            return Err(AppError::Conflict(ConflictKind::SlotInUse));
        }
        let before = self.slots.len();
        self.slots.retain(|s| s.id != id);
        Ok(self.slots.len() < before)
    }
}

#[async_trait]
impl ReservationLedger for MemoryLedger {
    async fn lock_reservation(&mut self, id: Uuid) -> Result<Option<Reservation>> {
        Ok(self.reservations.iter().find(|r| r.id == id).cloned())
    }

    async fn reservation_detail(&mut self, id: Uuid) -> Result<Option<ReservationDetail>> {
        Ok(self
            .reservations
            .iter()
            .find(|r| r.id == id)
            .and_then(|r| self.detail(r)))
    }

    async fn list_reservations(&mut self, owner: Option<Uuid>) -> Result<Vec<ReservationDetail>> {
        Ok(self
            .reservations
            .iter()
            .filter(|r| owner.map_or(true, |owner| r.user_id == owner))
            .filter_map(|r| self.detail(r))
            .collect())
    }

    async fn has_reservation_on(
        &mut self,
        user_id: Uuid,
        date: NaiveDate,
        except: Option<Uuid>,
    ) -> Result<bool> {
        Ok(self.reservations.iter().any(|r| {
            r.user_id == user_id && r.reservation_date == date && Some(r.id) != except
        }))
    }

    async fn slot_has_reservations(&mut self, slot_id: Uuid) -> Result<bool> {
        Ok(self.reservations.iter().any(|r| r.slot_id == slot_id))
    }

    async fn insert_reservation(&mut self, reservation: NewReservation) -> Result<Reservation> {
        if self
            .has_reservation_on(reservation.user_id, reservation.reservation_date, None)
            .await?
        {
            return Err(AppError::Conflict(ConflictKind::DuplicateDailyReservation));
        }
        let reservation = Reservation {
            id: reservation.id,
            user_id: reservation.user_id,
            slot_id: reservation.slot_id,
            reservation_date: reservation.reservation_date,
            guest_count: reservation.guest_count,
            status: reservation.status,
            created_at: reservation.created_at,
        };
        self.reservations.push(reservation.clone());
        Ok(reservation)
    }

    async fn update_reservation(
        &mut self,
        id: Uuid,
        changes: ReservationChanges,
    ) -> Result<Reservation> {
        let reservation = self
            .reservations
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(AppError::NotFound(Resource::Reservation))?;
        reservation.slot_id = changes.slot_id;
        reservation.reservation_date = changes.reservation_date;
        reservation.guest_count = changes.guest_count;
        reservation.status = changes.status;
        Ok(reservation.clone())
    }

    async fn delete_reservation(&mut self, id: Uuid) -> Result<bool> {
        let before = self.reservations.len();
        self.reservations.retain(|r| r.id != id);
        Ok(self.reservations.len() < before)
    }
}

#[async_trait]
impl OpeningHoursCatalog for MemoryLedger {
    async fn list_opening_hours(&mut self) -> Result<Vec<OpeningHours>> {
        Ok(self.opening_hours.clone())
    }

    async fn find_opening_hours(&mut self, id: Uuid) -> Result<Option<OpeningHours>> {
        Ok(self.opening_hours.iter().find(|h| h.id == id).cloned())
    }

    async fn find_opening_hours_by_day(&mut self, day: &str) -> Result<Option<OpeningHours>> {
        Ok(self
            .opening_hours
            .iter()
            .find(|h| h.day_of_week == day)
            .cloned())
    }

    async fn day_taken(&mut self, day: &str, except: Option<Uuid>) -> Result<bool> {
        Ok(self
            .opening_hours
            .iter()
            .any(|h| h.day_of_week == day && Some(h.id) != except))
    }

    async fn insert_opening_hours(&mut self, hours: NewOpeningHours) -> Result<OpeningHours> {
        if self.day_taken(&hours.day_of_week, None).await? {
            return Err(AppError::Conflict(ConflictKind::DuplicateOpeningHours));
        }
        let hours = OpeningHours {
            id: hours.id,
            day_of_week: hours.day_of_week,
            open_time: hours.open_time,
            close_time: hours.close_time,
            is_open: hours.is_open,
            note: hours.note,
        };
        self.opening_hours.push(hours.clone());
        Ok(hours)
    }

    async fn update_opening_hours(
        &mut self,
        id: Uuid,
        changes: OpeningHoursChanges,
    ) -> Result<Option<OpeningHours>> {
        let Some(hours) = self.opening_hours.iter_mut().find(|h| h.id == id) else {
            return Ok(None);
        };
        hours.day_of_week = changes.day_of_week;
        hours.open_time = changes.open_time;
        hours.close_time = changes.close_time;
        hours.is_open = changes.is_open;
        hours.note = changes.note;
        Ok(Some(hours.clone()))
    }

    async fn delete_opening_hours(&mut self, id: Uuid) -> Result<bool> {
        let before = self.opening_hours.len();
        self.opening_hours.retain(|h| h.id != id);
        Ok(self.opening_hours.len() < before)
    }
}

#[async_trait]
impl EventCatalog for MemoryLedger {
    async fn list_events(&mut self, active_only: bool) -> Result<Vec<Event>> {
        let mut events: Vec<Event> = self
            .events
            .iter()
            .filter(|e| !active_only || e.is_active)
            .cloned()
            .collect();
        if active_only {
            events.sort_by(|a, b| b.event_date.cmp(&a.event_date));
        } else {
            events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        Ok(events)
    }

    async fn find_event(&mut self, id: Uuid) -> Result<Option<Event>> {
        Ok(self.events.iter().find(|e| e.id == id).cloned())
    }

    async fn insert_event(&mut self, event: NewEvent) -> Result<Event> {
        let event = Event {
            id: event.id,
            title: event.title,
            description: event.description,
            photo_url: event.photo_url,
            event_date: event.event_date,
            is_active: event.is_active,
            created_at: event.created_at,
            updated_at: event.updated_at,
        };
        self.events.push(event.clone());
        Ok(event)
    }

    async fn update_event(&mut self, id: Uuid, changes: EventChanges) -> Result<Option<Event>> {
        let Some(event) = self.events.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            event.title = title;
        }
        if let Some(description) = changes.description {
            event.description = Some(description);
        }
        if let Some(photo_url) = changes.photo_url {
            event.photo_url = Some(photo_url);
        }
        if let Some(event_date) = changes.event_date {
            event.event_date = event_date;
        }
        if let Some(is_active) = changes.is_active {
            event.is_active = is_active;
        }
        event.updated_at = changes.updated_at;
        Ok(Some(event.clone()))
    }

    async fn delete_event(&mut self, id: Uuid) -> Result<bool> {
        let before = self.events.len();
        self.events.retain(|e| e.id != id);
        Ok(self.events.len() < before)
    }
}
