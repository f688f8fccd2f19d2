//! Privileged reservation operations. No ownership checks happen here; callers
//! are gated on the admin role at the HTTP layer.

use shared::ReservationUpdate;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::admission;
use crate::error::{AppError, ConflictKind, Resource, Result};
use crate::models::{ReservationChanges, ReservationDetail, Slot};
use crate::reservations::release_seat;
use crate::store::{Ledger, Store};

pub struct AdminReservations<S> {
    store: Arc<S>,
}

impl<S: Store> AdminReservations<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn list_all(&self) -> Result<Vec<ReservationDetail>> {
        self.store
            .transaction(|tx| Box::pin(async move { tx.list_reservations(None).await }))
            .await
    }

    pub async fn get(&self, id: Uuid) -> Result<ReservationDetail> {
        self.store
            .transaction(move |tx| {
                Box::pin(async move {
                    tx.reservation_detail(id)
                        .await?
                        .ok_or(AppError::NotFound(Resource::Reservation))
                })
            })
            .await
    }

    /// Rewrites slot, date, guest count and status. Moving to another slot
    /// takes a seat there before the old one is given back, all in one
    /// transaction, so a full target slot leaves both counters untouched.
    pub async fn update(&self, id: Uuid, update: ReservationUpdate) -> Result<ReservationDetail> {
        let detail = self
            .store
            .transaction(move |tx| {
                Box::pin(async move {
                    let reservation = tx
                        .lock_reservation(id)
                        .await?
                        .ok_or(AppError::NotFound(Resource::Reservation))?;
                    tx.lock_user(reservation.user_id)
                        .await?
                        .ok_or(AppError::NotFound(Resource::User))?;

                    admission::check_guest_count(update.guest_count)?;

                    if update.reservation_date != reservation.reservation_date
                        && tx
                            .has_reservation_on(
                                reservation.user_id,
                                update.reservation_date,
                                Some(reservation.id),
                            )
                            .await?
                    {
                        return Err(AppError::Conflict(ConflictKind::DuplicateDailyReservation));
                    }

                    if update.slot_id != reservation.slot_id {
                        move_seat(tx, reservation.slot_id, update.slot_id).await?;
                    }

                    tx.update_reservation(
                        reservation.id,
                        ReservationChanges {
                            slot_id: update.slot_id,
                            reservation_date: update.reservation_date,
                            guest_count: update.guest_count,
                            status: update.status,
                        },
                    )
                    .await?;

                    tx.reservation_detail(reservation.id)
                        .await?
                        .ok_or(AppError::NotFound(Resource::Reservation))
                })
            })
            .await?;

        info!(
            "Reservation {} updated by admin (slot {}, date {})",
            detail.reservation.id, detail.slot.id, detail.reservation.reservation_date
        );
        Ok(detail)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.store
            .transaction(move |tx| {
                Box::pin(async move {
                    let reservation = tx
                        .lock_reservation(id)
                        .await?
                        .ok_or(AppError::NotFound(Resource::Reservation))?;
                    release_seat(tx, reservation.slot_id).await?;
                    tx.delete_reservation(reservation.id).await?;
                    Ok(())
                })
            })
            .await?;

        info!("Reservation {} deleted by admin", id);
        Ok(())
    }
}

// Slot rows are always locked in id order.
async fn move_seat(tx: &mut dyn Ledger, from: Uuid, to: Uuid) -> Result<()> {
    let (first, second) = if from < to { (from, to) } else { (to, from) };
    let first = tx.lock_slot(first).await?;
    let second = tx.lock_slot(second).await?;

    let pick = |id: Uuid| -> Option<Slot> {
        [first.as_ref(), second.as_ref()]
            .into_iter()
            .flatten()
            .find(|s| s.id == id)
            .cloned()
    };
    let target = pick(to).ok_or(AppError::NotFound(Resource::Slot))?;

    tx.set_occupancy(target.id, admission::occupy(&target)?).await?;
    if let Some(previous) = pick(from) {
        tx.set_occupancy(previous.id, admission::release(&previous))
            .await?;
    }
    Ok(())
}
