//! Customer-facing reservation admission.
//!
//! `create` and `delete` each run as one store transaction: the acting user's
//! row and the slot's row are locked before any check reads them, so two
//! requests racing for the last seat (or for the same user and day) are
//! serialized and exactly one of them wins.

use chrono::Utc;
use shared::{ReservationRequest, STATUS_ACTIVE};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::admission;
use crate::error::{AppError, ConflictKind, ForbiddenKind, Resource, Result};
use crate::models::{NewReservation, ReservationDetail};
use crate::store::{Ledger, Store};

pub struct ReservationEngine<S> {
    store: Arc<S>,
}

impl<S: Store> ReservationEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn create(&self, actor: &str, request: ReservationRequest) -> Result<ReservationDetail> {
        let actor = actor.to_string();

        let detail = self
            .store
            .transaction(move |tx| {
                Box::pin(async move {
                    let user = tx
                        .lock_user_by_username(&actor)
                        .await?
                        .ok_or(AppError::NotFound(Resource::User))?;
                    let slot = tx
                        .lock_slot(request.slot_id)
                        .await?
                        .ok_or(AppError::NotFound(Resource::Slot))?;

                    admission::check_guest_count(request.guest_count)?;

                    if tx.has_reservation_on(user.id, request.date, None).await? {
                        return Err(AppError::Conflict(ConflictKind::DuplicateDailyReservation));
                    }

                    let occupied = admission::occupy(&slot)?;
                    let slot = tx.set_occupancy(slot.id, occupied).await?;

                    let reservation = tx
                        .insert_reservation(NewReservation {
                            id: Uuid::new_v4(),
                            user_id: user.id,
                            slot_id: slot.id,
                            reservation_date: request.date,
                            guest_count: request.guest_count,
                            status: STATUS_ACTIVE.to_string(),
                            created_at: Utc::now(),
                        })
                        .await?;

                    Ok(ReservationDetail {
                        reservation,
                        slot,
                        username: user.username,
                    })
                })
            })
            .await?;

        info!(
            "Reservation {} created for {} in slot {} on {}",
            detail.reservation.id, detail.username, detail.slot.id, detail.reservation.reservation_date
        );
        Ok(detail)
    }

    pub async fn list(&self, actor: &str) -> Result<Vec<ReservationDetail>> {
        let actor = actor.to_string();

        self.store
            .transaction(move |tx| {
                Box::pin(async move {
                    let user = tx
                        .find_user_by_username(&actor)
                        .await?
                        .ok_or(AppError::NotFound(Resource::User))?;
                    tx.list_reservations(Some(user.id)).await
                })
            })
            .await
    }

    pub async fn delete(&self, actor: &str, reservation_id: Uuid) -> Result<()> {
        let actor = actor.to_string();

        self.store
            .transaction(move |tx| {
                Box::pin(async move {
                    let user = tx
                        .find_user_by_username(&actor)
                        .await?
                        .ok_or(AppError::NotFound(Resource::User))?;
                    let reservation = tx
                        .lock_reservation(reservation_id)
                        .await?
                        .ok_or(AppError::NotFound(Resource::Reservation))?;

                    if reservation.user_id != user.id {
                        return Err(AppError::Forbidden(ForbiddenKind::NotOwner));
                    }

                    release_seat(tx, reservation.slot_id).await?;
                    tx.delete_reservation(reservation.id).await?;
                    Ok(())
                })
            })
            .await?;

        info!("Reservation {} deleted by its owner", reservation_id);
        Ok(())
    }
}

/// Gives one seat back to the slot, never dropping below zero.
pub(crate) async fn release_seat(tx: &mut dyn Ledger, slot_id: Uuid) -> Result<()> {
    if let Some(slot) = tx.lock_slot(slot_id).await? {
        tx.set_occupancy(slot.id, admission::release(&slot)).await?;
    }
    Ok(())
}
