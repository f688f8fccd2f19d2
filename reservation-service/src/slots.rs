use chrono::Utc;
use shared::SlotRequest;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::admission;
use crate::error::{AppError, ConflictKind, Resource, Result};
use crate::models::{NewSlot, Slot, SlotChanges};
use crate::store::Store;

pub struct SlotCatalog<S> {
    store: Arc<S>,
}

impl<S: Store> SlotCatalog<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn list_all(&self) -> Result<Vec<Slot>> {
        self.store
            .transaction(|tx| Box::pin(async move { tx.list_slots().await }))
            .await
    }

    pub async fn list_active(&self) -> Result<Vec<Slot>> {
        let slots = self.list_all().await?;
        Ok(slots.into_iter().filter(|s| s.active).collect())
    }

    pub async fn create(&self, request: SlotRequest) -> Result<Slot> {
        admission::check_time_range(request.slot_from, request.slot_to)?;

        let slot = self
            .store
            .transaction(move |tx| {
                Box::pin(async move {
                    if tx
                        .slot_range_taken(request.slot_from, request.slot_to, None)
                        .await?
                    {
                        return Err(AppError::Conflict(ConflictKind::DuplicateSlot));
                    }
                    tx.insert_slot(NewSlot {
                        id: Uuid::new_v4(),
                        slot_from: request.slot_from,
                        slot_to: request.slot_to,
                        active: request.active,
                        max_reservations: admission::initial_capacity(request.max_reservations),
                        current_reservations: 0,
                        created_at: Utc::now(),
                    })
                    .await
                })
            })
            .await?;

        info!(
            "Slot {} created ({}-{}, capacity {})",
            slot.id, slot.slot_from, slot.slot_to, slot.max_reservations
        );
        Ok(slot)
    }

    pub async fn update(&self, id: Uuid, request: SlotRequest) -> Result<Slot> {
        admission::check_time_range(request.slot_from, request.slot_to)?;

        let slot = self
            .store
            .transaction(move |tx| {
                Box::pin(async move {
                    let current = tx
                        .lock_slot(id)
                        .await?
                        .ok_or(AppError::NotFound(Resource::Slot))?;
                    if tx
                        .slot_range_taken(request.slot_from, request.slot_to, Some(id))
                        .await?
                    {
                        return Err(AppError::Conflict(ConflictKind::DuplicateSlot));
                    }
                    let max_reservations =
                        admission::revised_capacity(&current, request.max_reservations)?;

                    tx.update_slot(
                        id,
                        SlotChanges {
                            slot_from: request.slot_from,
                            slot_to: request.slot_to,
                            active: request.active,
                            max_reservations,
                        },
                    )
                    .await?
                    .ok_or(AppError::NotFound(Resource::Slot))
                })
            })
            .await?;

        info!("Slot {} updated", slot.id);
        Ok(slot)
    }

    /// Refuses to remove a slot that any reservation still points at.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.store
            .transaction(move |tx| {
                Box::pin(async move {
                    tx.lock_slot(id)
                        .await?
                        .ok_or(AppError::NotFound(Resource::Slot))?;
                    if tx.slot_has_reservations(id).await? {
                        return Err(AppError::Conflict(ConflictKind::SlotInUse));
                    }
                    tx.delete_slot(id).await?;
                    Ok(())
                })
            })
            .await?;

        info!("Slot {} deleted", id);
        Ok(())
    }
}
