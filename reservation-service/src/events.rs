use chrono::Utc;
use shared::{EventRequest, EventUpdate};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Resource, Result};
use crate::models::{Event, EventChanges, NewEvent};
use crate::store::Store;

pub struct EventService<S> {
    store: Arc<S>,
}

impl<S: Store> EventService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn list_active(&self) -> Result<Vec<Event>> {
        self.store
            .transaction(|tx| Box::pin(async move { tx.list_events(true).await }))
            .await
    }

    pub async fn list_all(&self) -> Result<Vec<Event>> {
        self.store
            .transaction(|tx| Box::pin(async move { tx.list_events(false).await }))
            .await
    }

    pub async fn get(&self, id: Uuid) -> Result<Event> {
        self.store
            .transaction(move |tx| {
                Box::pin(async move {
                    tx.find_event(id)
                        .await?
                        .ok_or(AppError::NotFound(Resource::Event))
                })
            })
            .await
    }

    pub async fn create(&self, request: EventRequest) -> Result<Event> {
        request.validate()?;
        let now = Utc::now();

        let event = self
            .store
            .transaction(move |tx| {
                Box::pin(async move {
                    tx.insert_event(NewEvent {
                        id: Uuid::new_v4(),
                        title: request.title,
                        description: request.description,
                        photo_url: request.photo_url,
                        event_date: request.event_date,
                        is_active: request.is_active,
                        created_at: now,
                        updated_at: now,
                    })
                    .await
                })
            })
            .await?;

        info!("Event {} created for {}", event.id, event.event_date);
        Ok(event)
    }

    /// Applies only the fields present in `update`.
    pub async fn update(&self, id: Uuid, update: EventUpdate) -> Result<Event> {
        update.validate()?;

        let event = self
            .store
            .transaction(move |tx| {
                Box::pin(async move {
                    tx.update_event(
                        id,
                        EventChanges {
                            title: update.title,
                            description: update.description,
                            photo_url: update.photo_url,
                            event_date: update.event_date,
                            is_active: update.is_active,
                            updated_at: Utc::now(),
                        },
                    )
                    .await?
                    .ok_or(AppError::NotFound(Resource::Event))
                })
            })
            .await?;

        info!("Event {} updated", event.id);
        Ok(event)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let removed = self
            .store
            .transaction(move |tx| Box::pin(async move { tx.delete_event(id).await }))
            .await?;
        if !removed {
            return Err(AppError::NotFound(Resource::Event));
        }
        info!("Event {} deleted", id);
        Ok(())
    }
}
