use shared::{DayOfWeek, OpeningHoursRequest, OpeningHoursView};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::admission;
use crate::error::{AppError, ConflictKind, Resource, Result};
use crate::models::{NewOpeningHours, OpeningHoursChanges};
use crate::store::Store;

pub struct OpeningHoursService<S> {
    store: Arc<S>,
}

impl<S: Store> OpeningHoursService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Every configured day, Monday first.
    pub async fn list(&self) -> Result<Vec<OpeningHoursView>> {
        let rows = self
            .store
            .transaction(|tx| Box::pin(async move { tx.list_opening_hours().await }))
            .await?;

        let mut views = rows
            .iter()
            .map(OpeningHoursView::try_from)
            .collect::<Result<Vec<_>>>()?;
        views.sort_by_key(|v| v.day_of_week as u8);
        Ok(views)
    }

    pub async fn get(&self, id: Uuid) -> Result<OpeningHoursView> {
        let row = self
            .store
            .transaction(move |tx| {
                Box::pin(async move {
                    tx.find_opening_hours(id)
                        .await?
                        .ok_or(AppError::NotFound(Resource::OpeningHours))
                })
            })
            .await?;
        OpeningHoursView::try_from(&row)
    }

    pub async fn by_day(&self, day: DayOfWeek) -> Result<OpeningHoursView> {
        let row = self
            .store
            .transaction(move |tx| {
                Box::pin(async move {
                    tx.find_opening_hours_by_day(day.as_str())
                        .await?
                        .ok_or(AppError::NotFound(Resource::OpeningHours))
                })
            })
            .await?;
        OpeningHoursView::try_from(&row)
    }

    pub async fn create(&self, request: OpeningHoursRequest) -> Result<OpeningHoursView> {
        admission::check_time_range(request.open_time, request.close_time)?;

        let row = self
            .store
            .transaction(move |tx| {
                Box::pin(async move {
                    let day = request.day_of_week.as_str();
                    if tx.day_taken(day, None).await? {
                        return Err(AppError::Conflict(ConflictKind::DuplicateOpeningHours));
                    }
                    tx.insert_opening_hours(NewOpeningHours {
                        id: Uuid::new_v4(),
                        day_of_week: day.to_string(),
                        open_time: request.open_time,
                        close_time: request.close_time,
                        is_open: request.is_open,
                        note: request.note,
                    })
                    .await
                })
            })
            .await?;

        info!("Opening hours for {} created", row.day_of_week);
        OpeningHoursView::try_from(&row)
    }

    pub async fn update(&self, id: Uuid, request: OpeningHoursRequest) -> Result<OpeningHoursView> {
        admission::check_time_range(request.open_time, request.close_time)?;

        let row = self
            .store
            .transaction(move |tx| {
                Box::pin(async move {
                    let current = tx
                        .find_opening_hours(id)
                        .await?
                        .ok_or(AppError::NotFound(Resource::OpeningHours))?;
                    let day = request.day_of_week.as_str();
                    if current.day_of_week != day && tx.day_taken(day, Some(id)).await? {
                        return Err(AppError::Conflict(ConflictKind::DuplicateOpeningHours));
                    }
                    tx.update_opening_hours(
                        id,
                        OpeningHoursChanges {
                            day_of_week: day.to_string(),
                            open_time: request.open_time,
                            close_time: request.close_time,
                            is_open: request.is_open,
                            note: request.note,
                        },
                    )
                    .await?
                    .ok_or(AppError::NotFound(Resource::OpeningHours))
                })
            })
            .await?;

        info!("Opening hours {} updated", row.id);
        OpeningHoursView::try_from(&row)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let removed = self
            .store
            .transaction(move |tx| Box::pin(async move { tx.delete_opening_hours(id).await }))
            .await?;
        if !removed {
            return Err(AppError::NotFound(Resource::OpeningHours));
        }
        info!("Opening hours {} deleted", id);
        Ok(())
    }
}
