use axum::{extract::State, http::StatusCode};
use shared::{DayOfWeek, EventRequest, EventUpdate, EventView, OpeningHoursRequest, OpeningHoursView};
use uuid::Uuid;

use super::extract::{Json, Path};
use super::AppState;
use crate::error::{AppError, InvalidArgument, Result};
use crate::events::EventService;
use crate::opening_hours::OpeningHoursService;
use crate::store::Store;

fn parse_day(day: &str) -> Result<DayOfWeek> {
    day.parse::<DayOfWeek>()
        .map_err(|e| AppError::InvalidArgument(InvalidArgument::Validation(e.to_string())))
}

pub async fn list_opening_hours<S: Store>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<OpeningHoursView>>> {
    Ok(Json(OpeningHoursService::new(state.store).list().await?))
}

pub async fn opening_hours_by_day<S: Store>(
    State(state): State<AppState<S>>,
    Path(day): Path<String>,
) -> Result<Json<OpeningHoursView>> {
    let day = parse_day(&day)?;
    Ok(Json(OpeningHoursService::new(state.store).by_day(day).await?))
}

pub async fn get_opening_hours<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> Result<Json<OpeningHoursView>> {
    Ok(Json(OpeningHoursService::new(state.store).get(id).await?))
}

pub async fn create_opening_hours<S: Store>(
    State(state): State<AppState<S>>,
    Json(request): Json<OpeningHoursRequest>,
) -> Result<(StatusCode, Json<OpeningHoursView>)> {
    let view = OpeningHoursService::new(state.store).create(request).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn update_opening_hours<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
    Json(request): Json<OpeningHoursRequest>,
) -> Result<Json<OpeningHoursView>> {
    Ok(Json(
        OpeningHoursService::new(state.store)
            .update(id, request)
            .await?,
    ))
}

pub async fn delete_opening_hours<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    OpeningHoursService::new(state.store).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_active_events<S: Store>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<EventView>>> {
    let events = EventService::new(state.store).list_active().await?;
    Ok(Json(events.iter().map(EventView::from).collect()))
}

pub async fn list_all_events<S: Store>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<EventView>>> {
    let events = EventService::new(state.store).list_all().await?;
    Ok(Json(events.iter().map(EventView::from).collect()))
}

pub async fn get_event<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> Result<Json<EventView>> {
    let event = EventService::new(state.store).get(id).await?;
    Ok(Json(EventView::from(&event)))
}

pub async fn create_event<S: Store>(
    State(state): State<AppState<S>>,
    Json(request): Json<EventRequest>,
) -> Result<(StatusCode, Json<EventView>)> {
    let event = EventService::new(state.store).create(request).await?;
    Ok((StatusCode::CREATED, Json(EventView::from(&event))))
}

pub async fn update_event<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
    Json(update): Json<EventUpdate>,
) -> Result<Json<EventView>> {
    let event = EventService::new(state.store).update(id, update).await?;
    Ok(Json(EventView::from(&event)))
}

pub async fn delete_event<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    EventService::new(state.store).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
