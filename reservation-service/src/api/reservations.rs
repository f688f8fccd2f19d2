use axum::{extract::State, Extension};
use chrono::Local;
use shared::{MessageResponse, ReservationRequest, ReservationView, SlotQuery, SlotView};
use uuid::Uuid;

use super::extract::{Json, Path, Query};
use super::AppState;
use crate::admission;
use crate::auth::AuthUser;
use crate::error::Result;
use crate::reservations::ReservationEngine;
use crate::slots::SlotCatalog;
use crate::store::Store;

pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<ReservationRequest>,
) -> Result<Json<ReservationView>> {
    admission::check_bookable_date(request.date, Local::now().date_naive())?;

    let engine = ReservationEngine::new(state.store);
    let detail = engine.create(&user.username, request).await?;
    Ok(Json(ReservationView::from(&detail)))
}

pub async fn list<S: Store>(
    State(state): State<AppState<S>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<ReservationView>>> {
    let engine = ReservationEngine::new(state.store);
    let reservations = engine.list(&user.username).await?;
    Ok(Json(reservations.iter().map(ReservationView::from).collect()))
}

pub async fn delete<S: Store>(
    State(state): State<AppState<S>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>> {
    let engine = ReservationEngine::new(state.store);
    engine.delete(&user.username, id).await?;
    Ok(Json(MessageResponse::new("Reservation deleted successfully")))
}

/// Active slots. The date is required for compatibility but does not change
/// the result: occupancy is tracked per slot, not per day.
pub async fn list_slots<S: Store>(
    State(state): State<AppState<S>>,
    Query(_query): Query<SlotQuery>,
) -> Result<Json<Vec<SlotView>>> {
    let slots = SlotCatalog::new(state.store).list_active().await?;
    Ok(Json(slots.iter().map(SlotView::from).collect()))
}
