use axum::{extract::State, http::StatusCode};
use chrono::Local;
use shared::{ReservationUpdate, ReservationView, SlotRequest, SlotView, UserUpdate, UserView};
use uuid::Uuid;
use validator::Validate;

use super::extract::{Json, Path};
use super::AppState;
use crate::admin::AdminReservations;
use crate::admission;
use crate::error::Result;
use crate::slots::SlotCatalog;
use crate::store::Store;
use crate::users::UserService;

pub async fn list_reservations<S: Store>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<ReservationView>>> {
    let reservations = AdminReservations::new(state.store).list_all().await?;
    Ok(Json(reservations.iter().map(ReservationView::from).collect()))
}

pub async fn get_reservation<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReservationView>> {
    let detail = AdminReservations::new(state.store).get(id).await?;
    Ok(Json(ReservationView::from(&detail)))
}

pub async fn update_reservation<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
    Json(update): Json<ReservationUpdate>,
) -> Result<Json<ReservationView>> {
    update.validate()?;
    admission::check_bookable_date(update.reservation_date, Local::now().date_naive())?;

    let detail = AdminReservations::new(state.store).update(id, update).await?;
    Ok(Json(ReservationView::from(&detail)))
}

pub async fn delete_reservation<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    AdminReservations::new(state.store).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_slots<S: Store>(State(state): State<AppState<S>>) -> Result<Json<Vec<SlotView>>> {
    let slots = SlotCatalog::new(state.store).list_all().await?;
    Ok(Json(slots.iter().map(SlotView::from).collect()))
}

pub async fn create_slot<S: Store>(
    State(state): State<AppState<S>>,
    Json(request): Json<SlotRequest>,
) -> Result<Json<SlotView>> {
    let slot = SlotCatalog::new(state.store).create(request).await?;
    Ok(Json(SlotView::from(&slot)))
}

pub async fn update_slot<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
    Json(request): Json<SlotRequest>,
) -> Result<Json<SlotView>> {
    let slot = SlotCatalog::new(state.store).update(id, request).await?;
    Ok(Json(SlotView::from(&slot)))
}

pub async fn delete_slot<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    SlotCatalog::new(state.store).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_users<S: Store>(State(state): State<AppState<S>>) -> Result<Json<Vec<UserView>>> {
    let users = UserService::new(state.store).list().await?;
    Ok(Json(users.iter().map(UserView::from).collect()))
}

pub async fn get_user<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserView>> {
    let user = UserService::new(state.store).get(id).await?;
    Ok(Json(UserView::from(&user)))
}

pub async fn update_user<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
    Json(update): Json<UserUpdate>,
) -> Result<Json<UserView>> {
    let user = UserService::new(state.store).update(id, update).await?;
    Ok(Json(UserView::from(&user)))
}
