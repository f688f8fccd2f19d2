use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{require_admin, require_user, TokenService};
use crate::store::Store;

mod admin;
mod auth;
mod catalog;
mod extract;
mod reservations;

pub struct AppState<S> {
    pub store: Arc<S>,
    pub tokens: Arc<TokenService>,
}

// Derived Clone would demand `S: Clone`.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            tokens: self.tokens.clone(),
        }
    }
}

pub fn create_router<S: Store>(state: AppState<S>) -> Router {
    let public = Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/register", post(auth::register::<S>))
        .route("/api/auth/login", post(auth::login::<S>))
        .route("/api/reservations/slots", get(reservations::list_slots::<S>))
        .route("/api/opening-hours", get(catalog::list_opening_hours::<S>))
        .route(
            "/api/opening-hours/day/:day",
            get(catalog::opening_hours_by_day::<S>),
        )
        .route("/api/events", get(catalog::list_active_events::<S>));

    let customer = Router::new()
        .route("/api/auth/me", get(auth::me::<S>))
        .route(
            "/api/reservations",
            post(reservations::create::<S>).get(reservations::list::<S>),
        )
        .route(
            "/api/reservations/:id",
            axum::routing::delete(reservations::delete::<S>),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user::<S>,
        ));

    let admin = Router::new()
        .route("/admin/reservations", get(admin::list_reservations::<S>))
        .route(
            "/admin/reservations/:id",
            get(admin::get_reservation::<S>)
                .put(admin::update_reservation::<S>)
                .delete(admin::delete_reservation::<S>),
        )
        .route(
            "/admin/slots",
            get(admin::list_slots::<S>).post(admin::create_slot::<S>),
        )
        .route(
            "/admin/slots/:id",
            put(admin::update_slot::<S>).delete(admin::delete_slot::<S>),
        )
        .route("/admin/users", get(admin::list_users::<S>))
        .route(
            "/admin/users/:id",
            get(admin::get_user::<S>).put(admin::update_user::<S>),
        )
        .route(
            "/admin/opening-hours",
            get(catalog::list_opening_hours::<S>).post(catalog::create_opening_hours::<S>),
        )
        .route(
            "/admin/opening-hours/day/:day",
            get(catalog::opening_hours_by_day::<S>),
        )
        .route(
            "/admin/opening-hours/:id",
            get(catalog::get_opening_hours::<S>)
                .put(catalog::update_opening_hours::<S>)
                .delete(catalog::delete_opening_hours::<S>),
        )
        .route(
            "/admin/events",
            get(catalog::list_all_events::<S>).post(catalog::create_event::<S>),
        )
        .route(
            "/admin/events/:id",
            get(catalog::get_event::<S>)
                .put(catalog::update_event::<S>)
                .delete(catalog::delete_event::<S>),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_admin::<S>,
        ));

    Router::new()
        .merge(public)
        .merge(customer)
        .merge(admin)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

pub async fn health_check() -> &'static str {
    "OK"
}
