use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use stayhub::accounts::{account_router, AccountRepository, AccountRoutes, Mailer};
use stayhub::bookings::{booking_router, BookingRoutes, ListingDirectory, ReservationRepository};

pub(crate) fn with_domain_routes<A, M, R, L>(
    accounts: Arc<AccountRoutes<A, M>>,
    bookings: Arc<BookingRoutes<R, L>>,
) -> axum::Router
where
    A: AccountRepository + 'static,
    M: Mailer + 'static,
    R: ReservationRepository + 'static,
    L: ListingDirectory + 'static,
{
    account_router(accounts)
        .merge(booking_router(bookings))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
