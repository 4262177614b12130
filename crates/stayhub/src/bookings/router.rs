use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::accounts::bearer::{BearerError, BearerSigner};

use super::checkout::CheckoutAssessment;
use super::domain::{ListingId, ReservationId};
use super::repository::{ListingDirectory, ReservationRepository};
use super::service::{BookingError, BookingService, NewReservation};

/// Shared state for the booking endpoints: the lifecycle service plus the
/// bearer verifier used to resolve callers from `Authorization` headers.
pub struct BookingRoutes<R, L> {
    pub service: BookingService<R, L>,
    pub verifier: Arc<BearerSigner>,
}

/// Router builder exposing the reservation lifecycle.
pub fn booking_router<R, L>(state: Arc<BookingRoutes<R, L>>) -> Router
where
    R: ReservationRepository + 'static,
    L: ListingDirectory + 'static,
{
    Router::new()
        .route(
            "/api/v1/reservations",
            post(create_handler::<R, L>).get(list_mine_handler::<R, L>),
        )
        .route(
            "/api/v1/reservations/:reservation_id",
            get(get_handler::<R, L>),
        )
        .route(
            "/api/v1/listings/:listing_id/reservations",
            get(listing_ledger_handler::<R, L>),
        )
        .route(
            "/api/v1/reservations/:reservation_id/confirm",
            post(confirm_handler::<R, L>),
        )
        .route(
            "/api/v1/reservations/:reservation_id/cancel",
            post(cancel_handler::<R, L>),
        )
        .route(
            "/api/v1/reservations/:reservation_id/checkout",
            post(checkout_handler::<R, L>),
        )
        .with_state(state)
}

pub(crate) async fn create_handler<R, L>(
    State(state): State<Arc<BookingRoutes<R, L>>>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<NewReservation>,
) -> Response
where
    R: ReservationRepository + 'static,
    L: ListingDirectory + 'static,
{
    let now = Utc::now();
    let caller = match state.verifier.authorize(&headers, now) {
        Ok(caller) => caller,
        Err(error) => return bearer_response(error),
    };

    match state.service.request(&caller, request, now) {
        Ok(reservation) => {
            let view = reservation.view(now.date_naive());
            (StatusCode::CREATED, axum::Json(view)).into_response()
        }
        Err(error) => booking_error_response(error),
    }
}

pub(crate) async fn get_handler<R, L>(
    State(state): State<Arc<BookingRoutes<R, L>>>,
    headers: HeaderMap,
    Path(reservation_id): Path<Uuid>,
) -> Response
where
    R: ReservationRepository + 'static,
    L: ListingDirectory + 'static,
{
    let now = Utc::now();
    let caller = match state.verifier.authorize(&headers, now) {
        Ok(caller) => caller,
        Err(error) => return bearer_response(error),
    };

    match state.service.get(&caller, ReservationId(reservation_id)) {
        Ok(reservation) => {
            let view = reservation.view(now.date_naive());
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => booking_error_response(error),
    }
}

pub(crate) async fn list_mine_handler<R, L>(
    State(state): State<Arc<BookingRoutes<R, L>>>,
    headers: HeaderMap,
) -> Response
where
    R: ReservationRepository + 'static,
    L: ListingDirectory + 'static,
{
    let now = Utc::now();
    let caller = match state.verifier.authorize(&headers, now) {
        Ok(caller) => caller,
        Err(error) => return bearer_response(error),
    };

    match state.service.list_mine(&caller) {
        Ok(reservations) => {
            let today = now.date_naive();
            let views: Vec<_> = reservations
                .iter()
                .map(|reservation| reservation.view(today))
                .collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(error) => booking_error_response(error),
    }
}

pub(crate) async fn listing_ledger_handler<R, L>(
    State(state): State<Arc<BookingRoutes<R, L>>>,
    headers: HeaderMap,
    Path(listing_id): Path<String>,
) -> Response
where
    R: ReservationRepository + 'static,
    L: ListingDirectory + 'static,
{
    let now = Utc::now();
    let caller = match state.verifier.authorize(&headers, now) {
        Ok(caller) => caller,
        Err(error) => return bearer_response(error),
    };

    match state
        .service
        .list_for_listing(&caller, &ListingId(listing_id))
    {
        Ok(reservations) => {
            let today = now.date_naive();
            let views: Vec<_> = reservations
                .iter()
                .map(|reservation| reservation.view(today))
                .collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(error) => booking_error_response(error),
    }
}

pub(crate) async fn confirm_handler<R, L>(
    State(state): State<Arc<BookingRoutes<R, L>>>,
    headers: HeaderMap,
    Path(reservation_id): Path<Uuid>,
) -> Response
where
    R: ReservationRepository + 'static,
    L: ListingDirectory + 'static,
{
    let now = Utc::now();
    let caller = match state.verifier.authorize(&headers, now) {
        Ok(caller) => caller,
        Err(error) => return bearer_response(error),
    };

    match state
        .service
        .confirm(&caller, ReservationId(reservation_id), now)
    {
        Ok(reservation) => {
            let view = reservation.view(now.date_naive());
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => booking_error_response(error),
    }
}

pub(crate) async fn cancel_handler<R, L>(
    State(state): State<Arc<BookingRoutes<R, L>>>,
    headers: HeaderMap,
    Path(reservation_id): Path<Uuid>,
) -> Response
where
    R: ReservationRepository + 'static,
    L: ListingDirectory + 'static,
{
    let now = Utc::now();
    let caller = match state.verifier.authorize(&headers, now) {
        Ok(caller) => caller,
        Err(error) => return bearer_response(error),
    };

    match state
        .service
        .cancel(&caller, ReservationId(reservation_id), now)
    {
        Ok(reservation) => {
            let view = reservation.view(now.date_naive());
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => booking_error_response(error),
    }
}

pub(crate) async fn checkout_handler<R, L>(
    State(state): State<Arc<BookingRoutes<R, L>>>,
    headers: HeaderMap,
    Path(reservation_id): Path<Uuid>,
    axum::Json(assessment): axum::Json<CheckoutAssessment>,
) -> Response
where
    R: ReservationRepository + 'static,
    L: ListingDirectory + 'static,
{
    let now = Utc::now();
    let caller = match state.verifier.authorize(&headers, now) {
        Ok(caller) => caller,
        Err(error) => return bearer_response(error),
    };

    match state
        .service
        .confirm_checkout(&caller, ReservationId(reservation_id), assessment, now)
    {
        Ok(reservation) => {
            let view = reservation.view(now.date_naive());
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => booking_error_response(error),
    }
}

fn bearer_response(error: BearerError) -> Response {
    let payload = json!({
        "error": error.to_string(),
    });
    (StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response()
}

fn booking_error_response(error: BookingError) -> Response {
    let status = match &error {
        BookingError::Validation(_) | BookingError::Checkout(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        BookingError::BookingConflict
        | BookingError::InvalidTransition
        | BookingError::StayNotEnded => StatusCode::CONFLICT,
        BookingError::Forbidden => StatusCode::FORBIDDEN,
        BookingError::NotFound | BookingError::UnknownListing => StatusCode::NOT_FOUND,
        BookingError::Repository(_) | BookingError::Directory(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = match &error {
        BookingError::Validation(validation) => json!({
            "error": validation.to_string(),
            "field": validation.field,
        }),
        other => json!({
            "error": other.to_string(),
        }),
    };

    (status, axum::Json(payload)).into_response()
}
