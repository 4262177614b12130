use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::NewRegistration;
use super::repository::{AccountRepository, Mailer};
use super::session::{AuthError, SessionIssuer};
use super::tokens::{TokenFlowError, TokenLifecycle};

/// Shared state for the account endpoints: the session issuer and the token
/// lifecycle over the same credential store.
pub struct AccountRoutes<R, M> {
    pub sessions: SessionIssuer<R>,
    pub tokens: TokenLifecycle<R, M>,
}

/// Router builder exposing registration, login, and token redemption.
pub fn account_router<R, M>(state: Arc<AccountRoutes<R, M>>) -> Router
where
    R: AccountRepository + 'static,
    M: Mailer + 'static,
{
    Router::new()
        .route("/api/v1/accounts", post(register_handler::<R, M>))
        .route("/api/v1/sessions", post(login_handler::<R, M>))
        .route("/api/v1/accounts/verify", post(verify_handler::<R, M>))
        .route(
            "/api/v1/accounts/verification-requests",
            post(verification_request_handler::<R, M>),
        )
        .route(
            "/api/v1/accounts/password-resets",
            post(reset_request_handler::<R, M>),
        )
        .route(
            "/api/v1/accounts/password-resets/redeem",
            post(reset_redeem_handler::<R, M>),
        )
        .with_state(state)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRequest {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetRedeemRequest {
    pub token: String,
    pub new_password: String,
}

pub(crate) async fn register_handler<R, M>(
    State(state): State<Arc<AccountRoutes<R, M>>>,
    axum::Json(registration): axum::Json<NewRegistration>,
) -> Response
where
    R: AccountRepository + 'static,
    M: Mailer + 'static,
{
    match state.tokens.register(registration, Utc::now()) {
        Ok(account) => (StatusCode::CREATED, axum::Json(account.view())).into_response(),
        Err(TokenFlowError::Validation(error)) => {
            let payload = json!({
                "error": error.to_string(),
                "field": error.field,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(TokenFlowError::WeakPassword(violation)) => {
            let payload = json!({
                "error": violation.to_string(),
                "field": "password",
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(TokenFlowError::DuplicateIdentity) => {
            let payload = json!({
                "error": "an account with this email already exists",
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(other) => internal_error(other),
    }
}

pub(crate) async fn login_handler<R, M>(
    State(state): State<Arc<AccountRoutes<R, M>>>,
    axum::Json(request): axum::Json<LoginRequest>,
) -> Response
where
    R: AccountRepository + 'static,
    M: Mailer + 'static,
{
    match state
        .sessions
        .authenticate(&request.email, &request.password, Utc::now())
    {
        Ok(session) => (StatusCode::OK, axum::Json(session)).into_response(),
        Err(AuthError::InvalidCredentials) => {
            let payload = json!({
                "error": "invalid email or password",
            });
            (StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response()
        }
        Err(AuthError::AccountLocked {
            retry_after_seconds,
        }) => {
            let payload = json!({
                "error": "account temporarily locked",
                "retry_after_seconds": retry_after_seconds,
            });
            (StatusCode::LOCKED, axum::Json(payload)).into_response()
        }
        Err(other) => internal_error(other),
    }
}

pub(crate) async fn verify_handler<R, M>(
    State(state): State<Arc<AccountRoutes<R, M>>>,
    axum::Json(request): axum::Json<TokenRequest>,
) -> Response
where
    R: AccountRepository + 'static,
    M: Mailer + 'static,
{
    match state.tokens.verify(&request.token, Utc::now()) {
        Ok(account) => (StatusCode::OK, axum::Json(account.view())).into_response(),
        Err(error) => token_error_response(error),
    }
}

pub(crate) async fn verification_request_handler<R, M>(
    State(state): State<Arc<AccountRoutes<R, M>>>,
    axum::Json(request): axum::Json<EmailRequest>,
) -> Response
where
    R: AccountRepository + 'static,
    M: Mailer + 'static,
{
    match state.tokens.request_verification(&request.email, Utc::now()) {
        Ok(ack) => (StatusCode::ACCEPTED, axum::Json(ack)).into_response(),
        Err(other) => internal_error(other),
    }
}

pub(crate) async fn reset_request_handler<R, M>(
    State(state): State<Arc<AccountRoutes<R, M>>>,
    axum::Json(request): axum::Json<EmailRequest>,
) -> Response
where
    R: AccountRepository + 'static,
    M: Mailer + 'static,
{
    match state
        .tokens
        .request_password_reset(&request.email, Utc::now())
    {
        Ok(ack) => (StatusCode::ACCEPTED, axum::Json(ack)).into_response(),
        Err(other) => internal_error(other),
    }
}

pub(crate) async fn reset_redeem_handler<R, M>(
    State(state): State<Arc<AccountRoutes<R, M>>>,
    axum::Json(request): axum::Json<ResetRedeemRequest>,
) -> Response
where
    R: AccountRepository + 'static,
    M: Mailer + 'static,
{
    match state
        .tokens
        .reset_password(&request.token, &request.new_password, Utc::now())
    {
        Ok(account) => (StatusCode::OK, axum::Json(account.view())).into_response(),
        Err(TokenFlowError::WeakPassword(violation)) => {
            let payload = json!({
                "error": violation.to_string(),
                "field": "new_password",
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(error) => token_error_response(error),
    }
}

fn token_error_response(error: TokenFlowError) -> Response {
    match error {
        TokenFlowError::TokenExpired => {
            let payload = json!({
                "error": "token has expired",
            });
            (StatusCode::GONE, axum::Json(payload)).into_response()
        }
        TokenFlowError::TokenInvalid => {
            let payload = json!({
                "error": "token is not recognized",
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        other => internal_error(other),
    }
}

fn internal_error(error: impl std::fmt::Display) -> Response {
    let payload = json!({
        "error": error.to_string(),
    });
    (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
}
