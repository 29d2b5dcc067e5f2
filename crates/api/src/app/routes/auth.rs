use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::app::dto;
use crate::app::services::{RegistrationService, ServiceError};

pub async fn signup(
    Extension(services): Extension<Arc<RegistrationService>>,
    body: Result<Json<dto::SignupRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return ServiceError::InvalidInput(rejection.body_text()).into_response(),
    };

    // Argon2 is deliberately slow; keep it off the async workers.
    let result = run_blocking(move || services.signup(&body.email, &body.password)).await;

    match result {
        Ok(user) => (StatusCode::CREATED, Json(dto::SignupResponse::from(&user))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<RegistrationService>>,
    body: Result<Json<dto::LoginRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return ServiceError::InvalidInput(rejection.body_text()).into_response(),
    };

    match run_blocking(move || services.login(&body.email, &body.password)).await {
        Ok(issued) => (StatusCode::OK, Json(issued)).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, ServiceError>
where
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServiceError::Internal(format!("blocking task failed: {e}")))?
}
