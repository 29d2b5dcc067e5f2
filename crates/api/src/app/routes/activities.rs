use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::app::dto;
use crate::app::services::RegistrationService;
use crate::context::CallerContext;

pub async fn list_activities(Extension(services): Extension<Arc<RegistrationService>>) -> Response {
    match services.activities() {
        Ok(activities) => (StatusCode::OK, Json(dto::activities_to_json(&activities))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn signup(
    Extension(services): Extension<Arc<RegistrationService>>,
    Extension(caller): Extension<CallerContext>,
    Path(name): Path<String>,
    Query(query): Query<dto::EmailQuery>,
) -> Response {
    let email = match query.require() {
        Ok(email) => email,
        Err(e) => return e.into_response(),
    };

    match services.signup_for_activity(caller.principal(), &name, &email) {
        Ok(()) => (
            StatusCode::OK,
            Json(dto::MessageResponse {
                message: format!("Signed up {} for {name}", caller.email()),
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn unregister(
    Extension(services): Extension<Arc<RegistrationService>>,
    Extension(caller): Extension<CallerContext>,
    Path(name): Path<String>,
    Query(query): Query<dto::EmailQuery>,
) -> Response {
    let email = match query.require() {
        Ok(email) => email,
        Err(e) => return e.into_response(),
    };

    match services.unregister(caller.principal(), &name, &email) {
        Ok(()) => (
            StatusCode::OK,
            Json(dto::MessageResponse {
                message: format!("Unregistered {} from {name}", caller.email()),
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
