//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: the registration use cases and startup wiring
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: consistent error responses
//! - `snapshots.rs`: periodic persistence

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;
pub mod snapshots;

use self::services::RegistrationService;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<RegistrationService>) -> Router {
    let auth_state = middleware::AuthState {
        gate: services.gate().clone(),
    };

    // Protected routes: require a valid bearer token.
    let protected = routes::protected_router().route_layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .merge(routes::public_router())
        .merge(protected)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
