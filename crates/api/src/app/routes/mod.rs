use axum::{
    Router,
    routing::{delete, get, post},
};

pub mod activities;
pub mod auth;
pub mod system;

/// Endpoints anyone may call.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/activities", get(activities::list_activities))
}

/// Endpoints that require a bearer token.
pub fn protected_router() -> Router {
    Router::new()
        .route("/activities/:name/signup", post(activities::signup))
        .route("/activities/:name/unregister", delete(activities::unregister))
}
