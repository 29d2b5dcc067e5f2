use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};

use mergington_auth::AuthGate;

use crate::app::services::ServiceError;
use crate::context::CallerContext;

#[derive(Clone)]
pub struct AuthState {
    pub gate: AuthGate,
}

/// Require `Authorization: Bearer <token>` and attach the caller.
pub async fn auth_middleware(State(state): State<AuthState>, mut req: Request, next: Next) -> Response {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let principal = match state.gate.authenticate_header(header) {
        Ok(principal) => principal,
        Err(e) => return ServiceError::from(e).into_response(),
    };

    req.extensions_mut().insert(CallerContext::new(principal));
    next.run(req).await
}
