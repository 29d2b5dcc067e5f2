use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::app::services::ServiceError;

impl ServiceError {
    /// HTTP status and stable machine-readable code.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            Self::DuplicateUser => (StatusCode::BAD_REQUEST, "duplicate_user"),
            Self::WeakPassword(_) => (StatusCode::UNPROCESSABLE_ENTITY, "weak_password"),
            Self::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            Self::ActivityNotFound(_) => (StatusCode::NOT_FOUND, "activity_not_found"),
            Self::AlreadyRegistered => (StatusCode::BAD_REQUEST, "already_registered"),
            Self::ActivityFull => (StatusCode::CONFLICT, "activity_full"),
            Self::NotRegistered => (StatusCode::BAD_REQUEST, "not_registered"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        let mut response = json_error(status, code, message);
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, header::HeaderValue::from_static("Bearer"));
        }
        response
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mergington_auth::PolicyViolation;

    #[test]
    fn every_error_has_a_distinct_status_mapping() {
        let cases = [
            (ServiceError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (ServiceError::DuplicateUser, StatusCode::BAD_REQUEST),
            (
                ServiceError::WeakPassword(PolicyViolation::TooShort { min: 4 }),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (ServiceError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (ServiceError::Unauthorized, StatusCode::UNAUTHORIZED),
            (ServiceError::Forbidden, StatusCode::FORBIDDEN),
            (ServiceError::ActivityNotFound("Chess Club".into()), StatusCode::NOT_FOUND),
            (ServiceError::AlreadyRegistered, StatusCode::BAD_REQUEST),
            (ServiceError::ActivityFull, StatusCode::CONFLICT),
            (ServiceError::NotRegistered, StatusCode::BAD_REQUEST),
            (ServiceError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.clone().into_response().status(), status, "{err:?}");
        }
    }

    #[test]
    fn unauthorized_carries_a_bearer_challenge() {
        let response = ServiceError::Unauthorized.into_response();
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
        assert!(ServiceError::Forbidden
            .into_response()
            .headers()
            .get(header::WWW_AUTHENTICATE)
            .is_none());
    }
}
