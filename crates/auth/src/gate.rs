//! Request authentication: bearer token in, caller identity out.

use std::sync::Arc;

use thiserror::Error;

use crate::token::{TokenError, TokenService};
use crate::Principal;

/// The only failure callers ever see.
///
/// Expired and forged tokens are not distinguished, so a caller learns
/// nothing about why a token was refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("unauthorized")]
    Unauthorized,
}

#[derive(Debug, Clone)]
pub struct AuthGate {
    tokens: Arc<TokenService>,
}

impl AuthGate {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }

    /// Validate a raw token and resolve the caller.
    pub fn authenticate(&self, token: &str) -> Result<Principal, AuthError> {
        match self.tokens.validate(token) {
            Ok(email) => Ok(Principal::new(email)),
            Err(reason @ (TokenError::Expired | TokenError::Invalid)) => {
                tracing::debug!(%reason, "token rejected");
                Err(AuthError::Unauthorized)
            }
            Err(other) => {
                tracing::warn!(error = %other, "token validation failed");
                Err(AuthError::Unauthorized)
            }
        }
    }

    /// Authenticate from an `Authorization` header value (`Bearer <token>`).
    pub fn authenticate_header(&self, header: Option<&str>) -> Result<Principal, AuthError> {
        let token = extract_bearer(header).ok_or(AuthError::Unauthorized)?;
        self.authenticate(token)
    }
}

fn extract_bearer(header: Option<&str>) -> Option<&str> {
    let (scheme, token) = header?.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use mergington_core::{Email, ManualClock};

    fn gate(clock: Arc<ManualClock>) -> (AuthGate, Arc<TokenService>) {
        let tokens = Arc::new(TokenService::new(b"gate-test-secret", Duration::minutes(60), clock).unwrap());
        (AuthGate::new(tokens.clone()), tokens)
    }

    #[test]
    fn valid_token_resolves_caller() {
        let (gate, tokens) = gate(Arc::new(ManualClock::default()));
        let email = Email::parse("s@x.edu").unwrap();
        let issued = tokens.issue(&email).unwrap();

        let principal = gate.authenticate(&issued.access_token).unwrap();
        assert_eq!(principal.email(), &email);
    }

    #[test]
    fn expired_and_forged_tokens_look_the_same() {
        let clock = Arc::new(ManualClock::default());
        let (gate, tokens) = gate(clock.clone());
        let issued = tokens.issue(&Email::parse("s@x.edu").unwrap()).unwrap();

        clock.advance(Duration::minutes(61));
        let expired = gate.authenticate(&issued.access_token).unwrap_err();
        let forged = gate.authenticate("forged.token.value").unwrap_err();

        assert_eq!(expired, AuthError::Unauthorized);
        assert_eq!(forged, AuthError::Unauthorized);
    }

    #[test]
    fn header_parsing() {
        let (gate, tokens) = gate(Arc::new(ManualClock::default()));
        let issued = tokens.issue(&Email::parse("s@x.edu").unwrap()).unwrap();

        let ok = format!("Bearer {}", issued.access_token);
        assert!(gate.authenticate_header(Some(&ok)).is_ok());

        let lower = format!("bearer {}", issued.access_token);
        assert!(gate.authenticate_header(Some(&lower)).is_ok());

        for bad in [None, Some(""), Some("Bearer"), Some("Bearer   "), Some("Basic abc")] {
            assert_eq!(gate.authenticate_header(bad), Err(AuthError::Unauthorized));
        }
    }
}
