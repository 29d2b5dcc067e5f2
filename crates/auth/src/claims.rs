use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use mergington_core::Email;

/// Bearer token claims (transport-agnostic).
///
/// Timestamps are seconds since the Unix epoch, as JWT requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the authenticated user's email.
    pub sub: Email,

    /// Issued-at timestamp.
    pub iat: i64,

    /// Expiration timestamp.
    pub exp: i64,
}

impl TokenClaims {
    pub fn new(sub: Email, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClaimsError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Validate the time window of decoded claims.
///
/// Signature verification happens before this, in `TokenService`.
/// `leeway_secs` only applies to `iat` (clock skew between issuers); expiry
/// is exact: a token is dead at `now >= exp`.
pub fn validate_claims(claims: &TokenClaims, now_secs: i64, leeway_secs: i64) -> Result<(), ClaimsError> {
    if claims.exp <= claims.iat {
        return Err(ClaimsError::InvalidTimeWindow);
    }
    if now_secs + leeway_secs < claims.iat {
        return Err(ClaimsError::NotYetValid);
    }
    if now_secs >= claims.exp {
        return Err(ClaimsError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(iat: i64, exp: i64) -> TokenClaims {
        TokenClaims {
            sub: Email::parse("s@x.edu").unwrap(),
            iat,
            exp,
        }
    }

    #[test]
    fn valid_inside_window() {
        assert_eq!(validate_claims(&claims(100, 200), 150, 0), Ok(()));
        assert_eq!(validate_claims(&claims(100, 200), 100, 0), Ok(()));
    }

    #[test]
    fn expired_at_exactly_exp() {
        assert_eq!(validate_claims(&claims(100, 200), 200, 0), Err(ClaimsError::Expired));
        assert_eq!(validate_claims(&claims(100, 200), 999, 0), Err(ClaimsError::Expired));
    }

    #[test]
    fn future_tokens_respect_leeway() {
        assert_eq!(validate_claims(&claims(100, 200), 90, 0), Err(ClaimsError::NotYetValid));
        assert_eq!(validate_claims(&claims(100, 200), 90, 30), Ok(()));
    }

    #[test]
    fn inverted_window_is_rejected() {
        assert_eq!(
            validate_claims(&claims(200, 200), 200, 0),
            Err(ClaimsError::InvalidTimeWindow)
        );
    }
}
