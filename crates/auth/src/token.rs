//! Stateless bearer tokens (HS256 JWT).
//!
//! Tokens are self-contained: validating one needs only the process-wide
//! secret and the current time. There is no session table and no revocation
//! list; a token dies at its `exp`.

use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use thiserror::Error;

use mergington_core::{Clock, Email};

use crate::claims::{ClaimsError, TokenClaims, validate_claims};

/// Allowed skew on `iat` for tokens issued by a sibling process.
const IAT_LEEWAY_SECS: i64 = 30;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token is invalid")]
    Invalid,

    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("token service misconfigured: {0}")]
    Configuration(String),
}

/// The result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: &'static str,
    /// Lifetime in seconds.
    pub expires_in: i64,
    #[serde(skip)]
    pub claims: TokenClaims,
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub const DEFAULT_TTL_MINUTES: i64 = 60;
    /// Longest lifetime a token may be configured with (one year).
    pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

    pub fn new(secret: &[u8], ttl: Duration, clock: Arc<dyn Clock>) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::Configuration("secret cannot be empty".into()));
        }
        if ttl <= Duration::zero() {
            return Err(TokenError::Configuration("ttl must be positive".into()));
        }
        if ttl > Duration::minutes(Self::MAX_TTL_MINUTES) {
            return Err(TokenError::Configuration(format!(
                "ttl must be at most {} minutes",
                Self::MAX_TTL_MINUTES
            )));
        }

        // Expiry is checked against our own clock in `validate`, not the
        // library's wall-clock check.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
            clock,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, email: &Email) -> Result<IssuedToken, TokenError> {
        let issued_at = self.clock.now();
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Configuration("token expiry is out of range".into()))?;
        let claims = TokenClaims::new(email.clone(), issued_at, expires_at);

        let access_token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        tracing::debug!(email = %email, exp = claims.exp, "token issued");

        Ok(IssuedToken {
            access_token,
            token_type: "bearer",
            expires_in: self.ttl.num_seconds(),
            claims,
        })
    }

    /// Resolve a token to its subject.
    pub fn validate(&self, token: &str) -> Result<Email, TokenError> {
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map_err(|_| TokenError::Invalid)?;

        match validate_claims(&data.claims, self.clock.now_secs(), IAT_LEEWAY_SECS) {
            Ok(()) => Ok(data.claims.sub),
            Err(ClaimsError::Expired) => Err(TokenError::Expired),
            Err(ClaimsError::NotYetValid | ClaimsError::InvalidTimeWindow) => Err(TokenError::Invalid),
        }
    }
}

impl core::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mergington_core::ManualClock;

    const SECRET: &[u8] = b"test-secret-that-is-long-enough-for-hs256";

    fn service(clock: Arc<ManualClock>) -> TokenService {
        TokenService::new(SECRET, Duration::minutes(60), clock).unwrap()
    }

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    #[test]
    fn issued_token_validates_to_its_subject() {
        let clock = Arc::new(ManualClock::default());
        let tokens = service(clock);

        let issued = tokens.issue(&email("s@x.edu")).unwrap();
        assert_eq!(issued.token_type, "bearer");
        assert_eq!(issued.expires_in, 3600);
        assert_eq!(issued.claims.exp - issued.claims.iat, 3600);

        assert_eq!(tokens.validate(&issued.access_token).unwrap(), email("s@x.edu"));
    }

    #[test]
    fn token_expires_exactly_at_ttl() {
        let clock = Arc::new(ManualClock::default());
        let tokens = service(clock.clone());
        let issued = tokens.issue(&email("s@x.edu")).unwrap();

        clock.advance(Duration::minutes(60) - Duration::seconds(1));
        assert!(tokens.validate(&issued.access_token).is_ok());

        clock.advance(Duration::seconds(1));
        assert_eq!(tokens.validate(&issued.access_token), Err(TokenError::Expired));
    }

    #[test]
    fn tampered_token_is_invalid() {
        let tokens = service(Arc::new(ManualClock::default()));
        let mine = tokens.issue(&email("s@x.edu")).unwrap().access_token;
        let victim = tokens.issue(&email("victim@x.edu")).unwrap().access_token;

        // Victim's header and payload under my signature.
        let (victim_body, _) = victim.rsplit_once('.').unwrap();
        let (_, my_signature) = mine.rsplit_once('.').unwrap();
        let tampered = format!("{victim_body}.{my_signature}");

        assert_eq!(tokens.validate(&tampered), Err(TokenError::Invalid));
        assert_eq!(tokens.validate("not.a.jwt"), Err(TokenError::Invalid));
        assert_eq!(tokens.validate(""), Err(TokenError::Invalid));
    }

    #[test]
    fn token_from_another_secret_is_invalid() {
        let clock = Arc::new(ManualClock::default());
        let ours = service(clock.clone());
        let theirs = TokenService::new(b"some-other-secret", Duration::minutes(60), clock).unwrap();

        let foreign = theirs.issue(&email("s@x.edu")).unwrap();
        assert_eq!(ours.validate(&foreign.access_token), Err(TokenError::Invalid));
    }

    #[test]
    fn malformed_subject_is_invalid() {
        let clock = Arc::new(ManualClock::default());
        let tokens = service(clock.clone());
        let now = clock.now_secs();

        let forged = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "sub": "not-an-email", "iat": now, "exp": now + 60 }),
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert_eq!(tokens.validate(&forged), Err(TokenError::Invalid));
    }

    #[test]
    fn missing_expiry_is_invalid() {
        let tokens = service(Arc::new(ManualClock::default()));
        let forged = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "sub": "s@x.edu" }),
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert_eq!(tokens.validate(&forged), Err(TokenError::Invalid));
    }

    #[test]
    fn rejects_bad_configuration() {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::default());
        assert!(matches!(
            TokenService::new(b"", Duration::minutes(1), clock.clone()),
            Err(TokenError::Configuration(_))
        ));
        assert!(matches!(
            TokenService::new(SECRET, Duration::zero(), clock.clone()),
            Err(TokenError::Configuration(_))
        ));
        assert!(matches!(
            TokenService::new(SECRET, Duration::minutes(1_000_000_000_000), clock.clone()),
            Err(TokenError::Configuration(_))
        ));
        assert!(TokenService::new(SECRET, Duration::minutes(TokenService::MAX_TTL_MINUTES), clock).is_ok());
    }

    #[test]
    fn expiry_past_the_calendar_end_is_an_error_not_a_panic() {
        let clock = Arc::new(ManualClock::default());
        let tokens = service(clock.clone());
        clock.set(chrono::DateTime::<chrono::Utc>::MAX_UTC - Duration::minutes(1));

        assert!(matches!(
            tokens.issue(&email("s@x.edu")),
            Err(TokenError::Configuration(_))
        ));
    }
}
