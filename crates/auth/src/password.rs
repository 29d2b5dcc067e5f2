//! Password policy and hashing.
//!
//! Passwords are only ever stored as Argon2id hashes in PHC string format
//! (`$argon2id$v=19$...`), each with its own random salt.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::{Rng, distributions::Alphanumeric, rngs::OsRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a candidate password was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyViolation {
    #[error("password must be at least {min} characters")]
    TooShort { min: usize },

    #[error("password must be at most {max} characters")]
    TooLong { max: usize },

    #[error("password cannot be blank")]
    Blank,

    #[error("password must contain a letter")]
    MissingLetter,

    #[error("password must contain a digit or symbol")]
    MissingNonLetter,
}

/// Password acceptance rules applied on registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    min_length: usize,
}

impl PasswordPolicy {
    pub const DEFAULT_MIN_LENGTH: usize = 4;
    pub const MAX_LENGTH: usize = 128;

    /// Policy with a custom minimum length (clamped to `1..=MAX_LENGTH`).
    pub fn with_min_length(min_length: usize) -> Self {
        Self {
            min_length: min_length.clamp(1, Self::MAX_LENGTH),
        }
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn check(&self, raw: &str) -> Result<(), PolicyViolation> {
        if raw.trim().is_empty() {
            return Err(PolicyViolation::Blank);
        }

        let len = raw.chars().count();
        if len < self.min_length {
            return Err(PolicyViolation::TooShort { min: self.min_length });
        }
        if len > Self::MAX_LENGTH {
            return Err(PolicyViolation::TooLong { max: Self::MAX_LENGTH });
        }

        if !raw.chars().any(char::is_alphabetic) {
            return Err(PolicyViolation::MissingLetter);
        }
        if !raw.chars().any(|c| !c.is_alphabetic() && !c.is_whitespace()) {
            return Err(PolicyViolation::MissingNonLetter);
        }

        Ok(())
    }
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::with_min_length(Self::DEFAULT_MIN_LENGTH)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("password hashing failed: {0}")]
pub struct HashError(String);

/// A salted Argon2id hash in PHC string format.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HashedPassword(String);

impl HashedPassword {
    /// Hash a raw password with a fresh random salt.
    pub fn hash(raw: &str) -> Result<Self, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        let phc = Argon2::default()
            .hash_password(raw.as_bytes(), &salt)
            .map_err(|e| HashError(e.to_string()))?
            .to_string();
        Ok(Self(phc))
    }

    /// Hash of a random secret nobody knows.
    ///
    /// Used for accounts that must exist but cannot log in (seeded roster
    /// entries).
    pub fn unusable() -> Result<Self, HashError> {
        let secret: String = OsRng
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        Self::hash(&secret)
    }

    /// Accept a previously stored PHC string.
    pub fn from_phc(phc: impl Into<String>) -> Result<Self, HashError> {
        let phc = phc.into();
        PasswordHash::new(&phc).map_err(|e| HashError(e.to_string()))?;
        Ok(Self(phc))
    }

    pub fn as_phc(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison of `raw` against this hash.
    pub fn verify(&self, raw: &str) -> bool {
        match PasswordHash::new(&self.0) {
            Ok(parsed) => Argon2::default()
                .verify_password(raw.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

impl core::fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("HashedPassword(..)")
    }
}

impl TryFrom<String> for HashedPassword {
    type Error = HashError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_phc(value)
    }
}

impl From<HashedPassword> for String {
    fn from(value: HashedPassword) -> Self {
        value.0
    }
}
