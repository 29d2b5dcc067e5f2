//! Normalized email addresses.
//!
//! Emails are the primary key for accounts and roster entries, so they are
//! normalized once at construction: surrounding whitespace is trimmed and the
//! whole address is lower-cased. Comparison is therefore case-insensitive.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// RFC 5321 path limit.
const MAX_EMAIL_LEN: usize = 254;

/// A syntactically valid, normalized email address.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Parse and normalize an email address.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, DomainError> {
        let normalized = raw.as_ref().trim().to_lowercase();

        if normalized.is_empty() {
            return Err(DomainError::validation("email cannot be empty"));
        }
        if normalized.len() > MAX_EMAIL_LEN {
            return Err(DomainError::validation("email is too long"));
        }
        if normalized.chars().any(char::is_whitespace) {
            return Err(DomainError::validation("email cannot contain whitespace"));
        }

        let Some((local, domain)) = normalized.split_once('@') else {
            return Err(DomainError::validation("invalid email format"));
        };
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(DomainError::validation("invalid email format"));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Email {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Email {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        let email = Email::parse("  Student@Mergington.EDU ").unwrap();
        assert_eq!(email.as_str(), "student@mergington.edu");
    }

    #[test]
    fn differently_cased_inputs_are_equal() {
        let a = Email::parse("A@X.edu").unwrap();
        let b = Email::parse("a@x.EDU").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_malformed_addresses() {
        for raw in ["", "   ", "no-at-sign", "@x.edu", "a@", "a@b@c", "a b@x.edu"] {
            assert!(Email::parse(raw).is_err(), "accepted {raw:?}");
        }
    }

    #[test]
    fn rejects_overlong_addresses() {
        let raw = format!("{}@x.edu", "a".repeat(MAX_EMAIL_LEN));
        let err = Email::parse(raw).unwrap_err();
        assert!(err.to_string().contains("too long"));
    }

    #[test]
    fn deserialization_validates() {
        let ok: Email = serde_json::from_str("\"Emma@Mergington.edu\"").unwrap();
        assert_eq!(ok.as_str(), "emma@mergington.edu");

        let bad = serde_json::from_str::<Email>("\"emma\"");
        assert!(bad.is_err());
    }

    proptest! {
        /// Property: normalization is idempotent.
        #[test]
        fn parse_is_idempotent(local in "[A-Za-z0-9._%+-]{1,20}", domain in "[A-Za-z0-9-]{1,20}\\.[A-Za-z]{2,4}") {
            let first = Email::parse(format!("{local}@{domain}")).unwrap();
            let second = Email::parse(first.as_str()).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
