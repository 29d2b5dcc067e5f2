use serde::{Deserialize, Serialize};

use mergington_core::Email;

/// Identity of an authenticated caller, as resolved from a bearer token.
///
/// Only `AuthGate` constructs these outside of tests, so holding one means the
/// token was verified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    email: Email,
}

impl Principal {
    pub(crate) fn new(email: Email) -> Self {
        Self { email }
    }

    /// Build a principal without a token.
    #[cfg(any(test, feature = "testing"))]
    pub fn assume(email: Email) -> Self {
        Self::new(email)
    }

    pub fn email(&self) -> &Email {
        &self.email
    }
}

impl core::fmt::Display for Principal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.email, f)
    }
}
