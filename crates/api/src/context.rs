use mergington_auth::Principal;
use mergington_core::Email;

/// Authenticated caller for a request.
///
/// Inserted by the auth middleware; present on every protected route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    principal: Principal,
}

impl CallerContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn email(&self) -> &Email {
        self.principal.email()
    }
}
