use thiserror::Error;

use mergington_core::Email;

use crate::Principal;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: callers may only act on their own email")]
    Forbidden,
}

/// Students may only sign up or unregister themselves.
///
/// - No IO
/// - No panics
pub fn authorize_self(principal: &Principal, target: &Email) -> Result<(), AuthzError> {
    if principal.email() == target {
        Ok(())
    } else {
        Err(AuthzError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_email_is_allowed_regardless_of_case() {
        let principal = Principal::assume(Email::parse("Emma@Mergington.edu").unwrap());
        let target = Email::parse("emma@mergington.EDU").unwrap();
        assert_eq!(authorize_self(&principal, &target), Ok(()));
    }

    #[test]
    fn other_email_is_forbidden() {
        let principal = Principal::assume(Email::parse("emma@mergington.edu").unwrap());
        let target = Email::parse("sophia@mergington.edu").unwrap();
        assert_eq!(authorize_self(&principal, &target), Err(AuthzError::Forbidden));
    }
}
