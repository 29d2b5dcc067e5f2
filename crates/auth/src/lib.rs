//! `mergington-auth`: credentials, bearer tokens and request authentication.
//!
//! This crate is intentionally decoupled from HTTP.

pub mod authorize;
pub mod claims;
pub mod credentials;
pub mod gate;
pub mod password;
pub mod principal;
pub mod token;

pub use authorize::{AuthzError, authorize_self};
pub use claims::{ClaimsError, TokenClaims, validate_claims};
pub use credentials::{CredentialError, CredentialStore, InMemoryUserStore, User, UserStore};
pub use gate::{AuthError, AuthGate};
pub use password::{HashError, HashedPassword, PasswordPolicy, PolicyViolation};
pub use principal::Principal;
pub use token::{IssuedToken, TokenError, TokenService};
