//! `mergington-core`: shared domain building blocks.
//!
//! This crate contains **pure domain** primitives (no storage, no transport).

pub mod clock;
pub mod email;
pub mod error;
pub mod id;

#[cfg(any(test, feature = "testing"))]
pub use clock::ManualClock;
pub use clock::{Clock, SystemClock};
pub use email::Email;
pub use error::DomainError;
pub use id::UserId;
