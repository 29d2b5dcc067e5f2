use thiserror::Error;

/// Roster failures.
///
/// Every variant is returned before any state changes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("activity not found: {0}")]
    ActivityNotFound(String),

    #[error("student is already signed up")]
    AlreadyRegistered,

    #[error("activity is full")]
    ActivityFull,

    #[error("student is not signed up for this activity")]
    NotRegistered,

    #[error("activity already exists: {0}")]
    DuplicateActivity(String),

    #[error("invalid activity: {0}")]
    InvalidActivity(String),

    #[error("registry lock poisoned")]
    StorePoisoned,
}
