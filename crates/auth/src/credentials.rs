//! Credential storage and verification.
//!
//! [`CredentialStore`] owns the `users` table: email → password hash. It is the
//! only place accounts are created, and accounts are immutable afterwards.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use mergington_core::{Clock, Email, SystemClock, UserId};

use crate::password::{HashError, HashedPassword, PasswordPolicy, PolicyViolation};

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub password_hash: HashedPassword,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("user already exists")]
    DuplicateUser,

    #[error("weak password: {0}")]
    WeakPassword(#[from] PolicyViolation),

    /// Unknown email and wrong password are deliberately indistinguishable.
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Hashing(#[from] HashError),

    #[error("credential store lock poisoned")]
    StorePoisoned,
}

/// Storage seam for user records.
pub trait UserStore: Send + Sync {
    /// Insert `user` unless its email is taken. Check and insert are atomic.
    fn insert(&self, user: User) -> Result<(), CredentialError>;
    fn get(&self, email: &Email) -> Result<Option<User>, CredentialError>;
    /// All users ordered by email.
    fn list(&self) -> Result<Vec<User>, CredentialError>;
    fn len(&self) -> Result<usize, CredentialError>;
}

impl<S> UserStore for Arc<S>
where
    S: UserStore + ?Sized,
{
    fn insert(&self, user: User) -> Result<(), CredentialError> {
        (**self).insert(user)
    }

    fn get(&self, email: &Email) -> Result<Option<User>, CredentialError> {
        (**self).get(email)
    }

    fn list(&self) -> Result<Vec<User>, CredentialError> {
        (**self).list()
    }

    fn len(&self) -> Result<usize, CredentialError> {
        (**self).len()
    }
}

/// In-memory user table.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<HashMap<Email, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for InMemoryUserStore {
    fn insert(&self, user: User) -> Result<(), CredentialError> {
        let mut users = self
            .inner
            .write()
            .map_err(|_| CredentialError::StorePoisoned)?;

        match users.entry(user.email.clone()) {
            std::collections::hash_map::Entry::Occupied(_) => Err(CredentialError::DuplicateUser),
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(user);
                Ok(())
            }
        }
    }

    fn get(&self, email: &Email) -> Result<Option<User>, CredentialError> {
        let users = self
            .inner
            .read()
            .map_err(|_| CredentialError::StorePoisoned)?;
        Ok(users.get(email).cloned())
    }

    fn list(&self) -> Result<Vec<User>, CredentialError> {
        let users = self
            .inner
            .read()
            .map_err(|_| CredentialError::StorePoisoned)?;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(all)
    }

    fn len(&self) -> Result<usize, CredentialError> {
        let users = self
            .inner
            .read()
            .map_err(|_| CredentialError::StorePoisoned)?;
        Ok(users.len())
    }
}

/// Registers and verifies credentials.
pub struct CredentialStore {
    users: Box<dyn UserStore>,
    policy: PasswordPolicy,
    clock: Arc<dyn Clock>,
}

impl CredentialStore {
    /// In-memory store with the default password policy.
    pub fn in_memory() -> Self {
        Self::new(
            Box::new(InMemoryUserStore::new()),
            PasswordPolicy::default(),
            Arc::new(SystemClock),
        )
    }

    pub fn new(users: Box<dyn UserStore>, policy: PasswordPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> PasswordPolicy {
        self.policy
    }

    /// Create an account.
    ///
    /// The password is hashed before the store is touched, so the store lock
    /// is only held for the existence check and the insert.
    pub fn register(&self, email: &Email, raw_password: &str) -> Result<User, CredentialError> {
        self.policy.check(raw_password)?;

        let user = User {
            id: UserId::new(),
            email: email.clone(),
            password_hash: HashedPassword::hash(raw_password)?,
            created_at: self.clock.now(),
        };

        self.users.insert(user.clone())?;
        tracing::info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(user)
    }

    /// Check an email/password pair. Never mutates state.
    pub fn verify(&self, email: &str, raw_password: &str) -> Result<User, CredentialError> {
        let Ok(email) = Email::parse(email) else {
            burn_dummy_verification(raw_password);
            return Err(CredentialError::InvalidCredentials);
        };

        match self.users.get(&email)? {
            Some(user) if user.password_hash.verify(raw_password) => Ok(user),
            Some(_) => Err(CredentialError::InvalidCredentials),
            None => {
                burn_dummy_verification(raw_password);
                Err(CredentialError::InvalidCredentials)
            }
        }
    }

    pub fn find(&self, email: &Email) -> Result<Option<User>, CredentialError> {
        self.users.get(email)
    }

    /// Insert an existing record verbatim (snapshot restore, seeding).
    pub fn import(&self, user: User) -> Result<(), CredentialError> {
        self.users.insert(user)
    }

    /// Provision an account that exists but has no known password.
    pub fn provision_locked(&self, email: &Email) -> Result<User, CredentialError> {
        let user = User {
            id: UserId::new(),
            email: email.clone(),
            password_hash: HashedPassword::unusable()?,
            created_at: self.clock.now(),
        };
        self.users.insert(user.clone())?;
        tracing::debug!(email = %user.email, "locked account provisioned");
        Ok(user)
    }

    pub fn users(&self) -> Result<Vec<User>, CredentialError> {
        self.users.list()
    }

    pub fn len(&self) -> Result<usize, CredentialError> {
        self.users.len()
    }

    pub fn is_empty(&self) -> Result<bool, CredentialError> {
        Ok(self.users.len()? == 0)
    }
}

impl core::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Spend roughly the cost of a real verification so unknown emails are not
/// distinguishable by response time.
fn burn_dummy_verification(raw_password: &str) {
    static DUMMY: OnceLock<Option<HashedPassword>> = OnceLock::new();
    if let Some(hash) = DUMMY.get_or_init(|| HashedPassword::unusable().ok()) {
        let _ = hash.verify(raw_password);
    }
}
