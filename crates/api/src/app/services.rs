//! Service wiring and the registration use cases.
//!
//! `RegistrationService` is the only thing handlers talk to. It owns the
//! credential store, the token service and the activity registry, and turns
//! their errors into one `ServiceError` taxonomy.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use thiserror::Error;

use mergington_activities::{Activity, ActivityRegistry, RegistryError, default_catalog};
use mergington_auth::{
    AuthError, AuthGate, AuthzError, CredentialError, CredentialStore, InMemoryUserStore, IssuedToken,
    PolicyViolation, Principal, TokenError, TokenService, User, authorize_self,
};
use mergington_core::{Clock, Email, SystemClock};
use mergington_infra::{Snapshot, SnapshotError};

use crate::config::AppConfig;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("invalid request: {0}")]
    InvalidInput(String),

    #[error("user already exists")]
    DuplicateUser,

    #[error("weak password: {0}")]
    WeakPassword(PolicyViolation),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden: you can only manage your own registrations")]
    Forbidden,

    #[error("activity not found: {0}")]
    ActivityNotFound(String),

    #[error("student is already signed up")]
    AlreadyRegistered,

    #[error("activity is full")]
    ActivityFull,

    #[error("student is not signed up for this activity")]
    NotRegistered,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<CredentialError> for ServiceError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::DuplicateUser => Self::DuplicateUser,
            CredentialError::WeakPassword(v) => Self::WeakPassword(v),
            CredentialError::InvalidCredentials => Self::InvalidCredentials,
            CredentialError::Hashing(_) | CredentialError::StorePoisoned => Self::Internal(err.to_string()),
        }
    }
}

impl From<RegistryError> for ServiceError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::ActivityNotFound(name) => Self::ActivityNotFound(name),
            RegistryError::AlreadyRegistered => Self::AlreadyRegistered,
            RegistryError::ActivityFull => Self::ActivityFull,
            RegistryError::NotRegistered => Self::NotRegistered,
            RegistryError::DuplicateActivity(_)
            | RegistryError::InvalidActivity(_)
            | RegistryError::StorePoisoned => Self::Internal(err.to_string()),
        }
    }
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthorized => Self::Unauthorized,
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Forbidden => Self::Forbidden,
        }
    }
}

impl From<TokenError> for ServiceError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired | TokenError::Invalid => Self::Unauthorized,
            TokenError::Signing(_) | TokenError::Configuration(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<SnapshotError> for ServiceError {
    fn from(err: SnapshotError) -> Self {
        Self::Internal(err.to_string())
    }
}

pub struct RegistrationService {
    credentials: CredentialStore,
    tokens: Arc<TokenService>,
    gate: AuthGate,
    registry: ActivityRegistry,
}

impl RegistrationService {
    pub fn new(credentials: CredentialStore, tokens: Arc<TokenService>, registry: ActivityRegistry) -> Self {
        Self {
            credentials,
            gate: AuthGate::new(tokens.clone()),
            tokens,
            registry,
        }
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn registry(&self) -> &ActivityRegistry {
        &self.registry
    }

    pub fn gate(&self) -> &AuthGate {
        &self.gate
    }

    /// Create a student account.
    pub fn signup(&self, email: &str, password: &str) -> Result<User, ServiceError> {
        let email = parse_email(email)?;
        self.credentials.register(&email, password).map_err(|e| {
            tracing::debug!(email = %email, error = %e, "account signup rejected");
            ServiceError::from(e)
        })
    }

    /// Exchange credentials for a bearer token.
    pub fn login(&self, email: &str, password: &str) -> Result<IssuedToken, ServiceError> {
        let user = self.credentials.verify(email, password).map_err(|e| {
            tracing::debug!(error = %e, "login rejected");
            ServiceError::from(e)
        })?;

        let issued = self.tokens.issue(&user.email)?;
        tracing::info!(user_id = %user.id, email = %user.email, "login succeeded");
        Ok(issued)
    }

    /// Resolve a raw bearer token to the caller.
    pub fn authenticate(&self, token: &str) -> Result<Principal, ServiceError> {
        Ok(self.gate.authenticate(token)?)
    }

    /// Every activity with its current roster, ordered by name. Public.
    pub fn activities(&self) -> Result<Vec<Activity>, ServiceError> {
        Ok(self.registry.list()?)
    }

    pub fn signup_for_activity(
        &self,
        caller: &Principal,
        activity: &str,
        email: &str,
    ) -> Result<(), ServiceError> {
        let email = self.authorize(caller, email)?;
        Ok(self.registry.signup(activity, &email)?)
    }

    pub fn unregister(&self, caller: &Principal, activity: &str, email: &str) -> Result<(), ServiceError> {
        let email = self.authorize(caller, email)?;
        Ok(self.registry.unregister(activity, &email)?)
    }

    /// Students act only on their own email, and only with an account.
    ///
    /// A validly signed token is not enough: rosters may only reference
    /// emails present in the credential store.
    fn authorize(&self, caller: &Principal, email: &str) -> Result<Email, ServiceError> {
        let email = parse_email(email)?;
        authorize_self(caller, &email).map_err(|e| {
            tracing::warn!(caller = %caller, target = %email, "cross-account roster change refused");
            ServiceError::from(e)
        })?;

        if self.credentials.find(&email)?.is_none() {
            tracing::warn!(caller = %caller, "token subject has no account");
            return Err(ServiceError::Unauthorized);
        }
        Ok(email)
    }

    /// Capture both stores and write them to `path`.
    pub async fn write_snapshot(&self, path: &Path) -> Result<(), ServiceError> {
        let snapshot = Snapshot::capture(&self.credentials, &self.registry)?;
        snapshot.save_to_file(path).await?;
        Ok(())
    }
}

impl core::fmt::Debug for RegistrationService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RegistrationService")
            .field("credentials", &self.credentials)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

fn parse_email(raw: &str) -> Result<Email, ServiceError> {
    Email::parse(raw).map_err(|e| ServiceError::InvalidInput(e.to_string()))
}

/// Build the service graph for `config`.
///
/// State comes from the snapshot file when one is configured and present;
/// otherwise the default catalog is seeded (if enabled).
pub async fn build_services(config: &AppConfig) -> anyhow::Result<Arc<RegistrationService>> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let tokens = TokenService::new(config.jwt_secret.as_bytes(), config.token_ttl()?, clock.clone())
        .context("failed to configure token service")?;
    let credentials = CredentialStore::new(Box::new(InMemoryUserStore::new()), config.password_policy(), clock);
    let registry = ActivityRegistry::new();

    if let Some(path) = &config.snapshot_path {
        let loaded = Snapshot::load_from_file(path)
            .await
            .with_context(|| format!("failed to read snapshot {}", path.display()))?;
        match loaded {
            Some(snapshot) => {
                snapshot
                    .restore(&credentials, &registry)
                    .with_context(|| format!("failed to restore snapshot {}", path.display()))?;
            }
            None => tracing::info!(path = %path.display(), "no snapshot yet; starting empty"),
        }
    }

    if config.seed_defaults && registry.is_empty()? {
        seed_defaults(&credentials, &registry).context("failed to seed default activities")?;
    }

    Ok(Arc::new(RegistrationService::new(credentials, Arc::new(tokens), registry)))
}

/// Seed the default catalog. Seeded participants get locked accounts so every
/// roster entry refers to a known user.
fn seed_defaults(credentials: &CredentialStore, registry: &ActivityRegistry) -> Result<(), ServiceError> {
    let catalog = default_catalog()?;

    for activity in &catalog {
        for email in activity.participants() {
            if credentials.find(email)?.is_none() {
                credentials.provision_locked(email)?;
            }
        }
    }

    let seeded = registry.seed_if_empty(catalog)?;
    tracing::info!(activities = seeded, "default activities seeded");
    Ok(())
}
