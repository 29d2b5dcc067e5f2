//! Process configuration, read from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use mergington_auth::{PasswordPolicy, TokenService};
use mergington_observability::LogFormat;

/// Used when `JWT_SECRET` is unset. Fine for local runs, never for a deployment.
pub const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid value for {key} ({value:?}): {reason}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: String,
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub password_min_length: usize,
    /// Where snapshots are read from at startup and written to; `None`
    /// keeps everything in memory only.
    pub snapshot_path: Option<PathBuf>,
    pub snapshot_interval: Duration,
    pub seed_defaults: bool,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_minutes: TokenService::DEFAULT_TTL_MINUTES,
            password_min_length: PasswordPolicy::DEFAULT_MIN_LENGTH,
            snapshot_path: None,
            snapshot_interval: Duration::from_secs(30),
            seed_defaults: true,
            log_format: LogFormat::Json,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token_ttl_minutes = parse_or(&get, "TOKEN_TTL_MINUTES", defaults.token_ttl_minutes)?;
        if !(1..=TokenService::MAX_TTL_MINUTES).contains(&token_ttl_minutes) {
            return Err(invalid(
                "TOKEN_TTL_MINUTES",
                token_ttl_minutes,
                format!("must be between 1 and {}", TokenService::MAX_TTL_MINUTES),
            ));
        }

        let password_min_length = parse_or(&get, "PASSWORD_MIN_LENGTH", defaults.password_min_length)?;
        if password_min_length == 0 || password_min_length > PasswordPolicy::MAX_LENGTH {
            return Err(invalid(
                "PASSWORD_MIN_LENGTH",
                password_min_length,
                format!("must be between 1 and {}", PasswordPolicy::MAX_LENGTH),
            ));
        }

        let interval_secs: u64 = parse_or(&get, "SNAPSHOT_INTERVAL_SECS", defaults.snapshot_interval.as_secs())?;
        if interval_secs == 0 {
            return Err(invalid("SNAPSHOT_INTERVAL_SECS", interval_secs, "must be positive"));
        }

        let seed_defaults = match get("SEED_DEFAULTS") {
            None => defaults.seed_defaults,
            Some(raw) => parse_bool(&raw).ok_or_else(|| invalid("SEED_DEFAULTS", &raw, "expected true or false"))?,
        };

        let log_format = match get("LOG_FORMAT") {
            None => defaults.log_format,
            Some(raw) => raw.parse::<LogFormat>().map_err(|reason| invalid("LOG_FORMAT", &raw, reason))?,
        };

        Ok(Self {
            bind_addr: parse_or(&get, "BIND_ADDR", defaults.bind_addr)?,
            jwt_secret: get("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            token_ttl_minutes,
            password_min_length,
            snapshot_path: get("SNAPSHOT_PATH").map(PathBuf::from),
            snapshot_interval: Duration::from_secs(interval_secs),
            seed_defaults,
            log_format,
        })
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    pub fn token_ttl(&self) -> Result<chrono::TimeDelta, ConfigError> {
        chrono::TimeDelta::try_minutes(self.token_ttl_minutes)
            .ok_or_else(|| invalid("TOKEN_TTL_MINUTES", self.token_ttl_minutes, "out of range"))
    }

    pub fn password_policy(&self) -> PasswordPolicy {
        PasswordPolicy::with_min_length(self.password_min_length)
    }
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .field("password_min_length", &self.password_min_length)
            .field("snapshot_path", &self.snapshot_path)
            .field("snapshot_interval", &self.snapshot_interval)
            .field("seed_defaults", &self.seed_defaults)
            .field("log_format", &self.log_format)
            .finish()
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| invalid(key, &raw, e.to_string())),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn invalid(key: &'static str, value: impl core::fmt::Display, reason: impl Into<String>) -> ConfigError {
    ConfigError {
        key,
        value: value.to_string(),
        reason: reason.into(),
    }
}
