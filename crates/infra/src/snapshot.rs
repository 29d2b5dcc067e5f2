//! JSON snapshots of the credential store and the activity registry.
//!
//! A snapshot is three logical tables:
//!
//! - `users(email PK, id, password_hash, created_at)`
//! - `activities(name PK, description, schedule, max_participants)`
//! - `registrations(activity_name FK, email FK, UNIQUE(activity_name, email))`
//!
//! [`Snapshot::validate`] enforces those keys plus capacity before anything is
//! restored, so a hand-edited or truncated file never produces a registry that
//! breaks roster invariants.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use mergington_activities::{Activity, ActivityRegistry, RegistryError};
use mergington_auth::{CredentialError, CredentialStore, User};
use mergington_core::Email;

/// Current file format version.
const SNAPSHOT_VERSION: u8 = 1;

fn validate_version<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let version = u8::deserialize(deserializer)?;
    if version != SNAPSHOT_VERSION {
        return Err(serde::de::Error::custom(format!(
            "unsupported snapshot version {version}; only version {SNAPSHOT_VERSION} is supported"
        )));
    }
    Ok(version)
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot violates constraint: {0}")]
    Constraint(String),

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("snapshot file io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot (de)serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRow {
    pub name: String,
    pub description: String,
    pub schedule: String,
    pub max_participants: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRow {
    pub activity_name: String,
    pub email: Email,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "_v", deserialize_with = "validate_version")]
    pub version: u8,
    pub taken_at: DateTime<Utc>,
    pub users: Vec<User>,
    pub activities: Vec<ActivityRow>,
    pub registrations: Vec<RegistrationRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreSummary {
    pub users: usize,
    pub activities: usize,
    pub registrations: usize,
}

impl Snapshot {
    /// Copy the current state of both stores.
    ///
    /// Rosters are read before users. Accounts are never removed and a
    /// roster entry is only added for an existing account, so every email
    /// in the rosters copied first is still present when users are read.
    /// The copy satisfies the email foreign key while requests keep running.
    pub fn capture(credentials: &CredentialStore, registry: &ActivityRegistry) -> Result<Self, SnapshotError> {
        let activities = registry.list()?;
        let users = credentials.users()?;

        let mut activity_rows = Vec::with_capacity(activities.len());
        let mut registrations = Vec::new();
        for activity in &activities {
            activity_rows.push(ActivityRow {
                name: activity.name().to_string(),
                description: activity.description().to_string(),
                schedule: activity.schedule().to_string(),
                max_participants: activity.max_participants(),
            });
            registrations.extend(activity.participants().map(|email| RegistrationRow {
                activity_name: activity.name().to_string(),
                email: email.clone(),
            }));
        }

        Ok(Self {
            version: SNAPSHOT_VERSION,
            taken_at: Utc::now(),
            users,
            activities: activity_rows,
            registrations,
        })
    }

    /// Check primary keys, foreign keys, uniqueness and capacity.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let mut emails = HashSet::new();
        for user in &self.users {
            if !emails.insert(&user.email) {
                return Err(constraint(format!("duplicate user {}", user.email)));
            }
        }

        let mut capacity: BTreeMap<&str, u32> = BTreeMap::new();
        for activity in &self.activities {
            if activity.max_participants == 0 {
                return Err(constraint(format!("{}: max_participants must be positive", activity.name)));
            }
            if capacity.insert(&activity.name, activity.max_participants).is_some() {
                return Err(constraint(format!("duplicate activity {}", activity.name)));
            }
        }

        let mut pairs = HashSet::new();
        let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
        for row in &self.registrations {
            let Some(max) = capacity.get(row.activity_name.as_str()) else {
                return Err(constraint(format!(
                    "registration references unknown activity {}",
                    row.activity_name
                )));
            };
            if !emails.contains(&row.email) {
                return Err(constraint(format!("registration references unknown user {}", row.email)));
            }
            if !pairs.insert((row.activity_name.as_str(), &row.email)) {
                return Err(constraint(format!(
                    "duplicate registration of {} in {}",
                    row.email, row.activity_name
                )));
            }

            let count = counts.entry(row.activity_name.as_str()).or_default();
            *count += 1;
            if *count > *max {
                return Err(constraint(format!(
                    "{} exceeds capacity {max}",
                    row.activity_name
                )));
            }
        }

        Ok(())
    }

    /// Load this snapshot into empty stores.
    ///
    /// Nothing is written unless the snapshot validates and both targets are
    /// empty.
    pub fn restore(
        &self,
        credentials: &CredentialStore,
        registry: &ActivityRegistry,
    ) -> Result<RestoreSummary, SnapshotError> {
        self.validate()?;
        if !credentials.is_empty()? || !registry.is_empty()? {
            return Err(constraint("restore target is not empty"));
        }

        let mut rosters: BTreeMap<&str, BTreeSet<Email>> = BTreeMap::new();
        for row in &self.registrations {
            rosters
                .entry(row.activity_name.as_str())
                .or_default()
                .insert(row.email.clone());
        }

        let activities = self
            .activities
            .iter()
            .map(|row| {
                Activity::new(&row.name, &row.description, &row.schedule, row.max_participants)?
                    .with_participants(rosters.remove(row.name.as_str()).unwrap_or_default())
            })
            .collect::<Result<Vec<_>, RegistryError>>()?;

        for user in &self.users {
            credentials.import(user.clone())?;
        }
        for activity in activities {
            registry.insert(activity)?;
        }

        let summary = RestoreSummary {
            users: self.users.len(),
            activities: self.activities.len(),
            registrations: self.registrations.len(),
        };
        tracing::info!(
            users = summary.users,
            activities = summary.activities,
            registrations = summary.registrations,
            "snapshot restored"
        );
        Ok(summary)
    }

    /// Write the snapshot as pretty JSON, atomically (temp file + rename).
    /// Validate, then write atomically through a sibling `.tmp` file. A
    /// snapshot that could not be restored never reaches disk.
    pub async fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        self.validate()?;
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(self)?;
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;

        tracing::debug!(path = %path.display(), users = self.users.len(), "snapshot written");
        Ok(())
    }

    /// Read a snapshot; `None` when the file does not exist yet.
    pub async fn load_from_file(path: impl AsRef<Path>) -> Result<Option<Self>, SnapshotError> {
        match tokio::fs::read(path.as_ref()).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn constraint(msg: impl Into<String>) -> SnapshotError {
    SnapshotError::Constraint(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    fn populated() -> (CredentialStore, ActivityRegistry) {
        let credentials = CredentialStore::in_memory();
        credentials.register(&email("a@x.edu"), "Pw1!").unwrap();
        credentials.register(&email("b@x.edu"), "Pw2!").unwrap();

        let registry = ActivityRegistry::from_activities([
            Activity::new("Chess Club", "Strategy", "Fridays", 2).unwrap(),
            Activity::new("Art Club", "Painting", "Thursdays", 5).unwrap(),
        ])
        .unwrap();
        registry.signup("Chess Club", &email("a@x.edu")).unwrap();
        registry.signup("Chess Club", &email("b@x.edu")).unwrap();
        registry.signup("Art Club", &email("b@x.edu")).unwrap();

        (credentials, registry)
    }

    #[test]
    fn capture_produces_three_tables() {
        let (credentials, registry) = populated();
        let snapshot = Snapshot::capture(&credentials, &registry).unwrap();

        assert_eq!(snapshot.users.len(), 2);
        assert_eq!(snapshot.activities.len(), 2);
        assert_eq!(snapshot.registrations.len(), 3);
        snapshot.validate().unwrap();
    }

    #[test]
    fn restore_reproduces_state_and_credentials() {
        let (credentials, registry) = populated();
        let snapshot = Snapshot::capture(&credentials, &registry).unwrap();

        let restored_credentials = CredentialStore::in_memory();
        let restored_registry = ActivityRegistry::new();
        let summary = snapshot.restore(&restored_credentials, &restored_registry).unwrap();

        assert_eq!(
            summary,
            RestoreSummary {
                users: 2,
                activities: 2,
                registrations: 3
            }
        );
        assert_eq!(restored_registry.list().unwrap(), registry.list().unwrap());
        assert!(restored_credentials.verify("a@x.edu", "Pw1!").is_ok());

        // Capacity still enforced after restore.
        assert_eq!(
            restored_registry.signup("Chess Club", &email("c@x.edu")),
            Err(RegistryError::ActivityFull)
        );
    }

    #[test]
    fn restore_refuses_non_empty_targets() {
        let (credentials, registry) = populated();
        let snapshot = Snapshot::capture(&credentials, &registry).unwrap();

        let err = snapshot.restore(&credentials, &registry).unwrap_err();
        assert!(matches!(err, SnapshotError::Constraint(msg) if msg.contains("not empty")));
    }

    #[test]
    fn validate_catches_each_constraint() {
        let (credentials, registry) = populated();
        let good = Snapshot::capture(&credentials, &registry).unwrap();

        let mut dup_user = good.clone();
        dup_user.users.push(dup_user.users[0].clone());

        let mut unknown_activity = good.clone();
        unknown_activity.registrations.push(RegistrationRow {
            activity_name: "Knitting".into(),
            email: email("a@x.edu"),
        });

        let mut unknown_user = good.clone();
        unknown_user.registrations.push(RegistrationRow {
            activity_name: "Art Club".into(),
            email: email("ghost@x.edu"),
        });

        let mut dup_pair = good.clone();
        dup_pair.registrations.push(RegistrationRow {
            activity_name: "Art Club".into(),
            email: email("b@x.edu"),
        });

        let mut over_capacity = good.clone();
        // Activities are captured in name order: Art Club, then Chess Club.
        over_capacity.activities[1].max_participants = 1;

        let mut zero_capacity = good.clone();
        zero_capacity.activities[0].max_participants = 0;

        for (label, snapshot, needle) in [
            ("dup user", dup_user, "duplicate user"),
            ("unknown activity", unknown_activity, "unknown activity"),
            ("unknown user", unknown_user, "unknown user"),
            ("dup pair", dup_pair, "duplicate registration"),
            ("over capacity", over_capacity, "exceeds capacity"),
            ("zero capacity", zero_capacity, "must be positive"),
        ] {
            match snapshot.validate() {
                Err(SnapshotError::Constraint(msg)) => assert!(msg.contains(needle), "{label}: {msg}"),
                other => panic!("{label}: expected constraint error, got {other:?}"),
            }
        }
    }

    #[test]
    fn unknown_version_is_rejected() {
        let (credentials, registry) = populated();
        let snapshot = Snapshot::capture(&credentials, &registry).unwrap();

        let mut json = serde_json::to_value(&snapshot).unwrap();
        json["_v"] = serde_json::json!(99);
        let err = serde_json::from_value::<Snapshot>(json).unwrap_err();
        assert!(err.to_string().contains("unsupported snapshot version"));
    }

    #[tokio::test]
    async fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("school.json");

        assert!(Snapshot::load_from_file(&path).await.unwrap().is_none());

        let (credentials, registry) = populated();
        let snapshot = Snapshot::capture(&credentials, &registry).unwrap();
        snapshot.save_to_file(&path).await.unwrap();

        let loaded = Snapshot::load_from_file(&path).await.unwrap().unwrap();
        assert_eq!(loaded, snapshot);
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn invalid_snapshot_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("school.json");

        let (credentials, registry) = populated();
        let mut snapshot = Snapshot::capture(&credentials, &registry).unwrap();
        snapshot.registrations.push(RegistrationRow {
            activity_name: "Art Club".into(),
            email: email("ghost@x.edu"),
        });

        let err = snapshot.save_to_file(&path).await.unwrap_err();
        assert!(matches!(err, SnapshotError::Constraint(msg) if msg.contains("unknown user")));
        assert!(!path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn capture_during_signups_is_always_restorable() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::thread;

        let credentials = CredentialStore::in_memory();
        let registry =
            ActivityRegistry::from_activities([Activity::new("Chess Club", "Strategy", "Fridays", 64).unwrap()])
                .unwrap();
        let done = AtomicBool::new(false);

        thread::scope(|s| {
            s.spawn(|| {
                for i in 0..16 {
                    let student = email(&format!("s{i}@x.edu"));
                    credentials.register(&student, "Pw1!").unwrap();
                    registry.signup("Chess Club", &student).unwrap();
                }
                done.store(true, Ordering::SeqCst);
            });

            while !done.load(Ordering::SeqCst) {
                Snapshot::capture(&credentials, &registry).unwrap().validate().unwrap();
            }
        });

        let last = Snapshot::capture(&credentials, &registry).unwrap();
        assert_eq!(last.registrations.len(), 16);
        last.validate().unwrap();
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("school.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        let err = Snapshot::load_from_file(&path).await.unwrap_err();
        assert!(matches!(err, SnapshotError::Serialization(_)));
    }
}
