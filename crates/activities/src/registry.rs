//! Thread-safe activity registry.
//!
//! Locking is two-level:
//! - the name → activity map sits behind an `RwLock`. Roster operations only
//!   ever take it for reading, just long enough to clone the activity's handle;
//! - each activity sits behind its own `Mutex`, held for the whole
//!   check-and-mutate step of `signup` / `unregister`.
//!
//! Two signups on the same activity therefore serialize, while signups on
//! different activities never contend.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};

use mergington_core::Email;

use crate::activity::Activity;
use crate::error::RegistryError;

#[derive(Debug, Default)]
pub struct ActivityRegistry {
    activities: RwLock<BTreeMap<String, Arc<Mutex<Activity>>>>,
}

impl ActivityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from definitions; names must be unique.
    pub fn from_activities(activities: impl IntoIterator<Item = Activity>) -> Result<Self, RegistryError> {
        let registry = Self::new();
        for activity in activities {
            registry.insert(activity)?;
        }
        Ok(registry)
    }

    pub fn insert(&self, activity: Activity) -> Result<(), RegistryError> {
        let mut map = self
            .activities
            .write()
            .map_err(|_| RegistryError::StorePoisoned)?;

        if map.contains_key(activity.name()) {
            return Err(RegistryError::DuplicateActivity(activity.name().to_string()));
        }
        map.insert(activity.name().to_string(), Arc::new(Mutex::new(activity)));
        Ok(())
    }

    /// Insert `activities` only if the registry is empty. Returns how many
    /// were inserted (0 when something was already there).
    pub fn seed_if_empty(&self, activities: Vec<Activity>) -> Result<usize, RegistryError> {
        let mut map = self
            .activities
            .write()
            .map_err(|_| RegistryError::StorePoisoned)?;
        if !map.is_empty() {
            return Ok(0);
        }

        let mut staged = BTreeMap::new();
        for activity in activities {
            let name = activity.name().to_string();
            if staged.contains_key(&name) {
                return Err(RegistryError::DuplicateActivity(name));
            }
            staged.insert(name, Arc::new(Mutex::new(activity)));
        }

        let inserted = staged.len();
        *map = staged;
        Ok(inserted)
    }

    /// Snapshot of every activity, ordered by name.
    ///
    /// Each activity is copied under its own lock, so every roster in the
    /// result is internally consistent.
    pub fn list(&self) -> Result<Vec<Activity>, RegistryError> {
        let map = self
            .activities
            .read()
            .map_err(|_| RegistryError::StorePoisoned)?;

        map.values()
            .map(|slot| {
                slot.lock()
                    .map(|activity| activity.clone())
                    .map_err(|_| RegistryError::StorePoisoned)
            })
            .collect()
    }

    pub fn get(&self, name: &str) -> Result<Activity, RegistryError> {
        let slot = self.slot(name)?;
        let activity = slot.lock().map_err(|_| RegistryError::StorePoisoned)?;
        Ok(activity.clone())
    }

    pub fn len(&self) -> Result<usize, RegistryError> {
        let map = self
            .activities
            .read()
            .map_err(|_| RegistryError::StorePoisoned)?;
        Ok(map.len())
    }

    pub fn is_empty(&self) -> Result<bool, RegistryError> {
        Ok(self.len()? == 0)
    }

    /// Add `email` to the roster of `name`.
    pub fn signup(&self, name: &str, email: &Email) -> Result<(), RegistryError> {
        let slot = self.slot(name)?;
        let mut activity = slot.lock().map_err(|_| RegistryError::StorePoisoned)?;

        if let Err(e) = activity.enroll(email) {
            tracing::debug!(activity = name, email = %email, error = %e, "signup rejected");
            return Err(e);
        }

        tracing::info!(
            activity = name,
            email = %email,
            participants = activity.participant_count(),
            max_participants = activity.max_participants(),
            "student signed up"
        );
        Ok(())
    }

    /// Remove `email` from the roster of `name`.
    pub fn unregister(&self, name: &str, email: &Email) -> Result<(), RegistryError> {
        let slot = self.slot(name)?;
        let mut activity = slot.lock().map_err(|_| RegistryError::StorePoisoned)?;

        if let Err(e) = activity.withdraw(email) {
            tracing::debug!(activity = name, email = %email, error = %e, "unregister rejected");
            return Err(e);
        }

        tracing::info!(
            activity = name,
            email = %email,
            participants = activity.participant_count(),
            "student unregistered"
        );
        Ok(())
    }

    fn slot(&self, name: &str) -> Result<Arc<Mutex<Activity>>, RegistryError> {
        let map = self
            .activities
            .read()
            .map_err(|_| RegistryError::StorePoisoned)?;
        map.get(name)
            .cloned()
            .ok_or_else(|| RegistryError::ActivityNotFound(name.to_string()))
    }
}
