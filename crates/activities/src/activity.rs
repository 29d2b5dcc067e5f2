use std::collections::BTreeSet;

use serde::Serialize;

use mergington_core::Email;

use crate::error::RegistryError;

/// An extracurricular activity and its roster.
///
/// # Invariants
/// - `participants.len() <= max_participants` (and `max_participants > 0`).
/// - An email appears in the roster at most once.
///
/// The roster is only changed through [`Activity::enroll`] and
/// [`Activity::withdraw`], which either apply fully or return an error with
/// the roster untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Activity {
    name: String,
    description: String,
    schedule: String,
    max_participants: u32,
    participants: BTreeSet<Email>,
}

impl Activity {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        schedule: impl Into<String>,
        max_participants: u32,
    ) -> Result<Self, RegistryError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(RegistryError::InvalidActivity("name cannot be empty".into()));
        }
        if max_participants == 0 {
            return Err(RegistryError::InvalidActivity(format!(
                "{name}: max_participants must be positive"
            )));
        }

        Ok(Self {
            name,
            description: description.into(),
            schedule: schedule.into(),
            max_participants,
            participants: BTreeSet::new(),
        })
    }

    /// Attach an initial roster (seed data, snapshot restore).
    pub fn with_participants(
        mut self,
        participants: impl IntoIterator<Item = Email>,
    ) -> Result<Self, RegistryError> {
        for email in participants {
            if !self.participants.insert(email.clone()) {
                return Err(RegistryError::InvalidActivity(format!(
                    "{}: duplicate participant {email}",
                    self.name
                )));
            }
        }
        if self.participants.len() > self.max_participants as usize {
            return Err(RegistryError::InvalidActivity(format!(
                "{}: {} participants exceed capacity {}",
                self.name,
                self.participants.len(),
                self.max_participants
            )));
        }
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn schedule(&self) -> &str {
        &self.schedule
    }

    pub fn max_participants(&self) -> u32 {
        self.max_participants
    }

    /// Roster ordered by email.
    pub fn participants(&self) -> impl ExactSizeIterator<Item = &Email> {
        self.participants.iter()
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn is_registered(&self, email: &Email) -> bool {
        self.participants.contains(email)
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() >= self.max_participants as usize
    }

    /// `NotRegistered → Registered`.
    pub fn enroll(&mut self, email: &Email) -> Result<(), RegistryError> {
        if self.is_registered(email) {
            return Err(RegistryError::AlreadyRegistered);
        }
        if self.is_full() {
            return Err(RegistryError::ActivityFull);
        }
        self.participants.insert(email.clone());
        Ok(())
    }

    /// `Registered → NotRegistered`.
    pub fn withdraw(&mut self, email: &Email) -> Result<(), RegistryError> {
        if !self.participants.remove(email) {
            return Err(RegistryError::NotRegistered);
        }
        Ok(())
    }
}
