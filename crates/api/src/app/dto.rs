//! Request/response bodies and their mapping from domain types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use mergington_activities::Activity;
use mergington_auth::User;

use crate::app::services::ServiceError;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `?email=` on the roster endpoints.
#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

impl EmailQuery {
    pub fn require(self) -> Result<String, ServiceError> {
        self.email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| ServiceError::InvalidInput("missing email query parameter".into()))
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: String,
    pub email: String,
}

impl From<&User> for SignupResponse {
    fn from(user: &User) -> Self {
        Self {
            message: "Account created".to_string(),
            email: user.email.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ActivityView {
    pub description: String,
    pub schedule: String,
    pub max_participants: u32,
    pub participants: Vec<String>,
}

impl From<&Activity> for ActivityView {
    fn from(activity: &Activity) -> Self {
        Self {
            description: activity.description().to_string(),
            schedule: activity.schedule().to_string(),
            max_participants: activity.max_participants(),
            participants: activity.participants().map(|e| e.to_string()).collect(),
        }
    }
}

/// Activities keyed by name.
pub fn activities_to_json(activities: &[Activity]) -> BTreeMap<String, ActivityView> {
    activities
        .iter()
        .map(|a| (a.name().to_string(), ActivityView::from(a)))
        .collect()
}
