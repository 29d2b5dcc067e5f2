//! `mergington-activities`: activity definitions and participant rosters.

pub mod activity;
pub mod error;
pub mod registry;
pub mod seed;

pub use activity::Activity;
pub use error::RegistryError;
pub use registry::ActivityRegistry;
pub use seed::default_catalog;
