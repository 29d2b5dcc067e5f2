//! Infrastructure layer: persistence of the in-memory stores.

pub mod snapshot;

pub use snapshot::{ActivityRow, RegistrationRow, RestoreSummary, Snapshot, SnapshotError};
