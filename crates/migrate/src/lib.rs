//! Migration layer for Duffel
//!
//! This crate restores archives onto a device and gathers live data for
//! export:
//!
//! - `store`: the store-adapter seam mapping record kinds to on-disk
//!   locations, with a directory-based default implementation
//! - `snapshot`: the pre-import backup copy of every live store, used to
//!   roll back a failed import
//! - `coordinator`: the phase machine that validates, backs up, applies,
//!   and commits or rolls back — the device ends either fully migrated or
//!   fully restored, never mixed
//!
//! The coordinator assumes exclusive access to the live stores for the
//! duration of an operation and enforces it with an internal lock: a second
//! concurrent import or export fails immediately instead of interleaving.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod coordinator;
pub mod error;
pub mod plan;
pub mod snapshot;
pub mod store;

pub use config::{MigrationConfig, SchemaVersions};
pub use coordinator::{CancelToken, ImportReport, MigrationCoordinator, MigrationPhase};
pub use error::{MigrationError, MigrationResult};
pub use plan::{ExportEntry, ExportPlan};
pub use snapshot::BackupSnapshot;
pub use store::{CloseHook, DirStores, StoreAdapter};
