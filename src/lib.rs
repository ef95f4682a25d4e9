//! Duffel - portable backup and restore for application data stores
//!
//! Duffel packs a snapshot of an application's persisted data - preference
//! documents, an embedded database file, ad-hoc files such as cached images
//! - into a single portable archive with a custom binary container format,
//! and restores that archive onto a (possibly different) device.
//!
//! Two guarantees drive the design:
//!
//! - a corrupted or truncated archive is detected before any destructive
//!   action, via a signature and two xxh3-128 integrity digests;
//! - import appears atomic across all stores: every live store is copied
//!   aside before the first overwrite, and any failure rolls everything
//!   back. The device ends either fully migrated or fully restored, never
//!   mixed.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::path::Path;
//! use duffel::{
//!     CancelToken, DirStores, ExportPlan, MigrationConfig, MigrationCoordinator, StoreKind,
//! };
//!
//! let stores = DirStores::new("/data/app");
//! let coordinator = MigrationCoordinator::new(stores, MigrationConfig::new("/data/staging"));
//!
//! // Export: live stores -> archive
//! let plan = ExportPlan::new()
//!     .entry(StoreKind::Preference, "prefs", 1, "preferences")
//!     .entry(StoreKind::Database, "db", 1, "app.db");
//! coordinator.export_file(&plan, Path::new("/backups/device.duffel"))?;
//!
//! // Import: archive -> live stores, with rollback on failure
//! coordinator.import_file(Path::new("/backups/device.duffel"), &CancelToken::new())?;
//! ```
//!
//! # Architecture
//!
//! The record and archive layers ([`Record`], [`ArchiveWriter`],
//! [`ArchiveReader`]) are value-oriented and touch only the streams handed
//! to them. The [`MigrationCoordinator`] owns everything stateful: the
//! migration lock, the backup snapshot lifecycle, and the ordered phase
//! machine that applies records to live stores through a [`StoreAdapter`].

// Re-export the public API from the member crates
pub use duffel_archive::{
    ArchiveError, ArchiveReader, ArchiveWriter, ExportInfo, ARCHIVE_FORMAT_VERSION, ARCHIVE_MAGIC,
};
pub use duffel_core::{Record, StoreKind};
pub use duffel_migrate::{
    BackupSnapshot, CancelToken, DirStores, ExportEntry, ExportPlan, ImportReport,
    MigrationConfig, MigrationCoordinator, MigrationError, MigrationPhase, MigrationResult,
    SchemaVersions, StoreAdapter,
};
