//! Migration error types

use std::io;

use duffel_archive::ArchiveError;
use duffel_core::StoreKind;
use thiserror::Error;

/// Result type for migration operations
pub type MigrationResult<T> = Result<T, MigrationError>;

/// Errors surfaced by import and export.
///
/// Every variant states how far the operation got: archive, schema,
/// filename and backup failures are reported before any live store has been
/// mutated; an apply failure reports whether rollback restored the previous
/// data or itself failed — the latter is the one unrecoverable case.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The source is not a valid archive; nothing was touched
    #[error("invalid archive: {0}")]
    Archive(#[from] ArchiveError),

    /// A record's schema version does not match what this device expects;
    /// nothing was touched
    #[error("schema version mismatch for '{filename}' ({kind}): archive has {found}, expected {expected}")]
    SchemaVersionMismatch {
        /// Store kind of the offending record
        kind: StoreKind,
        /// Filename of the offending record
        filename: String,
        /// Schema version found in the archive
        found: u32,
        /// Schema version this device expects for the kind
        expected: u32,
    },

    /// A record's filename is not a plain leaf name; nothing was touched
    #[error("record filename {0:?} is not a plain file name")]
    InvalidFilename(String),

    /// Snapshotting the live stores failed; nothing was touched
    #[error("failed to back up live data before import: {0}")]
    BackupFailed(#[source] io::Error),

    /// Applying a record failed and every store was restored from the backup
    #[error("import failed while applying '{filename}'; previous data was restored: {cause}")]
    ApplyFailedRolledBack {
        /// Filename of the record that failed to apply
        filename: String,
        /// The apply failure
        #[source]
        cause: io::Error,
    },

    /// Applying a record failed and restoring from the backup also failed.
    /// Stores may be inconsistent; callers should treat this as fatal.
    #[error(
        "import failed while applying '{filename}' and rollback also failed, stores may be \
         inconsistent: apply error: {apply_cause}; rollback error: {rollback_cause}"
    )]
    RollbackFailed {
        /// Filename of the record that failed to apply
        filename: String,
        /// The apply failure that triggered the rollback
        apply_cause: io::Error,
        /// The rollback failure
        #[source]
        rollback_cause: io::Error,
    },

    /// Another import or export already holds the migration lock
    #[error("another migration operation is already running")]
    Busy,

    /// Cancelled at a safe point, before any live store was modified
    #[error("operation cancelled before any data was modified")]
    Cancelled,

    /// Reading a live store's data during export failed
    #[error("failed to read '{name}' for export: {source}")]
    ExportRead {
        /// Name of the source that failed (filename or store kind)
        name: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}
