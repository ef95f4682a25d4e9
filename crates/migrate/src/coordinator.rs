//! Migration coordinator.
//!
//! Import runs as a strict phase sequence:
//!
//! ```text
//! Validating → BackingUp → Applying → Committing → Done
//!                                   ↘ RollingBack ↗
//! ```
//!
//! - **Validating**: the archive is structurally validated and every record
//!   checked against the device's expected schema versions. Failure touches
//!   nothing.
//! - **BackingUp**: open store handles are released and every live store
//!   directory is copied into a backup snapshot. Failure touches nothing.
//! - **Applying**: records are written over the live stores, in order. The
//!   first failure stops the phase.
//! - **Committing**: the backup is deleted; a deletion failure is logged
//!   and ignored, the live data is already correct.
//! - **RollingBack**: after an apply failure the backup is copied back over
//!   every live store. A failure here is the one unrecoverable outcome.
//!
//! Phases are sequential; there is no internal parallelism. A
//! coordinator-held lock makes the exclusivity requirement explicit: a
//! second import or export fails with [`MigrationError::Busy`] instead of
//! interleaving. Cancellation is honored only at phase boundaries before
//! any live mutation; once Applying starts the operation runs to completion
//! or rolls back.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use duffel_archive::{ArchiveReader, ArchiveWriter, ExportInfo};
use duffel_core::{Record, StoreKind};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::MigrationConfig;
use crate::error::{MigrationError, MigrationResult};
use crate::plan::ExportPlan;
use crate::snapshot::BackupSnapshot;
use crate::store::StoreAdapter;

/// Phases of one coordinator operation, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationPhase {
    /// Archive and schema validation; nothing touched yet.
    Validating,
    /// Copying live stores into the backup snapshot.
    BackingUp,
    /// Writing records over the live stores.
    Applying,
    /// Deleting the backup after full success.
    Committing,
    /// Restoring live stores from the backup after an apply failure.
    RollingBack,
    /// Terminal: success or one classified failure.
    Done,
}

/// Cooperative cancellation flag shared with the caller.
///
/// Cancellation is checked only at points where nothing has been mutated;
/// setting the flag after Applying has begun has no effect.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Fresh, uncancelled token.
    pub fn new() -> Self {
        CancelToken::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Summary of a committed import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Total records applied.
    pub records_applied: u32,
    /// Preference records applied.
    pub preferences: u32,
    /// Database records applied.
    pub databases: u32,
    /// Plain-file records applied.
    pub files: u32,
}

impl ImportReport {
    fn count(&mut self, kind: StoreKind) {
        self.records_applied += 1;
        match kind {
            StoreKind::Preference => self.preferences += 1,
            StoreKind::Database => self.databases += 1,
            StoreKind::File => self.files += 1,
        }
    }
}

struct ApplyFailure {
    filename: String,
    cause: io::Error,
}

/// Orchestrates export and import over a set of live stores.
///
/// The coordinator owns the backup snapshot's lifecycle and the migration
/// lock; store adapters own the live files.
pub struct MigrationCoordinator<A> {
    stores: A,
    config: MigrationConfig,
    op_lock: Mutex<()>,
}

impl<A: StoreAdapter> MigrationCoordinator<A> {
    /// Create a coordinator over the given stores.
    pub fn new(stores: A, config: MigrationConfig) -> Self {
        MigrationCoordinator {
            stores,
            config,
            op_lock: Mutex::new(()),
        }
    }

    /// The store adapter this coordinator operates on.
    pub fn stores(&self) -> &A {
        &self.stores
    }

    /// Import an archive file, replacing the live stores' contents.
    ///
    /// On any failure the live stores are left exactly as they were, except
    /// for [`MigrationError::RollbackFailed`], which callers must treat as
    /// fatal.
    pub fn import_file(&self, path: &Path, cancel: &CancelToken) -> MigrationResult<ImportReport> {
        let _guard = self.op_lock.try_lock().ok_or(MigrationError::Busy)?;
        info!(source = %path.display(), "starting import");
        debug!(phase = ?MigrationPhase::Validating, "import phase");
        let records = ArchiveReader::new().read_from_file(path)?;
        self.run_import(records, cancel)
    }

    /// Import an archive from a stream.
    pub fn import_from<R: Read>(&self, source: R, cancel: &CancelToken) -> MigrationResult<ImportReport> {
        let _guard = self.op_lock.try_lock().ok_or(MigrationError::Busy)?;
        info!("starting import from stream");
        debug!(phase = ?MigrationPhase::Validating, "import phase");
        let records = ArchiveReader::new().read_from(source)?;
        self.run_import(records, cancel)
    }

    /// Export live store data described by the plan into an archive file.
    pub fn export_file(&self, plan: &ExportPlan, path: &Path) -> MigrationResult<ExportInfo> {
        let _guard = self.op_lock.try_lock().ok_or(MigrationError::Busy)?;
        info!(dest = %path.display(), entries = plan.len(), "starting export");
        let records = self.collect_records(plan)?;
        Ok(ArchiveWriter::new().write_to_file(&records, path)?)
    }

    /// Export live store data described by the plan into a sink.
    pub fn export_to<W: Write>(&self, plan: &ExportPlan, sink: W) -> MigrationResult<ExportInfo> {
        let _guard = self.op_lock.try_lock().ok_or(MigrationError::Busy)?;
        info!(entries = plan.len(), "starting export to stream");
        let records = self.collect_records(plan)?;
        Ok(ArchiveWriter::new().write_to(&records, sink)?)
    }

    fn run_import(&self, records: Vec<Record>, cancel: &CancelToken) -> MigrationResult<ImportReport> {
        if cancel.is_cancelled() {
            return Err(MigrationError::Cancelled);
        }

        self.validate_records(&records)?;

        if cancel.is_cancelled() {
            return Err(MigrationError::Cancelled);
        }

        debug!(phase = ?MigrationPhase::BackingUp, "import phase");
        for kind in StoreKind::ALL {
            self.stores
                .close_if_open(kind)
                .map_err(MigrationError::BackupFailed)?;
        }
        let backup = BackupSnapshot::create(&self.stores, &self.config.staging_root)
            .map_err(MigrationError::BackupFailed)?;

        if cancel.is_cancelled() {
            if let Err(e) = backup.discard() {
                warn!(error = %e, "failed to remove backup snapshot after cancellation");
            }
            return Err(MigrationError::Cancelled);
        }

        debug!(phase = ?MigrationPhase::Applying, records = records.len(), "import phase");
        match self.apply_all(&records) {
            Ok(report) => {
                debug!(phase = ?MigrationPhase::Committing, "import phase");
                if let Err(e) = backup.discard() {
                    warn!(
                        error = %e,
                        path = %backup.root().display(),
                        "failed to delete backup snapshot after successful import"
                    );
                }
                info!(records = report.records_applied, "import committed");
                Ok(report)
            }
            Err(failure) => {
                debug!(phase = ?MigrationPhase::RollingBack, "import phase");
                warn!(
                    filename = %failure.filename,
                    error = %failure.cause,
                    "apply failed, restoring live stores from backup"
                );
                match backup.restore() {
                    Ok(()) => {
                        if let Err(e) = backup.discard() {
                            warn!(error = %e, "failed to delete backup snapshot after rollback");
                        }
                        info!("live stores restored to pre-import state");
                        Err(MigrationError::ApplyFailedRolledBack {
                            filename: failure.filename,
                            cause: failure.cause,
                        })
                    }
                    Err(rollback_cause) => Err(MigrationError::RollbackFailed {
                        filename: failure.filename,
                        apply_cause: failure.cause,
                        rollback_cause,
                    }),
                }
            }
        }
    }

    /// Per-record validation beyond the archive's structural checks: schema
    /// versions must match the device's expectations and filenames must be
    /// plain leaf names. Runs before anything is mutated.
    fn validate_records(&self, records: &[Record]) -> MigrationResult<()> {
        for record in records {
            if !is_plain_leaf(&record.filename) {
                return Err(MigrationError::InvalidFilename(record.filename.clone()));
            }
            let expected = self.config.schema_versions.expected(record.kind);
            if record.schema_version != expected {
                return Err(MigrationError::SchemaVersionMismatch {
                    kind: record.kind,
                    filename: record.filename.clone(),
                    found: record.schema_version,
                    expected,
                });
            }
        }
        Ok(())
    }

    fn apply_all(&self, records: &[Record]) -> Result<ImportReport, ApplyFailure> {
        let mut report = ImportReport::default();
        for record in records {
            let target = self.stores.resolve_path(record.kind, &record.filename);
            if let Err(cause) = write_payload(&target, &record.payload) {
                return Err(ApplyFailure {
                    filename: record.filename.clone(),
                    cause,
                });
            }
            debug!(
                kind = %record.kind,
                filename = %record.filename,
                bytes = record.payload.len(),
                "record applied"
            );
            report.count(record.kind);
        }
        Ok(report)
    }

    fn collect_records(&self, plan: &ExportPlan) -> MigrationResult<Vec<Record>> {
        for kind in plan.kinds() {
            self.stores
                .close_if_open(kind)
                .map_err(|e| MigrationError::ExportRead {
                    name: kind.to_string(),
                    source: e,
                })?;
        }

        let mut records = Vec::with_capacity(plan.len());
        for entry in &plan.entries {
            let source = self.stores.resolve_path(entry.kind, &entry.filename);
            if !source.exists() {
                warn!(path = %source.display(), "export source missing, skipping");
                continue;
            }
            let payload = fs::read(&source).map_err(|e| MigrationError::ExportRead {
                name: entry.filename.clone(),
                source: e,
            })?;
            records.push(Record::new(
                entry.kind,
                entry.key.clone(),
                entry.schema_version,
                entry.filename.clone(),
                payload,
            ));
        }
        Ok(records)
    }
}

/// Truncate-then-write one record's payload, creating parent directories as
/// needed.
fn write_payload(target: &Path, payload: &[u8]) -> io::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(target, payload)
}

/// A record filename must resolve inside its store: plain leaf names only,
/// no separators, no traversal.
fn is_plain_leaf(filename: &str) -> bool {
    !filename.is_empty()
        && filename != "."
        && filename != ".."
        && !filename.contains('/')
        && !filename.contains('\\')
}
