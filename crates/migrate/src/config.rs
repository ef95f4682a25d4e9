//! Migration configuration.

use std::path::{Path, PathBuf};

use duffel_core::StoreKind;

/// Schema version this device expects for each store kind.
///
/// Imported records are checked against these during validation; a record
/// carrying any other version is rejected before anything is mutated.
/// Payloads are never reinterpreted to bridge versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaVersions {
    /// Expected version for preference documents.
    pub preference: u32,
    /// Expected version for embedded database files.
    pub database: u32,
    /// Expected version for plain files.
    pub file: u32,
}

impl SchemaVersions {
    /// The same expected version for every kind.
    pub fn uniform(version: u32) -> Self {
        SchemaVersions {
            preference: version,
            database: version,
            file: version,
        }
    }

    /// Expected version for one kind.
    pub fn expected(&self, kind: StoreKind) -> u32 {
        match kind {
            StoreKind::Preference => self.preference,
            StoreKind::Database => self.database,
            StoreKind::File => self.file,
        }
    }
}

impl Default for SchemaVersions {
    fn default() -> Self {
        SchemaVersions::uniform(1)
    }
}

/// Configuration for a migration coordinator.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Directory under which backup snapshots are created. Must be on a
    /// writable volume with room for a full copy of the live stores.
    pub staging_root: PathBuf,

    /// Expected schema versions for imported records.
    pub schema_versions: SchemaVersions,
}

impl MigrationConfig {
    /// Config with default schema expectations.
    pub fn new(staging_root: impl AsRef<Path>) -> Self {
        MigrationConfig {
            staging_root: staging_root.as_ref().to_path_buf(),
            schema_versions: SchemaVersions::default(),
        }
    }
}
