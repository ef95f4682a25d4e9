//! Record and store-kind types.
//!
//! A [`Record`] is one named unit of migrated data: the contents of a single
//! preference document, an embedded database file, or a plain file, together
//! with the metadata needed to put it back in the right place on another
//! device. Records are immutable values; they own no external resource.

use thiserror::Error;

/// Coarse category of a record, determining which store owns its data.
///
/// The kind selects the store adapter used to resolve the record's on-disk
/// location during import and export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
    /// A structured preference document.
    Preference,
    /// An embedded relational database file.
    Database,
    /// An ad-hoc file, e.g. a cached image.
    File,
}

/// Error returned when a wire tag does not name a known store kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown store kind tag: {0}")]
pub struct UnknownKindTag(pub u32);

impl StoreKind {
    /// All store kinds, in the order stores are backed up and restored.
    pub const ALL: [StoreKind; 3] = [StoreKind::Preference, StoreKind::Database, StoreKind::File];

    /// Wire tag for this kind. Tag 0 is reserved so a zeroed region never
    /// decodes as a valid kind.
    pub fn tag(self) -> u32 {
        match self {
            StoreKind::Preference => 1,
            StoreKind::Database => 2,
            StoreKind::File => 3,
        }
    }

    /// Parse a wire tag back into a kind.
    pub fn from_tag(tag: u32) -> Result<Self, UnknownKindTag> {
        match tag {
            1 => Ok(StoreKind::Preference),
            2 => Ok(StoreKind::Database),
            3 => Ok(StoreKind::File),
            other => Err(UnknownKindTag(other)),
        }
    }

    /// Stable lowercase name, used for logging and backup subdirectories.
    pub fn as_str(self) -> &'static str {
        match self {
            StoreKind::Preference => "preference",
            StoreKind::Database => "database",
            StoreKind::File => "file",
        }
    }
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One migrated data unit.
///
/// On the wire the payload is preceded by its byte length, so the encoded
/// size always equals `payload.len()` by construction. Payload bytes are
/// opaque to this subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Store kind, selects the adapter that owns this record's data.
    pub kind: StoreKind,

    /// Stable logical identifier, reserved for future lookup.
    pub key: String,

    /// Payload-shape tag; checked against the importing device's expectation.
    pub schema_version: u32,

    /// On-disk leaf name, resolved to a full path by the store adapter.
    pub filename: String,

    /// Opaque payload bytes.
    pub payload: Vec<u8>,
}

impl Record {
    /// Create a new record.
    pub fn new(
        kind: StoreKind,
        key: impl Into<String>,
        schema_version: u32,
        filename: impl Into<String>,
        payload: Vec<u8>,
    ) -> Self {
        Record {
            kind,
            key: key.into(),
            schema_version,
            filename: filename.into(),
            payload,
        }
    }

    /// Create a preference-document record.
    pub fn preference(
        key: impl Into<String>,
        schema_version: u32,
        filename: impl Into<String>,
        payload: Vec<u8>,
    ) -> Self {
        Record::new(StoreKind::Preference, key, schema_version, filename, payload)
    }

    /// Create an embedded-database record.
    pub fn database(
        key: impl Into<String>,
        schema_version: u32,
        filename: impl Into<String>,
        payload: Vec<u8>,
    ) -> Self {
        Record::new(StoreKind::Database, key, schema_version, filename, payload)
    }

    /// Create a plain-file record.
    pub fn file(
        key: impl Into<String>,
        schema_version: u32,
        filename: impl Into<String>,
        payload: Vec<u8>,
    ) -> Self {
        Record::new(StoreKind::File, key, schema_version, filename, payload)
    }
}
