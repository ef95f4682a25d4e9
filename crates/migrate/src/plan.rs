//! Export plan: which live data goes into an archive, in what order.

use duffel_core::StoreKind;

/// One entry of an export plan: the metadata of a record whose payload will
/// be read from the live store at export time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportEntry {
    /// Store kind the data is read from.
    pub kind: StoreKind,
    /// Stable logical identifier written into the record.
    pub key: String,
    /// Schema version written into the record.
    pub schema_version: u32,
    /// Leaf filename within the store.
    pub filename: String,
}

impl ExportEntry {
    /// Create an entry.
    pub fn new(
        kind: StoreKind,
        key: impl Into<String>,
        schema_version: u32,
        filename: impl Into<String>,
    ) -> Self {
        ExportEntry {
            kind,
            key: key.into(),
            schema_version,
            filename: filename.into(),
        }
    }
}

/// Ordered list of entries to export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportPlan {
    /// Entries in archive order.
    pub entries: Vec<ExportEntry>,
}

impl ExportPlan {
    /// Empty plan.
    pub fn new() -> Self {
        ExportPlan::default()
    }

    /// Append an entry, builder style.
    pub fn entry(
        mut self,
        kind: StoreKind,
        key: impl Into<String>,
        schema_version: u32,
        filename: impl Into<String>,
    ) -> Self {
        self.entries.push(ExportEntry::new(kind, key, schema_version, filename));
        self
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the plan has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store kinds appearing in the plan, deduplicated, in first-seen order.
    pub fn kinds(&self) -> Vec<StoreKind> {
        let mut kinds = Vec::new();
        for entry in &self.entries {
            if !kinds.contains(&entry.kind) {
                kinds.push(entry.kind);
            }
        }
        kinds
    }
}
