//! Store adapters.
//!
//! A store adapter maps a record's `(kind, filename)` to a filesystem
//! location and releases any open handles before the migration layer
//! overwrites the store. The stores themselves (preference documents, the
//! embedded database, cached files) are owned by other components; this is
//! the seam between them and the migration machinery.

use std::io;
use std::path::{Path, PathBuf};

use duffel_core::StoreKind;

/// Maps record kinds to on-disk locations.
///
/// Implementations own no data; they answer where a store lives and release
/// handles on request. `live_root` must return a per-kind directory that
/// import may replace wholesale.
pub trait StoreAdapter: Send + Sync {
    /// Directory holding all live data of this kind.
    fn live_root(&self, kind: StoreKind) -> PathBuf;

    /// Full path for one file of this kind. `filename` is a plain leaf
    /// name; callers validate it before resolution.
    fn resolve_path(&self, kind: StoreKind, filename: &str) -> PathBuf {
        self.live_root(kind).join(filename)
    }

    /// Release any open handle on this store (e.g. a database connection)
    /// so its files can be copied or overwritten.
    fn close_if_open(&self, kind: StoreKind) -> io::Result<()> {
        let _ = kind;
        Ok(())
    }
}

/// Hook invoked by [`DirStores`] to release an open store handle.
pub type CloseHook = Box<dyn Fn(StoreKind) -> io::Result<()> + Send + Sync>;

/// Directory-based store adapter.
///
/// Lays all stores out under one application data root:
///
/// ```text
/// data/
/// ├── prefs/       # preference documents
/// ├── database/    # embedded database files
/// └── files/       # ad-hoc files (caches, images)
/// ```
pub struct DirStores {
    root: PathBuf,
    close_hook: Option<CloseHook>,
}

impl DirStores {
    /// Create an adapter rooted at the given application data directory.
    pub fn new(root: impl AsRef<Path>) -> Self {
        DirStores {
            root: root.as_ref().to_path_buf(),
            close_hook: None,
        }
    }

    /// Register a hook called by `close_if_open`, letting the host
    /// application release its database connection before an overwrite.
    pub fn with_close_hook(mut self, hook: CloseHook) -> Self {
        self.close_hook = Some(hook);
        self
    }

    /// The application data root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create all store directories.
    pub fn create_directories(&self) -> io::Result<()> {
        for kind in StoreKind::ALL {
            std::fs::create_dir_all(self.live_root(kind))?;
        }
        Ok(())
    }

    fn kind_dir(kind: StoreKind) -> &'static str {
        match kind {
            StoreKind::Preference => "prefs",
            StoreKind::Database => "database",
            StoreKind::File => "files",
        }
    }
}

impl std::fmt::Debug for DirStores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirStores")
            .field("root", &self.root)
            .field("close_hook", &self.close_hook.is_some())
            .finish()
    }
}

impl StoreAdapter for DirStores {
    fn live_root(&self, kind: StoreKind) -> PathBuf {
        self.root.join(Self::kind_dir(kind))
    }

    fn close_if_open(&self, kind: StoreKind) -> io::Result<()> {
        match &self.close_hook {
            Some(hook) => hook(kind),
            None => Ok(()),
        }
    }
}
