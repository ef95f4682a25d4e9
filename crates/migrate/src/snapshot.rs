//! Pre-import backup snapshot.
//!
//! Before import mutates anything, every live store directory is copied
//! aside into a fresh snapshot directory. On full success the snapshot is
//! deleted; on an apply failure it is copied back over the live stores.
//! Whole directories are copied rather than tracking individual files:
//! simple, and the stores are small.
//!
//! The snapshot directory lives under a caller-chosen staging root as
//! `restore-backup-<uuid>/`, one subdirectory per store kind. The migration
//! coordinator exclusively owns the snapshot's lifecycle.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use duffel_core::StoreKind;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::store::StoreAdapter;

/// A temporary copy of every live store, taken before import mutates them.
#[derive(Debug)]
pub struct BackupSnapshot {
    root: PathBuf,
    stores: Vec<SavedStore>,
}

/// One store's pre-import state: where it lives, and whether it existed at
/// all (a store absent before import must be absent again after rollback).
#[derive(Debug)]
struct SavedStore {
    kind: StoreKind,
    live_root: PathBuf,
    had_data: bool,
}

impl BackupSnapshot {
    /// Copy every existing live store directory into a fresh snapshot under
    /// `staging_root`. On failure the partial snapshot is removed and the
    /// error returned; no live store has been modified either way.
    pub fn create(stores: &dyn StoreAdapter, staging_root: &Path) -> io::Result<Self> {
        let root = staging_root.join(format!("restore-backup-{}", Uuid::new_v4()));
        fs::create_dir_all(&root)?;

        let mut saved = Vec::with_capacity(StoreKind::ALL.len());
        for kind in StoreKind::ALL {
            let live_root = stores.live_root(kind);
            let had_data = live_root.exists();
            if had_data {
                if let Err(e) = copy_dir_recursive(&live_root, &root.join(kind.as_str())) {
                    let _ = fs::remove_dir_all(&root);
                    return Err(e);
                }
            }
            saved.push(SavedStore {
                kind,
                live_root,
                had_data,
            });
        }

        debug!(root = %root.display(), "backup snapshot created");
        Ok(BackupSnapshot {
            root,
            stores: saved,
        })
    }

    /// The snapshot directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Restore every live store to its snapshotted state, overwriting any
    /// partial import. Stores that did not exist when the snapshot was
    /// taken are removed again.
    pub fn restore(&self) -> io::Result<()> {
        for store in &self.stores {
            if store.live_root.exists() {
                fs::remove_dir_all(&store.live_root)?;
            }
            if store.had_data {
                copy_dir_recursive(&self.root.join(store.kind.as_str()), &store.live_root)?;
            }
        }
        debug!(root = %self.root.display(), "live stores restored from backup snapshot");
        Ok(())
    }

    /// Delete the snapshot directory.
    pub fn discard(&self) -> io::Result<()> {
        fs::remove_dir_all(&self.root)
    }
}

/// Copy a directory tree. Symlinks are skipped rather than followed, so a
/// link cannot pull data from outside the store into the snapshot.
fn copy_dir_recursive(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let target = dst.join(entry.file_name());
        if file_type.is_symlink() {
            warn!(path = %entry.path().display(), "skipping symlink during store copy");
        } else if file_type.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DirStores;
    use tempfile::tempdir;

    fn seed_stores(stores: &DirStores) {
        stores.create_directories().unwrap();
        fs::write(
            stores.resolve_path(StoreKind::Preference, "preferences"),
            b"{\"a\":1}",
        )
        .unwrap();
        fs::write(stores.resolve_path(StoreKind::Database, "app.db"), b"dbdata").unwrap();
        let nested = stores.live_root(StoreKind::File).join("cache");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("img.png"), [0xFFu8, 0xD8]).unwrap();
    }

    #[test]
    fn test_create_copies_all_stores() {
        let dir = tempdir().unwrap();
        let stores = DirStores::new(dir.path().join("data"));
        seed_stores(&stores);

        let snapshot = BackupSnapshot::create(&stores, &dir.path().join("staging")).unwrap();

        assert!(snapshot.root().join("preference").join("preferences").is_file());
        assert!(snapshot.root().join("database").join("app.db").is_file());
        assert!(snapshot
            .root()
            .join("file")
            .join("cache")
            .join("img.png")
            .is_file());
    }

    #[test]
    fn test_restore_reverts_mutations() {
        let dir = tempdir().unwrap();
        let stores = DirStores::new(dir.path().join("data"));
        seed_stores(&stores);

        let snapshot = BackupSnapshot::create(&stores, &dir.path().join("staging")).unwrap();

        // Mutate and add files after the snapshot
        let prefs = stores.resolve_path(StoreKind::Preference, "preferences");
        fs::write(&prefs, b"{\"a\":2}").unwrap();
        let extra = stores.resolve_path(StoreKind::Database, "extra.db");
        fs::write(&extra, b"junk").unwrap();

        snapshot.restore().unwrap();

        assert_eq!(fs::read(&prefs).unwrap(), b"{\"a\":1}");
        assert!(!extra.exists());
    }

    #[test]
    fn test_restore_removes_store_that_did_not_exist() {
        let dir = tempdir().unwrap();
        let stores = DirStores::new(dir.path().join("data"));
        // Only the preference store exists before the snapshot
        fs::create_dir_all(stores.live_root(StoreKind::Preference)).unwrap();

        let snapshot = BackupSnapshot::create(&stores, &dir.path().join("staging")).unwrap();

        // Import creates the file store, then fails
        let files = stores.live_root(StoreKind::File);
        fs::create_dir_all(&files).unwrap();
        fs::write(files.join("new.bin"), b"partial").unwrap();

        snapshot.restore().unwrap();
        assert!(!files.exists());
        assert!(stores.live_root(StoreKind::Preference).exists());
    }

    #[test]
    fn test_discard_removes_snapshot_dir() {
        let dir = tempdir().unwrap();
        let stores = DirStores::new(dir.path().join("data"));
        seed_stores(&stores);

        let snapshot = BackupSnapshot::create(&stores, &dir.path().join("staging")).unwrap();
        let root = snapshot.root().to_path_buf();
        assert!(root.exists());

        snapshot.discard().unwrap();
        assert!(!root.exists());
    }

    #[test]
    fn test_snapshots_get_unique_roots() {
        let dir = tempdir().unwrap();
        let stores = DirStores::new(dir.path().join("data"));
        stores.create_directories().unwrap();

        let staging = dir.path().join("staging");
        let a = BackupSnapshot::create(&stores, &staging).unwrap();
        let b = BackupSnapshot::create(&stores, &staging).unwrap();
        assert_ne!(a.root(), b.root());
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_skips_symlinks() {
        let dir = tempdir().unwrap();
        let stores = DirStores::new(dir.path().join("data"));
        stores.create_directories().unwrap();

        let secret = dir.path().join("secret.txt");
        fs::write(&secret, b"outside").unwrap();
        std::os::unix::fs::symlink(&secret, stores.live_root(StoreKind::File).join("link"))
            .unwrap();

        let snapshot = BackupSnapshot::create(&stores, &dir.path().join("staging")).unwrap();
        assert!(!snapshot.root().join("file").join("link").exists());
    }
}
