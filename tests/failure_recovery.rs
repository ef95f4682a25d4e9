//! Failure paths: tampered archives are rejected before any mutation, and
//! an apply failure at any record leaves every store byte-identical to its
//! pre-import contents.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use duffel::{
    ArchiveWriter, CancelToken, DirStores, MigrationConfig, MigrationCoordinator, MigrationError,
    Record, StoreAdapter, StoreKind,
};
use tempfile::tempdir;

fn dir_contents(root: &Path) -> BTreeMap<String, Vec<u8>> {
    fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<String, Vec<u8>>) {
        for entry in fs::read_dir(dir).unwrap() {
            let entry = entry.unwrap();
            let path = entry.path();
            if entry.file_type().unwrap().is_dir() {
                walk(root, &path, out);
            } else {
                let rel = path.strip_prefix(root).unwrap().to_string_lossy().into_owned();
                out.insert(rel, fs::read(&path).unwrap());
            }
        }
    }
    let mut out = BTreeMap::new();
    if root.exists() {
        walk(root, root, &mut out);
    }
    out
}

fn sample_records() -> Vec<Record> {
    vec![
        Record::preference("prefs", 1, "preferences", b"{\"a\":1}".to_vec()),
        Record::database("db", 1, "app.db", b"db-payload".to_vec()),
        Record::file("img", 1, "avatar.png", vec![0x89, 0x50, 0x4E, 0x47]),
    ]
}

fn seeded_device(root: &Path) -> MigrationCoordinator<DirStores> {
    let stores = DirStores::new(root.join("data"));
    stores.create_directories().unwrap();
    fs::write(
        stores.resolve_path(StoreKind::Preference, "preferences"),
        b"{\"existing\":true}",
    )
    .unwrap();
    fs::write(stores.resolve_path(StoreKind::Database, "app.db"), b"old-db").unwrap();
    fs::write(stores.resolve_path(StoreKind::File, "keep.txt"), b"keep me").unwrap();
    MigrationCoordinator::new(stores, MigrationConfig::new(root.join("staging")))
}

#[test]
fn any_single_byte_flip_rejected_without_touching_stores() {
    let dir = tempdir().unwrap();
    let coordinator = seeded_device(dir.path());
    let before = dir_contents(&dir.path().join("data"));

    let (archive, _) = ArchiveWriter::new().write_to_vec(&sample_records()).unwrap();

    for pos in 0..archive.len() {
        let mut tampered = archive.clone();
        tampered[pos] ^= 0x01;

        let result = coordinator.import_from(std::io::Cursor::new(&tampered), &CancelToken::new());
        assert!(result.is_err(), "flip at byte {pos} should be rejected");
        assert_eq!(
            dir_contents(&dir.path().join("data")),
            before,
            "flip at byte {pos} must not touch any live store"
        );
    }
}

#[test]
fn truncated_archive_rejected_without_touching_stores() {
    let dir = tempdir().unwrap();
    let coordinator = seeded_device(dir.path());
    let before = dir_contents(&dir.path().join("data"));

    let (archive, _) = ArchiveWriter::new().write_to_vec(&sample_records()).unwrap();

    for cut in [0, 3, 7, 30, 44, archive.len() / 2, archive.len() - 1] {
        let result =
            coordinator.import_from(std::io::Cursor::new(&archive[..cut]), &CancelToken::new());
        assert!(result.is_err(), "{cut}-byte prefix should be rejected");
    }
    assert_eq!(dir_contents(&dir.path().join("data")), before);
}

/// Adapter that makes writing one specific filename fail by resolving it to
/// its store's root directory.
struct FailingStores {
    inner: DirStores,
    fail_on: String,
}

impl StoreAdapter for FailingStores {
    fn live_root(&self, kind: StoreKind) -> PathBuf {
        self.inner.live_root(kind)
    }

    fn resolve_path(&self, kind: StoreKind, filename: &str) -> PathBuf {
        if filename == self.fail_on {
            self.inner.live_root(kind)
        } else {
            self.inner.resolve_path(kind, filename)
        }
    }
}

#[test]
fn apply_failure_at_any_record_restores_pre_import_state() {
    let records = sample_records();
    let (archive, _) = ArchiveWriter::new().write_to_vec(&records).unwrap();

    // Force the failure at each record position in turn
    for failing in &records {
        let dir = tempdir().unwrap();
        let inner = DirStores::new(dir.path().join("data"));
        inner.create_directories().unwrap();
        fs::write(
            inner.resolve_path(StoreKind::Preference, "preferences"),
            b"{\"existing\":true}",
        )
        .unwrap();
        fs::write(inner.resolve_path(StoreKind::Database, "app.db"), b"old-db").unwrap();
        fs::write(
            inner.resolve_path(StoreKind::File, "cached.bin"),
            b"pre-import cache",
        )
        .unwrap();
        let before = dir_contents(&dir.path().join("data"));

        let coordinator = MigrationCoordinator::new(
            FailingStores {
                inner,
                fail_on: failing.filename.clone(),
            },
            MigrationConfig::new(dir.path().join("staging")),
        );

        let result = coordinator.import_from(std::io::Cursor::new(&archive), &CancelToken::new());
        match result {
            Err(MigrationError::ApplyFailedRolledBack { filename, .. }) => {
                assert_eq!(filename, failing.filename);
            }
            other => panic!("expected rollback for {}, got {other:?}", failing.filename),
        }

        assert_eq!(
            dir_contents(&dir.path().join("data")),
            before,
            "stores must be byte-identical after failing on {}",
            failing.filename
        );

        let staging = dir.path().join("staging");
        assert!(
            !staging.exists() || fs::read_dir(&staging).unwrap().next().is_none(),
            "backup snapshot must be cleaned up after rollback"
        );
    }
}

#[test]
fn schema_mismatch_reported_before_any_mutation() {
    let dir = tempdir().unwrap();
    let coordinator = seeded_device(dir.path());
    let before = dir_contents(&dir.path().join("data"));

    let records = vec![Record::preference("prefs", 99, "preferences", b"{}".to_vec())];
    let (archive, _) = ArchiveWriter::new().write_to_vec(&records).unwrap();

    let result = coordinator.import_from(std::io::Cursor::new(&archive), &CancelToken::new());
    assert!(matches!(
        result,
        Err(MigrationError::SchemaVersionMismatch { found: 99, .. })
    ));
    assert_eq!(dir_contents(&dir.path().join("data")), before);
}
