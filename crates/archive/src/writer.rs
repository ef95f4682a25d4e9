//! Archive writer (export side).
//!
//! Takes an ordered record sequence, computes both integrity digests, and
//! streams preamble + records through one buffered sink. File output is
//! atomic: the archive is written to a temp path and renamed into place, so
//! no partial file is ever left behind under the destination name.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use duffel_core::Record;
use tracing::{debug, info};

use crate::codec::encode_record_to_vec;
use crate::error::ArchiveResult;
use crate::format::{
    digest, digest_hex, header_digest, ArchiveHeader, ARCHIVE_FORMAT_VERSION, ARCHIVE_HEADER_SIZE,
    DIGEST_LEN,
};

/// Information about a written archive
#[derive(Debug, Clone)]
pub struct ExportInfo {
    /// Number of records in the archive
    pub record_count: u32,

    /// Total bytes written, preamble included
    pub bytes_written: u64,

    /// Hex of the archive's body digest
    pub checksum: String,
}

/// Writer for archive files
#[derive(Debug, Default)]
pub struct ArchiveWriter;

impl ArchiveWriter {
    /// Create a new writer.
    pub fn new() -> Self {
        ArchiveWriter
    }

    /// Write an archive to a sink.
    ///
    /// Any I/O error aborts the export; the sink's partial contents will not
    /// validate as an archive.
    pub fn write_to<W: Write>(&self, records: &[Record], mut writer: W) -> ArchiveResult<ExportInfo> {
        // Records are encoded once; digests are computed over the exact
        // bytes that go to the sink.
        let encoded: Vec<Vec<u8>> = records.iter().map(encode_record_to_vec).collect();

        let mut chain = Vec::with_capacity(encoded.len() * DIGEST_LEN);
        for bytes in &encoded {
            chain.extend_from_slice(&digest(bytes));
        }
        let body_hash = digest(&chain);

        let record_count = records.len() as u32;
        let header = ArchiveHeader {
            header_hash: header_digest(ARCHIVE_FORMAT_VERSION, record_count),
            body_hash,
            version: ARCHIVE_FORMAT_VERSION,
            record_count,
        };

        writer.write_all(&header.to_bytes())?;
        let mut bytes_written = ARCHIVE_HEADER_SIZE as u64;
        for bytes in &encoded {
            writer.write_all(bytes)?;
            bytes_written += bytes.len() as u64;
        }
        writer.flush()?;

        debug!(
            records = record_count,
            bytes = bytes_written,
            checksum = %digest_hex(&body_hash),
            "archive written"
        );

        Ok(ExportInfo {
            record_count,
            bytes_written,
            checksum: digest_hex(&body_hash),
        })
    }

    /// Write an archive to a byte vector.
    pub fn write_to_vec(&self, records: &[Record]) -> ArchiveResult<(Vec<u8>, ExportInfo)> {
        let mut buffer = Vec::new();
        let info = self.write_to(records, &mut buffer)?;
        Ok((buffer, info))
    }

    /// Write an archive to a file, atomically.
    ///
    /// The archive is written to `<path>.tmp`, synced, and renamed over the
    /// destination. On failure the temp file is removed and no file is left
    /// at the destination. Parent directories are created as needed.
    pub fn write_to_file(&self, records: &[Record], path: &Path) -> ArchiveResult<ExportInfo> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = path.with_extension("tmp");
        match self.write_file_inner(records, &temp_path) {
            Ok(info) => {
                fs::rename(&temp_path, path)?;
                info!(
                    path = %path.display(),
                    records = info.record_count,
                    bytes = info.bytes_written,
                    "archive exported"
                );
                Ok(info)
            }
            Err(e) => {
                let _ = fs::remove_file(&temp_path);
                Err(e)
            }
        }
    }

    fn write_file_inner(&self, records: &[Record], path: &Path) -> ArchiveResult<ExportInfo> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        let info = self.write_to(records, &mut writer)?;
        writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::ARCHIVE_MAGIC;
    use tempfile::tempdir;

    fn sample_records() -> Vec<Record> {
        vec![
            Record::preference("prefs", 1, "preferences", b"{\"lang\":\"eo\"}".to_vec()),
            Record::database("db", 1, "app.db", vec![0xDE, 0xAD, 0xBE, 0xEF]),
            Record::file("img", 1, "avatar.png", (0u8..=255).collect()),
        ]
    }

    #[test]
    fn test_write_to_vec_layout() {
        let (data, info) = ArchiveWriter::new().write_to_vec(&sample_records()).unwrap();

        assert_eq!(&data[0..7], &ARCHIVE_MAGIC);
        assert_eq!(data.len() as u64, info.bytes_written);
        assert_eq!(info.record_count, 3);
        assert_eq!(info.checksum.len(), 32);
        assert!(data.len() > ARCHIVE_HEADER_SIZE);
    }

    #[test]
    fn test_write_empty_archive() {
        let (data, info) = ArchiveWriter::new().write_to_vec(&[]).unwrap();
        assert_eq!(data.len(), ARCHIVE_HEADER_SIZE);
        assert_eq!(info.record_count, 0);
    }

    #[test]
    fn test_write_deterministic() {
        let records = sample_records();
        let writer = ArchiveWriter::new();
        let (data1, info1) = writer.write_to_vec(&records).unwrap();
        let (data2, info2) = writer.write_to_vec(&records).unwrap();
        assert_eq!(data1, data2);
        assert_eq!(info1.checksum, info2.checksum);
    }

    #[test]
    fn test_write_to_file_creates_parents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("out.duffel");

        let info = ArchiveWriter::new().write_to_file(&sample_records(), &path).unwrap();

        assert!(path.exists());
        assert_eq!(fs::metadata(&path).unwrap().len(), info.bytes_written);

        // No temp file left behind
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_file_matches_vec_output() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.duffel");
        let records = sample_records();

        ArchiveWriter::new().write_to_file(&records, &path).unwrap();
        let (expected, _) = ArchiveWriter::new().write_to_vec(&records).unwrap();

        assert_eq!(fs::read(&path).unwrap(), expected);
    }
}
