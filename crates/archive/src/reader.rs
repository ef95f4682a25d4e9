//! Archive reader (import validation phase).
//!
//! Validation runs strictly in this order, failing fast at the first
//! problem:
//!
//! 1. the signature equals the expected magic exactly;
//! 2. the header hash recomputed from the freshly read version and record
//!    count matches the stored one;
//! 3. the version equals the single currently supported value;
//! 4. exactly `record_count` records decode;
//! 5. the body hash recomputed over the decoded records matches the stored
//!    one.
//!
//! Cheap checks run before the per-record decode, and nothing is handed to
//! the caller until the whole archive is structurally valid. Bytes beyond
//! the declared record count are not read.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use duffel_core::Record;
use tracing::{debug, info};

use crate::codec::decode_record;
use crate::error::{ArchiveError, ArchiveResult};
use crate::format::{
    body_digest, digest_hex, header_digest, ArchiveHeader, ARCHIVE_FORMAT_VERSION,
    ARCHIVE_HEADER_SIZE,
};

/// Reader for archive files
#[derive(Debug, Default)]
pub struct ArchiveReader;

impl ArchiveReader {
    /// Create a new reader.
    pub fn new() -> Self {
        ArchiveReader
    }

    /// Read and fully validate an archive from a source stream.
    ///
    /// Returns the decoded records only if every validation step passes.
    pub fn read_from<R: Read>(&self, mut reader: R) -> ArchiveResult<Vec<Record>> {
        let header = read_preamble(&mut reader)?;

        let computed = header_digest(header.version, header.record_count);
        if computed != header.header_hash {
            return Err(ArchiveError::HashMismatch {
                what: "header",
                expected: digest_hex(&header.header_hash),
                computed: digest_hex(&computed),
            });
        }

        if header.version != ARCHIVE_FORMAT_VERSION {
            return Err(ArchiveError::UnsupportedVersion {
                version: header.version,
            });
        }

        let mut records = Vec::with_capacity(header.record_count.min(1024) as usize);
        for i in 0..header.record_count {
            records.push(decode_record(&mut reader, i)?);
        }

        let computed = body_digest(&records);
        if computed != header.body_hash {
            return Err(ArchiveError::HashMismatch {
                what: "body",
                expected: digest_hex(&header.body_hash),
                computed: digest_hex(&computed),
            });
        }

        debug!(records = records.len(), "archive validated");
        Ok(records)
    }

    /// Read an archive from a byte slice.
    pub fn read_from_slice(&self, data: &[u8]) -> ArchiveResult<Vec<Record>> {
        self.read_from(std::io::Cursor::new(data))
    }

    /// Read an archive from a file.
    pub fn read_from_file(&self, path: &Path) -> ArchiveResult<Vec<Record>> {
        let file = File::open(path)?;
        let records = self.read_from(BufReader::new(file))?;
        info!(
            path = %path.display(),
            records = records.len(),
            "archive read"
        );
        Ok(records)
    }

    /// Read just the preamble: signature check plus (version, record count).
    ///
    /// No hash or version validation is performed; this is for cheap
    /// inspection of a candidate file before a full read.
    pub fn peek_header<R: Read>(&self, mut reader: R) -> ArchiveResult<(u8, u32)> {
        let header = read_preamble(&mut reader)?;
        Ok((header.version, header.record_count))
    }
}

/// Read the 44-byte preamble. A source too short to contain the signature,
/// or whose signature differs, is "not a valid archive"; a source that has
/// the signature but ends inside the preamble is corrupted.
fn read_preamble<R: Read>(reader: &mut R) -> ArchiveResult<ArchiveHeader> {
    let mut preamble = [0u8; ARCHIVE_HEADER_SIZE];

    reader
        .read_exact(&mut preamble[0..7])
        .map_err(|_| ArchiveError::NotAnArchive)?;
    if preamble[0..7] != crate::format::ARCHIVE_MAGIC {
        return Err(ArchiveError::NotAnArchive);
    }

    reader
        .read_exact(&mut preamble[7..])
        .map_err(|_| ArchiveError::corrupted("truncated preamble"))?;

    ArchiveHeader::from_bytes(&preamble)
}
