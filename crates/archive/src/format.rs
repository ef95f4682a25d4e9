//! Archive preamble layout and integrity digests.
//!
//! # Archive Layout
//!
//! ```text
//! ┌────────────────────────────────────┐
//! │ Preamble (44 bytes)                │
//! ├────────────────────────────────────┤
//! │ Record 1                           │
//! ├────────────────────────────────────┤
//! │ ...                                │
//! ├────────────────────────────────────┤
//! │ Record N                           │
//! └────────────────────────────────────┘
//!
//! Preamble:
//! ┌──────────┬────────────────┬──────────────┬────────────┬───────────┐
//! │ Magic (7)│ Header hash(16)│ Body hash(16)│ Version (1)│ Count (4) │
//! └──────────┴────────────────┴──────────────┴────────────┴───────────┘
//! ```
//!
//! All multi-byte integers are little-endian.
//!
//! Two digests guard the file. The header hash covers the version byte and
//! record count, so a damaged preamble is caught before any record is read.
//! The body hash covers the concatenation of every record's digest, where a
//! record's digest is xxh3-128 over its exact encoded byte range. Digests
//! are xxh3-128: fast, and adequate against accidental corruption and
//! truncation; they are not a defense against a deliberate attacker.

use duffel_core::Record;
use xxhash_rust::xxh3::xxh3_128;

use crate::codec::encode_record_to_vec;
use crate::error::{ArchiveError, ArchiveResult};

/// Magic bytes identifying an archive file
pub const ARCHIVE_MAGIC: [u8; 7] = *b"DUFPACK";

/// Current archive format version
pub const ARCHIVE_FORMAT_VERSION: u8 = 1;

/// Size of an integrity digest in bytes
pub const DIGEST_LEN: usize = 16;

/// Size of the archive preamble in bytes
pub const ARCHIVE_HEADER_SIZE: usize = 7 + DIGEST_LEN + DIGEST_LEN + 1 + 4;

/// Archive preamble (44 bytes on the wire).
///
/// Written once at the start of each archive; both hashes must recompute
/// equal for the archive to be considered valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveHeader {
    /// xxh3-128 over version byte + record count
    pub header_hash: [u8; DIGEST_LEN],

    /// xxh3-128 over the concatenated per-record digests
    pub body_hash: [u8; DIGEST_LEN],

    /// Format version
    pub version: u8,

    /// Number of records following the preamble
    pub record_count: u32,
}

impl ArchiveHeader {
    /// Build the preamble for an ordered record sequence.
    pub fn for_records(records: &[Record]) -> Self {
        let record_count = records.len() as u32;
        ArchiveHeader {
            header_hash: header_digest(ARCHIVE_FORMAT_VERSION, record_count),
            body_hash: body_digest(records),
            version: ARCHIVE_FORMAT_VERSION,
            record_count,
        }
    }

    /// Serialize the preamble, including the magic signature.
    pub fn to_bytes(&self) -> [u8; ARCHIVE_HEADER_SIZE] {
        let mut bytes = [0u8; ARCHIVE_HEADER_SIZE];
        bytes[0..7].copy_from_slice(&ARCHIVE_MAGIC);
        bytes[7..23].copy_from_slice(&self.header_hash);
        bytes[23..39].copy_from_slice(&self.body_hash);
        bytes[39] = self.version;
        bytes[40..44].copy_from_slice(&self.record_count.to_le_bytes());
        bytes
    }

    /// Parse a preamble, rejecting anything whose signature is not an exact
    /// match. Hash and version validation is the reader's job.
    pub fn from_bytes(bytes: &[u8; ARCHIVE_HEADER_SIZE]) -> ArchiveResult<Self> {
        if bytes[0..7] != ARCHIVE_MAGIC {
            return Err(ArchiveError::NotAnArchive);
        }
        let mut header_hash = [0u8; DIGEST_LEN];
        header_hash.copy_from_slice(&bytes[7..23]);
        let mut body_hash = [0u8; DIGEST_LEN];
        body_hash.copy_from_slice(&bytes[23..39]);
        let version = bytes[39];
        let record_count = u32::from_le_bytes([bytes[40], bytes[41], bytes[42], bytes[43]]);
        Ok(ArchiveHeader {
            header_hash,
            body_hash,
            version,
            record_count,
        })
    }
}

/// Compute the 16-byte xxh3-128 digest of a byte slice.
pub fn digest(data: &[u8]) -> [u8; DIGEST_LEN] {
    xxh3_128(data).to_le_bytes()
}

/// Digest over the preamble's variable fields: version byte, then record
/// count, little-endian.
pub fn header_digest(version: u8, record_count: u32) -> [u8; DIGEST_LEN] {
    let mut input = [0u8; 5];
    input[0] = version;
    input[1..5].copy_from_slice(&record_count.to_le_bytes());
    digest(&input)
}

/// Digest of one record: xxh3-128 over its exact encoded byte range, kind
/// tag included, so every byte the codec writes is integrity-checked.
pub fn record_digest(record: &Record) -> [u8; DIGEST_LEN] {
    digest(&encode_record_to_vec(record))
}

/// Aggregate digest over an ordered record sequence: the digest of the
/// concatenated per-record digests. Reordering records changes the result.
pub fn body_digest(records: &[Record]) -> [u8; DIGEST_LEN] {
    let mut chain = Vec::with_capacity(records.len() * DIGEST_LEN);
    for record in records {
        chain.extend_from_slice(&record_digest(record));
    }
    digest(&chain)
}

/// Hex-encode a digest for logs and error messages.
pub fn digest_hex(d: &[u8; DIGEST_LEN]) -> String {
    format!("{:032x}", u128::from_le_bytes(*d))
}
