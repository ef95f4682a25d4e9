//! Archive error types

use std::io;
use thiserror::Error;

/// Result type for archive operations
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Errors that can occur while writing or validating an archive
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The source does not start with the archive signature
    #[error("not a valid archive")]
    NotAnArchive,

    /// The archive is structurally damaged (truncated preamble, short body)
    #[error("corrupted archive: {0}")]
    Corrupted(String),

    /// A recomputed integrity digest does not match the stored one
    #[error("corrupted archive: {what} hash mismatch: expected {expected}, computed {computed}")]
    HashMismatch {
        /// Which digest failed ("header" or "body")
        what: &'static str,
        /// Hex of the digest stored in the archive
        expected: String,
        /// Hex of the digest recomputed from the data
        computed: String,
    },

    /// Unsupported archive format version
    #[error("unsupported archive version: {version} (supported: 1)")]
    UnsupportedVersion {
        /// The version byte found in the archive
        version: u8,
    },

    /// A record failed to decode
    #[error("invalid record at index {index}: {reason}")]
    InvalidRecord {
        /// Zero-based index of the record in the archive
        index: u32,
        /// Description of the problem
        reason: String,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ArchiveError {
    /// Create a corruption error
    pub fn corrupted(msg: impl Into<String>) -> Self {
        Self::Corrupted(msg.into())
    }

    /// Create an invalid-record error
    pub fn invalid_record(index: u32, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            index,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ArchiveError::NotAnArchive;
        assert!(err.to_string().contains("not a valid archive"));

        let err = ArchiveError::HashMismatch {
            what: "body",
            expected: "aa".to_string(),
            computed: "bb".to_string(),
        };
        assert!(err.to_string().contains("body"));
        assert!(err.to_string().contains("aa"));
        assert!(err.to_string().contains("bb"));

        let err = ArchiveError::UnsupportedVersion { version: 9 };
        assert!(err.to_string().contains('9'));

        let err = ArchiveError::invalid_record(3, "short read");
        assert!(err.to_string().contains("index 3"));
        assert!(err.to_string().contains("short read"));
    }

    #[test]
    fn test_error_constructors() {
        assert!(matches!(
            ArchiveError::corrupted("truncated preamble"),
            ArchiveError::Corrupted(_)
        ));
        assert!(matches!(
            ArchiveError::invalid_record(0, "x"),
            ArchiveError::InvalidRecord { index: 0, .. }
        ));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: ArchiveError = io_err.into();
        assert!(matches!(err, ArchiveError::Io(_)));
    }
}
