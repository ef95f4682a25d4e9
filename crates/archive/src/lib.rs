//! Binary archive container for Duffel
//!
//! This crate implements the portable archive format produced by export and
//! consumed by import:
//!
//! - `format`: magic/preamble layout and the xxh3-128 integrity digests
//! - `codec`: per-record binary encoding (length-prefixed, self-delimiting)
//! - `writer`: streams validated archives to a sink or file (atomic rename)
//! - `reader`: validates signature, version and both digests before decoding
//!
//! The container multiplexes heterogeneous records behind a fixed preamble
//! carrying two digests: one over the preamble fields, one aggregated over
//! every record. A truncated or tampered file fails validation before any
//! caller acts on its contents.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod error;
pub mod format;
pub mod reader;
pub mod writer;

pub use error::{ArchiveError, ArchiveResult};
pub use format::{
    body_digest, digest_hex, header_digest, record_digest, ArchiveHeader, ARCHIVE_FORMAT_VERSION,
    ARCHIVE_HEADER_SIZE, ARCHIVE_MAGIC, DIGEST_LEN,
};
pub use reader::ArchiveReader;
pub use writer::{ArchiveWriter, ExportInfo};
