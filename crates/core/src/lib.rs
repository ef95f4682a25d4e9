//! Core types for Duffel
//!
//! This crate defines the foundational vocabulary shared by the archive and
//! migration layers:
//! - StoreKind: Coarse category of a migrated data unit (which store owns it)
//! - Record: One named unit of migrated data inside an archive
//! - Limits: Defensive size caps applied when decoding untrusted archives

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod limits;
pub mod types;

pub use limits::{MAX_NAME_LEN, MAX_PAYLOAD_LEN};
pub use types::{Record, StoreKind, UnknownKindTag};
