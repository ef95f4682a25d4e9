//! Size limits applied when decoding untrusted archive bytes.
//!
//! A corrupted length prefix must never drive an allocation; decoders reject
//! any declared length above these caps before reading the field.

/// Maximum length in bytes of a record key or filename.
pub const MAX_NAME_LEN: usize = 4096;

/// Maximum length in bytes of a single record payload.
pub const MAX_PAYLOAD_LEN: usize = 64 * 1024 * 1024;
