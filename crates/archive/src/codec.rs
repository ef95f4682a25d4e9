//! Per-record binary encoding.
//!
//! # Record Layout
//!
//! ```text
//! ┌─────────┬───────────┬─────┬────────────┬────────────┬──────┬─────────────┬─────────┐
//! │ Kind (4)│ KeyLen (4)│ Key │ Schema (4) │ NameLen (4)│ Name │ PayloadLen(4)│ Payload │
//! └─────────┴───────────┴─────┴────────────┴────────────┴──────┴─────────────┴─────────┘
//! ```
//!
//! All integers are fixed-width 4-byte little-endian; strings are UTF-8 with
//! a length prefix. The format is self-delimiting without separators, so
//! payloads may contain arbitrary bytes. A stream that ends early fails with
//! a classified decode error, never a silently truncated record.

use std::io::{Read, Write};

use duffel_core::{Record, StoreKind, MAX_NAME_LEN, MAX_PAYLOAD_LEN};

use crate::error::{ArchiveError, ArchiveResult};

/// Exact encoded size of a record in bytes.
pub fn encoded_len(record: &Record) -> u64 {
    // kind + keyLen + schema + nameLen + payloadLen
    let fixed = 4u64 * 5;
    fixed + record.key.len() as u64 + record.filename.len() as u64 + record.payload.len() as u64
}

/// Encode one record to a writer.
pub fn encode_record<W: Write>(record: &Record, writer: &mut W) -> std::io::Result<()> {
    writer.write_all(&record.kind.tag().to_le_bytes())?;
    writer.write_all(&(record.key.len() as u32).to_le_bytes())?;
    writer.write_all(record.key.as_bytes())?;
    writer.write_all(&record.schema_version.to_le_bytes())?;
    writer.write_all(&(record.filename.len() as u32).to_le_bytes())?;
    writer.write_all(record.filename.as_bytes())?;
    writer.write_all(&(record.payload.len() as u32).to_le_bytes())?;
    writer.write_all(&record.payload)?;
    Ok(())
}

/// Encode one record to a fresh byte vector.
pub fn encode_record_to_vec(record: &Record) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(encoded_len(record) as usize);
    bytes.extend_from_slice(&record.kind.tag().to_le_bytes());
    bytes.extend_from_slice(&(record.key.len() as u32).to_le_bytes());
    bytes.extend_from_slice(record.key.as_bytes());
    bytes.extend_from_slice(&record.schema_version.to_le_bytes());
    bytes.extend_from_slice(&(record.filename.len() as u32).to_le_bytes());
    bytes.extend_from_slice(record.filename.as_bytes());
    bytes.extend_from_slice(&(record.payload.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&record.payload);
    bytes
}

/// Decode one record from a reader.
///
/// `index` is the record's position in the archive, carried into error
/// messages so corruption reports name the failing record.
pub fn decode_record<R: Read>(reader: &mut R, index: u32) -> ArchiveResult<Record> {
    let kind_tag = read_u32(reader, index, "kind tag")?;
    let kind = StoreKind::from_tag(kind_tag)
        .map_err(|e| ArchiveError::invalid_record(index, e.to_string()))?;

    let key_bytes = read_len_prefixed(reader, index, "key", MAX_NAME_LEN)?;
    let key = String::from_utf8(key_bytes)
        .map_err(|_| ArchiveError::invalid_record(index, "key is not valid UTF-8"))?;

    let schema_version = read_u32(reader, index, "schema version")?;

    let name_bytes = read_len_prefixed(reader, index, "filename", MAX_NAME_LEN)?;
    let filename = String::from_utf8(name_bytes)
        .map_err(|_| ArchiveError::invalid_record(index, "filename is not valid UTF-8"))?;

    let payload = read_len_prefixed(reader, index, "payload", MAX_PAYLOAD_LEN)?;

    Ok(Record {
        kind,
        key,
        schema_version,
        filename,
        payload,
    })
}

fn read_u32<R: Read>(reader: &mut R, index: u32, field: &str) -> ArchiveResult<u32> {
    let mut bytes = [0u8; 4];
    reader.read_exact(&mut bytes).map_err(|e| {
        ArchiveError::invalid_record(index, format!("failed to read {}: {}", field, e))
    })?;
    Ok(u32::from_le_bytes(bytes))
}

fn read_len_prefixed<R: Read>(
    reader: &mut R,
    index: u32,
    field: &str,
    max_len: usize,
) -> ArchiveResult<Vec<u8>> {
    let len = read_u32(reader, index, field)? as usize;
    if len > max_len {
        return Err(ArchiveError::invalid_record(
            index,
            format!("{} length {} exceeds maximum {}", field, len, max_len),
        ));
    }
    let mut data = vec![0u8; len];
    reader.read_exact(&mut data).map_err(|e| {
        ArchiveError::invalid_record(index, format!("failed to read {}: {}", field, e))
    })?;
    Ok(data)
}
