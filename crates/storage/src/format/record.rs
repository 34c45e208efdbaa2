//! Value log record format.
//!
//! One record is written per committed write transaction.
//!
//! # Record Layout
//!
//! ```text
//! ┌─────────────────┬──────────────────────────────┬──────────┐
//! │ Length (4 bytes)│ Payload (variable)           │ CRC32 (4)│
//! └─────────────────┴──────────────────────────────┴──────────┘
//!
//! Payload:
//! ┌────────────┬─────────────┬───────────────┬────────────┬──────────────────────┐
//! │ Format (1) │ Version (8) │ Timestamp (8) │ Count (4)  │ Entries (variable)   │
//! └────────────┴─────────────┴───────────────┴────────────┴──────────────────────┘
//!
//! Entry:
//! ┌──────────────┬───────────┬────────────────┬─────────────┐
//! │ KeyLen (4)   │ Key       │ ValueLen (4)   │ Value       │
//! └──────────────┴───────────┴────────────────┴─────────────┘
//! ```
//!
//! The length field covers payload + CRC. All integers are little-endian.

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use crc32fast::Hasher;

/// Current record format version
pub const RECORD_FORMAT_VERSION: u8 = 1;

/// Fixed payload prefix: format (1) + version (8) + timestamp (8) + count (4)
const PAYLOAD_HEADER_SIZE: usize = 21;

/// Size an entry contributes to segment accounting.
///
/// Used for both live-byte and discard-byte bookkeeping.
pub fn entry_size(key: &[u8], value: &[u8]) -> u64 {
    (8 + key.len() + value.len()) as u64
}

/// A committed transaction as persisted in the value log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Commit version assigned by the store
    pub version: u64,
    /// Commit timestamp (microseconds since epoch)
    pub timestamp: u64,
    /// Key/value pairs written by the transaction, in key order
    pub entries: Vec<(Vec<u8>, Vec<u8>)>,
}

impl LogRecord {
    /// Create a new record.
    pub fn new(version: u64, timestamp: u64, entries: Vec<(Vec<u8>, Vec<u8>)>) -> Self {
        LogRecord {
            version,
            timestamp,
            entries,
        }
    }

    /// Serialize record to bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let body: usize = self
            .entries
            .iter()
            .map(|(k, v)| 8 + k.len() + v.len())
            .sum();
        let mut payload = Vec::with_capacity(PAYLOAD_HEADER_SIZE + body);
        payload.push(RECORD_FORMAT_VERSION);
        // Writes into a Vec cannot fail
        let _ = payload.write_u64::<LittleEndian>(self.version);
        let _ = payload.write_u64::<LittleEndian>(self.timestamp);
        let _ = payload.write_u32::<LittleEndian>(self.entries.len() as u32);
        for (key, value) in &self.entries {
            let _ = payload.write_u32::<LittleEndian>(key.len() as u32);
            payload.extend_from_slice(key);
            let _ = payload.write_u32::<LittleEndian>(value.len() as u32);
            payload.extend_from_slice(value);
        }

        let crc = compute_crc(&payload);
        let total_len = payload.len() + 4;
        let mut record = Vec::with_capacity(4 + total_len);
        let _ = record.write_u32::<LittleEndian>(total_len as u32);
        record.extend_from_slice(&payload);
        let _ = record.write_u32::<LittleEndian>(crc);
        record
    }

    /// Deserialize a record from the front of `bytes`.
    ///
    /// Returns (record, bytes_consumed) on success.
    pub fn from_bytes(bytes: &[u8]) -> Result<(Self, usize), RecordError> {
        if bytes.len() < 4 {
            return Err(RecordError::InsufficientData);
        }
        let length = LittleEndian::read_u32(&bytes[0..4]) as usize;
        if length < PAYLOAD_HEADER_SIZE + 4 {
            return Err(RecordError::InvalidFormat);
        }
        if bytes.len() < 4 + length {
            return Err(RecordError::InsufficientData);
        }

        let payload = &bytes[4..4 + length - 4];
        let stored_crc = LittleEndian::read_u32(&bytes[4 + length - 4..4 + length]);
        let computed_crc = compute_crc(payload);
        if stored_crc != computed_crc {
            return Err(RecordError::ChecksumMismatch {
                expected: stored_crc,
                computed: computed_crc,
            });
        }

        if payload[0] != RECORD_FORMAT_VERSION {
            return Err(RecordError::UnsupportedVersion(payload[0]));
        }
        let version = LittleEndian::read_u64(&payload[1..9]);
        let timestamp = LittleEndian::read_u64(&payload[9..17]);
        let count = LittleEndian::read_u32(&payload[17..21]) as usize;

        let mut entries = Vec::with_capacity(count.min(1024));
        let mut pos = PAYLOAD_HEADER_SIZE;
        for _ in 0..count {
            let key = read_chunk(payload, &mut pos)?;
            let value = read_chunk(payload, &mut pos)?;
            entries.push((key, value));
        }
        if pos != payload.len() {
            return Err(RecordError::InvalidFormat);
        }

        Ok((
            LogRecord {
                version,
                timestamp,
                entries,
            },
            4 + length,
        ))
    }
}

fn read_chunk(payload: &[u8], pos: &mut usize) -> Result<Vec<u8>, RecordError> {
    if payload.len() < *pos + 4 {
        return Err(RecordError::InvalidFormat);
    }
    let len = LittleEndian::read_u32(&payload[*pos..*pos + 4]) as usize;
    *pos += 4;
    if payload.len() < *pos + len {
        return Err(RecordError::InvalidFormat);
    }
    let chunk = payload[*pos..*pos + len].to_vec();
    *pos += len;
    Ok(chunk)
}

fn compute_crc(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Record parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// Not enough data to parse record
    #[error("Insufficient data to parse record")]
    InsufficientData,

    /// Record format is invalid
    #[error("Invalid record format")]
    InvalidFormat,

    /// Checksum verification failed
    #[error("Checksum mismatch: expected {expected:08x}, computed {computed:08x}")]
    ChecksumMismatch {
        /// Expected checksum from record
        expected: u32,
        /// Computed checksum
        computed: u32,
    },

    /// Unsupported format version
    #[error("Unsupported format version: {0}")]
    UnsupportedVersion(u8),
}
