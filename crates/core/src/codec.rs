//! Vector codec: embedding vectors <-> store keys
//!
//! A vector of N components is stored as exactly `8 * N` bytes, each component
//! an IEEE-754 `f64` in little-endian order. The bit pattern of every
//! component survives the round trip, NaN payloads and infinities included.
//!
//! The byte order of encoded keys is NOT a numeric order over the vectors.
//! Keys are only ever used for exact lookups and exhaustive iteration.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};
use crate::types::EmbeddingVector;

/// Width of one encoded vector component in bytes
pub const COMPONENT_WIDTH: usize = std::mem::size_of::<f64>();

/// Encode a vector into its key bytes.
///
/// # Errors
///
/// Returns `Error::Encoding` if the vector is empty, since a zero-length key
/// cannot be stored.
pub fn encode_vector(vector: &[f64]) -> Result<Vec<u8>> {
    if vector.is_empty() {
        return Err(Error::encoding("cannot encode an empty vector"));
    }
    let mut key = vec![0u8; vector.len() * COMPONENT_WIDTH];
    LittleEndian::write_f64_into(vector, &mut key);
    Ok(key)
}

/// Decode key bytes back into a vector.
///
/// The resulting dimension is `bytes.len() / 8`, so empty input decodes to
/// an empty vector. No validation of the component values is performed.
///
/// # Errors
///
/// Returns `Error::Decoding` if the length is not a multiple of 8.
pub fn decode_vector(bytes: &[u8]) -> Result<EmbeddingVector> {
    if bytes.len() % COMPONENT_WIDTH != 0 {
        return Err(Error::decoding(format!(
            "key length {} is not a multiple of {}",
            bytes.len(),
            COMPONENT_WIDTH
        )));
    }
    let mut vector = vec![0f64; bytes.len() / COMPONENT_WIDTH];
    LittleEndian::read_f64_into(bytes, &mut vector);
    Ok(vector)
}

/// Decode key bytes and check them against the corpus dimension.
///
/// # Errors
///
/// Returns `Error::Decoding` if the bytes are malformed or decode to a vector
/// whose dimension differs from `dimension`.
pub fn decode_vector_with_dimension(bytes: &[u8], dimension: usize) -> Result<EmbeddingVector> {
    if bytes.len() != dimension * COMPONENT_WIDTH {
        return Err(Error::decoding(format!(
            "key length {} does not match dimension {} ({} bytes expected)",
            bytes.len(),
            dimension,
            dimension * COMPONENT_WIDTH
        )));
    }
    decode_vector(bytes)
}

/// Dimension of the vector a key encodes, if the key is well formed
pub fn encoded_dimension(bytes: &[u8]) -> Option<usize> {
    if bytes.is_empty() || bytes.len() % COMPONENT_WIDTH != 0 {
        None
    } else {
        Some(bytes.len() / COMPONENT_WIDTH)
    }
}
