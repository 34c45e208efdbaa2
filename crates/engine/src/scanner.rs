//! Record scanner
//!
//! Full scans over a fresh read snapshot, decoding each key back into its
//! vector. Scans are lazy, finite and non-restartable, and yield records in
//! store key order (lexicographic over the encoded bytes, which is not a
//! meaningful vector order).
//!
//! Every key must decode to the same dimension: the expected one if the
//! caller supplies it, otherwise the dimension of the first record. The
//! first key that does not fit yields `Error::Decoding` and ends the scan.

use std::sync::Arc;

use vectext_core::{
    decode_vector, decode_vector_with_dimension, EmbeddingVector, Error, Result, TextRecord,
};
use vectext_storage::{IteratorOptions, Item, SnapshotIter, Store};

/// Decodes keys while enforcing one dimension across a scan
#[derive(Debug)]
struct KeyDecoder {
    expected: Option<usize>,
}

impl KeyDecoder {
    fn decode(&mut self, key: &[u8]) -> Result<EmbeddingVector> {
        match self.expected {
            Some(dimension) => decode_vector_with_dimension(key, dimension),
            None => {
                let vector = decode_vector(key)?;
                self.expected = Some(vector.len());
                Ok(vector)
            }
        }
    }
}

/// Iterator over every stored record
#[derive(Debug)]
pub struct RecordScan {
    iter: SnapshotIter,
    decoder: KeyDecoder,
    finished: bool,
}

impl RecordScan {
    fn decode(&mut self, item: &Item) -> Result<TextRecord> {
        let vector = self.decoder.decode(item.key())?;
        let value = item
            .value()
            .ok_or_else(|| Error::decoding("record value was not loaded"))?;
        let text = std::str::from_utf8(value)
            .map_err(|e| Error::decoding(format!("stored text is not valid UTF-8: {}", e)))?;
        Ok(TextRecord::new(vector, text))
    }

    /// Dimension enforced by this scan, once known
    pub fn dimension(&self) -> Option<usize> {
        self.decoder.expected
    }
}

impl Iterator for RecordScan {
    type Item = Result<TextRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let item = self.iter.next()?;
        let record = self.decode(&item);
        if record.is_err() {
            self.finished = true;
        }
        Some(record)
    }
}

impl std::iter::FusedIterator for RecordScan {}

/// Iterator over every stored vector, values not loaded
#[derive(Debug)]
pub struct VectorScan {
    iter: SnapshotIter,
    decoder: KeyDecoder,
    finished: bool,
}

impl Iterator for VectorScan {
    type Item = Result<EmbeddingVector>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let item = self.iter.next()?;
        let vector = self.decoder.decode(item.key());
        if vector.is_err() {
            self.finished = true;
        }
        Some(vector)
    }
}

impl std::iter::FusedIterator for VectorScan {}

/// Scan all records in a fresh snapshot.
///
/// Commits made after this call are not observed by the scan.
pub fn scan_all(store: &Arc<Store>, expected_dimension: Option<usize>) -> Result<RecordScan> {
    let snapshot = store.snapshot()?;
    Ok(RecordScan {
        iter: snapshot.iter(IteratorOptions::default()),
        decoder: KeyDecoder {
            expected: expected_dimension,
        },
        finished: false,
    })
}

/// Scan all vectors in a fresh snapshot, without loading the texts.
pub fn scan_vectors(store: &Arc<Store>, expected_dimension: Option<usize>) -> Result<VectorScan> {
    let snapshot = store.snapshot()?;
    Ok(VectorScan {
        iter: snapshot.iter(IteratorOptions::keys_only()),
        decoder: KeyDecoder {
            expected: expected_dimension,
        },
        finished: false,
    })
}
