//! Write transactions
//!
//! A `WriteTxn` buffers writes in memory. Nothing reaches the value log or
//! the index until the closure passed to `Store::update` returns `Ok`; an
//! `Err` drops the buffer and the store is left untouched.

use std::collections::BTreeMap;

use vectext_core::StoreError;

/// Buffered writes of one update transaction
#[derive(Debug, Default)]
pub struct WriteTxn {
    writes: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl WriteTxn {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Stage `key = value`. A later write to the same key wins.
    pub fn set(
        &mut self,
        key: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
    ) -> Result<(), StoreError> {
        let key = key.into();
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        self.writes.insert(key, value.into());
        Ok(())
    }

    /// Value staged for `key` in this transaction
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.writes.get(key).map(Vec::as_slice)
    }

    /// Number of distinct keys staged
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// True if nothing was staged
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub(crate) fn into_entries(self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.writes.into_iter().collect()
    }
}
