//! Sequential SKU code allocation
//!
//! The allocator is seeded once from the most recently issued code and only
//! advances when a record using the peeked code is actually stored.

use crate::errors::IngestionError;
use printtrack_common::SKU_CODE_PREFIX;

/// Format a sequence number as `SKU-0001`. Widens past 9999.
pub fn format_sku_code(number: u64) -> String {
    format!("{}{:04}", SKU_CODE_PREFIX, number)
}

/// Numeric suffix of an issued code, 0 when it cannot be parsed
pub fn parse_sku_number(code: &str) -> u64 {
    code.trim()
        .rsplit('-')
        .next()
        .and_then(|suffix| suffix.parse().ok())
        .unwrap_or(0)
}

/// Hands out `SKU-NNNN` codes in issuance order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SkuCodeAllocator {
    last_issued: u64,
}

impl SkuCodeAllocator {
    pub fn new(last_issued: u64) -> Self {
        Self { last_issued }
    }

    /// Seed from the code of the most recent record, if any
    pub fn from_latest(latest: Option<&str>) -> Self {
        Self::new(latest.map(parse_sku_number).unwrap_or(0))
    }

    pub fn last_issued(&self) -> u64 {
        self.last_issued
    }

    /// Number the next stored record will receive
    pub fn next_number(&self) -> Result<u64, IngestionError> {
        self.last_issued
            .checked_add(1)
            .ok_or(IngestionError::CodeSequenceExhausted { last_issued: self.last_issued })
    }

    /// Code the next stored record will receive
    pub fn peek_next(&self) -> Result<String, IngestionError> {
        self.next_number().map(format_sku_code)
    }

    /// Record that `number` was stored. Never moves backwards.
    pub fn mark_issued(&mut self, number: u64) {
        self.last_issued = self.last_issued.max(number);
    }

    /// Move past a code another writer already took.
    ///
    /// Never moves backwards, and always skips the colliding number even when
    /// the store still reports an older code.
    pub fn reseed(&mut self, latest: Option<&str>) {
        let stored = latest.map(parse_sku_number).unwrap_or(0);
        self.last_issued = self.last_issued.saturating_add(1).max(stored);
    }
}
