//! Record offset table
//!
//! Fixed-capacity map from record number to the offset where that record
//! was first seen starting, plus the single index region offset.

use log::debug;
use pdftrace_common::MAX_RECORDS;

use crate::domain::{ByteOffset, RecordNumber};

/// First-observed start offsets of records and of the index region
#[derive(Debug, Clone)]
pub struct OffsetTable {
    starts: Box<[Option<ByteOffset>]>,
    /// One past the highest record number ever seen starting within capacity
    known_bound: usize,
    index_region: Option<ByteOffset>,
}

impl OffsetTable {
    /// Create a table with the default capacity
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(MAX_RECORDS)
    }

    /// Create a table holding at most `capacity` records
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self { starts: vec![None; capacity].into_boxed_slice(), known_bound: 0, index_region: None }
    }

    /// Forget every recorded offset
    pub fn reset(&mut self) {
        self.starts.fill(None);
        self.known_bound = 0;
        self.index_region = None;
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.starts.len()
    }

    /// Record that `record` starts at `offset`, unless its start is already known.
    ///
    /// Returns true if the table changed. Records beyond capacity are never
    /// stored.
    pub fn note_record_start(&mut self, record: RecordNumber, offset: ByteOffset) -> bool {
        let Some(slot) = record.slot(self.capacity()) else {
            debug!("Record {record} beyond table capacity {}, start not recorded", self.capacity());
            return false;
        };
        self.known_bound = self.known_bound.max(slot + 1);
        if self.starts[slot].is_some() {
            return false;
        }
        self.starts[slot] = Some(offset);
        true
    }

    /// Known start of `record`, if any
    #[must_use]
    pub fn start_of(&self, record: RecordNumber) -> Option<ByteOffset> {
        record.slot(self.capacity()).and_then(|slot| self.starts[slot])
    }

    /// Highest record number seen starting, if any
    #[must_use]
    pub fn highest_record(&self) -> Option<RecordNumber> {
        self.known_bound.checked_sub(1).and_then(|n| u32::try_from(n).ok()).map(RecordNumber)
    }

    /// All known record starts, in record number order
    pub fn known_starts(&self) -> impl Iterator<Item = (RecordNumber, ByteOffset)> + '_ {
        self.starts[..self.known_bound].iter().enumerate().filter_map(|(slot, start)| {
            let start = (*start)?;
            let record = u32::try_from(slot).ok()?;
            Some((RecordNumber(record), start))
        })
    }

    #[must_use]
    pub fn index_region(&self) -> Option<ByteOffset> {
        self.index_region
    }

    /// Set the index region offset; later calls are ignored
    pub fn note_index_region(&mut self, offset: ByteOffset) -> bool {
        if self.index_region.is_some() {
            return false;
        }
        self.index_region = Some(offset);
        true
    }
}

impl Default for OffsetTable {
    fn default() -> Self {
        Self::new()
    }
}
