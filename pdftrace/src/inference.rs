//! Object-boundary inference
//!
//! Owns the offset table and turns each read of the traced file into a
//! [`ReadEvent`] using the heuristics in [`crate::classification`].

use crate::classification::{owning_record, parse_record_start, starts_index_region};
use crate::domain::ByteOffset;
use crate::offsets::OffsetTable;
use crate::read_event::ReadEvent;

/// Infers record ownership of reads from the offsets seen so far
#[derive(Debug, Clone, Default)]
pub struct InferenceEngine {
    table: OffsetTable,
}

impl InferenceEngine {
    #[must_use]
    pub fn new(table: OffsetTable) -> Self {
        Self { table }
    }

    #[must_use]
    pub fn table(&self) -> &OffsetTable {
        &self.table
    }

    /// Forget all recorded offsets
    pub fn reset(&mut self) {
        self.table.reset();
    }

    /// Classify a read of `buf` (the bytes actually returned) at `offset`.
    ///
    /// Returns `None` for an empty read. Updates the table as a side effect:
    /// first-seen record starts and the first index region start are kept.
    pub fn classify_read(&mut self, offset: ByteOffset, buf: &[u8]) -> Option<ReadEvent> {
        if buf.is_empty() {
            return None;
        }

        let parsed = parse_record_start(buf);
        let record = match parsed {
            Some(record) => {
                self.table.note_record_start(record, offset);
                Some(record)
            }
            None => owning_record(self.table.known_starts(), offset),
        };

        let starts_index = starts_index_region(self.table.index_region(), offset, buf);
        if starts_index {
            self.table.note_index_region(offset);
        }

        Some(ReadEvent {
            offset,
            length: buf.len(),
            record,
            starts_record: parsed.is_some(),
            starts_index_region: starts_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RecordNumber;

    #[test]
    fn test_empty_read_produces_no_event() {
        let mut engine = InferenceEngine::default();
        assert_eq!(engine.classify_read(ByteOffset(0), b""), None);
    }

    #[test]
    fn test_record_start_then_continuation() {
        let mut engine = InferenceEngine::default();
        let start = engine.classify_read(ByteOffset(0), b"1 0 obj\n").unwrap();
        assert!(start.starts_record);
        assert_eq!(start.record, Some(RecordNumber(1)));
        assert_eq!(engine.table().start_of(RecordNumber(1)), Some(ByteOffset(0)));

        let next = engine.classify_read(ByteOffset(512), b"stream data").unwrap();
        assert!(!next.starts_record);
        assert_eq!(next.record, Some(RecordNumber(1)));
    }

    #[test]
    fn test_repeated_start_keeps_first_offset() {
        let mut engine = InferenceEngine::default();
        engine.classify_read(ByteOffset(100), b"4 0 obj\n");
        let again = engine.classify_read(ByteOffset(700), b"4 0 obj\n").unwrap();
        assert_eq!(again.record, Some(RecordNumber(4)));
        assert_eq!(engine.table().start_of(RecordNumber(4)), Some(ByteOffset(100)));
    }

    #[test]
    fn test_read_before_any_record_is_unattributed() {
        let mut engine = InferenceEngine::default();
        engine.classify_read(ByteOffset(400), b"2 0 obj\n");
        let header = engine.classify_read(ByteOffset(0), b"%PDF-1.7\n").unwrap();
        assert_eq!(header.record, None);
    }

    #[test]
    fn test_beyond_capacity_reported_but_not_stored() {
        let mut engine = InferenceEngine::new(OffsetTable::with_capacity(8));
        let big = engine.classify_read(ByteOffset(300), b"20 0 obj\n").unwrap();
        assert_eq!(big.record, Some(RecordNumber(20)));
        assert!(big.starts_record);
        assert_eq!(engine.table().start_of(RecordNumber(20)), None);

        // Continuation of record 20 cannot be attributed to it
        let tail = engine.classify_read(ByteOffset(350), b"more").unwrap();
        assert_eq!(tail.record, None);
    }

    #[test]
    fn test_index_region_seeded_by_marker_then_by_offset() {
        let mut engine = InferenceEngine::default();
        let xref = engine.classify_read(ByteOffset(9000), b"xref").unwrap();
        assert!(xref.starts_index_region);
        assert_eq!(engine.table().index_region(), Some(ByteOffset(9000)));

        // Marker elsewhere no longer counts once the offset is known
        let other = engine.classify_read(ByteOffset(9500), b"xref").unwrap();
        assert!(!other.starts_index_region);

        let revisit = engine.classify_read(ByteOffset(9000), b"0 12\n").unwrap();
        assert!(revisit.starts_index_region);
    }
}
