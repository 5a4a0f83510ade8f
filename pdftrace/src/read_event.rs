//! Classified read of the traced file

use crate::domain::{ByteOffset, RecordNumber};

/// One intercepted read of the traced descriptor, after classification.
///
/// Superseded on every subsequent read; the tracer keeps the previous one
/// around for hosts that report "what was just read".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadEvent {
    pub offset: ByteOffset,
    /// Bytes actually returned by the original read
    pub length: usize,
    /// Inferred owner; `None` means before any known record
    pub record: Option<RecordNumber>,
    pub starts_record: bool,
    pub starts_index_region: bool,
}

impl ReadEvent {
    /// Offset just past the last byte read
    #[must_use]
    pub fn end(&self) -> ByteOffset {
        self.offset.advance(self.length)
    }

    /// Same read without its start flags, as reported after the fact
    #[must_use]
    pub fn without_start_flags(self) -> Self {
        Self { starts_record: false, starts_index_region: false, ..self }
    }
}
