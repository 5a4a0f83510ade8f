//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers prevent mixing up a file descriptor, a byte offset
//! and a record number, all of which are plain integers at the C boundary.

use std::fmt;

/// File descriptor as returned by `open(2)` or `fileno(3)`
///
/// Negative values mean the open failed and never identify a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fd(pub i32);

impl Fd {
    /// Returns true if this descriptor refers to an open file
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for Fd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FD:{}", self.0)
    }
}

/// Absolute byte position inside the traced file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ByteOffset(pub u64);

impl ByteOffset {
    /// Offset just past a read of `length` bytes starting here
    #[must_use]
    pub fn advance(self, length: usize) -> Self {
        ByteOffset(self.0.saturating_add(length as u64))
    }
}

impl fmt::Display for ByteOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Logical record ("object") number, as written before `0 obj`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordNumber(pub u32);

impl RecordNumber {
    /// Table slot for this record, if it fits within `capacity`
    #[must_use]
    pub fn slot(self, capacity: usize) -> Option<usize> {
        let index = self.0 as usize;
        (index < capacity).then_some(index)
    }
}

impl fmt::Display for RecordNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fd_validity() {
        assert!(Fd(0).is_valid());
        assert!(Fd(7).is_valid());
        assert!(!Fd(-1).is_valid());
    }

    #[test]
    fn test_record_slot_respects_capacity() {
        assert_eq!(RecordNumber(3).slot(4), Some(3));
        assert_eq!(RecordNumber(4).slot(4), None);
    }

    #[test]
    fn test_offset_advance_saturates() {
        assert_eq!(ByteOffset(10).advance(5), ByteOffset(15));
        assert_eq!(ByteOffset(u64::MAX).advance(1), ByteOffset(u64::MAX));
    }
}
