//! Read classification heuristics.
//!
//! A document library that keeps an index of record offsets reads each
//! record from its beginning the first time it needs it. This module turns
//! that observation into pure functions over explicit inputs:
//!
//! 1. **Record start sniffing** - a read whose buffer begins with
//!    `<n> 0 obj` and a line terminator starts record `n`
//! 2. **Index marker sniffing** - a read whose buffer begins with `xref`
//!    starts the index region
//! 3. **Owner tie-break** - any other read belongs to the record with the
//!    largest number whose known start lies strictly before it
//!
//! None of this is a parser. The string `1 0 obj` inside a stream that
//! happens to be read from exactly that point is mistaken for a record
//! start, and a host that reads a record from the middle first defeats the
//! tie-break.

use crate::domain::{ByteOffset, RecordNumber};
use crate::read_event::ReadEvent;

/// Literal that opens the index region
const INDEX_MARKER: &[u8] = b"xref";

/// How a read is presented on the status display.
///
/// Variants are listed in display priority order: a read that starts a
/// record is shown as such even when it also lies inside the index region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadClass {
    /// First byte of a record
    RecordStart(RecordNumber),
    /// First byte of the index region
    IndexStart,
    /// Anywhere at or after the index region start
    InsideIndex,
    /// Inside a record whose start is known
    Record(RecordNumber),
    /// Before any known record
    Unattributed,
}

/// Parse `<digits> <blanks> 0 <blanks> obj <line terminator>` at the start of `buf`.
///
/// Returns the record number on success. Leading blanks, signs and numbers
/// that overflow `u32` are rejected.
#[must_use]
pub fn parse_record_start(buf: &[u8]) -> Option<RecordNumber> {
    let digits = buf.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let number: u32 = std::str::from_utf8(&buf[..digits]).ok()?.parse().ok()?;

    let rest = skip_blanks(&buf[digits..])?;
    let rest = rest.strip_prefix(b"0")?;
    let rest = skip_blanks(rest)?;
    let rest = rest.strip_prefix(b"obj")?;

    match rest.first() {
        Some(b'\n' | b'\r') => Some(RecordNumber(number)),
        _ => None,
    }
}

/// Skip one or more spaces or tabs; `None` if there are none.
fn skip_blanks(buf: &[u8]) -> Option<&[u8]> {
    let blanks = buf.iter().take_while(|b| matches!(b, b' ' | b'\t')).count();
    (blanks > 0).then(|| &buf[blanks..])
}

/// True if `buf` begins with the index region marker.
#[must_use]
pub fn is_index_marker(buf: &[u8]) -> bool {
    buf.starts_with(INDEX_MARKER)
}

/// Decide whether a read at `offset` starts the index region.
///
/// Once the region offset is known only exact offset equality counts;
/// before that, the content marker is the only evidence.
#[must_use]
pub fn starts_index_region(index_region: Option<ByteOffset>, offset: ByteOffset, buf: &[u8]) -> bool {
    match index_region {
        Some(known) => offset == known,
        None => is_index_marker(buf),
    }
}

/// Best-guess owner of a read at `offset`.
///
/// Among all known record starts strictly below `offset`, pick the one with
/// the numerically largest record number (not the closest offset).
pub fn owning_record<I>(known_starts: I, offset: ByteOffset) -> Option<RecordNumber>
where
    I: IntoIterator<Item = (RecordNumber, ByteOffset)>,
{
    known_starts
        .into_iter()
        .filter(|&(_, start)| start < offset)
        .map(|(record, _)| record)
        .max()
}

/// Classify an event for display.
///
/// The index region check outranks record attribution here only; it has no
/// effect on which record an event was attributed to.
#[must_use]
pub fn classify_for_display(event: &ReadEvent, index_region: Option<ByteOffset>) -> ReadClass {
    if event.starts_record {
        if let Some(record) = event.record {
            return ReadClass::RecordStart(record);
        }
    }
    if event.starts_index_region {
        return ReadClass::IndexStart;
    }
    if index_region.is_some_and(|start| event.offset >= start) {
        return ReadClass::InsideIndex;
    }
    match event.record {
        Some(record) => ReadClass::Record(record),
        None => ReadClass::Unattributed,
    }
}
