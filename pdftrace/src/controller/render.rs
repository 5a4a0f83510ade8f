//! Fixed-layout status display
//!
//! Three lines per render, padded to a constant width so that, with cursor
//! homing enabled, each render overwrites the previous one in place. With
//! terminal mode off the output is plain append-only text for logs.

use std::io::{self, Write};

use crossterm::cursor::{MoveTo, MoveToNextLine};
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};

use crate::classification::ReadClass;
use crate::read_event::ReadEvent;

/// Progress glyphs, advanced once per render
const PROGRESS: [char; 4] = ['|', '/', '-', '\\'];

/// Blank line wide enough to erase any classification line
const BLANK: &str = "                                      ";

/// Lines left free above the status block at start-up
const STARTUP_OFFSET: u16 = 20;

/// Writes read reports to an output sink
pub struct StatusRenderer<W: Write> {
    out: W,
    use_terminal: bool,
    progress: usize,
}

impl<W: Write> StatusRenderer<W> {
    pub fn new(out: W, use_terminal: bool) -> Self {
        Self { out, use_terminal, progress: 0 }
    }

    /// Switch to append-only output
    pub fn disable_terminal(&mut self) {
        self.use_terminal = false;
    }

    #[must_use]
    pub fn output(&self) -> &W {
        &self.out
    }

    /// Clear the screen and move below the host's own start-up output.
    ///
    /// # Errors
    /// Returns the sink's write error
    pub fn prepare_screen(&mut self) -> io::Result<()> {
        if !self.use_terminal {
            return Ok(());
        }
        queue!(self.out, Clear(ClearType::All), MoveToNextLine(STARTUP_OFFSET))?;
        self.out.flush()
    }

    /// Report one read.
    ///
    /// # Errors
    /// Returns the sink's write error
    pub fn render(&mut self, event: &ReadEvent, class: ReadClass) -> io::Result<()> {
        if self.use_terminal {
            queue!(self.out, MoveTo(0, 0))?;
        }

        write!(self.out, "read from {:<9} to {:<9} ", event.offset.0, event.end().0)?;
        if self.use_terminal {
            write!(self.out, "{}    ", PROGRESS[self.progress])?;
        }
        write!(self.out, "\r\n")?;
        self.progress = (self.progress + 1) % PROGRESS.len();

        match class {
            ReadClass::RecordStart(record) => {
                write!(self.out, "OBJECT {:<9} (START)              \r\n", record.0)?;
            }
            ReadClass::IndexStart => write!(self.out, "XREF (START)                          \r\n")?,
            ReadClass::InsideIndex => write!(self.out, "XREF                             \r\n")?,
            ReadClass::Record(record) => {
                write!(self.out, "OBJECT {:<9}                      \r\n", record.0)?;
            }
            ReadClass::Unattributed => write!(self.out, "{BLANK}\r\n")?,
        }
        write!(self.out, "{BLANK}\r\n")?;
        self.out.flush()
    }
}

/// Sink that drains the C library's stdio buffers before each write.
///
/// The host prints through `printf`, the reports through Rust's own
/// buffered stdout; flushing stdio first keeps the host's earlier output
/// ahead of the report on the shared descriptor.
pub struct StdioOrdered<W: Write> {
    inner: W,
}

impl<W: Write> StdioOrdered<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    #[must_use]
    pub fn get_ref(&self) -> &W {
        &self.inner
    }
}

impl<W: Write> Write for StdioOrdered<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        flush_c_stdio();
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[allow(unsafe_code)] // fflush(NULL) has no preconditions
fn flush_c_stdio() {
    // SAFETY: a null stream flushes every open output stream
    unsafe { libc::fflush(std::ptr::null_mut()) };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ByteOffset, RecordNumber};

    fn event(offset: u64, length: usize) -> ReadEvent {
        ReadEvent {
            offset: ByteOffset(offset),
            length,
            record: None,
            starts_record: false,
            starts_index_region: false,
        }
    }

    fn rendered(renderer: &StatusRenderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.output().clone()).unwrap()
    }

    #[test]
    fn test_plain_output_has_no_escapes() {
        let mut renderer = StatusRenderer::new(Vec::new(), false);
        renderer.prepare_screen().unwrap();
        renderer.render(&event(0, 9), ReadClass::RecordStart(RecordNumber(1))).unwrap();

        let text = rendered(&renderer);
        assert!(!text.contains('\x1b'));
        let lines: Vec<&str> = text.split("\r\n").collect();
        assert_eq!(lines[0], "read from 0         to 9         ");
        assert_eq!(lines[1], "OBJECT 1         (START)              ");
        assert_eq!(lines[2], BLANK);
    }

    #[test]
    fn test_terminal_output_homes_cursor_and_spins() {
        let mut renderer = StatusRenderer::new(Vec::new(), true);
        renderer.render(&event(512, 100), ReadClass::Record(RecordNumber(1))).unwrap();
        renderer.render(&event(612, 100), ReadClass::Record(RecordNumber(1))).unwrap();

        let text = rendered(&renderer);
        assert!(text.starts_with("\x1b[1;1H"));
        assert!(text.contains("read from 512       to 612       |    \r\n"));
        assert!(text.contains("read from 612       to 712       /    \r\n"));
        assert!(text.contains(&format!("OBJECT 1{}\r\n", " ".repeat(30))));
    }

    #[test]
    fn test_index_lines() {
        let mut renderer = StatusRenderer::new(Vec::new(), false);
        renderer.render(&event(9000, 4), ReadClass::IndexStart).unwrap();
        renderer.render(&event(9050, 4), ReadClass::InsideIndex).unwrap();
        let text = rendered(&renderer);
        assert!(text.contains("XREF (START)"));
        assert!(text.contains("XREF                             \r\n"));
    }

    #[test]
    fn test_stdio_ordered_passes_bytes_through() {
        let mut renderer = StatusRenderer::new(StdioOrdered::new(Vec::new()), false);
        renderer.render(&event(0, 4), ReadClass::Unattributed).unwrap();
        let text = String::from_utf8(renderer.output().get_ref().clone()).unwrap();
        assert!(text.starts_with("read from 0         to 4         \r\n"));
    }

    #[test]
    fn test_prepare_screen_clears_in_terminal_mode() {
        let mut renderer = StatusRenderer::new(Vec::new(), true);
        renderer.prepare_screen().unwrap();
        assert_eq!(rendered(&renderer), "\x1b[2J\x1b[20E");
    }
}
