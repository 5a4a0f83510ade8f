//! Raw input mode for the controlling terminal
//!
//! Only the input side changes: line buffering and local echo are switched
//! off and reads return after a single byte, so one keystroke resumes a
//! pause. Output processing and signal keys stay as the host left them.

#![allow(unsafe_code)] // termios calls require unsafe

use std::io;
use std::os::fd::RawFd;

use crate::domain::TraceError;

/// Terminal settings captured before switching to raw input
pub struct TerminalMode {
    fd: RawFd,
    original: libc::termios,
}

impl TerminalMode {
    /// Capture the current settings of `fd` and switch it to raw input.
    ///
    /// # Errors
    /// Returns [`TraceError::TerminalError`] if `fd` is not a terminal or
    /// its settings cannot be changed.
    pub fn enter_raw(fd: RawFd) -> Result<Self, TraceError> {
        let original = get_attr(fd)?;
        let raw = raw_input(&original);
        set_attr(fd, &raw)?;
        Ok(Self { fd, original })
    }

    /// Put back the settings captured by [`TerminalMode::enter_raw`].
    ///
    /// # Errors
    /// Returns [`TraceError::TerminalError`] if the terminal rejects them.
    pub fn restore(&self) -> Result<(), TraceError> {
        set_attr(self.fd, &self.original)
    }
}

/// Copy of `original` with canonical mode and echo off, one-byte reads
#[must_use]
pub fn raw_input(original: &libc::termios) -> libc::termios {
    let mut raw = *original;
    raw.c_lflag &= !(libc::ECHO | libc::ICANON);
    raw.c_cc[libc::VMIN] = 1;
    raw.c_cc[libc::VTIME] = 0;
    raw
}

fn get_attr(fd: RawFd) -> Result<libc::termios, TraceError> {
    // SAFETY: termios is plain old data; tcgetattr fully initialises it on success
    let mut attr: libc::termios = unsafe { std::mem::zeroed() };
    if unsafe { libc::tcgetattr(fd, &mut attr) } != 0 {
        return Err(TraceError::TerminalError(format!(
            "tcgetattr({fd}): {}",
            io::Error::last_os_error()
        )));
    }
    Ok(attr)
}

fn set_attr(fd: RawFd, attr: &libc::termios) -> Result<(), TraceError> {
    // SAFETY: `attr` points to a valid termios
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, attr) } != 0 {
        return Err(TraceError::TerminalError(format!(
            "tcsetattr({fd}): {}",
            io::Error::last_os_error()
        )));
    }
    Ok(())
}
