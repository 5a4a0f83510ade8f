//! Replacement bodies shared by every interposed entry point.
//!
//! Each function forwards to the original operation first, then lets the
//! tracer observe the outcome. The original return value is handed back
//! unchanged and `errno` is restored to what the original left, so a failed
//! call looks exactly as it would without this library.
//!
//! The tracer is only borrowed from its [`TracerSlot`] around observation.
//! Reads of descriptors other than the traced one never touch it at all.

#![allow(unsafe_code)]

use std::ffi::{c_char, c_int, c_void, CStr};

use log::debug;

use super::next::NextOps;
use super::slot::TracerSlot;
use super::FileOps;
use crate::domain::{ByteOffset, Fd};

/// Which open-family entry point was called
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenKind {
    Open,
    Open64,
}

/// Where a read-family call reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadAt {
    /// `read`: the descriptor's current position
    Current,
    /// `pread64`: an explicit offset
    Offset(i64),
}

/// Saved `errno`, put back on drop
struct ErrnoGuard(c_int);

impl ErrnoGuard {
    fn save() -> Self {
        // SAFETY: __errno_location always returns the calling thread's errno slot
        Self(unsafe { *libc::__errno_location() })
    }
}

impl Drop for ErrnoGuard {
    fn drop(&mut self) {
        // SAFETY: as in `save`
        unsafe { *libc::__errno_location() = self.0 };
    }
}

/// Body of the `open`/`open64` replacements.
///
/// # Safety
/// `path` must be a valid NUL-terminated string.
pub unsafe fn intercept_open<O: FileOps, S: TracerSlot>(
    ops: &O,
    slot: &S,
    kind: OpenKind,
    path: *const c_char,
    flags: c_int,
    mode: libc::mode_t,
) -> c_int {
    let fd = match kind {
        OpenKind::Open => ops.open(path, flags, mode),
        OpenKind::Open64 => ops.open64(path, flags, mode),
    };
    observe_open(slot, path, fd);
    fd
}

/// Body of the `fopen`/`fopen64` replacements.
///
/// # Safety
/// `path` and `mode` must be valid NUL-terminated strings.
pub unsafe fn intercept_fopen<S: TracerSlot>(
    ops: &NextOps,
    slot: &S,
    kind: OpenKind,
    path: *const c_char,
    mode: *const c_char,
) -> *mut libc::FILE {
    let stream = match kind {
        OpenKind::Open => ops.fopen(path, mode),
        OpenKind::Open64 => ops.fopen64(path, mode),
    };
    let fd = if stream.is_null() { -1 } else { libc::fileno(stream) };
    observe_open(slot, path, fd);
    stream
}

unsafe fn observe_open<S: TracerSlot>(slot: &S, path: *const c_char, fd: c_int) {
    if path.is_null() {
        return;
    }
    let _errno = ErrnoGuard::save();
    let filename = CStr::from_ptr(path).to_bytes();
    if slot.traced().is_some() {
        debug!("open({}) = {fd}", String::from_utf8_lossy(filename));
        return;
    }
    slot.with_tracer(|tracer| tracer.on_open(filename, Fd(fd)));
}

/// Body of the `read`/`pread64` replacements.
///
/// On the traced descriptor the request may be shrunk to the configured
/// granularity; the caller only ever sees what the original returned.
///
/// # Safety
/// `buf` must be valid for writes of `count` bytes.
pub unsafe fn intercept_read<O: FileOps, S: TracerSlot>(
    ops: &O,
    slot: &S,
    fd: c_int,
    buf: *mut c_void,
    count: usize,
    at: ReadAt,
) -> isize {
    if slot.traced() != Some(Fd(fd)) {
        return forward_read(ops, fd, buf, count, at);
    }
    let Some(count) = slot.with_tracer(|tracer| tracer.request_len(count)) else {
        return forward_read(ops, fd, buf, count, at);
    };

    let offset = match at {
        ReadAt::Current => ops.tell(fd),
        ReadAt::Offset(offset) => u64::try_from(offset).ok(),
    };

    let result = forward_read(ops, fd, buf, count, at);
    let Ok(length) = usize::try_from(result) else {
        return result;
    };
    if length == 0 {
        return result;
    }

    let _errno = ErrnoGuard::save();
    match offset {
        Some(offset) => {
            // SAFETY: the original read initialised the first `length` bytes
            let bytes = std::slice::from_raw_parts(buf.cast::<u8>().cast_const(), length);
            slot.with_tracer(|tracer| tracer.on_read(Fd(fd), ByteOffset(offset), bytes));
        }
        None => debug!("Read of {length} bytes on fd {fd} at unknown position, not classified"),
    }
    result
}

unsafe fn forward_read<O: FileOps>(
    ops: &O,
    fd: c_int,
    buf: *mut c_void,
    count: usize,
    at: ReadAt,
) -> isize {
    match at {
        ReadAt::Current => ops.read(fd, buf, count),
        ReadAt::Offset(offset) => ops.pread64(fd, buf, count, offset),
    }
}
