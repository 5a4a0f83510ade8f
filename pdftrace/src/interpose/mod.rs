//! # Interceptable Operations
//!
//! The file operations this library stands in for, modelled as a small
//! trait so the tracing logic never cares whether it is talking to the real
//! C library or to a script.
//!
//! - [`NextOps`] - forwards to the implementation that follows this library
//!   in symbol lookup order (`dlsym(RTLD_NEXT, ...)`), resolved lazily and
//!   cached per operation
//! - [`ScriptedFiles`] - in-memory files that record every forwarded request
//!
//! [`dispatch`] holds the glue every replacement runs: forward, then feed
//! the result to the tracer, then hand the original result back untouched.
//! [`slot`] decides when the tracer may be borrowed for that.

#![allow(unsafe_code)] // raw pointers cross the C boundary here

use std::ffi::{c_char, c_int, c_void};

pub mod dispatch;
pub mod fake;
pub mod next;
pub mod slot;

pub use dispatch::{intercept_fopen, intercept_open, intercept_read, OpenKind, ReadAt};
pub use fake::ScriptedFiles;
pub use next::{NextOps, OriginalFn};
pub use slot::{SharedTracer, TracerSlot};

/// Operations whose calls are observed.
///
/// All methods mirror their C counterparts exactly, including returning -1
/// and leaving the reason in `errno`.
pub trait FileOps {
    /// `open(2)`
    ///
    /// # Safety
    /// `path` must be a valid NUL-terminated string.
    unsafe fn open(&self, path: *const c_char, flags: c_int, mode: libc::mode_t) -> c_int;

    /// `open64(2)`
    ///
    /// # Safety
    /// `path` must be a valid NUL-terminated string.
    unsafe fn open64(&self, path: *const c_char, flags: c_int, mode: libc::mode_t) -> c_int;

    /// `read(2)`
    ///
    /// # Safety
    /// `buf` must be valid for writes of `count` bytes.
    unsafe fn read(&self, fd: c_int, buf: *mut c_void, count: usize) -> isize;

    /// `pread64(2)`
    ///
    /// # Safety
    /// `buf` must be valid for writes of `count` bytes.
    unsafe fn pread64(&self, fd: c_int, buf: *mut c_void, count: usize, offset: i64) -> isize;

    /// Current file position of `fd`, if it has one
    fn tell(&self, fd: c_int) -> Option<u64>;
}
