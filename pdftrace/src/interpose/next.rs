//! Forwarding to the real C library
//!
//! Each operation owns an [`OriginalFn`] cell. The first call resolves the
//! next definition of the symbol after this library and caches it; later
//! calls reuse it. Resolving twice is harmless, the cell just receives an
//! equal pointer again.

#![allow(unsafe_code)]

use std::ffi::{c_char, c_int, c_void};
use std::sync::atomic::{AtomicPtr, Ordering};

use log::error;

use super::FileOps;
use crate::domain::TraceError;

type OpenFn = unsafe extern "C" fn(*const c_char, c_int, libc::mode_t) -> c_int;
type FopenFn = unsafe extern "C" fn(*const c_char, *const c_char) -> *mut libc::FILE;
type ReadFn = unsafe extern "C" fn(c_int, *mut c_void, usize) -> isize;
type PreadFn = unsafe extern "C" fn(c_int, *mut c_void, usize, i64) -> isize;

static OPEN: OriginalFn = OriginalFn::new(b"open\0");
static OPEN64: OriginalFn = OriginalFn::new(b"open64\0");
static FOPEN: OriginalFn = OriginalFn::new(b"fopen\0");
static FOPEN64: OriginalFn = OriginalFn::new(b"fopen64\0");
static READ: OriginalFn = OriginalFn::new(b"read\0");
static PREAD64: OriginalFn = OriginalFn::new(b"pread64\0");

/// Lazily resolved address of the original definition of one symbol
pub struct OriginalFn {
    /// NUL-terminated symbol name
    name: &'static [u8],
    address: AtomicPtr<c_void>,
}

impl OriginalFn {
    #[must_use]
    pub const fn new(name: &'static [u8]) -> Self {
        Self { name, address: AtomicPtr::new(std::ptr::null_mut()) }
    }

    /// Symbol name without the terminating NUL
    #[must_use]
    pub fn name(&self) -> &str {
        let name = self.name.strip_suffix(b"\0").unwrap_or(self.name);
        std::str::from_utf8(name).unwrap_or("<invalid>")
    }

    /// Resolve (once) the definition following this library.
    ///
    /// # Errors
    /// Returns [`TraceError::SymbolNotFound`] if no later object defines it.
    pub fn resolve(&self) -> Result<*mut c_void, TraceError> {
        let cached = self.address.load(Ordering::Relaxed);
        if !cached.is_null() {
            return Ok(cached);
        }
        // SAFETY: `name` is NUL-terminated; RTLD_NEXT lookup has no other preconditions
        let address = unsafe { libc::dlsym(libc::RTLD_NEXT, self.name.as_ptr().cast()) };
        if address.is_null() {
            return Err(TraceError::SymbolNotFound(self.name().to_string()));
        }
        self.address.store(address, Ordering::Relaxed);
        Ok(address)
    }

    /// Resolved address; a missing original is unrecoverable.
    fn address(&self) -> *mut c_void {
        match self.resolve() {
            Ok(address) => address,
            Err(e) => {
                error!("{e}");
                std::process::abort();
            }
        }
    }
}

/// Forwards every operation to the next definition in lookup order
#[derive(Debug, Clone, Copy, Default)]
pub struct NextOps;

impl NextOps {
    /// `fopen(3)`
    ///
    /// # Safety
    /// `path` and `mode` must be valid NUL-terminated strings.
    pub unsafe fn fopen(&self, path: *const c_char, mode: *const c_char) -> *mut libc::FILE {
        let original: FopenFn = std::mem::transmute(FOPEN.address());
        original(path, mode)
    }

    /// `fopen64(3)`
    ///
    /// # Safety
    /// `path` and `mode` must be valid NUL-terminated strings.
    pub unsafe fn fopen64(&self, path: *const c_char, mode: *const c_char) -> *mut libc::FILE {
        let original: FopenFn = std::mem::transmute(FOPEN64.address());
        original(path, mode)
    }
}

impl FileOps for NextOps {
    unsafe fn open(&self, path: *const c_char, flags: c_int, mode: libc::mode_t) -> c_int {
        let original: OpenFn = std::mem::transmute(OPEN.address());
        original(path, flags, mode)
    }

    unsafe fn open64(&self, path: *const c_char, flags: c_int, mode: libc::mode_t) -> c_int {
        let original: OpenFn = std::mem::transmute(OPEN64.address());
        original(path, flags, mode)
    }

    unsafe fn read(&self, fd: c_int, buf: *mut c_void, count: usize) -> isize {
        let original: ReadFn = std::mem::transmute(READ.address());
        original(fd, buf, count)
    }

    unsafe fn pread64(&self, fd: c_int, buf: *mut c_void, count: usize, offset: i64) -> isize {
        let original: PreadFn = std::mem::transmute(PREAD64.address());
        original(fd, buf, count, offset)
    }

    fn tell(&self, fd: c_int) -> Option<u64> {
        // SAFETY: querying the position has no memory safety requirements
        let position = unsafe { libc::lseek64(fd, 0, libc::SEEK_CUR) };
        u64::try_from(position).ok()
    }
}
