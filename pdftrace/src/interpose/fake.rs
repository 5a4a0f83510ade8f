//! Scriptable in-memory stand-in for the C library file operations

#![allow(unsafe_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::{c_char, c_int, c_void, CStr};

use super::FileOps;

/// First descriptor handed out, after the standard streams
const FIRST_FD: c_int = 3;

#[derive(Debug, Clone)]
struct FakeFile {
    contents: Vec<u8>,
    cursor: usize,
}

#[derive(Debug, Default)]
struct State {
    catalog: HashMap<Vec<u8>, Vec<u8>>,
    open: HashMap<c_int, FakeFile>,
    next_fd: c_int,
    requests: Vec<(c_int, usize)>,
}

/// In-memory files behind [`FileOps`].
///
/// Files are registered by path; opening one hands out a fresh descriptor.
/// Every read request is recorded with the length actually asked for, so
/// tests can check what reached the "original" operation.
#[derive(Debug)]
pub struct ScriptedFiles {
    state: RefCell<State>,
}

impl Default for ScriptedFiles {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedFiles {
    #[must_use]
    pub fn new() -> Self {
        Self { state: RefCell::new(State { next_fd: FIRST_FD, ..State::default() }) }
    }

    /// Make `contents` available under `path`
    pub fn add_file(&self, path: &str, contents: &[u8]) {
        self.state.borrow_mut().catalog.insert(path.as_bytes().to_vec(), contents.to_vec());
    }

    /// Every `(fd, requested length)` forwarded so far
    #[must_use]
    pub fn requests(&self) -> Vec<(c_int, usize)> {
        self.state.borrow().requests.clone()
    }

    /// Move the file position of `fd`
    pub fn seek(&self, fd: c_int, position: usize) {
        if let Some(file) = self.state.borrow_mut().open.get_mut(&fd) {
            file.cursor = position;
        }
    }

    fn open_path(&self, path: *const c_char) -> c_int {
        // SAFETY: callers of FileOps::open guarantee a valid C string
        let name = unsafe { CStr::from_ptr(path) }.to_bytes();
        let mut state = self.state.borrow_mut();
        let Some(contents) = state.catalog.get(name).cloned() else {
            set_errno(libc::ENOENT);
            return -1;
        };
        let fd = state.next_fd;
        state.next_fd += 1;
        state.open.insert(fd, FakeFile { contents, cursor: 0 });
        fd
    }

    fn copy_out(&self, fd: c_int, buf: *mut c_void, count: usize, at: Option<usize>) -> isize {
        let mut state = self.state.borrow_mut();
        state.requests.push((fd, count));
        let Some(file) = state.open.get_mut(&fd) else {
            set_errno(libc::EBADF);
            return -1;
        };
        let start = at.unwrap_or(file.cursor).min(file.contents.len());
        let n = count.min(file.contents.len() - start);
        // SAFETY: callers guarantee `buf` is writable for `count` >= `n` bytes
        unsafe {
            std::ptr::copy_nonoverlapping(file.contents[start..].as_ptr(), buf.cast::<u8>(), n);
        }
        if at.is_none() {
            file.cursor = start + n;
        }
        isize::try_from(n).unwrap_or(isize::MAX)
    }
}

fn set_errno(code: c_int) {
    // SAFETY: __errno_location always returns the calling thread's errno slot
    unsafe { *libc::__errno_location() = code };
}

impl FileOps for ScriptedFiles {
    unsafe fn open(&self, path: *const c_char, _flags: c_int, _mode: libc::mode_t) -> c_int {
        self.open_path(path)
    }

    unsafe fn open64(&self, path: *const c_char, _flags: c_int, _mode: libc::mode_t) -> c_int {
        self.open_path(path)
    }

    unsafe fn read(&self, fd: c_int, buf: *mut c_void, count: usize) -> isize {
        self.copy_out(fd, buf, count, None)
    }

    unsafe fn pread64(&self, fd: c_int, buf: *mut c_void, count: usize, offset: i64) -> isize {
        let Ok(offset) = usize::try_from(offset) else {
            set_errno(libc::EINVAL);
            return -1;
        };
        self.copy_out(fd, buf, count, Some(offset))
    }

    fn tell(&self, fd: c_int) -> Option<u64> {
        let state = self.state.borrow();
        state.open.get(&fd).map(|file| file.cursor as u64)
    }
}
