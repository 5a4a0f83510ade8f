//! # pdftrace-preload - Interposition Shared Object
//!
//! Built as a `cdylib` and loaded with `LD_PRELOAD`. Exports replacements
//! for `open`, `open64`, `fopen`, `fopen64`, `read` and `pread64`, plus the
//! registration protocol a host can bind to at runtime:
//!
//! | Export | Effect |
//! |--------|--------|
//! | `pdftrace` | Probe; does nothing, only its presence matters |
//! | `register_tracer(f)` | Install (or with NULL, remove) the decision callback |
//! | `traced_final()` | Run the decision protocol once more for the last read |
//! | `usenoterminal()` | Append-only output, no cursor control |
//!
//! The engine state lives in one process-wide [`SharedTracer`]. It is
//! locked only while a call is observed, never across the forwarded call,
//! so a host thread sitting in a blocking `read` does not stall tracing on
//! the others. Reads of untraced descriptors do not touch the lock at all.
//!
//! Reports go through [`StdioOrdered`], which flushes C stdio first, so a
//! line rendered for a read lands after whatever the host printed before it.

#![allow(unsafe_code)] // the whole crate is the C boundary

use std::ffi::{c_char, c_int, c_void};
use std::io::Stdout;
use std::sync::Mutex;

use log::{debug, warn};
use pdftrace::config::{apply_env_defaults, TraceConfig};
use pdftrace::controller::{StdinKeys, StdioOrdered, TerminalMode};
use pdftrace::interpose::{
    intercept_fopen, intercept_open, intercept_read, NextOps, OpenKind, ReadAt, SharedTracer,
    TracerSlot,
};
use pdftrace::Tracer;
use pdftrace_common::TracerFn;

static TRACER: SharedTracer<StdinKeys<NextOps>, StdioOrdered<Stdout>> = SharedTracer::new();
static TERMINAL: Mutex<Option<TerminalMode>> = Mutex::new(None);

// ============================================================================
// Lifecycle
// ============================================================================

#[used]
#[link_section = ".init_array"]
static INIT: extern "C" fn() = init;

#[used]
#[link_section = ".fini_array"]
static FINI: extern "C" fn() = fini;

extern "C" fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .try_init();

    apply_env_defaults();
    let config = TraceConfig::from_env();
    debug!("Loaded with {config:?}");

    match TerminalMode::enter_raw(libc::STDIN_FILENO) {
        Ok(mode) => {
            if let Ok(mut slot) = TERMINAL.lock() {
                *slot = Some(mode);
            }
        }
        Err(e) => debug!("Keystrokes stay line buffered: {e}"),
    }

    let output = StdioOrdered::new(std::io::stdout());
    let mut tracer = Tracer::new(&config, StdinKeys::new(NextOps), output);
    tracer.prepare_screen();
    tracer.reset();
    TRACER.install(tracer);
}

extern "C" fn fini() {
    let Ok(slot) = TERMINAL.lock() else {
        return;
    };
    if let Some(mode) = slot.as_ref() {
        if let Err(e) = mode.restore() {
            warn!("Terminal left in raw mode: {e}");
        }
    }
}

// ============================================================================
// Registration protocol
// ============================================================================

/// Presence probe for hosts
#[no_mangle]
pub extern "C" fn pdftrace() {}

#[no_mangle]
pub extern "C" fn usenoterminal() {
    TRACER.with_tracer(Tracer::disable_terminal);
}

#[no_mangle]
pub extern "C" fn register_tracer(tracer: Option<TracerFn>) {
    let changed = TRACER.with_tracer(|engine| match tracer {
        Some(tracer) => engine.register_tracer(tracer),
        None => engine.clear_decider(),
    });
    if changed.is_none() {
        warn!("Tracer not loaded, decision callback not changed");
    }
}

#[no_mangle]
pub extern "C" fn traced_final() {
    TRACER.with_tracer(Tracer::finish);
}

// ============================================================================
// Interposed C library functions
// ============================================================================

// `open` is variadic in C. The mode argument is declared fixed: on the
// supported ABIs it arrives in the same register either way, and it is only
// read by the original when O_CREAT or O_TMPFILE is set.

/// # Safety
/// Same contract as `open(2)`.
#[no_mangle]
pub unsafe extern "C" fn open(path: *const c_char, flags: c_int, mode: libc::mode_t) -> c_int {
    unsafe { intercept_open(&NextOps, &TRACER, OpenKind::Open, path, flags, mode) }
}

/// # Safety
/// Same contract as `open64(2)`.
#[no_mangle]
pub unsafe extern "C" fn open64(path: *const c_char, flags: c_int, mode: libc::mode_t) -> c_int {
    unsafe { intercept_open(&NextOps, &TRACER, OpenKind::Open64, path, flags, mode) }
}

/// # Safety
/// Same contract as `fopen(3)`.
#[no_mangle]
pub unsafe extern "C" fn fopen(path: *const c_char, mode: *const c_char) -> *mut libc::FILE {
    unsafe { intercept_fopen(&NextOps, &TRACER, OpenKind::Open, path, mode) }
}

/// # Safety
/// Same contract as `fopen64(3)`.
#[no_mangle]
pub unsafe extern "C" fn fopen64(path: *const c_char, mode: *const c_char) -> *mut libc::FILE {
    unsafe { intercept_fopen(&NextOps, &TRACER, OpenKind::Open64, path, mode) }
}

/// # Safety
/// Same contract as `read(2)`.
#[no_mangle]
pub unsafe extern "C" fn read(fd: c_int, buf: *mut c_void, count: usize) -> isize {
    unsafe { intercept_read(&NextOps, &TRACER, fd, buf, count, ReadAt::Current) }
}

/// # Safety
/// Same contract as `pread64(2)`.
#[no_mangle]
pub unsafe extern "C" fn pread64(fd: c_int, buf: *mut c_void, count: usize, offset: i64) -> isize {
    unsafe { intercept_read(&NextOps, &TRACER, fd, buf, count, ReadAt::Offset(offset)) }
}
