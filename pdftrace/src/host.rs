//! Host-side binding to a preloaded tracer.
//!
//! A host program that wants to drive the trace itself (instead of leaving
//! it to the operator) looks up the library's exports at runtime. If the
//! probe symbol is missing the library was not preloaded and the host just
//! runs untraced.

#![allow(unsafe_code)] // dlsym and calls through resolved pointers

use std::ffi::{c_int, c_void};

use log::debug;
use pdftrace_common::{
    TracerFn, PROBE_SYMBOL, REGISTER_TRACER_SYMBOL, TRACED_FINAL_SYMBOL, USE_NO_TERMINAL_SYMBOL,
};

pub use pdftrace_common::{TRACE_PAUSE, TRACE_REPORT, TRACE_SKIP};

type RegisterFn = unsafe extern "C" fn(Option<TracerFn>);
type VoidFn = unsafe extern "C" fn();

/// Resolved registration protocol of a preloaded tracer
#[derive(Clone, Copy)]
pub struct TraceHost {
    register: RegisterFn,
    finish: VoidFn,
    no_terminal: VoidFn,
}

impl TraceHost {
    /// Find the preloaded library's exports in the running process.
    ///
    /// Returns `None` when the library is not loaded.
    #[must_use]
    pub fn attach() -> Option<Self> {
        if lookup(PROBE_SYMBOL).is_none() {
            debug!("Tracing probe not found, running untraced");
            return None;
        }
        // SAFETY: the exports have exactly these signatures
        unsafe {
            Some(Self {
                register: std::mem::transmute::<*mut c_void, RegisterFn>(lookup(
                    REGISTER_TRACER_SYMBOL,
                )?),
                finish: std::mem::transmute::<*mut c_void, VoidFn>(lookup(TRACED_FINAL_SYMBOL)?),
                no_terminal: std::mem::transmute::<*mut c_void, VoidFn>(lookup(
                    USE_NO_TERMINAL_SYMBOL,
                )?),
            })
        }
    }

    /// Install `tracer` as the decision callback, replacing any earlier one
    pub fn register_tracer(&self, tracer: TracerFn) {
        // SAFETY: resolved from the preloaded library in `attach`
        unsafe { (self.register)(Some(tracer)) }
    }

    /// Drop the decision callback; the operator drives the trace again
    pub fn unregister_tracer(&self) {
        // SAFETY: as above, NULL is accepted
        unsafe { (self.register)(None) }
    }

    /// Flush the decision protocol against the last read
    pub fn traced_final(&self) {
        // SAFETY: as above
        unsafe { (self.finish)() }
    }

    /// Ask for append-only output without cursor control
    pub fn use_no_terminal(&self) {
        // SAFETY: as above
        unsafe { (self.no_terminal)() }
    }
}

/// Level constant for a callback that only wants the read reported when `changed`
#[must_use]
pub fn report_if(changed: bool) -> c_int {
    if changed {
        TRACE_REPORT
    } else {
        TRACE_SKIP
    }
}

fn lookup(symbol: &[u8]) -> Option<*mut c_void> {
    // SAFETY: every symbol constant is NUL-terminated
    let address = unsafe { libc::dlsym(libc::RTLD_DEFAULT, symbol.as_ptr().cast()) };
    (!address.is_null()).then_some(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_without_preload() {
        // The test binary does not export the probe
        assert!(TraceHost::attach().is_none());
    }

    #[test]
    fn test_report_if() {
        assert_eq!(report_if(true), TRACE_REPORT);
        assert_eq!(report_if(false), TRACE_SKIP);
    }
}
