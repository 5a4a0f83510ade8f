//! # Shared ABI (Preload Library ↔ Host Program)
//!
//! Defines the names, levels and defaults shared between the preloaded
//! tracing library and any host program that wants to cooperate with it.
//! Everything here is plain data so both sides agree on the contract without
//! linking against each other: the host resolves the exported symbols at
//! runtime with `dlsym(RTLD_DEFAULT, ...)`.
//!
//! ## Key Items
//!
//! - [`TracerFn`] - Signature of a host-supplied decision callback
//! - [`TRACE_SKIP`], [`TRACE_REPORT`], [`TRACE_PAUSE`] - Callback return levels
//! - `*_SYMBOL` - NUL-terminated names of the exported entry points
//! - `ENV_*` - Environment variables read once at process start

#![no_std]

use core::ffi::c_int;

// ============================================================================
// Decision Callback
// ============================================================================

/// Host-supplied decision callback, invoked synchronously on every traced read.
///
/// The return value is interpreted as a level:
/// - `<= 0` ([`TRACE_SKIP`]): do nothing
/// - `1` ([`TRACE_REPORT`]): print the previous read and continue
/// - `>= 2` ([`TRACE_PAUSE`]): print the previous read and wait for a key
pub type TracerFn = extern "C" fn() -> c_int;

/// Callback level: do not report, do not pause
pub const TRACE_SKIP: c_int = 0;

/// Callback level: report the previous read, keep running
pub const TRACE_REPORT: c_int = 1;

/// Callback level: report the previous read and block for one keystroke
pub const TRACE_PAUSE: c_int = 2;

// ============================================================================
// Exported Symbols
// ============================================================================

/// No-op probe; its presence means the preload library is loaded
pub const PROBE_SYMBOL: &[u8] = b"pdftrace\0";

/// `void register_tracer(int (*)(void))`
pub const REGISTER_TRACER_SYMBOL: &[u8] = b"register_tracer\0";

/// `void traced_final(void)` - flush the decision protocol after the last read
pub const TRACED_FINAL_SYMBOL: &[u8] = b"traced_final\0";

/// `void usenoterminal(void)` - switch the renderer to append-only output
pub const USE_NO_TERMINAL_SYMBOL: &[u8] = b"usenoterminal\0";

/// File name of the preload library produced by the `pdftrace-preload` crate
pub const PRELOAD_LIBRARY_NAME: &str = "libpdftrace_preload.so";

// ============================================================================
// Configuration
// ============================================================================

/// Host compatibility toggle, defaulted only when the host left it unset
pub const ENV_DOUBLEBUFFERING: &str = "DOUBLEBUFFERING";

/// Value written to [`ENV_DOUBLEBUFFERING`] when absent
pub const DOUBLEBUFFERING_DEFAULT: &str = "no";

/// Maximum number of bytes forwarded per read of the traced file
pub const ENV_GRANULARITY: &str = "GRANULARITY";

/// Filename suffix selecting the traced file
pub const ENV_SUFFIX: &str = "PDFTRACE_SUFFIX";

/// Disables cursor-homing escape sequences, like calling `usenoterminal()`
pub const ENV_NO_TERMINAL: &str = "PDFTRACE_NOTERMINAL";

/// Suffix traced when [`ENV_SUFFIX`] is not set
pub const DEFAULT_SUFFIX: &str = ".pdf";

/// Capacity of the record offset table
///
/// Record numbers at or beyond this bound are still reported by number but
/// never gain a known starting offset.
pub const MAX_RECORDS: usize = 4096;
