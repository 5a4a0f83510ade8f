//! # pdftrace-run - Launcher
//!
//! Runs a command with the pdftrace preload library injected:
//!
//! ```text
//! pdftrace-run [OPTIONS] -- COMMAND [ARGS...]
//!   │
//!   ├─▶ lookup     find libpdftrace_preload.so and COMMAND on PATH
//!   ├─▶ preflight  ELF checks: probe exported, command dynamically linked
//!   ├─▶ launch     LD_PRELOAD + GRANULARITY / PDFTRACE_* variables
//!   └─▶ exec       replaces this process; the tracer owns the terminal
//! ```
//!
//! Exit codes: 0 success, 1 error, 2 usage, 127 command not found. Once the
//! command is running, its own exit status is the only one reported.

pub mod cli;
pub mod launch;
pub mod lookup;
pub mod preflight;
