//! # pdftrace - Which Object Is Being Read?
//!
//! pdftrace watches, in real time, which byte ranges of a PDF file a
//! document library reads, and infers which object each read belongs to,
//! without modifying the program doing the reading. It is loaded into the
//! host with `LD_PRELOAD` (see the `pdftrace-preload` crate) and stands in
//! for a handful of C library file operations.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Host Program                             │
//! │               (e.g. a poppler-based renderer)                   │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ open / fopen / read / pread64
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 Interposition (pdftrace-preload)                │
//! │   forward to original ──▶ observe result ──▶ return unchanged   │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Tracer (This Crate)                          │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │  Descriptor  │──▶│  Inference   │──▶│   Decision   │         │
//! │  │   Selector   │   │   Engine     │   │   Protocol   │         │
//! │  └──────────────┘   └──────────────┘   └──────┬───────┘         │
//! │                                               │                 │
//! │                       host callback ◀─────────┤                 │
//! │                                               ▼                 │
//! │                                      ┌──────────────┐           │
//! │                                      │  Controller  │           │
//! │                                      │ (render/keys)│           │
//! │                                      └──────────────┘           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`interpose`]: the interceptable operations, their forwarding to the
//!   real C library, a scriptable fake, and the replacement bodies
//! - [`selector`]: picks the first opened file with the traced suffix
//! - [`offsets`] and [`inference`]: record start table and read attribution
//! - [`classification`]: the pure heuristics behind attribution and display
//! - [`decision`]: external callback levels vs. the built-in pause policy
//! - [`controller`]: status rendering, keystroke decoding, raw terminal mode
//! - [`tracer`]: the state object tying it all together
//! - [`config`]: environment configuration read at load time
//! - [`host`]: binding for host programs that drive the trace themselves
//!
//! ## How Attribution Works
//!
//! A library that keeps an index of object offsets reads each object from
//! its beginning the first time it needs it. So a read whose data begins
//! with `n 0 obj` marks where object `n` starts, and a later read past that
//! point with no other known start in between is another access to the same
//! object. This is a heuristic: a stream that happens to contain `n 0 obj`
//! exactly at a read boundary is mistaken for an object start.
//!
//! ## Typical Usage
//!
//! ```bash
//! # Step through every read of a viewer, one keystroke at a time
//! pdftrace-run -- hovacui file.pdf
//!
//! # Let a host decide when to stop (see demos/chunked_reader.rs)
//! LD_PRELOAD=./libpdftrace_preload.so GRANULARITY=256 my-renderer file.pdf
//! ```

pub mod classification;
pub mod config;
pub mod controller;
pub mod decision;
pub mod domain;
pub mod host;
pub mod inference;
pub mod interpose;
pub mod offsets;
pub mod read_event;
pub mod selector;
pub mod tracer;

pub use read_event::ReadEvent;
pub use tracer::Tracer;
