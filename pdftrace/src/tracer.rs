//! # Tracer - Engine State
//!
//! The one object every interception entry point talks to. It bundles the
//! descriptor selector, the inference engine, the previous-event slot, the
//! decision protocol and the interactive controller.
//!
//! ## Read Flow
//!
//! ```text
//! on_read(fd, offset, bytes)
//!   │ not the traced fd / empty ──▶ None
//!   ▼
//! InferenceEngine::classify_read ──▶ ReadEvent
//!   ▼
//! decider registered? ── yes ──▶ external level ──▶ show previous [+ pause]
//!   │ no
//!   ▼
//! KeyPolicy ──▶ show current + pause on record change / index start / always
//! ```
//!
//! Rendering failures are logged and otherwise ignored: the host must never
//! notice the tracer.

use std::io::Write;
use std::num::NonZeroUsize;

use log::warn;
use pdftrace_common::TracerFn;

use crate::classification::classify_for_display;
use crate::config::TraceConfig;
use crate::controller::{wait_for_key, KeyPolicy, KeySource, StatusRenderer};
use crate::decision::{
    decider_from_fn, external_action, interactive_action, Action, Decider, RenderTarget,
};
use crate::domain::{ByteOffset, Fd};
use crate::inference::InferenceEngine;
use crate::offsets::OffsetTable;
use crate::read_event::ReadEvent;
use crate::selector::DescriptorSelector;

/// Process-wide tracing state
pub struct Tracer<K: KeySource, W: Write> {
    selector: DescriptorSelector,
    engine: InferenceEngine,
    previous: Option<ReadEvent>,
    decider: Option<Decider>,
    policy: KeyPolicy,
    granularity: Option<NonZeroUsize>,
    renderer: StatusRenderer<W>,
    keys: K,
}

impl<K: KeySource, W: Write> Tracer<K, W> {
    /// Create a tracer with an empty offset table
    pub fn new(config: &TraceConfig, keys: K, out: W) -> Self {
        Self {
            selector: DescriptorSelector::new(&config.suffix),
            engine: InferenceEngine::new(OffsetTable::new()),
            previous: None,
            decider: None,
            policy: KeyPolicy::default(),
            granularity: config.granularity,
            renderer: StatusRenderer::new(out, config.use_terminal),
            keys,
        }
    }

    // ------------------------------------------------------------------------
    // Registration protocol
    // ------------------------------------------------------------------------

    /// Install the external decision function, replacing any previous one
    pub fn register_decider(&mut self, decider: Decider) {
        self.decider = Some(decider);
    }

    /// Install a C decision callback
    pub fn register_tracer(&mut self, tracer: TracerFn) {
        self.register_decider(decider_from_fn(tracer));
    }

    /// Drop the external decision function, back to the interactive policy
    pub fn clear_decider(&mut self) {
        self.decider = None;
    }

    #[must_use]
    pub fn has_decider(&self) -> bool {
        self.decider.is_some()
    }

    /// Switch the renderer to append-only output
    pub fn disable_terminal(&mut self) {
        self.renderer.disable_terminal();
    }

    /// Clear the screen ahead of the first render
    pub fn prepare_screen(&mut self) {
        if let Err(e) = self.renderer.prepare_screen() {
            warn!("Failed to prepare status display: {e}");
        }
    }

    /// Forget all inferred offsets and the previous event
    pub fn reset(&mut self) {
        self.engine.reset();
        self.previous = None;
    }

    // ------------------------------------------------------------------------
    // Interception entry points
    // ------------------------------------------------------------------------

    /// Observe an open; returns true if it selected the traced descriptor
    pub fn on_open(&mut self, filename: &[u8], fd: Fd) -> bool {
        self.selector.classify_open(filename, fd)
    }

    #[must_use]
    pub fn is_traced(&self, fd: Fd) -> bool {
        self.selector.is_traced(fd)
    }

    /// Length to actually request from the original read of the traced file
    #[must_use]
    pub fn request_len(&self, requested: usize) -> usize {
        match self.granularity {
            Some(granularity) if granularity.get() < requested => granularity.get(),
            _ => requested,
        }
    }

    /// Observe a completed read of `buf` (the bytes returned) at `offset`.
    ///
    /// Runs the decision protocol, which may render and block for a key.
    /// Returns the classified event, or `None` when the read was filtered out.
    pub fn on_read(&mut self, fd: Fd, offset: ByteOffset, buf: &[u8]) -> Option<ReadEvent> {
        if !self.is_traced(fd) {
            return None;
        }
        let event = self.engine.classify_read(offset, buf)?;

        let action = match self.decider.as_mut() {
            Some(decider) => external_action(decider()),
            None => interactive_action(&event, self.previous.as_ref(), self.policy),
        };
        self.perform(action, Some(event));

        self.previous = Some(event);
        Some(event)
    }

    /// Run the external decision once more against the last read.
    ///
    /// No-op without a registered decider or before any traced read.
    pub fn finish(&mut self) {
        if self.previous.is_none() {
            return;
        }
        let Some(decider) = self.decider.as_mut() else {
            return;
        };
        let action = external_action(decider());
        self.perform(action, None);
    }

    fn perform(&mut self, action: Action, current: Option<ReadEvent>) {
        let shown = match action.render {
            Some(RenderTarget::Current) => current,
            Some(RenderTarget::Previous) => self.previous.map(ReadEvent::without_start_flags),
            None => None,
        };
        if let Some(event) = shown {
            let class = classify_for_display(&event, self.engine.table().index_region());
            if let Err(e) = self.renderer.render(&event, class) {
                warn!("Failed to render read report: {e}");
            }
        }
        if action.pause {
            wait_for_key(&mut self.keys, &mut self.policy);
        }
    }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    #[must_use]
    pub fn traced(&self) -> Option<Fd> {
        self.selector.traced()
    }

    #[must_use]
    pub fn table(&self) -> &OffsetTable {
        self.engine.table()
    }

    #[must_use]
    pub fn previous(&self) -> Option<&ReadEvent> {
        self.previous.as_ref()
    }

    #[must_use]
    pub fn policy(&self) -> KeyPolicy {
        self.policy
    }

    #[must_use]
    pub fn keys(&self) -> &K {
        &self.keys
    }

    #[must_use]
    pub fn output(&self) -> &W {
        self.renderer.output()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ScriptedKeys;
    use crate::domain::RecordNumber;

    fn tracer(keys: &[u8]) -> Tracer<ScriptedKeys, Vec<u8>> {
        let config = TraceConfig { use_terminal: false, ..TraceConfig::default() };
        let mut tracer = Tracer::new(&config, ScriptedKeys::new(keys), Vec::new());
        tracer.on_open(b"report.pdf", Fd(3));
        tracer
    }

    #[test]
    fn test_untraced_descriptor_is_filtered() {
        let mut tracer = tracer(b"");
        assert_eq!(tracer.on_read(Fd(4), ByteOffset(0), b"1 0 obj\n"), None);
        assert!(tracer.output().is_empty());
        assert_eq!(tracer.table().start_of(RecordNumber(1)), None);
    }

    #[test]
    fn test_request_len() {
        let config = TraceConfig { granularity: NonZeroUsize::new(16), ..TraceConfig::default() };
        let tracer = Tracer::new(&config, ScriptedKeys::default(), Vec::new());
        assert_eq!(tracer.request_len(4096), 16);
        assert_eq!(tracer.request_len(16), 16);
        assert_eq!(tracer.request_len(8), 8);
    }

    #[test]
    fn test_interactive_pause_consumes_one_key_per_stop() {
        let mut tracer = tracer(b"ab");
        tracer.on_read(Fd(3), ByteOffset(0), b"1 0 obj\n");
        tracer.on_read(Fd(3), ByteOffset(9), b"<< >>");
        // Default policy stops on every read
        assert_eq!(tracer.keys().remaining(), 0);
    }

    #[test]
    fn test_reset_forgets_offsets() {
        let mut tracer = tracer(b"");
        tracer.on_read(Fd(3), ByteOffset(0), b"1 0 obj\n");
        tracer.reset();
        assert_eq!(tracer.table().start_of(RecordNumber(1)), None);
        assert!(tracer.previous().is_none());
        // The traced descriptor survives a reset
        assert_eq!(tracer.traced(), Some(Fd(3)));
    }
}
