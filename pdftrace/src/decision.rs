//! Trace decision protocol
//!
//! Decides, for each classified read, whether to show something and whether
//! to wait for the operator. Either a host-registered callback makes the
//! call, or the built-in interactive policy does; never both.

use std::ffi::c_int;

use pdftrace_common::TracerFn;

use crate::controller::KeyPolicy;
use crate::read_event::ReadEvent;

/// Level returned by a decision callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TraceLevel {
    /// Do nothing
    Skip,
    /// Show the previous read
    Report,
    /// Show the previous read and wait for a key
    Pause,
}

impl TraceLevel {
    /// Interpret a raw C return value
    #[must_use]
    pub fn from_raw(raw: c_int) -> Self {
        match raw {
            ..=0 => TraceLevel::Skip,
            1 => TraceLevel::Report,
            _ => TraceLevel::Pause,
        }
    }
}

/// Externally supplied decision function
pub type Decider = Box<dyn FnMut() -> TraceLevel + Send>;

/// Wrap a C callback registered through `register_tracer`
#[must_use]
pub fn decider_from_fn(tracer: TracerFn) -> Decider {
    Box::new(move || TraceLevel::from_raw(tracer()))
}

/// Which read to show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    /// The read that just completed, with its start flags
    Current,
    /// The read before it, without start flags
    Previous,
}

/// What the tracer should do for one read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Action {
    pub render: Option<RenderTarget>,
    pub pause: bool,
}

impl Action {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.render.is_none() && !self.pause
    }
}

/// Map an external callback's level to an action
#[must_use]
pub fn external_action(level: TraceLevel) -> Action {
    match level {
        TraceLevel::Skip => Action::default(),
        TraceLevel::Report => Action { render: Some(RenderTarget::Previous), pause: false },
        TraceLevel::Pause => Action { render: Some(RenderTarget::Previous), pause: true },
    }
}

/// Built-in interactive policy.
///
/// Stops when the inferred record changed since the previous read, when the
/// read starts the index region, or on every read if the sticky policy says so.
#[must_use]
pub fn interactive_action(
    current: &ReadEvent,
    previous: Option<&ReadEvent>,
    policy: KeyPolicy,
) -> Action {
    let previous_record = previous.and_then(|event| event.record);
    let stop = current.record != previous_record
        || current.starts_index_region
        || policy.stop_on_every_read;
    if stop {
        Action { render: Some(RenderTarget::Current), pause: true }
    } else {
        Action::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ByteOffset, RecordNumber};

    fn event(record: Option<u32>) -> ReadEvent {
        ReadEvent {
            offset: ByteOffset(100),
            length: 10,
            record: record.map(RecordNumber),
            starts_record: false,
            starts_index_region: false,
        }
    }

    const ON_CHANGE: KeyPolicy = KeyPolicy { stop_on_every_read: false };
    const EVERY_READ: KeyPolicy = KeyPolicy { stop_on_every_read: true };

    #[test]
    fn test_level_from_raw() {
        assert_eq!(TraceLevel::from_raw(-3), TraceLevel::Skip);
        assert_eq!(TraceLevel::from_raw(0), TraceLevel::Skip);
        assert_eq!(TraceLevel::from_raw(1), TraceLevel::Report);
        assert_eq!(TraceLevel::from_raw(2), TraceLevel::Pause);
        assert_eq!(TraceLevel::from_raw(40), TraceLevel::Pause);
    }

    #[test]
    fn test_external_levels() {
        assert!(external_action(TraceLevel::Skip).is_noop());
        assert_eq!(
            external_action(TraceLevel::Report),
            Action { render: Some(RenderTarget::Previous), pause: false }
        );
        assert_eq!(
            external_action(TraceLevel::Pause),
            Action { render: Some(RenderTarget::Previous), pause: true }
        );
    }

    #[test]
    fn test_interactive_stops_on_record_change() {
        let action = interactive_action(&event(Some(2)), Some(&event(Some(1))), ON_CHANGE);
        assert_eq!(action, Action { render: Some(RenderTarget::Current), pause: true });
    }

    #[test]
    fn test_interactive_same_record_continues() {
        let action = interactive_action(&event(Some(1)), Some(&event(Some(1))), ON_CHANGE);
        assert!(action.is_noop());
    }

    #[test]
    fn test_interactive_first_unattributed_read_is_no_change() {
        assert!(interactive_action(&event(None), None, ON_CHANGE).is_noop());
        assert!(!interactive_action(&event(Some(0)), None, ON_CHANGE).is_noop());
    }

    #[test]
    fn test_interactive_index_start_always_stops() {
        let mut xref = event(Some(1));
        xref.starts_index_region = true;
        assert!(interactive_action(&xref, Some(&event(Some(1))), ON_CHANGE).pause);
    }

    #[test]
    fn test_interactive_every_read() {
        let action = interactive_action(&event(Some(1)), Some(&event(Some(1))), EVERY_READ);
        assert!(action.pause);
    }

    #[test]
    fn test_decider_from_fn() {
        extern "C" fn always_pause() -> c_int {
            7
        }
        let mut decider = decider_from_fn(always_pause);
        assert_eq!(decider(), TraceLevel::Pause);
    }
}
