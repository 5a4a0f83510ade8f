//! Access to the engine from interposed entry points.
//!
//! The engine is borrowed only while a call is being observed, never across
//! the forwarded original call, so a host thread blocked in `read` on some
//! pipe does not hide the engine from the others. Reentry on the same
//! thread (a decision callback or the logger calling back into `read` or
//! `open`) is refused and that call is simply forwarded.

use std::cell::{Cell, RefCell};
use std::io::Write;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::controller::KeySource;
use crate::domain::Fd;
use crate::tracer::Tracer;

/// No descriptor selected yet
const UNSELECTED: i32 = -1;

thread_local! {
    static IN_ENGINE: Cell<bool> = const { Cell::new(false) };
}

/// Somewhere the interposition bodies can borrow a tracer from
pub trait TracerSlot {
    type Keys: KeySource;
    type Out: Write;

    /// Traced descriptor, readable without borrowing the tracer
    fn traced(&self) -> Option<Fd>;

    /// Run `f` with the tracer.
    ///
    /// Returns `None` without calling `f` when there is no tracer or the
    /// current thread is already inside it.
    fn with_tracer<R>(&self, f: impl FnOnce(&mut Tracer<Self::Keys, Self::Out>) -> R) -> Option<R>;
}

/// Marks the current thread as inside the engine until dropped
struct EngineEntry;

impl EngineEntry {
    fn enter() -> Option<Self> {
        IN_ENGINE
            .try_with(|flag| {
                if flag.get() {
                    None
                } else {
                    flag.set(true);
                    Some(EngineEntry)
                }
            })
            .ok()
            .flatten()
    }
}

impl Drop for EngineEntry {
    fn drop(&mut self) {
        let _ = IN_ENGINE.try_with(|flag| flag.set(false));
    }
}

/// Process-wide tracer shared by every thread of the host.
///
/// Threads observing at the same time are serialised; a pause therefore
/// holds up other threads only when they touch the traced file or open
/// something before it is selected.
pub struct SharedTracer<K: KeySource, W: Write> {
    tracer: Mutex<Option<Tracer<K, W>>>,
    traced: AtomicI32,
}

impl<K: KeySource, W: Write> SharedTracer<K, W> {
    #[must_use]
    pub const fn new() -> Self {
        Self { tracer: Mutex::new(None), traced: AtomicI32::new(UNSELECTED) }
    }

    /// Put `tracer` in place, replacing any earlier one
    pub fn install(&self, tracer: Tracer<K, W>) {
        let traced = tracer.traced();
        *self.tracer.lock().unwrap_or_else(PoisonError::into_inner) = Some(tracer);
        self.publish(traced);
    }

    fn publish(&self, traced: Option<Fd>) {
        self.traced.store(traced.map_or(UNSELECTED, |fd| fd.0), Ordering::Release);
    }
}

impl<K: KeySource, W: Write> Default for SharedTracer<K, W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: KeySource, W: Write> TracerSlot for SharedTracer<K, W> {
    type Keys = K;
    type Out = W;

    fn traced(&self) -> Option<Fd> {
        let fd = Fd(self.traced.load(Ordering::Acquire));
        fd.is_valid().then_some(fd)
    }

    fn with_tracer<R>(&self, f: impl FnOnce(&mut Tracer<K, W>) -> R) -> Option<R> {
        let _entry = EngineEntry::enter()?;
        let mut guard = self.tracer.lock().unwrap_or_else(PoisonError::into_inner);
        let tracer = guard.as_mut()?;
        let result = f(tracer);
        self.publish(tracer.traced());
        Some(result)
    }
}

/// Single-threaded slot, for embedding and tests
impl<K: KeySource, W: Write> TracerSlot for RefCell<Option<Tracer<K, W>>> {
    type Keys = K;
    type Out = W;

    fn traced(&self) -> Option<Fd> {
        self.try_borrow().ok()?.as_ref()?.traced()
    }

    fn with_tracer<R>(&self, f: impl FnOnce(&mut Tracer<K, W>) -> R) -> Option<R> {
        let mut slot = self.try_borrow_mut().ok()?;
        slot.as_mut().map(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TraceConfig;
    use crate::controller::ScriptedKeys;
    use std::sync::Arc;

    type TestShared = SharedTracer<ScriptedKeys, Vec<u8>>;

    fn tracer() -> Tracer<ScriptedKeys, Vec<u8>> {
        let config = TraceConfig { use_terminal: false, ..TraceConfig::default() };
        Tracer::new(&config, ScriptedKeys::default(), Vec::new())
    }

    #[test]
    fn test_empty_slot_refuses() {
        let shared = TestShared::new();
        assert_eq!(shared.with_tracer(|_| ()), None);
        assert_eq!(shared.traced(), None);
    }

    #[test]
    fn test_selection_is_published() {
        let shared = TestShared::new();
        shared.install(tracer());
        let selected = shared.with_tracer(|t| t.on_open(b"doc.pdf", Fd(7)));
        assert_eq!(selected, Some(true));
        assert_eq!(shared.traced(), Some(Fd(7)));
    }

    #[test]
    fn test_reentry_on_same_thread_is_refused() {
        let shared = TestShared::new();
        shared.install(tracer());
        let nested = shared.with_tracer(|_| shared.with_tracer(|_| ()));
        assert_eq!(nested, Some(None));
        // The flag is cleared on the way out
        assert_eq!(shared.with_tracer(|_| ()), Some(()));
    }

    #[test]
    fn test_other_thread_is_not_locked_out_between_calls() {
        let shared = Arc::new(TestShared::new());
        shared.install(tracer());
        let worker = Arc::clone(&shared);
        let selected = std::thread::spawn(move || worker.with_tracer(|t| t.on_open(b"a.pdf", Fd(4))))
            .join()
            .unwrap();
        assert_eq!(selected, Some(true));
        assert_eq!(shared.traced(), Some(Fd(4)));
    }

    #[test]
    fn test_refcell_slot() {
        let slot = RefCell::new(Some(tracer()));
        assert_eq!(slot.with_tracer(|t| t.on_open(b"a.pdf", Fd(3))), Some(true));
        assert_eq!(slot.traced(), Some(Fd(3)));
        assert_eq!(slot.with_tracer(|_| slot.with_tracer(|_| ())), Some(None));

        let empty: RefCell<Option<Tracer<ScriptedKeys, Vec<u8>>>> = RefCell::new(None);
        assert_eq!(empty.with_tracer(|_| ()), None);
    }
}
