/// Signal/slot wiring
///
/// Observer registration for scene and bridge notifications. Connecting a
/// handler returns a `Slot`; dropping the slot disconnects the handler, so
/// teardown rides on scope instead of manual bookkeeping.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct SignalCore<T> {
    handlers: RwLock<Vec<(u64, Handler<T>)>>,
    next_id: AtomicU64,
}

/// A typed notification source.
pub struct Signal<T> {
    core: Arc<SignalCore<T>>,
}

impl<T: 'static> Signal<T> {
    pub fn new() -> Self {
        Self {
            core: Arc::new(SignalCore {
                handlers: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Connect a handler. It stays registered for the lifetime of the
    /// returned slot and no longer.
    pub fn connect<F>(&self, handler: F) -> Slot
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.core.next_id.fetch_add(1, Ordering::SeqCst);
        self.core.handlers.write().push((id, Arc::new(handler)));

        let core = Arc::downgrade(&self.core);
        Slot {
            release: Some(Box::new(move || {
                if let Some(core) = core.upgrade() {
                    core.handlers.write().retain(|(handler_id, _)| *handler_id != id);
                }
            })),
        }
    }

    /// Invoke every connected handler. Handlers run after the handler-list
    /// lock is released, so they may connect or disconnect during emission.
    pub fn emit(&self, event: &T) {
        let handlers: Vec<Handler<T>> = self
            .core
            .handlers
            .read()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler(event);
        }
    }

    pub fn handler_count(&self) -> usize {
        self.core.handlers.read().len()
    }
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped subscription handle. Dropping it disconnects the handler.
pub struct Slot {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Drop for Slot {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slot").finish_non_exhaustive()
    }
}
