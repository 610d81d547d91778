//! Observable state containers.
//!
//! The studio has no reactive framework; shared state (query results,
//! schema, connections, recipes) lives in explicit [`Store`] values that
//! views subscribe to. A store holds exactly one current value at a time as
//! an `Arc<T>` snapshot: mutations are copy-on-write and replace the whole
//! snapshot, so `Arc::ptr_eq` on two snapshots tells a consumer whether
//! anything changed in between.
//!
//! Semantics are mutex-guarded and multi-threaded. The interpreter suspends
//! at bridge awaits on a multi-threaded runtime, so the store must be
//! `Send + Sync`; the lock is never held while listeners run, which keeps
//! subscribe/unsubscribe from inside a listener safe.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::warn;

/// Handle returned by [`Store::subscribe`], used to unsubscribe later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn() + Send + Sync>;

/// Shared-state container with synchronous subscriber notification.
///
/// Listeners receive no payload; they re-read [`Store::snapshot`] to observe
/// the new state.
pub struct Store<T> {
    inner: Mutex<Inner<T>>,
}

struct Inner<T> {
    value: Arc<T>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl<T: Default> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Store<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(Inner {
                value: Arc::new(value),
                listeners: Vec::new(),
                next_id: 0,
            }),
        }
    }

    // Listener panics are caught before they can poison the lock, so a
    // poisoned mutex only means a panic mid-Vec-update; the data is still
    // coherent and we keep going with it.
    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current snapshot. The same `Arc` is returned across calls until a
    /// mutation occurs; a value-changing mutation always yields a new one.
    pub fn snapshot(&self) -> Arc<T> {
        Arc::clone(&self.lock().value)
    }

    /// Replace the value and notify subscribers.
    pub fn set(&self, value: T) {
        {
            let mut inner = self.lock();
            inner.value = Arc::new(value);
        }
        self.notify();
    }

    /// Copy-on-write update: build a new value from the current one,
    /// replace the snapshot, notify.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        {
            let mut inner = self.lock();
            let next = f(&inner.value);
            inner.value = Arc::new(next);
        }
        self.notify();
    }

    /// Register a listener. It fires once per mutation from then on; a
    /// registration made during a notification pass only takes effect on
    /// the next mutation.
    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        let mut inner = self.lock();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.listeners.push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns false when the id is unknown (already
    /// unsubscribed). Safe to call from inside the listener itself.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.lock();
        let before = inner.listeners.len();
        inner.listeners.retain(|(other, _)| *other != id);
        inner.listeners.len() != before
    }

    /// Invoke every listener registered at call time.
    ///
    /// The listener list is snapshotted under the lock and the lock released
    /// before any listener runs, so a listener unsubscribing itself (or
    /// others) mid-pass cannot corrupt the iteration. A panicking listener
    /// is reported and skipped; the remaining listeners still run.
    fn notify(&self) {
        let listeners: Vec<Listener> = self
            .lock()
            .listeners
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener())).is_err() {
                warn!("store listener panicked; continuing with remaining listeners");
            }
        }
    }
}

impl<T: PartialEq> Store<T> {
    /// Like [`Store::set`], but a value equal to the current one is a no-op:
    /// the snapshot identity is preserved and nobody is notified.
    pub fn set_if_changed(&self, value: T) {
        {
            let mut inner = self.lock();
            if *inner.value == value {
                return;
            }
            inner.value = Arc::new(value);
        }
        self.notify();
    }
}
