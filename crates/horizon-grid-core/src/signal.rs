//! Signal/slot system for Horizon Grid.
//!
//! Grid state changes (selection, sorting, column reordering and resizing)
//! are announced through [`Signal`]s. A signal owns a set of connected slots
//! (closures) and invokes every one of them when the signal is emitted.
//!
//! Grid mutations run synchronously inside one server-side turn, so slots are
//! always invoked directly on the emitting thread. Anything that has to reach
//! the client is queued separately through [`crate::DeferredQueue`].
//!
//! # Key Types
//!
//! - [`Signal<Args>`] - The main signal type for emitting notifications
//! - [`ConnectionId`] - Unique identifier returned when connecting a slot
//!
//! # Example
//!
//! ```
//! use horizon_grid_core::Signal;
//!
//! let sort_changed = Signal::<Vec<String>>::new();
//!
//! let conn_id = sort_changed.connect(|columns| {
//!     println!("Sorted by: {:?}", columns);
//! });
//!
//! sort_changed.emit(vec!["name".to_string()]);
//! sort_changed.disconnect(conn_id);
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::{new_key_type, SlotMap};

use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via [`Signal::disconnect`].
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// A type-safe signal that can have multiple connected slots.
///
/// # Type Parameter
///
/// - `Args`: The argument type passed to connected slots. Use `()` for signals
///   with no arguments, or an event struct for richer payloads.
///
/// # Reentrancy
///
/// Slots are collected before invocation and the connection table is not
/// locked while they run, so a slot may connect or disconnect other slots on
/// the same signal. Such changes take effect from the next emission.
pub struct Signal<Args> {
    /// All active connections.
    connections: Mutex<SlotMap<ConnectionId, Slot<Args>>>,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(SlotMap::with_key()),
        }
    }

    /// Connect a slot (closure) to this signal.
    ///
    /// Returns a `ConnectionId` that can be used to disconnect the slot later.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.connections.lock().insert(Arc::new(slot))
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed, `false` otherwise.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Emit the signal, invoking all connected slots with `args`.
    ///
    /// Returns the number of slots invoked.
    pub fn emit(&self, args: Args) -> usize {
        let slots: Vec<Slot<Args>> = self.connections.lock().values().cloned().collect();
        tracing::trace!(target: targets::SIGNAL, connection_count = slots.len(), "emitting signal");

        for slot in &slots {
            slot(&args);
        }
        slots.len()
    }
}

static_assertions::assert_impl_all!(Signal<()>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

    #[test]
    fn test_signal_connect_emit() {
        let signal = Signal::<i32>::new();
        let received = Arc::new(AtomicI32::new(0));
        let r = received.clone();

        signal.connect(move |v| {
            r.store(*v, Ordering::SeqCst);
        });

        assert_eq!(signal.emit(42), 1);
        assert_eq!(received.load(Ordering::SeqCst), 42);
    }

    #[test]
    fn test_signal_disconnect() {
        let signal = Signal::<()>::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();

        let id = signal.connect(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        signal.emit(());
        assert!(signal.disconnect(id));
        assert!(!signal.disconnect(id));
        signal.emit(());

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_slot_may_disconnect_during_emit() {
        let signal = Arc::new(Signal::<()>::new());
        let count = Arc::new(AtomicUsize::new(0));

        let c = count.clone();
        let counter = signal.connect(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        let s = signal.clone();
        signal.connect(move |_| {
            s.disconnect(counter);
        });

        assert_eq!(signal.emit(()), 2);
        assert_eq!(signal.emit(()), 1);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(signal.connection_count(), 1);
    }
}
