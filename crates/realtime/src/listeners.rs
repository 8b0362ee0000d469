//! Listener registry and subscription handles.

use futures_util::Stream;
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::{error, trace, warn};

/// Identifier of a registered listener.
pub type ListenerId = u64;

type Callback = Arc<dyn Fn(&Value) + Send + Sync>;

/// Listeners grouped by event type.
#[derive(Default)]
pub struct ListenerRegistry {
    /// Listeners per event type, in registration order.
    listeners: RwLock<HashMap<String, Vec<(ListenerId, Callback)>>>,
    /// Next listener id.
    next_id: AtomicU64,
}

impl ListenerRegistry {
    /// Creates a new, empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for `event` and returns its id.
    pub fn add(&self, event: &str, callback: Callback) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event.to_string())
            .or_default()
            .push((id, callback));
        trace!(event = event, listener_id = id, "Listener added");
        id
    }

    /// Removes the listener `id` from `event`. Returns whether it was registered.
    pub fn remove(&self, event: &str, id: ListenerId) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(entries) = listeners.get_mut(event) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|(listener_id, _)| *listener_id != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            listeners.remove(event);
        }
        removed
    }

    /// Number of listeners registered for `event`.
    #[must_use]
    pub fn count(&self, event: &str) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event)
            .map_or(0, Vec::len)
    }

    /// Invokes every listener of `event` with `payload`.
    ///
    /// Each call is isolated: a panicking listener is logged and the remaining
    /// listeners still run. Returns the number of listeners invoked.
    pub fn emit(&self, event: &str, payload: &Value) -> usize {
        // Snapshot so listeners may (un)register without deadlocking.
        let snapshot: Vec<(ListenerId, Callback)> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event)
            .cloned()
            .unwrap_or_default();

        for (id, callback) in &snapshot {
            if catch_unwind(AssertUnwindSafe(|| callback(payload))).is_err() {
                error!(event = event, listener_id = id, "Event listener panicked");
            }
        }
        snapshot.len()
    }
}

/// Handle to a registered listener.
///
/// Dropping the handle unregisters the listener. Use [`Subscription::detach`]
/// to keep it for the lifetime of the client.
#[must_use = "dropping a Subscription unregisters its listener"]
pub struct Subscription {
    registry: Weak<ListenerRegistry>,
    event: String,
    id: ListenerId,
    active: bool,
}

impl Subscription {
    pub(crate) fn new(registry: &Arc<ListenerRegistry>, event: &str, id: ListenerId) -> Self {
        Self {
            registry: Arc::downgrade(registry),
            event: event.to_string(),
            id,
            active: true,
        }
    }

    #[must_use]
    pub fn id(&self) -> ListenerId {
        self.id
    }

    #[must_use]
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Unregisters the listener now.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    /// Keeps the listener registered after the handle is gone.
    pub fn detach(mut self) {
        self.active = false;
    }

    fn release(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(&self.event, self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("event", &self.event)
            .field("id", &self.id)
            .field("active", &self.active)
            .finish()
    }
}

/// Payloads of one event type as an async stream.
///
/// Payloads that arrive while the buffer is full are dropped with a warning.
/// The underlying listener is removed when the stream is dropped.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::Receiver<Value>,
    _subscription: Subscription,
}

impl EventStream {
    pub(crate) fn register(registry: &Arc<ListenerRegistry>, event: &str, buffer: usize) -> Self {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let event_name = event.to_string();
        let id = registry.add(
            event,
            Arc::new(move |payload: &Value| {
                if tx.try_send(payload.clone()).is_err() {
                    warn!(event = %event_name, "Event stream full or closed, payload dropped");
                }
            }),
        );
        Self {
            rx,
            _subscription: Subscription::new(registry, event, id),
        }
    }

    /// Waits for the next payload.
    pub async fn recv(&mut self) -> Option<Value> {
        self.rx.recv().await
    }
}

impl Stream for EventStream {
    type Item = Value;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Value>> {
        self.rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn recorder() -> (Arc<Mutex<Vec<Value>>>, Callback) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, Arc::new(move |v: &Value| sink.lock().unwrap().push(v.clone())))
    }

    #[test]
    fn test_emit_reaches_only_matching_listeners() {
        let registry = ListenerRegistry::new();
        let (progress, cb) = recorder();
        registry.add("simulation_progress", cb);
        let (status, cb) = recorder();
        registry.add("simulation_status", cb);

        assert_eq!(registry.emit("simulation_progress", &json!({ "percentage": 10 })), 1);
        assert_eq!(progress.lock().unwrap().len(), 1);
        assert!(status.lock().unwrap().is_empty());
        assert_eq!(registry.emit("unknown", &json!(null)), 0);
    }

    #[test]
    fn test_panicking_listener_does_not_block_others() {
        let registry = ListenerRegistry::new();
        registry.add("evt", Arc::new(|_: &Value| panic!("listener bug")));
        let (seen, cb) = recorder();
        registry.add("evt", cb);

        assert_eq!(registry.emit("evt", &json!(1)), 2);
        assert_eq!(*seen.lock().unwrap(), vec![json!(1)]);
    }

    #[test]
    fn test_subscription_drop_unregisters() {
        let registry = Arc::new(ListenerRegistry::new());
        let (_, cb) = recorder();
        let id = registry.add("evt", cb);
        let sub = Subscription::new(&registry, "evt", id);
        assert_eq!(registry.count("evt"), 1);
        drop(sub);
        assert_eq!(registry.count("evt"), 0);
    }

    #[test]
    fn test_detach_keeps_listener() {
        let registry = Arc::new(ListenerRegistry::new());
        let (_, cb) = recorder();
        let id = registry.add("evt", cb);
        Subscription::new(&registry, "evt", id).detach();
        assert_eq!(registry.count("evt"), 1);
        assert!(registry.remove("evt", id));
        assert!(!registry.remove("evt", id));
    }

    #[tokio::test]
    async fn test_event_stream_receives_and_unregisters() {
        let registry = Arc::new(ListenerRegistry::new());
        let mut stream = EventStream::register(&registry, "evt", 4);
        registry.emit("evt", &json!({ "n": 1 }));
        assert_eq!(stream.recv().await, Some(json!({ "n": 1 })));

        drop(stream);
        assert_eq!(registry.count("evt"), 0);
    }
}
