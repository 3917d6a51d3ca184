/// Event System
///
/// Synchronous publish/subscribe plumbing shared by the settings store and the
/// chunk streamer. Handlers are invoked on the publishing thread, in
/// subscription order, outside of any internal lock so a handler may
/// unsubscribe itself.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Event handler trait for receiving events
pub trait EventHandler<E>: Send + Sync {
    fn handle_event(&self, event: &E);
    fn handler_name(&self) -> &str {
        "unnamed_handler"
    }
}

impl<E, F> EventHandler<E> for F
where
    F: Fn(&E) + Send + Sync,
{
    fn handle_event(&self, event: &E) {
        self(event)
    }
}

/// Handle returned by `subscribe`, used to unsubscribe later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Ordered list of handlers for one event type
pub struct Subscribers<E> {
    handlers: RwLock<Vec<(SubscriptionId, Arc<dyn EventHandler<E>>)>>,
    next_id: AtomicU64,
}

impl<E: 'static> Subscribers<E> {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn subscribe<H>(&self, handler: H) -> SubscriptionId
    where
        H: EventHandler<E> + 'static,
    {
        self.subscribe_arc(Arc::new(handler))
    }

    pub fn subscribe_arc(&self, handler: Arc<dyn EventHandler<E>>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        log::debug!(
            "[EventSystem] Subscribed handler '{}' as {:?}",
            handler.handler_name(),
            id
        );
        self.handlers.write().push((id, handler));
        id
    }

    /// Returns false if the id was not (or no longer) subscribed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|(existing, _)| *existing != id);
        handlers.len() != before
    }

    /// Deliver an event to every handler. Returns the number of handlers invoked.
    pub fn publish(&self, event: &E) -> usize {
        let snapshot: Vec<Arc<dyn EventHandler<E>>> = self
            .handlers
            .read()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for handler in &snapshot {
            handler.handle_event(event);
        }
        snapshot.len()
    }

    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }
}

impl<E: 'static> Default for Subscribers<E> {
    fn default() -> Self {
        Self::new()
    }
}
