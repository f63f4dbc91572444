//! Listener registry that fans host events out to subscribers.

use super::{EventSink, EventSource, HostEvent, HostEventKind, Subscription};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::trace;

#[derive(Default)]
struct HubInner {
    next_id: u64,
    listeners: HashMap<HostEventKind, Vec<(u64, EventSink)>>,
}

/// In-process [`EventSource`].
///
/// Events are delivered to every live listener of their kind in
/// registration order; listeners whose sink is gone are pruned on emit.
#[derive(Clone, Default)]
pub struct EventHub {
    inner: Arc<Mutex<HubInner>>,
}

fn lock(inner: &Mutex<HubInner>) -> MutexGuard<'_, HubInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an event. Returns the number of listeners reached.
    pub fn emit(&self, event: HostEvent) -> usize {
        let kind = event.kind();
        let sinks: Vec<(u64, EventSink)> = lock(&self.inner)
            .listeners
            .get(&kind)
            .cloned()
            .unwrap_or_default();

        let mut delivered = 0;
        let mut dead = Vec::new();
        for (id, sink) in sinks {
            if sink.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                dead.push(id);
            }
        }

        if !dead.is_empty() {
            if let Some(list) = lock(&self.inner).listeners.get_mut(&kind) {
                list.retain(|(id, _)| !dead.contains(id));
            }
        }

        trace!(%kind, delivered, "emitted host event");
        delivered
    }

    /// Number of registered listeners for `kind`.
    pub fn listener_count(&self, kind: HostEventKind) -> usize {
        lock(&self.inner)
            .listeners
            .get(&kind)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl EventSource for EventHub {
    fn subscribe(&self, kind: HostEventKind, sink: EventSink) -> Subscription {
        let id = {
            let mut inner = lock(&self.inner);
            let id = inner.next_id;
            inner.next_id += 1;
            inner.listeners.entry(kind).or_default().push((id, sink));
            id
        };

        let weak: Weak<Mutex<HubInner>> = Arc::downgrade(&self.inner);
        Subscription::new(kind, move || {
            if let Some(inner) = weak.upgrade() {
                if let Some(list) = lock(&inner).listeners.get_mut(&kind) {
                    list.retain(|(listener, _)| *listener != id);
                }
            }
        })
    }
}
