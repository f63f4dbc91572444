//! Listener lifecycle
//!
//! Owns the subscription handles of one sidebar instance. Activation
//! registers every host event kind the instance listens to; deactivation
//! closes them according to the configured [`DetachPolicy`].

use crate::host::{EventSink, EventSource, HostEventKind, Subscription};
use sidewave_core::DetachPolicy;
use std::sync::Arc;
use tracing::debug;

pub struct LifecycleManager {
    source: Arc<dyn EventSource>,
    sink: EventSink,
    policy: DetachPolicy,
    subscriptions: Vec<Subscription>,
}

impl LifecycleManager {
    pub fn new(source: Arc<dyn EventSource>, sink: EventSink, policy: DetachPolicy) -> Self {
        Self {
            source,
            sink,
            policy,
            subscriptions: Vec::new(),
        }
    }

    pub fn policy(&self) -> DetachPolicy {
        self.policy
    }

    /// Register listeners for every kind not already registered.
    ///
    /// Returns the kinds registered by this call.
    pub fn activate(&mut self) -> Vec<HostEventKind> {
        let mut added = Vec::new();
        for kind in HostEventKind::ALL {
            if self.is_registered(kind) {
                continue;
            }
            let subscription = self.source.subscribe(kind, self.sink.clone());
            self.subscriptions.push(subscription);
            added.push(kind);
        }
        debug!(registered = added.len(), "listeners activated");
        added
    }

    /// Close listeners, newest first.
    ///
    /// With [`DetachPolicy::PreserveWindowTracking`] the window created and
    /// removed listeners stay registered so the peer list keeps tracking
    /// while the sidebar is hidden.
    pub fn deactivate(&mut self) -> Vec<HostEventKind> {
        let policy = self.policy;
        let mut kept = Vec::new();
        let mut closed = Vec::new();

        while let Some(subscription) = self.subscriptions.pop() {
            let keep = policy == DetachPolicy::PreserveWindowTracking
                && subscription.kind().is_window_tracking();
            if keep {
                kept.push(subscription);
            } else {
                closed.push(subscription.kind());
                subscription.close();
            }
        }

        kept.reverse();
        self.subscriptions = kept;
        debug!(closed = closed.len(), kept = self.subscriptions.len(), "listeners deactivated");
        closed
    }

    /// Close every listener regardless of policy.
    pub fn close_all(&mut self) {
        while let Some(subscription) = self.subscriptions.pop() {
            subscription.close();
        }
    }

    pub fn is_registered(&self, kind: HostEventKind) -> bool {
        self.subscriptions.iter().any(|s| s.kind() == kind)
    }

    /// Kinds with an open listener, in registration order.
    pub fn registered_kinds(&self) -> Vec<HostEventKind> {
        self.subscriptions.iter().map(Subscription::kind).collect()
    }
}

impl std::fmt::Debug for LifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleManager")
            .field("policy", &self.policy)
            .field("registered", &self.registered_kinds())
            .finish()
    }
}
