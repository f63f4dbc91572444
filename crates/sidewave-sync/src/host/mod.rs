//! Host environment interface.
//!
//! The browser's window, runtime and event APIs are consumed through the
//! traits below so the synchronisation core never touches a concrete host.
//!
//! ```text
//! WindowsApi    get_current / get_all
//! RuntimeApi    platform_info / browser_info / connect
//! EventSource   subscribe(kind, sink) -> Subscription
//! ```

mod hub;
mod memory;

pub use hub::EventHub;
pub use memory::MemoryHost;

use crate::channel::ControlPort;
use crate::storage::{StorageArea, StorageChanges};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sidewave_core::types::{BrowserInfo, PlatformInfo, WindowId, WindowRef};
use sidewave_core::SidewaveResult;
use std::fmt;
use tokio::sync::mpsc;

/// Window queries.
#[async_trait]
pub trait WindowsApi: Send + Sync {
    /// The window this process is bound to.
    async fn get_current(&self) -> SidewaveResult<WindowRef>;

    /// Every open browser window.
    async fn get_all(&self) -> SidewaveResult<Vec<WindowRef>>;
}

/// Runtime queries and the background connection.
#[async_trait]
pub trait RuntimeApi: Send + Sync {
    async fn platform_info(&self) -> SidewaveResult<PlatformInfo>;

    async fn browser_info(&self) -> SidewaveResult<BrowserInfo>;

    /// Open a named channel to the background process.
    async fn connect(&self, name: &str) -> SidewaveResult<ControlPort>;
}

/// Registration point for host event listeners.
pub trait EventSource: Send + Sync {
    /// Register `sink` for events of `kind`. The listener stays registered
    /// until the returned handle is closed.
    fn subscribe(&self, kind: HostEventKind, sink: EventSink) -> Subscription;
}

/// Where subscribed events are delivered.
pub type EventSink = mpsc::UnboundedSender<HostEvent>;

/// Categories of host events the sidebar listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HostEventKind {
    WindowCreated,
    WindowRemoved,
    FocusChanged,
    StorageChanged,
    Command,
}

impl HostEventKind {
    /// Registration order used on activation.
    pub const ALL: [HostEventKind; 5] = [
        HostEventKind::WindowCreated,
        HostEventKind::WindowRemoved,
        HostEventKind::FocusChanged,
        HostEventKind::StorageChanged,
        HostEventKind::Command,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HostEventKind::WindowCreated => "windows.onCreated",
            HostEventKind::WindowRemoved => "windows.onRemoved",
            HostEventKind::FocusChanged => "windows.onFocusChanged",
            HostEventKind::StorageChanged => "storage.onChanged",
            HostEventKind::Command => "commands.onCommand",
        }
    }

    /// Whether the listener tracks window creation or removal.
    pub fn is_window_tracking(self) -> bool {
        matches!(
            self,
            HostEventKind::WindowCreated | HostEventKind::WindowRemoved
        )
    }
}

impl fmt::Display for HostEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event delivered by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    WindowCreated {
        window: WindowRef,
    },
    WindowRemoved {
        window_id: WindowId,
    },
    /// `None` when focus moved away from every browser window.
    FocusChanged {
        window_id: Option<WindowId>,
    },
    StorageChanged {
        area: StorageArea,
        changes: StorageChanges,
    },
    Command {
        name: String,
    },
}

impl HostEvent {
    pub fn kind(&self) -> HostEventKind {
        match self {
            HostEvent::WindowCreated { .. } => HostEventKind::WindowCreated,
            HostEvent::WindowRemoved { .. } => HostEventKind::WindowRemoved,
            HostEvent::FocusChanged { .. } => HostEventKind::FocusChanged,
            HostEvent::StorageChanged { .. } => HostEventKind::StorageChanged,
            HostEvent::Command { .. } => HostEventKind::Command,
        }
    }
}

/// Handle of one registered listener.
///
/// Dropping the handle leaves the listener registered; call [`close`] to
/// deregister it.
///
/// [`close`]: Subscription::close
pub struct Subscription {
    kind: HostEventKind,
    closer: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(kind: HostEventKind, closer: impl FnOnce() + Send + 'static) -> Self {
        Self {
            kind,
            closer: Some(Box::new(closer)),
        }
    }

    pub fn kind(&self) -> HostEventKind {
        self.kind
    }

    /// Deregister the listener.
    pub fn close(mut self) {
        if let Some(closer) = self.closer.take() {
            closer();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("kind", &self.kind)
            .finish()
    }
}
