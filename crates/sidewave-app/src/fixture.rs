//! Scripted browser sessions.
//!
//! A fixture names the sidebar's window, the other open windows, the
//! initial local storage and a list of host events to replay once the
//! sidebar is running.

use serde::Deserialize;
use serde_json::{Map, Value};
use sidewave_core::types::{WindowId, WindowRef};
use sidewave_sync::{HostEvent, MemoryHost, StorageArea};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub window: WindowRef,
    pub windows: Vec<WindowRef>,
    pub storage: Map<String, Value>,
    pub events: Vec<HostEvent>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self {
            window: WindowRef::new(WindowId(1)).focused(true),
            windows: Vec::new(),
            storage: Map::new(),
            events: Vec::new(),
        }
    }
}

impl Fixture {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// A host with the fixture's windows and storage.
    pub fn build_host(&self) -> MemoryHost {
        let host = MemoryHost::new(self.window.clone());
        for window in &self.windows {
            host.insert_window(window.clone());
        }
        host.local_set(self.storage.clone());
        host
    }

    /// Emit every scripted event through `host`. Local storage changes are
    /// applied to the host's storage so later reads see them; a change
    /// without `newValue` removes the key.
    pub fn replay(&self, host: &MemoryHost) {
        for event in self.events.iter().cloned() {
            debug!(kind = %event.kind(), "replaying event");
            match event {
                HostEvent::WindowCreated { window } => host.open_window(window),
                HostEvent::WindowRemoved { window_id } => host.close_window(window_id),
                HostEvent::FocusChanged { window_id } => host.focus_window(window_id),
                HostEvent::StorageChanged {
                    area: StorageArea::Local,
                    changes,
                } => host.local_apply(
                    changes
                        .into_iter()
                        .map(|(key, change)| (key, change.new_value)),
                ),
                HostEvent::Command { name } => host.invoke_command(&name),
                other => {
                    host.hub().emit(other);
                }
            }
        }
    }
}
