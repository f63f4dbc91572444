//! In-memory host used by the headless binary and the test suites.

use super::{
    EventHub, EventSink, EventSource, HostEvent, HostEventKind, RuntimeApi, Subscription,
    WindowsApi,
};
use crate::channel::ControlPort;
use crate::storage::{StorageArea, StorageChange, StorageChanges};
use async_trait::async_trait;
use serde_json::Value;
use sidewave_core::types::{BrowserInfo, PlatformInfo, WindowId, WindowRef};
use sidewave_core::{SidewaveError, SidewaveResult};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

struct MemoryHostState {
    current: WindowId,
    windows: Vec<WindowRef>,
    platform: Option<PlatformInfo>,
    browser: Option<BrowserInfo>,
    local_storage: BTreeMap<String, Value>,
    /// Background ends of every opened control channel, keyed by name.
    connections: Vec<(String, ControlPort)>,
    fail_window_list: bool,
}

/// A scripted browser: a window list, a local storage area and an
/// [`EventHub`] to emit lifecycle events through.
pub struct MemoryHost {
    hub: EventHub,
    state: Mutex<MemoryHostState>,
}

impl MemoryHost {
    /// Create a host whose current window is `current`.
    pub fn new(current: WindowRef) -> Self {
        Self {
            hub: EventHub::new(),
            state: Mutex::new(MemoryHostState {
                current: current.id,
                windows: vec![current],
                platform: Some(PlatformInfo {
                    os: "linux".to_string(),
                    arch: "x86-64".to_string(),
                }),
                browser: Some(BrowserInfo {
                    name: "Firefox".to_string(),
                    vendor: "Mozilla".to_string(),
                    version: "128.0".to_string(),
                    build_id: String::new(),
                }),
                local_storage: BTreeMap::new(),
                connections: Vec::new(),
                fail_window_list: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryHostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn hub(&self) -> &EventHub {
        &self.hub
    }

    /// Replace the reported platform info; `None` makes the call fail.
    pub fn set_platform_info(&self, info: Option<PlatformInfo>) {
        self.lock().platform = info;
    }

    /// Replace the reported browser info; `None` makes the call fail.
    pub fn set_browser_info(&self, info: Option<BrowserInfo>) {
        self.lock().browser = info;
    }

    /// Make `get_all` fail.
    pub fn fail_window_list(&self, fail: bool) {
        self.lock().fail_window_list = fail;
    }

    /// Add a window without emitting an event.
    pub fn insert_window(&self, window: WindowRef) {
        self.lock().windows.push(window);
    }

    /// Open a window and announce it.
    pub fn open_window(&self, window: WindowRef) {
        self.insert_window(window.clone());
        self.hub.emit(HostEvent::WindowCreated { window });
    }

    /// Close a window and announce it.
    pub fn close_window(&self, window_id: WindowId) {
        self.lock().windows.retain(|w| w.id != window_id);
        self.hub.emit(HostEvent::WindowRemoved { window_id });
    }

    /// Move focus to `window_id`, or away from every window.
    pub fn focus_window(&self, window_id: Option<WindowId>) {
        for window in self.lock().windows.iter_mut() {
            window.focused = Some(window.id) == window_id;
        }
        self.hub.emit(HostEvent::FocusChanged { window_id });
    }

    pub fn invoke_command(&self, name: &str) {
        self.hub.emit(HostEvent::Command {
            name: name.to_string(),
        });
    }

    /// Read a key from the local storage area.
    pub fn local_get(&self, key: &str) -> Option<Value> {
        self.lock().local_storage.get(key).cloned()
    }

    /// Write keys to the local storage area and notify listeners.
    pub fn local_set(&self, values: impl IntoIterator<Item = (String, Value)>) {
        self.local_apply(values.into_iter().map(|(key, value)| (key, Some(value))));
    }

    /// Remove keys from the local storage area and notify listeners.
    /// Keys that were never stored are skipped.
    pub fn local_remove<K: Into<String>>(&self, keys: impl IntoIterator<Item = K>) {
        self.local_apply(keys.into_iter().map(|key| (key.into(), None)));
    }

    /// Write (`Some`) or remove (`None`) keys, announcing every change in
    /// one notification.
    pub fn local_apply(&self, values: impl IntoIterator<Item = (String, Option<Value>)>) {
        let changes: StorageChanges = {
            let mut state = self.lock();
            values
                .into_iter()
                .filter_map(|(key, value)| {
                    let old = match &value {
                        Some(value) => state.local_storage.insert(key.clone(), value.clone()),
                        None => Some(state.local_storage.remove(&key)?),
                    };
                    Some((key, StorageChange::new(old, value)))
                })
                .collect()
        };

        if !changes.is_empty() {
            self.hub.emit(HostEvent::StorageChanged {
                area: StorageArea::Local,
                changes,
            });
        }
    }

    /// Names of the control channels opened so far, in order.
    pub fn connections(&self) -> Vec<String> {
        self.lock()
            .connections
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Background end of the channel opened under `name`.
    pub fn background_port(&self, name: &str) -> Option<ControlPort> {
        self.lock()
            .connections
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, port)| port.clone())
    }

    /// Listener counts per event kind.
    pub fn listener_counts(&self) -> HashMap<HostEventKind, usize> {
        HostEventKind::ALL
            .into_iter()
            .map(|kind| (kind, self.hub.listener_count(kind)))
            .collect()
    }
}

#[async_trait]
impl WindowsApi for MemoryHost {
    async fn get_current(&self) -> SidewaveResult<WindowRef> {
        let state = self.lock();
        state
            .windows
            .iter()
            .find(|w| w.id == state.current)
            .cloned()
            .ok_or_else(|| SidewaveError::host(format!("window {} is gone", state.current)))
    }

    async fn get_all(&self) -> SidewaveResult<Vec<WindowRef>> {
        let state = self.lock();
        if state.fail_window_list {
            return Err(SidewaveError::host("windows.getAll unavailable"));
        }
        Ok(state.windows.clone())
    }
}

#[async_trait]
impl RuntimeApi for MemoryHost {
    async fn platform_info(&self) -> SidewaveResult<PlatformInfo> {
        self.lock()
            .platform
            .clone()
            .ok_or_else(|| SidewaveError::host("runtime.getPlatformInfo unavailable"))
    }

    async fn browser_info(&self) -> SidewaveResult<BrowserInfo> {
        self.lock()
            .browser
            .clone()
            .ok_or_else(|| SidewaveError::host("runtime.getBrowserInfo unavailable"))
    }

    async fn connect(&self, name: &str) -> SidewaveResult<ControlPort> {
        let (local, remote) = ControlPort::pair(name);
        self.lock().connections.push((name.to_string(), remote));
        Ok(local)
    }
}

impl EventSource for MemoryHost {
    fn subscribe(&self, kind: HostEventKind, sink: EventSink) -> Subscription {
        self.hub.subscribe(kind, sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_window_queries() {
        let host = MemoryHost::new(WindowRef::new(WindowId(1)).incognito(true));
        host.insert_window(WindowRef::new(WindowId(2)));

        let current = host.get_current().await.unwrap();
        assert_eq!(current.id, WindowId(1));
        assert!(current.incognito);
        assert_eq!(host.get_all().await.unwrap().len(), 2);

        host.fail_window_list(true);
        assert!(host.get_all().await.is_err());
    }

    #[test]
    fn test_local_set_reports_old_value() {
        let host = MemoryHost::new(WindowRef::new(WindowId(1)));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _sub = host.subscribe(HostEventKind::StorageChanged, tx);

        host.local_set([("panels".to_string(), json!([1]))]);
        host.local_set([("panels".to_string(), json!([2]))]);
        assert_eq!(host.local_get("panels"), Some(json!([2])));

        let _first = rx.try_recv().unwrap();
        match rx.try_recv().unwrap() {
            HostEvent::StorageChanged { area, changes } => {
                assert_eq!(area, StorageArea::Local);
                assert_eq!(changes["panels"].old_value, Some(json!([1])));
                assert_eq!(changes["panels"].new_value, Some(json!([2])));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_local_remove_reports_removal() {
        let host = MemoryHost::new(WindowRef::new(WindowId(1)));
        host.local_set([("tabsMenu".to_string(), json!(["a"]))]);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _sub = host.subscribe(HostEventKind::StorageChanged, tx);
        host.local_remove(["tabsMenu", "neverStored"]);
        assert_eq!(host.local_get("tabsMenu"), None);

        match rx.try_recv().unwrap() {
            HostEvent::StorageChanged { changes, .. } => {
                assert_eq!(changes.len(), 1);
                assert_eq!(changes["tabsMenu"].old_value, Some(json!(["a"])));
                assert_eq!(changes["tabsMenu"].new_value, None);
            }
            other => panic!("unexpected event {:?}", other),
        }

        // Nothing left to remove, nothing announced
        host.local_remove(["tabsMenu"]);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_connect_keeps_background_end() {
        let host = MemoryHost::new(WindowRef::new(WindowId(1)));
        let port = host.connect("chan").await.unwrap();

        assert_eq!(host.connections(), vec!["chan".to_string()]);
        port.post_message(crate::channel::ChannelMessage::new("hello"))
            .unwrap();
        let background = host.background_port("chan").unwrap();
        assert_eq!(background.try_receive().unwrap().action, "hello");
    }
}
