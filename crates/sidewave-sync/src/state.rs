//! Shared state store
//!
//! One [`SharedState`] record per sidebar instance holds the window's view
//! of extension state. It is created explicitly and handed to every
//! component through a cloneable [`StateHandle`]; there is no global.
//!
//! Mutations happen through short closures that never span an await, so
//! each handler leaves the record consistent before the next event runs.

use crate::channel::ControlPort;
use serde_json::Value;
use sidewave_core::types::{
    BrowserInfo, InstanceType, PanelConfig, PinnedTabsPosition, PlatformInfo, Settings, TabEntry,
    WindowId, WindowRef,
};
use sidewave_core::{SidewaveError, SidewaveResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// The window's view of extension state.
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    // Identity, assigned once during startup
    window_id: Option<WindowId>,
    private: bool,
    instance_type: Option<InstanceType>,

    /// Whether this instance's window holds browser focus.
    pub window_focused: bool,
    /// Peer windows; `None` until the first window list or window event.
    pub other_windows: Option<Vec<WindowRef>>,

    // Environment facts, best effort
    pub os_info: Option<PlatformInfo>,
    pub os: Option<String>,
    pub ff_info: Option<BrowserInfo>,
    pub ff_ver: u32,

    /// Control channel to the background process, set once at the end of startup.
    bg: Option<ControlPort>,

    // Delegated state written by the action library
    pub settings: Settings,
    pub sidebar_css: Option<String>,
    pub css_vars: Option<Value>,
    pub panels: Vec<PanelConfig>,
    pub panel_index: usize,
    pub tabs: Vec<TabEntry>,
    pub tabs_map: HashMap<i64, usize>,
    pub tabs_menu: Option<Value>,
    pub bookmarks_menu: Option<Value>,
    pub font_size: Option<u32>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn window_id(&self) -> Option<WindowId> {
        self.window_id
    }

    pub fn is_private(&self) -> bool {
        self.private
    }

    pub fn instance_type(&self) -> Option<InstanceType> {
        self.instance_type
    }

    /// Record this instance's window. Fails if a different window was
    /// already assigned.
    pub fn set_identity(&mut self, window_id: WindowId, private: bool) -> SidewaveResult<()> {
        match self.window_id {
            Some(existing) if existing != window_id => {
                Err(SidewaveError::IdentityReassigned(existing))
            }
            _ => {
                self.window_id = Some(window_id);
                self.private = private;
                Ok(())
            }
        }
    }

    pub fn set_instance_type(&mut self, instance_type: InstanceType) {
        self.instance_type = Some(instance_type);
    }

    /// Whether `id` is this instance's own window.
    pub fn is_self(&self, id: WindowId) -> bool {
        self.window_id == Some(id)
    }

    /// Replace the peer list from a full window listing, dropping self.
    pub fn set_other_windows(&mut self, windows: Vec<WindowRef>) {
        let own = self.window_id;
        self.other_windows = Some(windows.into_iter().filter(|w| Some(w.id) != own).collect());
    }

    pub fn set_platform_info(&mut self, info: PlatformInfo) {
        self.os = Some(info.os.clone());
        self.os_info = Some(info);
    }

    pub fn set_browser_info(&mut self, info: BrowserInfo) {
        self.ff_ver = info.major_version();
        self.ff_info = Some(info);
    }

    pub fn background(&self) -> Option<&ControlPort> {
        self.bg.as_ref()
    }

    /// Store the control channel. Only the first call wins.
    pub fn attach_background(&mut self, port: ControlPort) -> SidewaveResult<()> {
        if self.bg.is_some() {
            return Err(SidewaveError::channel("control channel already attached"));
        }
        self.bg = Some(port);
        Ok(())
    }

    /// Panel the sidebar currently shows.
    pub fn active_panel(&self) -> Option<&PanelConfig> {
        self.panels.get(self.panel_index)
    }

    /// Replace the tab list and rebuild the id index.
    pub fn set_tabs(&mut self, tabs: Vec<TabEntry>) {
        self.tabs_map = tabs.iter().enumerate().map(|(i, t)| (t.id, i)).collect();
        self.tabs = tabs;
    }

    /// Pinned tabs position, `None` when nothing is pinned.
    pub fn pinned_tabs_position(&self) -> Option<PinnedTabsPosition> {
        if self.tabs.iter().any(|t| t.pinned) {
            Some(self.settings.pinned_tabs_position)
        } else {
            None
        }
    }
}

/// Cloneable handle to the instance's [`SharedState`].
#[derive(Clone)]
pub struct StateHandle {
    inner: Arc<Mutex<SharedState>>,
    font_size: Arc<watch::Sender<Option<u32>>>,
}

impl StateHandle {
    pub fn new(state: SharedState) -> Self {
        let (font_size, _) = watch::channel(state.font_size);
        Self {
            inner: Arc::new(Mutex::new(state)),
            font_size: Arc::new(font_size),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SharedState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read from the state.
    pub fn read<R>(&self, f: impl FnOnce(&SharedState) -> R) -> R {
        f(&self.lock())
    }

    /// Mutate the state.
    pub fn update<R>(&self, f: impl FnOnce(&mut SharedState) -> R) -> R {
        f(&mut self.lock())
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> SharedState {
        self.lock().clone()
    }

    pub fn window_id(&self) -> Option<WindowId> {
        self.read(|s| s.window_id())
    }

    pub fn is_focused(&self) -> bool {
        self.read(|s| s.window_focused)
    }

    pub fn background(&self) -> Option<ControlPort> {
        self.read(|s| s.background().cloned())
    }

    /// Set the font size and wake font size watchers if it changed.
    pub fn set_font_size(&self, size: Option<u32>) {
        self.update(|s| s.font_size = size);
        self.font_size.send_if_modified(|current| {
            if *current == size {
                false
            } else {
                *current = size;
                true
            }
        });
    }

    pub fn watch_font_size(&self) -> watch::Receiver<Option<u32>> {
        self.font_size.subscribe()
    }
}

impl Default for StateHandle {
    fn default() -> Self {
        Self::new(SharedState::new())
    }
}

impl std::fmt::Debug for StateHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateHandle")
            .field("window_id", &self.window_id())
            .finish()
    }
}
