//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Map, Value};
use sidewave_core::types::{PanelConfig, Settings, TabEntry};
use sidewave_core::{SidewaveError, SidewaveResult};
use sidewave_sync::{ChannelMessage, PanelTarget, SidebarActions, StateHandle};
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("sidewave_sync=debug")
        .try_init();
}

/// Poll `condition` until it holds, panicking after two seconds.
pub async fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for {}", what);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// An action library backed by a key/value map that records every call.
#[derive(Default)]
pub struct RecordingActions {
    storage: Mutex<Map<String, Value>>,
    calls: Mutex<Vec<String>>,
    /// Calls made while no control channel existed yet.
    without_channel: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    /// Side effects that record their call and then never finish.
    stalled: Mutex<HashSet<String>>,
    delay: Option<Duration>,
}

impl RecordingActions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, key: &str, value: Value) -> Self {
        self.storage.lock().unwrap().insert(key.to_string(), value);
        self
    }

    /// Make every blocking load sleep for `delay` first.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing(self, action: &str) -> Self {
        self.failing.lock().unwrap().insert(action.to_string());
        self
    }

    pub fn stalling(self, action: &str) -> Self {
        self.stalled.lock().unwrap().insert(action.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, action: &str) -> bool {
        self.calls.lock().unwrap().iter().any(|c| c == action)
    }

    pub fn count(&self, action: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == action).count()
    }

    pub fn without_channel(&self) -> Vec<String> {
        self.without_channel.lock().unwrap().clone()
    }

    fn stored(&self, key: &str) -> Option<Value> {
        self.storage.lock().unwrap().get(key).cloned()
    }

    fn record(&self, action: &str, state: &StateHandle) -> SidewaveResult<()> {
        self.calls.lock().unwrap().push(action.to_string());
        if state.background().is_none() {
            self.without_channel.lock().unwrap().push(action.to_string());
        }
        if self.failing.lock().unwrap().contains(action) {
            return Err(SidewaveError::action(action, "injected failure"));
        }
        Ok(())
    }

    async fn load(&self, action: &str, state: &StateHandle) -> SidewaveResult<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.record(action, state)
    }

    async fn effect(&self, action: &str, state: &StateHandle) -> SidewaveResult<()> {
        self.record(action, state)?;
        let stalled = self.stalled.lock().unwrap().contains(action);
        if stalled {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}

#[async_trait]
impl SidebarActions for RecordingActions {
    async fn load_settings(&self, state: &StateHandle) -> SidewaveResult<()> {
        self.load("load_settings", state).await?;
        let settings: Settings = match self.stored("settings") {
            Some(value) => serde_json::from_value(value)?,
            None => Settings::default(),
        };
        let css = self
            .stored("sidebarCSS")
            .and_then(|v| v.as_str().map(str::to_string));
        state.update(|s| {
            s.settings = settings;
            s.sidebar_css = css;
        });
        Ok(())
    }

    async fn init_theme(&self, state: &StateHandle) -> SidewaveResult<()> {
        self.record("init_theme", state)
    }

    async fn load_custom_css(&self, state: &StateHandle) -> SidewaveResult<()> {
        self.record("load_custom_css", state)
    }

    async fn load_panel_index(&self, state: &StateHandle) -> SidewaveResult<()> {
        self.load("load_panel_index", state).await?;
        let index = self
            .stored("panelIndex")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as usize;
        state.update(|s| s.panel_index = index);
        Ok(())
    }

    async fn load_panels(&self, state: &StateHandle) -> SidewaveResult<()> {
        self.load("load_panels", state).await?;
        let panels: Vec<PanelConfig> = match self.stored("panels") {
            Some(value) => serde_json::from_value(value)?,
            None => Vec::new(),
        };
        state.update(|s| s.panels = panels);
        Ok(())
    }

    async fn load_bookmarks(&self, state: &StateHandle) -> SidewaveResult<()> {
        self.load("load_bookmarks", state).await
    }

    async fn load_tabs(&self, state: &StateHandle) -> SidewaveResult<()> {
        self.load("load_tabs", state).await?;
        let tabs: Vec<TabEntry> = match self.stored("tabs") {
            Some(value) => serde_json::from_value(value)?,
            None => Vec::new(),
        };
        state.update(|s| s.set_tabs(tabs));
        Ok(())
    }

    async fn load_ctx_menu(&self, state: &StateHandle) -> SidewaveResult<()> {
        self.load("load_ctx_menu", state).await?;
        let tabs_menu = self.stored("tabsMenu");
        let bookmarks_menu = self.stored("bookmarksMenu");
        state.update(|s| {
            s.tabs_menu = tabs_menu;
            s.bookmarks_menu = bookmarks_menu;
        });
        Ok(())
    }

    async fn load_css_vars(&self, state: &StateHandle) -> SidewaveResult<()> {
        self.load("load_css_vars", state).await?;
        let vars = self.stored("cssVars");
        state.update(|s| s.css_vars = vars);
        Ok(())
    }

    async fn scroll_to_active_tab(&self, state: &StateHandle) -> SidewaveResult<()> {
        self.effect("scroll_to_active_tab", state).await
    }

    async fn load_keybindings(&self, state: &StateHandle) -> SidewaveResult<()> {
        self.effect("load_keybindings", state).await
    }

    async fn load_favicons(&self, state: &StateHandle) -> SidewaveResult<()> {
        self.effect("load_favicons", state).await
    }

    async fn load_permissions(&self, state: &StateHandle) -> SidewaveResult<()> {
        self.effect("load_permissions", state).await
    }

    async fn try_clear_favi_cache(
        &self,
        state: &StateHandle,
        max_age: Duration,
    ) -> SidewaveResult<()> {
        self.effect(&format!("try_clear_favi_cache {}", max_age.as_secs()), state)
            .await
    }

    async fn update_tabs_visibility(&self, state: &StateHandle) -> SidewaveResult<()> {
        self.effect("update_tabs_visibility", state).await
    }

    async fn update_font_size(&self, state: &StateHandle) -> SidewaveResult<()> {
        self.record("update_font_size", state)
    }

    async fn update_settings(&self, state: &StateHandle, settings: Value) -> SidewaveResult<()> {
        self.record("update_settings", state)?;
        let settings: Settings = serde_json::from_value(settings)?;
        state.update(|s| s.settings = settings);
        Ok(())
    }

    async fn apply_css_vars(&self, state: &StateHandle, vars: Value) -> SidewaveResult<()> {
        self.record("apply_css_vars", state)?;
        state.update(|s| s.css_vars = Some(vars));
        Ok(())
    }

    async fn update_panels(&self, state: &StateHandle, panels: Value) -> SidewaveResult<()> {
        self.record("update_panels", state)?;
        let panels: Vec<PanelConfig> = serde_json::from_value(panels)?;
        state.update(|s| s.panels = panels);
        Ok(())
    }

    async fn apply_custom_css(&self, state: &StateHandle, css: Value) -> SidewaveResult<()> {
        self.record("apply_custom_css", state)?;
        state.update(|s| s.sidebar_css = css.as_str().map(str::to_string));
        Ok(())
    }

    async fn save_panel_index(&self, state: &StateHandle) -> SidewaveResult<()> {
        self.record("save_panel_index", state)?;
        let index = state.read(|s| s.panel_index);
        self.storage
            .lock()
            .unwrap()
            .insert("panelIndex".to_string(), Value::from(index));
        Ok(())
    }

    async fn switch_panel(&self, state: &StateHandle, target: PanelTarget) -> SidewaveResult<()> {
        self.record("switch_panel", state)?;
        state.update(|s| {
            let count = s.panels.len().max(1);
            s.panel_index = match target {
                PanelTarget::Next => (s.panel_index + 1) % count,
                PanelTarget::Previous => (s.panel_index + count - 1) % count,
                PanelTarget::Index(index) if index < s.panels.len() => index,
                PanelTarget::Index(_) => s.panel_index,
            };
        });
        Ok(())
    }

    async fn on_background_message(
        &self,
        state: &StateHandle,
        message: ChannelMessage,
    ) -> SidewaveResult<()> {
        self.record(&format!("bg:{}", message.action), state)
    }
}
