//! Action library backed by the in-memory host's local storage.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sidewave_core::types::{PanelConfig, PanelKind, Settings, TabEntry};
use sidewave_core::{SidewaveError, SidewaveResult};
use sidewave_sync::{ChannelMessage, MemoryHost, PanelTarget, SidebarActions, StateHandle};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub struct StoreActions {
    host: Arc<MemoryHost>,
}

impl StoreActions {
    pub fn new(host: Arc<MemoryHost>) -> Self {
        Self { host }
    }

    fn get<T: DeserializeOwned>(&self, key: &str) -> SidewaveResult<Option<T>> {
        match self.host.local_get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn default_panels() -> Vec<PanelConfig> {
        vec![
            PanelConfig::new("bookmarks", PanelKind::Bookmarks),
            PanelConfig::new("default", PanelKind::Default),
        ]
    }

    fn apply_settings(state: &StateHandle, settings: Settings) {
        let font_size = settings.font_size;
        state.update(|s| s.settings = settings);
        state.set_font_size(font_size);
    }
}

#[async_trait]
impl SidebarActions for StoreActions {
    async fn load_settings(&self, state: &StateHandle) -> SidewaveResult<()> {
        let settings: Settings = self.get("settings")?.unwrap_or_default();
        let css: Option<String> = self.get("sidebarCSS")?;
        debug!(theme = %settings.theme, "settings loaded");
        Self::apply_settings(state, settings);
        state.update(|s| s.sidebar_css = css);
        Ok(())
    }

    async fn init_theme(&self, state: &StateHandle) -> SidewaveResult<()> {
        let theme = state.read(|s| s.settings.theme.clone());
        info!(%theme, "theme applied");
        Ok(())
    }

    async fn load_custom_css(&self, state: &StateHandle) -> SidewaveResult<()> {
        let len = state.read(|s| s.sidebar_css.as_ref().map_or(0, String::len));
        info!(bytes = len, "custom style sheet applied");
        Ok(())
    }

    async fn load_panel_index(&self, state: &StateHandle) -> SidewaveResult<()> {
        let index: usize = self.get("panelIndex")?.unwrap_or(0);
        state.update(|s| s.panel_index = index);
        Ok(())
    }

    async fn load_panels(&self, state: &StateHandle) -> SidewaveResult<()> {
        let panels: Vec<PanelConfig> = self.get("panels")?.unwrap_or_else(Self::default_panels);
        state.update(|s| {
            if s.panel_index >= panels.len() {
                s.panel_index = 0;
            }
            s.panels = panels;
        });
        Ok(())
    }

    async fn load_bookmarks(&self, _state: &StateHandle) -> SidewaveResult<()> {
        let bookmarks: Vec<Value> = self.get("bookmarks")?.unwrap_or_default();
        debug!(count = bookmarks.len(), "bookmarks loaded");
        Ok(())
    }

    async fn load_tabs(&self, state: &StateHandle) -> SidewaveResult<()> {
        let tabs: Vec<TabEntry> = self.get("tabs")?.unwrap_or_default();
        let own = state.window_id().ok_or(SidewaveError::MissingIdentity)?;
        let tabs: Vec<TabEntry> = tabs
            .into_iter()
            .filter(|t| t.window_id.map_or(true, |id| id == own))
            .collect();
        debug!(count = tabs.len(), "tabs loaded");
        state.update(|s| s.set_tabs(tabs));
        Ok(())
    }

    async fn load_ctx_menu(&self, state: &StateHandle) -> SidewaveResult<()> {
        let tabs_menu = self.host.local_get("tabsMenu");
        let bookmarks_menu = self.host.local_get("bookmarksMenu");
        state.update(|s| {
            s.tabs_menu = tabs_menu;
            s.bookmarks_menu = bookmarks_menu;
        });
        Ok(())
    }

    async fn load_css_vars(&self, state: &StateHandle) -> SidewaveResult<()> {
        let vars = self.host.local_get("cssVars");
        state.update(|s| s.css_vars = vars);
        Ok(())
    }

    async fn scroll_to_active_tab(&self, state: &StateHandle) -> SidewaveResult<()> {
        if let Some(tab) = state.read(|s| s.tabs.iter().find(|t| t.active).map(|t| t.id)) {
            debug!(tab, "scrolled to active tab");
        }
        Ok(())
    }

    async fn load_keybindings(&self, _state: &StateHandle) -> SidewaveResult<()> {
        let keybindings = self.host.local_get("keybindings");
        debug!(custom = keybindings.is_some(), "keybindings loaded");
        Ok(())
    }

    async fn load_favicons(&self, _state: &StateHandle) -> SidewaveResult<()> {
        let favicons: Vec<Value> = self.get("favicons")?.unwrap_or_default();
        debug!(count = favicons.len(), "favicons loaded");
        Ok(())
    }

    async fn load_permissions(&self, _state: &StateHandle) -> SidewaveResult<()> {
        Ok(())
    }

    async fn try_clear_favi_cache(
        &self,
        _state: &StateHandle,
        max_age: Duration,
    ) -> SidewaveResult<()> {
        debug!(max_age_secs = max_age.as_secs(), "favicon cache checked");
        Ok(())
    }

    async fn update_tabs_visibility(&self, state: &StateHandle) -> SidewaveResult<()> {
        let hidden = state.read(|s| s.tabs.iter().filter(|t| t.hidden).count());
        debug!(hidden, "tab visibility updated");
        Ok(())
    }

    async fn update_font_size(&self, state: &StateHandle) -> SidewaveResult<()> {
        let size = state.read(|s| s.font_size);
        debug!(?size, "font size applied");
        Ok(())
    }

    async fn update_settings(&self, state: &StateHandle, settings: Value) -> SidewaveResult<()> {
        let settings: Settings = serde_json::from_value(settings)?;
        Self::apply_settings(state, settings);
        Ok(())
    }

    async fn apply_css_vars(&self, state: &StateHandle, vars: Value) -> SidewaveResult<()> {
        state.update(|s| s.css_vars = Some(vars));
        Ok(())
    }

    async fn update_panels(&self, state: &StateHandle, panels: Value) -> SidewaveResult<()> {
        let panels: Vec<PanelConfig> = serde_json::from_value(panels)?;
        state.update(|s| {
            if s.panel_index >= panels.len() {
                s.panel_index = 0;
            }
            s.panels = panels;
        });
        Ok(())
    }

    async fn apply_custom_css(&self, state: &StateHandle, css: Value) -> SidewaveResult<()> {
        state.update(|s| s.sidebar_css = css.as_str().map(str::to_string));
        Ok(())
    }

    async fn save_panel_index(&self, state: &StateHandle) -> SidewaveResult<()> {
        let index = state.read(|s| s.panel_index);
        self.host
            .local_set([("panelIndex".to_string(), Value::from(index))]);
        Ok(())
    }

    async fn switch_panel(&self, state: &StateHandle, target: PanelTarget) -> SidewaveResult<()> {
        state.update(|s| {
            let count = s.panels.len();
            if count == 0 {
                return;
            }
            s.panel_index = match target {
                PanelTarget::Next => (s.panel_index + 1) % count,
                PanelTarget::Previous => (s.panel_index + count - 1) % count,
                PanelTarget::Index(index) => index.min(count - 1),
            };
        });
        self.save_panel_index(state).await
    }

    async fn on_background_message(
        &self,
        _state: &StateHandle,
        message: ChannelMessage,
    ) -> SidewaveResult<()> {
        info!(action = %message.action, args = message.args.len(), "background message");
        Ok(())
    }
}
