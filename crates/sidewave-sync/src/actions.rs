//! Action library interface.
//!
//! Loading settings, panels, tabs, bookmarks and favicons, and applying
//! themes and styles, is delegated to an implementation of
//! [`SidebarActions`]. Every operation receives the instance's
//! [`StateHandle`] and writes its results there.

use crate::channel::ChannelMessage;
use crate::state::StateHandle;
use async_trait::async_trait;
use serde_json::Value;
use sidewave_core::SidewaveResult;
use std::time::Duration;

/// Panel to switch to from a keybinding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelTarget {
    Next,
    Previous,
    Index(usize),
}

/// Operations the sidebar delegates.
///
/// Implementations must be idempotent: reconciliation may deliver the same
/// value more than once.
#[async_trait]
pub trait SidebarActions: Send + Sync {
    // Startup loads

    async fn load_settings(&self, state: &StateHandle) -> SidewaveResult<()>;

    async fn init_theme(&self, state: &StateHandle) -> SidewaveResult<()>;

    async fn load_custom_css(&self, state: &StateHandle) -> SidewaveResult<()>;

    async fn load_panel_index(&self, state: &StateHandle) -> SidewaveResult<()>;

    async fn load_panels(&self, state: &StateHandle) -> SidewaveResult<()>;

    async fn load_bookmarks(&self, state: &StateHandle) -> SidewaveResult<()>;

    async fn load_tabs(&self, state: &StateHandle) -> SidewaveResult<()>;

    async fn load_ctx_menu(&self, state: &StateHandle) -> SidewaveResult<()>;

    async fn load_css_vars(&self, state: &StateHandle) -> SidewaveResult<()>;

    // Best-effort follow-ups

    async fn scroll_to_active_tab(&self, state: &StateHandle) -> SidewaveResult<()>;

    async fn load_keybindings(&self, state: &StateHandle) -> SidewaveResult<()>;

    async fn load_favicons(&self, state: &StateHandle) -> SidewaveResult<()>;

    async fn load_permissions(&self, state: &StateHandle) -> SidewaveResult<()>;

    /// Evict cached favicons older than `max_age`.
    async fn try_clear_favi_cache(&self, state: &StateHandle, max_age: Duration)
        -> SidewaveResult<()>;

    async fn update_tabs_visibility(&self, state: &StateHandle) -> SidewaveResult<()>;

    async fn update_font_size(&self, state: &StateHandle) -> SidewaveResult<()>;

    // Reconciliation

    async fn update_settings(&self, state: &StateHandle, settings: Value) -> SidewaveResult<()>;

    async fn apply_css_vars(&self, state: &StateHandle, vars: Value) -> SidewaveResult<()>;

    async fn update_panels(&self, state: &StateHandle, panels: Value) -> SidewaveResult<()>;

    async fn apply_custom_css(&self, state: &StateHandle, css: Value) -> SidewaveResult<()>;

    async fn save_panel_index(&self, state: &StateHandle) -> SidewaveResult<()>;

    // Keybindings

    async fn switch_panel(&self, state: &StateHandle, target: PanelTarget) -> SidewaveResult<()>;

    /// A message arrived from the background process.
    async fn on_background_message(
        &self,
        _state: &StateHandle,
        _message: ChannelMessage,
    ) -> SidewaveResult<()> {
        Ok(())
    }
}
