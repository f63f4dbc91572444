//! Reconciliation handlers
//!
//! One handler per host event category. Each applies its mutation to the
//! [`SharedState`] synchronously and returns the follow-up actions the
//! bridge should run, so the record is consistent before any action
//! suspends.
//!
//! | Event | Guard | Effect |
//! |---|---|---|
//! | window created | not self | append to `other_windows`, once per id |
//! | window removed | not self, list present | remove by id |
//! | focus changed | none | `window_focused`, save panel index when focused |
//! | storage changed | local area | per key, see [`on_storage_changed`] |
//! | command | focused | run `kb_<name>` |

use crate::host::HostEvent;
use crate::state::SharedState;
use crate::storage::{StorageArea, StorageChanges, StorageKey};
use serde_json::Value;
use sidewave_core::types::{WindowId, WindowRef};
use tracing::{debug, trace};

/// Follow-up work produced by a handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    UpdateSettings(Value),
    ApplyCssVars(Value),
    UpdatePanels(Value),
    ApplyCustomCss(Value),
    SavePanelIndex,
    RunCommand(String),
}

/// Route an event to its handler.
pub fn reconcile(state: &mut SharedState, event: &HostEvent) -> Vec<Effect> {
    match event {
        HostEvent::WindowCreated { window } => on_window_created(state, window),
        HostEvent::WindowRemoved { window_id } => on_window_removed(state, *window_id),
        HostEvent::FocusChanged { window_id } => on_focus_changed(state, *window_id),
        HostEvent::StorageChanged { area, changes } => on_storage_changed(state, *area, changes),
        HostEvent::Command { name } => on_command(state, name),
    }
}

/// Append `window` to `other_windows`, creating the list if needed.
///
/// An id that is already tracked is not appended again, even though the
/// host may announce it twice (once through the initial listing, once
/// through the created event). A duplicate entry would survive the
/// window's removal, since removal drops only the first match.
pub fn on_window_created(state: &mut SharedState, window: &WindowRef) -> Vec<Effect> {
    if state.is_self(window.id) {
        return Vec::new();
    }

    let others = state.other_windows.get_or_insert_with(Vec::new);
    if others.iter().any(|w| w.id == window.id) {
        debug!(window_id = %window.id, "window already tracked");
        return Vec::new();
    }
    others.push(window.clone());
    Vec::new()
}

pub fn on_window_removed(state: &mut SharedState, window_id: WindowId) -> Vec<Effect> {
    if state.is_self(window_id) {
        return Vec::new();
    }

    match state.other_windows.as_mut() {
        Some(others) => {
            if let Some(index) = others.iter().position(|w| w.id == window_id) {
                others.remove(index);
            }
        }
        None => debug!(%window_id, "window list not loaded yet, ignoring removal"),
    }
    Vec::new()
}

pub fn on_focus_changed(state: &mut SharedState, window_id: Option<WindowId>) -> Vec<Effect> {
    let focused = window_id.is_some_and(|id| state.is_self(id));
    state.window_focused = focused;

    if state.window_focused {
        vec![Effect::SavePanelIndex]
    } else {
        Vec::new()
    }
}

/// Reconcile a storage notification.
///
/// Only the local area is considered. Keys are handled independently:
/// `settings`, `cssVars` and `sidebarCSS` go to their actions,
/// `tabsMenu` and `bookmarksMenu` are assigned directly, and `panels` is
/// applied only while this instance is neither focused nor private, so
/// the window being edited never takes back its own write and private
/// windows keep their own layout. Unknown keys are ignored.
pub fn on_storage_changed(
    state: &mut SharedState,
    area: StorageArea,
    changes: &StorageChanges,
) -> Vec<Effect> {
    if area != StorageArea::Local {
        return Vec::new();
    }

    let mut effects = Vec::new();
    for key in StorageKey::ALL {
        let Some(change) = changes.get(key.as_str()) else {
            continue;
        };
        let value = change.new_value_or_null();

        match key {
            StorageKey::Settings => effects.push(Effect::UpdateSettings(value)),
            StorageKey::CssVars => effects.push(Effect::ApplyCssVars(value)),
            StorageKey::Panels => {
                if !state.window_focused && !state.is_private() {
                    effects.push(Effect::UpdatePanels(value));
                } else {
                    debug!(
                        focused = state.window_focused,
                        private = state.is_private(),
                        "keeping local panel layout"
                    );
                }
            }
            StorageKey::TabsMenu => state.tabs_menu = change.new_value.clone(),
            StorageKey::BookmarksMenu => state.bookmarks_menu = change.new_value.clone(),
            StorageKey::SidebarCss => effects.push(Effect::ApplyCustomCss(value)),
        }
    }

    for key in changes.keys().filter(|k| StorageKey::parse(k).is_none()) {
        trace!(%key, "ignoring storage key");
    }
    effects
}

pub fn on_command(state: &mut SharedState, name: &str) -> Vec<Effect> {
    if !state.window_focused {
        debug!(command = name, "ignoring command for unfocused window");
        return Vec::new();
    }
    vec![Effect::RunCommand(name.to_string())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageChange;
    use serde_json::json;

    fn state_for(window: i64) -> SharedState {
        let mut state = SharedState::new();
        state.set_identity(WindowId(window), false).unwrap();
        state
    }

    fn local(changes: &[(&str, Value)]) -> StorageChanges {
        changes
            .iter()
            .map(|(k, v)| (k.to_string(), StorageChange::set(v.clone())))
            .collect()
    }

    fn other_ids(state: &SharedState) -> Vec<i64> {
        state
            .other_windows
            .as_ref()
            .map(|w| w.iter().map(|w| w.id.0).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_created_initializes_list() {
        let mut state = state_for(1);
        assert!(state.other_windows.is_none());

        on_window_created(&mut state, &WindowRef::new(WindowId(2)));
        on_window_created(&mut state, &WindowRef::new(WindowId(3)));
        assert_eq!(other_ids(&state), vec![2, 3]);
    }

    #[test]
    fn test_created_self_is_ignored() {
        let mut state = state_for(1);
        on_window_created(&mut state, &WindowRef::new(WindowId(1)));
        assert!(state.other_windows.is_none());

        state.other_windows = Some(vec![WindowRef::new(WindowId(4))]);
        on_window_created(&mut state, &WindowRef::new(WindowId(1)));
        assert_eq!(other_ids(&state), vec![4]);
    }

    #[test]
    fn test_created_twice_tracked_once() {
        let mut state = state_for(1);
        on_window_created(&mut state, &WindowRef::new(WindowId(2)));
        on_window_created(&mut state, &WindowRef::new(WindowId(2)));
        assert_eq!(other_ids(&state), vec![2]);
    }

    #[test]
    fn test_removed_drops_entry() {
        let mut state = state_for(1);
        state.set_other_windows(vec![
            WindowRef::new(WindowId(2)),
            WindowRef::new(WindowId(3)),
        ]);

        on_window_removed(&mut state, WindowId(2));
        assert_eq!(other_ids(&state), vec![3]);

        // Unknown id leaves the list alone
        on_window_removed(&mut state, WindowId(9));
        assert_eq!(other_ids(&state), vec![3]);
    }

    #[test]
    fn test_removed_without_list_is_noop() {
        let mut state = state_for(1);
        on_window_removed(&mut state, WindowId(2));
        assert!(state.other_windows.is_none());
    }

    #[test]
    fn test_removed_self_is_ignored() {
        let mut state = state_for(1);
        state.other_windows = Some(vec![WindowRef::new(WindowId(2))]);
        on_window_removed(&mut state, WindowId(1));
        assert_eq!(other_ids(&state), vec![2]);
    }

    #[test]
    fn test_focus_is_last_write_wins() {
        let mut state = state_for(1);

        assert_eq!(
            on_focus_changed(&mut state, Some(WindowId(1))),
            vec![Effect::SavePanelIndex]
        );
        assert!(state.window_focused);

        assert!(on_focus_changed(&mut state, Some(WindowId(2))).is_empty());
        assert!(!state.window_focused);

        on_focus_changed(&mut state, Some(WindowId(1)));
        assert!(on_focus_changed(&mut state, None).is_empty());
        assert!(!state.window_focused);
    }

    #[test]
    fn test_focus_before_identity_is_unfocused() {
        let mut state = SharedState::new();
        assert!(on_focus_changed(&mut state, Some(WindowId(1))).is_empty());
        assert!(!state.window_focused);
    }

    #[test]
    fn test_storage_ignores_other_areas() {
        let mut state = state_for(1);
        let changes = local(&[("settings", json!({})), ("tabsMenu", json!(["a"]))]);

        for area in [StorageArea::Sync, StorageArea::Managed, StorageArea::Session] {
            assert!(on_storage_changed(&mut state, area, &changes).is_empty());
        }
        assert!(state.tabs_menu.is_none());
    }

    #[test]
    fn test_storage_dispatches_each_key() {
        let mut state = state_for(1);
        let changes = local(&[
            ("settings", json!({"theme": "dark"})),
            ("cssVars", json!({"bg": "#000"})),
            ("panels", json!([{"type": "tabs"}])),
            ("tabsMenu", json!(["reload"])),
            ("bookmarksMenu", json!(["open"])),
            ("sidebarCSS", json!(".tab{}")),
            ("favicons", json!({})),
        ]);

        let effects = on_storage_changed(&mut state, StorageArea::Local, &changes);
        assert_eq!(
            effects,
            vec![
                Effect::UpdateSettings(json!({"theme": "dark"})),
                Effect::ApplyCssVars(json!({"bg": "#000"})),
                Effect::UpdatePanels(json!([{"type": "tabs"}])),
                Effect::ApplyCustomCss(json!(".tab{}")),
            ]
        );
        assert_eq!(state.tabs_menu, Some(json!(["reload"])));
        assert_eq!(state.bookmarks_menu, Some(json!(["open"])));
    }

    #[test]
    fn test_panels_guarded_while_focused() {
        let mut state = state_for(1);
        state.window_focused = true;
        let changes = local(&[("panels", json!([]))]);
        assert!(on_storage_changed(&mut state, StorageArea::Local, &changes).is_empty());
    }

    #[test]
    fn test_panels_guarded_in_private_window() {
        let mut state = SharedState::new();
        state.set_identity(WindowId(1), true).unwrap();
        let changes = local(&[("panels", json!([]))]);
        assert!(on_storage_changed(&mut state, StorageArea::Local, &changes).is_empty());
    }

    #[test]
    fn test_storage_is_idempotent() {
        let mut once = state_for(1);
        let mut twice = state_for(1);
        let changes = local(&[("tabsMenu", json!(["a", "b"])), ("bookmarksMenu", json!([]))]);

        let first = on_storage_changed(&mut once, StorageArea::Local, &changes);
        on_storage_changed(&mut twice, StorageArea::Local, &changes);
        let second = on_storage_changed(&mut twice, StorageArea::Local, &changes);

        assert_eq!(first, second);
        assert_eq!(once.tabs_menu, twice.tabs_menu);
        assert_eq!(once.bookmarks_menu, twice.bookmarks_menu);
    }

    #[test]
    fn test_command_requires_focus() {
        let mut state = state_for(1);
        assert!(on_command(&mut state, "scroll_to_active_tab").is_empty());

        state.window_focused = true;
        assert_eq!(
            on_command(&mut state, "scroll_to_active_tab"),
            vec![Effect::RunCommand("scroll_to_active_tab".into())]
        );
    }

    #[test]
    fn test_reconcile_routes_events() {
        let mut state = state_for(1);
        let effects = reconcile(
            &mut state,
            &HostEvent::FocusChanged {
                window_id: Some(WindowId(1)),
            },
        );
        assert_eq!(effects, vec![Effect::SavePanelIndex]);
    }
}
