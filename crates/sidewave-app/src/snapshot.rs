//! JSON rendering of a sidebar's state.

use serde_json::{json, Value};
use sidewave_sync::{SharedState, StartupReport};

pub fn render(state: &SharedState, report: &StartupReport) -> Value {
    let pinned = match state.pinned_tabs_position() {
        Some(position) => json!(position),
        None => json!("none"),
    };
    let stages: Vec<&str> = report.stages.iter().map(|s| s.as_str()).collect();

    json!({
        "windowId": state.window_id(),
        "private": state.is_private(),
        "instanceType": state.instance_type(),
        "windowFocused": state.window_focused,
        "otherWindows": state.other_windows,
        "os": state.os,
        "ffVer": state.ff_ver,
        "connected": state.background().is_some(),
        "settings": state.settings,
        "sidebarCSS": state.sidebar_css,
        "cssVars": state.css_vars,
        "panels": state.panels,
        "panelIndex": state.panel_index,
        "tabs": state.tabs.len(),
        "pinnedTabsPosition": pinned,
        "tabsMenu": state.tabs_menu,
        "bookmarksMenu": state.bookmarks_menu,
        "fontSize": state.font_size,
        "stages": stages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sidewave_core::types::{PinnedTabsPosition, TabEntry, WindowId};

    #[test]
    fn test_pinned_position_rendering() {
        let mut state = SharedState::new();
        state.set_identity(WindowId(6), false).unwrap();
        let report = StartupReport::default();

        let value = render(&state, &report);
        assert_eq!(value["windowId"], json!(6));
        assert_eq!(value["pinnedTabsPosition"], json!("none"));
        assert_eq!(value["otherWindows"], Value::Null);

        state.settings.pinned_tabs_position = PinnedTabsPosition::Left;
        state.set_tabs(vec![TabEntry {
            id: 1,
            pinned: true,
            ..Default::default()
        }]);
        assert_eq!(render(&state, &report)["pinnedTabsPosition"], json!("left"));
    }
}
