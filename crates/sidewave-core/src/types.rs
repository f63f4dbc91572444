//! Common types used throughout Sidewave

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Host-assigned identifier of a browser window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub i64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for WindowId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A browser window known to a sidebar instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRef {
    pub id: WindowId,
    #[serde(default)]
    pub incognito: bool,
    #[serde(default)]
    pub focused: bool,
}

impl WindowRef {
    pub fn new(id: WindowId) -> Self {
        Self {
            id,
            incognito: false,
            focused: false,
        }
    }

    pub fn incognito(mut self, incognito: bool) -> Self {
        self.incognito = incognito;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

/// Kind of extension process talking to the background process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceType {
    #[serde(rename = "bg")]
    Background,
    #[default]
    Sidebar,
    Setup,
    Group,
}

impl InstanceType {
    pub fn as_str(self) -> &'static str {
        match self {
            InstanceType::Background => "bg",
            InstanceType::Sidebar => "sidebar",
            InstanceType::Setup => "setup",
            InstanceType::Group => "group",
        }
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handshake payload carried in the control channel name.
///
/// The background process parses the name back into this record to learn
/// which window the connecting instance belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectInfo {
    pub instance_type: InstanceType,
    pub window_id: WindowId,
}

impl ConnectInfo {
    pub fn new(instance_type: InstanceType, window_id: WindowId) -> Self {
        Self {
            instance_type,
            window_id,
        }
    }

    /// Serialize into a channel name, e.g. `{"instanceType":"sidebar","windowId":3}`
    pub fn channel_name(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_channel_name(name: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(name)
    }
}

/// Operating system facts reported by the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformInfo {
    pub os: String,
    #[serde(default)]
    pub arch: String,
}

/// Browser facts reported by the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserInfo {
    pub name: String,
    #[serde(default)]
    pub vendor: String,
    pub version: String,
    #[serde(default)]
    pub build_id: String,
}

impl BrowserInfo {
    /// Major browser version, 0 when the version string has no numeric prefix
    pub fn major_version(&self) -> u32 {
        parse_major_version(&self.version)
    }
}

/// Parse the leading integer of a version string ("128.0.1" -> 128).
pub fn parse_major_version(version: &str) -> u32 {
    let digits: String = version
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

/// Panel type as stored in the persisted panel layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelKind {
    Bookmarks,
    #[default]
    Default,
    Tabs,
}

/// One entry of the persisted panel layout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PanelConfig {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PanelKind,
    pub name: String,
}

impl PanelConfig {
    pub fn new(id: impl Into<String>, kind: PanelKind) -> Self {
        Self {
            id: id.into(),
            kind,
            name: String::new(),
        }
    }
}

/// Browser tab metadata as seen by the sidebar
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TabEntry {
    pub id: i64,
    pub window_id: Option<WindowId>,
    pub panel_id: Option<String>,
    pub url: String,
    pub title: String,
    pub pinned: bool,
    pub active: bool,
    pub hidden: bool,
}

/// Where pinned tabs are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinnedTabsPosition {
    #[default]
    Panel,
    Top,
    Left,
    Right,
}

/// User settings persisted under the `settings` storage key.
///
/// Only the fields the synchronisation core reads are typed; everything
/// else is kept verbatim in `extra` so a round trip never drops data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub theme: String,
    pub bookmarks_panel: bool,
    pub pinned_tabs_position: PinnedTabsPosition,
    pub font_size: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: "default".to_string(),
            bookmarks_panel: true,
            pinned_tabs_position: PinnedTabsPosition::Panel,
            font_size: None,
            extra: Map::new(),
        }
    }
}

impl Settings {
    pub fn has_custom_theme(&self) -> bool {
        self.theme != "default"
    }
}
