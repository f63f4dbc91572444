//! Storage change notifications.
//!
//! The persistent key-value store itself belongs to the host. This module
//! only models what a change notification carries and which keys the
//! sidebar reacts to.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Storage area a notification originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageArea {
    /// Per-profile, non-synced store shared by every sidebar instance.
    Local,
    Sync,
    Managed,
    Session,
}

impl fmt::Display for StorageArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageArea::Local => "local",
            StorageArea::Sync => "sync",
            StorageArea::Managed => "managed",
            StorageArea::Session => "session",
        };
        f.write_str(name)
    }
}

/// Old and new value of one changed key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

impl StorageChange {
    pub fn new(old_value: Option<Value>, new_value: Option<Value>) -> Self {
        Self {
            old_value,
            new_value,
        }
    }

    /// Change that only carries a new value.
    pub fn set(new_value: Value) -> Self {
        Self::new(None, Some(new_value))
    }

    /// The new value, `null` when the key was removed.
    pub fn new_value_or_null(&self) -> Value {
        self.new_value.clone().unwrap_or(Value::Null)
    }
}

/// Changed keys of a single notification, in key order.
pub type StorageChanges = BTreeMap<String, StorageChange>;

/// Storage keys the sidebar reconciles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Settings,
    CssVars,
    Panels,
    TabsMenu,
    BookmarksMenu,
    SidebarCss,
}

impl StorageKey {
    /// Reconciliation order within one notification.
    pub const ALL: [StorageKey; 6] = [
        StorageKey::Settings,
        StorageKey::CssVars,
        StorageKey::Panels,
        StorageKey::TabsMenu,
        StorageKey::BookmarksMenu,
        StorageKey::SidebarCss,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StorageKey::Settings => "settings",
            StorageKey::CssVars => "cssVars",
            StorageKey::Panels => "panels",
            StorageKey::TabsMenu => "tabsMenu",
            StorageKey::BookmarksMenu => "bookmarksMenu",
            StorageKey::SidebarCss => "sidebarCSS",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
