//! Sidebar configuration

use crate::error::{SidewaveError, SidewaveResult};
use crate::types::InstanceType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the configuration inside the data directory
pub const CONFIG_FILE_NAME: &str = "sidewave.json";

/// Commands declared by the extension manifest
pub const MANIFEST_COMMANDS: &[&str] = &[
    "scroll_to_active_tab",
    "next_panel",
    "prev_panel",
    "switch_to_panel_0",
    "switch_to_panel_1",
    "switch_to_panel_2",
    "switch_to_panel_3",
    "switch_to_panel_4",
    "switch_to_panel_5",
    "switch_to_panel_6",
    "switch_to_panel_7",
    "switch_to_panel_8",
    "switch_to_panel_9",
];

/// What a deactivating sidebar does with its host subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetachPolicy {
    /// Close focus, storage and command subscriptions; keep tracking
    /// window creation and removal.
    #[default]
    PreserveWindowTracking,
    /// Close every subscription.
    DetachAll,
}

/// Sidebar configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SidebarConfig {
    /// Tag sent to the background process in the channel handshake
    pub instance_type: InstanceType,

    /// Cached favicons older than this are evicted after startup
    pub favicon_max_age_secs: u64,

    /// Subscription handling on deactivation
    pub detach_policy: DetachPolicy,

    /// Command names the host may deliver
    pub commands: Vec<String>,

    /// Log filter directives, e.g. "sidewave_sync=debug"
    pub log_filter: Option<String>,
}

impl Default for SidebarConfig {
    fn default() -> Self {
        Self {
            instance_type: InstanceType::Sidebar,
            favicon_max_age_secs: 86_400, // 24 hours
            detach_policy: DetachPolicy::default(),
            commands: MANIFEST_COMMANDS.iter().map(|c| c.to_string()).collect(),
            log_filter: None,
        }
    }
}

impl SidebarConfig {
    /// Default location of the configuration file
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sidewave")
            .join(CONFIG_FILE_NAME)
    }

    /// Load configuration from file, falling back to defaults
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("Ignoring malformed config {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Failed to read config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> SidewaveResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)
            .map_err(|e| SidewaveError::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, data)?;
        Ok(())
    }
}
