//! Startup sequencer
//!
//! Brings a sidebar instance from "just loaded" to "connected":
//!
//! ```text
//! EnvironmentProbe      platform + browser info         spawned
//! ListenersRegistered   host event subscriptions
//! InstanceTagged        instance_type
//! IdentityResolved      current window, window list     list spawned
//! SettingsLoaded        settings, theme, custom css     -> SettingsReady
//! PanelsLoaded          panel index, panels             -> PanelsReady
//! BookmarksLoaded       bookmarks (bookmarks panel only)
//! ContentLoaded         tabs, context menu, css vars    -> ContentReady
//! SideEffectsTriggered  scroll, keybindings, favicons   spawned
//! ChannelOpened         control channel to background
//! ```
//!
//! Each blocking stage takes the token returned by the one before it, and
//! only [`ContentReady`] can open the channel. A failing blocking stage
//! ends the sequence with an error.

use crate::actions::SidebarActions;
use crate::channel::ControlPort;
use crate::host::{RuntimeApi, WindowsApi};
use crate::lifecycle::LifecycleManager;
use crate::state::StateHandle;
use futures::future::{BoxFuture, FutureExt};
use sidewave_core::types::{ConnectInfo, PanelKind, WindowId};
use sidewave_core::{SidebarConfig, SidewaveResult};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Named startup steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StartupStage {
    EnvironmentProbe,
    ListenersRegistered,
    InstanceTagged,
    IdentityResolved,
    SettingsLoaded,
    PanelsLoaded,
    BookmarksLoaded,
    ContentLoaded,
    SideEffectsTriggered,
    ChannelOpened,
}

impl StartupStage {
    pub fn as_str(self) -> &'static str {
        match self {
            StartupStage::EnvironmentProbe => "environment_probe",
            StartupStage::ListenersRegistered => "listeners_registered",
            StartupStage::InstanceTagged => "instance_tagged",
            StartupStage::IdentityResolved => "identity_resolved",
            StartupStage::SettingsLoaded => "settings_loaded",
            StartupStage::PanelsLoaded => "panels_loaded",
            StartupStage::BookmarksLoaded => "bookmarks_loaded",
            StartupStage::ContentLoaded => "content_loaded",
            StartupStage::SideEffectsTriggered => "side_effects_triggered",
            StartupStage::ChannelOpened => "channel_opened",
        }
    }
}

impl fmt::Display for StartupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The resolved window identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    window_id: WindowId,
    private: bool,
}

impl Identity {
    pub fn window_id(&self) -> WindowId {
        self.window_id
    }

    pub fn is_private(&self) -> bool {
        self.private
    }
}

/// Settings are loaded.
#[derive(Debug)]
pub struct SettingsReady {
    identity: Identity,
}

/// Panel index and panel list are loaded.
#[derive(Debug)]
pub struct PanelsReady {
    identity: Identity,
}

/// Every blocking load has completed.
#[derive(Debug)]
pub struct ContentReady {
    identity: Identity,
}

impl ContentReady {
    pub fn identity(&self) -> Identity {
        self.identity
    }
}

/// Stages completed, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupReport {
    pub stages: Vec<StartupStage>,
}

impl StartupReport {
    pub fn contains(&self, stage: StartupStage) -> bool {
        self.stages.contains(&stage)
    }

    /// Whether the control channel was opened.
    pub fn is_complete(&self) -> bool {
        self.contains(StartupStage::ChannelOpened)
    }
}

fn log_failure(action: &str, result: SidewaveResult<()>) {
    if let Err(e) = result {
        warn!(action, error = %e, "best-effort startup step failed");
    }
}

pub struct StartupSequencer {
    state: StateHandle,
    windows: Arc<dyn WindowsApi>,
    runtime: Arc<dyn RuntimeApi>,
    actions: Arc<dyn SidebarActions>,
    config: SidebarConfig,
    report: StartupReport,
    tasks: Vec<JoinHandle<()>>,
}

impl StartupSequencer {
    pub fn new(
        state: StateHandle,
        windows: Arc<dyn WindowsApi>,
        runtime: Arc<dyn RuntimeApi>,
        actions: Arc<dyn SidebarActions>,
        config: SidebarConfig,
    ) -> Self {
        Self {
            state,
            windows,
            runtime,
            actions,
            config,
            report: StartupReport::default(),
            tasks: Vec::new(),
        }
    }

    /// Run every stage in order.
    pub async fn run(&mut self, lifecycle: &mut LifecycleManager) -> SidewaveResult<StartupReport> {
        self.probe_environment();
        self.register_listeners(lifecycle);
        self.tag_instance();

        let identity = self.resolve_identity().await?;
        let settings = self.load_settings(identity).await?;
        let panels = self.load_panels(settings).await?;
        let content = self.load_content(panels).await?;

        self.trigger_side_effects(&content);
        self.open_channel(content).await?;

        info!(
            window_id = ?self.state.window_id(),
            stages = self.report.stages.len(),
            "sidebar started"
        );
        Ok(self.report.clone())
    }

    /// Stages completed so far.
    pub fn report(&self) -> &StartupReport {
        &self.report
    }

    /// Background tasks spawned by the fire-and-forget stages.
    pub fn take_tasks(&mut self) -> Vec<JoinHandle<()>> {
        std::mem::take(&mut self.tasks)
    }

    fn complete(&mut self, stage: StartupStage) {
        debug!(%stage, "startup stage complete");
        self.report.stages.push(stage);
    }

    /// Fetch platform and browser info without waiting for either.
    pub fn probe_environment(&mut self) {
        let runtime = Arc::clone(&self.runtime);
        let state = self.state.clone();
        self.tasks.push(tokio::spawn(async move {
            match runtime.platform_info().await {
                Ok(info) => state.update(|s| s.set_platform_info(info)),
                Err(e) => warn!(error = %e, "platform info unavailable"),
            }
        }));

        let runtime = Arc::clone(&self.runtime);
        let state = self.state.clone();
        self.tasks.push(tokio::spawn(async move {
            match runtime.browser_info().await {
                Ok(info) => state.update(|s| s.set_browser_info(info)),
                Err(e) => warn!(error = %e, "browser info unavailable, version defaults to 0"),
            }
        }));

        self.complete(StartupStage::EnvironmentProbe);
    }

    pub fn register_listeners(&mut self, lifecycle: &mut LifecycleManager) {
        lifecycle.activate();
        self.complete(StartupStage::ListenersRegistered);
    }

    pub fn tag_instance(&mut self) {
        let instance_type = self.config.instance_type;
        self.state.update(|s| s.set_instance_type(instance_type));
        self.complete(StartupStage::InstanceTagged);
    }

    /// Resolve the current window and request the full window list.
    pub async fn resolve_identity(&mut self) -> SidewaveResult<Identity> {
        let current = self.windows.get_current().await?;
        let identity = Identity {
            window_id: current.id,
            private: current.incognito,
        };
        self.state
            .update(|s| s.set_identity(identity.window_id, identity.private))?;

        let windows = Arc::clone(&self.windows);
        let state = self.state.clone();
        self.tasks.push(tokio::spawn(async move {
            match windows.get_all().await {
                Ok(all) => state.update(|s| s.set_other_windows(all)),
                Err(e) => warn!(error = %e, "window list unavailable"),
            }
        }));

        debug!(window_id = %identity.window_id, private = identity.private, "identity resolved");
        self.complete(StartupStage::IdentityResolved);
        Ok(identity)
    }

    /// Load settings, then apply the theme and custom style sheet they ask for.
    pub async fn load_settings(&mut self, identity: Identity) -> SidewaveResult<SettingsReady> {
        self.actions.load_settings(&self.state).await?;

        let (custom_theme, custom_css) = self.state.read(|s| {
            (
                s.settings.has_custom_theme(),
                s.sidebar_css.as_deref().is_some_and(|css| !css.is_empty()),
            )
        });
        if custom_theme {
            log_failure("init_theme", self.actions.init_theme(&self.state).await);
        }
        if custom_css {
            log_failure("load_custom_css", self.actions.load_custom_css(&self.state).await);
        }

        self.complete(StartupStage::SettingsLoaded);
        Ok(SettingsReady { identity })
    }

    pub async fn load_panels(&mut self, ready: SettingsReady) -> SidewaveResult<PanelsReady> {
        self.actions.load_panel_index(&self.state).await?;
        self.actions.load_panels(&self.state).await?;
        self.complete(StartupStage::PanelsLoaded);
        Ok(PanelsReady {
            identity: ready.identity,
        })
    }

    /// Load bookmarks when the active panel shows them, then tabs, context
    /// menu and CSS variables.
    pub async fn load_content(&mut self, ready: PanelsReady) -> SidewaveResult<ContentReady> {
        let wants_bookmarks = self.state.read(|s| {
            s.settings.bookmarks_panel
                && s.active_panel()
                    .is_some_and(|panel| panel.kind == PanelKind::Bookmarks)
        });
        if wants_bookmarks {
            self.actions.load_bookmarks(&self.state).await?;
            self.complete(StartupStage::BookmarksLoaded);
        }

        self.actions.load_tabs(&self.state).await?;
        self.actions.load_ctx_menu(&self.state).await?;
        self.actions.load_css_vars(&self.state).await?;
        self.complete(StartupStage::ContentLoaded);
        Ok(ContentReady {
            identity: ready.identity,
        })
    }

    /// Start each best-effort follow-up in its own task, so a stalled one
    /// never holds back the others.
    pub fn trigger_side_effects(&mut self, _ready: &ContentReady) {
        let max_age = Duration::from_secs(self.config.favicon_max_age_secs);

        self.spawn_side_effect("scroll_to_active_tab", |actions, state| {
            async move { actions.scroll_to_active_tab(&state).await }.boxed()
        });
        self.spawn_side_effect("load_keybindings", |actions, state| {
            async move { actions.load_keybindings(&state).await }.boxed()
        });
        self.spawn_side_effect("load_favicons", |actions, state| {
            async move { actions.load_favicons(&state).await }.boxed()
        });
        self.spawn_side_effect("load_permissions", |actions, state| {
            async move { actions.load_permissions(&state).await }.boxed()
        });
        self.spawn_side_effect("try_clear_favi_cache", move |actions, state| {
            async move { actions.try_clear_favi_cache(&state, max_age).await }.boxed()
        });
        self.spawn_side_effect("update_tabs_visibility", |actions, state| {
            async move { actions.update_tabs_visibility(&state).await }.boxed()
        });

        self.complete(StartupStage::SideEffectsTriggered);
    }

    fn spawn_side_effect<F>(&mut self, action: &'static str, effect: F)
    where
        F: FnOnce(Arc<dyn SidebarActions>, StateHandle) -> BoxFuture<'static, SidewaveResult<()>>,
    {
        let run = effect(Arc::clone(&self.actions), self.state.clone());
        self.tasks.push(tokio::spawn(async move {
            log_failure(action, run.await);
        }));
    }

    /// Connect to the background process, tagged with this instance.
    pub async fn open_channel(&mut self, ready: ContentReady) -> SidewaveResult<ControlPort> {
        let info = ConnectInfo::new(self.config.instance_type, ready.identity.window_id);
        let name = info.channel_name()?;
        let port = self.runtime.connect(&name).await?;
        self.state.update(|s| s.attach_background(port.clone()))?;

        debug!(channel = %name, "control channel open");
        self.complete(StartupStage::ChannelOpened);
        Ok(port)
    }
}

impl fmt::Debug for StartupSequencer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StartupSequencer")
            .field("config", &self.config)
            .field("report", &self.report)
            .finish()
    }
}
