//! Sidebar instance
//!
//! Wires the state store, the change bridge, the lifecycle manager and the
//! startup sequencer together for one sidebar window.

use crate::actions::SidebarActions;
use crate::bridge::ChangeBridge;
use crate::commands::CommandRegistry;
use crate::host::{EventSource, HostEventKind, RuntimeApi, WindowsApi};
use crate::lifecycle::LifecycleManager;
use crate::startup::{StartupReport, StartupSequencer};
use crate::state::StateHandle;
use sidewave_core::{SidebarConfig, SidewaveResult};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// The host APIs an instance talks to.
#[derive(Clone)]
pub struct SidebarHost {
    pub windows: Arc<dyn WindowsApi>,
    pub runtime: Arc<dyn RuntimeApi>,
    pub events: Arc<dyn EventSource>,
}

impl SidebarHost {
    /// Use one object for every host API.
    pub fn from_shared<H>(host: Arc<H>) -> Self
    where
        H: WindowsApi + RuntimeApi + EventSource + 'static,
    {
        Self {
            windows: host.clone(),
            runtime: host.clone(),
            events: host,
        }
    }
}

/// A started sidebar.
pub struct SidebarInstance {
    state: StateHandle,
    lifecycle: LifecycleManager,
    report: StartupReport,
    tasks: Vec<JoinHandle<()>>,
}

impl SidebarInstance {
    /// Start with the built-in command handlers.
    pub async fn start(
        host: SidebarHost,
        actions: Arc<dyn SidebarActions>,
        config: SidebarConfig,
    ) -> SidewaveResult<Self> {
        Self::start_with_commands(host, actions, config, CommandRegistry::with_defaults()).await
    }

    /// Start the sidebar: subscribe to host events, run the startup
    /// sequence and begin watching font size and background messages.
    ///
    /// On a startup failure every listener is closed and every task
    /// stopped before the error is returned.
    pub async fn start_with_commands(
        host: SidebarHost,
        actions: Arc<dyn SidebarActions>,
        config: SidebarConfig,
        commands: CommandRegistry,
    ) -> SidewaveResult<Self> {
        if let Err(e) = commands.validate(&config.commands) {
            warn!(error = %e, "command registry incomplete");
        }

        let state = StateHandle::default();
        let (sink, events) = mpsc::unbounded_channel();
        let bridge = ChangeBridge::new(state.clone(), Arc::clone(&actions), Arc::new(commands));
        let mut tasks = vec![tokio::spawn(bridge.run(events))];

        let mut lifecycle = LifecycleManager::new(host.events, sink, config.detach_policy);
        let mut sequencer = StartupSequencer::new(
            state.clone(),
            host.windows,
            host.runtime,
            Arc::clone(&actions),
            config,
        );

        let result = sequencer.run(&mut lifecycle).await;
        tasks.extend(sequencer.take_tasks());

        let report = match result {
            Ok(report) => report,
            Err(e) => {
                warn!(
                    error = %e,
                    completed = ?sequencer.report().stages,
                    "sidebar startup failed"
                );
                lifecycle.close_all();
                for task in &tasks {
                    task.abort();
                }
                return Err(e);
            }
        };

        tasks.push(spawn_font_size_watcher(state.clone(), Arc::clone(&actions)));
        if let Some(task) = spawn_background_listener(state.clone(), actions) {
            tasks.push(task);
        }

        Ok(Self {
            state,
            lifecycle,
            report,
            tasks,
        })
    }

    pub fn state(&self) -> &StateHandle {
        &self.state
    }

    pub fn report(&self) -> &StartupReport {
        &self.report
    }

    /// Kinds with an open host listener.
    pub fn registered_kinds(&self) -> Vec<HostEventKind> {
        self.lifecycle.registered_kinds()
    }

    /// Detach listeners according to the configured policy.
    pub fn deactivate(&mut self) -> Vec<HostEventKind> {
        let closed = self.lifecycle.deactivate();
        info!(closed = closed.len(), "sidebar deactivated");
        closed
    }

    /// Re-register listeners closed by [`deactivate`](Self::deactivate).
    pub fn reactivate(&mut self) -> Vec<HostEventKind> {
        self.lifecycle.activate()
    }

    /// Close every listener, the control channel and all background tasks.
    pub fn shutdown(mut self) {
        self.lifecycle.close_all();
        if let Some(port) = self.state.background() {
            port.close();
        }
        self.abort_tasks();
        info!("sidebar shut down");
    }

    fn abort_tasks(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for SidebarInstance {
    fn drop(&mut self) {
        self.abort_tasks();
    }
}

impl std::fmt::Debug for SidebarInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SidebarInstance")
            .field("state", &self.state)
            .field("lifecycle", &self.lifecycle)
            .field("report", &self.report)
            .finish()
    }
}

/// Run `update_font_size` now and on every font size change.
fn spawn_font_size_watcher(state: StateHandle, actions: Arc<dyn SidebarActions>) -> JoinHandle<()> {
    let mut font_size = state.watch_font_size();
    tokio::spawn(async move {
        loop {
            if let Err(e) = actions.update_font_size(&state).await {
                warn!(error = %e, "font size update failed");
            }
            if font_size.changed().await.is_err() {
                break;
            }
        }
    })
}

/// Hand background messages to the action library.
fn spawn_background_listener(
    state: StateHandle,
    actions: Arc<dyn SidebarActions>,
) -> Option<JoinHandle<()>> {
    let port = state.background()?;
    Some(tokio::spawn(async move {
        while let Some(message) = port.recv().await {
            debug!(action = %message.action, "background message");
            if let Err(e) = actions.on_background_message(&state, message).await {
                warn!(error = %e, "background message handling failed");
            }
        }
        debug!("control channel closed");
    }))
}
