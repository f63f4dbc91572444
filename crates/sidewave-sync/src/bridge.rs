//! Change-notification bridge
//!
//! Receives host events from the subscribed listeners, one at a time and in
//! delivery order, applies the matching reconciliation handler and then
//! runs the resulting actions.

use crate::actions::SidebarActions;
use crate::commands::{CommandContext, CommandRegistry};
use crate::handlers::{self, Effect};
use crate::host::HostEvent;
use crate::state::StateHandle;
use sidewave_core::SidewaveResult;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub struct ChangeBridge {
    state: StateHandle,
    actions: Arc<dyn SidebarActions>,
    commands: Arc<CommandRegistry>,
}

impl ChangeBridge {
    pub fn new(
        state: StateHandle,
        actions: Arc<dyn SidebarActions>,
        commands: Arc<CommandRegistry>,
    ) -> Self {
        Self {
            state,
            actions,
            commands,
        }
    }

    /// Handle one event to completion.
    pub async fn dispatch(&self, event: HostEvent) {
        debug!(kind = %event.kind(), "host event");
        let effects = self.state.update(|state| handlers::reconcile(state, &event));

        for effect in effects {
            self.apply(effect).await;
        }
    }

    /// Process events until every sender is gone.
    pub async fn run(self, mut events: mpsc::UnboundedReceiver<HostEvent>) {
        while let Some(event) = events.recv().await {
            self.dispatch(event).await;
        }
        debug!("host event stream closed");
    }

    async fn apply(&self, effect: Effect) {
        let state = &self.state;
        let (action, result): (&str, SidewaveResult<()>) = match effect {
            Effect::UpdateSettings(value) => (
                "update_settings",
                self.actions.update_settings(state, value).await,
            ),
            Effect::ApplyCssVars(value) => (
                "apply_css_vars",
                self.actions.apply_css_vars(state, value).await,
            ),
            Effect::UpdatePanels(value) => (
                "update_panels",
                self.actions.update_panels(state, value).await,
            ),
            Effect::ApplyCustomCss(value) => (
                "apply_custom_css",
                self.actions.apply_custom_css(state, value).await,
            ),
            Effect::SavePanelIndex => (
                "save_panel_index",
                self.actions.save_panel_index(state).await,
            ),
            Effect::RunCommand(name) => {
                let ctx = CommandContext {
                    state: state.clone(),
                    actions: Arc::clone(&self.actions),
                };
                match self.commands.invoke(&name, ctx).await {
                    Some(result) => ("command", result),
                    None => {
                        debug!(command = %name, "no handler for command");
                        return;
                    }
                }
            }
        };

        if let Err(e) = result {
            warn!(action, error = %e, "reconciliation action failed");
        }
    }
}
