//! Keybinding command registry.
//!
//! Host commands are looked up under a `kb_` key in an explicit table built
//! at startup. The table can be checked against the commands the manifest
//! declares, so a missing handler shows up when the sidebar starts rather
//! than as a silently ignored key press.

use crate::actions::{PanelTarget, SidebarActions};
use crate::state::StateHandle;
use futures::future::BoxFuture;
use sidewave_core::{SidewaveError, SidewaveResult};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// Prefix of every handler key.
pub const COMMAND_PREFIX: &str = "kb_";

/// Number of `switch_to_panel_N` commands.
const PANEL_SWITCH_COMMANDS: usize = 10;

/// Handler key for a host command name.
pub fn handler_key(command: &str) -> String {
    format!("{}{}", COMMAND_PREFIX, command)
}

/// What a command handler gets to work with.
#[derive(Clone)]
pub struct CommandContext {
    pub state: StateHandle,
    pub actions: Arc<dyn SidebarActions>,
}

type CommandHandler =
    Arc<dyn Fn(CommandContext) -> BoxFuture<'static, SidewaveResult<()>> + Send + Sync>;

/// Mapping from `kb_<command>` keys to handlers.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    handlers: HashMap<String, CommandHandler>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in keybinding handlers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register("scroll_to_active_tab", |ctx| async move {
            ctx.actions.scroll_to_active_tab(&ctx.state).await
        });
        registry.register("next_panel", |ctx| async move {
            ctx.actions.switch_panel(&ctx.state, PanelTarget::Next).await
        });
        registry.register("prev_panel", |ctx| async move {
            ctx.actions
                .switch_panel(&ctx.state, PanelTarget::Previous)
                .await
        });
        for index in 0..PANEL_SWITCH_COMMANDS {
            registry.register(&format!("switch_to_panel_{}", index), move |ctx| async move {
                ctx.actions
                    .switch_panel(&ctx.state, PanelTarget::Index(index))
                    .await
            });
        }

        registry
    }

    /// Register `handler` for the host command `command`, replacing any
    /// previous handler.
    pub fn register<F, Fut>(&mut self, command: &str, handler: F)
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = SidewaveResult<()>> + Send + 'static,
    {
        let handler: CommandHandler =
            Arc::new(move |ctx| -> BoxFuture<'static, SidewaveResult<()>> {
                Box::pin(handler(ctx))
            });
        self.handlers.insert(handler_key(command), handler);
    }

    /// Whether a handler exists for the host command `command`.
    pub fn contains(&self, command: &str) -> bool {
        self.handlers.contains_key(&handler_key(command))
    }

    /// Registered handler keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.handlers.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Check that every declared command has a handler.
    pub fn validate<S: AsRef<str>>(&self, declared: &[S]) -> SidewaveResult<()> {
        let missing: Vec<String> = declared
            .iter()
            .map(|command| command.as_ref())
            .filter(|command| !self.contains(command))
            .map(str::to_string)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(SidewaveError::UnknownCommands(missing))
        }
    }

    /// Run the handler for `command`. Returns `None` when there is none.
    pub async fn invoke(
        &self,
        command: &str,
        ctx: CommandContext,
    ) -> Option<SidewaveResult<()>> {
        let handler = self.handlers.get(&handler_key(command))?.clone();
        Some(handler(ctx).await)
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}
