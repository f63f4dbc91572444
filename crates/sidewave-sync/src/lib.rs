//! # Sidewave Sync
//!
//! State synchronisation core of a sidebar instance. One instance runs per
//! browser window and keeps its view of extension state in step with the
//! browser and with every other instance.
//!
//! ## Components
//!
//! - **State** ([`StateHandle`]): the per-instance record of identity,
//!   focus, peer windows and delegated state.
//! - **Startup** ([`StartupSequencer`]): ordered initialization ending in
//!   the control channel to the background process.
//! - **Bridge** ([`ChangeBridge`]): delivers host events, in order, to the
//!   reconciliation [`handlers`].
//! - **Lifecycle** ([`LifecycleManager`]): listener registration and
//!   detach policy.
//! - **Commands** ([`CommandRegistry`]): keybinding handlers.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sidewave_sync::{MemoryHost, SidebarHost, SidebarInstance};
//!
//! let host = Arc::new(MemoryHost::new(WindowRef::new(WindowId(1))));
//! let instance = SidebarInstance::start(
//!     SidebarHost::from_shared(host.clone()),
//!     Arc::new(MyActions::default()),
//!     SidebarConfig::default(),
//! )
//! .await?;
//!
//! host.focus_window(Some(WindowId(1)));
//! ```

pub mod actions;
pub mod bridge;
pub mod channel;
pub mod commands;
pub mod handlers;
pub mod host;
pub mod instance;
pub mod lifecycle;
pub mod startup;
pub mod state;
pub mod storage;

pub use actions::{PanelTarget, SidebarActions};
pub use bridge::ChangeBridge;
pub use channel::{ChannelMessage, ControlPort};
pub use commands::{CommandContext, CommandRegistry};
pub use handlers::Effect;
pub use host::{
    EventHub, EventSink, EventSource, HostEvent, HostEventKind, MemoryHost, RuntimeApi,
    Subscription, WindowsApi,
};
pub use instance::{SidebarHost, SidebarInstance};
pub use lifecycle::LifecycleManager;
pub use startup::{StartupReport, StartupSequencer, StartupStage};
pub use state::{SharedState, StateHandle};
pub use storage::{StorageArea, StorageChange, StorageChanges, StorageKey};
