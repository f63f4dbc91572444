//! Control channel between a sidebar instance and the background process.
//!
//! ```text
//! sidebar                                   background
//!   ControlPort ◄──── ChannelMessage ────►  ControlPort
//!   name = {"instanceType":"sidebar","windowId":N}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sidewave_core::types::ConnectInfo;
use sidewave_core::{SidewaveError, SidewaveResult};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};

/// A message exchanged over the control channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub action: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Value>,
}

impl ChannelMessage {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(action: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            action: action.into(),
            args,
        }
    }
}

/// One end of a named, bidirectional control channel.
///
/// Both ends and all their clones share one closed flag: closing any of
/// them closes the channel and wakes every pending [`recv`](Self::recv).
#[derive(Debug, Clone)]
pub struct ControlPort {
    name: Arc<str>,
    tx: mpsc::UnboundedSender<ChannelMessage>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<ChannelMessage>>>,
    closed: Arc<watch::Sender<bool>>,
}

impl ControlPort {
    /// Create an entangled pair of ports sharing one name.
    pub fn pair(name: impl Into<String>) -> (Self, Self) {
        let name: Arc<str> = Arc::from(name.into());
        let (tx1, rx1) = mpsc::unbounded_channel();
        let (tx2, rx2) = mpsc::unbounded_channel();
        let closed = Arc::new(watch::Sender::new(false));

        let local = Self {
            name: Arc::clone(&name),
            tx: tx2,
            rx: Arc::new(Mutex::new(rx1)),
            closed: Arc::clone(&closed),
        };

        let remote = Self {
            name,
            tx: tx1,
            rx: Arc::new(Mutex::new(rx2)),
            closed,
        };

        (local, remote)
    }

    /// Channel name given at connect time.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Decode the handshake carried in the channel name.
    pub fn connect_info(&self) -> SidewaveResult<ConnectInfo> {
        Ok(ConnectInfo::from_channel_name(&self.name)?)
    }

    /// Post a message to the other end.
    pub fn post_message(&self, message: ChannelMessage) -> SidewaveResult<()> {
        if self.is_closed() {
            return Err(SidewaveError::ChannelClosed);
        }

        self.tx
            .send(message)
            .map_err(|_| SidewaveError::ChannelClosed)
    }

    /// Wait for the next message. Returns `None` once the channel is closed
    /// or the other end is gone.
    pub async fn recv(&self) -> Option<ChannelMessage> {
        let mut closed = self.closed.subscribe();
        if *closed.borrow_and_update() {
            return None;
        }

        let mut rx = self.rx.lock().await;
        tokio::select! {
            message = rx.recv() => message,
            _ = closed.wait_for(|closed| *closed) => None,
        }
    }

    /// Receive a message without waiting.
    pub fn try_receive(&self) -> Option<ChannelMessage> {
        if self.is_closed() {
            return None;
        }
        self.rx.try_lock().ok()?.try_recv().ok()
    }

    /// Close the channel for both ends.
    pub fn close(&self) {
        self.closed.send_replace(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}
