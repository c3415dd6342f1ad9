//! Push binding: long-lived channel with server-originated telemetry.
//!
//! [`PushTransport`] is a thin handle. The session itself lives in a
//! [`ChannelTask`] spawned at construction; commands reach it over an
//! ordered queue, so send order is preserved on the wire.

use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc, watch};

use super::channel::ChannelTask;
use super::{SendOutcome, Transport};
use crate::config::ChannelConfig;
use crate::domain::{Command, ConnectionState, EventBus, TransportEvent};
use crate::error::RemoteError;

/// Handle to a persistent-channel session.
#[derive(Debug)]
pub struct PushTransport {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ConnectionState>,
    shutdown: watch::Sender<bool>,
    bus: EventBus,
}

impl PushTransport {
    /// Spawns the connection task and returns immediately.
    ///
    /// The session starts in [`ConnectionState::Disconnected`] and moves to
    /// `Connecting` as soon as the task runs.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Config`] when called outside a Tokio runtime.
    pub fn connect(config: ChannelConfig, bus_capacity: usize) -> Result<Self, RemoteError> {
        let runtime = Handle::try_current().map_err(|_| {
            RemoteError::Config("push transport must be created inside a tokio runtime".to_string())
        })?;

        let bus = EventBus::new(bus_capacity);
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tracing::info!(url = %config.url, namespace = %config.namespace, "opening channel");
        let task = ChannelTask::new(config, commands_rx, state_tx, shutdown_rx, bus.clone());
        runtime.spawn(task.run());

        Ok(Self {
            commands: commands_tx,
            state: state_rx,
            shutdown: shutdown_tx,
            bus,
        })
    }

    /// Watch handle for awaiting state transitions.
    #[must_use]
    pub fn state_watch(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }
}

impl Transport for PushTransport {
    fn send(&self, command: Command) -> SendOutcome {
        let connected = self.is_connected();
        let action = command.action;
        if self.commands.send(command).is_err() {
            return SendOutcome::Failed(RemoteError::TransportSend(format!(
                "channel closed, {action} dropped"
            )));
        }
        if connected {
            SendOutcome::Dispatched
        } else {
            tracing::debug!(%action, "channel down, command buffered");
            SendOutcome::Buffered
        }
    }

    fn on_event(&self) -> broadcast::Receiver<TransportEvent> {
        self.bus.subscribe()
    }

    fn connection_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    fn close(&self) {
        self.shutdown.send_replace(true);
    }
}
