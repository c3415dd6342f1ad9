//! Transport adapters: one capability interface, two bindings.
//!
//! [`Transport`] is the only seam that knows which transport generation is
//! active. The dispatcher sends through it and the router subscribes to it;
//! neither ever touches the underlying session.
//!
//! ```text
//! IntentDispatcher ──send──► Transport ──► controller
//!                               │
//! TelemetryRouter ◄─on_event────┘ (EventBus)
//! ```

mod channel;
pub mod messages;
pub mod polling;
pub mod push;

use std::fmt;
use std::sync::Arc;

use tokio::sync::broadcast;

pub use polling::PollingTransport;
pub use push::PushTransport;

use crate::config::{RemoteConfig, TransportKind};
use crate::domain::{Command, ConnectionState, TransportEvent};
use crate::error::RemoteError;

/// Immediate result of handing a command to a transport.
///
/// Sends never block and never panic; failures discovered later are
/// published as [`TransportEvent::Warning`].
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Handed to the connection (or an in-flight request).
    Dispatched,
    /// Held in the single-slot buffer until the session is back.
    Buffered,
    /// Could not be handed over; the command is lost.
    Failed(RemoteError),
}

impl SendOutcome {
    /// Returns `true` for [`SendOutcome::Failed`].
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Capability interface shared by both transport bindings.
pub trait Transport: Send + Sync + fmt::Debug {
    /// Hands a command to the controller without waiting for it.
    fn send(&self, command: Command) -> SendOutcome;

    /// Subscribes to telemetry, state changes and late send warnings.
    fn on_event(&self) -> broadcast::Receiver<TransportEvent>;

    /// Current session state.
    fn connection_state(&self) -> ConnectionState;

    /// Returns `true` while commands go straight to the controller.
    fn is_connected(&self) -> bool {
        self.connection_state().is_connected()
    }

    /// Tears the session down. Idempotent.
    fn close(&self) {}
}

/// Builds the transport selected by `config`.
///
/// # Errors
///
/// Returns [`RemoteError::Config`] if the HTTP client cannot be built or
/// the push transport is created outside a Tokio runtime.
pub fn from_config(config: &RemoteConfig) -> Result<Arc<dyn Transport>, RemoteError> {
    let transport: Arc<dyn Transport> = match config.transport {
        TransportKind::Polling => Arc::new(PollingTransport::new(
            config.base_url.clone(),
            config.request_timeout,
            config.event_bus_capacity,
        )?),
        TransportKind::Push => Arc::new(PushTransport::connect(
            config.channel.clone(),
            config.event_bus_capacity,
        )?),
    };
    tracing::info!(kind = ?config.transport, "transport ready");
    Ok(transport)
}
