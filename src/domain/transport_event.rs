//! Events published by a transport adapter.
//!
//! Every adapter owns an [`super::EventBus`] and publishes a
//! [`TransportEvent`] for each inbound reading, each connection state
//! change, and each send failure that happened after `send` returned.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Action, TelemetryEvent};

/// Connection state of a transport session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No live connection; commands are buffered (latest wins).
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Session established; commands go straight out.
    Connected,
}

impl ConnectionState {
    /// Returns `true` only for [`ConnectionState::Connected`].
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("disconnected"),
            Self::Connecting => f.write_str("connecting"),
            Self::Connected => f.write_str("connected"),
        }
    }
}

/// Non-fatal warning raised after a command left the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransportWarning {
    /// Action of the affected command, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    /// Numeric code of the underlying [`crate::error::RemoteError`].
    pub code: u32,
    /// Human-readable description.
    pub message: String,
    /// When the warning was raised.
    pub timestamp: DateTime<Utc>,
}

impl TransportWarning {
    /// Builds a warning from an error, stamped with the current time.
    #[must_use]
    pub fn new(action: Option<Action>, error: &crate::error::RemoteError) -> Self {
        Self {
            action,
            code: error.error_code(),
            message: error.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Event delivered to `on_event` subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum TransportEvent {
    /// Reading pushed (or replied) by the controller.
    Telemetry(TelemetryEvent),
    /// Session moved to a new state.
    StateChanged {
        /// The new state.
        state: ConnectionState,
    },
    /// A send failed or was rejected by the controller.
    Warning(TransportWarning),
}

impl TransportEvent {
    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::Telemetry(_) => "telemetry",
            Self::StateChanged { .. } => "state_changed",
            Self::Warning(_) => "warning",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;

    #[test]
    fn only_connected_is_connected() {
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Connecting.is_connected());
        assert!(!ConnectionState::Disconnected.is_connected());
    }

    #[test]
    fn warning_keeps_error_code() {
        let err = RemoteError::TransportSend("connection refused".into());
        let warning = TransportWarning::new(Some(Action::Stop), &err);
        assert_eq!(warning.code, 3001);
        assert!(warning.message.contains("connection refused"));
    }

    #[test]
    fn state_change_serializes_tagged() {
        let event = TransportEvent::StateChanged {
            state: ConnectionState::Connecting,
        };
        let json = serde_json::to_string(&event).unwrap_or_default();
        assert!(json.contains("state_changed"));
        assert!(json.contains("connecting"));
        assert_eq!(event.event_type_str(), "state_changed");
    }
}
