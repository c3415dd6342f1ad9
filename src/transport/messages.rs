//! Persistent-channel message envelope and inbound classification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ChannelConfig;
use crate::domain::{Command, CommandClass, TelemetryEvent};
use crate::error::RemoteError;

/// Event name of the namespace join sent after the socket opens.
pub const JOIN_EVENT: &str = "connect";
/// Event name of a controller acknowledgement.
pub const ACK_EVENT: &str = "ack";
/// Event name of a controller rejection.
pub const ERROR_EVENT: &str = "error";

/// Envelope carried by every WebSocket text frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    /// Client-generated for commands; echoed by acknowledgements.
    #[serde(default)]
    pub id: String,
    /// Logical namespace (e.g. `/malina`).
    pub namespace: String,
    /// Event name (`steering`, `rychlost`, `sensors`, ...).
    pub event: String,
    /// ISO-8601 timestamp.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Event-specific body.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl ChannelMessage {
    /// Creates an envelope with a fresh id.
    #[must_use]
    pub fn new(namespace: &str, event: &str, data: serde_json::Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            namespace: namespace.to_string(),
            event: event.to_string(),
            timestamp: Utc::now(),
            data,
        }
    }

    /// Namespace join sent as the last step of the handshake.
    #[must_use]
    pub fn join(namespace: &str) -> Self {
        Self::new(namespace, JOIN_EVENT, serde_json::Value::Null)
    }

    /// Encodes a command for the channel.
    #[must_use]
    pub fn command(config: &ChannelConfig, command: &Command) -> Self {
        let event = match command.wire().class {
            CommandClass::Steering => &config.steering_event,
            CommandClass::Speed => &config.speed_event,
        };
        Self::new(&config.namespace, event, command.channel_data())
    }

    /// Serializes the envelope.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::TransportSend`] if serialization fails.
    pub fn to_json(&self) -> Result<String, RemoteError> {
        serde_json::to_string(self)
            .map_err(|e| RemoteError::TransportSend(format!("cannot encode {}: {e}", self.event)))
    }
}

/// What an inbound frame means to the client.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A reading for the router.
    Telemetry(TelemetryEvent),
    /// Controller accepted a command.
    Ack {
        /// Envelope id of the acknowledged command.
        id: String,
    },
    /// Controller rejected a command.
    Nack {
        /// Envelope id of the rejected command.
        id: String,
        /// Controller-supplied reason.
        message: String,
    },
    /// Another namespace, or an event the client does not handle.
    Ignored,
}

/// Classifies an inbound text frame for `namespace`.
///
/// # Errors
///
/// Returns [`RemoteError::MalformedTelemetry`] if the frame is not an
/// envelope or a telemetry event is missing a field.
pub fn classify(text: &str, namespace: &str) -> Result<Inbound, RemoteError> {
    let msg: ChannelMessage = serde_json::from_str(text)
        .map_err(|e| RemoteError::MalformedTelemetry(format!("not a channel envelope: {e}")))?;
    if msg.namespace != namespace {
        return Ok(Inbound::Ignored);
    }
    match msg.event.as_str() {
        ACK_EVENT => Ok(Inbound::Ack { id: msg.id }),
        ERROR_EVENT => {
            let message = msg
                .data
                .get("message")
                .and_then(|v| v.as_str())
                .or_else(|| msg.data.as_str())
                .unwrap_or("rejected")
                .to_string();
            Ok(Inbound::Nack {
                id: msg.id,
                message,
            })
        }
        event => Ok(TelemetryEvent::from_wire(event, &msg.data)?
            .map_or(Inbound::Ignored, Inbound::Telemetry)),
    }
}
