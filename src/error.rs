//! Remote-control error types with numeric code mapping.
//!
//! [`RemoteError`] is the central error type for the crate. None of its
//! variants is fatal: every component boundary (dispatcher, transport,
//! router) converts failures into one of these values, logs it, and keeps
//! the control loop running.

/// Error enum shared by the vocabulary, dispatcher, transports and router.
///
/// # Error Code Ranges
///
/// | Range     | Category                   |
/// |-----------|----------------------------|
/// | 1000–1999 | Vocabulary / configuration |
/// | 2000–2999 | Registration / binding     |
/// | 3000–3999 | Transport                  |
/// | 4000–4999 | Telemetry                  |
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// Action name outside the command vocabulary.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// Configuration value could not be used.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Intent fired for a control id with no registered binding.
    #[error("no binding registered for control {0}")]
    UnboundControl(String),

    /// A binding for this control id already exists.
    #[error("control {0} is already bound")]
    DuplicateControl(String),

    /// A slot for this channel and key already exists.
    #[error("slot {0} is already registered")]
    DuplicateSlot(String),

    /// The command could not be handed to the controller.
    #[error("transport send failed: {0}")]
    TransportSend(String),

    /// Inbound telemetry payload is missing or has an invalid field.
    #[error("malformed telemetry: {0}")]
    MalformedTelemetry(String),

    /// A slot renderer rejected a telemetry value.
    #[error("render failed for slot {slot}: {reason}")]
    Render {
        /// Slot the value was routed to.
        slot: String,
        /// Renderer-supplied reason.
        reason: String,
    },
}

impl RemoteError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::UnknownAction(_) => 1001,
            Self::Config(_) => 1002,
            Self::UnboundControl(_) => 2001,
            Self::DuplicateControl(_) => 2002,
            Self::DuplicateSlot(_) => 2003,
            Self::TransportSend(_) => 3001,
            Self::MalformedTelemetry(_) => 4001,
            Self::Render { .. } => 4002,
        }
    }
}
