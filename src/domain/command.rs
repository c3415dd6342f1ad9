//! Commands and the static control bindings that produce them.

use serde::Serialize;

use super::action::{Action, WireCommand};
use crate::error::RemoteError;

/// An encoded, transmittable intent.
///
/// Immutable once built. Created per fired intent, handed to the active
/// transport, and discarded after the send.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    /// Vocabulary action.
    pub action: Action,
    /// Optional structured data merged into the channel message body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl Command {
    /// Creates a command without payload.
    #[must_use]
    pub const fn new(action: Action) -> Self {
        Self {
            action,
            payload: None,
        }
    }

    /// Creates a command carrying structured payload.
    #[must_use]
    pub const fn with_payload(action: Action, payload: serde_json::Value) -> Self {
        Self {
            action,
            payload: Some(payload),
        }
    }

    /// Returns the wire encoding of this command's action.
    #[must_use]
    pub const fn wire(&self) -> WireCommand {
        self.action.wire()
    }

    /// Builds the persistent-channel message body: `{"akce": ...}` plus the
    /// payload's fields when the payload is a JSON object.
    #[must_use]
    pub fn channel_data(&self) -> serde_json::Value {
        let mut data = serde_json::Map::new();
        if let Some(serde_json::Value::Object(fields)) = &self.payload {
            data.extend(fields.clone());
        }
        data.insert(
            "akce".to_string(),
            serde_json::Value::from(self.wire().akce),
        );
        serde_json::Value::Object(data)
    }
}

impl From<Action> for Command {
    fn from(action: Action) -> Self {
        Self::new(action)
    }
}

/// Binds one UI control to the command it fires.
///
/// Defined at startup and never mutated after registration.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlBinding {
    /// Identifier of the UI control (e.g. `"bdopredu"`).
    pub ui_control_id: String,
    /// Command template sent when the control fires.
    pub command: Command,
}

impl ControlBinding {
    /// Creates a binding for a control id.
    #[must_use]
    pub fn new(ui_control_id: impl Into<String>, command: impl Into<Command>) -> Self {
        Self {
            ui_control_id: ui_control_id.into(),
            command: command.into(),
        }
    }

    /// Creates a binding from a vocabulary action name.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::UnknownAction`] if `action_name` is not part
    /// of the vocabulary.
    pub fn parse(ui_control_id: &str, action_name: &str) -> Result<Self, RemoteError> {
        let action = action_name.trim().parse::<Action>()?;
        Ok(Self::new(ui_control_id.trim(), action))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn channel_data_carries_akce() {
        let cmd = Command::new(Action::MoveForward);
        assert_eq!(cmd.channel_data(), serde_json::json!({ "akce": "dopredu" }));
    }

    #[test]
    fn payload_fields_are_merged() {
        let cmd = Command::with_payload(Action::SpeedIncrease, serde_json::json!({ "krok": 20 }));
        assert_eq!(
            cmd.channel_data(),
            serde_json::json!({ "akce": "zrychli", "krok": 20 })
        );
    }

    #[test]
    fn payload_cannot_override_akce() {
        let cmd = Command::with_payload(Action::Stop, serde_json::json!({ "akce": "dopredu" }));
        assert_eq!(cmd.channel_data(), serde_json::json!({ "akce": "stop" }));
    }

    #[test]
    fn non_object_payload_is_ignored_on_the_wire() {
        let cmd = Command::with_payload(Action::Stop, serde_json::json!(5));
        assert_eq!(cmd.channel_data(), serde_json::json!({ "akce": "stop" }));
    }

    #[test]
    fn parse_binding() {
        let Ok(binding) = ControlBinding::parse("bstop", " stop ") else {
            panic!("stop is in the vocabulary");
        };
        assert_eq!(binding.ui_control_id, "bstop");
        assert_eq!(binding.command.action, Action::Stop);
    }

    #[test]
    fn parse_rejects_unknown_action() {
        let result = ControlBinding::parse("bturbo", "turbo");
        assert_eq!(result, Err(RemoteError::UnknownAction("turbo".into())));
    }
}
