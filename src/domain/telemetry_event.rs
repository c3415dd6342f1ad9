//! Telemetry events pushed by the controller.
//!
//! A [`TelemetryEvent`] is decoded from an inbound wire message, routed once
//! by the [`crate::telemetry::TelemetryRouter`], then discarded.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RemoteError;

/// Telemetry channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Current drive speed.
    Speed,
    /// A named onboard sensor.
    Sensor,
}

impl Channel {
    /// Maps an inbound event name to its channel, accepting both the
    /// controller's names and the English aliases.
    #[must_use]
    pub fn from_event_name(name: &str) -> Option<Self> {
        match name {
            "rychlost" | "speed" => Some(Self::Speed),
            "sensors" | "sensor" => Some(Self::Sensor),
            _ => None,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Speed => f.write_str("speed"),
            Self::Sensor => f.write_str("sensor"),
        }
    }
}

/// A single reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TelemetryValue {
    /// Numeric reading (speed, distance).
    Number(f64),
    /// On/off reading (obstacle sensors).
    Flag(bool),
    /// Free-form reading.
    Text(String),
}

impl TelemetryValue {
    /// Converts a JSON value; `null`, arrays and objects are rejected.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_f64().map(Self::Number),
            serde_json::Value::Bool(b) => Some(Self::Flag(*b)),
            serde_json::Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for TelemetryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Flag(b) => write!(f, "{b}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for TelemetryValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for TelemetryValue {
    fn from(b: bool) -> Self {
        Self::Flag(b)
    }
}

impl From<&str> for TelemetryValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Asynchronous state update originating from the controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryEvent {
    /// Channel the reading belongs to.
    pub channel: Channel,
    /// Sensor name; `None` for speed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// The reading.
    pub value: TelemetryValue,
}

impl TelemetryEvent {
    /// Builds a speed event.
    #[must_use]
    pub fn speed(value: impl Into<TelemetryValue>) -> Self {
        Self {
            channel: Channel::Speed,
            key: None,
            value: value.into(),
        }
    }

    /// Builds a sensor event.
    #[must_use]
    pub fn sensor(key: impl Into<String>, value: impl Into<TelemetryValue>) -> Self {
        Self {
            channel: Channel::Sensor,
            key: Some(key.into()),
            value: value.into(),
        }
    }

    /// Decodes a speed reply body: `{"rychlost": n}` (or `{"speed": n}`).
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::MalformedTelemetry`] if neither field holds a
    /// scalar reading.
    pub fn from_speed_body(data: &serde_json::Value) -> Result<Self, RemoteError> {
        data.get("rychlost")
            .or_else(|| data.get("speed"))
            .and_then(TelemetryValue::from_json)
            .map(Self::speed)
            .ok_or_else(|| RemoteError::MalformedTelemetry(format!("speed body without reading: {data}")))
    }

    /// Decodes a sensor body: `{"sensor": name, "value": reading}`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::MalformedTelemetry`] if the sensor name or the
    /// reading is missing.
    pub fn from_sensor_body(data: &serde_json::Value) -> Result<Self, RemoteError> {
        let Some(key) = data.get("sensor").and_then(|v| v.as_str()) else {
            return Err(RemoteError::MalformedTelemetry(format!(
                "sensor body without name: {data}"
            )));
        };
        let Some(value) = data.get("value").and_then(TelemetryValue::from_json) else {
            return Err(RemoteError::MalformedTelemetry(format!(
                "sensor {key} without reading"
            )));
        };
        Ok(Self::sensor(key, value))
    }

    /// Decodes an inbound channel event.
    ///
    /// Returns `Ok(None)` when `event_name` is not a telemetry event.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::MalformedTelemetry`] when a telemetry event is
    /// missing an expected field.
    pub fn from_wire(event_name: &str, data: &serde_json::Value) -> Result<Option<Self>, RemoteError> {
        match Channel::from_event_name(event_name) {
            Some(Channel::Speed) => Self::from_speed_body(data).map(Some),
            Some(Channel::Sensor) => Self::from_sensor_body(data).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_speed() {
        let Ok(Some(event)) = TelemetryEvent::from_wire("rychlost", &json!({ "rychlost": 40 })) else {
            panic!("speed should decode");
        };
        assert_eq!(event, TelemetryEvent::speed(40.0));
    }

    #[test]
    fn speed_alias_is_accepted() {
        let Ok(event) = TelemetryEvent::from_speed_body(&json!({ "speed": 70 })) else {
            panic!("alias should decode");
        };
        assert_eq!(event.value, TelemetryValue::Number(70.0));
    }

    #[test]
    fn decodes_boolean_sensor() {
        let Ok(Some(event)) =
            TelemetryEvent::from_wire("sensors", &json!({ "sensor": "obs_lf", "value": true }))
        else {
            panic!("sensor should decode");
        };
        assert_eq!(event.key.as_deref(), Some("obs_lf"));
        assert_eq!(event.value, TelemetryValue::Flag(true));
    }

    #[test]
    fn missing_fields_are_malformed() {
        let result = TelemetryEvent::from_wire("sensors", &json!({ "value": 3 }));
        assert!(matches!(result, Err(RemoteError::MalformedTelemetry(_))));

        let result = TelemetryEvent::from_wire("sensors", &json!({ "sensor": "distance" }));
        assert!(matches!(result, Err(RemoteError::MalformedTelemetry(_))));

        let result = TelemetryEvent::from_wire("rychlost", &json!({ "rychlost": null }));
        assert!(matches!(result, Err(RemoteError::MalformedTelemetry(_))));
    }

    #[test]
    fn other_events_are_not_telemetry() {
        assert_eq!(TelemetryEvent::from_wire("ack", &json!({})), Ok(None));
    }

    #[test]
    fn value_display() {
        assert_eq!(TelemetryValue::Number(42.0).to_string(), "42");
        assert_eq!(TelemetryValue::Flag(false).to_string(), "false");
        assert_eq!(TelemetryValue::from("far").to_string(), "far");
    }
}
