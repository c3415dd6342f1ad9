//! Slot table: which UI slot a telemetry event renders into.
//!
//! Speed has a single slot. Sensor events look up an exact slot by sensor
//! name, then fall back to the wildcard slot if one is registered.

use std::collections::HashMap;
use std::fmt;

use crate::domain::{Channel, TelemetryEvent, TelemetryValue};
use crate::error::RemoteError;

/// Which events of a channel a slot accepts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SlotKey {
    /// Exactly this sensor name.
    Exact(String),
    /// Any key without an exact slot.
    Wildcard,
}

impl SlotKey {
    /// Shorthand for [`SlotKey::Exact`].
    #[must_use]
    pub fn exact(name: impl Into<String>) -> Self {
        Self::Exact(name.into())
    }
}

/// Renders a routed event into its UI location.
pub trait SlotRenderer: Send {
    /// Renders one event.
    ///
    /// # Errors
    ///
    /// Returns an error (typically [`RemoteError::Render`]) if the value
    /// cannot be shown; the slot keeps its previous value.
    fn render(&mut self, event: &TelemetryEvent) -> Result<(), RemoteError>;
}

impl<F> SlotRenderer for F
where
    F: FnMut(&TelemetryEvent) -> Result<(), RemoteError> + Send,
{
    fn render(&mut self, event: &TelemetryEvent) -> Result<(), RemoteError> {
        self(event)
    }
}

/// A registered slot and its last rendered value.
pub struct Slot {
    label: String,
    renderer: Box<dyn SlotRenderer>,
    last: Option<TelemetryValue>,
}

impl Slot {
    fn new(label: String, renderer: Box<dyn SlotRenderer>) -> Self {
        Self {
            label,
            renderer,
            last: None,
        }
    }

    /// Slot label used in logs (`speed`, the sensor name, or `sensor:*`).
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Last successfully rendered value.
    #[must_use]
    pub const fn value(&self) -> Option<&TelemetryValue> {
        self.last.as_ref()
    }

    /// Renders `event` and records its value on success.
    ///
    /// # Errors
    ///
    /// Propagates the renderer's error; the recorded value is unchanged.
    pub fn render(&mut self, event: &TelemetryEvent) -> Result<(), RemoteError> {
        self.renderer.render(event)?;
        self.last = Some(event.value.clone());
        Ok(())
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("label", &self.label)
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}

/// All registered slots.
#[derive(Debug, Default)]
pub struct SlotTable {
    speed: Option<Slot>,
    sensors: HashMap<String, Slot>,
    sensor_wildcard: Option<Slot>,
}

impl SlotTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a slot. The key is ignored for the speed channel.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::DuplicateSlot`] if the channel/key pair is
    /// already taken.
    pub fn insert(
        &mut self,
        channel: Channel,
        key: SlotKey,
        renderer: Box<dyn SlotRenderer>,
    ) -> Result<(), RemoteError> {
        let (entry, label) = match (channel, key) {
            (Channel::Speed, _) => (&mut self.speed, "speed".to_string()),
            (Channel::Sensor, SlotKey::Wildcard) => {
                (&mut self.sensor_wildcard, "sensor:*".to_string())
            }
            (Channel::Sensor, SlotKey::Exact(name)) => {
                if self.sensors.contains_key(&name) {
                    return Err(RemoteError::DuplicateSlot(name));
                }
                self.sensors
                    .insert(name.clone(), Slot::new(name, renderer));
                return Ok(());
            }
        };
        if entry.is_some() {
            return Err(RemoteError::DuplicateSlot(label));
        }
        *entry = Some(Slot::new(label, renderer));
        Ok(())
    }

    /// Finds the slot an event routes to, if any.
    pub fn resolve_mut(&mut self, event: &TelemetryEvent) -> Option<&mut Slot> {
        match event.channel {
            Channel::Speed => self.speed.as_mut(),
            Channel::Sensor => {
                let exact = event
                    .key
                    .as_deref()
                    .filter(|key| self.sensors.contains_key(*key));
                match exact {
                    Some(key) => self.sensors.get_mut(key),
                    None => self.sensor_wildcard.as_mut(),
                }
            }
        }
    }

    /// Last value rendered into the speed slot.
    #[must_use]
    pub fn speed_value(&self) -> Option<&TelemetryValue> {
        self.speed.as_ref().and_then(Slot::value)
    }

    /// Last value rendered into the exact slot for `key`.
    #[must_use]
    pub fn sensor_value(&self, key: &str) -> Option<&TelemetryValue> {
        self.sensors.get(key).and_then(Slot::value)
    }

    /// Last value rendered into the wildcard sensor slot.
    #[must_use]
    pub fn wildcard_value(&self) -> Option<&TelemetryValue> {
        self.sensor_wildcard.as_ref().and_then(Slot::value)
    }

    /// Number of registered slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sensors.len()
            + usize::from(self.speed.is_some())
            + usize::from(self.sensor_wildcard.is_some())
    }

    /// Returns `true` if no slot is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
