//! Telemetry router: inbound events → named UI slots.
//!
//! Each event is routed in isolation. A renderer failure is logged and
//! counted, and the next event is routed as usual. The most recent event
//! rendered into a slot wins; no pairing with earlier commands is assumed.

use tokio::sync::broadcast;

use super::slots::{SlotKey, SlotRenderer, SlotTable};
use crate::domain::{Channel, TelemetryEvent, TelemetryValue, TransportEvent};
use crate::error::RemoteError;

/// What happened to a routed event.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// Rendered into the named slot.
    Rendered {
        /// Label of the slot.
        slot: String,
    },
    /// No slot registered for the event; silently dropped.
    Dropped,
    /// The slot's renderer rejected the value.
    Failed(RemoteError),
}

/// Counters kept by the router.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterStats {
    /// Events rendered into a slot.
    pub rendered: u64,
    /// Events without a slot.
    pub dropped: u64,
    /// Events whose renderer failed.
    pub failed: u64,
}

/// Routes telemetry events to registered slots.
#[derive(Debug, Default)]
pub struct TelemetryRouter {
    slots: SlotTable,
    stats: RouterStats,
}

impl TelemetryRouter {
    /// Creates a router without slots.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a slot renderer for a channel and key.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::DuplicateSlot`] if the channel/key pair is
    /// already registered.
    pub fn register_slot<R>(
        &mut self,
        channel: Channel,
        key: SlotKey,
        renderer: R,
    ) -> Result<(), RemoteError>
    where
        R: SlotRenderer + 'static,
    {
        tracing::debug!(%channel, key = ?key, "slot registered");
        self.slots.insert(channel, key, Box::new(renderer))
    }

    /// Routes a single event.
    pub fn route(&mut self, event: TelemetryEvent) -> RouteOutcome {
        let Some(slot) = self.slots.resolve_mut(&event) else {
            self.stats.dropped += 1;
            tracing::trace!(channel = %event.channel, key = ?event.key, "no slot, event dropped");
            return RouteOutcome::Dropped;
        };
        match slot.render(&event) {
            Ok(()) => {
                self.stats.rendered += 1;
                RouteOutcome::Rendered {
                    slot: slot.label().to_string(),
                }
            }
            Err(err) => {
                self.stats.failed += 1;
                tracing::warn!(slot = %slot.label(), error = %err, "render failed");
                RouteOutcome::Failed(err)
            }
        }
    }

    /// Consumes transport events until the bus closes, then returns the
    /// router so callers can inspect final slot values.
    pub async fn run(mut self, mut events: broadcast::Receiver<TransportEvent>) -> Self {
        loop {
            match events.recv().await {
                Ok(TransportEvent::Telemetry(event)) => {
                    self.route(event);
                }
                Ok(TransportEvent::StateChanged { state }) => {
                    tracing::info!(%state, "controller connection");
                }
                Ok(TransportEvent::Warning(warning)) => {
                    tracing::warn!(
                        code = warning.code,
                        action = ?warning.action,
                        message = %warning.message,
                        "transport warning"
                    );
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "router lagged behind transport events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::debug!(stats = ?self.stats, "telemetry router stopped");
        self
    }

    /// Last value rendered into the speed slot.
    #[must_use]
    pub fn speed_value(&self) -> Option<&TelemetryValue> {
        self.slots.speed_value()
    }

    /// Last value rendered into the exact slot for `key`.
    #[must_use]
    pub fn sensor_value(&self, key: &str) -> Option<&TelemetryValue> {
        self.slots.sensor_value(key)
    }

    /// Last value rendered into the wildcard sensor slot.
    #[must_use]
    pub fn wildcard_value(&self) -> Option<&TelemetryValue> {
        self.slots.wildcard_value()
    }

    /// Routing counters.
    #[must_use]
    pub const fn stats(&self) -> RouterStats {
        self.stats
    }
}
