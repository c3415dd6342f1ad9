//! Stateless binding: one HTTP request per command.
//!
//! Each [`Transport::send`] spawns a `GET {base_url}/motor/{akce}` and
//! returns at once. Requests are independent, so the controller may see
//! them in any order. A speed-class reply with a JSON body becomes a single
//! speed [`TelemetryEvent`] on the bus.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::broadcast;

use super::{SendOutcome, Transport};
use crate::domain::{
    Command, CommandClass, ConnectionState, EventBus, TelemetryEvent, TransportEvent,
    TransportWarning, WireCommand,
};
use crate::error::RemoteError;

/// Request-per-command transport. Always reports [`ConnectionState::Connected`].
#[derive(Debug, Clone)]
pub struct PollingTransport {
    client: reqwest::Client,
    base_url: String,
    bus: EventBus,
}

impl PollingTransport {
    /// Creates a transport for the controller at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Config`] if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
        bus_capacity: usize,
    ) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| RemoteError::Config(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bus: EventBus::new(bus_capacity),
        })
    }

    /// Full URL of the endpoint for a wire command.
    #[must_use]
    pub fn endpoint(&self, wire: &WireCommand) -> String {
        format!("{}{}", self.base_url, wire.http_path())
    }
}

impl Transport for PollingTransport {
    fn send(&self, command: Command) -> SendOutcome {
        let Ok(runtime) = Handle::try_current() else {
            return SendOutcome::Failed(RemoteError::TransportSend(
                "no async runtime to carry the request".to_string(),
            ));
        };
        let wire = command.wire();
        let url = self.endpoint(&wire);
        let client = self.client.clone();
        let bus = self.bus.clone();

        tracing::debug!(action = %wire.action, %url, "dispatching request");
        runtime.spawn(async move {
            match request(&client, &url, wire).await {
                Ok(Some(event)) => {
                    bus.publish(TransportEvent::Telemetry(event));
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(action = %wire.action, error = %err, "command lost");
                    bus.publish(TransportEvent::Warning(TransportWarning::new(
                        Some(wire.action),
                        &err,
                    )));
                }
            }
        });
        SendOutcome::Dispatched
    }

    fn on_event(&self) -> broadcast::Receiver<TransportEvent> {
        self.bus.subscribe()
    }

    fn connection_state(&self) -> ConnectionState {
        ConnectionState::Connected
    }
}

/// Performs one request and decodes the optional speed reply.
async fn request(
    client: &reqwest::Client,
    url: &str,
    wire: WireCommand,
) -> Result<Option<TelemetryEvent>, RemoteError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| RemoteError::TransportSend(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(RemoteError::TransportSend(format!("{url} returned {status}")));
    }
    if wire.class != CommandClass::Speed {
        return Ok(None);
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| RemoteError::TransportSend(format!("{url}: {e}")))?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    // Only a structured body carries a reading.
    let Ok(data) = serde_json::from_slice::<serde_json::Value>(&body) else {
        return Ok(None);
    };
    TelemetryEvent::from_speed_body(&data).map(Some)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::Action;

    fn transport() -> PollingTransport {
        let Ok(transport) =
            PollingTransport::new("http://127.0.0.1:5000/", Duration::from_millis(200), 8)
        else {
            panic!("client should build");
        };
        transport
    }

    #[test]
    fn endpoint_per_action() {
        let t = transport();
        assert_eq!(
            t.endpoint(&Action::MoveForward.wire()),
            "http://127.0.0.1:5000/motor/dopredu"
        );
        assert_eq!(
            t.endpoint(&Action::SpeedIncrease.wire()),
            "http://127.0.0.1:5000/motor/zrychli"
        );
    }

    #[test]
    fn always_connected() {
        let t = transport();
        assert!(t.is_connected());
        assert_eq!(t.connection_state(), ConnectionState::Connected);
    }

    #[test]
    fn send_outside_runtime_fails_softly() {
        let t = transport();
        let outcome = t.send(Command::new(Action::Stop));
        assert!(outcome.is_failed());
    }

    #[tokio::test]
    async fn unreachable_controller_publishes_warning() {
        // Port 9 (discard) is closed on any sane test host.
        let Ok(t) = PollingTransport::new("http://127.0.0.1:9", Duration::from_millis(500), 8)
        else {
            panic!("client should build");
        };
        let mut rx = t.on_event();
        assert_eq!(t.send(Command::new(Action::Stop)), SendOutcome::Dispatched);

        let Ok(TransportEvent::Warning(warning)) = rx.recv().await else {
            panic!("expected a warning event");
        };
        assert_eq!(warning.action, Some(Action::Stop));
        assert_eq!(warning.code, 3001);
    }
}
