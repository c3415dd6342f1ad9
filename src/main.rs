//! malina-remote terminal front end.
//!
//! Reads control ids from stdin, one per line, and fires them as intents.
//! Slot updates are printed to stdout; logs go to stderr.

use std::io::Write;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use malina_remote::app_state::AppState;
use malina_remote::config::RemoteConfig;
use malina_remote::domain::TelemetryEvent;
use malina_remote::error::RemoteError;
use malina_remote::service::IntentDispatcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = RemoteConfig::from_env().context("failed to load configuration")?;

    // Initialize tracing
    init_tracing(config.log_json);
    tracing::info!(
        transport = ?config.transport,
        base_url = %config.base_url,
        "starting malina-remote"
    );

    // Wire transport, dispatcher and router
    let AppState {
        transport,
        mut dispatcher,
        router,
    } = AppState::build(&config, render_slot).context("failed to wire the remote")?;
    let router_task = tokio::spawn(router.run(transport.on_event()));

    print_controls(&dispatcher);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match line.trim() {
            "" => {}
            "quit" | "exit" => break,
            "help" => print_controls(&dispatcher),
            control => {
                // Failures are logged by the dispatcher.
                let _ = dispatcher.fire_intent(control);
            }
        }
    }

    // Tear the session down
    transport.close();
    drop(dispatcher);
    drop(transport);
    match tokio::time::timeout(Duration::from_secs(3), router_task).await {
        Ok(Ok(router)) => tracing::info!(stats = ?router.stats(), "stopped"),
        Ok(Err(err)) => tracing::warn!(error = %err, "router task failed"),
        Err(_) => tracing::warn!("router did not drain in time"),
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn print_controls(dispatcher: &IntentDispatcher) {
    let line = dispatcher.controls().join(" ");
    if let Err(err) = writeln!(std::io::stdout().lock(), "controls: {line}") {
        tracing::warn!(error = %err, "cannot print controls");
    }
}

fn render_slot(slot: &str, event: &TelemetryEvent) -> Result<(), RemoteError> {
    write_slot(&mut std::io::stdout().lock(), slot, event)
}

/// Writes one `slot = value` line.
fn write_slot<W: Write>(
    out: &mut W,
    slot: &str,
    event: &TelemetryEvent,
) -> Result<(), RemoteError> {
    writeln!(out, "{slot} = {}", event.value).map_err(|e| RemoteError::Render {
        slot: slot.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::io;

    use malina_remote::domain::{Channel, EventBus, TelemetryValue, TransportEvent};
    use malina_remote::telemetry::{SlotKey, TelemetryRouter};

    use super::*;

    /// Writer whose reader went away.
    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn slot_line_format() {
        let mut out = Vec::new();
        assert!(write_slot(&mut out, "srychlost", &TelemetryEvent::speed(40.0)).is_ok());
        assert_eq!(String::from_utf8_lossy(&out), "srychlost = 40\n");
    }

    #[test]
    fn closed_stdout_is_a_render_error() {
        let result = write_slot(&mut ClosedPipe, "srychlost", &TelemetryEvent::speed(40.0));
        assert!(matches!(
            result,
            Err(RemoteError::Render { ref slot, .. }) if slot == "srychlost"
        ));
    }

    #[tokio::test]
    async fn router_task_survives_a_closed_stdout() {
        let mut router = TelemetryRouter::new();
        let renderer = |e: &TelemetryEvent| -> Result<(), RemoteError> {
            write_slot(&mut ClosedPipe, "srychlost", e)
        };
        assert!(
            router
                .register_slot(Channel::Speed, SlotKey::Wildcard, renderer)
                .is_ok()
        );

        let bus = EventBus::new(8);
        let handle = tokio::spawn(router.run(bus.subscribe()));
        for speed in [40.0, 30.0, 40.0] {
            bus.publish(TransportEvent::Telemetry(TelemetryEvent::speed(speed)));
        }
        drop(bus);

        let Ok(router) = handle.await else {
            panic!("router task must not die on a render failure");
        };
        assert_eq!(router.stats().failed, 3);
        assert_eq!(router.speed_value(), None::<&TelemetryValue>);
    }
}
