//! Startup wiring: one transport session, the dispatcher, and the router.
//!
//! The transport is created here and owned through its `Arc`; the
//! dispatcher holds the only other handle. The router never sees the
//! transport, only a receiver of its events.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{Layout, RemoteConfig};
use crate::domain::{Channel, TelemetryEvent};
use crate::error::RemoteError;
use crate::service::IntentDispatcher;
use crate::telemetry::{SlotKey, TelemetryRouter};
use crate::transport::{self, Transport};

/// Components of a running remote.
#[derive(Debug)]
pub struct AppState {
    /// Active transport session.
    pub transport: Arc<dyn Transport>,
    /// Control bindings and intent forwarding.
    pub dispatcher: IntentDispatcher,
    /// Slot registry fed by the transport's events.
    pub router: TelemetryRouter,
}

impl AppState {
    /// Builds the transport selected by `config` and wires the layout.
    ///
    /// `render` receives the slot id and the event for every slot update.
    ///
    /// # Errors
    ///
    /// Returns the transport construction error, or a duplicate control or
    /// slot in the layout.
    pub fn build<F>(config: &RemoteConfig, render: F) -> Result<Self, RemoteError>
    where
        F: Fn(&str, &TelemetryEvent) -> Result<(), RemoteError> + Clone + Send + 'static,
    {
        let transport = transport::from_config(config)?;
        Self::with_transport(transport, &config.layout, config.debounce_window, render)
    }

    /// Wires an existing transport with a layout.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::DuplicateControl`] or
    /// [`RemoteError::DuplicateSlot`] for a layout that repeats an id.
    pub fn with_transport<F>(
        transport: Arc<dyn Transport>,
        layout: &Layout,
        debounce_window: Duration,
        render: F,
    ) -> Result<Self, RemoteError>
    where
        F: Fn(&str, &TelemetryEvent) -> Result<(), RemoteError> + Clone + Send + 'static,
    {
        let mut dispatcher = IntentDispatcher::new(Arc::clone(&transport), debounce_window);
        dispatcher.register_all(layout.controls.iter().cloned())?;

        let mut router = TelemetryRouter::new();
        let speed_slot = layout.speed_slot.clone();
        let r = render.clone();
        router.register_slot(Channel::Speed, SlotKey::Wildcard, move |e: &TelemetryEvent| {
            r(speed_slot.as_str(), e)
        })?;
        for sensor in &layout.sensor_slots {
            let slot_id = sensor.clone();
            let r = render.clone();
            router.register_slot(
                Channel::Sensor,
                SlotKey::exact(sensor.as_str()),
                move |e: &TelemetryEvent| r(slot_id.as_str(), e),
            )?;
        }

        tracing::info!(
            controls = layout.controls.len(),
            sensors = layout.sensor_slots.len(),
            "layout wired"
        );
        Ok(Self {
            transport,
            dispatcher,
            router,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::domain::{Action, ControlBinding, TelemetryValue};
    use crate::transport::PollingTransport;

    fn polling() -> Arc<dyn Transport> {
        let Ok(t) = PollingTransport::new("http://127.0.0.1:9", Duration::from_millis(100), 8)
        else {
            panic!("client should build");
        };
        Arc::new(t)
    }

    #[test]
    fn default_layout_wires_every_slot() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let render = move |slot: &str, e: &TelemetryEvent| -> Result<(), RemoteError> {
            let _ = tx.send((slot.to_string(), e.value.clone()));
            Ok(())
        };
        let Ok(mut app) =
            AppState::with_transport(polling(), &Layout::default(), Duration::ZERO, render)
        else {
            panic!("default layout is consistent");
        };
        assert!(app.dispatcher.is_bound("bzrychli"));

        app.router.route(TelemetryEvent::speed(50.0));
        app.router.route(TelemetryEvent::sensor("obs_rg", false));
        assert_eq!(rx.try_recv().ok(), Some(("srychlost".into(), TelemetryValue::Number(50.0))));
        assert_eq!(rx.try_recv().ok(), Some(("obs_rg".into(), TelemetryValue::Flag(false))));
    }

    #[test]
    fn duplicate_control_in_layout_fails() {
        let layout = Layout {
            controls: vec![
                ControlBinding::new("b", Action::Stop),
                ControlBinding::new("b", Action::MoveForward),
            ],
            speed_slot: "srychlost".into(),
            sensor_slots: Vec::new(),
        };
        let render = |_: &str, _: &TelemetryEvent| -> Result<(), RemoteError> { Ok(()) };
        let result = AppState::with_transport(polling(), &layout, Duration::ZERO, render);
        assert_eq!(
            result.err(),
            Some(RemoteError::DuplicateControl("b".into()))
        );
    }
}
