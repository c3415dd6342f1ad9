//! Domain layer: command vocabulary, commands, telemetry and transport
//! events.
//!
//! Nothing in here performs I/O. Transports, the dispatcher and the router
//! all exchange these types.

pub mod action;
pub mod command;
pub mod event_bus;
pub mod telemetry_event;
pub mod transport_event;

pub use action::{Action, CommandClass, WireCommand, encode};
pub use command::{Command, ControlBinding};
pub use event_bus::EventBus;
pub use telemetry_event::{Channel, TelemetryEvent, TelemetryValue};
pub use transport_event::{ConnectionState, TransportEvent, TransportWarning};
