//! Telemetry routing: slot registry and the router that feeds it.

pub mod router;
pub mod slots;

pub use router::{RouteOutcome, RouterStats, TelemetryRouter};
pub use slots::{Slot, SlotKey, SlotRenderer, SlotTable};
