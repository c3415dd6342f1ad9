//! # malina-remote
//!
//! Remote-control front end for the Malina robot chassis.
//!
//! Button presses (intents) become commands from a closed vocabulary, go
//! out through one of two transport bindings, and telemetry pushed back by
//! the controller is routed into named UI slots.
//!
//! ## Architecture
//!
//! ```text
//! UI control id
//!     │
//!     ├── IntentDispatcher (service/)   bindings + debounce
//!     ├── Command vocabulary (domain/)
//!     │
//!     ├── Transport (transport/)        polling │ push
//!     │       │                          HTTP   │ WebSocket session task
//!     │       └── EventBus ──────────────────────┐
//!     │                                          │
//!     └── TelemetryRouter (telemetry/) ◄─────────┘  slots: speed, sensors
//! ```
//!
//! The dispatcher and the router never talk to each other; only the
//! transport knows which binding is active.

pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod telemetry;
pub mod transport;
