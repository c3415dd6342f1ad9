//! Service layer: intent dispatch.
//!
//! [`IntentDispatcher`] is the only path from a UI control to the active
//! transport.

pub mod debounce;
pub mod intent_dispatcher;

pub use debounce::Debouncer;
pub use intent_dispatcher::{DispatchOutcome, IntentDispatcher};
