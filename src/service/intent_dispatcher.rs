//! Intent dispatcher: UI control id → command → active transport.
//!
//! Bindings are registered once at startup. Firing a control looks up its
//! binding, applies the debounce, and hands a copy of the bound command to
//! the transport. Nothing here can fail the caller's event loop: unknown
//! controls and transport failures come back as values and are logged.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::debounce::Debouncer;
use crate::domain::ControlBinding;
use crate::error::RemoteError;
use crate::transport::{SendOutcome, Transport};

/// Result of a fired intent that had a binding.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// The command was handed to the transport.
    Sent(SendOutcome),
    /// Collapsed into an identical intent inside the debounce window.
    Debounced,
}

/// Binds UI controls to commands and forwards fired intents.
#[derive(Debug)]
pub struct IntentDispatcher {
    bindings: HashMap<String, ControlBinding>,
    transport: Arc<dyn Transport>,
    debouncer: Debouncer,
}

impl IntentDispatcher {
    /// Creates a dispatcher sending through `transport`.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, debounce_window: Duration) -> Self {
        Self {
            bindings: HashMap::new(),
            transport,
            debouncer: Debouncer::new(debounce_window),
        }
    }

    /// Registers a control binding.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::DuplicateControl`] if the control id is
    /// already bound; the existing binding is kept.
    pub fn register_control(&mut self, binding: ControlBinding) -> Result<(), RemoteError> {
        if self.bindings.contains_key(&binding.ui_control_id) {
            return Err(RemoteError::DuplicateControl(binding.ui_control_id));
        }
        tracing::debug!(
            control = %binding.ui_control_id,
            action = %binding.command.action,
            "control registered"
        );
        self.bindings.insert(binding.ui_control_id.clone(), binding);
        Ok(())
    }

    /// Registers every binding, stopping at the first duplicate.
    ///
    /// # Errors
    ///
    /// Same as [`IntentDispatcher::register_control`].
    pub fn register_all(
        &mut self,
        bindings: impl IntoIterator<Item = ControlBinding>,
    ) -> Result<(), RemoteError> {
        bindings
            .into_iter()
            .try_for_each(|binding| self.register_control(binding))
    }

    /// Fires the intent of a UI control.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::UnboundControl`] if no binding exists for
    /// `ui_control_id`. The intent is dropped and logged.
    pub fn fire_intent(&mut self, ui_control_id: &str) -> Result<DispatchOutcome, RemoteError> {
        let Some(binding) = self.bindings.get(ui_control_id) else {
            let err = RemoteError::UnboundControl(ui_control_id.to_string());
            tracing::warn!(control = %ui_control_id, error = %err, "intent dropped");
            return Err(err);
        };

        if !self.debouncer.admit(ui_control_id, Instant::now()) {
            tracing::debug!(control = %ui_control_id, "intent debounced");
            return Ok(DispatchOutcome::Debounced);
        }

        let action = binding.command.action;
        let outcome = self.transport.send(binding.command.clone());
        match &outcome {
            SendOutcome::Failed(err) => {
                tracing::warn!(control = %ui_control_id, %action, error = %err, "send failed");
            }
            SendOutcome::Buffered => {
                tracing::info!(control = %ui_control_id, %action, "command buffered until reconnect");
            }
            SendOutcome::Dispatched => {
                tracing::debug!(control = %ui_control_id, %action, "command dispatched");
            }
        }
        Ok(DispatchOutcome::Sent(outcome))
    }

    /// Returns `true` if a binding exists for the control id.
    #[must_use]
    pub fn is_bound(&self, ui_control_id: &str) -> bool {
        self.bindings.contains_key(ui_control_id)
    }

    /// Registered control ids, sorted.
    #[must_use]
    pub fn controls(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.bindings.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}
