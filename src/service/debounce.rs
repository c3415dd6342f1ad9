//! Leading-edge debounce for repeated intents.
//!
//! The first intent for a control always passes. A repeat of the same
//! control passes only once the window has elapsed since the last one that
//! passed; a different control resets the comparison.

use std::time::Duration;

use tokio::time::Instant;

/// Tracks the last transmitted control and when it went out.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    last: Option<(String, Instant)>,
}

impl Debouncer {
    /// Creates a debouncer. A zero window admits everything.
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// Returns the configured window.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Returns `true` if the intent should be transmitted, recording it.
    pub fn admit(&mut self, control_id: &str, now: Instant) -> bool {
        if let Some((last_id, at)) = &self.last
            && last_id == control_id
            && now.saturating_duration_since(*at) < self.window
        {
            return false;
        }
        self.last = Some((control_id.to_string(), now));
        true
    }
}
