//! Command vocabulary: the closed set of actions and their wire encodings.
//!
//! [`Action`] is the single source of truth for what the controller
//! understands. A control can only be bound to an `Action`, so a new button
//! can never introduce a command without a wire encoding.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RemoteError;

/// Supported device actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// Drive both tracks forward.
    MoveForward,
    /// Drive both tracks backward.
    MoveBackward,
    /// Stop both motors.
    Stop,
    /// Spin in place counter-clockwise.
    RotateLeft,
    /// Spin in place clockwise.
    RotateRight,
    /// Arc forward and to the left.
    TurnForwardLeft,
    /// Arc forward and to the right.
    TurnForwardRight,
    /// Arc backward and to the left.
    TurnBackwardLeft,
    /// Arc backward and to the right.
    TurnBackwardRight,
    /// Raise the current speed one step.
    SpeedIncrease,
    /// Lower the current speed one step.
    SpeedDecrease,
}

/// Which controller handler a command is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandClass {
    /// Motion commands (`steering` / `motor` events).
    Steering,
    /// Speed adjustments (`rychlost` event).
    Speed,
}

/// Wire form of an action, shared by both transport bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireCommand {
    /// Action this encoding belongs to.
    pub action: Action,
    /// Handler class on the controller side.
    pub class: CommandClass,
    /// Action string understood by the controller (`akce`).
    pub akce: &'static str,
}

impl WireCommand {
    /// Path of the stateless endpoint for this action.
    #[must_use]
    pub fn http_path(&self) -> String {
        format!("/motor/{}", self.akce)
    }
}

impl Action {
    /// Every action in the vocabulary.
    pub const ALL: [Self; 11] = [
        Self::MoveForward,
        Self::MoveBackward,
        Self::Stop,
        Self::RotateLeft,
        Self::RotateRight,
        Self::TurnForwardLeft,
        Self::TurnForwardRight,
        Self::TurnBackwardLeft,
        Self::TurnBackwardRight,
        Self::SpeedIncrease,
        Self::SpeedDecrease,
    ];

    /// Returns the vocabulary name (e.g. `"move-forward"`).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MoveForward => "move-forward",
            Self::MoveBackward => "move-backward",
            Self::Stop => "stop",
            Self::RotateLeft => "rotate-left",
            Self::RotateRight => "rotate-right",
            Self::TurnForwardLeft => "turn-forward-left",
            Self::TurnForwardRight => "turn-forward-right",
            Self::TurnBackwardLeft => "turn-backward-left",
            Self::TurnBackwardRight => "turn-backward-right",
            Self::SpeedIncrease => "speed-increase",
            Self::SpeedDecrease => "speed-decrease",
        }
    }

    /// Returns the wire encoding. Total over the vocabulary.
    #[must_use]
    pub const fn wire(self) -> WireCommand {
        let (class, akce) = match self {
            Self::MoveForward => (CommandClass::Steering, "dopredu"),
            Self::MoveBackward => (CommandClass::Steering, "dozadu"),
            Self::Stop => (CommandClass::Steering, "stop"),
            Self::RotateLeft => (CommandClass::Steering, "rotujvlevo"),
            Self::RotateRight => (CommandClass::Steering, "rotujvpravo"),
            Self::TurnForwardLeft => (CommandClass::Steering, "zatocvpredvlevo"),
            Self::TurnForwardRight => (CommandClass::Steering, "zatocvpredvpravo"),
            Self::TurnBackwardLeft => (CommandClass::Steering, "zatocvzadvlevo"),
            Self::TurnBackwardRight => (CommandClass::Steering, "zatocvzadvpravo"),
            Self::SpeedIncrease => (CommandClass::Speed, "zrychli"),
            Self::SpeedDecrease => (CommandClass::Speed, "zpomal"),
        };
        WireCommand {
            action: self,
            class,
            akce,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = RemoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.name() == s)
            .ok_or_else(|| RemoteError::UnknownAction(s.to_string()))
    }
}

/// Encodes a vocabulary action name into its wire representation.
///
/// # Errors
///
/// Returns [`RemoteError::UnknownAction`] for any name outside the
/// vocabulary.
pub fn encode(action_name: &str) -> Result<WireCommand, RemoteError> {
    action_name.parse::<Action>().map(Action::wire)
}
