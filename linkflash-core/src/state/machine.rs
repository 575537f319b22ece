//! State machine definition
//!
//! The trigger, status line and worker progress are all a function of the
//! current state and an event.

use super::events::FlashEvent;

/// Flash sequence states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlashState {
    /// Ready, trigger enabled
    #[default]
    Idle,
    /// Persisting the header
    Writing,
    /// Running the clean and build commands
    Building,
    /// Running the flash command
    Flashing,
    /// Sequence finished; returns to Idle on acknowledge
    Done(Outcome),
}

/// How a sequence ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(FailureKind),
}

/// Why a sequence failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Header could not be read or written
    FileAccess,
    /// Build or flash command exited non-zero
    ExternalCommand,
    /// Anything else (spawn failure, worker panic)
    Unexpected,
}

impl FlashState {
    /// A sequence is in flight; the trigger is disabled
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            FlashState::Writing | FlashState::Building | FlashState::Flashing
        )
    }

    pub fn is_done(&self) -> bool {
        matches!(self, FlashState::Done(_))
    }

    /// Short status line text
    pub fn status(&self) -> &'static str {
        match self {
            FlashState::Idle => "Ready",
            FlashState::Writing => "Writing config...",
            FlashState::Building => "Building...",
            FlashState::Flashing => "Flashing...",
            FlashState::Done(Outcome::Success) => "Flash complete",
            FlashState::Done(Outcome::Failure(_)) => "Flash failed",
        }
    }

    /// Process an event and return the next state
    pub fn transition(self, event: FlashEvent) -> Self {
        use FlashEvent::*;
        use FlashState::*;

        match (self, event) {
            (Idle, Start) => Writing,

            (Writing, ConfigWritten) => Building,
            (Building, BuildSucceeded) => Flashing,
            (Flashing, FlashSucceeded) => Done(Outcome::Success),

            (Writing | Building | Flashing, Failed(kind)) => Done(Outcome::Failure(kind)),

            (Done(_), Acknowledge) => Idle,

            // Default: stay in current state
            _ => self,
        }
    }
}
