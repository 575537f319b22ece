//! Events that trigger state transitions

use super::machine::FailureKind;

/// Events that can trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashEvent {
    /// User triggered a flash and the gate passed
    Start,

    // Worker progress events
    /// Header saved
    ConfigWritten,
    /// Build command exited zero
    BuildSucceeded,
    /// Flash command exited zero
    FlashSucceeded,
    /// A step failed; the sequence stops
    Failed(FailureKind),

    /// Front end consumed the final result
    Acknowledge,
}

impl FlashEvent {
    /// Check if this event ends a sequence
    pub fn is_terminal(&self) -> bool {
        matches!(self, FlashEvent::FlashSucceeded | FlashEvent::Failed(_))
    }
}
