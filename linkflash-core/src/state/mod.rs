//! State machine for a flash attempt
//!
//! Defines the lifecycle of one write → build → flash sequence.
//! The state machine is explicit, finite, and deterministic.

pub mod events;
pub mod machine;

pub use events::FlashEvent;
pub use machine::{FailureKind, FlashState, Outcome};
