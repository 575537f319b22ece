//! Flash attempt errors

use linkflash_core::{CodecError, FailureKind, ValidationError};

use crate::runner::RunnerError;
use crate::store::StoreError;

/// Why a flash attempt did not complete
///
/// `NoPort`, `Validation` and `Codec` are gate failures: they are reported
/// before any side effect and leave the orchestrator idle. The rest end a
/// running sequence.
#[derive(Debug, thiserror::Error)]
pub enum FlashError {
    #[error("No port selected")]
    NoPort,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The header cannot take the form values (missing or duplicated define)
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    FileAccess(#[from] StoreError),

    #[error("{step} failed ({})", exit_label(.code))]
    ExternalCommand {
        step: &'static str,
        code: Option<i32>,
        /// Last lines of combined output
        tail: Vec<String>,
    },

    #[error("{0}")]
    Unexpected(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

impl FlashError {
    /// Reported before anything was written or run
    pub fn is_gate(&self) -> bool {
        matches!(
            self,
            FlashError::NoPort | FlashError::Validation(_) | FlashError::Codec(_)
        )
    }

    /// Outcome classification for a failed sequence
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            FlashError::FileAccess(_) => FailureKind::FileAccess,
            FlashError::ExternalCommand { .. } => FailureKind::ExternalCommand,
            _ => FailureKind::Unexpected,
        }
    }
}

impl From<RunnerError> for FlashError {
    fn from(err: RunnerError) -> Self {
        FlashError::Unexpected(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkflash_core::Field;

    #[test]
    fn test_messages() {
        assert_eq!(FlashError::NoPort.to_string(), "No port selected");
        assert_eq!(
            FlashError::from(ValidationError::LinkIdHex(Field::LinkId)).to_string(),
            "BSSID has invalid hex"
        );
        let err = FlashError::ExternalCommand {
            step: "build",
            code: Some(2),
            tail: Vec::new(),
        };
        assert_eq!(err.to_string(), "build failed (exit code 2)");
    }

    #[test]
    fn test_classification() {
        assert!(FlashError::NoPort.is_gate());
        assert!(FlashError::from(CodecError::Missing(Field::Channel)).is_gate());
        assert!(!FlashError::Unexpected("boom".into()).is_gate());

        let err = FlashError::ExternalCommand {
            step: "flash",
            code: None,
            tail: Vec::new(),
        };
        assert_eq!(err.failure_kind(), FailureKind::ExternalCommand);
        assert_eq!(
            FlashError::Unexpected("boom".into()).failure_kind(),
            FailureKind::Unexpected
        );
    }
}
