//! Round engine error types.
//!
//! Every rejection is recoverable: the engine leaves its state untouched and
//! the host may simply let the player try again.

use thiserror::Error;

/// Errors reported by [`RoundEngine`](crate::engine::RoundEngine) intents.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundError {
    /// The answer was empty or not a whole number.
    #[error("invalid answer: {raw:?} is not a whole number")]
    InvalidInput { raw: String },

    /// An answer was submitted while no round was accepting one.
    #[error("an answer was already recorded for this round")]
    DuplicateSubmission,

    /// `advance` was requested before the round was resolved.
    #[error("the current round has not been answered or timed out yet")]
    OutOfOrder,
}

impl RoundError {
    /// Returns `true` if the raw answer was missing entirely.
    pub fn is_empty_input(&self) -> bool {
        matches!(self, RoundError::InvalidInput { raw } if raw.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_detection() {
        assert!(RoundError::InvalidInput { raw: "  ".into() }.is_empty_input());
        assert!(!RoundError::InvalidInput { raw: "abc".into() }.is_empty_input());
        assert!(!RoundError::DuplicateSubmission.is_empty_input());
    }

    #[test]
    fn display_messages() {
        assert_eq!(
            RoundError::InvalidInput { raw: "x".into() }.to_string(),
            "invalid answer: \"x\" is not a whole number"
        );
        assert_eq!(
            RoundError::OutOfOrder.to_string(),
            "the current round has not been answered or timed out yet"
        );
    }
}
