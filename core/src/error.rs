use thiserror::Error;

/// Errors raised by the game core.
///
/// The board algorithm itself never fails; these only surface when a caller
/// hands the core something that could not have come from a legal game.
#[derive(Debug, Error)]
pub enum GameError {
    /// Malformed input: wrong board shape, illegal tile, unknown direction.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("malformed snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl GameError {
    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        GameError::InvariantViolation(msg.into())
    }
}

pub type Result<T, E = GameError> = std::result::Result<T, E>;
