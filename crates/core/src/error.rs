//! Error types for contract violations.
//!
//! Rejected player actions (a blocked move, a rotation with no valid kick) are not
//! errors; they surface as [`CommandOutcome::Unchanged`](crate::types::CommandOutcome).
//! The variants here mean the caller and the engine disagree about the game state.

use thiserror::Error;

use crate::types::GameStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("cannot lock piece: cell ({x}, {y}) is out of bounds or occupied")]
    InvalidLock { x: i8, y: i8 },
    #[error("{action} needs an active piece, but the game is {status:?}")]
    NoActivePiece {
        action: &'static str,
        status: GameStatus,
    },
}
