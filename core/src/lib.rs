//! # 4096 Game Core Engine
//!
//! The board transition algorithm and session state machine behind a
//! 4096-style tile-merging game. Moves are pure functions over a `Board`;
//! randomness only enters through the tile spawn step and is injectable, so
//! games replay exactly from a seed.
//!
//! Rendering, input handling and storage live in front ends (see the CLI and
//! wasm crates). They drive a `GameSession` and read back per-cell metadata
//! (`value`, `is_new`, `merged_from`) to animate each move.
//!
//! ## Example
//!
//! ```rust
//! use game_4096_core::{new_game, Direction, SessionState};
//!
//! let mut session = new_game(4, 42).unwrap();
//! let delta = session.apply_move(Direction::Left);
//! if delta.state == SessionState::Animating {
//!     session.animations_complete();
//! }
//! println!("Score: {}, Moved: {}", session.score(), delta.moved);
//! ```

use std::fmt;

pub mod board;
pub mod engine;
pub mod error;
pub mod line;
pub mod observer;
pub mod session;
pub mod snapshot;

pub use board::{Board, Cell, Position, DEFAULT_SIZE, MAX_TILE};
pub use engine::{apply_move, is_game_over, slide, spawn_random_tile, Merge, MoveOutcome};
pub use error::{GameError, Result};
pub use observer::{MergeHazard, MergeObserver, SkillProgress, Verdict};
pub use session::{
    new_game, EndReason, GameSession, SessionConfig, SessionDelta, SessionState,
    DEFAULT_WIN_TILE,
};
pub use snapshot::Snapshot;

/// The four possible move directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
}

impl Direction {
    /// All four directions, in discriminant order.
    pub fn all() -> [Direction; 4] {
        [Direction::Up, Direction::Down, Direction::Left, Direction::Right]
    }
}

/// Decode a direction code (0=Up, 1=Down, 2=Left, 3=Right) from a front end.
impl TryFrom<u8> for Direction {
    type Error = GameError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Direction::Up),
            1 => Ok(Direction::Down),
            2 => Ok(Direction::Left),
            3 => Ok(Direction::Right),
            other => Err(GameError::invariant(format!(
                "direction code must be 0..=3, got {other}"
            ))),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_try_from() {
        assert_eq!(Direction::try_from(0).unwrap(), Direction::Up);
        assert_eq!(Direction::try_from(1).unwrap(), Direction::Down);
        assert_eq!(Direction::try_from(2).unwrap(), Direction::Left);
        assert_eq!(Direction::try_from(3).unwrap(), Direction::Right);
        assert!(matches!(
            Direction::try_from(4),
            Err(GameError::InvariantViolation(_))
        ));
        assert!(Direction::try_from(255).is_err());
    }

    #[test]
    fn test_direction_all_matches_codes() {
        for (code, direction) in Direction::all().into_iter().enumerate() {
            assert_eq!(direction as usize, code);
        }
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(Direction::Left.to_string(), "left");
        assert_eq!(format!("{}", Direction::Down), "down");
    }
}
