//! Serialized session state for save and resume.
//!
//! The JSON shape is `{ "board": [[...]], "score": n, "bestScore": n }`, with
//! `bestScore` optional on input. Per-move flags are not persisted; a resumed
//! board starts settled.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::error::Result;
use crate::session::{GameSession, SessionConfig, DEFAULT_WIN_TILE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Tile values by row, 0 for empty.
    pub board: Vec<Vec<u32>>,
    pub score: u32,
    #[serde(default)]
    pub best_score: u32,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl<R> GameSession<R> {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            board: self.board().values(),
            score: self.score(),
            best_score: self.best_score(),
        }
    }
}

impl GameSession<SmallRng> {
    /// Rebuild a session from a snapshot with the default win tile.
    ///
    /// The board is validated the same way `Board::from_rows` does. The
    /// session resumes `Over` if the saved board is already stuck.
    pub fn resume(snapshot: &Snapshot, seed: u64) -> Result<Self> {
        Self::resume_with_rng(snapshot, DEFAULT_WIN_TILE, SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> GameSession<R> {
    pub fn resume_with_rng(snapshot: &Snapshot, win_tile: u32, rng: R) -> Result<Self> {
        let board = Board::from_rows(&snapshot.board)?;
        let config = SessionConfig {
            size: board.size(),
            win_tile,
        };
        GameSession::restore(config, board, snapshot.score, snapshot.best_score, rng)
    }
}
