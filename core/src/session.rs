//! Game session: score bookkeeping and the Ready / Animating / Over machine.
//!
//! The session owns its board and RNG outright. Front ends feed it
//! directions and an "animations complete" signal and read back a
//! `SessionDelta` describing what happened.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::board::{is_valid_tile, Board, Position, DEFAULT_SIZE, MIN_SIZE};
use crate::engine::{self, Merge};
use crate::error::{GameError, Result};
use crate::observer::{MergeObserver, Verdict};
use crate::Direction;

/// Tile value that counts as winning.
pub const DEFAULT_WIN_TILE: u32 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// Accepting moves.
    Ready,
    /// A move's transition is being drawn; input is dropped until the
    /// renderer calls `animations_complete`.
    Animating,
    /// Terminal until the next `reset`.
    Over,
}

/// Why a session reached `Over`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndReason {
    /// Board full with no adjacent pair.
    NoMoves,
    /// A merge observer ended the game.
    Observer,
}

/// Session parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    /// Board side length.
    pub size: usize,
    /// First tile value that marks the session as won.
    pub win_tile: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            size: DEFAULT_SIZE,
            win_tile: DEFAULT_WIN_TILE,
        }
    }
}

impl SessionConfig {
    pub fn with_size(size: usize) -> Self {
        SessionConfig {
            size,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.size < MIN_SIZE {
            return Err(GameError::invariant(format!(
                "board size must be at least {MIN_SIZE}, got {}",
                self.size
            )));
        }
        if self.win_tile < 4 || !is_valid_tile(self.win_tile) {
            return Err(GameError::invariant(format!(
                "win tile must be a power of two >= 4, got {}",
                self.win_tile
            )));
        }
        Ok(())
    }
}

/// What a call to `GameSession::apply_move` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDelta {
    /// False when the move arrived outside `Ready` and was dropped.
    pub accepted: bool,
    /// Whether the board changed.
    pub moved: bool,
    pub score_delta: u32,
    /// Session score after the move.
    pub score: u32,
    /// Session state after the move.
    pub state: SessionState,
    pub merges: Vec<Merge>,
    pub spawned: Option<Position>,
    /// True only on the move that first reached the win tile.
    pub reached_win: bool,
    pub end_reason: Option<EndReason>,
}

/// One game in progress.
#[derive(Debug, Clone)]
pub struct GameSession<R = SmallRng> {
    config: SessionConfig,
    board: Board,
    score: u32,
    best_score: u32,
    state: SessionState,
    won: bool,
    end_reason: Option<EndReason>,
    rng: R,
}

/// Start a seeded game on a `size` x `size` board.
pub fn new_game(size: usize, seed: u64) -> Result<GameSession> {
    GameSession::new(size, seed)
}

impl GameSession<SmallRng> {
    /// Create a new game with the given board size and seed.
    ///
    /// The board starts with two random tiles (90% chance of 2, 10% of 4).
    pub fn new(size: usize, seed: u64) -> Result<Self> {
        Self::with_config(SessionConfig::with_size(size), seed)
    }

    pub fn with_config(config: SessionConfig, seed: u64) -> Result<Self> {
        Self::with_rng(config, SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> GameSession<R> {
    /// Create a new game drawing spawns from `rng`.
    pub fn with_rng(config: SessionConfig, mut rng: R) -> Result<Self> {
        config.validate()?;
        let board = seeded_board(config.size, &mut rng);
        Ok(GameSession {
            config,
            board,
            score: 0,
            best_score: 0,
            state: SessionState::Ready,
            won: false,
            end_reason: None,
            rng,
        })
    }

    /// Seed the best score from persisted storage.
    pub fn with_best_score(mut self, best_score: u32) -> Self {
        self.best_score = self.best_score.max(best_score);
        self
    }

    /// Start over on a fresh board. Best score and RNG stream carry on.
    pub fn reset(&mut self) {
        self.board = seeded_board(self.config.size, &mut self.rng);
        self.score = 0;
        self.state = SessionState::Ready;
        self.won = false;
        self.end_reason = None;
        log::debug!("session reset");
    }

    /// Apply a move with no observers attached.
    pub fn apply_move(&mut self, direction: Direction) -> SessionDelta {
        self.apply_move_observed(direction, &mut [])
    }

    /// Apply a move, then hand every merge to `observers` in board order.
    ///
    /// Moves arriving while `Animating` or `Over` are dropped, not queued.
    /// A no-op move leaves the session untouched. A successful move updates
    /// score and best score, then goes to `Over` if the board is stuck or an
    /// observer says so, and to `Animating` otherwise.
    pub fn apply_move_observed(
        &mut self,
        direction: Direction,
        observers: &mut [&mut dyn MergeObserver],
    ) -> SessionDelta {
        if self.state != SessionState::Ready {
            log::debug!("move {direction:?} ignored in state {:?}", self.state);
            return self.unchanged(false);
        }

        let outcome = engine::apply_move(&self.board, direction, &mut self.rng);
        if !outcome.moved {
            log::debug!("move {direction:?} changed nothing");
            return self.unchanged(true);
        }

        self.board = outcome.board;
        self.score = self.score.saturating_add(outcome.score_delta);
        self.best_score = self.best_score.max(self.score);

        let reached_win = !self.won && self.board.max_tile() >= self.config.win_tile;
        if reached_win {
            self.won = true;
            log::info!("reached {} with score {}", self.config.win_tile, self.score);
        }

        let mut end_reason = None;
        'merges: for merge in &outcome.merges {
            for observer in observers.iter_mut() {
                if observer.on_merge(merge.value, self.score) == Verdict::EndGame {
                    end_reason = Some(EndReason::Observer);
                    break 'merges;
                }
            }
        }
        if end_reason.is_none() && engine::is_game_over(&self.board) {
            end_reason = Some(EndReason::NoMoves);
        }

        self.end_reason = end_reason;
        self.state = match end_reason {
            Some(reason) => {
                log::info!("game over ({reason:?}) with score {}", self.score);
                SessionState::Over
            }
            None => SessionState::Animating,
        };
        log::debug!(
            "move {direction:?}: +{} -> {}, state {:?}",
            outcome.score_delta,
            self.score,
            self.state
        );

        SessionDelta {
            accepted: true,
            moved: true,
            score_delta: outcome.score_delta,
            score: self.score,
            state: self.state,
            merges: outcome.merges,
            spawned: outcome.spawned,
            reached_win,
            end_reason,
        }
    }

    /// Renderer signal: the last move's transition finished drawing.
    ///
    /// Moves `Animating` back to `Ready`. Signals in any other state are
    /// ignored.
    pub fn animations_complete(&mut self) -> SessionState {
        if self.state == SessionState::Animating {
            self.state = SessionState::Ready;
        } else {
            log::warn!("animations_complete ignored in state {:?}", self.state);
        }
        self.state
    }

    fn unchanged(&self, accepted: bool) -> SessionDelta {
        SessionDelta {
            accepted,
            moved: false,
            score_delta: 0,
            score: self.score,
            state: self.state,
            merges: Vec::new(),
            spawned: None,
            reached_win: false,
            end_reason: self.end_reason,
        }
    }

    pub(crate) fn restore(
        config: SessionConfig,
        board: Board,
        score: u32,
        best_score: u32,
        rng: R,
    ) -> Result<Self> {
        config.validate()?;
        let won = board.max_tile() >= config.win_tile;
        let (state, end_reason) = if engine::is_game_over(&board) {
            (SessionState::Over, Some(EndReason::NoMoves))
        } else {
            (SessionState::Ready, None)
        };
        Ok(GameSession {
            config,
            board,
            score,
            best_score: best_score.max(score),
            state,
            won,
            end_reason,
            rng,
        })
    }
}

impl<R> GameSession<R> {
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn best_score(&self) -> u32 {
        self.best_score
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_over(&self) -> bool {
        self.state == SessionState::Over
    }

    /// Whether the win tile has appeared at any point this game.
    pub fn has_won(&self) -> bool {
        self.won
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    /// Legal directions as a boolean array in `Direction::all()` order.
    pub fn legal_directions(&self) -> [bool; 4] {
        engine::legal_directions(&self.board)
    }
}

fn seeded_board<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Board {
    let mut board = Board::blank(size);
    engine::place_random_tile(&mut board, rng);
    engine::place_random_tile(&mut board, rng);
    board
}

// =============================================================================
// Tests
// =============================================================================
