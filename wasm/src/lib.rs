//! # 4096 WebAssembly Bindings
//!
//! JavaScript-friendly bindings to the game core using wasm-bindgen. A
//! browser front end owns one `WasmGame`, feeds it key and swipe input as
//! direction codes, and calls `animationsComplete` once its tile transitions
//! have finished playing.

use game_4096_core::{
    Cell, Direction, GameSession, Position, SessionConfig, SessionDelta, SessionState, Snapshot,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Per-cell metadata the renderer animates from.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsCell {
    pub value: u32,
    pub is_new: bool,
    /// `[[row, col], [row, col]]` of the merged source tiles.
    pub merged_from: Option<[[usize; 2]; 2]>,
}

impl From<&Cell> for JsCell {
    fn from(cell: &Cell) -> Self {
        JsCell {
            value: cell.value,
            is_new: cell.is_new,
            merged_from: cell.merged_from.map(|[a, b]| [[a.row, a.col], [b.row, b.col]]),
        }
    }
}

/// Result of a move, serialized for JavaScript.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsMoveResult {
    /// Board rows of cell metadata.
    pub board: Vec<Vec<JsCell>>,
    pub score: u32,
    pub best_score: u32,
    /// Points earned from this move.
    pub score_delta: u32,
    /// False when the move arrived while animating or after game over.
    pub accepted: bool,
    pub moved: bool,
    /// One of "ready", "animating", "over".
    pub state: &'static str,
    pub reached_win: bool,
    pub spawned: Option<[usize; 2]>,
}

/// WebAssembly wrapper for a game session.
#[wasm_bindgen]
pub struct WasmGame {
    session: GameSession,
    seed: u64,
}

#[wasm_bindgen]
impl WasmGame {
    /// Create a new game.
    ///
    /// `best_score` comes from the page's local storage, 0 if none.
    #[wasm_bindgen(constructor)]
    pub fn new(size: usize, seed: u64, best_score: u32) -> Result<WasmGame, JsError> {
        let session = GameSession::with_config(SessionConfig::with_size(size), seed)?
            .with_best_score(best_score);
        Ok(WasmGame { session, seed })
    }

    /// Resume from a JSON snapshot produced by `snapshot`.
    #[wasm_bindgen(js_name = fromSnapshot)]
    pub fn from_snapshot(json: &str, seed: u64) -> Result<WasmGame, JsError> {
        let snapshot = Snapshot::from_json(json)?;
        let session = GameSession::resume(&snapshot, seed)?;
        Ok(WasmGame { session, seed })
    }

    /// Start a new game on the same board size. Best score is kept.
    #[wasm_bindgen(js_name = newGame)]
    pub fn new_game(&mut self) {
        self.session.reset();
    }

    /// Execute a move in the given direction.
    ///
    /// Direction codes: 0 = Up, 1 = Down, 2 = Left, 3 = Right. Any other
    /// code is rejected.
    #[wasm_bindgen(js_name = applyMove)]
    pub fn apply_move(&mut self, direction: u8) -> Result<JsValue, JsError> {
        let direction = Direction::try_from(direction)?;
        let delta = self.session.apply_move(direction);
        self.js_result(&delta)
    }

    /// Signal that the last move's animations have finished.
    #[wasm_bindgen(js_name = animationsComplete)]
    pub fn animations_complete(&mut self) -> String {
        state_name(self.session.animations_complete()).to_string()
    }

    /// Current board as rows of `{ value, isNew, mergedFrom }`.
    #[wasm_bindgen(js_name = getBoard)]
    pub fn get_board(&self) -> Result<JsValue, JsError> {
        Ok(serde_wasm_bindgen::to_value(&self.board_rows())?)
    }

    #[wasm_bindgen(js_name = getScore)]
    pub fn get_score(&self) -> u32 {
        self.session.score()
    }

    #[wasm_bindgen(js_name = getBestScore)]
    pub fn get_best_score(&self) -> u32 {
        self.session.best_score()
    }

    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        state_name(self.session.state()).to_string()
    }

    #[wasm_bindgen(js_name = isOver)]
    pub fn is_over(&self) -> bool {
        self.session.is_over()
    }

    #[wasm_bindgen(js_name = hasWon)]
    pub fn has_won(&self) -> bool {
        self.session.has_won()
    }

    /// Legal moves as 4 flags [Up, Down, Left, Right].
    #[wasm_bindgen(js_name = getLegalMoves)]
    pub fn get_legal_moves(&self) -> Vec<u8> {
        self.session
            .legal_directions()
            .iter()
            .map(|&legal| u8::from(legal))
            .collect()
    }

    /// JSON snapshot `{ board, score, bestScore }` for local storage.
    pub fn snapshot(&self) -> Result<String, JsError> {
        Ok(self.session.snapshot().to_json()?)
    }

    /// Seed this game was created with.
    #[wasm_bindgen(getter)]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn board_rows(&self) -> Vec<Vec<JsCell>> {
        self.session
            .board()
            .rows()
            .map(|row| row.iter().map(JsCell::from).collect())
            .collect()
    }

    fn js_result(&self, delta: &SessionDelta) -> Result<JsValue, JsError> {
        let result = JsMoveResult {
            board: self.board_rows(),
            score: delta.score,
            best_score: self.session.best_score(),
            score_delta: delta.score_delta,
            accepted: delta.accepted,
            moved: delta.moved,
            state: state_name(delta.state),
            reached_win: delta.reached_win,
            spawned: delta.spawned.map(|Position { row, col }| [row, col]),
        };
        Ok(serde_wasm_bindgen::to_value(&result)?)
    }
}

fn state_name(state: SessionState) -> &'static str {
    match state {
        SessionState::Ready => "ready",
        SessionState::Animating => "animating",
        SessionState::Over => "over",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_cell_from_merged_cell() {
        let cell = Cell {
            value: 8,
            is_new: false,
            merged_from: Some([Position::new(0, 1), Position::new(0, 2)]),
        };
        let js = JsCell::from(&cell);
        assert_eq!(js.value, 8);
        assert!(!js.is_new);
        assert_eq!(js.merged_from, Some([[0, 1], [0, 2]]));
    }

    #[test]
    fn test_state_names() {
        assert_eq!(state_name(SessionState::Ready), "ready");
        assert_eq!(state_name(SessionState::Animating), "animating");
        assert_eq!(state_name(SessionState::Over), "over");
    }

    #[test]
    fn test_legal_moves_and_board_shape() {
        let game = WasmGame {
            session: GameSession::new(4, 42).unwrap(),
            seed: 42,
        };
        assert_eq!(game.get_legal_moves().len(), 4);
        let rows = game.board_rows();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|row| row.len() == 4));
        let tiles = rows.iter().flatten().filter(|c| c.value != 0).count();
        assert_eq!(tiles, 2);
    }
}
