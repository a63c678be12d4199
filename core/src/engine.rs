//! Move engine: turns a board and a direction into the next board.
//!
//! Every direction is expressed as a set of lines read in "forward" order.
//! Left and up read rows and columns as stored; right and down read them
//! reversed, compact, and write the result back through the same reversed
//! positions. One `compact_line` serves all four directions.

use rand::Rng;

use crate::board::{can_merge, Board, Cell, Position};
use crate::line::{compact_line, Slot};
use crate::Direction;

/// Probability that a spawned tile is a 2 rather than a 4.
pub const SPAWN_TWO_PROBABILITY: f64 = 0.9;

/// A merge that happened during a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Merge {
    /// Where the combined tile landed on the new board.
    pub position: Position,
    /// Value of the combined tile.
    pub value: u32,
}

/// Everything a move produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    /// The next board, with per-move flags describing this move only.
    pub board: Board,
    /// Points earned from merges.
    pub score_delta: u32,
    /// Whether any line changed. A `false` here is a no-op move.
    pub moved: bool,
    /// Merges in row-major order of their landing position.
    pub merges: Vec<Merge>,
    /// Where the random tile went, if one was spawned.
    pub spawned: Option<Position>,
}

/// Positions of line `index`, ordered so the move direction points at slot 0.
fn line_positions(size: usize, direction: Direction, index: usize) -> Vec<Position> {
    let mut line: Vec<Position> = (0..size)
        .map(|i| match direction {
            Direction::Left | Direction::Right => Position::new(index, i),
            Direction::Up | Direction::Down => Position::new(i, index),
        })
        .collect();
    if matches!(direction, Direction::Right | Direction::Down) {
        line.reverse();
    }
    line
}

/// Slide and merge every line without spawning a tile.
///
/// The input board is left untouched. The returned board starts from cleared
/// flags, so `is_new` is false everywhere and `merged_from` marks only the
/// merges of this move. Deterministic: no randomness is involved.
pub fn slide(board: &Board, direction: Direction) -> MoveOutcome {
    let size = board.size();
    let mut next = Board::blank(size);
    let mut score_delta: u32 = 0;
    let mut moved = false;
    let mut merges = Vec::new();

    for index in 0..size {
        let positions = line_positions(size, direction, index);
        let values: Vec<u32> = positions.iter().map(|&pos| board[pos].value).collect();
        let line = compact_line(&values);

        score_delta = line.score.saturating_add(score_delta);
        moved |= line.changed;

        for (slot, &pos) in line.slots.iter().zip(&positions) {
            let cell = match *slot {
                Slot::Empty => Cell::EMPTY,
                Slot::Tile { value, .. } => Cell::tile(value),
                Slot::Merged { value, from } => {
                    merges.push(Merge {
                        position: pos,
                        value,
                    });
                    Cell::merged(value, [positions[from[0]], positions[from[1]]])
                }
            };
            next.set(pos, cell);
        }
    }

    merges.sort_by_key(|merge| merge.position);

    MoveOutcome {
        board: next,
        score_delta,
        moved,
        merges,
        spawned: None,
    }
}

/// Apply a move and, if anything changed, spawn one random tile.
///
/// A no-op move returns `moved = false` with the settled board and nothing
/// spawned; callers treat that as "pressed into a wall".
pub fn apply_move<R: Rng + ?Sized>(board: &Board, direction: Direction, rng: &mut R) -> MoveOutcome {
    let mut outcome = slide(board, direction);
    if outcome.moved {
        outcome.spawned = place_random_tile(&mut outcome.board, rng);
    }
    outcome
}

/// Place a 2 (90%) or 4 (10%) in a uniformly chosen empty cell.
///
/// Returns the board unchanged when it is full. Flags on other cells are not
/// touched; clearing them is the move's job, done once per move.
pub fn spawn_random_tile<R: Rng + ?Sized>(mut board: Board, rng: &mut R) -> Board {
    place_random_tile(&mut board, rng);
    board
}

pub(crate) fn place_random_tile<R: Rng + ?Sized>(board: &mut Board, rng: &mut R) -> Option<Position> {
    let empty = board.empty_positions();
    if empty.is_empty() {
        return None;
    }

    let pos = empty[rng.gen_range(0..empty.len())];
    let value = if rng.gen_bool(SPAWN_TWO_PROBABILITY) { 2 } else { 4 };
    board.set(pos, Cell::spawned(value));
    Some(pos)
}

/// True iff there is no empty cell and no adjacent pair shares a value.
///
/// Each row-adjacent and column-adjacent pair is checked once.
pub fn is_game_over(board: &Board) -> bool {
    if board.cells().iter().any(Cell::is_empty) {
        return false;
    }

    let size = board.size();
    for row in 0..size {
        for col in 0..size {
            let value = board[Position::new(row, col)].value;
            if !can_merge(value) {
                continue;
            }
            if col + 1 < size && board[Position::new(row, col + 1)].value == value {
                return false;
            }
            if row + 1 < size && board[Position::new(row + 1, col)].value == value {
                return false;
            }
        }
    }
    true
}

/// Whether a move in `direction` would change the board.
pub fn can_move(board: &Board, direction: Direction) -> bool {
    slide(board, direction).moved
}

/// Legal directions as a boolean array in `Direction::all()` order.
pub fn legal_directions(board: &Board) -> [bool; 4] {
    Direction::all().map(|direction| can_move(board, direction))
}

// =============================================================================
// Tests
// =============================================================================
