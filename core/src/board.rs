//! Grid representation: cells, positions and the square board that holds them.

use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Side length used when the caller does not pick one.
pub const DEFAULT_SIZE: usize = 4;

/// Smallest board on which a merge is possible.
pub const MIN_SIZE: usize = 2;

/// Largest tile a `u32` cell can hold. Tiles at the cap no longer merge.
pub const MAX_TILE: u32 = 1 << 31;

/// A board coordinate. Row 0 is the top, column 0 the left edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }
}

/// One grid position and the per-move annotations a renderer animates from.
///
/// `is_new` and `merged_from` describe only the move that produced this
/// board; every move starts from a board whose flags are cleared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    /// 0 for an empty cell, otherwise a power of two >= 2.
    pub value: u32,
    /// Set on the move in which the spawn step placed this tile.
    pub is_new: bool,
    /// Pre-move positions of the two tiles that combined into this one.
    pub merged_from: Option<[Position; 2]>,
}

impl Cell {
    pub const EMPTY: Cell = Cell {
        value: 0,
        is_new: false,
        merged_from: None,
    };

    /// A settled tile with no per-move flags.
    pub const fn tile(value: u32) -> Self {
        Cell {
            value,
            is_new: false,
            merged_from: None,
        }
    }

    pub(crate) const fn spawned(value: u32) -> Self {
        Cell {
            value,
            is_new: true,
            merged_from: None,
        }
    }

    pub(crate) const fn merged(value: u32, from: [Position; 2]) -> Self {
        Cell {
            value,
            is_new: false,
            merged_from: Some(from),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value == 0
    }
}

/// Check that a raw value can sit on a board: empty, or a power of two >= 2.
pub(crate) fn is_valid_tile(value: u32) -> bool {
    value == 0 || (value >= 2 && value.is_power_of_two())
}

/// Whether two equal tiles of `value` may merge. The doubled value must fit.
pub(crate) fn can_merge(value: u32) -> bool {
    value != 0 && value < MAX_TILE
}

/// A square grid of cells stored in row-major order.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Board {
    size: usize,
    cells: Vec<Cell>,
}

impl Board {
    /// Build an empty board with side length `size`.
    pub fn empty(size: usize) -> Result<Self> {
        if size < MIN_SIZE {
            return Err(GameError::invariant(format!(
                "board size must be at least {MIN_SIZE}, got {size}"
            )));
        }
        Ok(Board::blank(size))
    }

    /// Build a board from rows of raw tile values (0 for empty).
    ///
    /// Fails when the rows do not form a square of at least `MIN_SIZE`, or when
    /// a value is neither 0 nor a power of two >= 2. All cells come back with
    /// their per-move flags cleared.
    pub fn from_rows<R: AsRef<[u32]>>(rows: &[R]) -> Result<Self> {
        let size = rows.len();
        let mut board = Board::empty(size)?;
        for (row, values) in rows.iter().enumerate() {
            let values = values.as_ref();
            if values.len() != size {
                return Err(GameError::invariant(format!(
                    "row {row} has {} cells, expected {size}",
                    values.len()
                )));
            }
            for (col, &value) in values.iter().enumerate() {
                if !is_valid_tile(value) {
                    return Err(GameError::invariant(format!(
                        "illegal tile value {value} at ({row}, {col})"
                    )));
                }
                board.set(Position::new(row, col), Cell::tile(value));
            }
        }
        Ok(board)
    }

    /// Size is trusted; callers have already validated it.
    pub(crate) fn blank(size: usize) -> Self {
        Board {
            size,
            cells: vec![Cell::EMPTY; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn get(&self, pos: Position) -> Option<&Cell> {
        if pos.row < self.size && pos.col < self.size {
            self.cells.get(pos.row * self.size + pos.col)
        } else {
            None
        }
    }

    pub(crate) fn set(&mut self, pos: Position, cell: Cell) {
        let idx = pos.row * self.size + pos.col;
        self.cells[idx] = cell;
    }

    /// Iterate the board one row slice at a time, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> + '_ {
        self.cells.chunks(self.size)
    }

    /// Every position in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let size = self.size;
        (0..size * size).map(move |idx| Position::new(idx / size, idx % size))
    }

    /// Raw values as nested rows, the shape used by snapshots and front ends.
    pub fn values(&self) -> Vec<Vec<u32>> {
        self.rows()
            .map(|row| row.iter().map(|cell| cell.value).collect())
            .collect()
    }

    /// Positions of all empty cells in row-major order.
    pub fn empty_positions(&self) -> Vec<Position> {
        self.positions()
            .filter(|&pos| self[pos].is_empty())
            .collect()
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_empty()).count()
    }

    /// Largest tile value on the board, 0 when empty.
    pub fn max_tile(&self) -> u32 {
        self.cells.iter().map(|cell| cell.value).max().unwrap_or(0)
    }

    /// Same values with every per-move flag cleared.
    pub fn settled(&self) -> Board {
        Board {
            size: self.size,
            cells: self.cells.iter().map(|cell| Cell::tile(cell.value)).collect(),
        }
    }

    /// True when the board is full and no adjacent pair can merge.
    pub fn is_game_over(&self) -> bool {
        crate::engine::is_game_over(self)
    }
}

impl Index<Position> for Board {
    type Output = Cell;

    fn index(&self, pos: Position) -> &Cell {
        &self.cells[pos.row * self.size + pos.col]
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board {{ size: {} }}", self.size)?;
        for row in self.rows() {
            for cell in row {
                if cell.is_empty() {
                    write!(f, "     .")?;
                } else {
                    let mark = if cell.is_new {
                        '*'
                    } else if cell.merged_from.is_some() {
                        '+'
                    } else {
                        ' '
                    };
                    write!(f, "{:5}{}", cell.value, mark)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let border = format!("+{}", "-------+".repeat(self.size));
        writeln!(f, "{border}")?;
        for row in self.rows() {
            write!(f, "|")?;
            for cell in row {
                if cell.is_empty() {
                    write!(f, "       |")?;
                } else {
                    write!(f, "{:^7}|", cell.value)?;
                }
            }
            writeln!(f)?;
            writeln!(f, "{border}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_board() {
        let board = Board::empty(4).unwrap();
        assert_eq!(board.size(), 4);
        assert_eq!(board.empty_count(), 16);
        assert_eq!(board.max_tile(), 0);
        assert!(board.cells().iter().all(|c| *c == Cell::EMPTY));
    }

    #[test]
    fn test_empty_rejects_tiny_boards() {
        assert!(matches!(
            Board::empty(1),
            Err(GameError::InvariantViolation(_))
        ));
        assert!(Board::empty(0).is_err());
    }

    #[test]
    fn test_from_rows_round_trips_values() {
        let rows: [[u32; 3]; 3] = [[2, 0, 4], [0, 8, 0], [16, 0, 2]];
        let board = Board::from_rows(&rows).unwrap();
        assert_eq!(board.size(), 3);
        assert_eq!(board.values(), vec![vec![2, 0, 4], vec![0, 8, 0], vec![16, 0, 2]]);
        assert_eq!(board[Position::new(2, 0)].value, 16);
        assert_eq!(board.max_tile(), 16);
        assert_eq!(board.empty_count(), 4);
    }

    #[test]
    fn test_from_rows_rejects_ragged_rows() {
        let rows: Vec<Vec<u32>> = vec![vec![2, 0], vec![0, 0, 0]];
        assert!(matches!(
            Board::from_rows(&rows),
            Err(GameError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_from_rows_rejects_bad_tiles() {
        assert!(Board::from_rows(&[[3u32, 0], [0, 0]]).is_err());
        assert!(Board::from_rows(&[[1u32, 0], [0, 0]]).is_err());
        assert!(Board::from_rows(&[[2u32, 0], [0, 6]]).is_err());
    }

    #[test]
    fn test_from_rows_accepts_largest_tile() {
        let board = Board::from_rows(&[[MAX_TILE, 0], [0, 2]]).unwrap();
        assert_eq!(board.max_tile(), MAX_TILE);
        assert!(!can_merge(MAX_TILE));
        assert!(can_merge(MAX_TILE / 2));
    }

    #[test]
    fn test_empty_positions_row_major() {
        let board = Board::from_rows(&[[2u32, 0], [0, 4]]).unwrap();
        assert_eq!(
            board.empty_positions(),
            vec![Position::new(0, 1), Position::new(1, 0)]
        );
    }

    #[test]
    fn test_get_out_of_range() {
        let board = Board::empty(2).unwrap();
        assert!(board.get(Position::new(1, 1)).is_some());
        assert!(board.get(Position::new(2, 0)).is_none());
        assert!(board.get(Position::new(0, 2)).is_none());
    }

    #[test]
    fn test_settled_clears_flags() {
        let mut board = Board::empty(2).unwrap();
        board.set(Position::new(0, 0), Cell::spawned(2));
        board.set(
            Position::new(0, 1),
            Cell::merged(4, [Position::new(0, 0), Position::new(0, 1)]),
        );
        let settled = board.settled();
        assert_eq!(settled.values(), board.values());
        assert!(settled.cells().iter().all(|c| !c.is_new && c.merged_from.is_none()));
    }

    #[test]
    fn test_display_format() {
        let board = Board::from_rows(&[[2u32, 0], [0, 4096]]).unwrap();
        let display = format!("{}", board);
        assert!(display.contains("+-------+-------+"));
        assert!(display.contains("4096"));
    }

    #[test]
    fn test_debug_marks_flags() {
        let mut board = Board::empty(2).unwrap();
        board.set(Position::new(0, 0), Cell::spawned(2));
        let debug = format!("{:?}", board);
        assert!(debug.contains("Board"));
        assert!(debug.contains("2*"));
    }
}
