//! Board-level properties checked over many seeded random boards.

use game_4096_core::{apply_move, is_game_over, slide, Board, Direction, Position};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

const TRIALS: u64 = 500;

/// Random board with a mix of empty cells and small tiles, so merges are common.
fn random_board(rng: &mut SmallRng, size: usize) -> Board {
    let rows: Vec<Vec<u32>> = (0..size)
        .map(|_| {
            (0..size)
                .map(|_| match rng.gen_range(0..6u32) {
                    0 | 1 => 0,
                    n => 1 << n.min(4),
                })
                .collect()
        })
        .collect();
    Board::from_rows(&rows).unwrap()
}

fn mirror(board: &Board) -> Board {
    let rows: Vec<Vec<u32>> = board
        .values()
        .into_iter()
        .map(|mut row| {
            row.reverse();
            row
        })
        .collect();
    Board::from_rows(&rows).unwrap()
}

fn transpose(board: &Board) -> Board {
    let values = board.values();
    let size = board.size();
    let rows: Vec<Vec<u32>> = (0..size)
        .map(|col| (0..size).map(|row| values[row][col]).collect())
        .collect();
    Board::from_rows(&rows).unwrap()
}

fn sorted_tiles(values: impl IntoIterator<Item = u32>) -> Vec<u32> {
    let mut tiles: Vec<u32> = values.into_iter().filter(|&v| v != 0).collect();
    tiles.sort_unstable();
    tiles
}

// -----------------------------------------------------------------------------
// Conservation
// -----------------------------------------------------------------------------

#[test]
fn merges_conserve_tile_values() {
    let mut rng = SmallRng::seed_from_u64(2024);
    for _ in 0..TRIALS {
        let board = random_board(&mut rng, 4);
        for direction in Direction::all() {
            let outcome = apply_move(&board, direction, &mut rng);
            if !outcome.moved {
                assert_eq!(outcome.spawned, None);
                continue;
            }

            // replace every merged {v, v} with {2v}, then add the spawn
            let mut expected: Vec<u32> = board.cells().iter().map(|c| c.value).collect();
            for merge in &outcome.merges {
                let half = merge.value / 2;
                for _ in 0..2 {
                    let idx = expected.iter().position(|&v| v == half).unwrap();
                    expected.remove(idx);
                }
                expected.push(merge.value);
            }
            let spawned = outcome.spawned.expect("moved boards always have room");
            expected.push(outcome.board[spawned].value);

            let actual = sorted_tiles(outcome.board.cells().iter().map(|c| c.value));
            assert_eq!(actual, sorted_tiles(expected), "{direction} on {board:?}");
        }
    }
}

#[test]
fn score_delta_is_sum_of_merged_values() {
    let mut rng = SmallRng::seed_from_u64(7);
    for _ in 0..TRIALS {
        let board = random_board(&mut rng, 4);
        for direction in Direction::all() {
            let outcome = slide(&board, direction);
            let merged: u32 = outcome.merges.iter().map(|m| m.value).sum();
            assert_eq!(outcome.score_delta, merged);
        }
    }
}

// -----------------------------------------------------------------------------
// No double merge
// -----------------------------------------------------------------------------

#[test]
fn merge_sources_are_distinct_and_used_once() {
    let mut rng = SmallRng::seed_from_u64(99);
    for _ in 0..TRIALS {
        let board = random_board(&mut rng, 5);
        for direction in Direction::all() {
            let outcome = slide(&board, direction);
            let mut sources: Vec<Position> = Vec::new();
            for pos in outcome.board.positions() {
                let cell = outcome.board[pos];
                if let Some([a, b]) = cell.merged_from {
                    // both operands held half the merged value before the move
                    assert_eq!(board[a].value * 2, cell.value);
                    assert_eq!(board[b].value * 2, cell.value);
                    sources.push(a);
                    sources.push(b);
                }
            }
            let count = sources.len();
            sources.sort();
            sources.dedup();
            assert_eq!(sources.len(), count, "a tile merged twice: {board:?}");
        }
    }
}

#[test]
fn uniform_line_merges_pairwise_only() {
    let board = Board::from_rows(&[[4u32, 4, 4, 4], [0; 4], [0; 4], [0; 4]]).unwrap();
    let outcome = slide(&board, Direction::Left);
    assert_eq!(outcome.board.values()[0], vec![8, 8, 0, 0]);
    assert_eq!(outcome.score_delta, 16);
}

// -----------------------------------------------------------------------------
// No-op detection
// -----------------------------------------------------------------------------

#[test]
fn repeated_slide_is_a_noop() {
    let mut rng = SmallRng::seed_from_u64(31);
    for _ in 0..TRIALS {
        let board = random_board(&mut rng, 4);
        for direction in Direction::all() {
            let first = slide(&board, direction);
            // a second slide can still merge tiles the first pass produced,
            // so keep going until it settles
            let mut current = first.board;
            loop {
                let next = slide(&current, direction);
                if !next.moved {
                    assert_eq!(next.board, current.settled());
                    assert_eq!(next.score_delta, 0);
                    assert!(next.merges.is_empty());
                    break;
                }
                current = next.board;
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Directional symmetry
// -----------------------------------------------------------------------------

#[test]
fn left_and_right_are_mirror_images() {
    let mut rng = SmallRng::seed_from_u64(5);
    for _ in 0..TRIALS {
        let board = random_board(&mut rng, 4);
        let left = slide(&board, Direction::Left);
        let right = slide(&mirror(&board), Direction::Right);
        assert_eq!(mirror(&left.board).values(), right.board.values());
        assert_eq!(left.score_delta, right.score_delta);
        assert_eq!(left.moved, right.moved);
    }
}

#[test]
fn up_and_left_are_transposes() {
    let mut rng = SmallRng::seed_from_u64(6);
    for _ in 0..TRIALS {
        let board = random_board(&mut rng, 4);
        let up = slide(&board, Direction::Up);
        let left = slide(&transpose(&board), Direction::Left);
        assert_eq!(transpose(&up.board).values(), left.board.values());
        assert_eq!(up.score_delta, left.score_delta);

        let down = slide(&board, Direction::Down);
        let right = slide(&transpose(&board), Direction::Right);
        assert_eq!(transpose(&down.board).values(), right.board.values());
    }
}

// -----------------------------------------------------------------------------
// Game over
// -----------------------------------------------------------------------------

#[test]
fn game_over_iff_no_direction_moves() {
    let mut rng = SmallRng::seed_from_u64(11);
    let mut stuck = 0;
    for _ in 0..TRIALS * 4 {
        // only tiles, no gaps, so a good share of boards are stuck
        let rows: Vec<Vec<u32>> = (0..3)
            .map(|_| (0..3).map(|_| 2u32 << rng.gen_range(0..4u32)).collect())
            .collect();
        let board = Board::from_rows(&rows).unwrap();
        let any_move = Direction::all()
            .into_iter()
            .any(|direction| slide(&board, direction).moved);
        assert_eq!(is_game_over(&board), !any_move, "{board:?}");
        if !any_move {
            stuck += 1;
        }
    }
    assert!(stuck > 0);
}

#[test]
fn full_board_without_pairs_rejects_every_move() {
    let board = Board::from_rows(&[
        [2u32, 4, 8, 16],
        [32, 64, 128, 256],
        [2, 4, 8, 16],
        [32, 64, 128, 256],
    ])
    .unwrap();
    assert!(is_game_over(&board));
    let mut rng = SmallRng::seed_from_u64(0);
    for direction in Direction::all() {
        let outcome = apply_move(&board, direction, &mut rng);
        assert!(!outcome.moved);
        assert_eq!(outcome.board.values(), board.values());
    }
}

#[test]
fn full_board_with_one_pair_is_not_over() {
    let board = Board::from_rows(&[
        [2u32, 4, 8, 16],
        [32, 64, 128, 256],
        [2, 4, 8, 16],
        [32, 64, 256, 256],
    ])
    .unwrap();
    assert!(!is_game_over(&board));
}
