//! Line compaction, the primitive every move direction reduces to.
//!
//! A line arrives already oriented so that "forward" is index 0. Down and
//! right moves are handled by the engine reversing the line before and after.

use crate::board::can_merge;

/// One output position of a compacted line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Empty,
    /// A tile carried over from input index `from`.
    Tile { value: u32, from: usize },
    /// Two tiles from input indices `from[0]` and `from[1]` combined.
    Merged { value: u32, from: [usize; 2] },
}

impl Slot {
    pub fn value(&self) -> u32 {
        match *self {
            Slot::Empty => 0,
            Slot::Tile { value, .. } | Slot::Merged { value, .. } => value,
        }
    }

    pub fn is_merge(&self) -> bool {
        matches!(self, Slot::Merged { .. })
    }
}

/// Result of compacting a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactedLine {
    /// Same length as the input, tiles packed toward index 0.
    pub slots: Vec<Slot>,
    /// Sum of the values produced by merges in this line.
    pub score: u32,
    /// Whether any position differs from the input.
    pub changed: bool,
}

/// Slide a line toward index 0, merging equal neighbours once each.
///
/// Runs of equal values pair up from the front: `[2, 2, 2]` gives `[4, 2, 0]`.
/// A merged tile consumes both operands and is never compared again, so one
/// pass can not cascade into a second merge. Tiles at `MAX_TILE` only slide.
pub fn compact_line(values: &[u32]) -> CompactedLine {
    let dense: Vec<(usize, u32)> = values
        .iter()
        .copied()
        .enumerate()
        .filter(|&(_, value)| value != 0)
        .collect();

    let mut slots = Vec::with_capacity(values.len());
    let mut score: u32 = 0;
    let mut read = 0;
    while read < dense.len() {
        let (from, value) = dense[read];
        match dense.get(read + 1) {
            Some(&(next_from, next_value)) if next_value == value && can_merge(value) => {
                let merged = value * 2;
                score = score.saturating_add(merged);
                slots.push(Slot::Merged {
                    value: merged,
                    from: [from, next_from],
                });
                read += 2;
            }
            _ => {
                slots.push(Slot::Tile { value, from });
                read += 1;
            }
        }
    }
    slots.resize(values.len(), Slot::Empty);

    let changed = slots
        .iter()
        .zip(values)
        .any(|(slot, &before)| slot.is_merge() || slot.value() != before);

    CompactedLine {
        slots,
        score,
        changed,
    }
}
