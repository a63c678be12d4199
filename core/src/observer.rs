//! Merge observers: meta-progression hooks that sit outside the move engine.
//!
//! A session calls each observer once per merge after a successful move has
//! been applied and scored. Observers only see `(merged_value, new_score)`;
//! they can end the session through their `Verdict` but never touch the board.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Base merge score needed to earn one skill point.
pub const SCORE_PER_SKILL_POINT: u32 = 100;

/// Per-merge death chance used when no difficulty is chosen.
pub const DEFAULT_DEATH_RATE: f64 = 0.005;

/// What an observer wants the session to do after seeing a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    /// End the session immediately.
    EndGame,
}

pub trait MergeObserver {
    /// Called once per merge, in board order, after the move's score landed.
    fn on_merge(&mut self, merged_value: u32, new_score: u32) -> Verdict;
}

impl<F> MergeObserver for F
where
    F: FnMut(u32, u32) -> Verdict,
{
    fn on_merge(&mut self, merged_value: u32, new_score: u32) -> Verdict {
        self(merged_value, new_score)
    }
}

/// Skill points earned from merges.
///
/// Each merge adds its base value to a running total; crossing
/// `SCORE_PER_SKILL_POINT` awards a single point and keeps the remainder
/// modulo the threshold. A single large merge therefore never awards more
/// than one point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillProgress {
    points: u32,
    toward_next: u32,
}

impl SkillProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unspent skill points.
    pub fn points(&self) -> u32 {
        self.points
    }

    /// Score accumulated toward the next point.
    pub fn toward_next(&self) -> u32 {
        self.toward_next
    }

    /// Spend `cost` points. Returns false, spending nothing, if short.
    pub fn spend(&mut self, cost: u32) -> bool {
        if cost > self.points {
            return false;
        }
        self.points -= cost;
        true
    }

    /// Progress resets with each new game; earned points carry over.
    pub fn reset_progress(&mut self) {
        self.toward_next = 0;
    }
}

impl MergeObserver for SkillProgress {
    fn on_merge(&mut self, merged_value: u32, _new_score: u32) -> Verdict {
        let total = self.toward_next + merged_value;
        if total >= SCORE_PER_SKILL_POINT {
            self.points += 1;
            self.toward_next = total % SCORE_PER_SKILL_POINT;
            log::debug!("skill point earned, now {}", self.points);
        } else {
            self.toward_next = total;
        }
        Verdict::Continue
    }
}

/// Random death on merge, scaled by difficulty.
///
/// Rolls once per merge with its own RNG so that enabling it does not shift
/// the tile spawn sequence of the session.
#[derive(Debug, Clone)]
pub struct MergeHazard<R = SmallRng> {
    death_rate: f64,
    rng: R,
}

impl MergeHazard<SmallRng> {
    pub fn new(death_rate: f64, seed: u64) -> Result<Self> {
        Self::with_rng(death_rate, SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> MergeHazard<R> {
    /// `death_rate` must lie in `0.0..=1.0`.
    pub fn with_rng(death_rate: f64, rng: R) -> Result<Self> {
        if !(0.0..=1.0).contains(&death_rate) {
            return Err(GameError::invariant(format!(
                "death rate must be within 0..=1, got {death_rate}"
            )));
        }
        Ok(MergeHazard { death_rate, rng })
    }

    pub fn death_rate(&self) -> f64 {
        self.death_rate
    }
}

impl<R: Rng> MergeObserver for MergeHazard<R> {
    fn on_merge(&mut self, merged_value: u32, new_score: u32) -> Verdict {
        if self.rng.gen_bool(self.death_rate) {
            log::info!("merge hazard hit on {merged_value} at score {new_score}");
            Verdict::EndGame
        } else {
            Verdict::Continue
        }
    }
}
