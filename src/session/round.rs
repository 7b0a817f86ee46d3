use std::time::Instant;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::engine::mapper::StaffPosition;
use crate::engine::pitch::{Accidental, Pitch};
use crate::engine::selection::SelectionSet;
use crate::engine::validator::ValidationResult;

/// Targets are drawn from positions needing at most one ledger line.
pub const MAX_TARGET_LEDGER_LINES: usize = 1;

/// Sharps and flats, when enabled, each appear with this probability.
const ACCIDENTAL_CHANCE: f64 = 0.15;

pub struct RoundState {
    pub target: Vec<Pitch>,
    pub selection: SelectionSet,
    pub started_at: Instant,
    pub finished_at: Option<Instant>,
    pub result: Option<ValidationResult>,
    pub replays: u32,
}

impl RoundState {
    /// A fresh round. With the limit on, the player can place exactly as many
    /// notes as were sounded.
    pub fn new(target: Vec<Pitch>, limit_enabled: bool) -> Self {
        let selection = SelectionSet::new(target.len(), limit_enabled);
        Self {
            target,
            selection,
            started_at: Instant::now(),
            finished_at: None,
            result: None,
            replays: 0,
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.result.is_some()
    }

    pub fn elapsed_secs(&self) -> f64 {
        match self.finished_at {
            Some(end) => end.duration_since(self.started_at).as_secs_f64(),
            None => self.started_at.elapsed().as_secs_f64(),
        }
    }

    pub fn finish(&mut self, result: ValidationResult) {
        self.finished_at = Some(Instant::now());
        self.result = Some(result);
    }

    /// Start over on the same target.
    pub fn reset(&mut self) {
        self.selection.clear();
        self.started_at = Instant::now();
        self.finished_at = None;
        self.result = None;
        self.replays = 0;
    }
}

/// Natural pitches eligible for targets on the current staff.
pub fn target_pool(positions: &[StaffPosition]) -> Vec<Pitch> {
    positions
        .iter()
        .filter(|pos| pos.ledger_lines().len() <= MAX_TARGET_LEDGER_LINES)
        .map(|pos| pos.pitch)
        .collect()
}

/// Pick `min..=max` distinct pitches from `pool`, lowest first. Each pitch
/// keeps its own staff line, so no two targets share a line.
pub fn generate_target<R: Rng>(
    rng: &mut R,
    pool: &[Pitch],
    min_notes: usize,
    max_notes: usize,
    include_accidentals: bool,
) -> Vec<Pitch> {
    if pool.is_empty() {
        return Vec::new();
    }
    let max = max_notes.max(1).min(pool.len());
    let min = min_notes.clamp(1, max);
    let count = rng.gen_range(min..=max);

    let mut target: Vec<Pitch> = pool
        .choose_multiple(rng, count)
        .map(|&pitch| {
            if include_accidentals && rng.gen_bool(ACCIDENTAL_CHANCE * 2.0) {
                let accidental = if rng.gen_bool(0.5) {
                    Accidental::Sharp
                } else {
                    Accidental::Flat
                };
                pitch.with_accidental(accidental)
            } else {
                pitch
            }
        })
        .collect();
    target.sort();
    target
}
