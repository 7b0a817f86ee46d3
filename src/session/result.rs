use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ClefMode;
use crate::engine::pitch::Pitch;
use crate::engine::scoring::round_score;
use crate::engine::validator::ValidationResult;
use crate::session::round::RoundState;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundResult {
    pub target: Vec<Pitch>,
    pub selected: Vec<Pitch>,
    pub accuracy: u8,
    pub is_correct: bool,
    pub correct_count: usize,
    pub missed_count: usize,
    pub incorrect_count: usize,
    pub score: f64,
    pub elapsed_secs: f64,
    #[serde(default)]
    pub replays: u32,
    #[serde(default)]
    pub clef_mode: ClefMode,
    #[serde(default = "default_true")]
    pub limit_enabled: bool,
    pub timestamp: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl RoundResult {
    pub fn from_round(round: &RoundState, validation: &ValidationResult, clef_mode: ClefMode) -> Self {
        Self {
            target: round.target.clone(),
            selected: round.selection.pitches().to_vec(),
            accuracy: validation.accuracy,
            is_correct: validation.is_correct,
            correct_count: validation.correctly_identified.len(),
            missed_count: validation.missed.len(),
            incorrect_count: validation.incorrect.len(),
            score: round_score(validation, round.target.len()),
            elapsed_secs: round.elapsed_secs(),
            replays: round.replays,
            clef_mode,
            limit_enabled: round.selection.limit_enabled(),
            timestamp: Utc::now(),
        }
    }

    pub fn target_label(&self) -> String {
        join_pitches(&self.target)
    }

    pub fn selected_label(&self) -> String {
        join_pitches(&self.selected)
    }
}

pub fn join_pitches(pitches: &[Pitch]) -> String {
    if pitches.is_empty() {
        return "-".to_string();
    }
    pitches
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
