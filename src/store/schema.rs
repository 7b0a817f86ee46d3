use serde::{Deserialize, Serialize};

use crate::session::result::RoundResult;

pub const SCHEMA_VERSION: u32 = 1;

/// Oldest rounds are dropped once the history grows past this.
pub const MAX_HISTORY_ROUNDS: usize = 1000;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProfileData {
    pub schema_version: u32,
    pub total_score: f64,
    pub total_rounds: u32,
    pub correct_rounds: u32,
    /// Consecutive fully correct answers.
    #[serde(default)]
    pub current_run: u32,
    #[serde(default)]
    pub best_run: u32,
    pub streak_days: u32,
    pub best_streak: u32,
    pub last_practice_date: Option<String>,
}

impl Default for ProfileData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            total_score: 0.0,
            total_rounds: 0,
            correct_rounds: 0,
            current_run: 0,
            best_run: 0,
            streak_days: 0,
            best_streak: 0,
            last_practice_date: None,
        }
    }
}

impl ProfileData {
    /// Check if loaded data has a stale schema version and needs reset.
    pub fn needs_reset(&self) -> bool {
        self.schema_version != SCHEMA_VERSION
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_rounds == 0 {
            0.0
        } else {
            self.correct_rounds as f64 / self.total_rounds as f64 * 100.0
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundHistoryData {
    pub schema_version: u32,
    pub rounds: Vec<RoundResult>,
}

impl Default for RoundHistoryData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            rounds: Vec::new(),
        }
    }
}

impl RoundHistoryData {
    pub fn needs_reset(&self) -> bool {
        self.schema_version != SCHEMA_VERSION
    }

    pub fn push_capped(&mut self, round: RoundResult) {
        self.rounds.push(round);
        if self.rounds.len() > MAX_HISTORY_ROUNDS {
            let excess = self.rounds.len() - MAX_HISTORY_ROUNDS;
            self.rounds.drain(..excess);
        }
    }
}
