use crate::engine::validator::ValidationResult;

/// Points for one answered round. Larger chords are worth more and a fully
/// correct answer counts double.
pub fn round_score(result: &ValidationResult, note_count: usize) -> f64 {
    let base = result.accuracy as f64 * note_count as f64;
    if result.is_correct { base * 2.0 } else { base }
}

pub fn level_from_score(total_score: f64) -> u32 {
    let level = (total_score / 100.0).sqrt() as u32;
    level.max(1)
}

pub fn score_to_next_level(total_score: f64) -> f64 {
    let current_level = level_from_score(total_score);
    let next_level_score = ((current_level + 1) as f64).powi(2) * 100.0;
    next_level_score - total_score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::pitch::{NoteLetter, Pitch};
    use crate::engine::validator::validate;

    #[test]
    fn test_level_starts_at_one() {
        assert_eq!(level_from_score(0.0), 1);
    }

    #[test]
    fn test_level_increases_with_score() {
        assert!(level_from_score(1000.0) > level_from_score(100.0));
    }

    #[test]
    fn test_correct_answer_doubles() {
        let c4 = Pitch::natural(NoteLetter::C, 4);
        let e4 = Pitch::natural(NoteLetter::E, 4);
        let perfect = validate(&[c4, e4], &[c4, e4]);
        let half = validate(&[c4, e4], &[c4]);
        assert_eq!(round_score(&perfect, 2), 400.0);
        assert_eq!(round_score(&half, 2), 100.0);
    }

    #[test]
    fn test_next_level_distance() {
        assert_eq!(score_to_next_level(400.0), 500.0);
    }
}
