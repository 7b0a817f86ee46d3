use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::engine::pitch::Pitch;

/// Outcome of comparing a player's answer with the sounded target.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub correctly_identified: BTreeSet<Pitch>,
    pub missed: BTreeSet<Pitch>,
    pub incorrect: BTreeSet<Pitch>,
    /// Share of target pitches found, rounded to a whole percent.
    pub accuracy: u8,
    pub is_correct: bool,
}

/// Compare two pitch collections as sets. Duplicates and ordering in either
/// input are irrelevant.
pub fn validate(target: &[Pitch], selected: &[Pitch]) -> ValidationResult {
    let target: BTreeSet<Pitch> = target.iter().copied().collect();
    let selected: BTreeSet<Pitch> = selected.iter().copied().collect();

    let correctly_identified: BTreeSet<Pitch> = selected.intersection(&target).copied().collect();
    let missed: BTreeSet<Pitch> = target.difference(&selected).copied().collect();
    let incorrect: BTreeSet<Pitch> = selected.difference(&target).copied().collect();

    let accuracy = percent(correctly_identified.len(), target.len());
    let is_correct = missed.is_empty() && incorrect.is_empty();

    ValidationResult {
        correctly_identified,
        missed,
        incorrect,
        accuracy,
        is_correct,
    }
}

/// `round(100 * part / whole)` with halves rounding up; 0 for an empty whole.
fn percent(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    ((200 * part + whole) / (2 * whole)).min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::pitch::{Accidental, NoteLetter};
    use proptest::prelude::*;

    fn n(letter: NoteLetter, octave: i32) -> Pitch {
        Pitch::natural(letter, octave)
    }

    fn c_major() -> Vec<Pitch> {
        vec![
            n(NoteLetter::C, 4),
            n(NoteLetter::E, 4),
            n(NoteLetter::G, 4),
        ]
    }

    fn set(pitches: &[Pitch]) -> BTreeSet<Pitch> {
        pitches.iter().copied().collect()
    }

    #[test]
    fn test_exact_match() {
        let result = validate(&c_major(), &c_major());
        assert!(result.is_correct);
        assert_eq!(result.accuracy, 100);
        assert!(result.missed.is_empty());
        assert!(result.incorrect.is_empty());
    }

    #[test]
    fn test_partial_answer_rounds_up() {
        let result = validate(&c_major(), &[n(NoteLetter::C, 4), n(NoteLetter::E, 4)]);
        assert!(!result.is_correct);
        assert_eq!(result.accuracy, 67);
        assert_eq!(result.missed, set(&[n(NoteLetter::G, 4)]));
        assert!(result.incorrect.is_empty());
    }

    #[test]
    fn test_mixed_answer() {
        let selected = [n(NoteLetter::C, 4), n(NoteLetter::F, 4), n(NoteLetter::A, 4)];
        let result = validate(&c_major(), &selected);
        assert_eq!(result.accuracy, 33);
        assert_eq!(result.correctly_identified, set(&[n(NoteLetter::C, 4)]));
        assert_eq!(
            result.missed,
            set(&[n(NoteLetter::E, 4), n(NoteLetter::G, 4)])
        );
        assert_eq!(
            result.incorrect,
            set(&[n(NoteLetter::F, 4), n(NoteLetter::A, 4)])
        );
    }

    #[test]
    fn test_empty_target() {
        let both_empty = validate(&[], &[]);
        assert_eq!(both_empty.accuracy, 0);
        assert!(both_empty.is_correct);

        let extra = validate(&[], &[n(NoteLetter::C, 4)]);
        assert_eq!(extra.accuracy, 0);
        assert!(!extra.is_correct);
    }

    #[test]
    fn test_duplicates_are_ignored() {
        let target = [n(NoteLetter::C, 4), n(NoteLetter::C, 4)];
        let result = validate(&target, &[n(NoteLetter::C, 4)]);
        assert!(result.is_correct);
        assert_eq!(result.accuracy, 100);
    }

    #[test]
    fn test_enharmonic_spelling_is_wrong() {
        let target = [Pitch::new(NoteLetter::C, Accidental::Sharp, 4)];
        let selected = [Pitch::new(NoteLetter::D, Accidental::Flat, 4)];
        let result = validate(&target, &selected);
        assert!(!result.is_correct);
        assert_eq!(result.accuracy, 0);
    }

    #[test]
    fn test_half_rounds_up() {
        assert_eq!(percent(1, 2), 50);
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(0, 5), 0);
        assert_eq!(percent(5, 5), 100);
    }

    fn arb_pitches() -> impl Strategy<Value = Vec<Pitch>> {
        proptest::collection::vec(
            (0i32..7, 3i32..6, 0usize..3).prop_map(|(step, octave, acc)| {
                let accidental = [Accidental::Flat, Accidental::Natural, Accidental::Sharp][acc];
                Pitch::new(NoteLetter::from_index(step), accidental, octave)
            }),
            0..8,
        )
    }

    proptest! {
        #[test]
        fn result_ignores_input_order(
            target in arb_pitches(),
            selected in arb_pitches(),
        ) {
            let expected = validate(&target, &selected);
            let mut target_rev = target.clone();
            target_rev.reverse();
            let mut selected_sorted = selected.clone();
            selected_sorted.sort();
            prop_assert_eq!(validate(&target_rev, &selected_sorted), expected.clone());
            let mut selected_rot = selected.clone();
            if !selected_rot.is_empty() {
                selected_rot.rotate_left(1);
            }
            prop_assert_eq!(validate(&target, &selected_rot), expected);
        }

        #[test]
        fn correct_iff_sets_equal(
            target in arb_pitches(),
            selected in arb_pitches(),
        ) {
            let result = validate(&target, &selected);
            prop_assert_eq!(result.is_correct, set(&target) == set(&selected));
            prop_assert!(result.accuracy <= 100);
        }
    }
}
