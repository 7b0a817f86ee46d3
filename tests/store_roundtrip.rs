use std::fs;

use tempfile::TempDir;

use earstaff::config::ClefMode;
use earstaff::engine::{NoteLetter, Pitch, validate};
use earstaff::session::result::RoundResult;
use earstaff::session::round::RoundState;
use earstaff::store::json_store::JsonStore;
use earstaff::store::schema::{MAX_HISTORY_ROUNDS, ProfileData, RoundHistoryData, SCHEMA_VERSION};

fn store() -> (TempDir, JsonStore) {
    let dir = TempDir::new().unwrap();
    let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
    (dir, store)
}

fn played_round() -> RoundResult {
    let target = vec![
        Pitch::natural(NoteLetter::C, 4),
        Pitch::natural(NoteLetter::E, 4),
        Pitch::natural(NoteLetter::G, 4),
    ];
    let mut round = RoundState::new(target, true);
    round.selection.add(Pitch::natural(NoteLetter::C, 4));
    round.selection.add(Pitch::natural(NoteLetter::F, 4));
    round.replays = 2;
    let validation = validate(&round.target, round.selection.pitches());
    round.finish(validation.clone());
    RoundResult::from_round(&round, &validation, ClefMode::Treble)
}

#[test]
fn finished_round_survives_a_restart() {
    let (_dir, store) = store();
    let result = played_round();
    assert_eq!(result.accuracy, 33);
    assert_eq!(result.missed_count, 2);
    assert_eq!(result.incorrect_count, 1);

    store.append_round(result.clone()).unwrap();

    let reloaded = store.load_history();
    assert_eq!(reloaded.schema_version, SCHEMA_VERSION);
    assert_eq!(reloaded.rounds.len(), 1);
    let round = &reloaded.rounds[0];
    assert_eq!(round.target, result.target);
    assert_eq!(round.selected, result.selected);
    assert_eq!(round.replays, 2);
    assert_eq!(round.clef_mode, ClefMode::Treble);
    assert!(round.limit_enabled);
}

#[test]
fn profile_roundtrip_and_reset() {
    let (_dir, store) = store();
    let profile = ProfileData {
        total_score: 120.0,
        total_rounds: 4,
        correct_rounds: 3,
        streak_days: 2,
        last_practice_date: Some("2026-10-17".to_string()),
        ..ProfileData::default()
    };
    store.save_profile(&profile).unwrap();

    let loaded = store.load_profile().unwrap();
    assert_eq!(loaded.total_rounds, 4);
    assert_eq!(loaded.success_rate(), 75.0);
    assert_eq!(loaded.last_practice_date.as_deref(), Some("2026-10-17"));

    store.reset().unwrap();
    assert_eq!(store.load_profile().unwrap().total_rounds, 0);
    assert!(store.load_history().rounds.is_empty());
}

#[test]
fn corrupt_profile_is_reported_as_missing() {
    let (dir, store) = store();
    fs::write(dir.path().join("profile.json"), "{ not json").unwrap();
    assert!(store.load_profile().is_none());
}

#[test]
fn stale_history_schema_starts_over_on_append() {
    let (_dir, store) = store();
    let stale = RoundHistoryData {
        schema_version: SCHEMA_VERSION + 1,
        rounds: vec![played_round(), played_round()],
    };
    store.save_history(&stale).unwrap();

    let history = store.append_round(played_round()).unwrap();
    assert_eq!(history.schema_version, SCHEMA_VERSION);
    assert_eq!(history.rounds.len(), 1);
}

#[test]
fn history_is_capped_oldest_first() {
    let (_dir, store) = store();
    let mut history = RoundHistoryData::default();
    for replays in 0..MAX_HISTORY_ROUNDS as u32 {
        let mut round = played_round();
        round.replays = replays;
        history.rounds.push(round);
    }
    store.save_history(&history).unwrap();

    let mut newest = played_round();
    newest.replays = 9999;
    let history = store.append_round(newest).unwrap();
    assert_eq!(history.rounds.len(), MAX_HISTORY_ROUNDS);
    assert_eq!(history.rounds[0].replays, 1);
    assert_eq!(history.rounds.last().map(|r| r.replays), Some(9999));
}
