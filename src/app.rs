use chrono::{NaiveDate, Utc};
use crossterm::event::KeyEvent;
use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use ratatui::layout::Rect;

use crate::config::{ClefMode, Config, MAX_NOTE_LIMIT};
use crate::engine::controller::{InteractionController, InteractionListener};
use crate::engine::mapper::{StaffMode, StaffPosition, positions_for_mode};
use crate::engine::navigator::{KeyboardFocusState, NavigationMode};
use crate::engine::pitch::{Accidental, Pitch};
use crate::engine::playback::LogPlayback;
use crate::engine::scoring;
use crate::engine::validator::{self, ValidationResult};
use crate::session::result::{RoundResult, join_pitches};
use crate::session::round::{RoundState, generate_target, target_pool};
use crate::store::json_store::JsonStore;
use crate::store::schema::{ProfileData, RoundHistoryData};
use crate::ui::components::menu::Menu;
use crate::ui::components::staff::TerminalStaffSurface;
use crate::ui::layout::RoundLayout;
use crate::ui::theme::Theme;

pub const SETTINGS_COUNT: usize = 7;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Menu,
    Round,
    RoundResult,
    StatsDashboard,
    Settings,
}

/// Status line fed by the engine's callbacks during a round.
#[derive(Debug, Default)]
pub struct RoundFeedback {
    pub message: String,
}

impl InteractionListener for RoundFeedback {
    fn on_position_resolved(&mut self, position: &StaffPosition) {
        self.message = format!("{} on the {} staff", position.pitch, position.clef.name());
    }

    fn on_selection_changed(&mut self, selection: &[Pitch]) {
        let mut sorted = selection.to_vec();
        sorted.sort();
        self.message = format!("Answer: {}", join_pitches(&sorted));
    }

    fn on_focus_changed(&mut self, focus: &KeyboardFocusState) {
        self.message = match (focus.mode, focus.focused_position) {
            (NavigationMode::Navigating, Some(pos)) => format!("Keyboard: {}", pos.pitch),
            _ => "Pointer mode".to_string(),
        };
    }

    fn on_validation_computed(&mut self, result: &ValidationResult) {
        self.message = format!("Submitted: {}% found", result.accuracy);
    }

    fn on_blur_requested(&mut self) {
        self.message = "Keyboard mode off".to_string();
    }
}

pub struct App {
    pub screen: AppScreen,
    pub round: Option<RoundState>,
    pub last_result: Option<RoundResult>,
    pub last_validation: Option<ValidationResult>,
    pub history: Vec<RoundResult>,
    pub menu: Menu<'static>,
    pub theme: &'static Theme,
    pub config: Config,
    pub profile: ProfileData,
    pub store: Option<JsonStore>,
    pub controller: Option<InteractionController>,
    pub staff_surface: Option<TerminalStaffSurface>,
    pub feedback: RoundFeedback,
    pub should_quit: bool,
    pub settings_selected: usize,
    pub stats_tab: usize,
    pub history_selected: usize,
    pub history_confirm_delete: bool,
    play_when_ready: bool,
    rng: SmallRng,
}

impl App {
    pub fn new() -> Self {
        let config = Config::load().unwrap_or_else(|e| {
            warn!("config unreadable, using defaults: {e}");
            Config::default()
        });
        let store = match JsonStore::new() {
            Ok(store) => Some(store),
            Err(e) => {
                warn!("data directory unavailable, progress will not be saved: {e}");
                None
            }
        };
        Self::with_store(config, store, SmallRng::from_entropy())
    }

    pub fn with_store(config: Config, store: Option<JsonStore>, rng: SmallRng) -> Self {
        let loaded_theme = Theme::load(&config.theme).unwrap_or_default();
        let theme: &'static Theme = Box::leak(Box::new(loaded_theme));
        let menu = Menu::new(theme);

        let (profile, history) = match store.as_ref().map(|s| (s.load_profile(), s)) {
            Some((Some(pd), s)) if !pd.needs_reset() => {
                let hd = s.load_history();
                let rounds = if hd.needs_reset() { Vec::new() } else { hd.rounds };
                (pd, rounds)
            }
            Some(_) => {
                warn!("stored profile is stale or corrupt, starting fresh");
                (ProfileData::default(), Vec::new())
            }
            None => (ProfileData::default(), Vec::new()),
        };

        let mut app = Self {
            screen: AppScreen::Menu,
            round: None,
            last_result: None,
            last_validation: None,
            history,
            menu,
            theme,
            config,
            profile,
            store,
            controller: None,
            staff_surface: None,
            feedback: RoundFeedback::default(),
            should_quit: false,
            settings_selected: 0,
            stats_tab: 0,
            history_selected: 0,
            history_confirm_delete: false,
            play_when_ready: false,
            rng,
        };
        app.refresh_menu_summary();
        app
    }

    /// Describe the next round on the menu from the current settings.
    pub fn refresh_menu_summary(&mut self) {
        let (min, max) = (self.config.min_notes, self.config.max_notes);
        let count = if min == max {
            format!("{min} notes")
        } else {
            format!("{min}-{max} notes")
        };
        let accidentals = if self.config.include_accidentals {
            ", with accidentals"
        } else {
            ""
        };
        self.menu.round_summary = format!(
            "Next: {count} on the {} staff{accidentals}",
            self.config.clef_mode.as_str()
        );
    }

    pub fn staff_mode(&self) -> StaffMode {
        self.config.clef_mode.staff_mode()
    }

    pub fn set_theme(&mut self, theme: Theme) {
        let theme: &'static Theme = Box::leak(Box::new(theme));
        self.theme = theme;
        self.menu.theme = theme;
    }

    pub fn start_round(&mut self) {
        let pool = target_pool(&positions_for_mode(self.staff_mode()));
        let target = generate_target(
            &mut self.rng,
            &pool,
            self.config.min_notes,
            self.config.max_notes,
            self.config.include_accidentals,
        );
        info!("round started with {} notes", target.len());
        debug!("target: {}", join_pitches(&target));
        self.round = Some(RoundState::new(target, self.config.limit_enabled));
        self.last_validation = None;
        self.feedback.message = "Listen, then place the notes you heard".to_string();
        self.screen = AppScreen::Round;
        self.play_when_ready = true;
        self.flush_pending_playback();
    }

    pub fn retry_round(&mut self) {
        if let Some(round) = self.round.as_mut() {
            round.reset();
            self.last_validation = None;
            self.feedback.message = "Same notes again".to_string();
            self.screen = AppScreen::Round;
            self.play_when_ready = true;
            self.flush_pending_playback();
        }
    }

    /// Bring the engine in line with the staff area that is about to be drawn.
    /// A staff that cannot be laid out leaves the round without a controller
    /// until the terminal grows.
    pub fn sync_staff(&mut self, frame_area: Rect) {
        if !matches!(self.screen, AppScreen::Round) {
            return;
        }
        let mode = self.staff_mode();
        let surface = TerminalStaffSurface::new(RoundLayout::new(frame_area).staff, mode);
        // Same area as last time: either already laid out or still too small.
        if self.staff_surface == Some(surface) {
            return;
        }
        self.staff_surface = Some(surface);

        let outcome = if let Some(controller) = self.controller.as_mut() {
            controller.relayout(&surface, mode, &mut self.feedback)
        } else {
            let playback = Box::new(LogPlayback::new(self.config.volume));
            InteractionController::new(&surface, mode, playback)
                .map(|controller| self.controller = Some(controller))
        };

        if let Err(e) = outcome {
            warn!("staff interaction disabled: {e}");
            if let Some(controller) = self.controller.take() {
                controller.dispose();
            }
            return;
        }
        self.flush_pending_playback();
    }

    fn flush_pending_playback(&mut self) {
        if !self.play_when_ready {
            return;
        }
        if let (Some(controller), Some(round)) = (self.controller.as_mut(), self.round.as_ref()) {
            controller.play_target(&round.target);
            self.play_when_ready = false;
        }
    }

    #[allow(dead_code)]
    pub fn staff_ready(&self) -> bool {
        self.controller.is_some()
    }

    /// Offer a key to the staff. Returns whether it was consumed.
    pub fn staff_key(&mut self, key: KeyEvent) -> bool {
        match (self.controller.as_mut(), self.round.as_mut()) {
            (Some(controller), Some(round)) => {
                controller.key_pressed(key, &mut round.selection, &mut self.feedback)
            }
            _ => false,
        }
    }

    pub fn staff_navigating(&self) -> bool {
        self.controller
            .as_ref()
            .is_some_and(|c| c.navigator().is_navigating())
    }

    pub fn pointer_moved(&mut self, column: u16, row: u16) {
        if let Some(controller) = self.controller.as_mut() {
            controller.pointer_moved(column as f64, row as f64, &mut self.feedback);
        }
    }

    /// The pointer can no longer be tracked, e.g. the terminal lost focus.
    pub fn pointer_left(&mut self) {
        if let Some(controller) = self.controller.as_mut() {
            controller.pointer_left();
        }
    }

    pub fn pointer_clicked(&mut self, column: u16, row: u16) {
        if let (Some(controller), Some(round)) = (self.controller.as_mut(), self.round.as_mut()) {
            let changed = controller.pointer_clicked(
                column as f64,
                row as f64,
                &mut round.selection,
                &mut self.feedback,
            );
            if !changed && round.selection.limit_enabled() && !round.selection.can_add(None) {
                self.feedback.message =
                    format!("Limit reached: {} notes", round.selection.max_notes());
            }
        }
    }

    pub fn apply_accidental(&mut self, accidental: Accidental) {
        if let (Some(controller), Some(round)) = (self.controller.as_mut(), self.round.as_mut()) {
            if !controller.apply_accidental(accidental, &mut round.selection, &mut self.feedback) {
                self.feedback.message = match accidental {
                    Accidental::Natural => "Placing naturals".to_string(),
                    Accidental::Sharp => "Placing sharps".to_string(),
                    Accidental::Flat => "Placing flats".to_string(),
                };
            }
        }
    }

    pub fn replay_target(&mut self) {
        if let (Some(controller), Some(round)) = (self.controller.as_mut(), self.round.as_mut()) {
            round.replays += 1;
            controller.play_target(&round.target);
        }
    }

    pub fn play_selection(&mut self) {
        if let (Some(controller), Some(round)) = (self.controller.as_mut(), self.round.as_ref()) {
            controller.play_selection(&round.selection);
        }
    }

    pub fn clear_selection(&mut self) {
        if let (Some(controller), Some(round)) = (self.controller.as_ref(), self.round.as_mut()) {
            controller.clear_selection(&mut round.selection, &mut self.feedback);
        }
    }

    pub fn submit_round(&mut self) {
        let Some(round) = self.round.as_mut() else {
            return;
        };
        if round.is_submitted() {
            return;
        }
        let validation = match self.controller.as_ref() {
            Some(controller) => controller.submit(&round.target, &round.selection, &mut self.feedback),
            None => validator::validate(&round.target, round.selection.pitches()),
        };
        round.finish(validation.clone());

        let result = RoundResult::from_round(round, &validation, self.config.clef_mode);
        self.record_result(&result);
        self.last_result = Some(result);
        self.last_validation = Some(validation);
        self.screen = AppScreen::RoundResult;
    }

    fn record_result(&mut self, result: &RoundResult) {
        apply_result(&mut self.profile, result, Utc::now().date_naive());
        info!(
            "round finished: {}% accuracy, +{:.0} points, level {}",
            result.accuracy,
            result.score,
            scoring::level_from_score(self.profile.total_score)
        );

        let mut history = RoundHistoryData {
            rounds: std::mem::take(&mut self.history),
            ..RoundHistoryData::default()
        };
        history.push_capped(result.clone());
        self.history = history.rounds;

        if let Some(ref store) = self.store {
            if let Err(e) = store.save_profile(&self.profile) {
                warn!("failed to save profile: {e}");
            }
            if let Err(e) = store.append_round(result.clone()) {
                warn!("failed to append round to history: {e}");
            }
        }
    }

    fn save_data(&self) {
        if let Some(ref store) = self.store {
            if let Err(e) = store.save_profile(&self.profile) {
                warn!("failed to save profile: {e}");
            }
            let history = RoundHistoryData {
                rounds: self.history.clone(),
                ..RoundHistoryData::default()
            };
            if let Err(e) = store.save_history(&history) {
                warn!("failed to save round history: {e}");
            }
        }
    }

    pub fn go_to_menu(&mut self) {
        self.screen = AppScreen::Menu;
        self.round = None;
        self.staff_surface = None;
        self.play_when_ready = false;
        if let Some(controller) = self.controller.take() {
            controller.dispose();
        }
    }

    pub fn go_to_stats(&mut self) {
        self.stats_tab = 0;
        self.history_selected = 0;
        self.history_confirm_delete = false;
        self.screen = AppScreen::StatsDashboard;
    }

    pub fn delete_round(&mut self) {
        if self.history.is_empty() {
            return;
        }
        // History tab shows reverse order
        let actual_idx = self.history.len() - 1 - self.history_selected.min(self.history.len() - 1);
        self.history.remove(actual_idx);
        self.rebuild_from_history();
        self.save_data();
        self.history_selected = self
            .history_selected
            .min(self.history.len().saturating_sub(1));
    }

    /// Recompute every derived profile figure by replaying the history.
    pub fn rebuild_from_history(&mut self) {
        let mut profile = ProfileData::default();
        for result in &self.history {
            apply_result(&mut profile, result, result.timestamp.date_naive());
        }
        self.profile = profile;
    }

    pub fn go_to_settings(&mut self) {
        self.settings_selected = 0;
        self.screen = AppScreen::Settings;
    }

    pub fn settings_fields(&self) -> Vec<(&'static str, String)> {
        let on_off = |b: bool| if b { "on" } else { "off" }.to_string();
        vec![
            ("Clef", self.config.clef_mode.as_str().to_string()),
            ("Min Notes", self.config.min_notes.to_string()),
            ("Max Notes", self.config.max_notes.to_string()),
            ("Note Limit", on_off(self.config.limit_enabled)),
            ("Accidentals", on_off(self.config.include_accidentals)),
            ("Volume", format!("{}%", self.config.volume)),
            ("Theme", self.config.theme.clone()),
        ]
    }

    pub fn settings_cycle_forward(&mut self) {
        self.settings_cycle(true);
    }

    pub fn settings_cycle_backward(&mut self) {
        self.settings_cycle(false);
    }

    fn settings_cycle(&mut self, forward: bool) {
        let step = |value: usize, len: usize| {
            if forward {
                (value + 1) % len
            } else if value == 0 {
                len - 1
            } else {
                value - 1
            }
        };
        match self.settings_selected {
            0 => {
                let idx = ClefMode::ALL
                    .iter()
                    .position(|m| *m == self.config.clef_mode)
                    .unwrap_or(0);
                self.config.clef_mode = ClefMode::ALL[step(idx, ClefMode::ALL.len())];
            }
            1 => {
                self.config.min_notes = if forward {
                    (self.config.min_notes + 1).min(self.config.max_notes)
                } else {
                    self.config.min_notes.saturating_sub(1).max(1)
                };
            }
            2 => {
                self.config.max_notes = if forward {
                    (self.config.max_notes + 1).min(MAX_NOTE_LIMIT)
                } else {
                    self.config.max_notes.saturating_sub(1).max(self.config.min_notes)
                };
            }
            3 => self.config.limit_enabled = !self.config.limit_enabled,
            4 => self.config.include_accidentals = !self.config.include_accidentals,
            5 => {
                self.config.volume = if forward {
                    self.config.volume.saturating_add(10).min(100)
                } else {
                    self.config.volume.saturating_sub(10)
                };
            }
            6 => {
                let themes = Theme::available_themes();
                if themes.is_empty() {
                    return;
                }
                let idx = themes.iter().position(|t| *t == self.config.theme);
                self.config.theme = match idx {
                    Some(idx) => themes[step(idx, themes.len())].clone(),
                    None => themes[0].clone(),
                };
                if let Some(new_theme) = Theme::load(&self.config.theme) {
                    self.set_theme(new_theme);
                }
            }
            _ => {}
        }
        self.config.normalize();
        self.refresh_menu_summary();
    }

    pub fn save_settings(&self) {
        if let Err(e) = self.config.save() {
            warn!("failed to save config: {e}");
        }
    }
}

/// Fold one finished round into the profile. `day` is the local practice day.
pub fn apply_result(profile: &mut ProfileData, result: &RoundResult, day: NaiveDate) {
    profile.total_score += result.score;
    profile.total_rounds += 1;
    if result.is_correct {
        profile.correct_rounds += 1;
        profile.current_run += 1;
        profile.best_run = profile.best_run.max(profile.current_run);
    } else {
        profile.current_run = 0;
    }
    update_day_streak(profile, day);
}

fn update_day_streak(profile: &mut ProfileData, day: NaiveDate) {
    let today = day.format("%Y-%m-%d").to_string();
    if profile.last_practice_date.as_deref() == Some(&today) {
        return;
    }
    let continues = profile
        .last_practice_date
        .as_deref()
        .and_then(|last| NaiveDate::parse_from_str(last, "%Y-%m-%d").ok())
        .is_some_and(|last| day.signed_duration_since(last).num_days() == 1);
    profile.streak_days = if continues { profile.streak_days + 1 } else { 1 };
    profile.best_streak = profile.best_streak.max(profile.streak_days);
    profile.last_practice_date = Some(today);
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyModifiers};
    use tempfile::TempDir;

    use super::*;

    fn test_app() -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        let app = App::with_store(Config::default(), Some(store), SmallRng::seed_from_u64(9));
        (dir, app)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_day_streak_rules() {
        let mut profile = ProfileData::default();
        update_day_streak(&mut profile, day("2026-03-01"));
        assert_eq!(profile.streak_days, 1);
        update_day_streak(&mut profile, day("2026-03-01"));
        assert_eq!(profile.streak_days, 1);
        update_day_streak(&mut profile, day("2026-03-02"));
        assert_eq!(profile.streak_days, 2);
        update_day_streak(&mut profile, day("2026-03-05"));
        assert_eq!(profile.streak_days, 1);
        assert_eq!(profile.best_streak, 2);
    }

    #[test]
    fn test_round_lifecycle_records_result() {
        let (_dir, mut app) = test_app();
        app.start_round();
        assert_eq!(app.screen, AppScreen::Round);
        app.sync_staff(Rect::new(0, 0, 120, 50));
        assert!(app.staff_ready());

        // Keyboard: activate, then place the focused note.
        assert!(app.staff_key(key(KeyCode::Tab)));
        assert!(app.staff_key(key(KeyCode::Enter)));
        assert_eq!(app.round.as_ref().unwrap().selection.len(), 1);

        app.submit_round();
        assert_eq!(app.screen, AppScreen::RoundResult);
        assert_eq!(app.history.len(), 1);
        assert_eq!(app.profile.total_rounds, 1);

        let stored = app.store.as_ref().unwrap().load_history();
        assert_eq!(stored.rounds.len(), 1);
    }

    #[test]
    fn test_clear_selection_reports_through_feedback() {
        let (_dir, mut app) = test_app();
        app.start_round();
        app.sync_staff(Rect::new(0, 0, 120, 50));
        assert!(app.staff_key(key(KeyCode::Tab)));
        assert!(app.staff_key(key(KeyCode::Enter)));

        app.clear_selection();
        assert!(app.round.as_ref().unwrap().selection.is_empty());
        assert!(app.feedback.message.starts_with("Answer:"));

        // Nothing left to clear, so the status line is left alone.
        app.feedback.message = "Placing sharps".to_string();
        app.clear_selection();
        assert_eq!(app.feedback.message, "Placing sharps");
    }

    #[test]
    fn test_too_small_terminal_disables_staff() {
        let (_dir, mut app) = test_app();
        app.start_round();
        app.sync_staff(Rect::new(0, 0, 40, 12));
        assert!(!app.staff_ready());
        assert!(!app.staff_key(key(KeyCode::Tab)));

        // Growing the terminal brings interaction back.
        app.sync_staff(Rect::new(0, 0, 120, 50));
        assert!(app.staff_ready());
    }

    #[test]
    fn test_submit_without_staff_still_scores() {
        let (_dir, mut app) = test_app();
        app.start_round();
        app.submit_round();
        let result = app.last_result.as_ref().unwrap();
        assert_eq!(result.accuracy, 0);
        assert!(!result.is_correct);
    }

    #[test]
    fn test_delete_round_rebuilds_profile() {
        let (_dir, mut app) = test_app();
        for _ in 0..2 {
            app.start_round();
            app.submit_round();
        }
        assert_eq!(app.profile.total_rounds, 2);
        app.history_selected = 0;
        app.delete_round();
        assert_eq!(app.history.len(), 1);
        assert_eq!(app.profile.total_rounds, 1);
    }

    #[test]
    fn test_settings_keep_counts_ordered() {
        let (_dir, mut app) = test_app();
        app.settings_selected = 2;
        for _ in 0..20 {
            app.settings_cycle_backward();
        }
        assert_eq!(app.config.max_notes, app.config.min_notes);
        app.settings_selected = 1;
        app.settings_cycle_forward();
        assert!(app.config.min_notes <= app.config.max_notes);
    }
}
