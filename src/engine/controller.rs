//! Routes raw pointer and keyboard events into the mapper, navigator and
//! selection, and reports what happened through [`InteractionListener`].
//!
//! One rule couples the two input sources: any pointer move or click sends the
//! navigator back to idle. Nothing else switches modes behind the host's back.

use crossterm::event::KeyEvent;
use log::{debug, info};

use crate::engine::error::EngineError;
use crate::engine::mapper::{PitchPositionMapper, StaffLayout, StaffMode, StaffPosition, StaffSurface};
use crate::engine::navigator::{KeyboardFocusState, KeyboardNavigator, NavOutcome};
use crate::engine::pitch::{Accidental, Pitch};
use crate::engine::playback::{PlayIntent, Playback};
use crate::engine::selection::SelectionSet;
use crate::engine::validator::{self, ValidationResult};

/// Callbacks raised synchronously while an event is being handled.
pub trait InteractionListener {
    fn on_position_resolved(&mut self, _position: &StaffPosition) {}

    fn on_selection_changed(&mut self, _selection: &[Pitch]) {}

    fn on_focus_changed(&mut self, _focus: &KeyboardFocusState) {}

    fn on_validation_computed(&mut self, _result: &ValidationResult) {}

    /// Keyboard mode was left with Escape; drop focus from any input surface.
    fn on_blur_requested(&mut self) {}

    /// Which pitches a Delete/Backspace press removes. Defaults to every
    /// selected pitch written on the focused line, whatever its accidental.
    fn notes_to_delete(
        &mut self,
        focus: Option<&StaffPosition>,
        selection: &SelectionSet,
    ) -> Vec<Pitch> {
        focus
            .map(|pos| selection.at_step(pos.pitch.diatonic_index()))
            .unwrap_or_default()
    }
}

impl InteractionListener for () {}

pub struct InteractionController {
    mapper: PitchPositionMapper,
    navigator: KeyboardNavigator,
    playback: Box<dyn Playback>,
    hover: Option<StaffPosition>,
    accidental: Accidental,
}

impl InteractionController {
    /// Measure the staff and get ready for input. Fails only when the surface
    /// has not drawn the staff yet; the host should then disable interaction.
    pub fn new<S: StaffSurface + ?Sized>(
        surface: &S,
        mode: StaffMode,
        playback: Box<dyn Playback>,
    ) -> Result<Self, EngineError> {
        let mapper = PitchPositionMapper::new(StaffLayout::capture(surface, mode)?);
        let navigator = KeyboardNavigator::new(mapper.valid_positions());
        Ok(Self {
            mapper,
            navigator,
            playback,
            hover: None,
            accidental: Accidental::Natural,
        })
    }

    /// Replace the layout snapshot after a resize or clef change. Keyboard
    /// focus and the hover preview do not survive a relayout.
    pub fn relayout<S: StaffSurface + ?Sized>(
        &mut self,
        surface: &S,
        mode: StaffMode,
        listener: &mut dyn InteractionListener,
    ) -> Result<(), EngineError> {
        let layout = StaffLayout::capture(surface, mode)?;
        let before = self.navigator.state();
        self.mapper = PitchPositionMapper::new(layout);
        self.navigator.set_positions(self.mapper.valid_positions());
        self.hover = None;
        self.emit_focus_change(before, listener);
        Ok(())
    }

    pub fn dispose(mut self) {
        self.playback.stop();
    }

    pub fn mapper(&self) -> &PitchPositionMapper {
        &self.mapper
    }

    pub fn navigator(&self) -> &KeyboardNavigator {
        &self.navigator
    }

    pub fn focus_state(&self) -> KeyboardFocusState {
        self.navigator.state()
    }

    pub fn hover(&self) -> Option<StaffPosition> {
        self.hover
    }

    pub fn accidental(&self) -> Accidental {
        self.accidental
    }

    /// Hover preview. Never touches the selection.
    pub fn pointer_moved(
        &mut self,
        x: f64,
        y: f64,
        listener: &mut dyn InteractionListener,
    ) -> Option<StaffPosition> {
        self.release_keyboard(listener);
        if !self.mapper.is_within_interactive_area(x, y) {
            self.hover = None;
            return None;
        }
        let position = self
            .mapper
            .nearest_position(x, y)
            .with_accidental(self.accidental);
        self.hover = Some(position);
        listener.on_position_resolved(&position);
        Some(position)
    }

    pub fn pointer_left(&mut self) {
        self.hover = None;
    }

    /// Toggle the pitch under the pointer. Returns whether the selection changed.
    pub fn pointer_clicked(
        &mut self,
        x: f64,
        y: f64,
        selection: &mut SelectionSet,
        listener: &mut dyn InteractionListener,
    ) -> bool {
        self.release_keyboard(listener);
        if !self.mapper.is_within_interactive_area(x, y) {
            self.hover = None;
            return false;
        }
        let position = self
            .mapper
            .screen_to_position(x, y)
            .with_accidental(self.accidental);
        self.hover = Some(position);
        listener.on_position_resolved(&position);
        self.toggle_at(&position, selection, listener)
    }

    /// Returns whether the key belonged to the staff. Unconsumed keys are the
    /// host's to interpret.
    pub fn key_pressed(
        &mut self,
        key: KeyEvent,
        selection: &mut SelectionSet,
        listener: &mut dyn InteractionListener,
    ) -> bool {
        let before = self.navigator.state();
        let outcome = self.navigator.handle_key(key);
        if self.navigator.is_navigating() {
            self.hover = None;
        }
        self.emit_focus_change(before, listener);

        match outcome {
            NavOutcome::Ignored => false,
            NavOutcome::Activated | NavOutcome::Moved => true,
            NavOutcome::Place(position) => {
                let position = position.with_accidental(self.accidental);
                self.toggle_at(&position, selection, listener);
                true
            }
            NavOutcome::Delete => {
                let focus = self.navigator.focused_position();
                let doomed = listener.notes_to_delete(focus.as_ref(), selection);
                let before_len = selection.len();
                selection.remove_many(&doomed);
                if selection.len() != before_len {
                    listener.on_selection_changed(selection.pitches());
                }
                true
            }
            NavOutcome::Exited => {
                listener.on_blur_requested();
                true
            }
        }
    }

    /// Set the accidental for future placements and re-spell the single
    /// selected note on the focused (or hovered) line, if there is one. The
    /// re-spelling is one atomic replace, so capacity is never exceeded.
    pub fn apply_accidental(
        &mut self,
        accidental: Accidental,
        selection: &mut SelectionSet,
        listener: &mut dyn InteractionListener,
    ) -> bool {
        self.accidental = accidental;
        self.hover = self.hover.map(|h| h.with_accidental(accidental));

        let Some(position) = self.navigator.focused_position().or(self.hover) else {
            return false;
        };
        let replacement = position.pitch.with_accidental(accidental);
        let on_line = selection.at_step(position.pitch.diatonic_index());
        let [existing] = on_line.as_slice() else {
            return false;
        };
        if *existing == replacement || !selection.replace(existing, replacement) {
            return false;
        }
        listener.on_selection_changed(selection.pitches());
        self.playback.play(&[replacement], PlayIntent::Preview);
        true
    }

    /// Remove every selected pitch in one step. Returns whether anything was removed.
    pub fn clear_selection(
        &self,
        selection: &mut SelectionSet,
        listener: &mut dyn InteractionListener,
    ) -> bool {
        if selection.is_empty() {
            return false;
        }
        let pitches = selection.pitches().to_vec();
        selection.remove_many(&pitches);
        listener.on_selection_changed(selection.pitches());
        true
    }

    pub fn play_target(&mut self, target: &[Pitch]) {
        self.playback.play(target, PlayIntent::Target);
    }

    pub fn play_selection(&mut self, selection: &SelectionSet) {
        if selection.is_empty() {
            return;
        }
        let mut pitches = selection.pitches().to_vec();
        pitches.sort();
        self.playback.play(&pitches, PlayIntent::Selection);
    }

    /// Score the answer. Reads the selection but never changes it.
    pub fn submit(
        &self,
        target: &[Pitch],
        selection: &SelectionSet,
        listener: &mut dyn InteractionListener,
    ) -> ValidationResult {
        let result = validator::validate(target, selection.pitches());
        info!(
            "answer submitted: {} of {} found, {} wrong, accuracy {}%",
            result.correctly_identified.len(),
            result.correctly_identified.len() + result.missed.len(),
            result.incorrect.len(),
            result.accuracy
        );
        listener.on_validation_computed(&result);
        result
    }

    fn toggle_at(
        &mut self,
        position: &StaffPosition,
        selection: &mut SelectionSet,
        listener: &mut dyn InteractionListener,
    ) -> bool {
        let pitch = position.pitch;
        let adding = !selection.contains(&pitch);
        if !selection.toggle(pitch) {
            debug!("{pitch} not placed: selection is full");
            return false;
        }
        listener.on_selection_changed(selection.pitches());
        if adding {
            self.playback.play(&[pitch], PlayIntent::Preview);
        }
        true
    }

    fn release_keyboard(&mut self, listener: &mut dyn InteractionListener) {
        let before = self.navigator.state();
        if self.navigator.disable() {
            self.emit_focus_change(before, listener);
        }
    }

    fn emit_focus_change(
        &self,
        before: KeyboardFocusState,
        listener: &mut dyn InteractionListener,
    ) {
        let after = self.navigator.state();
        if after != before {
            listener.on_focus_changed(&after);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crossterm::event::{KeyCode, KeyModifiers};

    use super::*;
    use crate::engine::mapper::Clef;
    use crate::engine::mapper::tests::FakeSurface;
    use crate::engine::navigator::NavigationMode;
    use crate::engine::pitch::NoteLetter;

    type PlayLog = Rc<RefCell<Vec<(Vec<Pitch>, PlayIntent)>>>;

    struct RecordingPlayback(PlayLog);

    impl Playback for RecordingPlayback {
        fn play(&mut self, pitches: &[Pitch], intent: PlayIntent) {
            self.0.borrow_mut().push((pitches.to_vec(), intent));
        }
    }

    #[derive(Default)]
    struct Recorder {
        resolved: Vec<StaffPosition>,
        selections: Vec<Vec<Pitch>>,
        focus: Vec<KeyboardFocusState>,
        validations: Vec<ValidationResult>,
        blurs: usize,
    }

    impl InteractionListener for Recorder {
        fn on_position_resolved(&mut self, position: &StaffPosition) {
            self.resolved.push(*position);
        }
        fn on_selection_changed(&mut self, selection: &[Pitch]) {
            self.selections.push(selection.to_vec());
        }
        fn on_focus_changed(&mut self, focus: &KeyboardFocusState) {
            self.focus.push(*focus);
        }
        fn on_validation_computed(&mut self, result: &ValidationResult) {
            self.validations.push(result.clone());
        }
        fn on_blur_requested(&mut self) {
            self.blurs += 1;
        }
    }

    fn controller() -> (InteractionController, PlayLog) {
        let log: PlayLog = Rc::default();
        let ctl = InteractionController::new(
            &FakeSurface::single(),
            StaffMode::Single(Clef::Treble),
            Box::new(RecordingPlayback(log.clone())),
        )
        .unwrap();
        (ctl, log)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn n(letter: NoteLetter, octave: i32) -> Pitch {
        Pitch::natural(letter, octave)
    }

    #[test]
    fn test_new_fails_without_layout() {
        let surface = FakeSurface { staves: Vec::new() };
        let result = InteractionController::new(
            &surface,
            StaffMode::Single(Clef::Treble),
            Box::new(RecordingPlayback(Rc::default())),
        );
        assert!(matches!(result, Err(EngineError::StaffNotRendered { staff: 0 })));
    }

    #[test]
    fn test_hover_resolves_without_touching_selection() {
        let (mut ctl, plays) = controller();
        let mut rec = Recorder::default();
        let pos = ctl.pointer_moved(50.0, 140.0, &mut rec).unwrap();
        assert_eq!(pos.pitch, n(NoteLetter::E, 4));
        assert_eq!(ctl.hover(), Some(pos));
        assert_eq!(rec.resolved, vec![pos]);
        assert!(rec.selections.is_empty());
        assert!(plays.borrow().is_empty());
    }

    #[test]
    fn test_hover_outside_area_clears_preview() {
        let (mut ctl, _) = controller();
        let mut rec = Recorder::default();
        ctl.pointer_moved(50.0, 140.0, &mut rec);
        assert!(ctl.pointer_moved(900.0, 140.0, &mut rec).is_none());
        assert_eq!(ctl.hover(), None);
        assert_eq!(rec.resolved.len(), 1);
    }

    #[test]
    fn test_click_outside_area_drops_stale_hover() {
        let (mut ctl, plays) = controller();
        let mut rec = Recorder::default();
        let mut selection = SelectionSet::unlimited();
        ctl.pointer_moved(50.0, 140.0, &mut rec);
        assert!(ctl.hover().is_some());

        assert!(!ctl.pointer_clicked(900.0, 140.0, &mut selection, &mut rec));
        assert_eq!(ctl.hover(), None);
        assert!(selection.is_empty());
        assert!(rec.selections.is_empty());
        assert!(plays.borrow().is_empty());
    }

    #[test]
    fn test_click_toggles_and_previews_once() {
        let (mut ctl, plays) = controller();
        let mut rec = Recorder::default();
        let mut selection = SelectionSet::unlimited();
        assert!(ctl.pointer_clicked(50.0, 130.0, &mut selection, &mut rec));
        assert_eq!(selection.pitches(), &[n(NoteLetter::G, 4)]);
        assert!(ctl.pointer_clicked(50.0, 130.0, &mut selection, &mut rec));
        assert!(selection.is_empty());
        assert_eq!(rec.selections.len(), 2);
        let plays = plays.borrow();
        assert_eq!(plays.len(), 1);
        assert_eq!(plays[0], (vec![n(NoteLetter::G, 4)], PlayIntent::Preview));
    }

    #[test]
    fn test_click_on_full_selection_is_rejected_quietly() {
        let (mut ctl, plays) = controller();
        let mut rec = Recorder::default();
        let mut selection = SelectionSet::new(1, true);
        selection.add(n(NoteLetter::C, 4));
        assert!(!ctl.pointer_clicked(50.0, 130.0, &mut selection, &mut rec));
        assert_eq!(selection.len(), 1);
        assert!(rec.selections.is_empty());
        assert!(plays.borrow().is_empty());
    }

    #[test]
    fn test_pointer_activity_forces_keyboard_idle() {
        let (mut ctl, _) = controller();
        let mut rec = Recorder::default();
        let mut selection = SelectionSet::unlimited();
        assert!(ctl.key_pressed(key(KeyCode::Tab), &mut selection, &mut rec));
        assert_eq!(ctl.focus_state().mode, NavigationMode::Navigating);

        ctl.pointer_moved(50.0, 140.0, &mut rec);
        assert_eq!(ctl.focus_state(), KeyboardFocusState::default());
        assert_eq!(rec.focus.len(), 2);
        assert_eq!(rec.focus[1], KeyboardFocusState::default());
    }

    #[test]
    fn test_keyboard_place_uses_focus_and_accidental() {
        let (mut ctl, _) = controller();
        let mut rec = Recorder::default();
        let mut selection = SelectionSet::unlimited();
        ctl.key_pressed(key(KeyCode::Tab), &mut selection, &mut rec);
        ctl.apply_accidental(Accidental::Flat, &mut selection, &mut rec);
        ctl.key_pressed(key(KeyCode::Enter), &mut selection, &mut rec);
        // Centre of the treble list is the middle line, B4
        assert_eq!(
            selection.pitches(),
            &[Pitch::new(NoteLetter::B, Accidental::Flat, 4)]
        );
    }

    #[test]
    fn test_unrelated_key_is_left_to_host() {
        let (mut ctl, _) = controller();
        let mut selection = SelectionSet::unlimited();
        assert!(!ctl.key_pressed(key(KeyCode::Char('s')), &mut selection, &mut ()));
    }

    #[test]
    fn test_delete_removes_every_spelling_on_focused_line() {
        let (mut ctl, _) = controller();
        let mut rec = Recorder::default();
        let mut selection = SelectionSet::unlimited();
        let b4 = n(NoteLetter::B, 4);
        selection.add(b4);
        selection.add(b4.with_accidental(Accidental::Flat));
        selection.add(n(NoteLetter::C, 4));

        ctl.key_pressed(key(KeyCode::Tab), &mut selection, &mut rec);
        ctl.key_pressed(key(KeyCode::Delete), &mut selection, &mut rec);
        assert_eq!(selection.pitches(), &[n(NoteLetter::C, 4)]);
        assert_eq!(rec.selections.len(), 1);

        // Nothing left on the line: no change event
        ctl.key_pressed(key(KeyCode::Backspace), &mut selection, &mut rec);
        assert_eq!(rec.selections.len(), 1);
    }

    #[test]
    fn test_escape_requests_blur() {
        let (mut ctl, _) = controller();
        let mut rec = Recorder::default();
        let mut selection = SelectionSet::unlimited();
        ctl.key_pressed(key(KeyCode::Tab), &mut selection, &mut rec);
        assert!(ctl.key_pressed(key(KeyCode::Esc), &mut selection, &mut rec));
        assert_eq!(rec.blurs, 1);
        assert_eq!(ctl.focus_state(), KeyboardFocusState::default());
    }

    #[test]
    fn test_apply_accidental_respells_hovered_note() {
        let (mut ctl, plays) = controller();
        let mut rec = Recorder::default();
        let mut selection = SelectionSet::new(1, true);
        ctl.pointer_clicked(50.0, 150.0, &mut selection, &mut rec);
        assert_eq!(selection.pitches(), &[n(NoteLetter::C, 4)]);

        assert!(ctl.apply_accidental(Accidental::Sharp, &mut selection, &mut rec));
        assert_eq!(
            selection.pitches(),
            &[Pitch::new(NoteLetter::C, Accidental::Sharp, 4)]
        );
        assert_eq!(plays.borrow().len(), 2);
        // Same spelling again is a no-op
        assert!(!ctl.apply_accidental(Accidental::Sharp, &mut selection, &mut rec));
    }

    #[test]
    fn test_submit_reports_validation() {
        let (ctl, _) = controller();
        let mut rec = Recorder::default();
        let mut selection = SelectionSet::unlimited();
        selection.add(n(NoteLetter::C, 4));
        let target = [n(NoteLetter::C, 4), n(NoteLetter::E, 4)];
        let result = ctl.submit(&target, &selection, &mut rec);
        assert_eq!(result.accuracy, 50);
        assert_eq!(rec.validations, vec![result]);
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn test_relayout_resets_focus_and_hover() {
        let (mut ctl, _) = controller();
        let mut rec = Recorder::default();
        let mut selection = SelectionSet::unlimited();
        ctl.key_pressed(key(KeyCode::Tab), &mut selection, &mut rec);
        ctl.relayout(&FakeSurface::grand(), StaffMode::Grand, &mut rec)
            .unwrap();
        assert_eq!(ctl.focus_state(), KeyboardFocusState::default());
        assert_eq!(ctl.navigator().positions().len(), 33);
        assert_eq!(ctl.hover(), None);
    }

    #[test]
    fn test_clear_notifies_once_and_only_when_needed() {
        let (ctl, plays) = controller();
        let mut rec = Recorder::default();
        let mut selection = SelectionSet::unlimited();
        assert!(!ctl.clear_selection(&mut selection, &mut rec));
        assert!(rec.selections.is_empty());

        selection.add(n(NoteLetter::E, 4));
        selection.add(n(NoteLetter::G, 4));
        assert!(ctl.clear_selection(&mut selection, &mut rec));
        assert!(selection.is_empty());
        assert_eq!(rec.selections, vec![Vec::<Pitch>::new()]);
        assert!(plays.borrow().is_empty());
    }

    #[test]
    fn test_play_selection_sorts_by_pitch() {
        let (mut ctl, plays) = controller();
        let mut selection = SelectionSet::unlimited();
        selection.add(n(NoteLetter::G, 4));
        selection.add(n(NoteLetter::C, 4));
        ctl.play_selection(&selection);
        assert_eq!(
            plays.borrow()[0],
            (
                vec![n(NoteLetter::C, 4), n(NoteLetter::G, 4)],
                PlayIntent::Selection
            )
        );
    }
}
