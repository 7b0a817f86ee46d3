use std::cell::RefCell;
use std::rc::Rc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use earstaff::engine::mapper::positions_for_mode;
use earstaff::engine::{
    Accidental, Clef, EngineError, InteractionController, InteractionListener, KeyboardFocusState,
    NavigationMode, NoteLetter, Pitch, PlayIntent, Playback, SelectionSet, StaffMode,
    StaffSurface, ValidationResult,
};

/// Grand staff on a 10-unit line spacing: treble lines at y 100..=140, bass
/// lines at y 160..=200. Middle C sits at y 150 for both staves.
struct GrandSurface {
    staves: usize,
}

impl StaffSurface for GrandSurface {
    fn line_y(&self, staff: usize, line: u8) -> Option<f64> {
        (staff < self.staves).then(|| 100.0 + staff as f64 * 60.0 + line as f64 * 10.0)
    }
    fn line_spacing(&self, staff: usize) -> Option<f64> {
        (staff < self.staves).then_some(10.0)
    }
    fn staff_x(&self, staff: usize) -> Option<f64> {
        (staff < self.staves).then_some(20.0)
    }
    fn staff_width(&self, staff: usize) -> Option<f64> {
        (staff < self.staves).then_some(200.0)
    }
}

type PlayLog = Rc<RefCell<Vec<(Vec<Pitch>, PlayIntent)>>>;

struct SharedPlayback(PlayLog);

impl Playback for SharedPlayback {
    fn play(&mut self, pitches: &[Pitch], intent: PlayIntent) {
        self.0.borrow_mut().push((pitches.to_vec(), intent));
    }
}

#[derive(Default)]
struct Events {
    selections: usize,
    focus: Vec<KeyboardFocusState>,
    validations: Vec<ValidationResult>,
    blurs: usize,
}

impl InteractionListener for Events {
    fn on_selection_changed(&mut self, _selection: &[Pitch]) {
        self.selections += 1;
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

fn grand_controller() -> (InteractionController, PlayLog) {
    let log: PlayLog = Rc::default();
    let ctl = InteractionController::new(
        &GrandSurface { staves: 2 },
        StaffMode::Grand,
        Box::new(SharedPlayback(log.clone())),
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
fn middle_c_between_staves_is_written_on_treble() {
    let (mut ctl, _) = grand_controller();
    let mut events = Events::default();
    let pos = ctl.pointer_moved(50.0, 150.0, &mut events).unwrap();
    assert_eq!(pos.clef, Clef::Treble);
    assert_eq!(pos.line_position, -2);
    assert_eq!(pos.pitch, n(NoteLetter::C, 4));

    let below = ctl.pointer_moved(50.0, 155.0, &mut events).unwrap();
    assert_eq!(below.clef, Clef::Bass);
    assert_eq!(below.pitch, n(NoteLetter::B, 3));
}

#[test]
fn grand_staff_offers_each_pitch_once() {
    let positions = positions_for_mode(StaffMode::Grand);
    let mut steps: Vec<i32> = positions.iter().map(|p| p.pitch.diatonic_index()).collect();
    let before = steps.len();
    steps.dedup();
    assert_eq!(steps.len(), before);
    assert!(steps.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(positions[positions.len() / 2].pitch, n(NoteLetter::C, 4));
}

#[test]
fn full_answer_still_accepts_a_respelling() {
    let (mut ctl, _) = grand_controller();
    let mut events = Events::default();
    let mut selection = SelectionSet::new(2, true);

    assert!(ctl.pointer_clicked(50.0, 150.0, &mut selection, &mut events));
    assert!(ctl.pointer_clicked(50.0, 145.0, &mut selection, &mut events));
    assert!(!ctl.pointer_clicked(50.0, 135.0, &mut selection, &mut events));
    assert_eq!(selection.pitches(), &[n(NoteLetter::C, 4), n(NoteLetter::D, 4)]);

    ctl.pointer_moved(50.0, 150.0, &mut events);
    assert!(ctl.apply_accidental(Accidental::Sharp, &mut selection, &mut events));
    assert_eq!(
        selection.pitches(),
        &[
            Pitch::new(NoteLetter::C, Accidental::Sharp, 4),
            n(NoteLetter::D, 4)
        ]
    );
    assert_eq!(selection.len(), 2);
}

#[test]
fn keyboard_round_from_tab_to_submit() {
    let (mut ctl, plays) = grand_controller();
    let mut events = Events::default();
    let mut selection = SelectionSet::new(2, true);
    let target = vec![n(NoteLetter::E, 4), n(NoteLetter::G, 3)];

    ctl.play_target(&target);

    assert!(ctl.key_pressed(key(KeyCode::Tab), &mut selection, &mut events));
    assert_eq!(
        ctl.focus_state().focused_position.map(|p| p.pitch),
        Some(n(NoteLetter::C, 4))
    );

    // Uppercase letter jumps to the nearest E and places it.
    assert!(ctl.key_pressed(key(KeyCode::Char('E')), &mut selection, &mut events));
    assert_eq!(selection.pitches(), &[n(NoteLetter::E, 4)]);

    // Walk down to G3 on the bass staff and place it with Enter.
    for _ in 0..5 {
        ctl.key_pressed(key(KeyCode::Down), &mut selection, &mut events);
    }
    assert_eq!(
        ctl.focus_state().focused_position.map(|p| (p.clef, p.pitch)),
        Some((Clef::Bass, n(NoteLetter::G, 3)))
    );
    assert!(ctl.key_pressed(key(KeyCode::Enter), &mut selection, &mut events));

    let result = ctl.submit(&target, &selection, &mut events);
    assert!(result.is_correct);
    assert_eq!(result.accuracy, 100);
    assert_eq!(events.validations, vec![result]);
    assert_eq!(selection.len(), 2);

    let plays = plays.borrow();
    assert_eq!(plays[0], (target.clone(), PlayIntent::Target));
    assert_eq!(
        plays.iter().filter(|(_, intent)| *intent == PlayIntent::Preview).count(),
        2
    );
}

#[test]
fn pointer_motion_ends_keyboard_mode() {
    let (mut ctl, _) = grand_controller();
    let mut events = Events::default();
    let mut selection = SelectionSet::unlimited();

    ctl.key_pressed(key(KeyCode::Tab), &mut selection, &mut events);
    assert_eq!(ctl.focus_state().mode, NavigationMode::Navigating);

    ctl.pointer_moved(50.0, 120.0, &mut events);
    assert_eq!(ctl.focus_state().mode, NavigationMode::Idle);
    assert_eq!(ctl.focus_state().focused_position, None);
    assert_eq!(events.focus.last().map(|f| f.mode), Some(NavigationMode::Idle));
    assert_eq!(events.blurs, 0);
}

#[test]
fn delete_clears_every_spelling_on_the_line() {
    let (mut ctl, _) = grand_controller();
    let mut events = Events::default();
    let mut selection = SelectionSet::unlimited();
    selection.add(n(NoteLetter::C, 4));
    selection.add(Pitch::new(NoteLetter::C, Accidental::Sharp, 4));
    selection.add(n(NoteLetter::D, 4));

    ctl.key_pressed(key(KeyCode::Tab), &mut selection, &mut events);
    assert!(ctl.key_pressed(key(KeyCode::Delete), &mut selection, &mut events));
    assert_eq!(selection.pitches(), &[n(NoteLetter::D, 4)]);
    assert_eq!(events.selections, 1);
}

#[test]
fn escape_belongs_to_host_until_navigating() {
    let (mut ctl, _) = grand_controller();
    let mut events = Events::default();
    let mut selection = SelectionSet::unlimited();

    assert!(!ctl.key_pressed(key(KeyCode::Esc), &mut selection, &mut events));
    ctl.key_pressed(key(KeyCode::Tab), &mut selection, &mut events);
    assert!(ctl.key_pressed(key(KeyCode::Esc), &mut selection, &mut events));
    assert_eq!(events.blurs, 1);
    assert_eq!(ctl.focus_state().mode, NavigationMode::Idle);
}

#[test]
fn relayout_without_bass_staff_fails() {
    let (mut ctl, _) = grand_controller();
    let mut events = Events::default();
    let err = ctl
        .relayout(&GrandSurface { staves: 1 }, StaffMode::Grand, &mut events)
        .unwrap_err();
    assert!(matches!(err, EngineError::StaffNotRendered { staff: 1 }));

    // A single treble staff is still fine on the same surface.
    ctl.relayout(
        &GrandSurface { staves: 1 },
        StaffMode::Single(Clef::Treble),
        &mut events,
    )
    .unwrap();
    assert_eq!(ctl.mapper().mode(), StaffMode::Single(Clef::Treble));
}

#[test]
fn delete_from_idle_only_reveals_focus() {
    let (mut ctl, _) = grand_controller();
    let mut events = Events::default();
    let mut selection = SelectionSet::unlimited();
    selection.add(n(NoteLetter::C, 4));
    selection.add(n(NoteLetter::B, 4));

    let hovered = ctl.pointer_moved(50.0, 150.0, &mut events).unwrap();
    assert_eq!(hovered.pitch, n(NoteLetter::C, 4));

    assert!(ctl.key_pressed(key(KeyCode::Delete), &mut selection, &mut events));
    assert_eq!(ctl.focus_state().mode, NavigationMode::Navigating);
    assert_eq!(selection.pitches(), &[n(NoteLetter::C, 4), n(NoteLetter::B, 4)]);
    assert_eq!(events.selections, 0);

    // Once the focus is on screen, Delete acts on it.
    assert!(ctl.key_pressed(key(KeyCode::Backspace), &mut selection, &mut events));
    assert_eq!(selection.pitches(), &[n(NoteLetter::B, 4)]);
}
