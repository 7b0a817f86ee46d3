//! Keyboard focus over the staff.
//!
//! Two states: `Idle`, where the pointer drives interaction and nothing is
//! focused, and `Navigating`, where a focus index walks the precomputed list of
//! valid positions. Every transition happens synchronously inside
//! [`KeyboardNavigator::handle_key`] or [`KeyboardNavigator::disable`].

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::debug;

use crate::engine::mapper::StaffPosition;
use crate::engine::pitch::NoteLetter;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NavigationMode {
    #[default]
    Idle,
    Navigating,
}

/// Read-only snapshot handed to the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyboardFocusState {
    pub mode: NavigationMode,
    pub focused_position: Option<StaffPosition>,
}

/// What a key press asks the host to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavOutcome {
    /// Not a navigation key; nothing changed.
    Ignored,
    /// Keyboard mode switched on and focus placed.
    Activated,
    Moved,
    /// Toggle the pitch at this position.
    Place(StaffPosition),
    /// Remove selected notes (the host decides which).
    Delete,
    /// Back to idle; blur any input surface.
    Exited,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NavKey {
    Next,
    Prev,
    Up,
    Down,
    First,
    Last,
    Place,
    Delete,
    Exit,
    Letter { letter: NoteLetter, place: bool },
}

impl NavKey {
    fn from_event(key: &KeyEvent) -> Option<Self> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return None;
        }
        let shifted = key.modifiers.contains(KeyModifiers::SHIFT);
        match key.code {
            KeyCode::Tab if shifted => Some(NavKey::Prev),
            KeyCode::Tab => Some(NavKey::Next),
            KeyCode::BackTab => Some(NavKey::Prev),
            KeyCode::Up => Some(NavKey::Up),
            KeyCode::Down => Some(NavKey::Down),
            KeyCode::Home => Some(NavKey::First),
            KeyCode::End => Some(NavKey::Last),
            KeyCode::Enter | KeyCode::Char(' ') => Some(NavKey::Place),
            KeyCode::Delete | KeyCode::Backspace => Some(NavKey::Delete),
            KeyCode::Esc => Some(NavKey::Exit),
            KeyCode::Char(ch) => NoteLetter::from_char(ch).map(|letter| NavKey::Letter {
                letter,
                place: shifted
                    || ch.is_ascii_uppercase()
                    || key.modifiers.contains(KeyModifiers::ALT),
            }),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct KeyboardNavigator {
    positions: Vec<StaffPosition>,
    mode: NavigationMode,
    focus: Option<usize>,
}

impl KeyboardNavigator {
    pub fn new(positions: Vec<StaffPosition>) -> Self {
        Self {
            positions,
            mode: NavigationMode::Idle,
            focus: None,
        }
    }

    /// Swap in the positions for a new staff layout. Always returns to idle.
    pub fn set_positions(&mut self, positions: Vec<StaffPosition>) {
        self.positions = positions;
        self.reset();
    }

    #[allow(dead_code)]
    pub fn positions(&self) -> &[StaffPosition] {
        &self.positions
    }

    #[allow(dead_code)]
    pub fn mode(&self) -> NavigationMode {
        self.mode
    }

    pub fn is_navigating(&self) -> bool {
        self.mode == NavigationMode::Navigating
    }

    #[allow(dead_code)]
    pub fn focused_index(&self) -> Option<usize> {
        self.focus
    }

    pub fn focused_position(&self) -> Option<StaffPosition> {
        self.focus.and_then(|idx| self.positions.get(idx).copied())
    }

    pub fn state(&self) -> KeyboardFocusState {
        KeyboardFocusState {
            mode: self.mode,
            focused_position: self.focused_position(),
        }
    }

    /// Centre of the list: the middle line on a single staff, middle C on a grand staff.
    fn home_index(&self) -> usize {
        self.positions.len() / 2
    }

    fn reset(&mut self) {
        self.mode = NavigationMode::Idle;
        self.focus = None;
    }

    /// Leave keyboard mode from outside, e.g. because the pointer moved.
    /// Returns whether anything changed.
    pub fn disable(&mut self) -> bool {
        if self.mode == NavigationMode::Idle {
            return false;
        }
        debug!("keyboard navigation disabled by pointer");
        self.reset();
        true
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> NavOutcome {
        let Some(nav) = NavKey::from_event(&key) else {
            return NavOutcome::Ignored;
        };
        if self.positions.is_empty() {
            return NavOutcome::Ignored;
        }

        if self.mode == NavigationMode::Idle {
            return self.activate(nav);
        }

        let last = self.positions.len() - 1;
        let current = self.focus.unwrap_or_else(|| self.home_index());
        match nav {
            NavKey::Next => self.move_to(if current == last { 0 } else { current + 1 }),
            NavKey::Prev => self.move_to(if current == 0 { last } else { current - 1 }),
            NavKey::Up => self.move_to((current + 1).min(last)),
            NavKey::Down => self.move_to(current.saturating_sub(1)),
            NavKey::First => self.move_to(0),
            NavKey::Last => self.move_to(last),
            NavKey::Place => NavOutcome::Place(self.positions[current]),
            NavKey::Delete => NavOutcome::Delete,
            NavKey::Exit => {
                debug!("keyboard navigation exited");
                self.reset();
                NavOutcome::Exited
            }
            NavKey::Letter { letter, place } => self.jump_to_letter(current, letter, place),
        }
    }

    /// First recognized key while idle. Movement, placement and delete keys
    /// only reveal the focus; letters still jump.
    fn activate(&mut self, nav: NavKey) -> NavOutcome {
        if nav == NavKey::Exit {
            return NavOutcome::Ignored;
        }
        let home = self.home_index();
        self.mode = NavigationMode::Navigating;
        self.focus = Some(home);
        debug!("keyboard navigation activated at index {home}");

        match nav {
            NavKey::Letter { letter, place } => self.jump_to_letter(home, letter, place),
            _ => NavOutcome::Activated,
        }
    }

    fn move_to(&mut self, index: usize) -> NavOutcome {
        self.focus = Some(index);
        NavOutcome::Moved
    }

    fn jump_to_letter(&mut self, from: usize, letter: NoteLetter, place: bool) -> NavOutcome {
        let target = self
            .positions
            .iter()
            .enumerate()
            .filter(|(_, pos)| pos.pitch.letter == letter)
            .min_by_key(|(idx, _)| (idx.abs_diff(from), *idx < from))
            .map(|(idx, _)| idx);

        let Some(idx) = target else {
            return NavOutcome::Moved;
        };
        self.focus = Some(idx);
        if place {
            NavOutcome::Place(self.positions[idx])
        } else {
            NavOutcome::Moved
        }
    }
}
