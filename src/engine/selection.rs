use log::debug;

use crate::engine::pitch::Pitch;

/// The pitches a player has placed on the staff, in placement order.
///
/// Uniqueness is by pitch value, not by staff position: `C4` and `C#4` can both be
/// selected even though they are drawn on the same line. When `limit_enabled` is
/// set the set never grows past `max_notes`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionSet {
    pitches: Vec<Pitch>,
    max_notes: usize,
    limit_enabled: bool,
}

impl SelectionSet {
    pub fn new(max_notes: usize, limit_enabled: bool) -> Self {
        Self {
            pitches: Vec::new(),
            max_notes,
            limit_enabled,
        }
    }

    #[allow(dead_code)]
    pub fn unlimited() -> Self {
        Self::new(0, false)
    }

    pub fn pitches(&self) -> &[Pitch] {
        &self.pitches
    }

    pub fn len(&self) -> usize {
        self.pitches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pitches.is_empty()
    }

    pub fn contains(&self, pitch: &Pitch) -> bool {
        self.pitches.contains(pitch)
    }

    pub fn max_notes(&self) -> usize {
        self.max_notes
    }

    pub fn limit_enabled(&self) -> bool {
        self.limit_enabled
    }

    /// Change the capacity. Shrinking below the current size keeps every note;
    /// adds fail until enough have been removed.
    #[allow(dead_code)]
    pub fn set_limit(&mut self, max_notes: usize, limit_enabled: bool) {
        self.max_notes = max_notes;
        self.limit_enabled = limit_enabled;
    }

    fn is_full(&self) -> bool {
        self.limit_enabled && self.pitches.len() >= self.max_notes
    }

    /// With a pitch: would `add` succeed? Without: is there any room left?
    pub fn can_add(&self, pitch: Option<&Pitch>) -> bool {
        match pitch {
            Some(p) => !self.contains(p) && !self.is_full(),
            None => !self.is_full(),
        }
    }

    pub fn add(&mut self, pitch: Pitch) -> bool {
        if !self.can_add(Some(&pitch)) {
            return false;
        }
        self.pitches.push(pitch);
        debug!("selected {pitch} ({} total)", self.pitches.len());
        true
    }

    pub fn remove(&mut self, pitch: &Pitch) -> bool {
        match self.pitches.iter().position(|p| p == pitch) {
            Some(idx) => {
                self.pitches.remove(idx);
                debug!("deselected {pitch} ({} total)", self.pitches.len());
                true
            }
            None => false,
        }
    }

    pub fn toggle(&mut self, pitch: Pitch) -> bool {
        if self.contains(&pitch) {
            self.remove(&pitch)
        } else {
            self.add(pitch)
        }
    }

    /// Remove whatever is present; absent pitches are skipped.
    pub fn remove_many(&mut self, pitches: &[Pitch]) {
        for pitch in pitches {
            self.remove(pitch);
        }
    }

    /// Swap `old` for `new` in place. Fails without mutating when `old` is
    /// missing or `new` is already selected. The size never changes, so the
    /// capacity limit cannot be crossed halfway through.
    pub fn replace(&mut self, old: &Pitch, new: Pitch) -> bool {
        if old == &new {
            return self.contains(old);
        }
        if self.contains(&new) {
            return false;
        }
        match self.pitches.iter().position(|p| p == old) {
            Some(idx) => {
                self.pitches[idx] = new;
                debug!("respelled {old} as {new}");
                true
            }
            None => false,
        }
    }

    /// Selected pitches written on the given diatonic step, whatever their accidental.
    pub fn at_step(&self, diatonic_index: i32) -> Vec<Pitch> {
        self.pitches
            .iter()
            .filter(|p| p.diatonic_index() == diatonic_index)
            .copied()
            .collect()
    }

    pub fn clear(&mut self) {
        self.pitches.clear();
    }
}
