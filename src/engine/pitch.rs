use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the seven diatonic letter names, in scale order from C.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NoteLetter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

pub const ALL_LETTERS: [NoteLetter; 7] = [
    NoteLetter::C,
    NoteLetter::D,
    NoteLetter::E,
    NoteLetter::F,
    NoteLetter::G,
    NoteLetter::A,
    NoteLetter::B,
];

impl NoteLetter {
    pub fn index(self) -> i32 {
        match self {
            NoteLetter::C => 0,
            NoteLetter::D => 1,
            NoteLetter::E => 2,
            NoteLetter::F => 3,
            NoteLetter::G => 4,
            NoteLetter::A => 5,
            NoteLetter::B => 6,
        }
    }

    /// Letter for any diatonic step count; wraps in both directions.
    pub fn from_index(index: i32) -> Self {
        ALL_LETTERS[index.rem_euclid(7) as usize]
    }

    /// Semitones above C in the same octave.
    pub fn semitone_offset(self) -> i32 {
        match self {
            NoteLetter::C => 0,
            NoteLetter::D => 2,
            NoteLetter::E => 4,
            NoteLetter::F => 5,
            NoteLetter::G => 7,
            NoteLetter::A => 9,
            NoteLetter::B => 11,
        }
    }

    pub fn from_char(ch: char) -> Option<Self> {
        match ch.to_ascii_lowercase() {
            'c' => Some(NoteLetter::C),
            'd' => Some(NoteLetter::D),
            'e' => Some(NoteLetter::E),
            'f' => Some(NoteLetter::F),
            'g' => Some(NoteLetter::G),
            'a' => Some(NoteLetter::A),
            'b' => Some(NoteLetter::B),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            NoteLetter::C => 'C',
            NoteLetter::D => 'D',
            NoteLetter::E => 'E',
            NoteLetter::F => 'F',
            NoteLetter::G => 'G',
            NoteLetter::A => 'A',
            NoteLetter::B => 'B',
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accidental {
    Flat,
    #[default]
    Natural,
    Sharp,
}

impl Accidental {
    pub fn semitone_offset(self) -> i32 {
        match self {
            Accidental::Flat => -1,
            Accidental::Natural => 0,
            Accidental::Sharp => 1,
        }
    }

    /// ASCII spelling used in pitch names (`C#4`, `Db4`).
    pub fn ascii(self) -> &'static str {
        match self {
            Accidental::Flat => "b",
            Accidental::Natural => "",
            Accidental::Sharp => "#",
        }
    }

}

/// A musical note value. Equality is structural: `C#4` and `Db4` are different
/// pitches even though they sound the same.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pitch {
    pub letter: NoteLetter,
    #[serde(default)]
    pub accidental: Accidental,
    pub octave: i32,
}

impl Pitch {
    pub fn new(letter: NoteLetter, accidental: Accidental, octave: i32) -> Self {
        Self {
            letter,
            accidental,
            octave,
        }
    }

    pub fn natural(letter: NoteLetter, octave: i32) -> Self {
        Self::new(letter, Accidental::Natural, octave)
    }

    /// Pitch reached by stepping `steps` letter names from C0.
    pub fn from_diatonic_index(index: i32) -> Self {
        Self::natural(NoteLetter::from_index(index), index.div_euclid(7))
    }

    /// MIDI-style semitone number, C4 = 60.
    pub fn semitone(&self) -> i32 {
        (self.octave + 1) * 12 + self.letter.semitone_offset() + self.accidental.semitone_offset()
    }

    /// Letter-name steps from C0, ignoring the accidental.
    pub fn diatonic_index(&self) -> i32 {
        self.octave * 7 + self.letter.index()
    }

    pub fn with_accidental(self, accidental: Accidental) -> Self {
        Self { accidental, ..self }
    }
}

impl Ord for Pitch {
    fn cmp(&self, other: &Self) -> Ordering {
        self.semitone()
            .cmp(&other.semitone())
            .then_with(|| self.diatonic_index().cmp(&other.diatonic_index()))
    }
}

impl PartialOrd for Pitch {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.letter.as_char(),
            self.accidental.ascii(),
            self.octave
        )
    }
}
