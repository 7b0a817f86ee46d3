//! Geometry <-> pitch conversion for one staff-layout snapshot.
//!
//! Vertical placement is encoded as a *line position*: 0 is the bottom line of a
//! five-line staff, every step up is one diatonic letter, even values sit on a
//! line and odd values in a space. Each clef pins a pitch to position 0, so a
//! line position plus a clef is enough to name a natural pitch.

use std::ops::RangeInclusive;

use log::debug;

use crate::engine::error::EngineError;
use crate::engine::pitch::{Accidental, NoteLetter, Pitch};

/// Clamp range for line positions on any single staff.
pub const POSITION_RANGE: RangeInclusive<i32> = -6..=14;

/// Positions that sit on or directly against the five lines and need no ledger stroke.
pub const NATIVE_SPAN: RangeInclusive<i32> = -1..=9;

/// Pointer slack around the staff box, in line spacings.
pub const INTERACTIVE_MARGIN_SPACINGS: f64 = 3.0;

/// On a grand staff, pitches at or above this octave belong to the treble staff.
pub const GRAND_STAFF_SPLIT_OCTAVE: i32 = 4;

pub const STAFF_LINE_COUNT: u8 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Clef {
    Treble,
    Bass,
}

impl Clef {
    /// The natural pitch printed on the bottom line.
    pub fn anchor(self) -> Pitch {
        match self {
            Clef::Treble => Pitch::natural(NoteLetter::E, 4),
            Clef::Bass => Pitch::natural(NoteLetter::G, 2),
        }
    }

    pub fn native_span(self) -> RangeInclusive<i32> {
        NATIVE_SPAN
    }

    pub fn pitch_at(self, line_position: i32) -> Pitch {
        Pitch::from_diatonic_index(self.anchor().diatonic_index() + line_position)
    }

    /// Inverse of [`Clef::pitch_at`]; the accidental does not move a note vertically.
    pub fn line_position_of(self, pitch: &Pitch) -> i32 {
        pitch.diatonic_index() - self.anchor().diatonic_index()
    }

    pub fn name(self) -> &'static str {
        match self {
            Clef::Treble => "treble",
            Clef::Bass => "bass",
        }
    }

    /// Grand-staff routing for pitches that could be written on either staff.
    pub fn for_grand_staff(pitch: &Pitch) -> Self {
        if pitch.octave >= GRAND_STAFF_SPLIT_OCTAVE {
            Clef::Treble
        } else {
            Clef::Bass
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StaffMode {
    Single(Clef),
    /// Treble staff (index 0) above a bass staff (index 1).
    Grand,
}

impl StaffMode {
    pub fn clefs(self) -> Vec<Clef> {
        match self {
            StaffMode::Single(clef) => vec![clef],
            StaffMode::Grand => vec![Clef::Treble, Clef::Bass],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StaffPosition {
    pub line_position: i32,
    pub is_line: bool,
    pub requires_ledger_line: bool,
    pub clef: Clef,
    pub pitch: Pitch,
}

impl StaffPosition {
    pub fn new(clef: Clef, line_position: i32) -> Self {
        Self {
            line_position,
            is_line: line_position.rem_euclid(2) == 0,
            requires_ledger_line: !clef.native_span().contains(&line_position),
            clef,
            pitch: clef.pitch_at(line_position),
        }
    }

    pub fn with_accidental(self, accidental: Accidental) -> Self {
        Self {
            pitch: self.pitch.with_accidental(accidental),
            ..self
        }
    }

    /// Line positions of the ledger strokes between the staff and this note.
    pub fn ledger_lines(&self) -> Vec<i32> {
        let span = self.clef.native_span();
        if self.line_position < *span.start() {
            (self.line_position..*span.start())
                .filter(|p| p.rem_euclid(2) == 0)
                .rev()
                .collect()
        } else if self.line_position > *span.end() {
            (*span.end() + 1..=self.line_position)
                .filter(|p| p.rem_euclid(2) == 0)
                .collect()
        } else {
            Vec::new()
        }
    }
}

/// The four queries the engine needs from whatever draws the staff.
///
/// Staff 0 is the top staff. Line 0 is the top line of a staff and line 4 its
/// bottom line; Y grows downward. `None` means the staff has not been drawn.
pub trait StaffSurface {
    fn line_y(&self, staff: usize, line: u8) -> Option<f64>;
    fn line_spacing(&self, staff: usize) -> Option<f64>;
    fn staff_x(&self, staff: usize) -> Option<f64>;
    fn staff_width(&self, staff: usize) -> Option<f64>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StaffGeometry {
    pub clef: Clef,
    pub top_y: f64,
    /// Y of the bottom line, i.e. line position 0.
    pub anchor_y: f64,
    pub line_spacing: f64,
    pub x: f64,
    pub width: f64,
}

impl StaffGeometry {
    fn half_spacing(&self) -> f64 {
        self.line_spacing / 2.0
    }

    fn continuous_position(&self, y: f64) -> f64 {
        (self.anchor_y - y) / self.half_spacing()
    }

    fn snapped_position(&self, y: f64) -> i32 {
        let raw = self.continuous_position(y).round();
        let (lo, hi) = (*POSITION_RANGE.start(), *POSITION_RANGE.end());
        // Saturate first so absurd coordinates cannot overflow the cast.
        raw.clamp(lo as f64, hi as f64) as i32
    }

    fn y_for(&self, line_position: i32) -> f64 {
        self.anchor_y - line_position as f64 * self.half_spacing()
    }

    fn distance_to_lines(&self, y: f64) -> f64 {
        if y < self.top_y {
            self.top_y - y
        } else if y > self.anchor_y {
            y - self.anchor_y
        } else {
            0.0
        }
    }
}

/// Measurements of every staff for one layout, taken in a single pass.
#[derive(Clone, Debug, PartialEq)]
pub struct StaffLayout {
    mode: StaffMode,
    staves: Vec<StaffGeometry>,
}

impl StaffLayout {
    pub fn capture<S: StaffSurface + ?Sized>(
        surface: &S,
        mode: StaffMode,
    ) -> Result<Self, EngineError> {
        let staves = mode
            .clefs()
            .into_iter()
            .enumerate()
            .map(|(idx, clef)| measure(surface, idx, clef))
            .collect::<Result<Vec<_>, _>>()?;
        debug!("captured {} staff layout for {mode:?}", staves.len());
        Ok(Self { mode, staves })
    }

    pub fn staff(&self, clef: Clef) -> Option<&StaffGeometry> {
        self.staves.iter().find(|s| s.clef == clef)
    }
}

fn measure<S: StaffSurface + ?Sized>(
    surface: &S,
    staff: usize,
    clef: Clef,
) -> Result<StaffGeometry, EngineError> {
    let missing = || EngineError::StaffNotRendered { staff };
    let top_y = surface.line_y(staff, 0).ok_or_else(missing)?;
    let anchor_y = surface
        .line_y(staff, STAFF_LINE_COUNT - 1)
        .ok_or_else(missing)?;
    let line_spacing = surface.line_spacing(staff).ok_or_else(missing)?;
    let x = surface.staff_x(staff).ok_or_else(missing)?;
    let width = surface.staff_width(staff).ok_or_else(missing)?;

    if !line_spacing.is_finite() || line_spacing <= 0.0 {
        return Err(EngineError::InvalidLineSpacing {
            staff,
            spacing: line_spacing,
        });
    }

    Ok(StaffGeometry {
        clef,
        top_y,
        anchor_y,
        line_spacing,
        x,
        width,
    })
}

/// Stateless conversions over a captured [`StaffLayout`]. Every query returns a
/// valid position; out-of-range input is clamped.
#[derive(Clone, Debug)]
pub struct PitchPositionMapper {
    layout: StaffLayout,
}

impl PitchPositionMapper {
    pub fn new(layout: StaffLayout) -> Self {
        Self { layout }
    }

    #[allow(dead_code)]
    pub fn mode(&self) -> StaffMode {
        self.layout.mode
    }

    /// Resolve a screen point to a natural-pitch staff position. `x` plays no
    /// part in the vertical snap; horizontal placement belongs to the caller.
    pub fn screen_to_position(&self, _x: f64, y: f64) -> StaffPosition {
        match self.layout.mode {
            StaffMode::Single(_) => {
                let staff = &self.layout.staves[0];
                StaffPosition::new(staff.clef, staff.snapped_position(y))
            }
            StaffMode::Grand => self.resolve_grand(y),
        }
    }

    /// Snap semantics for hover previews; identical to [`Self::screen_to_position`].
    pub fn nearest_position(&self, x: f64, y: f64) -> StaffPosition {
        self.screen_to_position(x, y)
    }

    fn resolve_grand(&self, y: f64) -> StaffPosition {
        let treble = &self.layout.staves[0];
        let bass = &self.layout.staves[1];
        let to_treble = treble.distance_to_lines(y);
        let to_bass = bass.distance_to_lines(y);

        if to_treble == 0.0 || y < treble.top_y {
            return StaffPosition::new(Clef::Treble, treble.snapped_position(y));
        }
        if to_bass == 0.0 || y > bass.anchor_y {
            return StaffPosition::new(Clef::Bass, bass.snapped_position(y));
        }

        // Between the staves: read the pitch off the closer staff, then let the
        // octave decide which staff writes it.
        let nearer = if to_treble <= to_bass { treble } else { bass };
        let pitch = nearer.clef.pitch_at(nearer.snapped_position(y));
        let clef = Clef::for_grand_staff(&pitch);
        StaffPosition::new(clef, clamp_position(clef.line_position_of(&pitch)))
    }

    /// Staff position a pitch is written at, routed and clamped for this layout.
    pub fn position_for_pitch(&self, pitch: &Pitch) -> StaffPosition {
        let clef = match self.layout.mode {
            StaffMode::Single(clef) => clef,
            StaffMode::Grand => Clef::for_grand_staff(pitch),
        };
        StaffPosition::new(clef, clamp_position(clef.line_position_of(pitch)))
            .with_accidental(pitch.accidental)
    }

    /// Screen point for a position, with the caller's `x` passed through.
    pub fn position_to_screen(&self, position: &StaffPosition, x: f64) -> (f64, f64) {
        let staff = self
            .layout
            .staff(position.clef)
            .unwrap_or(&self.layout.staves[0]);
        (x, staff.y_for(position.line_position))
    }

    pub fn is_within_interactive_area(&self, x: f64, y: f64) -> bool {
        let mut left = f64::INFINITY;
        let mut right = f64::NEG_INFINITY;
        let mut top = f64::INFINITY;
        let mut bottom = f64::NEG_INFINITY;
        for staff in &self.layout.staves {
            let margin = staff.line_spacing * INTERACTIVE_MARGIN_SPACINGS;
            left = left.min(staff.x - margin);
            right = right.max(staff.x + staff.width + margin);
            top = top.min(staff.top_y - margin);
            bottom = bottom.max(staff.anchor_y + margin);
        }
        (left..=right).contains(&x) && (top..=bottom).contains(&y)
    }

    /// Every reachable position, lowest pitch first.
    pub fn valid_positions(&self) -> Vec<StaffPosition> {
        positions_for_mode(self.layout.mode)
    }
}

/// Every position a staff mode offers, lowest pitch first. On a grand staff
/// the overlap between the staves is kept once, on the staff its octave picks.
pub fn positions_for_mode(mode: StaffMode) -> Vec<StaffPosition> {
    match mode {
        StaffMode::Single(clef) => POSITION_RANGE
            .map(|lp| StaffPosition::new(clef, lp))
            .collect(),
        StaffMode::Grand => [Clef::Bass, Clef::Treble]
            .into_iter()
            .flat_map(|clef| {
                POSITION_RANGE
                    .map(move |lp| StaffPosition::new(clef, lp))
                    .filter(move |pos| Clef::for_grand_staff(&pos.pitch) == clef)
            })
            .collect(),
    }
}

fn clamp_position(line_position: i32) -> i32 {
    line_position.clamp(*POSITION_RANGE.start(), *POSITION_RANGE.end())
}
