use std::collections::BTreeMap;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::Widget;

use crate::engine::mapper::{
    Clef, PitchPositionMapper, STAFF_LINE_COUNT, StaffMode, StaffPosition, StaffSurface,
};
use crate::engine::pitch::{Accidental, Pitch};
use crate::ui::theme::Theme;

/// Columns reserved left of the staff for the clef label.
pub const LABEL_WIDTH: u16 = 8;
/// One terminal row per half line-spacing.
pub const ROWS_PER_SPACING: u16 = 2;
/// Rows above the top line and below the bottom line for ledger notes.
const LEDGER_ROWS: u16 = 6;
/// Treble top line to bass top line on a grand staff. Middle C sits on the
/// shared ledger row between them.
const GRAND_STAFF_OFFSET: u16 = 12;
const MIN_STAFF_WIDTH: u16 = 16;
/// Horizontal distance between notes that land on the same row.
const SAME_ROW_SPREAD: u16 = 4;

const LINE_GLYPH: &str = "─";
const NOTE_GLYPH: &str = "●";
const GHOST_GLYPH: &str = "○";

/// Staff geometry for a terminal area, in cell coordinates.
///
/// Row `r` and column `c` are reported to the engine as `(c as f64, r as f64)`,
/// so mouse events can be passed through unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TerminalStaffSurface {
    area: Rect,
    mode: StaffMode,
}

impl TerminalStaffSurface {
    pub fn new(area: Rect, mode: StaffMode) -> Self {
        Self { area, mode }
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn mode(&self) -> StaffMode {
        self.mode
    }

    pub fn rows_needed(mode: StaffMode) -> u16 {
        let line_rows = (STAFF_LINE_COUNT as u16 - 1) * ROWS_PER_SPACING + 1;
        match mode {
            StaffMode::Single(_) => line_rows + 2 * LEDGER_ROWS,
            StaffMode::Grand => GRAND_STAFF_OFFSET + line_rows + 2 * LEDGER_ROWS,
        }
    }

    pub fn cols_needed() -> u16 {
        LABEL_WIDTH + MIN_STAFF_WIDTH + 1
    }

    pub fn fits(&self) -> bool {
        self.area.height >= Self::rows_needed(self.mode) && self.area.width >= Self::cols_needed()
    }

    fn first_top_line_row(&self) -> Option<u16> {
        if !self.fits() {
            return None;
        }
        let spare = self.area.height - Self::rows_needed(self.mode);
        Some(self.area.y + spare / 2 + LEDGER_ROWS)
    }

    fn top_line_row(&self, staff: usize) -> Option<u16> {
        let first = self.first_top_line_row()?;
        match (self.mode, staff) {
            (_, 0) => Some(first),
            (StaffMode::Grand, 1) => Some(first + GRAND_STAFF_OFFSET),
            _ => None,
        }
    }

    fn staff_left(&self) -> u16 {
        self.area.x + LABEL_WIDTH
    }

    fn staff_cols(&self) -> u16 {
        self.area.width.saturating_sub(LABEL_WIDTH + 1)
    }

    /// Column where the chord is written.
    pub fn note_column(&self) -> u16 {
        self.staff_left() + self.staff_cols() / 2
    }
}

impl StaffSurface for TerminalStaffSurface {
    fn line_y(&self, staff: usize, line: u8) -> Option<f64> {
        if line >= STAFF_LINE_COUNT {
            return None;
        }
        let top = self.top_line_row(staff)?;
        Some((top + line as u16 * ROWS_PER_SPACING) as f64)
    }

    fn line_spacing(&self, staff: usize) -> Option<f64> {
        self.top_line_row(staff).map(|_| ROWS_PER_SPACING as f64)
    }

    fn staff_x(&self, staff: usize) -> Option<f64> {
        self.top_line_row(staff).map(|_| self.staff_left() as f64)
    }

    fn staff_width(&self, staff: usize) -> Option<f64> {
        self.top_line_row(staff).map(|_| self.staff_cols() as f64)
    }
}

/// How a written note should be coloured.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteMark {
    Selected,
    Correct,
    Missed,
    Incorrect,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StaffNote {
    pub pitch: Pitch,
    pub mark: NoteMark,
}

pub struct StaffWidget<'a> {
    surface: &'a TerminalStaffSurface,
    mapper: &'a PitchPositionMapper,
    notes: Vec<StaffNote>,
    hover: Option<StaffPosition>,
    focus: Option<StaffPosition>,
    theme: &'a Theme,
}

impl<'a> StaffWidget<'a> {
    pub fn new(
        surface: &'a TerminalStaffSurface,
        mapper: &'a PitchPositionMapper,
        theme: &'a Theme,
    ) -> Self {
        Self {
            surface,
            mapper,
            notes: Vec::new(),
            hover: None,
            focus: None,
            theme,
        }
    }

    pub fn notes(mut self, notes: Vec<StaffNote>) -> Self {
        self.notes = notes;
        self
    }

    pub fn hover(mut self, hover: Option<StaffPosition>) -> Self {
        self.hover = hover;
        self
    }

    pub fn focus(mut self, focus: Option<StaffPosition>) -> Self {
        self.focus = focus;
        self
    }

    fn row_of(&self, position: &StaffPosition) -> Option<u16> {
        let (_, y) = self.mapper.position_to_screen(position, 0.0);
        let row = y.round();
        let area = self.surface.area();
        if row < area.y as f64 || row >= area.bottom() as f64 {
            return None;
        }
        Some(row as u16)
    }

    fn draw_ledgers(&self, position: &StaffPosition, col: u16, buf: &mut Buffer) {
        let style = Style::default().fg(self.theme.colors.ledger_line());
        for lp in position.ledger_lines() {
            let ledger = StaffPosition::new(position.clef, lp);
            if let Some(row) = self.row_of(&ledger) {
                buf.set_string(col.saturating_sub(1), row, "───", style);
            }
        }
    }

    fn draw_note(&self, position: &StaffPosition, col: u16, glyph: &str, style: Style, buf: &mut Buffer) {
        let Some(row) = self.row_of(position) else {
            return;
        };
        self.draw_ledgers(position, col, buf);
        if position.pitch.accidental != Accidental::Natural {
            buf.set_string(col.saturating_sub(1), row, position.pitch.accidental.ascii(), style);
        }
        buf.set_string(col, row, glyph, style);
    }
}

impl Widget for StaffWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let surface = self.surface;
        let line_style = Style::default().fg(colors.staff_line());
        let label_style = Style::default().fg(colors.accent_dim());

        for (staff, clef) in surface.mode().clefs().into_iter().enumerate() {
            for line in 0..STAFF_LINE_COUNT {
                let Some(y) = surface.line_y(staff, line) else {
                    continue;
                };
                let row = y as u16;
                if row >= area.bottom() {
                    continue;
                }
                buf.set_string(
                    surface.staff_left(),
                    row,
                    LINE_GLYPH.repeat(surface.staff_cols() as usize),
                    line_style,
                );
                if line == 2 {
                    buf.set_string(area.x + 1, row, clef_label(clef), label_style);
                }
            }
        }

        let center = surface.note_column();

        // Notes sharing a row (same line, different spelling) spread rightward.
        let mut rows: BTreeMap<u16, u16> = BTreeMap::new();
        let mut placed: Vec<(StaffPosition, u16, NoteMark)> = Vec::new();
        let mut notes = self.notes.clone();
        notes.sort_by_key(|n| n.pitch);
        for note in notes {
            let position = self.mapper.position_for_pitch(&note.pitch);
            let Some(row) = self.row_of(&position) else {
                continue;
            };
            let slot = rows.entry(row).or_insert(0);
            let col = center + *slot * SAME_ROW_SPREAD;
            *slot += 1;
            placed.push((position, col, note.mark));
        }

        if let Some(hover) = self.hover
            && !placed.iter().any(|(p, _, _)| p.pitch == hover.pitch)
        {
            let style = Style::default().fg(colors.note_hover());
            self.draw_note(&hover, center, GHOST_GLYPH, style, buf);
        }

        for (position, col, mark) in &placed {
            let color = match mark {
                NoteMark::Selected => colors.note(),
                NoteMark::Correct => colors.note_correct(),
                NoteMark::Missed => colors.note_missed(),
                NoteMark::Incorrect => colors.note_incorrect(),
            };
            let style = Style::default().fg(color).add_modifier(Modifier::BOLD);
            self.draw_note(position, *col, NOTE_GLYPH, style, buf);
        }

        if let Some(focus) = self.focus
            && let Some(row) = self.row_of(&focus)
        {
            let style = Style::default()
                .fg(colors.note_focus_fg())
                .bg(colors.note_focus_bg());
            let marker_col = surface.staff_left().saturating_sub(2);
            buf.set_string(marker_col, row, "▶", Style::default().fg(colors.note_focus_bg()));
            let glyph = if placed.iter().any(|(p, _, _)| p.pitch.diatonic_index() == focus.pitch.diatonic_index()) {
                NOTE_GLYPH
            } else {
                GHOST_GLYPH
            };
            self.draw_ledgers(&focus, center, buf);
            buf.set_string(center, row, glyph, style);
            let name = focus.pitch.to_string();
            let name_col = surface.staff_left() + surface.staff_cols().saturating_sub(name.len() as u16 + 1);
            buf.set_string(name_col, row, name, Style::default().fg(colors.note_focus_bg()));
        }
    }
}

fn clef_label(clef: Clef) -> &'static str {
    match clef {
        Clef::Treble => "G clef",
        Clef::Bass => "F clef",
    }
}
