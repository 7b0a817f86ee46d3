use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    StartRound,
    Statistics,
    Settings,
}

impl MenuAction {
    pub const ALL: [MenuAction; 3] = [
        MenuAction::StartRound,
        MenuAction::Statistics,
        MenuAction::Settings,
    ];

    pub fn hotkey(self) -> char {
        match self {
            MenuAction::StartRound => '1',
            MenuAction::Statistics => 's',
            MenuAction::Settings => 'c',
        }
    }

    pub fn from_hotkey(ch: char) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.hotkey() == ch)
    }

    fn label(self) -> &'static str {
        match self {
            MenuAction::StartRound => "Start Round",
            MenuAction::Statistics => "Statistics",
            MenuAction::Settings => "Settings",
        }
    }

    fn description(self) -> &'static str {
        match self {
            MenuAction::StartRound => "Listen, then write what you heard on the staff",
            MenuAction::Statistics => "Rounds played, accuracy and recent history",
            MenuAction::Settings => "Clef, note counts, accidentals and theme",
        }
    }
}

pub struct Menu<'a> {
    pub selected: usize,
    pub theme: &'a Theme,
    /// One-line description of the round the Start item would begin.
    pub round_summary: String,
}

impl<'a> Menu<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self {
            selected: 0,
            theme,
            round_summary: String::new(),
        }
    }

    pub fn selected_action(&self) -> MenuAction {
        MenuAction::ALL[self.selected % MenuAction::ALL.len()]
    }

    pub fn next(&mut self) {
        self.selected = (self.selected + 1) % MenuAction::ALL.len();
    }

    pub fn prev(&mut self) {
        self.selected = self
            .selected
            .checked_sub(1)
            .unwrap_or(MenuAction::ALL.len() - 1);
    }
}

/// Staff-line rule framing the tagline.
fn staff_ornament(width: u16) -> String {
    "─".repeat(width.min(32) as usize)
}

impl Widget for &Menu<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(6),
                Constraint::Length(2),
                Constraint::Min(0),
            ])
            .split(inner);

        let rule = Span::styled(
            staff_ornament(inner.width),
            Style::default().fg(colors.staff_line()),
        );
        let header = vec![
            Line::from(""),
            Line::from(Span::styled(
                "earstaff",
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(rule.clone()),
            Line::from(Span::styled(
                "hear it, then write it",
                Style::default().fg(colors.fg()),
            )),
            Line::from(rule),
        ];
        Paragraph::new(header)
            .alignment(Alignment::Center)
            .render(layout[0], buf);

        if !self.round_summary.is_empty() {
            Paragraph::new(Line::from(Span::styled(
                self.round_summary.as_str(),
                Style::default().fg(colors.muted()),
            )))
            .alignment(Alignment::Center)
            .render(layout[1], buf);
        }

        let mut lines = Vec::new();
        for (i, action) in MenuAction::ALL.iter().enumerate() {
            let style = if i == self.selected {
                Style::default()
                    .fg(colors.note_focus_fg())
                    .bg(colors.note_focus_bg())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(colors.fg())
            };
            lines.push(Line::from(Span::styled(
                format!(" [{}] {} ", action.hotkey(), action.label()),
                style,
            )));
            lines.push(Line::from(Span::styled(
                format!("     {}", action.description()),
                Style::default().fg(colors.muted()),
            )));
            lines.push(Line::from(""));
        }
        Paragraph::new(lines).render(layout[2], buf);
    }
}
