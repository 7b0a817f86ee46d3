use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::engine::navigator::{KeyboardFocusState, NavigationMode};
use crate::engine::pitch::Accidental;
use crate::session::result::RoundResult;
use crate::session::round::RoundState;
use crate::ui::theme::Theme;

pub struct StatsSidebar<'a> {
    round: &'a RoundState,
    accidental: Accidental,
    focus: KeyboardFocusState,
    last_result: Option<&'a RoundResult>,
    theme: &'a Theme,
}

impl<'a> StatsSidebar<'a> {
    pub fn new(
        round: &'a RoundState,
        accidental: Accidental,
        focus: KeyboardFocusState,
        last_result: Option<&'a RoundResult>,
        theme: &'a Theme,
    ) -> Self {
        Self {
            round,
            accidental,
            focus,
            last_result,
            theme,
        }
    }
}

pub(crate) fn accuracy_color(theme: &Theme, accuracy: u8) -> ratatui::style::Color {
    let colors = &theme.colors;
    if accuracy >= 100 {
        colors.success()
    } else if accuracy >= 50 {
        colors.warning()
    } else {
        colors.error()
    }
}

impl Widget for StatsSidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(12),
                Constraint::Length(if self.last_result.is_some() { 8 } else { 0 }),
            ])
            .split(area);

        {
            let selection = &self.round.selection;
            let capacity = if selection.limit_enabled() {
                format!("{}/{}", selection.len(), selection.max_notes())
            } else {
                format!("{} (no limit)", selection.len())
            };
            let mode = match self.focus.mode {
                NavigationMode::Idle => "pointer",
                NavigationMode::Navigating => "keyboard",
            };
            let accidental = match self.accidental {
                Accidental::Natural => "natural",
                Accidental::Sharp => "sharp (#)",
                Accidental::Flat => "flat (b)",
            };

            let mut lines = vec![
                Line::from(vec![
                    Span::styled("Notes:  ", Style::default().fg(colors.fg())),
                    Span::styled(capacity, Style::default().fg(colors.accent())),
                ]),
                Line::from(vec![
                    Span::styled("Input:  ", Style::default().fg(colors.fg())),
                    Span::styled(mode, Style::default().fg(colors.accent())),
                ]),
                Line::from(vec![
                    Span::styled("Accid.: ", Style::default().fg(colors.fg())),
                    Span::styled(accidental, Style::default().fg(colors.accent())),
                ]),
                Line::from(vec![
                    Span::styled("Replays: ", Style::default().fg(colors.fg())),
                    Span::styled(
                        self.round.replays.to_string(),
                        Style::default().fg(colors.fg()),
                    ),
                ]),
                Line::from(vec![
                    Span::styled("Time: ", Style::default().fg(colors.fg())),
                    Span::styled(
                        format!("{:.1}s", self.round.elapsed_secs()),
                        Style::default().fg(colors.fg()),
                    ),
                ]),
                Line::from(""),
            ];

            if selection.is_empty() {
                lines.push(Line::from(Span::styled(
                    "Nothing placed yet",
                    Style::default().fg(colors.muted()),
                )));
            } else {
                let mut pitches = selection.pitches().to_vec();
                pitches.sort();
                for pitch in pitches.iter().rev() {
                    lines.push(Line::from(Span::styled(
                        format!("  {pitch}"),
                        Style::default().fg(colors.note()).add_modifier(Modifier::BOLD),
                    )));
                }
            }

            let block = Block::bordered()
                .title(" Answer ")
                .border_style(Style::default().fg(colors.border()))
                .style(Style::default().bg(colors.bg()));
            Paragraph::new(lines).block(block).render(sections[0], buf);
        }

        if let Some(last) = self.last_result {
            let verdict = if last.is_correct { "correct" } else { "missed" };
            let lines = vec![
                Line::from(vec![
                    Span::styled("Result: ", Style::default().fg(colors.fg())),
                    Span::styled(
                        verdict,
                        Style::default().fg(if last.is_correct {
                            colors.success()
                        } else {
                            colors.error()
                        }),
                    ),
                ]),
                Line::from(vec![
                    Span::styled("Accuracy: ", Style::default().fg(colors.fg())),
                    Span::styled(
                        format!("{}%", last.accuracy),
                        Style::default().fg(accuracy_color(self.theme, last.accuracy)),
                    ),
                ]),
                Line::from(vec![
                    Span::styled("Target: ", Style::default().fg(colors.fg())),
                    Span::styled(last.target_label(), Style::default().fg(colors.muted())),
                ]),
                Line::from(vec![
                    Span::styled("Score: ", Style::default().fg(colors.fg())),
                    Span::styled(format!("{:.0}", last.score), Style::default().fg(colors.accent())),
                ]),
            ];

            let block = Block::bordered()
                .title(" Last Round ")
                .border_style(Style::default().fg(colors.border()))
                .style(Style::default().bg(colors.bg()));
            Paragraph::new(lines).block(block).render(sections[1], buf);
        }
    }
}
