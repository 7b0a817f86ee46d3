use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::engine::validator::ValidationResult;
use crate::session::result::{RoundResult, join_pitches};
use crate::ui::components::stats_sidebar::accuracy_color;
use crate::ui::theme::Theme;

/// Result panel shown next to the marked-up staff after a submit.
pub struct Dashboard<'a> {
    pub result: &'a RoundResult,
    pub validation: &'a ValidationResult,
    pub theme: &'a Theme,
}

impl<'a> Dashboard<'a> {
    pub fn new(result: &'a RoundResult, validation: &'a ValidationResult, theme: &'a Theme) -> Self {
        Self {
            result,
            validation,
            theme,
        }
    }
}

fn set_line<'a>(label: &'a str, pitches: String, color: ratatui::style::Color, fg: ratatui::style::Color) -> Line<'a> {
    Line::from(vec![
        Span::styled(label, Style::default().fg(fg)),
        Span::styled(pitches, Style::default().fg(color).add_modifier(Modifier::BOLD)),
    ])
}

impl Widget for Dashboard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Round Complete ")
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(2),
            ])
            .split(inner);

        let (verdict, verdict_color) = if self.result.is_correct {
            ("Correct!", colors.success())
        } else {
            ("Not quite", colors.error())
        };
        let title = Paragraph::new(Line::from(Span::styled(
            verdict,
            Style::default().fg(verdict_color).add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center);
        title.render(layout[0], buf);

        let acc_text = format!("{}%", self.result.accuracy);
        let acc_detail = format!(
            "  ({}/{} found)",
            self.result.correct_count,
            self.result.correct_count + self.result.missed_count
        );
        let acc_line = Line::from(vec![
            Span::styled("  Accuracy: ", Style::default().fg(colors.fg())),
            Span::styled(
                &*acc_text,
                Style::default()
                    .fg(accuracy_color(self.theme, self.result.accuracy))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(&*acc_detail, Style::default().fg(colors.muted())),
        ]);
        Paragraph::new(acc_line).render(layout[1], buf);

        let found: Vec<_> = self.validation.correctly_identified.iter().copied().collect();
        let missed: Vec<_> = self.validation.missed.iter().copied().collect();
        let incorrect: Vec<_> = self.validation.incorrect.iter().copied().collect();
        let sets = vec![
            set_line("  Found:     ", join_pitches(&found), colors.note_correct(), colors.fg()),
            set_line("  Missed:    ", join_pitches(&missed), colors.note_missed(), colors.fg()),
            set_line("  Incorrect: ", join_pitches(&incorrect), colors.note_incorrect(), colors.fg()),
        ];
        Paragraph::new(sets).render(layout[2], buf);

        let details = vec![
            Line::from(vec![
                Span::styled("  Score:  ", Style::default().fg(colors.fg())),
                Span::styled(
                    format!("+{:.0}", self.result.score),
                    Style::default().fg(colors.accent()).add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(vec![
                Span::styled("  Time:   ", Style::default().fg(colors.fg())),
                Span::styled(
                    format!("{:.1}s  ({} replays)", self.result.elapsed_secs, self.result.replays),
                    Style::default().fg(colors.fg()),
                ),
            ]),
        ];
        Paragraph::new(details).render(layout[3], buf);

        let help = Paragraph::new(Line::from(vec![
            Span::styled("  [c/Enter] Next  ", Style::default().fg(colors.accent())),
            Span::styled("[r] Retry  ", Style::default().fg(colors.accent())),
            Span::styled("[p] Hear target  ", Style::default().fg(colors.accent())),
            Span::styled("[q] Menu", Style::default().fg(colors.accent())),
        ]));
        help.render(layout[5], buf);
    }
}
