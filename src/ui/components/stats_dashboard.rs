use std::collections::HashMap;

use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Widget};

use crate::engine::pitch::Pitch;
use crate::engine::scoring::{level_from_score, score_to_next_level};
use crate::session::result::RoundResult;
use crate::store::schema::ProfileData;
use crate::ui::theme::Theme;

pub const TAB_COUNT: usize = 2;

pub struct StatsDashboard<'a> {
    pub history: &'a [RoundResult],
    pub profile: &'a ProfileData,
    pub active_tab: usize,
    pub theme: &'a Theme,
    pub history_selected: usize,
    pub history_confirm_delete: bool,
}

impl<'a> StatsDashboard<'a> {
    pub fn new(
        history: &'a [RoundResult],
        profile: &'a ProfileData,
        active_tab: usize,
        theme: &'a Theme,
        history_selected: usize,
        history_confirm_delete: bool,
    ) -> Self {
        Self {
            history,
            profile,
            active_tab,
            theme,
            history_selected,
            history_confirm_delete,
        }
    }
}

impl Widget for StatsDashboard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Statistics ")
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        if self.history.is_empty() {
            let msg = Paragraph::new(Line::from(Span::styled(
                "No rounds played yet. Press [1] on the menu to start!",
                Style::default().fg(colors.muted()),
            )));
            msg.render(inner, buf);
            return;
        }

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(10),
                Constraint::Length(2),
            ])
            .split(inner);

        let tabs = ["[1] Dashboard", "[2] History"];
        let tab_spans: Vec<Span> = tabs
            .iter()
            .enumerate()
            .flat_map(|(i, &label)| {
                let style = if i == self.active_tab {
                    Style::default()
                        .fg(colors.accent())
                        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
                } else {
                    Style::default().fg(colors.muted())
                };
                vec![Span::styled(format!(" {label} "), style), Span::raw("  ")]
            })
            .collect();
        Paragraph::new(Line::from(tab_spans)).render(layout[0], buf);

        match self.active_tab {
            0 => self.render_dashboard_tab(layout[1], buf),
            _ => self.render_history_tab(layout[1], buf),
        }

        let footer_text = if self.active_tab == 1 {
            "  [ESC] Back  [Tab] Next tab  [1-2] Switch tab  [j/k] Navigate  [x] Delete"
        } else {
            "  [ESC] Back  [Tab] Next tab  [1-2] Switch tab"
        };
        Paragraph::new(Line::from(Span::styled(
            footer_text,
            Style::default().fg(colors.accent()),
        )))
        .render(layout[2], buf);

        if self.history_confirm_delete && self.active_tab == 1 {
            let dialog_width = 34u16;
            let dialog_height = 5u16;
            let dialog_x = area.x + area.width.saturating_sub(dialog_width) / 2;
            let dialog_y = area.y + area.height.saturating_sub(dialog_height) / 2;
            let dialog_area = Rect::new(dialog_x, dialog_y, dialog_width, dialog_height);

            let idx = self.history.len().saturating_sub(self.history_selected);
            let dialog_text = format!("Delete round #{idx}? (y/n)");

            Clear.render(dialog_area, buf);
            let dialog = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    format!("  {dialog_text}  "),
                    Style::default().fg(colors.fg()),
                )),
            ])
            .style(Style::default().bg(colors.bg()))
            .block(
                Block::bordered()
                    .title(" Confirm ")
                    .border_style(Style::default().fg(colors.error()))
                    .style(Style::default().bg(colors.bg())),
            );
            dialog.render(dialog_area, buf);
        }
    }
}

impl StatsDashboard<'_> {
    fn render_dashboard_tab(&self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Length(3),
                Constraint::Min(8),
            ])
            .split(area);

        let avg_accuracy = average_accuracy(self.history);
        let total_time: f64 = self.history.iter().map(|r| r.elapsed_secs).sum();
        let profile = self.profile;

        let summary_block = Block::bordered()
            .title(Line::from(Span::styled(
                " Summary ",
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )))
            .border_style(Style::default().fg(colors.accent()));
        let summary_inner = summary_block.inner(layout[0]);
        summary_block.render(layout[0], buf);

        let summary = vec![
            Line::from(vec![
                Span::styled("  Rounds: ", Style::default().fg(colors.fg())),
                Span::styled(
                    profile.total_rounds.to_string(),
                    Style::default()
                        .fg(colors.accent())
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled("    Correct: ", Style::default().fg(colors.fg())),
                Span::styled(
                    format!("{} ({:.0}%)", profile.correct_rounds, profile.success_rate()),
                    Style::default().fg(colors.success()),
                ),
                Span::styled("    Best run: ", Style::default().fg(colors.fg())),
                Span::styled(
                    profile.best_run.to_string(),
                    Style::default()
                        .fg(colors.success())
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(vec![
                Span::styled("  Day streak: ", Style::default().fg(colors.fg())),
                Span::styled(
                    format!("{} (best {})", profile.streak_days, profile.best_streak),
                    Style::default().fg(colors.accent()),
                ),
                Span::styled("    Total time: ", Style::default().fg(colors.fg())),
                Span::styled(format_duration(total_time), Style::default().fg(colors.muted())),
            ]),
            Line::from(vec![
                Span::styled("  Score: ", Style::default().fg(colors.fg())),
                Span::styled(
                    format!("{:.0}", profile.total_score),
                    Style::default().fg(colors.accent()),
                ),
                Span::styled("    Level: ", Style::default().fg(colors.fg())),
                Span::styled(
                    level_from_score(profile.total_score).to_string(),
                    Style::default()
                        .fg(colors.accent())
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("  ({:.0} to next)", score_to_next_level(profile.total_score)),
                    Style::default().fg(colors.muted()),
                ),
            ]),
        ];
        Paragraph::new(summary).render(summary_inner, buf);

        let bars = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(layout[1]);
        let acc_label = format!("  Avg accuracy: {avg_accuracy:.1}%");
        render_text_bar(
            &acc_label,
            avg_accuracy / 100.0,
            if avg_accuracy >= 90.0 {
                colors.success()
            } else if avg_accuracy >= 60.0 {
                colors.warning()
            } else {
                colors.error()
            },
            colors.bar_empty(),
            bars[0],
            buf,
        );
        let rate = profile.success_rate();
        let rate_label = format!("  Fully correct: {rate:.0}%");
        render_text_bar(
            &rate_label,
            rate / 100.0,
            colors.bar_filled(),
            colors.bar_empty(),
            bars[1],
            buf,
        );

        let lower = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(layout[2]);
        self.render_accuracy_chart(lower[0], buf);
        self.render_most_missed(lower[1], buf);
    }

    fn render_accuracy_chart(&self, area: Rect, buf: &mut Buffer) {
        use ratatui::symbols;
        use ratatui::widgets::{Axis, Chart, Dataset, GraphType};

        let colors = &self.theme.colors;

        let data: Vec<(f64, f64)> = self
            .history
            .iter()
            .rev()
            .take(50)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .enumerate()
            .map(|(i, r)| (i as f64, r.accuracy as f64))
            .collect();

        let max_x = data.last().map(|(x, _)| *x).unwrap_or(1.0).max(1.0);
        let label_style = Style::default().fg(colors.muted()).bg(colors.bg());

        let dataset = Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(colors.success()).bg(colors.bg()))
            .data(&data);

        let chart = Chart::new(vec![dataset])
            .style(Style::default().fg(colors.fg()).bg(colors.bg()))
            .block(
                Block::bordered()
                    .title(Line::from(Span::styled(
                        " Accuracy % (Last 50 Rounds) ",
                        Style::default()
                            .fg(colors.accent())
                            .add_modifier(Modifier::BOLD),
                    )))
                    .border_style(Style::default().fg(colors.accent()))
                    .style(Style::default().bg(colors.bg())),
            )
            .x_axis(
                Axis::default()
                    .title("Round #")
                    .style(label_style)
                    .bounds([0.0, max_x]),
            )
            .y_axis(
                Axis::default()
                    .title("Accuracy %")
                    .style(label_style)
                    .labels(vec![
                        Span::styled("0", label_style),
                        Span::styled("50", label_style),
                        Span::styled("100", label_style),
                    ])
                    .bounds([0.0, 100.0]),
            );

        chart.render(area, buf);
    }

    fn render_most_missed(&self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(Line::from(Span::styled(
                " Most Missed ",
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )))
            .border_style(Style::default().fg(colors.accent()));
        let inner = block.inner(area);
        block.render(area, buf);

        let misses = miss_rates(self.history);
        if misses.is_empty() {
            Paragraph::new(Line::from(Span::styled(
                "  Nothing missed yet",
                Style::default().fg(colors.muted()),
            )))
            .render(inner, buf);
            return;
        }

        let lines: Vec<Line> = misses
            .iter()
            .take(inner.height as usize)
            .map(|(pitch, missed, heard)| {
                Line::from(vec![
                    Span::styled(format!("  {:<5}", pitch.to_string()), Style::default().fg(colors.note())),
                    Span::styled(
                        format!("{missed}/{heard} missed"),
                        Style::default().fg(colors.note_missed()),
                    ),
                ])
            })
            .collect();
        Paragraph::new(lines).render(inner, buf);
    }

    fn render_history_tab(&self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let table_block = Block::bordered()
            .title(Line::from(Span::styled(
                " Recent Rounds ",
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )))
            .border_style(Style::default().fg(colors.accent()));
        let table_inner = table_block.inner(area);
        table_block.render(area, buf);

        let header = Line::from(vec![Span::styled(
            "    #   Acc%   Score    Time      Date      Clef    Target / Answer",
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD),
        )]);

        let mut lines = vec![
            header,
            Line::from(Span::styled(
                "  ──────────────────────────────────────────────────────────────────",
                Style::default().fg(colors.border()),
            )),
        ];

        let visible = table_inner.height.saturating_sub(2) as usize;
        let recent: Vec<&RoundResult> = self.history.iter().rev().take(visible.max(1)).collect();
        let total = self.history.len();

        for (i, result) in recent.iter().enumerate() {
            let idx = total - i;
            let marker = if result.is_correct { "+" } else { " " };
            let row = format!(
                " {marker}{idx:>3}  {acc:>4}%  {score:>6.0}  {time:>6}  {date}  {clef:<6}  {target} / {answer}",
                acc = result.accuracy,
                score = result.score,
                time = format!("{:.1}s", result.elapsed_secs),
                date = result.timestamp.format("%m/%d %H:%M"),
                clef = result.clef_mode.as_str(),
                target = result.target_label(),
                answer = result.selected_label(),
            );

            let acc_color = if result.is_correct {
                colors.success()
            } else if result.accuracy >= 50 {
                colors.warning()
            } else {
                colors.error()
            };

            let style = if i == self.history_selected {
                Style::default().fg(acc_color).bg(colors.accent_dim())
            } else {
                Style::default().fg(acc_color)
            };
            lines.push(Line::from(Span::styled(row, style)));
        }

        Paragraph::new(lines).render(table_inner, buf);
    }
}

fn average_accuracy(history: &[RoundResult]) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    history.iter().map(|r| r.accuracy as f64).sum::<f64>() / history.len() as f64
}

/// `(pitch, times missed, times sounded)` for every pitch missed at least
/// once, worst first.
fn miss_rates(history: &[RoundResult]) -> Vec<(Pitch, u32, u32)> {
    let mut counts: HashMap<Pitch, (u32, u32)> = HashMap::new();
    for round in history {
        for pitch in &round.target {
            let entry = counts.entry(*pitch).or_default();
            entry.1 += 1;
            if !round.selected.contains(pitch) {
                entry.0 += 1;
            }
        }
    }
    let mut rates: Vec<(Pitch, u32, u32)> = counts
        .into_iter()
        .filter(|(_, (missed, _))| *missed > 0)
        .map(|(pitch, (missed, heard))| (pitch, missed, heard))
        .collect();
    rates.sort_by(|a, b| {
        let ra = a.1 as f64 / a.2 as f64;
        let rb = b.1 as f64 / b.2 as f64;
        rb.total_cmp(&ra).then(b.1.cmp(&a.1)).then(a.0.cmp(&b.0))
    });
    rates
}

fn render_text_bar(
    label: &str,
    ratio: f64,
    fill_color: ratatui::style::Color,
    empty_color: ratatui::style::Color,
    area: Rect,
    buf: &mut Buffer,
) {
    if area.height < 2 || area.width < 10 {
        return;
    }

    buf.set_string(area.x, area.y, label, Style::default().fg(fill_color));

    let bar_width = (area.width as usize).saturating_sub(4);
    let filled = (ratio.clamp(0.0, 1.0) * bar_width as f64) as usize;

    let bar_y = area.y + 1;
    for i in 0..bar_width {
        let x = area.x + 2 + i as u16;
        if x >= area.x + area.width {
            break;
        }
        let (ch, color) = if i < filled {
            ('█', fill_color)
        } else {
            ('░', empty_color)
        };
        buf.set_string(x, bar_y, ch.to_string(), Style::default().fg(color));
    }
}

fn format_duration(secs: f64) -> String {
    let total = secs as u64;
    let hours = total / 3600;
    let mins = (total % 3600) / 60;
    let s = total % 60;
    if hours > 0 {
        format!("{hours}h {mins}m {s}s")
    } else if mins > 0 {
        format!("{mins}m {s}s")
    } else {
        format!("{s}s")
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::config::ClefMode;
    use crate::engine::pitch::NoteLetter;

    fn round(target: Vec<Pitch>, selected: Vec<Pitch>) -> RoundResult {
        RoundResult {
            target,
            selected,
            accuracy: 0,
            is_correct: false,
            correct_count: 0,
            missed_count: 0,
            incorrect_count: 0,
            score: 0.0,
            elapsed_secs: 1.0,
            replays: 0,
            clef_mode: ClefMode::Treble,
            limit_enabled: true,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(42.0), "42s");
        assert_eq!(format_duration(125.0), "2m 5s");
        assert_eq!(format_duration(3725.0), "1h 2m 5s");
    }

    #[test]
    fn test_miss_rates_worst_first() {
        let c4 = Pitch::natural(NoteLetter::C, 4);
        let e4 = Pitch::natural(NoteLetter::E, 4);
        let g4 = Pitch::natural(NoteLetter::G, 4);
        let history = vec![
            round(vec![c4, e4], vec![c4]),
            round(vec![c4, g4], vec![g4]),
            round(vec![e4], vec![]),
        ];
        let rates = miss_rates(&history);
        assert_eq!(rates, vec![(e4, 2, 2), (c4, 1, 2)]);
    }

    #[test]
    fn test_average_accuracy_empty() {
        assert_eq!(average_accuracy(&[]), 0.0);
    }
}
