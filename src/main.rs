mod app;
mod config;
mod engine;
mod event;
mod session;
mod store;
mod ui;

use std::fs;
use std::io;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::event::{
    DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, KeyCode,
    KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use log::info;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use app::{App, AppScreen, SETTINGS_COUNT};
use config::ClefMode;
use engine::mapper::{PitchPositionMapper, StaffLayout};
use engine::pitch::Accidental;
use engine::scoring::level_from_score;
use event::{AppEvent, EventHandler};
use ui::components::dashboard::Dashboard;
use ui::components::menu::MenuAction;
use ui::components::progress_bar::ProgressBar;
use ui::components::staff::{NoteMark, StaffNote, StaffWidget, TerminalStaffSurface};
use ui::components::stats_dashboard::{StatsDashboard, TAB_COUNT};
use ui::components::stats_sidebar::StatsSidebar;
use ui::layout::{RoundLayout, SIDEBAR_MIN_WIDTH, pack_hint_lines};

#[derive(Parser)]
#[command(name = "earstaff", version, about = "Terminal ear trainer: hear notes, write them on the staff")]
struct Cli {
    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(short, long, value_enum, help = "Staff to write on")]
    clef: Option<ClefMode>,

    #[arg(long, help = "Fewest notes per round")]
    min_notes: Option<usize>,

    #[arg(long, help = "Most notes per round")]
    max_notes: Option<usize>,

    #[arg(long, help = "Allow placing more notes than were played")]
    no_limit: bool,
}

fn init_logging() {
    let Some(dir) = dirs::data_dir().map(|d| d.join("earstaff")) else {
        return;
    };
    if fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("earstaff.log"))
    else {
        return;
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let mut app = App::new();

    if let Some(clef) = cli.clef {
        app.config.clef_mode = clef;
    }
    if let Some(min) = cli.min_notes {
        app.config.min_notes = min;
    }
    if let Some(max) = cli.max_notes {
        app.config.max_notes = max;
    }
    if cli.no_limit {
        app.config.limit_enabled = false;
    }
    app.config.normalize();
    app.refresh_menu_summary();
    if let Some(theme_name) = cli.theme
        && let Some(theme) = ui::theme::Theme::load(&theme_name)
    {
        app.set_theme(theme);
        app.config.theme = theme_name;
    }
    info!("starting with {:?}", app.config);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange
    )?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(Duration::from_millis(100));

    let result = run_app(&mut terminal, &mut app, &events);

    if let Some(controller) = app.controller.take() {
        controller.dispose();
    }
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableFocusChange
    )?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        let size = terminal.size()?;
        app.sync_staff(Rect::new(0, 0, size.width, size.height));
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
            AppEvent::FocusLost => app.pointer_left(),
            AppEvent::Tick | AppEvent::Resize => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match app.screen {
        AppScreen::Menu => handle_menu_key(app, key),
        AppScreen::Round => handle_round_key(app, key),
        AppScreen::RoundResult => handle_result_key(app, key),
        AppScreen::StatsDashboard => handle_stats_key(app, key),
        AppScreen::Settings => handle_settings_key(app, key),
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.screen != AppScreen::Round {
        return;
    }
    match mouse.kind {
        MouseEventKind::Moved | MouseEventKind::Drag(MouseButton::Left) => {
            app.pointer_moved(mouse.column, mouse.row)
        }
        MouseEventKind::Down(MouseButton::Left) => app.pointer_clicked(mouse.column, mouse.row),
        _ => {}
    }
}

fn handle_menu_key(app: &mut App, key: KeyEvent) {
    let action = match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            app.should_quit = true;
            return;
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.menu.prev();
            return;
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.menu.next();
            return;
        }
        KeyCode::Enter => app.menu.selected_action(),
        KeyCode::Char(ch) => match MenuAction::from_hotkey(ch) {
            Some(action) => action,
            None => return,
        },
        _ => return,
    };
    match action {
        MenuAction::StartRound => app.start_round(),
        MenuAction::Statistics => app.go_to_stats(),
        MenuAction::Settings => app.go_to_settings(),
    }
}

fn handle_round_key(app: &mut App, key: KeyEvent) {
    // The staff gets first refusal; letters, arrows, Tab, Enter and Delete are its.
    if app.staff_key(key) {
        return;
    }
    match key.code {
        KeyCode::Char('s') | KeyCode::F(5) => app.submit_round(),
        KeyCode::Char('r') => app.replay_target(),
        KeyCode::Char('p') => app.play_selection(),
        KeyCode::Char('+') | KeyCode::Char('#') => app.apply_accidental(Accidental::Sharp),
        KeyCode::Char('-') => app.apply_accidental(Accidental::Flat),
        KeyCode::Char('=') | KeyCode::Char('n') => app.apply_accidental(Accidental::Natural),
        KeyCode::Char('x') => app.clear_selection(),
        KeyCode::Char('q') | KeyCode::Esc => app.go_to_menu(),
        _ => {}
    }
}

fn handle_result_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('c') | KeyCode::Enter | KeyCode::Char(' ') => app.start_round(),
        KeyCode::Char('r') => app.retry_round(),
        KeyCode::Char('p') => {
            if let (Some(controller), Some(round)) = (app.controller.as_mut(), app.round.as_ref()) {
                controller.play_target(&round.target);
            }
        }
        KeyCode::Char('q') | KeyCode::Esc => app.go_to_menu(),
        KeyCode::Char('s') => {
            app.go_to_menu();
            app.go_to_stats();
        }
        _ => {}
    }
}

fn handle_stats_key(app: &mut App, key: KeyEvent) {
    if app.history_confirm_delete {
        match key.code {
            KeyCode::Char('y') => {
                app.delete_round();
                app.history_confirm_delete = false;
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                app.history_confirm_delete = false;
            }
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.go_to_menu(),
        KeyCode::Char('d') | KeyCode::Char('1') => app.stats_tab = 0,
        KeyCode::Char('h') | KeyCode::Char('2') => app.stats_tab = 1,
        KeyCode::Tab => app.stats_tab = (app.stats_tab + 1) % TAB_COUNT,
        KeyCode::BackTab => {
            app.stats_tab = if app.stats_tab == 0 {
                TAB_COUNT - 1
            } else {
                app.stats_tab - 1
            }
        }
        KeyCode::Char('j') | KeyCode::Down if app.stats_tab == 1 => {
            if !app.history.is_empty() {
                app.history_selected = (app.history_selected + 1).min(app.history.len() - 1);
            }
        }
        KeyCode::Char('k') | KeyCode::Up if app.stats_tab == 1 => {
            app.history_selected = app.history_selected.saturating_sub(1);
        }
        KeyCode::Char('x') | KeyCode::Delete if app.stats_tab == 1 => {
            if !app.history.is_empty() {
                app.history_confirm_delete = true;
            }
        }
        _ => {}
    }
}

fn handle_settings_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => {
            app.save_settings();
            app.go_to_menu();
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.settings_selected = app.settings_selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if app.settings_selected + 1 < SETTINGS_COUNT {
                app.settings_selected += 1;
            }
        }
        KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => app.settings_cycle_forward(),
        KeyCode::Left | KeyCode::Char('h') => app.settings_cycle_backward(),
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    match app.screen {
        AppScreen::Menu => render_menu(frame, app),
        AppScreen::Round => render_round(frame, app),
        AppScreen::RoundResult => render_result(frame, app),
        AppScreen::StatsDashboard => render_stats(frame, app),
        AppScreen::Settings => render_settings(frame, app),
    }
}

fn render_header(frame: &mut ratatui::Frame, app: &App, title: &str, info: &str, area: Rect) {
    let colors = &app.theme.colors;
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {title} "),
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            info.to_string(),
            Style::default().fg(colors.muted()).bg(colors.header_bg()),
        ),
    ]))
    .style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, area);
}

fn render_footer(frame: &mut ratatui::Frame, app: &App, hints: &[&str], area: Rect) {
    let colors = &app.theme.colors;
    let lines: Vec<Line> = pack_hint_lines(hints, area.width as usize)
        .into_iter()
        .map(|l| Line::from(Span::styled(l, Style::default().fg(colors.muted()))))
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_menu(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let streak_text = if app.profile.streak_days > 0 {
        format!(" | {} day streak", app.profile.streak_days)
    } else {
        String::new()
    };
    let header_info = format!(
        " Level {} | Score {:.0} | {} rounds{}",
        level_from_score(app.profile.total_score),
        app.profile.total_score,
        app.profile.total_rounds,
        streak_text,
    );
    render_header(frame, app, "earstaff", &header_info, layout[0]);

    let menu_area = ui::layout::centered_rect(50, 60, layout[1]);
    frame.render_widget(&app.menu, menu_area);

    render_footer(frame, app, &["[1] Start", "[s] Stats", "[c] Settings", "[q] Quit"], layout[2]);
}

fn render_too_small(frame: &mut ratatui::Frame, app: &App, surface: &TerminalStaffSurface, area: Rect) {
    let colors = &app.theme.colors;
    let needed = TerminalStaffSurface::rows_needed(surface.mode());
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Terminal too small for the staff",
            Style::default().fg(colors.warning()).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!(
                "Need {} x {} cells here, have {} x {}. Note entry is paused.",
                TerminalStaffSurface::cols_needed(),
                needed,
                area.width,
                area.height
            ),
            Style::default().fg(colors.muted()),
        )),
        Line::from(Span::styled(
            "[s] still submits, [q] returns to the menu.",
            Style::default().fg(colors.muted()),
        )),
    ];
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn render_round(frame: &mut ratatui::Frame, app: &App) {
    let Some(round) = app.round.as_ref() else {
        return;
    };
    let area = frame.area();
    let colors = &app.theme.colors;
    let layout = RoundLayout::new(area);

    let header_info = format!(
        " {} staff | {} notes played | replays {}",
        app.config.clef_mode.as_str(),
        round.target.len(),
        round.replays
    );
    render_header(frame, app, "Round", &header_info, layout.header);

    let staff_block = Block::bordered()
        .title(" Staff ")
        .border_style(Style::default().fg(if app.staff_navigating() {
            colors.border_focused()
        } else {
            colors.border()
        }))
        .style(Style::default().bg(colors.bg()));
    frame.render_widget(staff_block, layout.staff_block);

    let surface = TerminalStaffSurface::new(layout.staff, app.staff_mode());
    match app.controller.as_ref() {
        Some(controller) => {
            let notes = round
                .selection
                .pitches()
                .iter()
                .map(|&pitch| StaffNote {
                    pitch,
                    mark: NoteMark::Selected,
                })
                .collect();
            let widget = StaffWidget::new(&surface, controller.mapper(), app.theme)
                .notes(notes)
                .hover(controller.hover())
                .focus(controller.navigator().focused_position());
            frame.render_widget(widget, layout.staff);
        }
        None => render_too_small(frame, app, &surface, layout.staff),
    }

    let selection = &round.selection;
    let (ratio, caption) = if selection.limit_enabled() && selection.max_notes() > 0 {
        (
            selection.len() as f64 / selection.max_notes() as f64,
            format!("{}/{} placed", selection.len(), selection.max_notes()),
        )
    } else {
        (0.0, format!("{} placed", selection.len()))
    };
    frame.render_widget(
        ProgressBar::new("Notes", ratio, app.theme).caption(caption),
        layout.capacity,
    );

    if let Some(sidebar) = layout.sidebar {
        let accidental = app
            .controller
            .as_ref()
            .map(|c| c.accidental())
            .unwrap_or(Accidental::Natural);
        let focus = app
            .controller
            .as_ref()
            .map(|c| c.focus_state())
            .unwrap_or_default();
        frame.render_widget(
            StatsSidebar::new(round, accidental, focus, app.last_result.as_ref(), app.theme),
            sidebar,
        );
    }

    let footer_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(layout.footer);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            format!(" {}", app.feedback.message),
            Style::default().fg(colors.accent()),
        ))),
        footer_layout[0],
    );
    let hints: &[&str] = if app.staff_navigating() {
        &[
            "[Up/Down] Move",
            "[Tab] Next",
            "[a-g] Jump",
            "[Enter] Toggle",
            "[Del] Remove",
            "[Esc] Pointer mode",
        ]
    } else {
        &[
            "[click] Toggle",
            "[Tab] Keyboard",
            "[+/-/=] Sharp/Flat/Natural",
            "[r] Replay",
            "[p] Play answer",
            "[s] Submit",
            "[x] Clear",
            "[q] Menu",
        ]
    };
    render_footer(frame, app, hints, footer_layout[1]);
}

fn render_result(frame: &mut ratatui::Frame, app: &App) {
    let (Some(result), Some(validation)) = (app.last_result.as_ref(), app.last_validation.as_ref())
    else {
        return;
    };
    let area = frame.area();
    let colors = &app.theme.colors;

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(10)])
        .split(area);
    let header_info = format!(
        " Level {} | Score {:.0} | run {}",
        level_from_score(app.profile.total_score),
        app.profile.total_score,
        app.profile.current_run
    );
    render_header(frame, app, "Result", &header_info, vertical[0]);

    let (staff_area, panel_area) = if vertical[1].width >= SIDEBAR_MIN_WIDTH {
        let split = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(40), Constraint::Length(50)])
            .split(vertical[1]);
        (split[0], split[1])
    } else {
        let split = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(10), Constraint::Length(16)])
            .split(vertical[1]);
        (split[0], split[1])
    };

    let block = Block::bordered()
        .title(" Answer vs Target ")
        .border_style(Style::default().fg(colors.border()))
        .style(Style::default().bg(colors.bg()));
    let inner = block.inner(staff_area);
    frame.render_widget(block, staff_area);

    let mode = result.clef_mode.staff_mode();
    let surface = TerminalStaffSurface::new(inner, mode);
    match StaffLayout::capture(&surface, mode) {
        Ok(layout) => {
            let mapper = PitchPositionMapper::new(layout);
            let marks = [
                (&validation.correctly_identified, NoteMark::Correct),
                (&validation.missed, NoteMark::Missed),
                (&validation.incorrect, NoteMark::Incorrect),
            ];
            let notes = marks
                .iter()
                .flat_map(|&(set, mark)| set.iter().map(move |&pitch| StaffNote { pitch, mark }))
                .collect();
            frame.render_widget(
                StaffWidget::new(&surface, &mapper, app.theme).notes(notes),
                inner,
            );
        }
        Err(_) => render_too_small(frame, app, &surface, inner),
    }

    frame.render_widget(Dashboard::new(result, validation, app.theme), panel_area);
}

fn render_stats(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let dashboard = StatsDashboard::new(
        &app.history,
        &app.profile,
        app.stats_tab,
        app.theme,
        app.history_selected,
        app.history_confirm_delete,
    );
    frame.render_widget(dashboard, area);
}

fn render_settings(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let centered = ui::layout::centered_rect(60, 80, area);

    let block = Block::bordered()
        .title(" Settings ")
        .border_style(Style::default().fg(colors.accent()))
        .style(Style::default().bg(colors.bg()));
    let inner = block.inner(centered);
    block.render(centered, frame.buffer_mut());

    let fields = app.settings_fields();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(fields.len() as u16 * 2),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .split(inner);

    let header = Paragraph::new(Line::from(Span::styled(
        "  Use arrows to navigate, Enter/Right to change, ESC to save & exit",
        Style::default().fg(colors.muted()),
    )));
    header.render(layout[0], frame.buffer_mut());

    let field_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(fields.iter().map(|_| Constraint::Length(2)).collect::<Vec<_>>())
        .split(layout[1]);

    for (i, (label, value)) in fields.iter().enumerate() {
        let is_selected = i == app.settings_selected;
        let indicator = if is_selected { " > " } else { "   " };

        let label_style = Style::default()
            .fg(if is_selected { colors.accent() } else { colors.fg() })
            .add_modifier(if is_selected {
                Modifier::BOLD
            } else {
                Modifier::empty()
            });
        let value_style = Style::default().fg(if is_selected {
            colors.note_focus_bg()
        } else {
            colors.muted()
        });

        let line = Line::from(vec![
            Span::styled(format!("{indicator}{label:<14}"), label_style),
            Span::styled(format!("< {value} >"), value_style),
        ]);
        Paragraph::new(line).render(field_layout[i], frame.buffer_mut());
    }

    let footer = Paragraph::new(Line::from(Span::styled(
        "  [ESC] Save & back  [Enter/arrows] Change value",
        Style::default().fg(colors.accent()),
    )));
    footer.render(layout[3], frame.buffer_mut());
}
