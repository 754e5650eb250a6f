use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Gauge, Paragraph};

use stride_terminal::state::{self, AppState, Delta, ProviderCommand};
use stride_terminal::{avatar, demo_feed, predictor, provider, stats, strava_fetch};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
}

impl App {
    fn new(cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state: AppState::new(),
            should_quit: false,
            cmd_tx,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('p') | KeyCode::Enter => self.request_prediction(),
            KeyCode::Char('r') | KeyCode::Char('R') => self.request_refresh(),
            KeyCode::Char('j') | KeyCode::Down => self.state.scroll_runs_down(),
            KeyCode::Char('k') | KeyCode::Up => self.state.scroll_runs_up(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            _ => {}
        }
    }

    fn request_prediction(&mut self) {
        if self.state.predicting {
            self.state.push_log("[INFO] Prediction already running");
            return;
        }
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[INFO] Prediction unavailable");
            return;
        };
        if tx.send(ProviderCommand::GeneratePrediction).is_err() {
            self.state.push_log("[WARN] Prediction request failed");
        } else {
            self.state.push_log("[INFO] Prediction request sent");
        }
    }

    fn request_refresh(&mut self) {
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[INFO] Runs fetch unavailable");
            return;
        };
        if tx.send(ProviderCommand::FetchRuns).is_err() {
            self.state.push_log("[WARN] Refresh request failed");
        } else {
            self.state.push_log("[INFO] Refresh request sent");
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    if strava_fetch::has_credentials() {
        provider::spawn_provider(tx, cmd_rx);
    } else {
        demo_feed::spawn_demo_provider(tx, cmd_rx);
    }

    let mut app = App::new(Some(cmd_tx));
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            state::apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.state.advance_frame();
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header =
        Paragraph::new(header_text(&app.state)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    render_dashboard(frame, chunks[1], &app.state);

    let footer =
        Paragraph::new(footer_text(&app.state)).block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[2]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let title = format!(
        "MARATHON TERMINAL | {} | Runs: {}",
        state::countdown_now(state.race_date),
        state.runs.len()
    );
    let line1 = format!("  _o/  {title}");
    let line2 = " /|".to_string();
    let line3 = " / \\".to_string();
    format!("{line1}\n{line2}\n{line3}")
}

fn footer_text(state: &AppState) -> String {
    if state.predicting {
        "Analyzing... | j/k Scroll | ? Help | q Quit".to_string()
    } else {
        "p/Enter Predict | r Refresh | j/k/↑/↓ Scroll | ? Help | q Quit".to_string()
    }
}

fn render_dashboard(frame: &mut Frame, area: Rect, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(14),
            Constraint::Min(5),
            Constraint::Length(4),
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(30),
            Constraint::Min(22),
            Constraint::Length(42),
        ])
        .split(rows[0]);

    render_stats(frame, columns[0], state);
    render_runner(frame, columns[1], state);
    render_prediction(frame, columns[2], state);

    render_runs_table(frame, rows[1], state);

    let console =
        Paragraph::new(console_text(state)).block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, rows[2]);
}

fn render_stats(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Training Stats").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let rows = state.scores.rows();
    for (i, (label, score)) in rows.iter().enumerate() {
        if i as u16 * 2 >= inner.height {
            break;
        }
        let row_area = Rect {
            x: inner.x,
            y: inner.y + (i as u16) * 2,
            width: inner.width,
            height: 1,
        };
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(10),
                Constraint::Min(8),
                Constraint::Length(4),
            ])
            .split(row_area);

        let label_widget = Paragraph::new(*label);
        frame.render_widget(label_widget, cols[0]);

        frame.render_widget(stat_bar(*score), cols[1]);

        let value = Paragraph::new(format!("{score:>3}"));
        frame.render_widget(value, cols[2]);
    }
}

fn stat_bar(score: u8) -> BarChart<'static> {
    let style = Style::default().fg(stat_color(score));
    let bar = Bar::default()
        .value(u64::from(score))
        .text_value(String::new())
        .style(style);

    BarChart::default()
        .data(BarGroup::default().bars(&[bar]))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .group_gap(0)
        .max(100)
}

fn stat_color(score: u8) -> Color {
    if score >= 70 {
        Color::Green
    } else if score >= 40 {
        Color::Yellow
    } else {
        Color::Red
    }
}

fn render_runner(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(4), Constraint::Length(3)])
        .split(area);

    let stride = avatar::stride_interval(state.scores.speed);
    let runner = Paragraph::new(avatar::frame_text(state.frame / stride))
        .block(Block::default().title("Runner").borders(Borders::ALL));
    frame.render_widget(runner, sections[0]);

    let countdown = Paragraph::new(state::countdown_now(state.race_date))
        .block(Block::default().title("Race Countdown").borders(Borders::ALL));
    frame.render_widget(countdown, sections[1]);
}

fn render_prediction(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Prediction").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    if state.predicting {
        let busy = Paragraph::new("Analyzing...").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(busy, inner);
        return;
    }

    let Some(prediction) = &state.prediction else {
        let empty = Paragraph::new("Generate a prediction to start your journey!")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    };

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Min(4),
        ])
        .split(inner);

    let target = Paragraph::new(format!("Target Time: {}", prediction.predicted_time))
        .style(Style::default().add_modifier(Modifier::BOLD));
    frame.render_widget(target, sections[0]);

    let confidence = Gauge::default()
        .gauge_style(Style::default().fg(confidence_color(prediction.confidence)))
        .percent(u16::from(prediction.confidence))
        .label(format!("Confidence {}%", prediction.confidence));
    frame.render_widget(confidence, sections[1]);

    frame.render_widget(goal_gauge(prediction, state.goal_minutes), sections[2]);

    let (level, xp) = level_progress(prediction.training_volume_km);
    let level_bar = Gauge::default()
        .gauge_style(Style::default().fg(Color::Blue))
        .percent(xp.round() as u16)
        .label(format!("Lv.{level}  {xp:.1}%"));
    frame.render_widget(level_bar, sections[3]);

    let details = [
        format!("Average Pace: {}", prediction.average_pace),
        format!("Longest Run:  {:.1} km", prediction.longest_run_km),
        format!("Volume:       {:.1} km", prediction.training_volume_km),
        format!(
            "Confidence:   {} | Race in {}d",
            prediction.level.label(),
            prediction.days_until_race
        ),
    ]
    .join("\n");
    frame.render_widget(Paragraph::new(details), sections[4]);
}

fn goal_gauge(prediction: &state::Prediction, goal_minutes: u32) -> Gauge<'static> {
    let predicted = predictor::time_to_minutes(&prediction.predicted_time);
    let ratio = predicted
        .map(|minutes| f64::from(minutes) / f64::from(goal_minutes.max(1)))
        .unwrap_or(0.0)
        .clamp(0.0, 1.0);
    let label = match predicted {
        Some(minutes) => format!("Predicted: {:.2}h", f64::from(minutes) / 60.0),
        None => "Predicted: -".to_string(),
    };
    Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(ratio)
        .label(label)
}

// Level and XP derived from training volume: five km per level.
fn level_progress(volume_km: f64) -> (u32, f64) {
    let volume = volume_km.max(0.0);
    let level = (volume / 5.0).floor() as u32 + 1;
    let xp = (volume % 5.0) / 5.0 * 100.0;
    (level, xp)
}

fn confidence_color(confidence: u8) -> Color {
    if confidence > 75 {
        Color::Green
    } else if confidence > 50 {
        Color::Yellow
    } else {
        Color::Red
    }
}

fn render_runs_table(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Recent Runs").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    if state.runs_loading {
        let loading =
            Paragraph::new("Loading your runs...").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(loading, inner);
        return;
    }
    if let Some(err) = &state.runs_error {
        let failed = Paragraph::new(format!("Failed to load runs: {err}"))
            .style(Style::default().fg(Color::Red));
        frame.render_widget(failed, inner);
        return;
    }
    if state.runs.is_empty() {
        let empty =
            Paragraph::new("No recent runs found").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }

    let widths = runs_columns();
    render_runs_header(frame, table_row(inner, 0), &widths);

    let visible = inner.height.saturating_sub(1) as usize;
    let total = state.runs.len();
    let max_start = total.saturating_sub(visible);
    let start = (state.runs_scroll as usize).min(max_start);
    let end = (start + visible).min(total);

    for (i, idx) in (start..end).enumerate() {
        let row_area = table_row(inner, (i + 1) as u16);
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(widths)
            .split(row_area);

        let run = &state.runs[idx];
        let pace = stats::format_pace(stats::pace_min_km(run.average_speed));
        let hr = run
            .average_heartrate
            .map(|hr| format!("{hr:.0}"))
            .unwrap_or_else(|| "-".to_string());
        let elevation = run
            .total_elevation_gain
            .map(|gain| format!("{gain:.0}"))
            .unwrap_or_else(|| "-".to_string());

        render_cell_text(frame, cols[0], &run.name, Style::default());
        render_cell_text(
            frame,
            cols[1],
            &format!("{:.1}", run.distance / 1000.0),
            Style::default(),
        );
        render_cell_text(
            frame,
            cols[2],
            &stats::format_duration(run.moving_time),
            Style::default(),
        );
        render_cell_text(frame, cols[3], &pace, Style::default());
        render_cell_text(frame, cols[4], &hr, Style::default());
        render_cell_text(frame, cols[5], &elevation, Style::default());
    }
}

fn runs_columns() -> [Constraint; 6] {
    [
        Constraint::Min(18),
        Constraint::Length(10),
        Constraint::Length(9),
        Constraint::Length(14),
        Constraint::Length(6),
        Constraint::Length(8),
    ]
}

fn render_runs_header(frame: &mut Frame, area: Rect, widths: &[Constraint]) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths)
        .split(area);
    let style = Style::default().add_modifier(Modifier::BOLD);

    render_cell_text(frame, cols[0], "Name", style);
    render_cell_text(frame, cols[1], "Dist (km)", style);
    render_cell_text(frame, cols[2], "Time", style);
    render_cell_text(frame, cols[3], "Avg Pace", style);
    render_cell_text(frame, cols[4], "HR", style);
    render_cell_text(frame, cols[5], "Elev (m)", style);
}

fn table_row(inner: Rect, offset: u16) -> Rect {
    Rect {
        x: inner.x,
        y: inner.y + offset,
        width: inner.width,
        height: 1,
    }
}

fn render_cell_text(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    let paragraph = Paragraph::new(text.to_string()).style(style);
    frame.render_widget(paragraph, area);
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(2)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Marathon Terminal - Help",
        "",
        "Global:",
        "  p / Enter    Generate prediction",
        "  r            Refresh runs",
        "  j/k or ↑/↓   Scroll the runs table",
        "  ?            Toggle help",
        "  Esc          Close help",
        "  q            Quit",
        "",
        "The prediction re-fetches your runs, summarizes the",
        "training window and asks the model for a finish time.",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
