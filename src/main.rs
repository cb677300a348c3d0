use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;
use clap::Parser;
use crossterm::event::{
    DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, KeyCode,
    KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags, MouseButton, MouseEvent,
    MouseEventKind, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Frame;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use simplict::app::{App, AppScreen, Focus};
use simplict::config::Config;
use simplict::event::{AppEvent, EventHandler};
use simplict::session::solve::{Penalty, PuzzleType};
use simplict::store::backend::FileStore;
use simplict::ui::components::chart::SolveChart;
use simplict::ui::components::scramble_bar::ScrambleBar;
use simplict::ui::components::solve_detail::SolveDetail;
use simplict::ui::components::solve_list::SolveList;
use simplict::ui::components::stats_sidebar::StatsSidebar;
use simplict::ui::components::timer_display::TimerDisplay;
use simplict::ui::layout::{AppLayout, centered_rect, pack_hint_lines, wrapped_line_count};

#[derive(Parser)]
#[command(name = "simplict", version, about = "Terminal speedcubing timer")]
struct Cli {
    #[arg(short, long, help = "Puzzle type (3x3, 4x4, 5x5, mega)")]
    puzzle: Option<PuzzleType>,

    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(short, long, help = "Directory for the session file and log")]
    data_dir: Option<PathBuf>,

    #[arg(short, long, help = "Start in manual time entry mode")]
    manual: bool,
}

fn init_logging(data_dir: &Path) -> Result<()> {
    fs::create_dir_all(data_dir)?;
    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join("simplict.log"))?;

    // stdout belongs to the terminal UI.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("simplict=info".parse()?))
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("Could not read config, using defaults: {e}");
        Config::default()
    });
    if let Some(puzzle) = cli.puzzle {
        config.puzzle_type = puzzle.key().to_string();
    }
    if let Some(theme) = cli.theme {
        config.theme = theme;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir.to_string_lossy().to_string();
    }
    config.validate();

    init_logging(&config.data_path())?;
    info!("simplict starting, data in {}", config.data_dir);

    let backend =
        FileStore::with_base_dir(config.data_path())?.with_quota(config.storage_quota_bytes);
    let mut settings = config.engine_settings();
    settings.manual_entry = cli.manual;
    let tick_rate = config.tick_rate();
    let mut app = App::new(config, backend, settings);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange
    )?;

    // Release events are needed for hold-to-arm; without them Space toggles.
    let keyboard_enhanced = execute!(
        io::stdout(),
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
    )
    .is_ok();
    if !keyboard_enhanced {
        warn!("terminal does not report key releases, Space toggles the timer");
    }

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(tick_rate);

    let result = run_app(&mut terminal, &mut app, &events, keyboard_enhanced);

    drop(events);
    app.quit();

    if keyboard_enhanced {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        error!("exited with error: {err:?}");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
    keyboard_enhanced: bool,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key, keyboard_enhanced),
            AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
            AppEvent::FocusLost => app.focus_lost(),
            AppEvent::Tick | AppEvent::Resize(_, _) => {}
        }
        app.on_tick();

        if app.should_quit {
            return Ok(());
        }
    }
}

fn timing_input_allowed(app: &App) -> bool {
    app.screen == AppScreen::Timer && !app.detail_open() && !app.confirm_clear
}

fn handle_key(app: &mut App, key: KeyEvent, keyboard_enhanced: bool) {
    if key.kind == KeyEventKind::Release {
        if key.code == KeyCode::Char(' ') && timing_input_allowed(app) {
            app.space_up();
        }
        return;
    }
    // Holding Space auto-repeats; the timer is already armed.
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.quit();
        return;
    }

    if app.confirm_clear {
        app.confirm_clear(matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')));
        return;
    }
    if app.detail_open() {
        handle_detail_key(app, key);
        return;
    }

    match app.screen {
        AppScreen::Timer => handle_timer_key(app, key, keyboard_enhanced),
        AppScreen::Stats => handle_stats_key(app, key),
    }
}

fn handle_timer_key(app: &mut App, key: KeyEvent, keyboard_enhanced: bool) {
    if key.code == KeyCode::Char(' ') {
        if keyboard_enhanced {
            app.space_down();
        } else {
            app.space_tap();
        }
        return;
    }
    if app.engine.is_running() {
        return;
    }

    if app.engine.manual_entry() {
        let for_input = match key.code {
            KeyCode::Char(ch) => ch.is_ascii_digit() || ch == '.',
            KeyCode::Backspace
            | KeyCode::Delete
            | KeyCode::Left
            | KeyCode::Right
            | KeyCode::Home
            | KeyCode::End
            | KeyCode::Enter
            | KeyCode::Esc => true,
            _ => false,
        };
        if for_input && app.manual_key(key) {
            return;
        }
    }

    if app.focus == Focus::SolveList {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => return app.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => return app.select_next(),
            KeyCode::Enter => {
                app.open_selected_detail();
                return;
            }
            KeyCode::Char('2') => return app.penalize(Penalty::PlusTwo),
            KeyCode::Char('d') => return app.penalize(Penalty::Dnf),
            KeyCode::Char('n') => return app.penalize(Penalty::None),
            KeyCode::Char('x') => return app.delete_selected(),
            KeyCode::Esc => return app.toggle_focus(),
            _ => {}
        }
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
        KeyCode::Char('p') => app.cycle_puzzle(),
        KeyCode::Char('r') => app.refresh_scramble(),
        KeyCode::Char('m') => app.toggle_manual(),
        KeyCode::Char('s') => app.go_to_stats(),
        KeyCode::Char('u') => app.delete_last(),
        KeyCode::Char('c') => app.request_clear(),
        KeyCode::Tab => app.toggle_focus(),
        _ => {}
    }
}

fn handle_detail_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('2') => app.penalize(Penalty::PlusTwo),
        KeyCode::Char('d') => app.penalize(Penalty::Dnf),
        KeyCode::Char('n') => app.penalize(Penalty::None),
        KeyCode::Char('x') => app.delete_selected(),
        KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => app.close_detail(),
        _ => {}
    }
}

fn handle_stats_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('s') | KeyCode::Esc | KeyCode::Tab => app.go_to_timer(),
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if !timing_input_allowed(app) {
        return;
    }
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => app.pointer_down(),
        MouseEventKind::Up(MouseButton::Left) => app.pointer_up(),
        _ => {}
    }
}

fn render(frame: &mut Frame, app: &App) {
    match app.screen {
        AppScreen::Timer => render_timer(frame, app),
        AppScreen::Stats => render_stats(frame, app),
    }

    let area = frame.area();
    if let Some(solve) = app.engine.selected_solve() {
        let popup = centered_rect(60, 50, area);
        let number = app.engine.solve_number(solve.id());
        frame.render_widget(SolveDetail::new(solve, number, app.theme), popup);
    }

    if app.confirm_clear {
        let colors = &app.theme.colors;
        let popup = centered_rect(40, 20, area);
        frame.render_widget(Clear, popup);
        let text = vec![
            Line::from(format!(
                "Delete all {} solves in this session?",
                app.engine.solves().len()
            )),
            Line::from(""),
            Line::from(Span::styled(
                "[y] yes   any other key: no",
                Style::default().fg(colors.accent()),
            )),
        ];
        frame.render_widget(
            Paragraph::new(text).alignment(Alignment::Center).block(
                Block::bordered()
                    .title(" Clear session ")
                    .border_style(Style::default().fg(colors.warning())),
            ),
            popup,
        );
    }
}

fn render_header(frame: &mut Frame, app: &App, area: ratatui::layout::Rect, compact_stats: bool) {
    let colors = &app.theme.colors;
    let mut spans = vec![
        Span::styled(
            " simplict ",
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" {} ", app.engine.puzzle().label()),
            Style::default().fg(colors.accent()),
        ),
    ];
    if app.engine.manual_entry() {
        spans.push(Span::styled(" manual ", Style::default().fg(colors.warning())));
    }
    if compact_stats {
        spans.push(Span::styled(
            StatsSidebar::summary(app.engine.stats()),
            Style::default().fg(colors.muted()),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_footer(frame: &mut Frame, app: &App, area: ratatui::layout::Rect, hints: &[&str]) {
    let lines: Vec<Line> = pack_hint_lines(hints, area.width as usize)
        .into_iter()
        .map(|l| Line::from(Span::styled(l, Style::default().fg(app.theme.colors.muted()))))
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_timer(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let scramble = app.engine.scramble();
    let scramble_lines = wrapped_line_count(scramble, area.width.saturating_sub(4) as usize)
        .clamp(1, 6) as u16;
    let layout = AppLayout::new(area, scramble_lines);

    render_header(frame, app, layout.header, !layout.tier.show_sidebar());
    frame.render_widget(
        ScrambleBar::new(scramble, app.engine.puzzle(), app.theme),
        layout.scramble,
    );
    frame.render_widget(
        TimerDisplay::new(
            app.engine.timer(),
            &app.time_input,
            app.warning.as_deref(),
            app.theme,
        ),
        layout.timer,
    );
    if let Some(solves_area) = layout.solves {
        frame.render_widget(
            SolveList::new(
                app.engine.solves(),
                app.engine.stats(),
                app.list_selected,
                app.focus == Focus::SolveList,
                app.theme,
            ),
            solves_area,
        );
    }
    if let Some(sidebar) = layout.sidebar {
        frame.render_widget(StatsSidebar::new(app.engine.stats(), app.theme), sidebar);
    }

    let hints: &[&str] = if app.focus == Focus::SolveList {
        &[
            "[j/k] select",
            "[Enter] details",
            "[2] +2",
            "[d] DNF",
            "[n] clear penalty",
            "[x] delete",
            "[Esc] back",
        ]
    } else {
        &[
            "[Space] time",
            "[p] puzzle",
            "[r] new scramble",
            "[m] manual",
            "[Tab] solves",
            "[u] undo last",
            "[c] clear",
            "[s] stats",
            "[q] quit",
        ]
    };
    render_footer(frame, app, layout.footer, hints);
}

fn render_stats(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(8),
            Constraint::Length(2),
        ])
        .split(area);
    render_header(frame, app, rows[0], false);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(32), Constraint::Min(20)])
        .split(rows[1]);
    frame.render_widget(StatsSidebar::new(app.engine.stats(), app.theme), cols[0]);

    let series = app.engine.chart_series();
    frame.render_widget(SolveChart::new(&series, app.theme), cols[1]);

    render_footer(frame, app, rows[2], &["[s/Esc] back to timer", "[q] quit"]);
}
