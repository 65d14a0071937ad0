mod action;
mod app;
mod command;
mod config;
mod content;
mod conversation;
mod model;
mod responder;
mod scheduler;
mod store;
mod theme;
mod ui;
mod ui_state;

use std::io;
use std::path::Path;

use arboard::Clipboard;
use clap::Parser;
use crossterm::{
    event::{
        DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture, Event, EventStream,
        KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use app::App;
use config::Cli;
use ui::draw;
use ui_state::Focus;

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("logging setup failed: {0}")]
    Log(String),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let config = Cli::parse().into_config();

    // Hold the guard so buffered log lines are flushed on exit
    let _guard = init_logging(&config.log_file)?;
    info!(
        mode = %config.initial_mode,
        delay_ms = config.reply_delay_ms,
        "starting NexusAI"
    );

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app state
    let mut app = App::new(config);

    // Run app
    let result = run_app(&mut terminal, &mut app).await;
    app.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    match &result {
        Ok(()) => info!("exited cleanly"),
        Err(e) => warn!(error = %e, "exited with error"),
    }
    result
}

fn init_logging(path: &Path) -> Result<WorkerGuard, AppError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file = path
        .file_name()
        .ok_or_else(|| AppError::Log(format!("not a file path: {}", path.display())))?;

    let appender = tracing_appender::rolling::never(dir, file);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| AppError::Log(e.to_string()))?;

    Ok(guard)
}

async fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<(), AppError> {
    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(app.config.tick_rate());

    while !app.should_quit {
        terminal.draw(|frame| draw(frame, app))?;

        tokio::select! {
            _ = ticker.tick() => app.tick(),
            Some(due) = app.store.next_due() => app.resolve_reply(due),
            maybe_event = events.next() => match maybe_event {
                Some(Ok(event)) => handle_event(app, event),
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
        }
    }

    Ok(())
}

fn handle_event(app: &mut App, event: Event) {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, key),
        // Handle paste event (bracketed paste mode)
        Event::Paste(text) => app.push_input(&text),
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::ScrollUp => app.scroll_up(),
            MouseEventKind::ScrollDown => app.scroll_down(),
            _ => {}
        },
        _ => {}
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    if app.ui.show_help {
        // Any key closes help; Ctrl+C still quits
        app.ui.show_help = false;
        if !(ctrl && key.code == KeyCode::Char('c')) {
            return;
        }
    }

    match key.code {
        KeyCode::Esc => {
            if app.showing_command_popup() {
                app.ui.input.clear();
                app.reset_command_selection();
            } else if app.ui.focus == Focus::Sidebar {
                app.ui.focus = Focus::Input;
            } else if app.ui.input.is_empty() {
                app.should_quit = true;
            } else {
                app.ui.input.clear();
            }
        }
        KeyCode::Enter if key.modifiers.intersects(KeyModifiers::ALT | KeyModifiers::SHIFT) => {
            app.insert_newline();
        }
        KeyCode::Enter => {
            if app.showing_command_popup() && app.ui.command_selection.is_some() {
                app.apply_command_selection();
            } else if app.ui.focus == Focus::Sidebar {
                app.select_highlighted_session();
            } else {
                app.submit_input();
            }
        }
        KeyCode::BackTab => app.cycle_focus(),
        KeyCode::Tab => {
            if app.showing_command_popup() && app.ui.command_selection.is_some() {
                app.apply_command_selection();
            } else if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.cycle_focus();
            } else {
                app.cycle_mode();
            }
        }
        KeyCode::Backspace => {
            app.ui.input.pop();
            app.reset_command_selection();
        }
        KeyCode::Char('c') if ctrl => app.should_quit = true,
        KeyCode::Char('n') if ctrl => app.new_chat(),
        KeyCode::Char('b') if ctrl => app.toggle_sidebar(),
        KeyCode::Char('t') if ctrl => app.toggle_dark_mode(),
        KeyCode::Char('v') if ctrl => match Clipboard::new().and_then(|mut c| c.get_text()) {
            Ok(text) => app.push_input(&text),
            Err(e) => {
                warn!(error = %e, "clipboard read failed");
                app.ui.status_message = Some("Clipboard unavailable".to_string());
            }
        },
        KeyCode::Char(_) if ctrl => {}
        KeyCode::Char(c) => {
            let mut buf = [0u8; 4];
            app.push_input(c.encode_utf8(&mut buf));
        }
        KeyCode::Up => app.move_up(),
        KeyCode::Down => app.move_down(),
        KeyCode::PageUp => app.scroll_up(),
        KeyCode::PageDown => app.scroll_down(),
        _ => {}
    }
}
