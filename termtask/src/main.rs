//! `TermTask` — terminal-native task manager.
//!
//! Launches the TUI and talks to a REST backend for accounts and tasks.
//! Configuration via CLI flags, environment variables, or config file
//! (`~/.config/termtask/config.toml`).
//!
//! ```bash
//! # Against the default local backend (e.g. the termtask-stub binary)
//! cargo run --bin termtask
//!
//! # Against a remote backend
//! cargo run --bin termtask -- --api-url https://tasks.example.com
//!
//! # Or via environment variable
//! TERMTASK_API_URL=https://tasks.example.com cargo run --bin termtask
//! ```

use std::io;
use std::path::Path;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use termtask::app::App;
use termtask::config::{CliArgs, ClientConfig};
use termtask::net::{self, NetCommand, NetEvent};
use termtask::ui;

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = CliArgs::parse();

    // Load and resolve configuration (CLI args > config file > defaults).
    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig::default()
        }
    };

    // Initialize logging before terminal setup (logs go to file, not stdout).
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!("termtask starting");

    // Build the store stack and kick off the startup session check.
    let (cmd_tx, evt_rx) = match net::spawn_net(&config) {
        Ok(channels) => channels,
        Err(e) => {
            eprintln!("Error: failed to initialize the API client: {e}");
            std::process::exit(1);
        }
    };

    // Set up terminal.
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app.
    let result = run_app(&mut terminal, cmd_tx, evt_rx, &config).await;

    // Restore terminal.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    tracing::info!("termtask exiting");
    result
}

/// Initialize file-based logging.
///
/// Logs are written to a file (never stdout, since ratatui owns the
/// terminal). Returns a [`WorkerGuard`] that must be held until shutdown to
/// ensure all buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("termtask.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Main application loop: draw, drain store events, poll for input.
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    cmd_tx: mpsc::Sender<NetCommand>,
    mut evt_rx: mpsc::Receiver<NetEvent>,
    config: &ClientConfig,
) -> io::Result<()> {
    let mut app = App::new(config);

    loop {
        // Step 1: Draw the UI frame.
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Step 2: Drain all pending NetEvents (non-blocking).
        while let Ok(event) = evt_rx.try_recv() {
            app.apply_event(event);
        }

        // Step 3: Poll for terminal input events.
        if event::poll(config.poll_timeout)?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }

            // handle_key_event returns Some(NetCommand) when a user action
            // requires backend work (login, fetch, toggle, ...).
            if let Some(net_cmd) = app.handle_key_event(key) {
                match cmd_tx.try_send(net_cmd) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        app.form_error = Some("busy — action dropped, try again".to_string());
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        app.form_error = Some("background worker stopped".to_string());
                    }
                }
            }
        }

        if app.should_quit {
            // Send shutdown command to the background tasks.
            let _ = cmd_tx.try_send(NetCommand::Shutdown);
            return Ok(());
        }
    }
}
