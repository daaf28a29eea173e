//! Efetivo - a terminal dashboard for personnel rosters.
//!
//! Keyboard-driven views over the roster, the unit org-chart and the staffing
//! reconciliation against the predicted establishment (DDQOD). Works offline
//! on JSON documents kept in the data directory.

mod app;
mod ui;

use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use efetivo_core::{AppState, Config, FileStore};

use app::{App, Mode};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 250;

/// Log file name inside the data directory
const LOG_FILE: &str = "efetivo.log";

/// Exports land here, below the data directory
const EXPORT_DIR: &str = "exports";

/// Initialize the tracing subscriber, writing to a file so log lines do not
/// corrupt the terminal. The guard must live until exit to flush.
fn init_tracing(log_dir: &Path) -> WorkerGuard {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    guard
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = Config::load().context("Failed to load configuration")?;
    let data_dir = config.data_dir()?;
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

    let _log_guard = init_tracing(&data_dir);
    info!(data_dir = %data_dir.display(), "Efetivo starting");

    let store = FileStore::new(data_dir.clone())
        .with_context(|| format!("Failed to open data directory: {}", data_dir.display()))?;
    let state = AppState::load(Box::new(store)).context("Failed to load stored data")?;

    let mut app = App::new(config, state, data_dir.join(EXPORT_DIR));

    if let Some(seed) = app.config.seed_file.clone() {
        if let Err(e) = app.import_seed(&seed) {
            warn!(error = %e, "Seed import failed");
            app.status_message = Some(format!("{e:#}"));
        }
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = app.config.save() {
        warn!(error = %e, "Failed to save configuration");
    }

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("Efetivo shutting down");
    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                // Handle input
                if handle_input(app, key)? {
                    return Ok(());
                }
            }
        }

        if app.mode == Mode::Quitting {
            return Ok(());
        }
    }
}
