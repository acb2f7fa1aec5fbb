//! CryptoVisual - Crypto prices in the terminal
//!
//! A terminal UI application that displays top assets, a historical chart,
//! a paginated market table and a local portfolio, served from a freshness
//! cache that falls back to stale or bundled data when offline.

use std::io;
use std::panic;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};

use cryptovisual::app::{App, AppState, InputMode};
use cryptovisual::cache::{
    default_cache_root, FileStore, HttpTransport, KeyValueStore, MemoryStore, OfflineTransport,
    Resolver, Transport, STORE_VERSION,
};
use cryptovisual::cli::{Cli, StartupConfig};
use cryptovisual::data::MarketClient;
use cryptovisual::logging::{init_logging, log_path};
use cryptovisual::refresh::{self, RefreshHandle, RefreshMessage};
use cryptovisual::ui;

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

/// Renders the UI based on the current application state
fn render_ui(frame: &mut ratatui::Frame, app: &App) {
    match app.state {
        AppState::Loading => render_loading(frame),
        AppState::Dashboard => {
            ui::render_dashboard(frame, app);
            if app.mode == InputMode::AddHolding {
                ui::render_add_holding(frame, app);
            }
        }
    }
    if app.show_help {
        ui::render_help_overlay(frame);
    }
    ui::dashboard::render_toasts(frame, app);
}

/// Renders a loading message while data is being fetched
fn render_loading(frame: &mut ratatui::Frame) {
    use ratatui::{
        layout::{Alignment, Constraint, Direction, Layout},
        style::{Color, Style},
        widgets::Paragraph,
    };

    let area = frame.area();

    // Center the loading message vertically
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(3),
            Constraint::Percentage(45),
        ])
        .split(area);

    let loading_text = Paragraph::new("Loading market data...")
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center);

    frame.render_widget(loading_text, chunks[1]);
}

/// Opens the file store, or an in-memory one when no cache directory is known
fn build_store(cache_root: Option<&PathBuf>) -> Arc<dyn KeyValueStore> {
    match cache_root {
        Some(root) => Arc::new(FileStore::open_versioned(root, STORE_VERSION)),
        None => {
            warn!("no cache directory available, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    }
}

fn build_transport(offline: bool) -> Arc<dyn Transport> {
    if offline {
        Arc::new(OfflineTransport)
    } else {
        Arc::new(HttpTransport::new())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    };

    let cache_root = config.cache_dir.clone().or_else(default_cache_root);
    if let Some(path) = log_path(config.log_file.as_deref(), cache_root.as_deref()) {
        if let Err(e) = init_logging(&path) {
            eprintln!("warning: logging to {} disabled: {}", path.display(), e);
        }
    }
    info!(
        currency = config.currency.code(),
        page = config.page,
        offline = config.offline,
        "starting"
    );

    let resolver = Resolver::new(
        build_store(cache_root.as_ref()),
        build_transport(config.offline),
    );
    let market = MarketClient::with_base_url(resolver, config.api_base.clone());

    // Set up panic hook to restore terminal on crash
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::with_startup_config(market, &config);
    let mut refresh_handle = RefreshHandle::spawn(config.refresh.clone());

    // Initial render to show loading state, then trigger the first load
    terminal.draw(|f| render_ui(f, &app))?;
    app.request_dashboard();

    // Main event loop
    loop {
        app.drain_messages();
        while let Some(message) = refresh::try_recv(&mut refresh_handle) {
            match message {
                RefreshMessage::DashboardTick => app.request_dashboard(),
                RefreshMessage::PortfolioTick => app.request_portfolio(),
            }
        }
        app.prune_toasts(Instant::now());

        // Render UI
        terminal.draw(|f| render_ui(f, &app))?;

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        // Check if we should quit
        if app.should_quit {
            break;
        }
    }

    refresh_handle.shutdown().await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    info!("exiting");
    Ok(())
}
