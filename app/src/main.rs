//! Vulnerable Bank - terminal client for the demo banking API
//!
//!      ___________________
//!     /  VULNERABLE BANK  \
//!    /_____________________\
//!     |  _   _   _   _   |
//!     | |_| |_| |_| |_| ||
//!    _|___________________|_

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, path::PathBuf};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vulnerable_bank::{
    auth::AdminPolicy,
    client::ApiClient,
    config::AppConfig,
    session::{SessionStore, SESSION_NAMESPACE},
    storage::FileStore,
    App, AppMessage,
};

#[derive(Parser, Debug)]
#[command(name = "vbank")]
#[command(about = "Vulnerable Bank - terminal client for the demo banking API")]
#[command(version)]
struct Cli {
    /// Bank API base URL
    #[arg(short, long, env = "VBANK_SERVER")]
    server: Option<String>,

    /// File holding the persisted session
    #[arg(long)]
    session_file: Option<PathBuf>,

    /// How the admin flag is decided at login
    #[arg(long, value_enum)]
    admin_policy: Option<AdminPolicy>,

    /// Log file (the terminal belongs to the UI)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Flags win over the config file.
    fn apply(self, config: &mut AppConfig) {
        if let Some(server) = self.server {
            config.server_url = server;
        }
        if let Some(policy) = self.admin_policy {
            config.admin_policy = policy;
        }
        if self.session_file.is_some() {
            config.session_file = self.session_file;
        }
        if self.log_file.is_some() {
            config.log_file = self.log_file;
        }
    }
}

/// Log to a file. The returned guard flushes on drop and must outlive the UI.
fn init_logging(config: &AppConfig) -> Result<WorkerGuard> {
    let path = config.log_path();
    let dir = path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "vbank.log".into());

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("vulnerable_bank=info,vbank=info"));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Ignoring unreadable config {}: {}", AppConfig::path().display(), e);
        AppConfig::default()
    });
    cli.apply(&mut config);

    let _guard = init_logging(&config)?;
    info!(server = %config.server_url, policy = ?config.admin_policy, "Starting vbank");

    let store = FileStore::new(config.session_path(), SESSION_NAMESPACE);
    let client = ApiClient::new(config.server_url.clone());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Message channel for async results
    let (tx, mut rx) = mpsc::channel::<AppMessage>(32);

    let mut app = App::new(client, SessionStore::new(Box::new(store)), config.admin_policy, tx);

    // Run app
    let result = run_app(&mut terminal, &mut app, &mut rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        error!(error = %e, "Exited with error");
        eprintln!("Error: {}", e);
    }

    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    rx: &mut mpsc::Receiver<AppMessage>,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| app.render(f))?;

        // Handle async results
        while let Ok(msg) = rx.try_recv() {
            app.handle_message(msg);
        }

        // Poll for events with timeout
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                        app.quit();
                    } else if key.code == KeyCode::Char('q') && app.can_quit() {
                        return Ok(());
                    } else {
                        app.handle_key(key.code);
                    }
                }
            }
        }

        if app.should_quit() {
            info!("Quit requested");
            return Ok(());
        }
    }
}
