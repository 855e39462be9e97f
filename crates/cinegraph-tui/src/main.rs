use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cinegraph_core::{Config, GraphRagClient, GraphService};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

/// How often finished requests are picked up and the spinner advances
const TICK_RATE: Duration = Duration::from_millis(100);

/// Log to a file: the terminal belongs to the UI
fn init_logging() {
    let Some(log_dir) = dirs::cache_dir().map(|dir| dir.join("cinegraph")) else {
        return;
    };
    if std::fs::create_dir_all(&log_dir).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("cinegraph.log"))
    else {
        return;
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cinegraph=info,warn")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

fn load_config() -> Config {
    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "could not load config file, using defaults");
            let mut config = Config::new();
            config.apply_env();
            config
        }
    };

    // Leave a file behind for users to edit
    if !Config::exists() {
        if let Err(err) = Config::new().save() {
            warn!(error = %err, "could not write default config file");
        }
    }

    config
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = load_config();
    let client = GraphRagClient::from_config(&config)?;
    info!(
        base_url = client.base_url(),
        timeout = ?config.request_timeout(),
        "starting cinegraph v{}",
        env!("CARGO_PKG_VERSION")
    );

    let service: Arc<dyn GraphService> = Arc::new(client);
    let mut app = App::new(service, config.base_url().to_string());

    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    result
}

async fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new(TICK_RATE);

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
    }

    info!(entries = app.session.log().len(), "shutting down");
    Ok(())
}
