// Draft room entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Build the HTTP client for the league server
// 4. Create channels and the session controller
// 5. Subscribe to push events (optional, failure is not fatal)
// 6. Spawn the session event loop
// 7. Run the board (or the line console with --console) until the user leaves
// 8. Cleanup on exit

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use leaguedraft_app::event_loop;
use leaguedraft_app::{ControllerSettings, DraftSessionController};
use leaguedraft_cli::{console, tui};
use leaguedraft_core::config;
use leaguedraft_net::{push, HttpDraftApi};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("Draft room starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: league {}, team {}, server {}",
        config.league.league_id, config.league.team_id, config.api.base_url
    );

    // 3. HTTP client
    let api = Arc::new(HttpDraftApi::from_config(&config).context("failed to build HTTP client")?);

    // 4. Channels and controller
    let (push_tx, push_rx) = mpsc::channel(64);
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (view_tx, view_rx) = mpsc::channel(256);

    let settings = ControllerSettings::from_config(&config);
    let (mut controller, completions) = DraftSessionController::new(settings, api);

    // 5. Push subscription
    if config.push.is_enabled() {
        match push::subscribe(&config.push.url, config.league.league_id, push_tx).await {
            Ok(handle) => {
                info!("Subscribed to live updates at {}", config.push.url);
                controller.attach_push(Box::new(handle));
            }
            Err(e) => warn!("Live updates unavailable, polling only: {e:#}"),
        }
    } else {
        info!("Live updates disabled, polling only");
        drop(push_tx);
    }

    // 6. Session loop
    let session_handle = tokio::spawn(async move {
        if let Err(e) = event_loop::run(controller, completions, push_rx, cmd_rx, view_tx).await {
            error!("Draft room loop error: {e}");
        }
    });

    // 7. Front end
    let front_end = if std::env::args().skip(1).any(|arg| arg == "--console") {
        console::run(view_rx, cmd_tx).await
    } else {
        tui::run(view_rx, cmd_tx).await
    };
    if let Err(e) = front_end {
        error!("Front end error: {e:#}");
    }

    // 8. Cleanup
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), session_handle).await;

    info!("Draft room shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (the terminal belongs to the board).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("draftroom.log"))?;

    let subscriber = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("leaguedraft=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
