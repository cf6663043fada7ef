//! `doorlockd`: door lock daemon.
//!
//! Reads the configuration, starts the backend and the door handler, and
//! logs every status notification until interrupted.

mod config;
mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use doorlock_auth::Authenticator;
use doorlock_backend::{AnyBackend, DoorBackend};
use doorlock_core::Response;
use doorlock_logic::{AplayPlayer, DoorHandler, Doorlock, ScriptHookRunner, StatusUpdate};
use tracing::{error, info, warn};

use crate::config::{Config, DEFAULT_CONFIG_PATH};

#[derive(Debug, Parser)]
#[command(name = "doorlockd", version, about = "Door lock daemon")]
struct Cli {
    /// Configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Accept every credential. Overrides `auth.simulate`.
    #[arg(long)]
    simulate_auth: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load_from(&cli.config)?;
    if cli.simulate_auth {
        config.auth.simulate = true;
    }

    logging::init_logging(&config.general.log_level, config.general.log_json);
    info!(config = %cli.config.display(), "Starting doorlockd");

    let auth = Authenticator::from_config(&config.auth)
        .context("initialising authentication backends")?;
    let backend = AnyBackend::from_config(&config.backend)
        .await
        .context("initialising door backend")?;
    info!(
        backend = backend.name(),
        state = %backend.get_state(),
        "Backend ready"
    );
    if backend.simulation_handle().is_some() {
        warn!("Simulation backend active, no lock hardware is driven");
    }

    let hooks = Arc::new(ScriptHookRunner::new(
        &config.general.scripts_dir,
        config.general.run_hooks,
    ));
    let sounds = Arc::new(AplayPlayer::new(
        &config.general.sounds_dir,
        config.general.sounds,
    ));
    let handler = DoorHandler::start(backend, hooks, sounds);

    let doorlock = Doorlock::new(auth, handler);
    doorlock.register_callback(Arc::new(log_status));
    info!(state = %doorlock.state().await, "doorlockd running");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }

    info!("Shutting down");
    drop(doorlock);
    Ok(())
}

fn log_status(update: StatusUpdate) {
    let StatusUpdate { state, response } = update;
    match response {
        Response::EmergencyUnlock => warn!(%state, %response, "Emergency unlock"),
        r if r.is_success() || r.is_unsolicited() => {
            info!(%state, led = state.led_color().as_str(), %response, "Door status")
        }
        _ => warn!(%state, %response, "Door status"),
    }
}
