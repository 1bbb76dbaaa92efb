/// ferrite-classify dashboard
///
/// Browse saved classifier checkpoints, inspect their hyperparameters and
/// run single-image inference in the browser. Checkpoints come from a local
/// directory or from the artifact registry, depending on configuration.
///
/// Run with:
///   cargo run --bin dashboard --release [config.json]
/// Then open http://127.0.0.1:7878
///
/// Configuration is layered: built-in defaults, then the optional JSON file,
/// then `FERRITE_*` environment variables (a `.env` file in the working
/// directory is loaded first).

mod config;
mod state;
mod render;
mod routes;
mod handlers;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use clap::Parser;
use tiny_http::Server;

use config::DashboardConfig;
use state::{DashboardState, Session};

/// Browse, inspect and run saved classifier checkpoints.
#[derive(Parser, Debug)]
#[command(name = "dashboard", version, about, long_about = None)]
struct Cli {
    /// JSON configuration file
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    // Load .env file if present
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = match DashboardConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let addr = config.bind.clone();
    let server = match Server::http(&addr) {
        Ok(s) => s,
        Err(e) => {
            log::error!("failed to bind {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    let state = DashboardState::connect(config);
    let source = match &state.session {
        Session::Local { dir } => format!("local: {}", dir),
        Session::Registry { entity, url } => format!("registry: {} as {}", url, entity),
        Session::Blocked { message, .. } => format!("unavailable ({})", message),
    };
    let shared_state = Arc::new(Mutex::new(state));

    println!("ferrite-classify dashboard");
    println!("  open:        http://{}", addr);
    println!("  checkpoints: {}", source);

    // One thread per request so a slow registry download does not stall
    // other page loads.
    for request in server.incoming_requests() {
        let state_clone = shared_state.clone();
        std::thread::spawn(move || {
            routes::dispatch(request, state_clone);
        });
    }
    ExitCode::SUCCESS
}
