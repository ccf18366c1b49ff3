mod animation;
mod api;
mod buffer;
mod care;
mod cli;
mod config;
mod model;
mod onboarding;
mod session;
mod store;

use std::io;
use std::process;

use tracing_subscriber::EnvFilter;

use api::HttpClient;
use config::Config;
use store::SqliteStore;

/// Environment variable holding the log filter, e.g. `petsync=debug`.
const LOG_ENV: &str = "PETSYNC_LOG";

fn main() {
    init_tracing();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let path = SqliteStore::default_path().unwrap_or_else(|| {
        eprintln!("Could not determine home directory.");
        process::exit(1);
    });

    let store = match SqliteStore::open(&path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to open store at {}: {e}", path.display());
            process::exit(1);
        }
    };

    let client = match HttpClient::new(&config.api_base_url, config.request_timeout()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to set up HTTP client: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = cli::run(&config, &store, &client) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}
