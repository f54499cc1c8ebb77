//! tagline: a multi-port line-delimited JSON echo server
//!
//! Listens concurrently on every configured port, reads one JSON
//! request per line, and answers each with the same key/value pair
//! tagged with a process-wide unique, monotonically increasing id.
//!
//! Features:
//! - Any number of listening ports, each with its own accept loop
//! - One task per connection; a slow peer never stalls acceptance
//! - Configuration via CLI arguments or TOML file

mod config;
mod ids;
mod protocol;
mod server;

use config::Config;
use server::Server;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(ports = ?config.ports, "Starting tagline server");

    let server = Server::new(config);
    server.run().await
}
