//! CLI for streamhub
//!
//! Subcommands:
//! - `server`: run the hub, the heartbeat producer and the websocket server
//! - `client`: connect to a server and print the events it streams

use clap::Parser;
use streamhub::client::run_client;
use streamhub::config::{DEFAULT_CONFIG_PATH, Settings, load_config_from};
use streamhub::hub::{Hub, HubConfig};
use streamhub::producer::run_heartbeat;
use streamhub::transport::start_websocket_server;
use streamhub::utils::error::ServerError;
use streamhub::utils::logging;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "streamhub")]
enum Command {
    /// Start the websocket server
    Server {
        /// Configuration file (extension optional)
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: String,
    },
    /// Connect to a server and print streamed events
    Client {
        /// WebSocket server URL to connect to
        #[arg(long, default_value = "ws://127.0.0.1:8085")]
        url: String,
        /// Send a ping after connecting
        #[arg(long)]
        ping: bool,
        /// Exit after this many events
        #[arg(long)]
        count: Option<usize>,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cmd = Command::parse();

    match cmd {
        Command::Server { config } => {
            let settings = match load_config_from(&config) {
                Ok(settings) => settings,
                Err(e) => {
                    logging::init("info");
                    error!("Failed to load configuration: {e}");
                    std::process::exit(1);
                }
            };
            logging::init(&settings.log.level);

            if let Err(e) = run_server(settings).await {
                error!("Server failed: {e}");
                std::process::exit(1);
            }
        }
        Command::Client { url, ping, count } => {
            logging::init("info");
            if let Err(e) = run_client(&url, ping, count).await {
                error!("Client failed: {e}");
                std::process::exit(1);
            }
        }
    }
}

async fn run_server(settings: Settings) -> Result<(), ServerError> {
    let cancel = CancellationToken::new();
    let (hub, worker) = Hub::start(HubConfig::from(&settings.hub), cancel.clone());

    if settings.heartbeat.enabled {
        tokio::spawn(run_heartbeat(
            hub.publisher(),
            settings.heartbeat.interval(),
            cancel.clone(),
        ));
    }

    let server = start_websocket_server(settings.server.addr(), hub, cancel.clone());

    let result = tokio::select! {
        result = server => {
            if result.is_ok() {
                error!("WebSocket server exited unexpectedly.");
            }
            result
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
            Ok(())
        }
    };

    cancel.cancel();
    if let Err(e) = worker.await {
        error!("Hub worker failed: {e}");
    }

    result
}
