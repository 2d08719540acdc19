//! Start the gated dashboard server.

use clap::Args;

use brokle_core::config::AppConfig;
use brokle_core::error::AppError;

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Override the server port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Override the server host
    #[arg(long)]
    pub host: Option<String>,
}

/// Execute the serve command
pub async fn execute(args: &ServeArgs, mut config: AppConfig) -> Result<(), AppError> {
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(ref host) = args.host {
        config.server.host = host.clone();
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        address = %config.server.bind_address(),
        "Starting Brokle dashboard gate"
    );

    brokle_api::run_server(config).await
}
