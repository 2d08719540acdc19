//! CLI command definitions and dispatch.

pub mod keepalive;
pub mod serve;
pub mod session;
pub mod token;

use clap::{Parser, Subcommand};

use brokle_core::config::AppConfig;
use brokle_core::error::AppError;

/// Brokle: dashboard auth gate and session tools
#[derive(Debug, Parser)]
#[command(name = "brokle", version, about, long_about = None)]
pub struct Cli {
    /// Configuration environment; selects the `config/{env}.toml` overlay
    #[arg(short, long, env = "BROKLE_ENV", default_value = "development")]
    pub env: String,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the gated dashboard server
    Serve(serve::ServeArgs),
    /// Mint a signed session token for local development
    MintToken(token::MintTokenArgs),
    /// Sign in and store the session locally
    Login(session::LoginArgs),
    /// Create an account and store the session locally
    Signup(session::SignupArgs),
    /// Show the signed-in user
    Whoami,
    /// Update the signed-in user's profile
    Profile(session::ProfileArgs),
    /// Sign out and clear the local session
    Logout,
    /// Keep the stored session alive until interrupted or expired
    Keepalive,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Serve(args) => serve::execute(args, config).await,
            Commands::MintToken(args) => token::execute(args, &config),
            Commands::Login(args) => session::login(args, &config).await,
            Commands::Signup(args) => session::signup(args, &config).await,
            Commands::Whoami => session::whoami(&config).await,
            Commands::Profile(args) => session::profile(args, &config).await,
            Commands::Logout => session::logout(&config).await,
            Commands::Keepalive => keepalive::execute(&config).await,
        }
    }
}
