//! Development token minting.

use clap::Args;

use brokle_auth::JwtSigner;
use brokle_core::config::AppConfig;
use brokle_core::error::AppError;
use brokle_core::types::Role;

use crate::output;

/// Arguments for the mint-token command
#[derive(Debug, Args)]
pub struct MintTokenArgs {
    /// Subject (user ID)
    #[arg(long)]
    pub sub: String,

    /// Email claim
    #[arg(long)]
    pub email: String,

    /// Organization ID claim
    #[arg(long)]
    pub org: String,

    /// Role claim
    #[arg(long, default_value = "viewer")]
    pub role: Role,

    /// Override `auth.token_ttl_minutes`
    #[arg(long)]
    pub ttl_minutes: Option<u64>,

    /// Print only the token
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the mint-token command
pub fn execute(args: &MintTokenArgs, config: &AppConfig) -> Result<(), AppError> {
    let mut auth = config.auth.clone();
    if let Some(ttl) = args.ttl_minutes {
        auth.token_ttl_minutes = ttl;
    }

    let signer = JwtSigner::from_config(&auth)?;
    let (token, claims) = signer.issue(&args.sub, &args.email, &args.org, args.role)?;

    if args.quiet {
        println!("{token}");
        return Ok(());
    }

    output::print_success("Token minted");
    output::print_kv("Subject", &claims.sub);
    output::print_kv("Organization", &claims.organization_id);
    output::print_kv("Role", claims.role.as_str());
    output::print_kv("Issuer", &claims.iss);
    let expires = claims
        .expires_at()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| claims.exp.to_string());
    output::print_kv("Expires", &expires);
    println!();
    println!("{token}");
    Ok(())
}
