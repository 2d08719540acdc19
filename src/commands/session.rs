//! Client session commands: login, signup, whoami, profile, logout.
//!
//! Each command opens the file-backed session under `session.storage_dir`,
//! so consecutive invocations share one signed-in identity.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::Args;

use brokle_auth::{
    FileStorage, RefreshCoordinator, RefreshOutcome, SessionBus, SessionStore, StorageBridge,
    TokenStore,
};
use brokle_client::{AuthResponse, BackendClient, ProfileUpdate, SignInRequest, SignUpRequest};
use brokle_core::config::AppConfig;
use brokle_core::error::{AppError, ErrorKind};
use brokle_core::types::User;

use crate::output;

/// Arguments for the login command
#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account email
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long, env = "BROKLE_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Arguments for the signup command
#[derive(Debug, Args)]
pub struct SignupArgs {
    /// Account email
    #[arg(long)]
    pub email: String,

    /// Account password (at least 8 characters)
    #[arg(long, env = "BROKLE_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Display name
    #[arg(long)]
    pub name: String,

    /// Create an organization with this name
    #[arg(long)]
    pub organization: Option<String>,
}

/// Arguments for the profile command
#[derive(Debug, Args)]
pub struct ProfileArgs {
    /// New display name
    #[arg(long)]
    pub name: Option<String>,

    /// New avatar URL
    #[arg(long)]
    pub avatar_url: Option<String>,
}

/// The locally stored session plus the pieces that act on it.
///
/// Session events reach other `brokle` processes using the same storage
/// directory through the storage bridge; call [`close`](Self::close) so
/// events raised by this process are written out before it exits.
pub struct ClientSession {
    pub store: Arc<SessionStore>,
    pub tokens: TokenStore,
    pub client: Arc<BackendClient>,
    pub coordinator: RefreshCoordinator,
    bridge: StorageBridge,
}

impl ClientSession {
    /// Opens the session stored under `session.storage_dir`.
    pub async fn open(config: &AppConfig) -> Result<Self, AppError> {
        let storage = Arc::new(FileStorage::open(&config.session.storage_dir).await?);
        let store = Arc::new(SessionStore::hydrate(storage.clone()).await?);
        let tokens = TokenStore::new(storage.clone());
        let client = Arc::new(BackendClient::new(&config.api)?);
        let bus = SessionBus::new(config.session.bus_capacity);
        let bridge = StorageBridge::spawn(
            bus.clone(),
            storage,
            Duration::from_millis(config.session.signal_poll_millis),
        );
        let coordinator = RefreshCoordinator::new(
            store.clone(),
            tokens.clone(),
            client.clone(),
            bus,
            &config.session,
            config.routes.sign_in_path.clone(),
        );

        Ok(Self {
            store,
            tokens,
            client,
            coordinator,
            bridge,
        })
    }

    /// Stops the coordinator and writes pending session events out.
    pub async fn close(self) {
        self.coordinator.stop();
        self.bridge.shutdown().await;
    }

    /// Stores a fresh sign-in or sign-up result.
    async fn establish(&self, response: AuthResponse) -> Result<User, AppError> {
        let tokens = response.tokens(Utc::now());
        self.tokens.save(&tokens).await?;
        self.store
            .login(response.user.clone(), response.organization.clone())
            .await?;
        Ok(response.user)
    }

    /// Access token for the next backend call.
    async fn access_token(&self) -> Result<String, AppError> {
        self.tokens
            .load()
            .await?
            .map(|t| t.access_token)
            .ok_or_else(|| AppError::session("No stored tokens; run `brokle login`"))
    }

    /// Runs `call` with the current access token. A 401 triggers one
    /// renewal and a single retry.
    async fn authorized<T, F, Fut>(&self, call: F) -> Result<T, AppError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        match call(self.access_token().await?).await {
            Err(e) if e.is_authentication() => {
                match self.coordinator.handle_unauthorized().await {
                    RefreshOutcome::Renewed(_) => call(self.access_token().await?).await,
                    RefreshOutcome::Ended { redirect } => Err(AppError::session(format!(
                        "Session expired; sign in again ({redirect})"
                    ))),
                    RefreshOutcome::NoSession => {
                        Err(AppError::session("Not signed in; run `brokle login`"))
                    }
                    RefreshOutcome::AlreadyInFlight => Err(e),
                }
            }
            other => other,
        }
    }
}

/// Execute the login command
pub async fn login(args: &LoginArgs, config: &AppConfig) -> Result<(), AppError> {
    let session = ClientSession::open(config).await?;
    session.store.set_loading(true).await?;

    let request = SignInRequest {
        email: args.email.clone(),
        password: args.password.clone(),
    };
    let response = match session.client.sign_in(&request).await {
        Ok(r) => r,
        Err(e) => {
            session.store.set_loading(false).await?;
            return Err(e);
        }
    };

    let user = session.establish(response).await?;
    output::print_success(&format!("Signed in as {}", user.email));
    print_scope(&session).await;
    Ok(())
}

/// Execute the signup command
pub async fn signup(args: &SignupArgs, config: &AppConfig) -> Result<(), AppError> {
    let session = ClientSession::open(config).await?;
    session.store.set_loading(true).await?;

    let request = SignUpRequest {
        email: args.email.clone(),
        password: args.password.clone(),
        name: args.name.clone(),
        organization_name: args.organization.clone(),
    };
    let response = match session.client.sign_up(&request).await {
        Ok(r) => r,
        Err(e) => {
            session.store.set_loading(false).await?;
            return Err(e);
        }
    };

    let user = session.establish(response).await?;
    output::print_success(&format!("Account created for {}", user.email));
    print_scope(&session).await;
    Ok(())
}

/// Execute the whoami command
pub async fn whoami(config: &AppConfig) -> Result<(), AppError> {
    let session = ClientSession::open(config).await?;
    if !session.store.is_authenticated().await {
        output::print_warning("Not signed in");
        return Ok(());
    }

    let result = show_current_user(&session).await;
    session.close().await;
    result
}

async fn show_current_user(session: &ClientSession) -> Result<(), AppError> {
    let client = session.client.clone();
    match session
        .authorized(|token| {
            let client = client.clone();
            async move { client.current_user(&token).await }
        })
        .await
    {
        Ok(user) => session.store.set_user(Some(user)).await?,
        Err(e) if e.kind == ErrorKind::ExternalService => {
            output::print_warning(&format!("Backend unreachable, showing cached profile: {e}"));
        }
        Err(e) => return Err(e),
    }

    print_scope(session).await;
    Ok(())
}

/// Execute the profile command
pub async fn profile(args: &ProfileArgs, config: &AppConfig) -> Result<(), AppError> {
    let session = ClientSession::open(config).await?;
    if !session.store.is_authenticated().await {
        return Err(AppError::session("Not signed in; run `brokle login`"));
    }

    let result = update_profile(&session, args).await;
    session.close().await;
    result
}

async fn update_profile(session: &ClientSession, args: &ProfileArgs) -> Result<(), AppError> {
    let update = ProfileUpdate {
        name: args.name.clone(),
        avatar_url: args.avatar_url.clone(),
    };
    let client = session.client.clone();
    let user = session
        .store
        .apply_profile_update(session.authorized(|token| {
            let client = client.clone();
            let update = update.clone();
            async move { client.update_profile(&token, &update).await }
        }))
        .await?;

    output::print_success(&format!("Profile updated for {}", user.email));
    print_scope(session).await;
    Ok(())
}

/// Execute the logout command
pub async fn logout(config: &AppConfig) -> Result<(), AppError> {
    let session = ClientSession::open(config).await?;
    let location = session.coordinator.logout().await;
    session.close().await;
    let location = location?;
    output::print_success("Signed out");
    output::print_kv("Sign in again at", &location);
    Ok(())
}

async fn print_scope(session: &ClientSession) {
    let state = session.store.snapshot().await;
    if let Some(user) = &state.user {
        output::print_kv("User", &format!("{} <{}>", user.name, user.email));
        output::print_kv("User ID", &user.id);
        output::print_kv("Email verified", &user.is_email_verified.to_string());
    }
    if let Some(org) = &state.organization {
        output::print_kv("Organization", &format!("{} ({})", org.name, org.slug));
    }
    if let Some(project) = &state.current_project {
        output::print_kv("Project", &format!("{} ({})", project.name, project.slug));
    }
    if let Ok(Some(tokens)) = session.tokens.load().await {
        let remaining = tokens.remaining_at(Utc::now()).as_secs();
        output::print_kv(
            "Token expires",
            &format!("{} (in {remaining}s)", tokens.expires_at.to_rfc3339()),
        );
    }
}
