//! Keep the stored session alive in the foreground.

use brokle_auth::RefreshState;
use brokle_core::config::AppConfig;
use brokle_core::error::AppError;

use super::session::ClientSession;
use crate::output;

/// Execute the keepalive command. Runs until Ctrl-C or until the session
/// can no longer be renewed.
pub async fn execute(config: &AppConfig) -> Result<(), AppError> {
    let session = ClientSession::open(config).await?;
    let coordinator = session.coordinator.clone();
    let mut states = coordinator.subscribe_state();

    match coordinator.resume().await? {
        RefreshState::Idle => {
            output::print_warning("No stored session; run `brokle login` first");
            session.close().await;
            return Ok(());
        }
        RefreshState::Expired { redirect, .. } => {
            session.close().await;
            return Err(AppError::session(format!(
                "Session could not be renewed; sign in again ({redirect})"
            )));
        }
        state => report(&state),
    }
    states.mark_unchanged();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let result = loop {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let state = states.borrow_and_update().clone();
                match state {
                    RefreshState::Expired { reason, redirect } => {
                        break Err(AppError::session(format!(
                            "Session ended ({reason}); sign in again ({redirect})"
                        )));
                    }
                    RefreshState::Idle => {
                        output::print_warning("Session closed");
                        break Ok(());
                    }
                    state => report(&state),
                }
            }
            _ = &mut ctrl_c => {
                tracing::info!("Interrupted; leaving stored session in place");
                break Ok(());
            }
        }
    };

    session.close().await;
    result
}

fn report(state: &RefreshState) {
    match state {
        RefreshState::Scheduled { expires_at, fires_at } => {
            output::print_success("Session active");
            output::print_kv("Token expires", &expires_at.to_rfc3339());
            output::print_kv("Next renewal", &fires_at.to_rfc3339());
        }
        other => tracing::debug!(state = other.as_str(), "Refresh state changed"),
    }
}
