//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use brokle_auth::Gate;
use brokle_core::config::AppConfig;

/// Passed to every handler and middleware via `State<AppState>`.
///
/// The gate is immutable after startup, so requests evaluate it without
/// locking.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Authentication gate
    pub gate: Arc<Gate>,
}

impl AppState {
    /// Builds the state, loading the verification key from configuration.
    pub fn new(config: AppConfig) -> Self {
        let gate = Gate::from_config(&config.routes, &config.auth);
        Self::with_gate(config, gate)
    }

    /// Builds the state around an already constructed gate.
    pub fn with_gate(config: AppConfig, gate: Gate) -> Self {
        Self {
            config: Arc::new(config),
            gate: Arc::new(gate),
        }
    }
}
