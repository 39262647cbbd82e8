use std::sync::Arc;
use std::time::Instant;

use crate::auth::TokenIssuer;
use crate::config::ServerConfig;
use crate::storage::UserStore;

/// Main application state shared across all handlers.
///
/// Constructed once in `main` and read-only afterwards; the account store is
/// the only collaborator with interior state of its own.
pub struct AppState {
    pub config: ServerConfig,
    pub user_store: Arc<dyn UserStore>,
    pub tokens: TokenIssuer,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: ServerConfig, user_store: Arc<dyn UserStore>) -> Self {
        let tokens = TokenIssuer::new(&config.token_secret);
        Self {
            config,
            user_store,
            tokens,
            start_time: Instant::now(),
        }
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
