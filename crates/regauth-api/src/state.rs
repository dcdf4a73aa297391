//! Application state management

use crate::auth::AccountService;
use regauth_core::{AppConfig, TokenError, TokenManager, UserStore};
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
///
/// Built once at startup and never mutated afterwards.
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Token issuance and validation
    pub tokens: TokenManager,
    /// User document store
    pub store: Arc<dyn UserStore>,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: AppConfig, tokens: TokenManager, store: Arc<dyn UserStore>) -> Self {
        Self {
            config,
            tokens,
            store,
            start_time: Instant::now(),
        }
    }

    /// Build state from configuration, refusing an empty signing secret
    pub fn from_config(config: AppConfig, store: Arc<dyn UserStore>) -> Result<Self, TokenError> {
        let tokens = TokenManager::try_new(&config.auth.jwt_secret)?;
        Ok(Self::new(config, tokens, store))
    }

    /// Account service over this state's collaborators
    pub fn accounts(&self) -> AccountService {
        AccountService::new(self.store.clone(), self.tokens.clone())
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regauth_core::MemoryUserStore;

    fn memory_store() -> Arc<dyn UserStore> {
        Arc::new(MemoryUserStore::new())
    }

    #[test]
    fn test_from_config_requires_secret() {
        let config = AppConfig::default();
        assert!(matches!(
            AppState::from_config(config, memory_store()),
            Err(TokenError::Config)
        ));
    }

    #[test]
    fn test_from_config_with_secret() {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "state-secret".to_string();

        let state = AppState::from_config(config, memory_store()).unwrap();
        assert!(state.tokens.is_configured());
    }
}
