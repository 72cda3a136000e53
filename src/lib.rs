pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod store;

use std::sync::Arc;

use tracing::info;

pub use error::{AppError, AuthError};
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use auth::{AuthApi, AuthResponse, HttpAuthClient, MessageResponse, MockAuthEngine};
pub use guard::{AuthGuard, RouteDecision};
pub use store::{MemoryStorage, StoragePort, TokenStore};

/// Application state shared across all components.
///
/// Constructed once per process and passed by reference; there is no
/// ambient global state. Which auth implementation backs `auth` is decided
/// here, at construction time, from configuration.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub store: Arc<TokenStore>,
    pub auth: Arc<dyn AuthApi>,
}

impl AppState {
    pub fn new(config: Settings) -> Result<Self> {
        let store = Arc::new(TokenStore::new(store::select_backend(&config)));

        let auth: Arc<dyn AuthApi> = if config.auth.use_mock {
            info!("Mock auth engine selected");
            Arc::new(MockAuthEngine::new(store.clone(), &config))
        } else {
            info!("HTTP auth client selected, base url: {}", config.api.base_url);
            Arc::new(HttpAuthClient::new(store.clone(), &config)?)
        };

        Ok(Self {
            config: Arc::new(config),
            store,
            auth,
        })
    }

    /// Guard wired to this state's auth implementation and login path.
    pub fn guard(&self) -> AuthGuard {
        AuthGuard::new(self.auth.clone(), self.config.auth.login_path.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_app_state_selects_mock_engine() {
        let config = Settings::new_for_test().expect("Failed to load test config");
        let state = AppState::new(config).expect("Failed to build app state");

        assert!(!state.auth.is_authenticated());

        // The mock engine answers for the seeded account without a backend
        let res = state
            .auth
            .login("demo@example.com", "Password123")
            .await
            .expect("login");
        assert_eq!(res.requires_otp, Some(true));
    }

    #[tokio::test]
    async fn test_app_state_selects_http_client() {
        let mut config = Settings::new_for_test().expect("Failed to load test config");
        config.auth.use_mock = false;
        // Nothing listens here; construction alone must still succeed
        config.api.base_url = "http://127.0.0.1:1".to_string();

        let state = AppState::new(config).expect("Failed to build app state");
        assert!(!state.auth.is_authenticated());
        assert_eq!(state.guard().check(), RouteDecision::Redirect("/auth/login".to_string()));
    }

    #[test]
    fn test_app_state_clone_shares_state() {
        let config = Settings::new_for_test().expect("Failed to load test config");
        let state = AppState::new(config).expect("Failed to build app state");
        let cloned = state.clone();

        // Verify Arc references are shared
        assert!(Arc::ptr_eq(&state.config, &cloned.config));
        assert!(Arc::ptr_eq(&state.store, &cloned.store));
        assert!(Arc::ptr_eq(&state.auth, &cloned.auth));
    }
}
