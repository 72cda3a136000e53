//! Route guard: the navigation predicate in front of protected views.

use std::sync::Arc;

use tracing::info;

use crate::auth::AuthApi;

/// Outcome of a guarded navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    /// Entry denied; the view layer should navigate to the given path.
    Redirect(String),
}

/// Gates entry into protected routes. Read-only over the auth contract:
/// the redirect is its only side effect.
pub struct AuthGuard {
    auth: Arc<dyn AuthApi>,
    login_path: String,
}

impl AuthGuard {
    pub fn new(auth: Arc<dyn AuthApi>, login_path: impl Into<String>) -> Self {
        Self {
            auth,
            login_path: login_path.into(),
        }
    }

    pub fn check(&self) -> RouteDecision {
        if self.auth.is_authenticated() {
            RouteDecision::Allow
        } else {
            info!("Unauthenticated navigation, redirecting to {}", self.login_path);
            RouteDecision::Redirect(self.login_path.clone())
        }
    }
}
