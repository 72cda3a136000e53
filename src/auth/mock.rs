use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::OsRng;
use rand::{Rng, RngCore};
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::api::{AuthApi, AuthResponse, MessageResponse};
use crate::config::Settings;
use crate::error::AuthError;
use crate::store::TokenStore;

/// Generic forgot-password reply; identical for known and unknown emails so
/// the response never signals whether an account exists.
pub const FORGOT_PASSWORD_MESSAGE: &str = "If the email exists, a reset token has been generated.";
pub const RESET_PASSWORD_MESSAGE: &str = "Password has been reset successfully";

/// The single seeded account the engine operates on. The password is
/// mutable: a successful reset overwrites it.
struct CredentialRecord {
    email: String,
    password: String,
}

struct EngineState {
    account: CredentialRecord,
    current_otp: Option<String>,
    current_challenge: Option<String>,
    /// One active reset token per email; a new forgot-password call
    /// overwrites the previous token.
    reset_tokens: HashMap<String, String>,
}

/// In-memory stand-in for the HTTP auth client, used when no backend is
/// wired up. Satisfies the same contract with the same error shapes, and
/// resolves after a fixed artificial latency so pending states stay
/// realistic.
pub struct MockAuthEngine {
    store: Arc<TokenStore>,
    latency: Duration,
    state: RwLock<EngineState>,
}

impl MockAuthEngine {
    pub fn new(store: Arc<TokenStore>, settings: &Settings) -> Self {
        Self {
            store,
            latency: Duration::from_millis(settings.mock.latency_ms),
            state: RwLock::new(EngineState {
                account: CredentialRecord {
                    email: settings.mock.email.clone(),
                    password: settings.mock.password.clone(),
                },
                current_otp: None,
                current_challenge: None,
                reset_tokens: HashMap::new(),
            }),
        }
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    /// 6 decimal digits, uniform.
    fn random_otp() -> String {
        rand::thread_rng().gen_range(100_000..1_000_000).to_string()
    }

    /// Opaque `prefix_` + 24 base-36 chars from the OS entropy source,
    /// falling back to the thread RNG if that source fails.
    fn random_token(prefix: &str) -> String {
        const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
        let mut bytes = [0u8; 24];
        if OsRng.try_fill_bytes(&mut bytes).is_err() {
            rand::thread_rng().fill_bytes(&mut bytes);
        }
        let body: String = bytes
            .iter()
            .map(|b| ALPHABET[(b % 36) as usize] as char)
            .collect();
        format!("{}_{}", prefix, body)
    }

    /// Diagnostic accessor: the OTP issued by the most recent login, for
    /// demo display and tests. Cleared on successful verification.
    pub async fn issued_otp(&self) -> Option<String> {
        self.state.read().await.current_otp.clone()
    }

    /// Diagnostic accessor: the active reset token for an email, if any.
    pub async fn issued_reset_token(&self, email: &str) -> Option<String> {
        self.state.read().await.reset_tokens.get(email).cloned()
    }
}

#[async_trait]
impl AuthApi for MockAuthEngine {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        self.simulate_latency().await;
        let mut state = self.state.write().await;

        if email != state.account.email || password != state.account.password {
            warn!("Login failed for email: {}", email);
            return Err(AuthError::InvalidCredentials);
        }

        // A new login always starts a fresh challenge, invalidating any
        // previous one still in flight.
        let otp = Self::random_otp();
        let challenge = Self::random_token("otp");
        info!("Issued OTP {} for email: {}", otp, email);

        state.current_otp = Some(otp);
        state.current_challenge = Some(challenge.clone());
        self.store.set_otp_challenge(&challenge);

        Ok(AuthResponse {
            token: None,
            requires_otp: Some(true),
            otp_token: Some(challenge),
        })
    }

    async fn verify_otp(&self, email: &str, otp: &str) -> Result<AuthResponse, AuthError> {
        self.simulate_latency().await;
        let mut state = self.state.write().await;

        let stored = self.store.otp_challenge();
        if stored.is_none() || stored != state.current_challenge {
            return Err(AuthError::InvalidOtpToken);
        }
        if state.current_otp.as_deref() != Some(otp) {
            warn!("OTP mismatch for email: {}", email);
            return Err(AuthError::InvalidOtpCode);
        }

        let token = Self::random_token("jwt");
        self.store.set_token(&token);

        // Challenge is single-use
        state.current_otp = None;
        state.current_challenge = None;
        self.store.clear_otp_challenge();

        info!("OTP verified for email: {}", email);
        Ok(AuthResponse {
            token: Some(token),
            requires_otp: None,
            otp_token: None,
        })
    }

    async fn forgot_password(&self, email: &str) -> Result<MessageResponse, AuthError> {
        self.simulate_latency().await;
        let mut state = self.state.write().await;

        // A token is only ever minted for the seeded account, so a token
        // for an unknown email simply never exists. The reply is the same
        // either way.
        if email == state.account.email {
            let token = Self::random_token("reset");
            info!("Issued reset token {} for email: {}", token, email);
            state.reset_tokens.insert(email.to_string(), token);
        }

        Ok(MessageResponse {
            message: FORGOT_PASSWORD_MESSAGE.to_string(),
        })
    }

    async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<MessageResponse, AuthError> {
        self.simulate_latency().await;
        let mut state = self.state.write().await;

        let matched = state
            .reset_tokens
            .iter()
            .find(|(_, t)| t.as_str() == token)
            .map(|(email, _)| email.clone());

        let Some(email) = matched else {
            return Err(AuthError::InvalidResetToken);
        };

        if email == state.account.email {
            state.account.password = new_password.to_string();
        }
        // Consume the token; a second attempt with it fails with 400.
        state.reset_tokens.remove(&email);

        info!("Password reset completed for email: {}", email);
        Ok(MessageResponse {
            message: RESET_PASSWORD_MESSAGE.to_string(),
        })
    }

    fn logout(&self) {
        self.store.clear_token();
        self.store.clear_otp_challenge();
        info!("Logged out, tokens cleared");
    }

    fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }
}
