use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, info};
use url::Url;

use super::api::{
    AuthApi, AuthResponse, ErrorBody, ForgotPasswordRequest, LoginRequest, MessageResponse,
    ResetPasswordRequest, VerifyOtpRequest, FORGOT_PASSWORD_PATH, LOGIN_PATH, RESET_PASSWORD_PATH,
    VERIFY_OTP_PATH,
};
use crate::config::Settings;
use crate::error::{AppError, AuthError};
use crate::store::TokenStore;

/// Backend failure before per-operation error mapping.
enum ApiFailure {
    Status(u16, String),
    Transport(String),
}

/// HTTP-backed auth client. Translates the auth operations into POSTs
/// against the backend and updates the token store on success.
pub struct HttpAuthClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<TokenStore>,
}

impl HttpAuthClient {
    pub fn new(store: Arc<TokenStore>, settings: &Settings) -> Result<Self, AppError> {
        let base = Url::parse(&settings.api.base_url)
            .map_err(|e| AppError::Config(format!("invalid api.base_url: {}", e)))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.api.timeout_secs))
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base.as_str().trim_end_matches('/').to_string(),
            store,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiFailure>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let res = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiFailure::Transport(e.to_string()))?;

        let status = res.status();
        if status.is_success() {
            res.json::<T>()
                .await
                .map_err(|e| ApiFailure::Transport(e.to_string()))
        } else {
            let message = res
                .json::<ErrorBody>()
                .await
                .map(|b| b.message)
                .unwrap_or_else(|_| status.to_string());
            error!("POST {} failed: {} {}", url, status.as_u16(), message);
            Err(ApiFailure::Status(status.as_u16(), message))
        }
    }
}

// Statuses outside the contract table fold into Transport so the taxonomy
// stays closed.
fn unexpected(status: u16, message: String) -> AuthError {
    AuthError::Transport(format!("unexpected status {}: {}", status, message))
}

fn login_failure(f: ApiFailure) -> AuthError {
    match f {
        ApiFailure::Status(401, _) => AuthError::InvalidCredentials,
        ApiFailure::Status(status, message) => unexpected(status, message),
        ApiFailure::Transport(message) => AuthError::Transport(message),
    }
}

fn verify_failure(f: ApiFailure) -> AuthError {
    match f {
        ApiFailure::Status(400, _) => AuthError::InvalidOtpToken,
        ApiFailure::Status(401, _) => AuthError::InvalidOtpCode,
        ApiFailure::Status(status, message) => unexpected(status, message),
        ApiFailure::Transport(message) => AuthError::Transport(message),
    }
}

fn reset_failure(f: ApiFailure) -> AuthError {
    match f {
        ApiFailure::Status(400, _) => AuthError::InvalidResetToken,
        ApiFailure::Status(status, message) => unexpected(status, message),
        ApiFailure::Transport(message) => AuthError::Transport(message),
    }
}

fn transport_only(f: ApiFailure) -> AuthError {
    match f {
        ApiFailure::Status(status, message) => unexpected(status, message),
        ApiFailure::Transport(message) => AuthError::Transport(message),
    }
}

#[async_trait]
impl AuthApi for HttpAuthClient {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        info!("Login request for email: {}", email);
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let res: AuthResponse = self
            .post_json(LOGIN_PATH, &body)
            .await
            .map_err(login_failure)?;

        if res.requires_otp.unwrap_or(false) {
            if let Some(otp_token) = &res.otp_token {
                self.store.set_otp_challenge(otp_token);
                info!("OTP required for email: {}", email);
            }
        }
        if let Some(token) = &res.token {
            self.store.set_token(token);
            info!("Login successful for email: {}", email);
        }
        Ok(res)
    }

    async fn verify_otp(&self, email: &str, otp: &str) -> Result<AuthResponse, AuthError> {
        // The challenge stored at login correlates this attempt; the backend
        // rejects a missing or stale one with 400.
        let otp_token = self.store.otp_challenge().unwrap_or_default();
        let body = VerifyOtpRequest {
            email: email.to_string(),
            otp: otp.to_string(),
            otp_token,
        };
        let res: AuthResponse = self
            .post_json(VERIFY_OTP_PATH, &body)
            .await
            .map_err(verify_failure)?;

        if let Some(token) = &res.token {
            self.store.set_token(token);
            self.store.clear_otp_challenge();
            info!("OTP verified for email: {}", email);
        }
        Ok(res)
    }

    async fn forgot_password(&self, email: &str) -> Result<MessageResponse, AuthError> {
        info!("Forgot-password request for email: {}", email);
        let body = ForgotPasswordRequest {
            email: email.to_string(),
        };
        self.post_json(FORGOT_PASSWORD_PATH, &body)
            .await
            .map_err(transport_only)
    }

    async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<MessageResponse, AuthError> {
        let body = ResetPasswordRequest {
            token: token.to_string(),
            password: new_password.to_string(),
        };
        self.post_json(RESET_PASSWORD_PATH, &body)
            .await
            .map_err(reset_failure)
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
