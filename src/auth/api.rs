use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

pub const LOGIN_PATH: &str = "/auth/login";
pub const VERIFY_OTP_PATH: &str = "/auth/verify-otp";
pub const FORGOT_PASSWORD_PATH: &str = "/auth/forgot-password";
pub const RESET_PASSWORD_PATH: &str = "/auth/reset-password";

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
    pub otp_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

/// Login/verify result. A direct login carries `token`; a login that needs
/// a second factor carries `requires_otp` plus the challenge token instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_otp: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Error body returned by the backend on failure responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: String,
}

/// The auth contract satisfied identically by the HTTP client and the mock
/// engine. Callers are insulated from which implementation is active; the
/// choice is made once at construction time.
///
/// `logout` and `is_authenticated` are synchronous and infallible: they only
/// touch the token store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError>;

    async fn verify_otp(&self, email: &str, otp: &str) -> Result<AuthResponse, AuthError>;

    async fn forgot_password(&self, email: &str) -> Result<MessageResponse, AuthError>;

    async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<MessageResponse, AuthError>;

    fn logout(&self);

    fn is_authenticated(&self) -> bool;
}
