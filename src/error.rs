use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Configuration error: {0}")]
    Config(String),
}

// Implement conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

/// Errors surfaced by both auth implementations.
///
/// Each variant carries the HTTP-like status the backend contract uses for
/// it; `Transport` covers unreachable-backend failures and reports status 0.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing or invalid OTP token")]
    InvalidOtpToken,

    #[error("Invalid OTP")]
    InvalidOtpCode,

    #[error("Invalid or expired token")]
    InvalidResetToken,

    #[error("Transport error: {0}")]
    Transport(String),
}

impl AuthError {
    pub fn status(&self) -> u16 {
        match self {
            AuthError::InvalidCredentials | AuthError::InvalidOtpCode => 401,
            AuthError::InvalidOtpToken | AuthError::InvalidResetToken => 400,
            AuthError::Transport(_) => 0,
        }
    }
}
