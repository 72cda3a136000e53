//! Authentication module for authgate
//!
//! One contract, two implementations: the HTTP-backed client and the
//! in-memory mock engine, selected at construction time.

mod api;
mod http;
mod mock;

pub use api::{
    AuthApi, AuthResponse, ForgotPasswordRequest, LoginRequest, MessageResponse,
    ResetPasswordRequest, VerifyOtpRequest, FORGOT_PASSWORD_PATH, LOGIN_PATH, RESET_PASSWORD_PATH,
    VERIFY_OTP_PATH,
};
pub use http::HttpAuthClient;
pub use mock::{MockAuthEngine, FORGOT_PASSWORD_MESSAGE, RESET_PASSWORD_MESSAGE};

#[cfg(test)]
pub use api::MockAuthApi;
