//! Token store: the single source of truth for the session token and the
//! OTP challenge token, plus the reactive authenticated flag derived from
//! session-token presence.

mod backend;

pub use backend::{select_backend, FileStorage, MemoryStorage, StoragePort};

use tokio::sync::watch;

/// Storage key of the session token.
pub const TOKEN_KEY: &str = "auth_token";
/// Storage key of the OTP challenge token issued at login.
pub const OTP_TOKEN_KEY: &str = "otp_token";

pub struct TokenStore {
    backend: Box<dyn StoragePort>,
    authed: watch::Sender<bool>,
}

impl TokenStore {
    pub fn new(backend: Box<dyn StoragePort>) -> Self {
        // The flag is derived from token presence, including tokens left
        // over from a previous session in persistent storage.
        let (authed, _) = watch::channel(backend.get(TOKEN_KEY).is_some());
        Self { backend, authed }
    }

    /// Stores the session token and flips the authenticated flag in the
    /// same call. Overwrites any prior token.
    pub fn set_token(&self, token: &str) {
        self.backend.set(TOKEN_KEY, token);
        self.authed.send_replace(true);
    }

    pub fn token(&self) -> Option<String> {
        self.backend.get(TOKEN_KEY)
    }

    pub fn clear_token(&self) {
        self.backend.remove(TOKEN_KEY);
        self.authed.send_replace(false);
    }

    pub fn set_otp_challenge(&self, token: &str) {
        self.backend.set(OTP_TOKEN_KEY, token);
    }

    pub fn otp_challenge(&self) -> Option<String> {
        self.backend.get(OTP_TOKEN_KEY)
    }

    pub fn clear_otp_challenge(&self) {
        self.backend.remove(OTP_TOKEN_KEY);
    }

    pub fn is_authenticated(&self) -> bool {
        *self.authed.borrow()
    }

    /// Observable view of the authenticated flag. Receivers see every
    /// `set_token`/`clear_token` transition.
    pub fn watch_authenticated(&self) -> watch::Receiver<bool> {
        self.authed.subscribe()
    }
}
