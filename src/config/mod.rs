use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use url::Url;

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Selects the in-memory mock engine instead of the HTTP client.
    pub use_mock: bool,
    /// Where the guard sends unauthenticated navigations.
    pub login_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MockConfig {
    pub email: String,
    pub password: String,
    pub latency_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Path of the token file. Empty means in-memory tokens only.
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: String,
    pub api: ApiConfig,
    pub auth: AuthConfig,
    pub mock: MockConfig,
    pub storage: StorageConfig,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start with default values
            .set_default("environment", "development")?
            .set_default("api.base_url", "http://localhost:3001")?
            .set_default("api.timeout_secs", 10)?
            .set_default("auth.use_mock", true)?
            .set_default("auth.login_path", "/auth/login")?
            .set_default("mock.email", "demo@example.com")?
            .set_default("mock.password", "Password123")?
            .set_default("mock.latency_ms", 500)?
            .set_default("storage.path", "")?
            // Add in settings from the config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in settings from environment variables (with prefix "APP_")
            // E.g., `APP_API__BASE_URL=https://api.example.com` would set `Settings.api.base_url`
            .add_source(
                Environment::with_prefix("app")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = s.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Settings for tests and demos: mock engine, zero latency, memory-only
    /// token storage.
    pub fn new_for_test() -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .set_default("environment", "test")?
            .set_default("api.base_url", "http://localhost:3001")?
            .set_default("api.timeout_secs", 2)?
            .set_default("auth.use_mock", true)?
            .set_default("auth.login_path", "/auth/login")?
            .set_default("mock.email", "demo@example.com")?
            .set_default("mock.password", "Password123")?
            .set_default("mock.latency_ms", 0)?
            .set_default("storage.path", "")?
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.api.base_url).map_err(|e| {
            ConfigError::Message(format!("invalid api.base_url {:?}: {}", self.api.base_url, e))
        })?;
        Ok(())
    }
}
