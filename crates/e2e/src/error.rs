//! Error types for E2E testing

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Setup failed: {0}")]
    Setup(String),

    #[error("Backend rejected {operation}: HTTP {status}: {body}")]
    BackendStatus {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("Application not ready at {url} after {attempts} attempts")]
    AppNotReady { url: String, attempts: usize },

    #[error("Application failed to start: {0}")]
    AppStartup(String),

    #[error("Playwright not found. Install with: npm install -D @playwright/test && npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Scenario parse error: {0}")]
    ScenarioParse(String),

    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    #[error("Unknown fixture user: {0}")]
    UnknownUser(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl E2eError {
    /// Whether this error belongs to the environment rather than the
    /// behaviour under test.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            E2eError::Setup(_)
                | E2eError::BackendStatus { .. }
                | E2eError::AppNotReady { .. }
                | E2eError::AppStartup(_)
                | E2eError::PlaywrightNotFound
                | E2eError::UnknownUser(_)
                | E2eError::InvalidConfig(_)
                | E2eError::Io(_)
                | E2eError::Http(_)
        )
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
