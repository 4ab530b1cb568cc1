//! Backend fixtures - resetting state and seeding accounts over HTTP

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::error::{E2eError, E2eResult};

/// An account created through the backend API before each scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSeed {
    pub name: String,
    pub username: String,
    pub password: String,
}

impl UserSeed {
    pub fn new(name: &str, username: &str, password: &str) -> Self {
        Self {
            name: name.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

/// The known accounts every scenario starts with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixtures {
    pub users: Vec<UserSeed>,
}

impl Default for Fixtures {
    fn default() -> Self {
        Self {
            users: vec![
                UserSeed::new("mixxo", "mixxo", "123456"),
                UserSeed::new("toto", "toto", "123456"),
            ],
        }
    }
}

impl Fixtures {
    pub fn user(&self, username: &str) -> E2eResult<&UserSeed> {
        self.users
            .iter()
            .find(|u| u.username == username)
            .ok_or_else(|| E2eError::UnknownUser(username.to_string()))
    }

    /// The account that creates content in the catalogue
    pub fn owner(&self) -> E2eResult<&UserSeed> {
        self.users
            .first()
            .ok_or_else(|| E2eError::InvalidConfig("no fixture users".to_string()))
    }

    /// A second account, used where a scenario needs a non-owner
    pub fn other(&self) -> E2eResult<&UserSeed> {
        self.users.get(1).ok_or_else(|| {
            E2eError::InvalidConfig("a second fixture user is required".to_string())
        })
    }
}

/// HTTP client for the application's test-support and user endpoints
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    reset_url: String,
    users_url: String,
}

impl BackendClient {
    pub fn new(config: &AppConfig) -> E2eResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            reset_url: config.reset_url(),
            users_url: config.users_url(),
        })
    }

    /// Clear all persisted application state
    pub async fn reset(&self) -> E2eResult<()> {
        debug!("POST {}", self.reset_url);
        let resp = self
            .client
            .post(&self.reset_url)
            .send()
            .await
            .map_err(|e| E2eError::Setup(format!("reset request failed: {}", e)))?;

        check_status(resp, "reset").await
    }

    /// Create one account
    pub async fn create_user(&self, user: &UserSeed) -> E2eResult<()> {
        debug!("POST {} ({})", self.users_url, user.username);
        let resp = self
            .client
            .post(&self.users_url)
            .json(user)
            .send()
            .await
            .map_err(|e| {
                E2eError::Setup(format!("create user {} failed: {}", user.username, e))
            })?;

        check_status(resp, &format!("create user {}", user.username)).await
    }

    /// Reset, then seed every fixture account in order
    pub async fn prepare(&self, fixtures: &Fixtures) -> E2eResult<()> {
        self.reset().await?;
        for user in &fixtures.users {
            self.create_user(user).await?;
        }
        info!("Backend reset and seeded with {} user(s)", fixtures.users.len());
        Ok(())
    }
}

async fn check_status(resp: reqwest::Response, operation: &str) -> E2eResult<()> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }

    let body = resp.text().await.unwrap_or_default();
    Err(E2eError::BackendStatus {
        operation: operation.to_string(),
        status: status.as_u16(),
        body,
    })
}
