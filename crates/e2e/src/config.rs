//! Suite configuration
//!
//! Everything has a default matching the blog application's dev setup
//! (Vite on 5173 proxying `/api` to the backend on 3001), so a missing
//! config file is not an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{E2eError, E2eResult};
use crate::fixtures::Fixtures;
use crate::locator::Target;

/// Top-level configuration for a suite run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Directory for results and failure screenshots
    pub output_dir: PathBuf,

    /// Optional directory of extra YAML scenarios
    pub scenarios_dir: Option<PathBuf>,

    /// Application under test
    pub app: AppConfig,

    /// Browser and timing settings
    pub browser: BrowserConfig,

    /// Accounts seeded before every scenario
    pub fixtures: Fixtures,

    /// UI targets used by helper steps and the built-in catalogue
    pub selectors: Selectors,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("test-results"),
            scenarios_dir: None,
            app: AppConfig::default(),
            browser: BrowserConfig::default(),
            fixtures: Fixtures::default(),
            selectors: Selectors::default(),
        }
    }
}

impl SuiteConfig {
    /// Load configuration from file, falling back to defaults if it is absent
    pub fn load(path: &Path) -> E2eResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> E2eResult<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> E2eResult<()> {
        for url in [&self.app.frontend_url, &self.app.backend_url] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(E2eError::InvalidConfig(format!(
                    "expected an http(s) URL, got {:?}",
                    url
                )));
            }
        }
        if self.fixtures.users.is_empty() {
            return Err(E2eError::InvalidConfig(
                "at least one fixture user is required".to_string(),
            ));
        }
        if self.browser.scenario_timeout_secs == 0 {
            return Err(E2eError::InvalidConfig(
                "scenario_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn screenshot_dir(&self) -> PathBuf {
        self.output_dir.join("screenshots")
    }
}

/// Where the application and its backend live
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root URL the browser navigates to
    pub frontend_url: String,

    /// Backend API root used for seeding accounts
    pub backend_url: String,

    /// Test-support reset endpoint, relative to `frontend_url`
    pub reset_path: String,

    /// Account creation endpoint, relative to `backend_url`
    pub users_path: String,

    /// Absolute URLs polled before a run; empty means the frontend root
    pub readiness_urls: Vec<String>,

    /// Timeout for a single fixture request
    pub request_timeout_ms: u64,

    /// Total time allowed for readiness polling
    pub readiness_timeout_secs: u64,

    /// Optional command that starts the application
    pub process: Option<AppProcessConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            backend_url: "http://localhost:3001".to_string(),
            reset_path: "/api/testing/reset".to_string(),
            users_path: "/api/users".to_string(),
            readiness_urls: Vec::new(),
            request_timeout_ms: 10_000,
            readiness_timeout_secs: 30,
            process: None,
        }
    }
}

impl AppConfig {
    pub fn reset_url(&self) -> String {
        join_url(&self.frontend_url, &self.reset_path)
    }

    pub fn users_url(&self) -> String {
        join_url(&self.backend_url, &self.users_path)
    }

    /// URLs that must answer before scenarios run
    pub fn probe_urls(&self) -> Vec<String> {
        if self.readiness_urls.is_empty() {
            vec![self.frontend_url.clone()]
        } else {
            self.readiness_urls.clone()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_secs(self.readiness_timeout_secs)
    }
}

/// Command used to start the application (e.g. `npm run dev`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppProcessConfig {
    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_secs: u64,
}

fn default_startup_timeout() -> u64 {
    60
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl std::str::FromStr for Browser {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" | "safari" => Ok(Browser::Webkit),
            other => Err(E2eError::InvalidConfig(format!("unknown browser: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Bound on each click/fill
    pub action_timeout_ms: u64,

    /// Bound on each expectation's polling
    pub expect_timeout_ms: u64,

    /// Hard bound on a whole scenario script
    pub scenario_timeout_secs: u64,

    pub node_binary: String,

    /// Directory whose `node_modules` provides `@playwright/test`
    pub work_dir: PathBuf,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            action_timeout_ms: 5_000,
            expect_timeout_ms: 5_000,
            scenario_timeout_secs: 60,
            node_binary: "node".to_string(),
            work_dir: PathBuf::from("."),
        }
    }
}

impl BrowserConfig {
    pub fn scenario_timeout(&self) -> Duration {
        Duration::from_secs(self.scenario_timeout_secs)
    }
}

/// UI targets of the blog application
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// `{name}` is replaced with the user's display name
    pub logged_in_template: String,
    pub login_error_text: String,

    pub login_prompt: Target,
    pub username_label: Target,
    pub password_label: Target,
    pub username_input: Target,
    pub password_input: Target,
    pub login_button: Target,
    pub logout_button: Target,

    /// Toggle that reveals the blog form; `None` if it is always shown
    pub new_blog_button: Option<Target>,
    pub title_input: Target,
    pub author_input: Target,
    pub url_input: Target,
    pub create_button: Target,

    pub view_button: Target,
    pub like_button: Target,
    pub remove_button: Target,
    pub blog_entry: Target,
    pub likes_counter: Target,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            logged_in_template: "{name} is logged in".to_string(),
            login_error_text: "Wrong username or password".to_string(),
            login_prompt: Target::text("Log in to application"),
            username_label: Target::text("username"),
            password_label: Target::text("password"),
            username_input: Target::test_id("username"),
            password_input: Target::test_id("password"),
            login_button: Target::button("login"),
            logout_button: Target::button("Log out"),
            new_blog_button: Some(Target::button("new blog")),
            title_input: Target::test_id("title"),
            author_input: Target::test_id("author"),
            url_input: Target::test_id("url"),
            create_button: Target::button("create"),
            view_button: Target::button("view"),
            like_button: Target::button("like"),
            remove_button: Target::button("remove"),
            blog_entry: Target::test_id("blog"),
            likes_counter: Target::test_id("likes"),
        }
    }
}

impl Selectors {
    pub fn logged_in_text(&self, name: &str) -> String {
        self.logged_in_template.replace("{name}", name)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
