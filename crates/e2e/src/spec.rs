//! Scenario model and declarative YAML scenarios

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{E2eError, E2eResult};
use crate::locator::Target;

/// Separator used when joining a scenario's group path and name
pub const TITLE_SEPARATOR: &str = " › ";

/// One self-contained behavioural test case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique name for this scenario
    pub name: String,

    /// Enclosing groups, outermost first
    #[serde(default)]
    pub group: Vec<String>,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering
    #[serde(default)]
    pub tags: Vec<String>,

    /// Fixture user logged in as part of setup
    #[serde(default)]
    pub login_as: Option<String>,

    /// Steps to execute in order
    pub steps: Vec<Step>,
}

/// A single step in a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Navigate to a path relative to the frontend root (the root if absent)
    Navigate {
        #[serde(default)]
        path: Option<String>,
    },

    /// Click an element, optionally accepting the dialog it raises
    Click {
        target: Target,
        #[serde(default)]
        accept_dialog: bool,
    },

    /// Fill an input field
    Fill { target: Target, value: String },

    /// Fill the login form and submit it
    Login { username: String, password: String },

    /// Click the log out button
    Logout,

    /// Open the blog form, submit it, and wait for the new entry
    CreateBlog {
        title: String,
        author: String,
        url: String,
    },

    /// Wait until the target is visible
    ExpectVisible { target: Target },

    /// Wait until the target is hidden or detached
    ExpectHidden { target: Target },

    /// Wait until the target's full text equals `text`
    ExpectText { target: Target, text: String },

    /// Wait until the target resolves to `count` elements
    ExpectCount { target: Target, count: usize },

    /// Capture a full-page screenshot
    Screenshot { name: String },

    /// Log a message (for debugging)
    Log { message: String },
}

impl Step {
    pub fn click(target: Target) -> Self {
        Step::Click { target, accept_dialog: false }
    }

    /// Click and accept the confirmation dialog the click raises
    pub fn click_and_accept(target: Target) -> Self {
        Step::Click { target, accept_dialog: true }
    }

    pub fn fill(target: Target, value: &str) -> Self {
        Step::Fill { target, value: value.to_string() }
    }

    pub fn login(username: &str, password: &str) -> Self {
        Step::Login {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    pub fn create_blog(title: &str, author: &str, url: &str) -> Self {
        Step::CreateBlog {
            title: title.to_string(),
            author: author.to_string(),
            url: url.to_string(),
        }
    }

    pub fn expect_visible(target: Target) -> Self {
        Step::ExpectVisible { target }
    }

    pub fn expect_hidden(target: Target) -> Self {
        Step::ExpectHidden { target }
    }

    pub fn expect_text(target: Target, text: &str) -> Self {
        Step::ExpectText { target, text: text.to_string() }
    }

    /// Short name used in logs and results
    pub fn describe(&self) -> String {
        match self {
            Step::Navigate { path } => format!("navigate:{}", path.as_deref().unwrap_or("/")),
            Step::Click { target, accept_dialog: true } => format!("click+accept:{}", target),
            Step::Click { target, .. } => format!("click:{}", target),
            Step::Fill { target, .. } => format!("fill:{}", target),
            Step::Login { username, .. } => format!("login:{}", username),
            Step::Logout => "logout".to_string(),
            Step::CreateBlog { title, .. } => format!("create_blog:{}", title),
            Step::ExpectVisible { target } => format!("expect_visible:{}", target),
            Step::ExpectHidden { target } => format!("expect_hidden:{}", target),
            Step::ExpectText { target, text } => format!("expect_text:{}={:?}", target, text),
            Step::ExpectCount { target, count } => format!("expect_count:{}={}", target, count),
            Step::Screenshot { name } => format!("screenshot:{}", name),
            Step::Log { message } => {
                format!("log:{}", message.chars().take(30).collect::<String>())
            }
        }
    }
}

impl Scenario {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            group: Vec::new(),
            description: String::new(),
            tags: Vec::new(),
            login_as: None,
            steps: Vec::new(),
        }
    }

    pub fn in_group(mut self, group: &[&str]) -> Self {
        self.group = group.iter().map(|g| g.to_string()).collect();
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    pub fn logged_in_as(mut self, username: &str) -> Self {
        self.login_as = Some(username.to_string());
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Group path and name, e.g. `Blog app › Login › succeeds with correct credentials`
    pub fn full_title(&self) -> String {
        self.group
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.name.as_str()))
            .collect::<Vec<_>>()
            .join(TITLE_SEPARATOR)
    }

    /// Parse a scenario from YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let scenario: Self = serde_yaml::from_str(yaml)?;
        if scenario.steps.is_empty() && scenario.login_as.is_none() {
            return Err(E2eError::ScenarioParse(format!(
                "scenario '{}' has no steps",
                scenario.name
            )));
        }
        Ok(scenario)
    }

    /// Parse a scenario from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|e| {
            E2eError::ScenarioParse(format!("{}: {}", path.display(), e))
        })
    }

    /// Load all scenarios from a directory, sorted by path
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut paths: Vec<_> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
            .map(|e| e.into_path())
            .collect();
        paths.sort();

        paths.iter().map(|p| Self::from_file(p)).collect()
    }
}

/// Selects which scenarios run
#[derive(Debug, Clone, Default)]
pub struct ScenarioFilter {
    /// Exact scenario name
    pub name: Option<String>,

    /// Tag or group name
    pub tag: Option<String>,

    /// Pattern matched against the full title
    pub grep: Option<Regex>,
}

impl ScenarioFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    pub fn grep(mut self, pattern: &str) -> E2eResult<Self> {
        self.grep = Some(Regex::new(pattern)?);
        Ok(self)
    }

    pub fn matches(&self, scenario: &Scenario) -> bool {
        if let Some(name) = &self.name {
            if &scenario.name != name {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !scenario.tags.contains(tag) && !scenario.group.contains(tag) {
                return false;
            }
        }
        if let Some(re) = &self.grep {
            if !re.is_match(&scenario.full_title()) {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, scenarios: Vec<Scenario>) -> Vec<Scenario> {
        scenarios.into_iter().filter(|s| self.matches(s)).collect()
    }
}
