//! Playwright browser automation
//!
//! Each scenario becomes one Node script driving a single browser page, so
//! session state (cookies, local storage) carries from step to step. The
//! script reports progress on stdout as `@@e2e {json}` lines which the runner
//! folds back into step results.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::process::Command as TokioCommand;
use tracing::{debug, warn};

use crate::config::{BrowserConfig, Selectors, SuiteConfig};
use crate::error::{E2eError, E2eResult};
use crate::fixtures::Fixtures;
use crate::locator::{js_str, Target};
use crate::spec::{Scenario, Step};

/// Prefix of every machine-readable line the script prints
pub const EVENT_PREFIX: &str = "@@e2e ";

static ANSI_ESCAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("static regex is valid")
});

/// Whether a step prepares the scenario or exercises the behaviour under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Setup,
    Test,
}

/// A step as laid out in a generated script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptStep {
    pub index: usize,
    pub phase: Phase,
    pub name: String,
}

/// A generated Playwright script for one scenario
#[derive(Debug, Clone)]
pub struct ScenarioScript {
    pub scenario: String,
    pub source: String,
    pub steps: Vec<ScriptStep>,
    /// Where the script saves a screenshot if a step fails
    pub failure_screenshot: PathBuf,
}

impl ScenarioScript {
    pub fn step(&self, index: usize) -> Option<&ScriptStep> {
        self.steps.get(index)
    }

    pub fn setup_len(&self) -> usize {
        self.steps.iter().filter(|s| s.phase == Phase::Setup).count()
    }
}

/// Progress reported by a running script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptEvent {
    StepPassed {
        index: usize,
        duration_ms: u64,
    },
    /// `index` is -1 when the browser itself failed to start
    StepFailed {
        index: i64,
        duration_ms: u64,
        error: String,
    },
    /// The scenario ran out of time while `index` was running
    TimedOut {
        index: i64,
        duration_ms: u64,
    },
    Screenshot {
        path: PathBuf,
    },
    Done,
}

/// Extract events from script stdout, ignoring unrelated output
pub fn parse_events(stdout: &str) -> Vec<ScriptEvent> {
    stdout
        .lines()
        .filter_map(|line| line.trim_end().strip_prefix(EVENT_PREFIX))
        .filter_map(|payload| match serde_json::from_str(payload) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!("Ignoring malformed script event {:?}: {}", payload, e);
                None
            }
        })
        .collect()
}

/// Remove terminal colour codes Playwright puts in assertion messages
pub fn strip_ansi(text: &str) -> String {
    ANSI_ESCAPE.replace_all(text, "").into_owned()
}

/// Turns scenarios into Playwright scripts
pub struct ScriptBuilder<'a> {
    frontend_url: &'a str,
    browser: &'a BrowserConfig,
    fixtures: &'a Fixtures,
    ui: &'a Selectors,
    screenshot_dir: PathBuf,
}

impl<'a> ScriptBuilder<'a> {
    pub fn new(config: &'a SuiteConfig) -> Self {
        Self {
            frontend_url: &config.app.frontend_url,
            browser: &config.browser,
            fixtures: &config.fixtures,
            ui: &config.selectors,
            screenshot_dir: config.screenshot_dir(),
        }
    }

    /// Setup steps every scenario starts with: open the app root and, for
    /// logged-in scenarios, sign in as the fixture user.
    fn setup_steps(&self, scenario: &Scenario) -> E2eResult<Vec<Step>> {
        let mut steps = vec![Step::Navigate { path: None }];
        if let Some(username) = &scenario.login_as {
            let user = self.fixtures.user(username)?;
            steps.push(Step::login(&user.username, &user.password));
        }
        Ok(steps)
    }

    /// Build the full script for a scenario
    pub fn build(&self, scenario: &Scenario) -> E2eResult<ScenarioScript> {
        let setup = self.setup_steps(scenario)?;
        let failure_screenshot = self
            .screenshot_dir
            .join(format!("{}-failure.png", slug(&scenario.full_title())));

        let planned: Vec<(Phase, &Step)> = setup
            .iter()
            .map(|s| (Phase::Setup, s))
            .chain(scenario.steps.iter().map(|s| (Phase::Test, s)))
            .collect();

        let mut script = self.header(scenario, &failure_screenshot);
        let mut steps = Vec::with_capacity(planned.len());

        for (index, (phase, step)) in planned.into_iter().enumerate() {
            let name = step.describe();
            let phase_label = match phase {
                Phase::Setup => "setup",
                Phase::Test => "test",
            };
            script.push_str(&format!(
                "\n    // Step {} [{}]: {}\n    await step({}, async () => {{\n",
                index,
                phase_label,
                comment_safe(&name),
                index
            ));
            for line in self.step_to_js(step) {
                script.push_str("      ");
                script.push_str(&line);
                script.push('\n');
            }
            script.push_str("    });\n");

            steps.push(ScriptStep { index, phase, name });
        }

        script.push_str(&self.footer(&failure_screenshot));

        Ok(ScenarioScript {
            scenario: scenario.full_title(),
            source: script,
            steps,
            failure_screenshot,
        })
    }

    fn header(&self, scenario: &Scenario, screenshot: &Path) -> String {
        format!(
            r#"// Scenario: {title}
const report = (event) => console.log({prefix} + JSON.stringify(event));

(async () => {{
  let browser;
  let page;
  let current = -1;
  let startedAt = Date.now();

  const step = async (index, body) => {{
    current = index;
    startedAt = Date.now();
    await body();
    report({{ kind: 'step_passed', index, duration_ms: Date.now() - startedAt }});
  }};

  const watchdog = setTimeout(async () => {{
    report({{ kind: 'timed_out', index: current, duration_ms: Date.now() - startedAt }});
    if (page) {{
      try {{
        await page.screenshot({{ path: {shot}, fullPage: true, timeout: 1000 }});
        report({{ kind: 'screenshot', path: {shot} }});
      }} catch (_) {{}}
    }}
    process.exit(1);
  }}, {scenario_timeout});

  try {{
    const {{ chromium, firefox, webkit, expect }} = require('@playwright/test');
    browser = await {browser}.launch({{ headless: {headless} }});
    const context = await browser.newContext({{
      viewport: {{ width: {width}, height: {height} }}
    }});
    page = await context.newPage();
    page.setDefaultTimeout({action_timeout});
"#,
            title = comment_safe(&scenario.full_title()),
            prefix = js_str(EVENT_PREFIX),
            shot = js_str(&screenshot.to_string_lossy()),
            scenario_timeout = self.browser.scenario_timeout().as_millis(),
            browser = self.browser.browser.as_str(),
            headless = self.browser.headless,
            width = self.browser.viewport_width,
            height = self.browser.viewport_height,
            action_timeout = self.browser.action_timeout_ms,
        )
    }

    fn footer(&self, screenshot: &Path) -> String {
        let shot = js_str(&screenshot.to_string_lossy());
        format!(
            r#"
    report({{ kind: 'done' }});
  }} catch (error) {{
    report({{
      kind: 'step_failed',
      index: current,
      duration_ms: Date.now() - startedAt,
      error: String((error && error.message) || error),
    }});
    if (page) {{
      try {{
        await page.screenshot({{ path: {shot}, fullPage: true }});
        report({{ kind: 'screenshot', path: {shot} }});
      }} catch (_) {{}}
    }}
    process.exitCode = 1;
  }} finally {{
    clearTimeout(watchdog);
    if (browser) {{
      await browser.close();
    }}
  }}
}})();
"#,
            shot = shot
        )
    }

    /// Playwright statements for one step
    fn step_to_js(&self, step: &Step) -> Vec<String> {
        let ui = self.ui;
        match step {
            Step::Navigate { path } => {
                let url = match path {
                    Some(p) => format!(
                        "{}/{}",
                        self.frontend_url.trim_end_matches('/'),
                        p.trim_start_matches('/')
                    ),
                    None => self.frontend_url.to_string(),
                };
                vec![format!("await page.goto({});", js_str(&url))]
            }
            Step::Click { target, accept_dialog } => {
                let mut lines = Vec::new();
                if *accept_dialog {
                    // Registered before the click so the dialog cannot be missed
                    lines.push("page.once('dialog', (dialog) => dialog.accept());".to_string());
                }
                lines.push(self.click(target));
                lines
            }
            Step::Fill { target, value } => vec![self.fill(target, value)],
            Step::Login { username, password } => vec![
                self.fill(&ui.username_input, username),
                self.fill(&ui.password_input, password),
                self.click(&ui.login_button),
            ],
            Step::Logout => vec![self.click(&ui.logout_button)],
            Step::CreateBlog { title, author, url } => {
                let mut lines = Vec::new();
                if let Some(toggle) = &ui.new_blog_button {
                    lines.push(self.click(toggle));
                }
                lines.push(self.fill(&ui.title_input, title));
                lines.push(self.fill(&ui.author_input, author));
                lines.push(self.fill(&ui.url_input, url));
                lines.push(self.click(&ui.create_button));
                let created = Target::text(format!("{} {}", title, author)).first();
                lines.push(self.expect(&created, "toBeVisible", None));
                lines
            }
            Step::ExpectVisible { target } => vec![self.expect(target, "toBeVisible", None)],
            Step::ExpectHidden { target } => vec![self.expect(target, "toBeHidden", None)],
            Step::ExpectText { target, text } => {
                vec![self.expect(target, "toHaveText", Some(js_str(text)))]
            }
            Step::ExpectCount { target, count } => {
                vec![self.expect(target, "toHaveCount", Some(count.to_string()))]
            }
            Step::Screenshot { name } => {
                let path = self.screenshot_dir.join(format!("{}.png", slug(name)));
                vec![format!(
                    "await page.screenshot({{ path: {}, fullPage: true }});",
                    js_str(&path.to_string_lossy())
                )]
            }
            Step::Log { message } => {
                vec![format!("console.log({});", js_str(&format!("[scenario] {}", message)))]
            }
        }
    }

    fn click(&self, target: &Target) -> String {
        format!(
            "await {}.click({{ timeout: {} }});",
            target.to_js("page"),
            self.browser.action_timeout_ms
        )
    }

    fn fill(&self, target: &Target, value: &str) -> String {
        format!(
            "await {}.fill({}, {{ timeout: {} }});",
            target.to_js("page"),
            js_str(value),
            self.browser.action_timeout_ms
        )
    }

    fn expect(&self, target: &Target, matcher: &str, expected: Option<String>) -> String {
        let timeout = format!("{{ timeout: {} }}", self.browser.expect_timeout_ms);
        let args = match expected {
            Some(expected) => format!("{}, {}", expected, timeout),
            None => timeout,
        };
        format!("await expect({}).{}({});", target.to_js("page"), matcher, args)
    }
}

/// Text for a `//` comment; JavaScript ends a comment at any of these
fn comment_safe(text: &str) -> String {
    text.replace(['\n', '\r', '\u{2028}', '\u{2029}'], " ")
}

/// File-name-safe form of a title
pub fn slug(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut dash = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            dash = false;
        } else if !dash && !out.is_empty() {
            out.push('-');
            dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("scenario");
    }
    out
}

/// Outcome of running one script
#[derive(Debug, Clone)]
pub struct ScriptRun {
    /// Process exit status was zero
    pub success: bool,
    pub events: Vec<ScriptEvent>,
    pub stdout: String,
    pub stderr: String,
}

/// Something that can execute a generated scenario script
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn run(&self, script: &ScenarioScript) -> E2eResult<ScriptRun>;
}

/// Runs scripts with `node` against a local `@playwright/test` install
pub struct NodePlaywright {
    node_binary: String,
    work_dir: PathBuf,
}

impl NodePlaywright {
    pub fn new(config: &BrowserConfig) -> Self {
        Self {
            node_binary: config.node_binary.clone(),
            work_dir: config.work_dir.clone(),
        }
    }

    /// Check if Playwright is installed
    pub fn check_installed(&self) -> E2eResult<()> {
        let output = Command::new("npx")
            .args(["playwright", "--version"])
            .current_dir(&self.work_dir)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }
}

#[async_trait]
impl BrowserDriver for NodePlaywright {
    async fn run(&self, script: &ScenarioScript) -> E2eResult<ScriptRun> {
        // Written next to node_modules so require() resolves @playwright/test
        let mut file = tempfile::Builder::new()
            .prefix(".blogapp-e2e-")
            .suffix(".cjs")
            .tempfile_in(&self.work_dir)?;
        std::io::Write::write_all(&mut file, script.source.as_bytes())?;

        debug!("Running Playwright script: {}", file.path().display());

        let output = TokioCommand::new(&self.node_binary)
            .arg(file.path())
            .current_dir(&self.work_dir)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => E2eError::PlaywrightNotFound,
                _ => E2eError::Playwright(format!("failed to start {}: {}", self.node_binary, e)),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        Ok(ScriptRun {
            success: output.status.success(),
            events: parse_events(&stdout),
            stdout,
            stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::blog_app_scenarios;

    fn catalogue(config: &SuiteConfig) -> Vec<Scenario> {
        blog_app_scenarios(&config.fixtures, &config.selectors).unwrap()
    }

    #[test]
    fn test_setup_steps_for_logged_in_scenario() {
        let config = SuiteConfig::default();
        let scenario = Scenario::new("liked")
            .logged_in_as("mixxo")
            .step(Step::click(Target::button("like")));

        let script = ScriptBuilder::new(&config).build(&scenario).unwrap();
        assert_eq!(script.setup_len(), 2);
        assert_eq!(script.steps.len(), 3);
        assert_eq!(script.steps[0].name, "navigate:/");
        assert_eq!(script.steps[1].name, "login:mixxo");
        assert_eq!(script.steps[2].phase, Phase::Test);
        assert!(script
            .source
            .contains(r#"await page.goto("http://localhost:5173");"#));
        assert!(script.source.contains(
            r#"await page.getByTestId("username").fill("mixxo", { timeout: 5000 });"#
        ));
    }

    #[test]
    fn test_unknown_login_user_is_an_error() {
        let config = SuiteConfig::default();
        let scenario = Scenario::new("x").logged_in_as("ghost").step(Step::Logout);
        assert!(matches!(
            ScriptBuilder::new(&config).build(&scenario),
            Err(E2eError::UnknownUser(_))
        ));
    }

    #[test]
    fn test_dialog_handler_registered_before_click() {
        let config = SuiteConfig::default();
        let scenarios = catalogue(&config);
        let delete = scenarios
            .iter()
            .find(|s| s.name == "the user who added the blog can delete it")
            .unwrap();
        let script = ScriptBuilder::new(&config).build(delete).unwrap();

        let handler = script
            .source
            .find("page.once('dialog', (dialog) => dialog.accept());")
            .unwrap();
        let click = script
            .source
            .find(r#"await page.getByRole("button", { name: "remove" }).click("#)
            .unwrap();
        assert!(handler < click);
    }

    #[test]
    fn test_expectations_carry_timeouts() {
        let mut config = SuiteConfig::default();
        config.browser.expect_timeout_ms = 7000;
        let scenarios = catalogue(&config);
        let liked = scenarios.iter().find(|s| s.name == "a blog can be liked").unwrap();
        let script = ScriptBuilder::new(&config).build(liked).unwrap();

        assert!(script.source.contains(
            r#"await expect(page.getByTestId("likes")).toHaveText("1", { timeout: 7000 });"#
        ));
        assert!(script.source.contains(
            r#"await expect(page.getByText("My own E2E test doko doko").first()).toBeVisible({ timeout: 7000 });"#
        ));
    }

    #[test]
    fn test_create_blog_without_toggle() {
        let mut config = SuiteConfig::default();
        config.selectors.new_blog_button = None;
        let scenario = Scenario::new("create").step(Step::create_blog("T", "A", "U"));
        let script = ScriptBuilder::new(&config).build(&scenario).unwrap();
        assert!(!script.source.contains("new blog"));
        assert!(script
            .source
            .contains(r#"await page.getByRole("button", { name: "create" }).click({ timeout: 5000 });"#));
    }

    #[test]
    fn test_browser_and_viewport() {
        let mut config = SuiteConfig::default();
        config.browser.browser = crate::config::Browser::Firefox;
        config.browser.headless = false;
        config.browser.viewport_width = 1920;
        let scenario = Scenario::new("x").step(Step::Logout);
        let script = ScriptBuilder::new(&config).build(&scenario).unwrap();
        assert!(script.source.contains("await firefox.launch({ headless: false });"));
        assert!(script.source.contains("viewport: { width: 1920, height: 720 }"));
    }

    #[test]
    fn test_failure_screenshot_path() {
        let config = SuiteConfig::default();
        let scenario = Scenario::new("a blog can be liked").in_group(&["Blog app"]);
        let script = ScriptBuilder::new(&config).build(&scenario).unwrap();
        assert_eq!(
            script.failure_screenshot,
            PathBuf::from("test-results/screenshots/blog-app-a-blog-can-be-liked-failure.png")
        );
    }

    #[test]
    fn test_line_terminators_stay_in_comments() {
        let config = SuiteConfig::default();
        let scenario = Scenario::new("odd\u{2028}title here\u{2029}end\rdone")
            .step(Step::create_blog("x\rprocess.exit(0)", "a", "u"));
        let script = ScriptBuilder::new(&config).build(&scenario).unwrap();

        for terminator in ['\r', '\u{2028}', '\u{2029}'] {
            assert!(!script.source.contains(terminator), "{:?}", terminator);
        }
        assert!(script.source.contains("// Scenario: odd title here end done"));
        assert!(script.source.contains("// Step 1 [test]: create_blog:x process.exit(0)"));
        assert!(!script
            .source
            .lines()
            .any(|line| line.trim_start().starts_with("process.exit(0)")));
        assert!(script.source.contains(r#".fill("x\rprocess.exit(0)", "#));
    }

    #[test]
    fn test_playwright_is_required_inside_try() {
        let config = SuiteConfig::default();
        let scenario = Scenario::new("x").step(Step::Logout);
        let script = ScriptBuilder::new(&config).build(&scenario).unwrap();

        assert!(script.source.contains(
            "  try {\n    const { chromium, firefox, webkit, expect } = require('@playwright/test');\n"
        ));
        let require = script.source.find("require('@playwright/test')").unwrap();
        let launch = script.source.find("chromium.launch(").unwrap();
        assert!(require < launch);
    }

    #[test]
    fn test_watchdog_uses_scenario_timeout() {
        let mut config = SuiteConfig::default();
        config.browser.scenario_timeout_secs = 45;
        let scenario = Scenario::new("x").step(Step::Logout);
        let script = ScriptBuilder::new(&config).build(&scenario).unwrap();

        assert!(script.source.contains("kind: 'timed_out'"));
        assert!(script.source.contains("}, 45000);"));
        assert!(script.source.contains("clearTimeout(watchdog);"));
    }

    #[test]
    fn test_parse_events() {
        let stdout = "\
[scenario] hello
@@e2e {\"kind\":\"step_passed\",\"index\":0,\"duration_ms\":12}
@@e2e not json
@@e2e {\"kind\":\"step_failed\",\"index\":1,\"duration_ms\":5000,\"error\":\"Timed out\"}
@@e2e {\"kind\":\"screenshot\",\"path\":\"out/x.png\"}
@@e2e {\"kind\":\"timed_out\",\"index\":2,\"duration_ms\":60000}
";
        let events = parse_events(stdout);
        assert_eq!(
            events,
            vec![
                ScriptEvent::StepPassed { index: 0, duration_ms: 12 },
                ScriptEvent::StepFailed {
                    index: 1,
                    duration_ms: 5000,
                    error: "Timed out".to_string()
                },
                ScriptEvent::Screenshot { path: PathBuf::from("out/x.png") },
                ScriptEvent::TimedOut { index: 2, duration_ms: 60000 },
            ]
        );
    }

    #[test]
    fn test_strip_ansi() {
        let raw = "\u{1b}[2mexpect(\u{1b}[22m\u{1b}[31mlocator\u{1b}[39m).toBeVisible()";
        assert_eq!(strip_ansi(raw), "expect(locator).toBeVisible()");
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Blog app › Login › fails with wrong credentials"),
            "blog-app-login-fails-with-wrong-credentials");
        assert_eq!(slug("›››"), "scenario");
    }
}
