//! Scenario runner: backend setup, script execution and result collection

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::app::{wait_for_ready, AppHandle};
use crate::catalogue::blog_app_scenarios;
use crate::config::SuiteConfig;
use crate::error::{E2eError, E2eResult};
use crate::fixtures::BackendClient;
use crate::playwright::{
    strip_ansi, BrowserDriver, NodePlaywright, Phase, ScenarioScript, ScriptBuilder, ScriptEvent,
    ScriptRun,
};
use crate::spec::{Scenario, ScenarioFilter};

/// Extra time the script gets to report its own timeout before the runner
/// gives up on the driver
const DRIVER_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed,
    /// The environment failed before the behaviour could be checked
    SetupError,
}

/// Result of executing a script step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub index: usize,
    pub phase: Phase,
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub title: String,
    pub outcome: Outcome,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
    pub screenshot_path: Option<PathBuf>,
}

impl ScenarioResult {
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }

    fn setup_error(scenario: &Scenario, started: Instant, error: &E2eError) -> Self {
        Self::aborted(scenario, started, Outcome::SetupError, error)
    }

    /// A result for a scenario that stopped without step-level detail
    fn aborted(scenario: &Scenario, started: Instant, outcome: Outcome, error: &E2eError) -> Self {
        Self {
            name: scenario.name.clone(),
            title: scenario.full_title(),
            outcome,
            duration_ms: started.elapsed().as_millis() as u64,
            steps: vec![],
            error: Some(error.to_string()),
            screenshot_path: None,
        }
    }
}

/// Result of running a set of scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

impl SuiteResult {
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }
}

/// Runs scenarios one at a time against the live application
pub struct ScenarioRunner {
    config: SuiteConfig,
    backend: BackendClient,
    driver: Box<dyn BrowserDriver>,
    app: Option<AppHandle>,
}

impl ScenarioRunner {
    /// Create a runner that drives a real browser through node
    pub fn new(config: SuiteConfig) -> E2eResult<Self> {
        let driver = NodePlaywright::new(&config.browser);
        Self::with_driver(config, Box::new(driver))
    }

    /// Create a runner with a custom browser driver
    pub fn with_driver(config: SuiteConfig, driver: Box<dyn BrowserDriver>) -> E2eResult<Self> {
        config.validate()?;
        let backend = BackendClient::new(&config.app)?;
        Ok(Self {
            config,
            backend,
            driver,
            app: None,
        })
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Start the application if a command is configured, then wait for it
    pub async fn start_app(&mut self) -> E2eResult<()> {
        if self.app.is_some() {
            return Ok(());
        }

        match self.config.app.process.clone() {
            Some(process) => {
                self.app = Some(AppHandle::spawn(&process, &self.config.app).await?);
                Ok(())
            }
            None => self.wait_until_ready().await,
        }
    }

    /// Wait until the application answers its readiness probes
    pub async fn wait_until_ready(&self) -> E2eResult<()> {
        wait_for_ready(&self.config.app.probe_urls(), self.config.app.readiness_timeout()).await
    }

    pub fn stop_app(&mut self) -> E2eResult<()> {
        if let Some(mut app) = self.app.take() {
            app.stop()?;
        }
        Ok(())
    }

    /// Built-in scenarios followed by any YAML scenarios from `scenarios_dir`
    pub fn load_scenarios(&self) -> E2eResult<Vec<Scenario>> {
        let mut scenarios = blog_app_scenarios(&self.config.fixtures, &self.config.selectors)?;
        if let Some(dir) = &self.config.scenarios_dir {
            scenarios.extend(Scenario::load_all(dir)?);
        }
        Ok(scenarios)
    }

    /// Run every loaded scenario the filter selects
    pub async fn run_filtered(&self, filter: &ScenarioFilter) -> E2eResult<SuiteResult> {
        let scenarios = filter.apply(self.load_scenarios()?);
        if scenarios.is_empty() {
            return Err(E2eError::ScenarioNotFound(format!("{:?}", filter)));
        }
        Ok(self.run_all(&scenarios).await)
    }

    /// Run scenarios strictly in order; a failure never stops the rest
    pub async fn run_all(&self, scenarios: &[Scenario]) -> SuiteResult {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut results = Vec::with_capacity(scenarios.len());
        let (mut passed, mut failed, mut errored) = (0, 0, 0);

        info!("Running {} scenario(s)...", scenarios.len());

        for scenario in scenarios {
            let result = self.run_scenario(scenario).await;
            match result.outcome {
                Outcome::Passed => {
                    passed += 1;
                    info!("✓ {} ({} ms)", result.title, result.duration_ms);
                }
                Outcome::Failed => {
                    failed += 1;
                    error!(
                        "✗ {} - {}",
                        result.title,
                        result.error.as_deref().unwrap_or("unknown error")
                    );
                }
                Outcome::SetupError => {
                    errored += 1;
                    error!(
                        "! {} - setup error: {}",
                        result.title,
                        result.error.as_deref().unwrap_or("unknown error")
                    );
                }
            }
            results.push(result);
        }

        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Scenario results: {} passed, {} failed, {} setup errors ({} ms)",
            passed, failed, errored, duration_ms
        );

        SuiteResult {
            started_at,
            total: scenarios.len(),
            passed,
            failed,
            errored,
            duration_ms,
            results,
        }
    }

    /// Run one scenario from a freshly reset backend
    pub async fn run_scenario(&self, scenario: &Scenario) -> ScenarioResult {
        let started = Instant::now();
        debug!("Running scenario: {}", scenario.full_title());

        if let Err(e) = self.backend.prepare(&self.config.fixtures).await {
            return ScenarioResult::setup_error(scenario, started, &e);
        }

        let script = match ScriptBuilder::new(&self.config).build(scenario) {
            Ok(script) => script,
            Err(e) => return ScenarioResult::setup_error(scenario, started, &e),
        };

        if let Err(e) = std::fs::create_dir_all(self.config.screenshot_dir()) {
            return ScenarioResult::setup_error(scenario, started, &E2eError::from(e));
        }

        let timeout = self.config.browser.scenario_timeout();
        let budget = timeout + DRIVER_GRACE;
        let run = match tokio::time::timeout(budget, self.driver.run(&script)).await {
            Ok(Ok(run)) => run,
            Ok(Err(e)) if e.is_infrastructure() => {
                return ScenarioResult::setup_error(scenario, started, &e)
            }
            Ok(Err(e)) => crashed_run(e.to_string()),
            Err(_) => {
                let e = E2eError::Timeout(format!(
                    "scenario '{}' exceeded {}s",
                    scenario.name,
                    timeout.as_secs()
                ));
                return ScenarioResult::aborted(scenario, started, Outcome::Failed, &e);
            }
        };

        let mut result = fold_run(scenario, &script, run);
        result.duration_ms = started.elapsed().as_millis() as u64;
        result
    }

    /// Write results to `test-results.json` in the output directory
    pub fn write_results(&self, results: &SuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

impl Drop for ScenarioRunner {
    fn drop(&mut self) {
        let _ = self.stop_app();
    }
}

fn crashed_run(stderr: String) -> ScriptRun {
    ScriptRun {
        success: false,
        events: vec![],
        stdout: String::new(),
        stderr,
    }
}

/// Turn a script's events into a scenario result
pub fn fold_run(scenario: &Scenario, script: &ScenarioScript, run: ScriptRun) -> ScenarioResult {
    let mut steps = Vec::new();
    let mut outcome = Outcome::Passed;
    let mut error = None;
    let mut screenshot_path = None;
    let mut done = false;

    for event in run.events {
        match event {
            ScriptEvent::StepPassed { index, duration_ms } => {
                let Some(step) = script.step(index) else {
                    warn!("Event for unknown step {} in {}", index, script.scenario);
                    continue;
                };
                steps.push(StepResult {
                    index,
                    phase: step.phase,
                    name: step.name.clone(),
                    success: true,
                    duration_ms,
                    error: None,
                });
            }
            ScriptEvent::StepFailed { index, duration_ms, error: message } => {
                let message = strip_ansi(&message);
                let step = usize::try_from(index).ok().and_then(|i| script.step(i));
                match step {
                    Some(step) => {
                        outcome = match step.phase {
                            Phase::Setup => Outcome::SetupError,
                            Phase::Test => Outcome::Failed,
                        };
                        error = Some(format!("{}: {}", step.name, message));
                        steps.push(StepResult {
                            index: step.index,
                            phase: step.phase,
                            name: step.name.clone(),
                            success: false,
                            duration_ms,
                            error: Some(message),
                        });
                    }
                    None => {
                        // Failed before the first step: the browser never came up
                        outcome = Outcome::SetupError;
                        error = Some(format!("browser launch: {}", message));
                    }
                }
            }
            ScriptEvent::TimedOut { index, duration_ms } => {
                let step = usize::try_from(index).ok().and_then(|i| script.step(i));
                let at = step.map(|s| s.name.as_str()).unwrap_or("browser launch");
                outcome = Outcome::Failed;
                error = Some(
                    E2eError::Timeout(format!("scenario '{}' during {}", scenario.name, at))
                        .to_string(),
                );
                if let Some(step) = step {
                    steps.push(StepResult {
                        index: step.index,
                        phase: step.phase,
                        name: step.name.clone(),
                        success: false,
                        duration_ms,
                        error: Some("scenario timed out".to_string()),
                    });
                }
            }
            ScriptEvent::Screenshot { path } => screenshot_path = Some(path),
            ScriptEvent::Done => done = true,
        }
    }

    if outcome == Outcome::Passed {
        if !run.success {
            outcome = Outcome::Failed;
            error = Some(format!(
                "script exited with an error: {}",
                strip_ansi(run.stderr.trim())
            ));
        } else if !done {
            outcome = Outcome::Failed;
            error = Some("script ended before completing all steps".to_string());
        }
    }

    ScenarioResult {
        name: scenario.name.clone(),
        title: scenario.full_title(),
        outcome,
        duration_ms: steps.iter().map(|s| s.duration_ms).sum(),
        steps,
        error,
        screenshot_path,
    }
}
