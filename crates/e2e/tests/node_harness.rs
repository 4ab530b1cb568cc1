//! Runs generated scripts through real `node` against a stub
//! `@playwright/test`, so the script harness and `NodePlaywright` are
//! exercised without a browser.

mod common;

use std::path::Path;

use blogapp_e2e::config::Selectors;
use blogapp_e2e::playwright::{NodePlaywright, Phase};
use blogapp_e2e::{Outcome, Scenario, ScenarioRunner, Step, SuiteConfig, Target};
use tempfile::TempDir;

use common::{config_for, in_path, spawn_backend, MockBackend};

const PLAYWRIGHT_STUB: &str = include_str!("fixtures/playwright_stub.js");

fn stub_work_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let module = dir.path().join("node_modules").join("@playwright").join("test");
    std::fs::create_dir_all(&module).unwrap();
    std::fs::write(module.join("index.js"), PLAYWRIGHT_STUB).unwrap();
    dir
}

fn node_config(base_url: &str, out: &Path, work_dir: &Path) -> SuiteConfig {
    let mut config = config_for(base_url, out);
    config.browser.work_dir = work_dir.to_path_buf();
    config.browser.scenario_timeout_secs = 20;
    config
}

fn node_runner(config: SuiteConfig) -> ScenarioRunner {
    let driver = NodePlaywright::new(&config.browser);
    ScenarioRunner::with_driver(config, Box::new(driver)).unwrap()
}

fn liked_scenario() -> Scenario {
    Scenario::new("a blog can be liked")
        .in_group(&["Blog app", "Login", "When logged in"])
        .logged_in_as("mixxo")
        .step(Step::create_blog("My own E2E test", "doko doko", "e2e.com"))
        .step(Step::click(Target::button("view")))
        .step(Step::click(Target::button("like")))
        .step(Step::expect_text(Target::test_id("likes"), "1"))
}

#[tokio::test]
async fn passing_script_reports_every_step() {
    if !in_path("node") {
        eprintln!("Skipping: node not available in PATH");
        return;
    }
    let base_url = spawn_backend(MockBackend::default()).await;
    let out = tempfile::tempdir().unwrap();
    let work = stub_work_dir();

    let runner = node_runner(node_config(&base_url, out.path(), work.path()));
    let result = runner.run_scenario(&liked_scenario()).await;

    assert_eq!(result.outcome, Outcome::Passed, "{:?}", result.error);
    assert_eq!(result.steps.len(), 6);
    assert!(result.steps.iter().all(|s| s.success));
    assert_eq!(result.steps[1].phase, Phase::Setup);
    assert_eq!(result.steps[5].phase, Phase::Test);
    assert!(result.screenshot_path.is_none());

    // The temporary script is removed once node exits
    let leftovers: Vec<_> = std::fs::read_dir(work.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .filter(|name| name != "node_modules")
        .collect();
    assert!(leftovers.is_empty(), "{:?}", leftovers);
}

#[tokio::test]
async fn failing_step_reports_error_and_screenshot() {
    if !in_path("node") {
        eprintln!("Skipping: node not available in PATH");
        return;
    }
    let base_url = spawn_backend(MockBackend::default()).await;
    let out = tempfile::tempdir().unwrap();
    let work = stub_work_dir();

    let scenario = Scenario::new("a missing blog is reported")
        .in_group(&["Blog app"])
        .logged_in_as("mixxo")
        .step(Step::click(Target::button("view")))
        .step(Step::expect_visible(Target::text("missing blog")))
        .step(Step::click(Target::button("like")));

    let runner = node_runner(node_config(&base_url, out.path(), work.path()));
    let result = runner.run_scenario(&scenario).await;

    assert_eq!(result.outcome, Outcome::Failed);
    assert_eq!(result.steps.len(), 4);
    assert!(result.steps[2].success);
    assert!(!result.steps[3].success);

    let error = result.error.unwrap();
    assert!(error.starts_with(r#"expect_visible:text="missing blog""#), "{}", error);
    assert!(error.contains("Timed out waiting for"));
    assert!(!error.contains('\u{1b}'));

    let shot = result.screenshot_path.unwrap();
    assert!(shot.starts_with(out.path()));
    assert!(shot.exists());
}

#[tokio::test]
async fn dialog_needs_handler_registered_before_click() {
    if !in_path("node") {
        eprintln!("Skipping: node not available in PATH");
        return;
    }
    let base_url = spawn_backend(MockBackend::default()).await;
    let out = tempfile::tempdir().unwrap();
    let work = stub_work_dir();
    let runner = node_runner(node_config(&base_url, out.path(), work.path()));

    let accepted = Scenario::new("remove with confirmation")
        .step(Step::click_and_accept(Target::button("remove")));
    let result = runner.run_scenario(&accepted).await;
    assert_eq!(result.outcome, Outcome::Passed, "{:?}", result.error);

    let unhandled =
        Scenario::new("remove without confirmation").step(Step::click(Target::button("remove")));
    let result = runner.run_scenario(&unhandled).await;
    assert_eq!(result.outcome, Outcome::Failed);
    assert!(result.error.unwrap().contains("no handler"));
}

#[tokio::test]
async fn failing_login_precondition_is_a_setup_error() {
    if !in_path("node") {
        eprintln!("Skipping: node not available in PATH");
        return;
    }
    let base_url = spawn_backend(MockBackend::default()).await;
    let out = tempfile::tempdir().unwrap();
    let work = stub_work_dir();

    let mut config = node_config(&base_url, out.path(), work.path());
    config.selectors = Selectors {
        login_button: Target::button("missing login"),
        ..Selectors::default()
    };
    let runner = node_runner(config);
    let result = runner.run_scenario(&liked_scenario()).await;

    assert_eq!(result.outcome, Outcome::SetupError);
    assert!(result.error.unwrap().starts_with("login:mixxo"));
}

#[tokio::test]
async fn missing_playwright_install_is_a_setup_error() {
    if !in_path("node") {
        eprintln!("Skipping: node not available in PATH");
        return;
    }
    let base_url = spawn_backend(MockBackend::default()).await;
    let out = tempfile::tempdir().unwrap();
    let empty_work_dir = tempfile::tempdir().unwrap();

    let runner = node_runner(node_config(&base_url, out.path(), empty_work_dir.path()));
    let result = runner.run_scenario(&liked_scenario()).await;

    assert_eq!(result.outcome, Outcome::SetupError);
    assert!(result.steps.is_empty());
    assert!(result.error.unwrap().contains("Cannot find module"));
}

#[tokio::test]
async fn stalled_step_times_out_with_partial_progress() {
    if !in_path("node") {
        eprintln!("Skipping: node not available in PATH");
        return;
    }
    let base_url = spawn_backend(MockBackend::default()).await;
    let out = tempfile::tempdir().unwrap();
    let work = stub_work_dir();

    let mut config = node_config(&base_url, out.path(), work.path());
    config.browser.scenario_timeout_secs = 2;
    let scenario = Scenario::new("a stalled page")
        .step(Step::click(Target::button("view")))
        .step(Step::click(Target::button("slow")));

    let runner = node_runner(config);
    let result = runner.run_scenario(&scenario).await;

    assert_eq!(result.outcome, Outcome::Failed);
    assert!(result.error.as_deref().unwrap().starts_with("Timeout"));
    assert_eq!(result.steps.len(), 3);
    assert!(result.steps[0].success);
    assert!(result.steps[1].success);
    assert!(!result.steps[2].success);
    assert!(result.screenshot_path.unwrap().exists());
}
