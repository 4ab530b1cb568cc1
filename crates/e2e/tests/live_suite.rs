mod common;

use std::path::PathBuf;

use blogapp_e2e::{ScenarioFilter, ScenarioRunner, SuiteConfig};
use tracing_subscriber::EnvFilter;

use common::in_path;

/// Live Blog App Suite
///
/// Runs the built-in catalogue against a blog application already serving
/// on the configured URLs (frontend on 5173, backend on 3001 by default).
/// `BLOGAPP_E2E_CONFIG` may point at a TOML config file.
///
/// Marked ignored because it requires node, Playwright browsers and a
/// running application.
#[tokio::test]
#[ignore]
async fn blog_app_catalogue_passes_against_live_app() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with_test_writer()
        .try_init();

    if !in_path("node") || !in_path("npx") {
        eprintln!("Skipping: node/npx not available in PATH");
        return;
    }

    let config_path = std::env::var("BLOGAPP_E2E_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("blogapp-e2e.toml"));
    let config = SuiteConfig::load(&config_path).expect("load config");

    let mut runner = ScenarioRunner::new(config).expect("create runner");
    if let Err(e) = runner.start_app().await {
        eprintln!("Skipping: application not reachable: {e}");
        return;
    }

    let suite = runner
        .run_filtered(&ScenarioFilter::new())
        .await
        .expect("run catalogue");
    runner.write_results(&suite).expect("write results");

    for result in suite.results.iter().filter(|r| !r.passed()) {
        eprintln!("{}: {:?} {:?}", result.title, result.outcome, result.error);
    }
    assert!(suite.is_success(), "{} failed, {} errored", suite.failed, suite.errored);
}
