//! Check Command

use blogapp_e2e::app::wait_for_ready;
use blogapp_e2e::playwright::NodePlaywright;
use blogapp_e2e::SuiteConfig;

use crate::output::{print_error, print_success};

/// Probe the application and the local Playwright install
pub async fn execute(config: &SuiteConfig) -> bool {
    let mut ok = true;

    let urls = config.app.probe_urls();
    match wait_for_ready(&urls, config.app.readiness_timeout()).await {
        Ok(()) => print_success(&format!("Application ready at {}", urls.join(", "))),
        Err(e) => {
            print_error(&e.to_string());
            ok = false;
        }
    }

    match NodePlaywright::new(&config.browser).check_installed() {
        Ok(()) => print_success("Playwright is installed"),
        Err(e) => {
            print_error(&e.to_string());
            ok = false;
        }
    }

    ok
}
