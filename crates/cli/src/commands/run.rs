//! Run Command

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tracing::debug;

use blogapp_e2e::config::Browser;
use blogapp_e2e::{Outcome, ScenarioFilter, ScenarioResult, ScenarioRunner, SuiteConfig, SuiteResult};

use crate::output::{
    print_error, print_info, print_list, print_warning, OutputFormat, TableDisplay,
};

/// Run arguments
#[derive(Args)]
pub struct RunArgs {
    /// Only run the scenario with this exact name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Only run scenarios carrying this tag or group segment
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Only run scenarios whose full title matches this regex
    #[arg(short, long)]
    pub grep: Option<String>,

    /// Browser engine (chromium, firefox, webkit)
    #[arg(long)]
    pub browser: Option<Browser>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Directory for results and screenshots
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip the readiness wait and application startup
    #[arg(long)]
    pub no_wait: bool,
}

/// Scenario result display wrapper
#[derive(Serialize)]
pub struct ResultDisplay {
    pub title: String,
    pub outcome: Outcome,
    pub steps: usize,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub screenshot: Option<PathBuf>,
}

impl From<&ScenarioResult> for ResultDisplay {
    fn from(result: &ScenarioResult) -> Self {
        Self {
            title: result.title.clone(),
            outcome: result.outcome,
            steps: result.steps.len(),
            duration_ms: result.duration_ms,
            error: result.error.clone(),
            screenshot: result.screenshot_path.clone(),
        }
    }
}

impl TableDisplay for ResultDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Scenario", "Outcome", "Steps", "Duration", "Error"]
    }

    fn row(&self) -> Vec<String> {
        let outcome = match self.outcome {
            Outcome::Passed => "✓ passed".green().to_string(),
            Outcome::Failed => "✗ failed".red().to_string(),
            Outcome::SetupError => "! setup error".yellow().to_string(),
        };
        vec![
            self.title.clone(),
            outcome,
            self.steps.to_string(),
            format!("{}ms", self.duration_ms),
            self.error.clone().unwrap_or_else(|| "-".to_string()),
        ]
    }
}

/// Returns whether every selected scenario passed
pub async fn execute(args: RunArgs, mut config: SuiteConfig, format: OutputFormat) -> Result<bool> {
    if let Some(browser) = args.browser {
        config.browser.browser = browser;
    }
    if args.headed {
        config.browser.headless = false;
    }
    if let Some(output) = args.output {
        config.output_dir = output;
    }

    let mut filter = ScenarioFilter::new();
    if let Some(name) = &args.name {
        filter = filter.name(name);
    }
    if let Some(tag) = &args.tag {
        filter = filter.tag(tag);
    }
    if let Some(pattern) = &args.grep {
        filter = filter.grep(pattern)?;
    }

    debug!("Scenario filter: {:?}", filter);

    let mut runner = ScenarioRunner::new(config)?;
    if !args.no_wait {
        print_info(&format!(
            "Waiting for {}",
            runner.config().app.probe_urls().join(", ")
        ));
        runner.start_app().await?;
    } else {
        print_warning("Skipping readiness wait");
    }

    let suite = runner.run_filtered(&filter).await;
    runner.stop_app()?;
    let suite = suite?;

    let path = runner.write_results(&suite)?;

    let displays: Vec<ResultDisplay> = suite.results.iter().map(ResultDisplay::from).collect();
    print_list(&displays, format);
    print_summary(&suite);
    print_info(&format!("Results written to {}", path.display()));

    Ok(suite.is_success())
}

fn print_summary(suite: &SuiteResult) {
    println!();
    println!(
        "{} passed, {} failed, {} setup errors ({} total) in {:.1}s",
        suite.passed.to_string().green(),
        suite.failed.to_string().red(),
        suite.errored.to_string().yellow(),
        suite.total,
        suite.duration_ms as f64 / 1000.0
    );

    for result in suite.results.iter().filter(|r| !r.passed()) {
        print_error(&format!(
            "{}: {}",
            result.title,
            result.error.as_deref().unwrap_or("unknown error")
        ));
        if let Some(shot) = &result.screenshot_path {
            println!("     screenshot: {}", shot.display());
        }
    }
}
