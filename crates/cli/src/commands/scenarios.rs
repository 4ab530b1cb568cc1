//! Scenario Commands

use anyhow::Result;
use serde::Serialize;

use blogapp_e2e::playwright::ScriptBuilder;
use blogapp_e2e::{E2eError, Scenario, ScenarioRunner, SuiteConfig};

use crate::output::{print_list, OutputFormat, TableDisplay};

/// Scenario display wrapper
#[derive(Serialize)]
pub struct ScenarioDisplay {
    pub name: String,
    pub title: String,
    pub login_as: Option<String>,
    pub tags: Vec<String>,
    pub steps: usize,
}

impl From<&Scenario> for ScenarioDisplay {
    fn from(scenario: &Scenario) -> Self {
        Self {
            name: scenario.name.clone(),
            title: scenario.full_title(),
            login_as: scenario.login_as.clone(),
            tags: scenario.tags.clone(),
            steps: scenario.steps.len(),
        }
    }
}

impl TableDisplay for ScenarioDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Title", "Logged In As", "Tags", "Steps"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            self.login_as.clone().unwrap_or_else(|| "-".to_string()),
            self.tags.join(", "),
            self.steps.to_string(),
        ]
    }
}

fn load(config: &SuiteConfig) -> Result<Vec<Scenario>> {
    let runner = ScenarioRunner::new(config.clone())?;
    Ok(runner.load_scenarios()?)
}

pub fn list(config: &SuiteConfig, format: OutputFormat) -> Result<()> {
    let scenarios = load(config)?;
    let displays: Vec<ScenarioDisplay> = scenarios.iter().map(ScenarioDisplay::from).collect();
    print_list(&displays, format);
    Ok(())
}

/// Print the generated script so it can be run by hand with `node`
pub fn script(config: &SuiteConfig, name: &str) -> Result<()> {
    let scenario = load(config)?
        .into_iter()
        .find(|s| s.name == name || s.full_title() == name)
        .ok_or_else(|| E2eError::ScenarioNotFound(name.to_string()))?;

    let script = ScriptBuilder::new(config).build(&scenario)?;
    println!("{}", script.source);
    Ok(())
}
