//! Blog App E2E Scenario Runner
//!
//! This crate provides a Rust-controlled E2E testing framework that:
//! - Resets the application backend and seeds known accounts over HTTP
//! - Generates one Playwright script per scenario and runs it with `node`
//! - Parses declarative YAML scenarios alongside the built-in catalogue
//! - Reports pass, fail or setup error per scenario as JSON
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Scenario Runner (Rust)                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ScenarioRunner                                             │
//! │    ├── start_app() / wait_until_ready()                     │
//! │    ├── BackendClient::prepare()   reset + seed users        │
//! │    ├── ScriptBuilder::build()     Scenario -> JS            │
//! │    ├── BrowserDriver::run()       node + @playwright/test   │
//! │    └── fold_run()                 events -> ScenarioResult  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Scenario (Rust catalogue or YAML)                          │
//! │    ├── name, group, tags, login_as                          │
//! │    └── steps: [Step]                                        │
//! │          ├── navigate / click / fill                        │
//! │          ├── login / logout / create_blog                   │
//! │          └── expect_visible / expect_hidden / expect_text   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod app;
pub mod catalogue;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod locator;
pub mod playwright;
pub mod runner;
pub mod spec;

pub use config::SuiteConfig;
pub use error::{E2eError, E2eResult};
pub use locator::Target;
pub use runner::{Outcome, ScenarioResult, ScenarioRunner, SuiteResult};
pub use spec::{Scenario, ScenarioFilter, Step};
