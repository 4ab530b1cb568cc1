//! Shared helpers: an in-process mock of the blog backend and a scripted
//! browser driver.

#![allow(dead_code)]

use std::process::Command;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;

use blogapp_e2e::playwright::{BrowserDriver, ScenarioScript, ScriptEvent, ScriptRun};
use blogapp_e2e::{E2eError, E2eResult, SuiteConfig};

/// Whether `bin` can be found on PATH
pub fn in_path(bin: &str) -> bool {
    Command::new("sh")
        .arg("-lc")
        .arg(format!("command -v {bin} >/dev/null 2>&1"))
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[derive(Clone, Default)]
pub struct MockBackend {
    pub calls: Arc<Mutex<Vec<String>>>,
    pub users: Arc<Mutex<Vec<Value>>>,
    pub fail_reset: bool,
    pub reject_user: Option<String>,
}

impl MockBackend {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn resets(&self) -> usize {
        self.calls().iter().filter(|c| *c == "reset").count()
    }
}

async fn reset(State(state): State<MockBackend>) -> StatusCode {
    state.calls.lock().unwrap().push("reset".to_string());
    if state.fail_reset {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::NO_CONTENT
    }
}

async fn create_user(
    State(state): State<MockBackend>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let username = body["username"].as_str().unwrap_or_default().to_string();
    state.calls.lock().unwrap().push(format!("user:{}", username));

    if state.reject_user.as_deref() == Some(username.as_str()) {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "expected `username` to be unique" })),
        );
    }

    state.users.lock().unwrap().push(body.clone());
    (StatusCode::CREATED, Json(body))
}

/// Serve the mock on an ephemeral port and return its base URL
pub async fn spawn_backend(state: MockBackend) -> String {
    let app = Router::new()
        .route("/", get(|| async { "blog app" }))
        .route("/api/testing/reset", post(reset))
        .route("/api/users", post(create_user))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Config with frontend and backend both served by the mock
pub fn config_for(base_url: &str, output_dir: &std::path::Path) -> SuiteConfig {
    let mut config = SuiteConfig::default();
    config.app.frontend_url = base_url.to_string();
    config.app.backend_url = base_url.to_string();
    config.app.readiness_timeout_secs = 2;
    config.browser.scenario_timeout_secs = 1;
    config.output_dir = output_dir.to_path_buf();
    config
}

#[derive(Clone)]
pub enum Behaviour {
    PassAll,
    /// Fail at the given script step index
    FailAt(usize),
    Hang(Duration),
    MissingPlaywright,
}

/// Driver that answers with canned events instead of launching a browser
#[derive(Clone)]
pub struct FakeDriver {
    pub behaviours: Arc<Mutex<Vec<Behaviour>>>,
    pub scripts: Arc<Mutex<Vec<String>>>,
}

impl FakeDriver {
    /// Each run consumes the next behaviour; the last one repeats
    pub fn new(behaviours: Vec<Behaviour>) -> Self {
        Self {
            behaviours: Arc::new(Mutex::new(behaviours)),
            scripts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn runs(&self) -> usize {
        self.scripts.lock().unwrap().len()
    }

    fn next(&self) -> Behaviour {
        let mut behaviours = self.behaviours.lock().unwrap();
        if behaviours.len() > 1 {
            behaviours.remove(0)
        } else {
            behaviours.first().cloned().unwrap_or(Behaviour::PassAll)
        }
    }
}

#[async_trait]
impl BrowserDriver for FakeDriver {
    async fn run(&self, script: &ScenarioScript) -> E2eResult<ScriptRun> {
        self.scripts.lock().unwrap().push(script.source.clone());

        let mut events = Vec::new();
        match self.next() {
            Behaviour::PassAll => {
                for step in &script.steps {
                    events.push(ScriptEvent::StepPassed { index: step.index, duration_ms: 1 });
                }
                events.push(ScriptEvent::Done);
                Ok(ScriptRun { success: true, events, stdout: String::new(), stderr: String::new() })
            }
            Behaviour::FailAt(failing) => {
                for step in script.steps.iter().take(failing) {
                    events.push(ScriptEvent::StepPassed { index: step.index, duration_ms: 1 });
                }
                events.push(ScriptEvent::StepFailed {
                    index: failing as i64,
                    duration_ms: 5000,
                    error: "Timed out 5000ms waiting for expect(locator).toBeVisible()".to_string(),
                });
                events.push(ScriptEvent::Screenshot {
                    path: script.failure_screenshot.clone(),
                });
                Ok(ScriptRun { success: false, events, stdout: String::new(), stderr: String::new() })
            }
            Behaviour::Hang(duration) => {
                tokio::time::sleep(duration).await;
                Ok(ScriptRun { success: true, events, stdout: String::new(), stderr: String::new() })
            }
            Behaviour::MissingPlaywright => Err(E2eError::PlaywrightNotFound),
        }
    }
}
