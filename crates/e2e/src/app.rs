//! Application management - optionally spawning the app and waiting for it
//! to answer

use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::{AppConfig, AppProcessConfig};
use crate::error::{E2eError, E2eResult};

const PROBE_INTERVAL: Duration = Duration::from_millis(250);

/// Poll each URL until it answers with a 2xx status or `timeout` elapses
pub async fn wait_for_ready(urls: &[String], timeout: Duration) -> E2eResult<()> {
    wait_for_ready_every(urls, timeout, PROBE_INTERVAL).await
}

pub async fn wait_for_ready_every(
    urls: &[String],
    timeout: Duration,
    interval: Duration,
) -> E2eResult<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()?;

    let start = Instant::now();

    for url in urls {
        let mut attempts = 0;

        loop {
            attempts += 1;

            match client.get(url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    info!("{} is ready", url);
                    break;
                }
                Ok(resp) => {
                    warn!("Readiness probe {} returned {}", url, resp.status());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for {} ...", url);
                    }
                    // Connection refused is expected while the app is starting
                    if !e.is_connect() {
                        warn!("Readiness probe {} failed: {}", url, e);
                    }
                }
            }

            if start.elapsed() >= timeout {
                return Err(E2eError::AppNotReady {
                    url: url.clone(),
                    attempts,
                });
            }

            sleep(interval).await;
        }
    }

    Ok(())
}

/// Handle to an application process started by the runner
pub struct AppHandle {
    child: Child,
}

impl AppHandle {
    /// Start the configured command and wait until the app answers
    pub async fn spawn(process: &AppProcessConfig, app: &AppConfig) -> E2eResult<Self> {
        info!("Starting application: {} {}", process.program, process.args.join(" "));

        let mut cmd = Command::new(&process.program);
        cmd.args(&process.args)
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Some(dir) = &process.working_dir {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(|e| {
            E2eError::AppStartup(format!("failed to spawn {}: {}", process.program, e))
        })?;

        let mut handle = AppHandle { child };

        let timeout = Duration::from_secs(process.startup_timeout_secs);
        if let Err(e) = wait_for_ready(&app.probe_urls(), timeout).await {
            let _ = handle.stop();
            return Err(e);
        }

        Ok(handle)
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Stop the application
    pub fn stop(&mut self) -> E2eResult<()> {
        if let Ok(Some(_)) = self.child.try_wait() {
            return Ok(());
        }

        info!("Stopping application (pid: {})", self.child.id());

        // Try graceful shutdown first
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(self.child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                std::thread::sleep(Duration::from_millis(500));
            }
        }

        // Force kill if still running
        let _ = self.child.kill();
        let _ = self.child.wait();

        Ok(())
    }
}

impl Drop for AppHandle {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
