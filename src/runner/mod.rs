//! Background execution of generated build scripts
//!
//! [`JobRunner::submit`] returns immediately; the script runs on a tokio task
//! and its outcome is recorded as a [`JobStatus`]. Failures never propagate
//! to the caller as panics or errors, they only show up in the status.
//! A job stays tracked until [`JobRunner::wait`] hands out its final status.

pub mod revision;

use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use tokio::process::Command;
use tokio::sync::watch;
use tracing::{error, info};
use uuid::Uuid;

pub type JobId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Succeeded,
    Failed {
        /// `None` when the process never started or was killed by a signal
        exit_code: Option<i32>,
        message: String,
    },
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

#[derive(Clone)]
pub struct JobRunner {
    shell: PathBuf,
    jobs: Arc<Mutex<HashMap<JobId, watch::Receiver<JobStatus>>>>,
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl JobRunner {
    pub fn new() -> Self {
        Self::with_shell("bash")
    }

    pub fn with_shell(shell: impl Into<PathBuf>) -> Self {
        Self {
            shell: shell.into(),
            jobs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Starts `script` in `working_dir` on a background task
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, script: impl Into<String>, working_dir: impl Into<PathBuf>) -> JobId {
        let id = Uuid::new_v4();
        let (tx, rx) = watch::channel(JobStatus::Running);
        self.jobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, rx);

        let shell = self.shell.clone();
        let script = script.into();
        let working_dir = working_dir.into();
        tokio::spawn(async move {
            info!(job = %id, dir = %working_dir.display(), "Build script started");
            let status = run_script(&shell, &script, &working_dir).await;
            match &status {
                JobStatus::Failed { exit_code, message } => {
                    error!(job = %id, exit_code = ?exit_code, "Build script failed: {}", message)
                }
                _ => info!(job = %id, "Build script succeeded"),
            }
            let _ = tx.send(status);
        });
        id
    }

    /// Current status; `None` for an unknown id or a job already waited on
    pub fn status(&self, id: &JobId) -> Option<JobStatus> {
        let jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        jobs.get(id).map(|rx| rx.borrow().clone())
    }

    /// Waits for the job to finish and stops tracking it; `None` for an unknown id
    pub async fn wait(&self, id: &JobId) -> Option<JobStatus> {
        let mut rx = {
            let jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
            jobs.get(id)?.clone()
        };
        let status = match rx.wait_for(JobStatus::is_finished).await {
            Ok(status) => status.clone(),
            Err(_) => JobStatus::Failed {
                exit_code: None,
                message: "job task ended without reporting a status".to_string(),
            },
        };
        self.jobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id);
        Some(status)
    }
}

async fn run_script(shell: &Path, script: &str, working_dir: &Path) -> JobStatus {
    let result = Command::new(shell)
        .arg("-c")
        .arg(script)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .status()
        .await;

    match result {
        Ok(status) if status.success() => JobStatus::Succeeded,
        Ok(status) => JobStatus::Failed {
            exit_code: status.code(),
            message: format!("script exited with {}", status),
        },
        Err(e) => JobStatus::Failed {
            exit_code: None,
            message: format!("failed to start {}: {}", shell.display(), e),
        },
    }
}
