use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

pub const UNKNOWN_REVISION: &str = "unknown";

const REVISION_TIMEOUT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Commit checked out in `dir`, or `"unknown"` when git is missing, the
/// directory is not a checkout, or git does not answer within 5 seconds
pub fn current_revision(dir: &Path) -> String {
    match git_head(dir, REVISION_TIMEOUT) {
        Some(revision) => revision,
        None => UNKNOWN_REVISION.to_string(),
    }
}

fn git_head(dir: &Path, timeout: Duration) -> Option<String> {
    let mut child = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| debug!(error = %e, "Failed to start git"))
        .ok()?;

    let started = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if started.elapsed() >= timeout => {
                debug!(dir = %dir.display(), "git rev-parse timed out");
                let _ = child.kill();
                let _ = child.wait();
                return None;
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                debug!(error = %e, "Failed to wait for git");
                return None;
            }
        }
    };
    if !status.success() {
        return None;
    }

    let mut output = String::new();
    child.stdout.take()?.read_to_string(&mut output).ok()?;
    let revision = output.trim();
    (!revision.is_empty()).then(|| revision.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_not_a_checkout_is_unknown() {
        let dir = TempDir::new().unwrap();
        assert_eq!(current_revision(dir.path()), UNKNOWN_REVISION);
    }

    #[test]
    fn test_missing_directory_is_unknown() {
        assert_eq!(
            current_revision(Path::new("/nonexistent/buildsmith/source")),
            UNKNOWN_REVISION
        );
    }
}
