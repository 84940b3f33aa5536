use crate::error::AnalysisError;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Returns true for references that must be cloned before they can be read.
pub fn is_remote(reference: &str) -> bool {
    ["http://", "https://", "ssh://", "git://", "file://", "git@"]
        .iter()
        .any(|p| reference.starts_with(p))
}

/// Shallow, single-branch clone of `url` into a fresh temporary directory.
///
/// The directory is deleted when the returned [`TempDir`] is dropped. The
/// clone is killed once `timeout` elapses, and rejected when the checkout is
/// larger than `max_size_mb`.
pub fn shallow_clone(
    url: &str,
    depth: Option<usize>,
    max_size_mb: u64,
    timeout: Duration,
) -> Result<TempDir, AnalysisError> {
    let dir = tempfile::Builder::new()
        .prefix("commit-audit-")
        .tempdir()
        .map_err(|e| AnalysisError::no_access(url, format!("cannot create temp dir: {e}")))?;

    let mut args: Vec<String> = vec!["clone".into(), "--quiet".into(), "--single-branch".into()];
    if let Some(d) = depth {
        args.push(format!("--depth={d}"));
    }
    args.push(url.into());
    args.push(dir.path().display().to_string());

    tracing::info!(url, path = %dir.path().display(), "cloning repository");

    let mut child = Command::new("git")
        .args(&args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| AnalysisError::no_access(url, format!("failed to run git: {e}")))?;

    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| AnalysisError::no_access(url, "failed to capture git stderr"))?;
    let stderr_reader = thread::spawn(move || {
        let mut text = String::new();
        let _ = BufReader::new(stderr).read_to_string(&mut text);
        text
    });

    let status = match wait_with_timeout(&mut child, timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            tracing::warn!(url, timeout_secs = timeout.as_secs(), "clone timed out, killed");
            return Err(AnalysisError::no_access(
                url,
                format!("clone timed out after {}s", timeout.as_secs()),
            ));
        }
        Err(e) => {
            return Err(AnalysisError::no_access(url, format!("failed to wait for git: {e}")))
        }
    };
    let stderr_text = stderr_reader.join().unwrap_or_default();

    if !status.success() {
        return Err(AnalysisError::no_access(
            url,
            format!("failed to clone repository: {}", stderr_text.trim()),
        ));
    }

    let size_mb = dir_size(dir.path()) as f64 / (1024.0 * 1024.0);
    if size_mb > max_size_mb as f64 {
        return Err(AnalysisError::no_access(
            url,
            format!("repository too large: {size_mb:.1}MB (limit {max_size_mb}MB)"),
        ));
    }

    tracing::info!(url, size_mb, "repository cloned");
    Ok(dir)
}

/// Polls `child` until it exits or `timeout` elapses. On timeout the child is
/// killed and reaped, and `None` is returned.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> io::Result<Option<ExitStatus>> {
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if started.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Total size in bytes of the regular files under `path`. Unreadable entries
/// are skipped.
fn dir_size(path: &Path) -> u64 {
    let Ok(entries) = std::fs::read_dir(path) else { return 0 };
    entries
        .flatten()
        .map(|entry| match entry.file_type() {
            Ok(ft) if ft.is_dir() => dir_size(&entry.path()),
            Ok(ft) if ft.is_file() => entry.metadata().map(|m| m.len()).unwrap_or(0),
            _ => 0,
        })
        .sum()
}
