use crate::error::AnalysisError;
use crate::types::RawCommit;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

// Control characters never appear in names or hashes, so they delimit
// fields without escaping. The body may span lines; it ends at BODY_END.
const RECORD_START: char = '\u{1e}';
const FIELD_SEP:    char = '\u{1f}';
const BODY_END:     char = '\u{1d}';
const LOG_FORMAT:   &str = "--format=%x1e%H%x1f%ct%x1f%an%x1f%B%x1d";

/// Runs a single `git log --numstat` in `cwd` and returns one [`RawCommit`]
/// per commit, newest first.
///
/// `cwd` must be the top level of a working tree; a directory nested inside
/// someone else's repository is refused rather than read as that parent.
/// Line deltas are summed over text files (binary entries count as 0). A
/// commit that printed no numstat lines at all (merges, empty commits) gets
/// an unknown delta. A repository whose HEAD does not resolve yet has an
/// empty history, not an error.
pub fn read_log(
    cwd: &Path,
    reference: &str,
    max_commits: Option<usize>,
) -> Result<Vec<RawCommit>, AnalysisError> {
    if !cwd.is_dir() {
        return Err(AnalysisError::no_access(reference, "path is not a directory"));
    }
    let Some(toplevel) = git_output(cwd, &["rev-parse", "--show-toplevel"]) else {
        return Err(AnalysisError::no_access(reference, "not a git repository"));
    };
    if !same_dir(Path::new(&toplevel), cwd) {
        return Err(AnalysisError::no_access(
            reference,
            format!("not the root of a git repository (enclosing repository is {toplevel})"),
        ));
    }
    if !git_succeeds(cwd, &["rev-parse", "--verify", "--quiet", "HEAD"]) {
        tracing::debug!(reference, "HEAD does not resolve, treating history as empty");
        return Ok(Vec::new());
    }

    let mut args: Vec<String> = vec!["log".into(), LOG_FORMAT.into(), "--numstat".into()];
    if let Some(n) = max_commits {
        args.push(format!("--max-count={n}"));
    }

    let mut child = Command::new("git")
        .args(&args)
        .current_dir(cwd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| AnalysisError::no_access(reference, format!("failed to run git: {e}")))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AnalysisError::no_access(reference, "failed to capture git stdout"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| AnalysisError::no_access(reference, "failed to capture git stderr"))?;

    let stderr_reader = thread::spawn(move || {
        let mut stderr_text = String::new();
        let mut reader = BufReader::new(stderr);
        let _ = reader.read_to_string(&mut stderr_text);
        stderr_text
    });

    let mut parser = LogParser::default();
    for line in BufReader::new(stdout).lines() {
        let line = line.map_err(|e| {
            AnalysisError::no_access(reference, format!("failed reading git output: {e}"))
        })?;
        parser.feed(&line)?;
    }
    let commits = parser.finish();

    let status = child
        .wait()
        .map_err(|e| AnalysisError::no_access(reference, format!("failed to wait for git: {e}")))?;
    let stderr_text = stderr_reader.join().unwrap_or_default();

    if !status.success() {
        return Err(AnalysisError::no_access(
            reference,
            format!("git log failed: {}", stderr_text.trim()),
        ));
    }

    tracing::debug!(reference, commits = commits.len(), "read git log");
    Ok(commits)
}

/// Line-at-a-time state machine over `git log` output in [`LOG_FORMAT`].
#[derive(Debug, Default)]
struct LogParser {
    commits: Vec<RawCommit>,
    current: Option<RawCommit>,
    in_body: bool,
}

impl LogParser {
    fn feed(&mut self, line: &str) -> Result<(), AnalysisError> {
        if let Some(rest) = line.strip_prefix(RECORD_START) {
            if let Some(c) = self.current.take() {
                self.commits.push(c);
            }
            let mut parts = rest.splitn(4, FIELD_SEP);
            let (Some(hash), Some(timestamp), Some(author), Some(body)) =
                (parts.next(), parts.next(), parts.next(), parts.next())
            else {
                return Err(AnalysisError::Unexpected(format!(
                    "malformed commit header: {}",
                    line.escape_debug()
                )));
            };
            let timestamp = timestamp.trim().parse::<i64>().map_err(|e| {
                AnalysisError::Unexpected(format!("bad timestamp '{timestamp}' for {hash}: {e}"))
            })?;
            self.current = Some(RawCommit {
                hash: hash.to_string(),
                author_name: author.to_string(),
                timestamp,
                lines_changed: None,
                message: String::new(),
            });
            self.in_body = true;
            return self.body_line(body);
        }

        if self.in_body {
            return self.body_line(line);
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            // blank separator between body and numstat block
            return Ok(());
        }

        let mut parts = trimmed.splitn(3, '\t');
        if let (Some(added), Some(deleted), Some(_file)) = (parts.next(), parts.next(), parts.next()) {
            if let Some(ref mut c) = self.current {
                let delta = numstat_count(added) + numstat_count(deleted);
                c.lines_changed = Some(c.lines_changed.unwrap_or(0) + delta);
            }
        }
        Ok(())
    }

    fn body_line(&mut self, line: &str) -> Result<(), AnalysisError> {
        let Some(ref mut c) = self.current else {
            return Err(AnalysisError::Unexpected("commit body without a header".to_string()));
        };
        let (text, ended) = match line.split_once(BODY_END) {
            Some((text, _)) => (text, true),
            None => (line, false),
        };
        if !c.message.is_empty() || !text.is_empty() {
            if !c.message.is_empty() {
                c.message.push('\n');
            }
            c.message.push_str(text);
        }
        if ended {
            self.in_body = false;
        }
        Ok(())
    }

    fn finish(mut self) -> Vec<RawCommit> {
        if let Some(c) = self.current.take() {
            self.commits.push(c);
        }
        self.commits
    }
}

/// Numstat prints `-` for binary files.
fn numstat_count(raw: &str) -> u64 {
    if raw == "-" { 0 } else { raw.parse().unwrap_or(0) }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn git_succeeds(cwd: &Path, args: &[&str]) -> bool {
    Command::new("git")
        .args(args)
        .current_dir(cwd)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Trimmed stdout of a successful git command.
fn git_output(cwd: &Path, args: &[&str]) -> Option<String> {
    let out = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .stderr(Stdio::null())
        .output()
        .ok()?;
    out.status
        .success()
        .then(|| String::from_utf8_lossy(&out.stdout).trim().to_string())
}
