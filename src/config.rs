use serde::Deserialize;
use std::path::{Path, PathBuf};
use crate::types::{Penalties, TimeBasis};

/// All settings that can be placed in a commit-audit YAML config file.
/// Every field is optional; omitted fields fall back to CLI defaults.
/// CLI flags always take precedence over values set here.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    // Output
    pub format: Option<String>,
    pub output: Option<String>,

    // History reading
    pub max_commits: Option<usize>,
    pub max_repo_size_mb: Option<u64>,
    pub clone_timeout_secs: Option<u64>,

    // Execution
    pub concurrency: Option<usize>,
    pub timezone: Option<TimeBasis>,

    // Red-flag penalty overrides
    pub penalties: Option<ConfigPenalties>,
}

/// Optional per-rule score impact overrides. Each must be zero or negative.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigPenalties {
    pub low_activity: Option<i32>,
    pub no_collaboration: Option<i32>,
    pub suspicious_timing: Option<i32>,
    pub bulk_upload: Option<i32>,
    pub burst_activity: Option<i32>,
    pub generic_messages: Option<i32>,
    pub dominated_repo: Option<i32>,
}

impl AuditConfig {
    /// Built-in penalties with any overrides from this file applied.
    pub fn penalties(&self) -> Penalties {
        let d = Penalties::default();
        let Some(p) = &self.penalties else { return d };
        Penalties {
            low_activity:      p.low_activity.unwrap_or(d.low_activity),
            no_collaboration:  p.no_collaboration.unwrap_or(d.no_collaboration),
            suspicious_timing: p.suspicious_timing.unwrap_or(d.suspicious_timing),
            bulk_upload:       p.bulk_upload.unwrap_or(d.bulk_upload),
            burst_activity:    p.burst_activity.unwrap_or(d.burst_activity),
            generic_messages:  p.generic_messages.unwrap_or(d.generic_messages),
            dominated_repo:    p.dominated_repo.unwrap_or(d.dominated_repo),
        }
    }

    /// Validates semantic constraints that serde cannot enforce.
    ///
    /// Returns a human-readable error describing exactly what is wrong and what
    /// values are accepted. Called automatically by [`load_config`].
    pub fn validate(&self) -> Result<(), String> {
        if let Some(fmt) = &self.format {
            match fmt.as_str() {
                "terminal" | "json" => {}
                other => {
                    return Err(format!(
                        "Invalid 'format' value: \"{other}\". \
                         Expected one of: \"terminal\", \"json\""
                    ))
                }
            }
        }

        let positive: &[(&str, Option<u64>)] = &[
            ("max_commits", self.max_commits.map(|v| v as u64)),
            ("max_repo_size_mb", self.max_repo_size_mb),
            ("clone_timeout_secs", self.clone_timeout_secs),
            ("concurrency", self.concurrency.map(|v| v as u64)),
        ];
        for (name, val) in positive {
            if let Some(0) = val {
                return Err(format!("Invalid '{name}' value: 0. Must be 1 or greater"));
            }
        }

        if let Some(p) = &self.penalties {
            let fields: &[(&str, Option<i32>)] = &[
                ("low_activity", p.low_activity),
                ("no_collaboration", p.no_collaboration),
                ("suspicious_timing", p.suspicious_timing),
                ("bulk_upload", p.bulk_upload),
                ("burst_activity", p.burst_activity),
                ("generic_messages", p.generic_messages),
                ("dominated_repo", p.dominated_repo),
            ];
            for (name, val) in fields {
                if let Some(v) = val {
                    if *v > 0 {
                        return Err(format!(
                            "Invalid penalty 'penalties.{name}': {v}. \
                             Penalties must be 0 or negative \
                             (they are added to the score, e.g. -20)"
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}

/// Reads, parses, and validates a YAML config file from `path`.
pub fn load_config(path: &Path) -> Result<AuditConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read config file '{}': {e}", path.display()))?;
    let cfg: AuditConfig = serde_yaml::from_str(&content)
        .map_err(|e| format!("Invalid config file '{}': {e}", path.display()))?;
    cfg.validate()
        .map_err(|e| format!("Config file '{}': {e}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(cfg)
}

/// `<user config dir>/commit-audit/config.yml`, when the platform has one.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("commit-audit").join("config.yml"))
}

/// Loads `explicit` if given, otherwise the per-user default file if it
/// exists, otherwise an empty config.
pub fn resolve_config(explicit: Option<&Path>) -> Result<AuditConfig, String> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    match default_config_path() {
        Some(path) if path.is_file() => load_config(&path),
        _ => Ok(AuditConfig::default()),
    }
}

/// Annotated YAML template printed by `--generate-config`.
pub static TEMPLATE: &str = r#"# commit-audit configuration file
# Generated by: commit-audit --generate-config
#
# All settings are optional. Omit any field to use the built-in default.
# CLI flags always take precedence over values in this file.
# Pass it with --config, or save it as <config dir>/commit-audit/config.yml
# (e.g. ~/.config/commit-audit/config.yml) to have it picked up automatically.

# ── Output ─────────────────────────────────────────────────────────────────────

# Output format: terminal, json
# format: "terminal"

# Output file path (json only). Defaults to stdout.
# output: "audit-report.json"

# ── History reading ────────────────────────────────────────────────────────────

# Newest commits to read per repository (also the shallow clone depth).
# max_commits: 100

# Remote repositories whose checkout exceeds this size are rejected.
# max_repo_size_mb: 500

# A clone still running after this many seconds is killed.
# clone_timeout_secs: 300

# ── Execution ──────────────────────────────────────────────────────────────────

# Repositories analyzed at the same time.
# concurrency: 4

# Wall clock used for hour/day bucketing: local or utc
# timezone: "local"

# ── Red-flag penalties ─────────────────────────────────────────────────────────
# Added to the score when the rule fires. Must be 0 or negative.

# penalties:
#   low_activity:      -15   # fewer than 5 commits
#   no_collaboration:  -5    # one author, more than 5 commits
#   suspicious_timing: -25   # over 80% of commits in the same hour
#   bulk_upload:       -20   # a commit touching over 1000 lines
#   burst_activity:    -25   # over 20 commits in under 7 days
#   generic_messages:  -10   # over half the messages are placeholders
#   dominated_repo:    -5    # one of several authors made over 95%
"#;

/// Prints the config template to stdout, or writes it to `output_path` if given.
pub fn print_template(output_path: Option<&Path>) -> Result<(), String> {
    match output_path {
        Some(path) => std::fs::write(path, TEMPLATE)
            .map_err(|e| format!("Cannot write config template to '{}': {e}", path.display())),
        None => {
            print!("{TEMPLATE}");
            Ok(())
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
