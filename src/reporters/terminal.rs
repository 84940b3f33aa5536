use colored::Colorize;
use comfy_table::{Table, Cell, presets::UTF8_FULL};
use crate::types::{AnalysisResult, BatchReport, CommitStatistics, Recommendation, RedFlag, RepoOutcome, Severity};

pub fn report_terminal(report: &BatchReport) {
    eprintln!();
    println!(
        "{} — {} repositor{} ({} analyzed, {} failed)",
        "🔎 commit-audit".cyan().bold(),
        report.summary.repositories.to_string().bright_black(),
        if report.summary.repositories == 1 { "y" } else { "ies" },
        report.summary.analyzed.to_string().bright_black(),
        report.summary.failed.to_string().bright_black(),
    );

    for outcome in &report.results {
        println!();
        match outcome {
            RepoOutcome::Analyzed(result) => print_result(result),
            RepoOutcome::Failed { repository, error } => {
                println!("{} {}", "✖".red().bold(), repository.cyan());
                println!("    {}", error.red());
            }
        }
    }

    if report.summary.repositories > 1 {
        if let Some(mean) = report.summary.mean_score {
            println!();
            println!("{} {:.2}/100", "Mean authenticity score:".bold(), mean);
        }
    }
    println!();
}

fn print_result(result: &AnalysisResult) {
    let score = result.authenticity_score;
    println!(
        "{} {}  {}  {}",
        "📁".white(),
        result.repository.cyan().bold(),
        score_label(score),
        recommendation_label(result.recommendation),
    );
    println!("    {}", result.recommendation.advice().bright_black());

    let Some(stats) = result.statistics.observed() else {
        println!("    {}", "No commits found — nothing to vouch for this history.".yellow());
        return;
    };

    println!("{}", stats_table(stats));

    if result.red_flags.is_empty() {
        println!("    {}", "No red flags detected ✅".green());
    } else {
        println!("    {}", format!("⚠  Red flags ({}):", result.red_flags.len()).yellow());
        for flag in &result.red_flags {
            println!("    {}", flag_line(flag));
        }
    }

    if result.behavior_notes.is_empty() {
        println!("    {}", "Normal commit patterns observed".bright_black());
    } else {
        println!("    {}", "Patterns:".bold());
        for note in &result.behavior_notes {
            println!("      • {}", note.to_string().bright_black());
        }
    }
}

fn stats_table(s: &CommitStatistics) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["METRIC", "VALUE"]);

    let rows: Vec<(&str, String)> = vec![
        ("Commits",             s.total_commits.to_string()),
        ("Authors",             s.unique_authors.to_string()),
        ("Top author",          format!("{} ({} commits)", s.top_author, s.top_author_commits)),
        ("Active span",         format!("{} → {} ({} days)",
                                    s.first_commit_at.format("%Y-%m-%d"),
                                    s.last_commit_at.format("%Y-%m-%d"),
                                    s.days_active)),
        ("Commits per day",     format!("{:.2}", s.commits_per_day)),
        ("Busiest hour / day",  format!("{:02}:00 / {}", s.most_active_hour, s.most_active_day)),
        ("Hour concentration",  format!("{:.0}%", s.hour_concentration * 100.0)),
        ("Commit size avg/med/max", format!("{:.2} / {:.2} / {}",
                                    s.avg_commit_size, s.median_commit_size, s.max_commit_size)),
        ("Generic messages",    format!("{:.0}%", s.generic_message_ratio * 100.0)),
    ];
    for (metric, value) in rows {
        table.add_row(vec![Cell::new(metric), Cell::new(value)]);
    }
    table
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// Score text colored by how trustworthy the history looks.
fn score_label(score: u8) -> String {
    let text = format!("{score:3}/100");
    match score {
        75..=100 => text.green().bold().to_string(),
        50..=74  => text.yellow().bold().to_string(),
        25..=49  => text.yellow().to_string(),
        _        => text.red().bold().to_string(),
    }
}

fn recommendation_label(rec: Recommendation) -> String {
    let text = rec.to_string();
    match rec {
        Recommendation::Recommended         => format!("✅ {}", text.green().bold()),
        Recommendation::ProceedWithCaution  => format!("⚠️  {}", text.yellow().bold()),
        Recommendation::CarefulReviewNeeded => format!("⚠️  {}", text.yellow()),
        Recommendation::NotRecommended      => format!("🚫 {}", text.red().bold()),
    }
}

fn flag_line(flag: &RedFlag) -> String {
    let sev = format!("[{}]", flag.severity);
    let sev = match flag.severity {
        Severity::High   => sev.red().bold(),
        Severity::Medium => sev.yellow(),
        Severity::Low    => sev.bright_black(),
    };
    format!("{} {}: {} {}", sev, flag.kind, flag.message, format!("({:+})", flag.score_impact).bright_black())
}
