use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use crate::types::BatchReport;

/// Outputs the report as JSON. Writes to a file if given, otherwise stdout.
pub fn report_json(report: &BatchReport, output_file: Option<&Path>) -> Result<(), String> {
    if let Some(path) = output_file {
        let file = File::create(path)
            .map_err(|e| format!("Failed to open {} for writing: {e}", path.display()))?;
        write_report(report, BufWriter::new(file))
            .map_err(|e| format!("Failed to write {}: {e}", path.display()))?;
        eprintln!("✓ JSON report written to {}", path.display());
    } else {
        let stdout = std::io::stdout();
        write_report(report, BufWriter::new(stdout.lock()))
            .map_err(|e| format!("Failed to write stdout: {e}"))?;
    }

    Ok(())
}

fn write_report<W: Write>(report: &BatchReport, mut writer: W) -> Result<(), String> {
    serde_json::to_writer_pretty(&mut writer, report)
        .map_err(|e| format!("JSON serialization failed: {e}"))?;
    writer.write_all(b"\n").map_err(|e| e.to_string())?;
    writer.flush().map_err(|e| e.to_string())
}
