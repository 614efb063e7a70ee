//! Output formatting for enrichment outcomes

use anyhow::Result;
use colored::Colorize;
use vt_enrich_core::EnrichmentOutcome;

use crate::commands::banner;

/// Output format options
#[derive(Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Format an outcome according to the specified format
pub fn format_outcome(outcome: &EnrichmentOutcome, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format_text(outcome)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(outcome)?),
    }
}

fn format_text(outcome: &EnrichmentOutcome) -> String {
    let scan = &outcome.scan;
    let mut output = String::new();

    output.push_str(&format!("\n{} {}\n", "Event:".bold(), outcome.event_uuid));
    output.push_str(&format!(
        "{} {} ({})\n",
        "Checksum:".bold(),
        outcome.checksum,
        outcome.checksum_kind
    ));
    output.push_str(&format!("{}\n", "=".repeat(60)));

    output.push_str(&format!("{}\n", "virustotal-report".cyan().bold()));
    output.push_str(&format!("    Permalink: {}\n", scan.permalink));
    output.push_str(&format!(
        "    Detection: {}\n",
        banner::detection_badge(&scan.detection_ratio(), scan.is_detected())
    ));
    output.push_str(&format!("    Last scan: {}\n", scan.scan_date));
    output.push_str(&format!("    Object:    {}\n", outcome.report_object_uuid.dimmed()));

    output.push_str(&format!("{}\n", "file".cyan().bold()));
    output.push_str(&format!("    MD5:       {}\n", scan.md5));
    output.push_str(&format!("    SHA1:      {}\n", scan.sha1));
    output.push_str(&format!("    SHA256:    {}\n", scan.sha256));
    output.push_str(&format!("    Object:    {}\n", outcome.file_object_uuid.dimmed()));

    output.push_str(&format!("{}\n", "=".repeat(60)));
    if outcome.pushed {
        output.push_str(&format!(
            "{} The MISP objects have been added to the event ({}ms)",
            banner::status_ok(),
            outcome.duration_ms
        ));
    } else {
        output.push_str(&format!(
            "{} Event was not updated",
            banner::status_dry_run()
        ));
    }

    output
}
