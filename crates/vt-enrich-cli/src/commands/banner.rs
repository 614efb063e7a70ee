//! CLI banner and branding

use colored::Colorize;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Print the splash banner
pub fn print_banner() {
    println!();
    println!("{}", "VirusTotal to MISP".cyan().bold());
    println!("  {} v{}  |  core v{}", "vt-enrich".white().bold(), VERSION, vt_enrich_core::VERSION);
    println!("{}", "-".repeat(60).dimmed());
}

/// Print a detection badge, red when any engine flagged the file
pub fn detection_badge(ratio: &str, detected: bool) -> String {
    if detected {
        format!("{}", format!(" {} ", ratio).on_red().white().bold())
    } else {
        format!("{}", format!(" {} ", ratio).on_green().black())
    }
}

/// Status indicators
pub fn status_ok() -> String {
    format!("{}", "[OK]".green().bold())
}

pub fn status_dry_run() -> String {
    format!("{}", "[DRY RUN]".yellow().bold())
}
