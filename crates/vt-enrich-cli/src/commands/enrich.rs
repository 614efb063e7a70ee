//! Enrich command - attach a VirusTotal report to a MISP event

use anyhow::{Context, Result};
use std::path::PathBuf;

use vt_enrich_core::validate::validate_event_uuid;
use vt_enrich_core::{Checksum, Config, Enricher};

use super::banner;
use crate::output::{self, OutputFormat};

/// Parsed command-line input for one run
pub struct Args {
    pub checksum: String,
    pub uuid: String,
    pub config: Option<PathBuf>,
    pub dry_run: bool,
    pub format: crate::OutputFormat,
    pub quiet: bool,
}

/// Run the enrichment
pub async fn run(args: Args) -> Result<()> {
    let format = match args.format {
        crate::OutputFormat::Text => OutputFormat::Text,
        crate::OutputFormat::Json => OutputFormat::Json,
    };
    let show_text = matches!(format, OutputFormat::Text) && !args.quiet;

    if show_text {
        banner::print_banner();
    }

    // Malformed input fails before the config file is read
    Checksum::parse(&args.checksum)?;
    validate_event_uuid(&args.uuid)?;

    let config_path = args.config.unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path)?;
    tracing::debug!("Loaded configuration: {:?}", config);

    let enricher = Enricher::from_config(&config, args.dry_run)?;
    let outcome = enricher
        .run(&args.checksum, &args.uuid)
        .await
        .with_context(|| format!("Enrichment of event {} failed", args.uuid))?;

    if args.quiet {
        return Ok(());
    }

    let rendered = output::format_outcome(&outcome, format)?;
    println!("{}", rendered);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vt_enrich_core::EnrichError;

    fn args(checksum: &str, uuid: &str) -> Args {
        Args {
            checksum: checksum.to_string(),
            uuid: uuid.to_string(),
            config: Some(PathBuf::from("/nonexistent/vt.toml")),
            dry_run: false,
            format: crate::OutputFormat::Text,
            quiet: true,
        }
    }

    #[tokio::test]
    async fn test_bad_checksum_wins_over_missing_config() {
        let err = run(args("not-a-hash", "5b51eadd-7e9c-4015-b49c-3df79f590eb0"))
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<EnrichError>(),
            Some(EnrichError::InvalidChecksumFormat(_))
        ));
        assert_eq!(crate::exit_status(&err), 3);
    }

    #[tokio::test]
    async fn test_bad_uuid_wins_over_missing_config() {
        let err = run(args("d41d8cd98f00b204e9800998ecf8427e", "5b51eadd7e9c4015"))
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<EnrichError>(),
            Some(EnrichError::InvalidUuidFormat(_))
        ));
        assert_eq!(crate::exit_status(&err), 4);
    }

    #[tokio::test]
    async fn test_valid_input_reaches_config_loading() {
        let err = run(args(
            "d41d8cd98f00b204e9800998ecf8427e",
            "5b51eadd-7e9c-4015-b49c-3df79f590eb0",
        ))
        .await
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<EnrichError>(),
            Some(EnrichError::Config(_))
        ));
        assert_eq!(crate::exit_status(&err), 1);
    }
}
