//! The enrichment pipeline
//!
//! Validating -> Loading -> CheckingDuplicate -> Querying -> Updating -> Done.
//! Every stage is a hard gate; the first error ends the run and nothing is
//! written to the event service before the final push.

use crate::config::Config;
use crate::error::{EnrichError, Result};
use crate::misp::{EventStore, MispClient};
use crate::objects::build_objects;
use crate::threat_intel::{ThreatIntelProvider, VirusTotalProvider};
use crate::types::ScanResult;
use crate::validate::{validate_event_uuid, Checksum, HashKind};
use serde::Serialize;
use tracing::{debug, info};

/// UTC timestamp attached to outcomes
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validating,
    Loading,
    CheckingDuplicate,
    Querying,
    Updating,
    /// Terminal state of a successful run, dry runs included
    Done,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Validating => write!(f, "validating input"),
            Stage::Loading => write!(f, "loading event"),
            Stage::CheckingDuplicate => write!(f, "checking for duplicates"),
            Stage::Querying => write!(f, "querying reputation service"),
            Stage::Updating => write!(f, "updating event"),
            Stage::Done => write!(f, "done"),
        }
    }
}

/// Options for a single run
#[derive(Debug, Clone, Default)]
pub struct EnrichOptions {
    /// Build the objects but do not push the event
    pub dry_run: bool,
    /// Compare checksums ignoring ASCII case
    pub ignore_case: bool,
}

/// Result of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct EnrichmentOutcome {
    pub event_uuid: String,
    pub checksum: String,
    pub checksum_kind: HashKind,
    pub scan: ScanResult,
    /// UUID of the new `virustotal-report` object
    pub report_object_uuid: String,
    /// UUID of the new `file` object
    pub file_object_uuid: String,
    /// False for dry runs
    pub pushed: bool,
    /// Always [`Stage::Done`]
    pub stage: Stage,
    pub timestamp: Timestamp,
    pub duration_ms: u64,
}

/// Orchestrates one enrichment run against an event store and a provider
pub struct Enricher {
    store: Box<dyn EventStore>,
    provider: Box<dyn ThreatIntelProvider>,
    options: EnrichOptions,
}

impl Enricher {
    /// Create an enricher over explicit backends
    pub fn new(
        store: Box<dyn EventStore>,
        provider: Box<dyn ThreatIntelProvider>,
        options: EnrichOptions,
    ) -> Self {
        Self {
            store,
            provider,
            options,
        }
    }

    /// Create an enricher talking to MISP and VirusTotal as configured
    pub fn from_config(config: &Config, dry_run: bool) -> Result<Self> {
        let store = MispClient::new(&config.misp, config.timeout())?;
        let provider = VirusTotalProvider::new(&config.virustotal, config.timeout())?;

        Ok(Self::new(
            Box::new(store),
            Box::new(provider),
            EnrichOptions {
                dry_run,
                ignore_case: config.duplicates.ignore_case,
            },
        ))
    }

    /// Attach the report for `checksum` to the event `event_uuid`
    pub async fn run(&self, checksum: &str, event_uuid: &str) -> Result<EnrichmentOutcome> {
        let start = std::time::Instant::now();

        debug!("Stage: {}", Stage::Validating);
        let checksum = Checksum::parse(checksum)?;
        info!("Checksum is a valid {}", checksum.kind());
        let event_uuid = validate_event_uuid(event_uuid)?;
        info!("UUID is valid");

        debug!("Stage: {}", Stage::Loading);
        let mut event = self.store.get_event(event_uuid).await?;

        debug!("Stage: {}", Stage::CheckingDuplicate);
        let present = if self.options.ignore_case {
            event.contains_attribute_value_ignore_case(checksum.as_str())
        } else {
            event.contains_attribute_value(checksum.as_str())
        };
        if present {
            return Err(EnrichError::ChecksumAlreadyPresent {
                checksum: checksum.to_string(),
                event: event_uuid.to_string(),
            });
        }
        info!("Checksum {} was not detected in the event", checksum);

        debug!("Stage: {} ({})", Stage::Querying, self.provider.name());
        let scan = self.provider.check_hash(&checksum).await?;

        let objects = build_objects(&scan);
        let report_object_uuid = event.add_object(objects.report);
        let file_object_uuid = event.add_object(objects.file);
        info!(
            "Created objects: report {} and file {}",
            report_object_uuid, file_object_uuid
        );

        let pushed = if self.options.dry_run {
            info!("Dry run, not pushing event {}", event.uuid);
            false
        } else {
            debug!("Stage: {} ({})", Stage::Updating, self.store.name());
            self.store.update_event(&event).await?;
            true
        };
        debug!("Stage: {}", Stage::Done);

        Ok(EnrichmentOutcome {
            event_uuid: event.uuid.clone(),
            checksum: checksum.to_string(),
            checksum_kind: checksum.kind(),
            scan,
            report_object_uuid,
            file_object_uuid,
            pushed,
            stage: Stage::Done,
            timestamp: chrono::Utc::now(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}
