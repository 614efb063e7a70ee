//! VirusTotal to MISP enrichment library
//!
//! Looks up a file checksum on VirusTotal and attaches the report to a MISP
//! event as a `virustotal-report` object plus a `file` object that
//! references it.

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod error;
pub mod misp;
pub mod objects;
pub mod pipeline;
pub mod threat_intel;
pub mod types;
pub mod validate;

pub use config::Config;
pub use error::{EnrichError, Result};
pub use pipeline::{EnrichOptions, Enricher, EnrichmentOutcome, Stage, Timestamp};
pub use types::*;
pub use validate::{Checksum, HashKind};
