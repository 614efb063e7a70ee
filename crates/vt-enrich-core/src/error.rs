//! Error types for the enrichment pipeline

use crate::pipeline::Stage;
use thiserror::Error;

/// Main error type for enrichment runs
#[derive(Error, Debug)]
pub enum EnrichError {
    /// Checksum is not a 32, 40 or 64 character hex string
    #[error("No checksum detected in '{0}' - value has to be MD5, SHA-1 or SHA-256")]
    InvalidChecksumFormat(String),

    /// Event identifier is not a canonical UUID
    #[error("The UUID '{0}' is not in a valid format")]
    InvalidUuidFormat(String),

    /// The event service has no event with this UUID
    #[error("Event {0} does not exist on the MISP instance")]
    EventNotFound(String),

    /// The checksum is already attached to the event
    #[error("Checksum {checksum} already exists on event {event}")]
    ChecksumAlreadyPresent { checksum: String, event: String },

    /// The reputation service does not know the artifact
    #[error("Artifact {0} is currently not present on VirusTotal")]
    ArtifactNotFoundUpstream(String),

    /// Pushing the enriched event failed
    #[error("An error occurred when updating the event: {0}")]
    EventUpdateFailed(String),

    /// A remote service could not be reached or answered garbage
    #[error("{service} request failed: {message}")]
    Transport {
        service: &'static str,
        stage: Stage,
        message: String,
    },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EnrichError {
    /// Process exit status for this error category.
    ///
    /// 2 is reserved for command-line usage errors.
    pub fn exit_code(&self) -> i32 {
        match self {
            EnrichError::Config(_) | EnrichError::Io(_) => 1,
            EnrichError::InvalidChecksumFormat(_) => 3,
            EnrichError::InvalidUuidFormat(_) => 4,
            EnrichError::EventNotFound(_) => 5,
            EnrichError::ChecksumAlreadyPresent { .. } => 6,
            EnrichError::ArtifactNotFoundUpstream(_) => 7,
            EnrichError::EventUpdateFailed(_) => 8,
            EnrichError::Transport { .. } => 9,
        }
    }

    /// Pipeline stage the error was raised in. Configuration and IO errors
    /// happen before the pipeline starts.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            EnrichError::InvalidChecksumFormat(_) | EnrichError::InvalidUuidFormat(_) => {
                Some(Stage::Validating)
            }
            EnrichError::EventNotFound(_) => Some(Stage::Loading),
            EnrichError::ChecksumAlreadyPresent { .. } => Some(Stage::CheckingDuplicate),
            EnrichError::ArtifactNotFoundUpstream(_) => Some(Stage::Querying),
            EnrichError::EventUpdateFailed(_) => Some(Stage::Updating),
            EnrichError::Transport { stage, .. } => Some(*stage),
            EnrichError::Config(_) | EnrichError::Io(_) => None,
        }
    }

    pub(crate) fn transport(service: &'static str, stage: Stage, e: impl std::fmt::Display) -> Self {
        EnrichError::Transport {
            service,
            stage,
            message: e.to_string(),
        }
    }
}

/// Result type alias for enrichment operations
pub type Result<T> = std::result::Result<T, EnrichError>;

impl From<toml::de::Error> for EnrichError {
    fn from(e: toml::de::Error) -> Self {
        EnrichError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let errors = [
            EnrichError::InvalidChecksumFormat("x".into()),
            EnrichError::InvalidUuidFormat("x".into()),
            EnrichError::EventNotFound("x".into()),
            EnrichError::ChecksumAlreadyPresent {
                checksum: "x".into(),
                event: "y".into(),
            },
            EnrichError::ArtifactNotFoundUpstream("x".into()),
            EnrichError::EventUpdateFailed("x".into()),
            EnrichError::transport("MISP", Stage::Loading, "refused"),
            EnrichError::Config("x".into()),
        ];

        let mut codes: Vec<i32> = errors.iter().map(|e| e.exit_code()).collect();
        assert!(codes.iter().all(|c| *c != 0 && *c != 2));
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_stage_of_update_failure() {
        let err = EnrichError::EventUpdateFailed("boom".into());
        assert_eq!(err.stage(), Some(Stage::Updating));
        assert_eq!(EnrichError::Config("x".into()).stage(), None);
    }

    #[test]
    fn test_transport_error_keeps_its_stage() {
        let err = EnrichError::transport("VirusTotal", Stage::Querying, "connection refused");
        assert_eq!(err.stage(), Some(Stage::Querying));
        assert_eq!(err.exit_code(), 9);
        assert_eq!(err.to_string(), "VirusTotal request failed: connection refused");
    }
}
