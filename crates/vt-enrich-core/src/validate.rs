//! Lexical validation of operator input

use crate::error::{EnrichError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

lazy_static! {
    static ref CHECKSUM: Regex =
        Regex::new(r"^(?:[a-fA-F0-9]{64}|[a-fA-F0-9]{40}|[a-fA-F0-9]{32})$").unwrap();
    static ref EVENT_UUID: Regex = Regex::new(
        r"^[a-fA-F0-9]{8}-[a-fA-F0-9]{4}-[a-fA-F0-9]{4}-[a-fA-F0-9]{4}-[a-fA-F0-9]{12}$"
    )
    .unwrap();
}

/// Digest algorithm, derived from the checksum length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HashKind {
    Md5,
    Sha1,
    Sha256,
}

impl std::fmt::Display for HashKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashKind::Md5 => write!(f, "MD5"),
            HashKind::Sha1 => write!(f, "SHA-1"),
            HashKind::Sha256 => write!(f, "SHA-256"),
        }
    }
}

/// A checksum that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksum {
    value: String,
    kind: HashKind,
}

impl Checksum {
    /// Validate a MD5, SHA-1 or SHA-256 hex string
    pub fn parse(value: &str) -> Result<Self> {
        if !CHECKSUM.is_match(value) {
            return Err(EnrichError::InvalidChecksumFormat(value.to_string()));
        }

        let kind = match value.len() {
            32 => HashKind::Md5,
            40 => HashKind::Sha1,
            _ => HashKind::Sha256,
        };

        Ok(Self {
            value: value.to_string(),
            kind,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> HashKind {
        self.kind
    }
}

impl std::fmt::Display for Checksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

/// Validate the canonical 8-4-4-4-12 hyphenated UUID form
pub fn validate_event_uuid(value: &str) -> Result<&str> {
    if EVENT_UUID.is_match(value) {
        Ok(value)
    } else {
        Err(EnrichError::InvalidUuidFormat(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_supported_lengths() {
        let md5 = Checksum::parse("d41d8cd98f00b204e9800998ecf8427e").unwrap();
        assert_eq!(md5.kind(), HashKind::Md5);

        let sha1 = Checksum::parse("da39a3ee5e6b4b0d3255bfef95601890afd80709").unwrap();
        assert_eq!(sha1.kind(), HashKind::Sha1);

        let sha256 = Checksum::parse(
            "E3B0C44298FC1C149AFBF4C8996FB92427AE41E4649B934CA495991B7852B855",
        )
        .unwrap();
        assert_eq!(sha256.kind(), HashKind::Sha256);
        assert_eq!(
            sha256.as_str(),
            "E3B0C44298FC1C149AFBF4C8996FB92427AE41E4649B934CA495991B7852B855"
        );
    }

    #[test]
    fn test_rejects_bad_checksums() {
        let sha384_length = "a".repeat(96);
        let sha512_length = "a".repeat(128);
        for bad in [
            "",
            "d41d8cd98f00b204e9800998ecf8427",
            "d41d8cd98f00b204e9800998ecf8427e0",
            "g41d8cd98f00b204e9800998ecf8427e",
            " d41d8cd98f00b204e9800998ecf8427e",
            "d41d8cd98f00b204e9800998ecf8427e\n",
            sha384_length.as_str(),
            sha512_length.as_str(),
        ] {
            let err = Checksum::parse(bad).unwrap_err();
            assert!(
                matches!(err, EnrichError::InvalidChecksumFormat(_)),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_uuid_validation() {
        assert!(validate_event_uuid("5b51eadd-7e9c-4015-b49c-3df79f590eb0").is_ok());
        assert!(validate_event_uuid("5B51EADD-7E9C-4015-B49C-3DF79F590EB0").is_ok());

        for bad in [
            "5b51eadd7e9c4015b49c3df79f590eb0",
            "5b51eadd-7e9c-4015-b49c-3df79f590eb",
            "{5b51eadd-7e9c-4015-b49c-3df79f590eb0}",
            "------------------------------------",
            "5b51eadd-7e9c-4015-b49c3-df79f590eb0",
            "zb51eadd-7e9c-4015-b49c-3df79f590eb0",
        ] {
            assert!(
                matches!(validate_event_uuid(bad), Err(EnrichError::InvalidUuidFormat(_))),
                "accepted {:?}",
                bad
            );
        }
    }
}
