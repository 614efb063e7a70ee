//! Threat intelligence integration module
//!
//! Reputation lookups for file checksums.

use crate::config::VirusTotalConfig;
use crate::error::{EnrichError, Result};
use crate::pipeline::Stage;
use crate::types::ScanResult;
use crate::validate::Checksum;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Browser-like identification; plain library agents get filtered upstream
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/51.0.2704.103 Safari/537.36";

const SERVICE: &str = "VirusTotal";

/// Trait for threat intelligence providers
#[async_trait]
pub trait ThreatIntelProvider: Send + Sync {
    /// Fetch the file report for a checksum.
    ///
    /// Fails with [`EnrichError::ArtifactNotFoundUpstream`] when the provider
    /// has never seen the file.
    async fn check_hash(&self, checksum: &Checksum) -> Result<ScanResult>;

    /// Get provider name
    fn name(&self) -> &str;
}

/// Raw v2 file report. Everything except `response_code` is absent when
/// the resource is unknown.
#[derive(Debug, Deserialize)]
struct FileReport {
    response_code: i32,
    #[serde(default)]
    verbose_msg: Option<String>,
    positives: Option<u32>,
    total: Option<u32>,
    permalink: Option<String>,
    scan_date: Option<String>,
    md5: Option<String>,
    sha1: Option<String>,
    sha256: Option<String>,
}

impl FileReport {
    fn into_scan_result(self) -> Result<ScanResult> {
        fn field<T>(value: Option<T>, name: &str) -> Result<T> {
            value.ok_or_else(|| {
                EnrichError::transport(
                    SERVICE,
                    Stage::Querying,
                    format!("report is missing '{}'", name),
                )
            })
        }

        Ok(ScanResult {
            positives: field(self.positives, "positives")?,
            total: field(self.total, "total")?,
            permalink: field(self.permalink, "permalink")?,
            scan_date: field(self.scan_date, "scan_date")?,
            md5: field(self.md5, "md5")?,
            sha1: field(self.sha1, "sha1")?,
            sha256: field(self.sha256, "sha256")?,
        })
    }
}

/// VirusTotal file report lookups
pub struct VirusTotalProvider {
    http_client: reqwest::Client,
    url: String,
    api_key: String,
}

impl VirusTotalProvider {
    /// Create a new VirusTotal provider
    pub fn new(config: &VirusTotalConfig, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| EnrichError::transport(SERVICE, Stage::Querying, e))?;

        Ok(Self {
            http_client,
            url: config.url.clone(),
            api_key: config.key.clone(),
        })
    }
}

#[async_trait]
impl ThreatIntelProvider for VirusTotalProvider {
    async fn check_hash(&self, checksum: &Checksum) -> Result<ScanResult> {
        debug!("Querying {} for {} {}", SERVICE, checksum.kind(), checksum);

        let response = self
            .http_client
            .get(&self.url)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("resource", checksum.as_str()),
                ("allinfo", "1"),
            ])
            .send()
            .await
            .map_err(|e| EnrichError::transport(SERVICE, Stage::Querying, e))?;

        match response.status() {
            // v2 answers quota exhaustion with an empty 204
            StatusCode::NO_CONTENT => {
                return Err(EnrichError::transport(
                    SERVICE,
                    Stage::Querying,
                    "request rate limit exceeded",
                ))
            }
            StatusCode::FORBIDDEN => {
                return Err(EnrichError::transport(
                    SERVICE,
                    Stage::Querying,
                    "API key was rejected",
                ))
            }
            status if !status.is_success() => {
                return Err(EnrichError::transport(
                    SERVICE,
                    Stage::Querying,
                    format!("unexpected status {}", status),
                ))
            }
            _ => {}
        }

        let report: FileReport = response
            .json()
            .await
            .map_err(|e| {
                EnrichError::transport(
                    SERVICE,
                    Stage::Querying,
                    format!("failed to parse response: {}", e),
                )
            })?;

        if report.response_code != 1 {
            debug!(
                "{} response_code {}: {}",
                SERVICE,
                report.response_code,
                report.verbose_msg.as_deref().unwrap_or("-")
            );
            return Err(EnrichError::ArtifactNotFoundUpstream(checksum.to_string()));
        }

        info!("The artifact was found on {}", SERVICE);
        report.into_scan_result()
    }

    fn name(&self) -> &str {
        SERVICE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_conversion() {
        let report: FileReport = serde_json::from_value(serde_json::json!({
            "response_code": 1,
            "positives": 3,
            "total": 60,
            "permalink": "http://x",
            "scan_date": "2018-01-01",
            "md5": "d41d8cd98f00b204e9800998ecf8427e",
            "sha1": "da39a3ee5e6b4b0d3255bfef95601890afd80709",
            "sha256": "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
            "scans": {}
        }))
        .unwrap();

        let scan = report.into_scan_result().unwrap();
        assert_eq!(scan.detection_ratio(), "3/60");
        assert_eq!(scan.permalink, "http://x");
    }

    #[test]
    fn test_unknown_resource_report_parses() {
        let report: FileReport = serde_json::from_str(
            r#"{"response_code": 0, "resource": "abc", "verbose_msg": "The requested resource is not among the finished, queued or pending scans"}"#,
        )
        .unwrap();
        assert_eq!(report.response_code, 0);
        assert!(report.permalink.is_none());
    }

    #[test]
    fn test_incomplete_report_is_transport_error() {
        let complete = serde_json::json!({
            "response_code": 1,
            "positives": 1,
            "total": 2,
            "permalink": "http://x",
            "scan_date": "2018-01-01",
            "md5": "d41d8cd98f00b204e9800998ecf8427e",
            "sha1": "da39a3ee5e6b4b0d3255bfef95601890afd80709",
            "sha256": "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        });

        for missing in ["positives", "total", "permalink", "sha256"] {
            let mut value = complete.clone();
            value.as_object_mut().unwrap().remove(missing);
            let report: FileReport = serde_json::from_value(value).unwrap();

            match report.into_scan_result() {
                Err(err @ EnrichError::Transport { .. }) => {
                    assert!(err.to_string().contains(missing), "{}", err);
                    assert_eq!(err.stage(), Some(Stage::Querying));
                }
                other => panic!("expected transport error without '{}', got {:?}", missing, other),
            }
        }
    }

    #[test]
    fn test_zero_detections_are_kept() {
        let report: FileReport = serde_json::from_value(serde_json::json!({
            "response_code": 1,
            "positives": 0,
            "total": 58,
            "permalink": "http://x",
            "scan_date": "2018-01-01",
            "md5": "d41d8cd98f00b204e9800998ecf8427e",
            "sha1": "da39a3ee5e6b4b0d3255bfef95601890afd80709",
            "sha256": "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        }))
        .unwrap();

        assert_eq!(report.into_scan_result().unwrap().detection_ratio(), "0/58");
    }
}
