//! Configuration loading
//!
//! Service endpoints and credentials come from a TOML file, never from the
//! command line. The file is read once per run and the resulting [`Config`]
//! is immutable afterwards.

use crate::error::{EnrichError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// Default VirusTotal file report endpoint
pub const DEFAULT_VT_URL: &str = "https://www.virustotal.com/vtapi/v2/file/report";

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// MISP instance holding the events
    pub misp: MispConfig,
    /// VirusTotal lookup settings
    pub virustotal: VirusTotalConfig,
    /// Duplicate detection behaviour
    #[serde(default)]
    pub duplicates: DuplicateConfig,
    /// Timeout for each HTTP request in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_timeout() -> u64 {
    30
}

/// MISP connection settings
#[derive(Clone, Deserialize)]
pub struct MispConfig {
    pub url: String,
    pub key: String,
    #[serde(default = "default_true")]
    pub verify_cert: bool,
}

/// VirusTotal connection settings
#[derive(Clone, Deserialize)]
pub struct VirusTotalConfig {
    #[serde(default = "default_vt_url")]
    pub url: String,
    pub key: String,
}

/// Duplicate detection settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DuplicateConfig {
    /// Compare checksums ignoring ASCII case
    #[serde(default)]
    pub ignore_case: bool,
}

fn default_true() -> bool {
    true
}

fn default_vt_url() -> String {
    DEFAULT_VT_URL.to_string()
}

// Keys stay out of debug output and logs.
impl std::fmt::Debug for MispConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MispConfig")
            .field("url", &self.url)
            .field("key", &"<redacted>")
            .field("verify_cert", &self.verify_cert)
            .finish()
    }
}

impl std::fmt::Debug for VirusTotalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirusTotalConfig")
            .field("url", &self.url)
            .field("key", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Default config file location (`$XDG_CONFIG_HOME/vt-enrich/config.toml`)
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/etc"))
            .join("vt-enrich")
            .join("config.toml")
    }

    /// Load and validate configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(EnrichError::Config(format!(
                "Config file does not exist: {}",
                path.display()
            )));
        }

        debug!("Loading configuration from: {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| match e {
            EnrichError::Config(msg) => {
                EnrichError::Config(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Parse and validate configuration from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        check_url("misp.url", &self.misp.url)?;
        check_url("virustotal.url", &self.virustotal.url)?;
        check_present("misp.key", &self.misp.key)?;
        check_present("virustotal.key", &self.virustotal.key)?;

        if self.timeout_seconds == 0 {
            return Err(EnrichError::Config(
                "timeout_seconds must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_seconds)
    }
}

fn check_present(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EnrichError::Config(format!("{} must not be empty", field)));
    }
    Ok(())
}

fn check_url(field: &str, value: &str) -> Result<()> {
    let url = Url::parse(value)
        .map_err(|e| EnrichError::Config(format!("{} is not a valid URL ({}): {}", field, e, value)))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(EnrichError::Config(format!(
            "{} must use http or https, got {}",
            field, scheme
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
[misp]
url = "https://misp.example.org"
key = "misp-key"

[virustotal]
key = "vt-key"
"#;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml(MINIMAL).unwrap();

        assert_eq!(config.virustotal.url, DEFAULT_VT_URL);
        assert!(config.misp.verify_cert);
        assert!(!config.duplicates.ignore_case);
        assert_eq!(config.timeout_seconds, 30);
    }

    #[test]
    fn test_full_config() {
        let toml = r#"
timeout_seconds = 5

[misp]
url = "https://10.0.0.5"
key = "misp-key"
verify_cert = false

[virustotal]
url = "http://127.0.0.1:8080/report"
key = "vt-key"

[duplicates]
ignore_case = true
"#;
        let config = Config::from_toml(toml).unwrap();

        assert!(!config.misp.verify_cert);
        assert!(config.duplicates.ignore_case);
        assert_eq!(config.virustotal.url, "http://127.0.0.1:8080/report");
        assert_eq!(config.timeout(), std::time::Duration::from_secs(5));
    }

    #[test]
    fn test_rejects_missing_key() {
        let toml = r#"
[misp]
url = "https://misp.example.org"
key = ""

[virustotal]
key = "vt-key"
"#;
        let err = Config::from_toml(toml).unwrap_err();
        assert!(matches!(err, EnrichError::Config(ref m) if m.contains("misp.key")));
    }

    #[test]
    fn test_rejects_bad_url() {
        let toml = r#"
[misp]
url = "misp.example.org"
key = "k"

[virustotal]
key = "vt-key"
"#;
        assert!(matches!(Config::from_toml(toml), Err(EnrichError::Config(_))));
    }

    #[test]
    fn test_rejects_missing_section() {
        let toml = r#"
[misp]
url = "https://misp.example.org"
key = "k"
"#;
        assert!(matches!(Config::from_toml(toml), Err(EnrichError::Config(_))));
    }

    #[test]
    fn test_debug_redacts_keys() {
        let config = Config::from_toml(MINIMAL).unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("misp-key"));
        assert!(!printed.contains("vt-key"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.misp.url, "https://misp.example.org");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, EnrichError::Config(_)));
    }
}
