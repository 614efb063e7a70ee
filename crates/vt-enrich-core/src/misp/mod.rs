//! MISP event retrieval and update
//!
//! Talks to the MISP REST API directly: `events/view/{uuid}` to load an
//! event and `events/edit/{id}` to push it back with new objects attached.

use crate::config::MispConfig;
use crate::error::{EnrichError, Result};
use crate::pipeline::Stage;
use crate::types::Event;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

const SERVICE: &str = "MISP";

/// Trait for event-management backends
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Load an event by UUID.
    ///
    /// Returns [`EnrichError::EventNotFound`] when the backend has no such
    /// event and [`EnrichError::Transport`] when it cannot be reached.
    async fn get_event(&self, uuid: &str) -> Result<Event>;

    /// Replace the stored event with `event`
    async fn update_event(&self, event: &Event) -> Result<()>;

    /// Get backend name
    fn name(&self) -> &str;
}

#[derive(Deserialize)]
struct EventEnvelope {
    #[serde(rename = "Event")]
    event: Option<Event>,
    #[serde(default)]
    errors: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct EventPayload<'a> {
    #[serde(rename = "Event")]
    event: &'a Event,
}

/// MISP REST client
pub struct MispClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl MispClient {
    /// Create a new MISP client
    pub fn new(config: &MispConfig, timeout: Duration) -> Result<Self> {
        let mut key = HeaderValue::from_str(&config.key)
            .map_err(|_| EnrichError::Config("misp.key contains invalid characters".to_string()))?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if !config.verify_cert {
            warn!("Certificate verification is disabled for {}", config.url);
        }

        let http_client = reqwest::Client::builder()
            .user_agent(format!("vt-enrich/{}", crate::VERSION))
            .default_headers(headers)
            .danger_accept_invalid_certs(!config.verify_cert)
            .timeout(timeout)
            .build()
            .map_err(|e| EnrichError::transport(SERVICE, Stage::Loading, e))?;

        Ok(Self {
            http_client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl EventStore for MispClient {
    async fn get_event(&self, uuid: &str) -> Result<Event> {
        let url = self.endpoint(&format!("events/view/{}", uuid));
        debug!("Fetching event from: {}", url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| EnrichError::transport(SERVICE, Stage::Loading, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::FORBIDDEN {
            // MISP answers 403 for events the key may not see
            return Err(EnrichError::EventNotFound(uuid.to_string()));
        }
        if !status.is_success() {
            return Err(EnrichError::transport(
                SERVICE,
                Stage::Loading,
                format!("unexpected status {} for event {}", status, uuid),
            ));
        }

        let envelope: EventEnvelope = response.json().await.map_err(|e| {
            EnrichError::transport(
                SERVICE,
                Stage::Loading,
                format!("failed to parse response: {}", e),
            )
        })?;

        if let Some(errors) = envelope.errors {
            debug!("{} reported errors for {}: {}", SERVICE, uuid, errors);
        }

        let event = envelope
            .event
            .ok_or_else(|| EnrichError::EventNotFound(uuid.to_string()))?;

        info!("UUID for MISP event detected: {} ({})", event.uuid, event.info);
        Ok(event)
    }

    async fn update_event(&self, event: &Event) -> Result<()> {
        let key = event.id.as_deref().unwrap_or(&event.uuid);
        let url = self.endpoint(&format!("events/edit/{}", key));
        debug!("Pushing event {} with {} objects to: {}", event.uuid, event.objects.len(), url);

        let response = self
            .http_client
            .post(&url)
            .json(&EventPayload { event })
            .send()
            .await
            .map_err(|e| EnrichError::EventUpdateFailed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| EnrichError::EventUpdateFailed(e.to_string()))?;

        if !status.is_success() {
            return Err(EnrichError::EventUpdateFailed(format!(
                "status {}: {}",
                status,
                body.trim()
            )));
        }

        if let Ok(envelope) = serde_json::from_str::<EventEnvelope>(&body) {
            if let Some(errors) = envelope.errors {
                return Err(EnrichError::EventUpdateFailed(errors.to_string()));
            }
        }

        info!("Event {} updated", event.uuid);
        Ok(())
    }

    fn name(&self) -> &str {
        SERVICE
    }
}
