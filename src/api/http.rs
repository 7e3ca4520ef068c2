use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use reqwest::{Client as HttpClient, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use super::types::{
    HealthStatus, LinkedInInput, LinkedInInsight, QueueStats, RecordId, TaskStatus, Transcript,
    TranscriptInput,
};
use super::ApiClient;
use crate::error::{RequestError, Resource};

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct ApiClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ApiClientConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(base) = std::env::var("INSIGHT_API_URL") {
            if !base.trim().is_empty() {
                cfg.base_url = base;
            }
        }
        if let Ok(timeout) = std::env::var("INSIGHT_API_TIMEOUT_SECS") {
            if let Ok(parsed) = timeout.parse::<u64>() {
                cfg.timeout = Duration::from_secs(parsed);
            }
        }
        cfg
    }
}

/// reqwest-backed client for the insight API.
#[derive(Clone, Debug)]
pub struct HttpApiClient {
    http: HttpClient,
    base_url: String,
}

impl HttpApiClient {
    pub fn new(cfg: ApiClientConfig) -> Result<Self> {
        // friendly error before any network I/O
        if Url::parse(&cfg.base_url).is_err() { bail!("Invalid API URL: {}", cfg.base_url); }
        let http = HttpClient::builder().timeout(cfg.timeout).build()?;
        Ok(Self { http, base_url: cfg.base_url.trim_end_matches('/').to_string() })
    }

    pub fn base_url(&self) -> &str { &self.base_url }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, resource: Resource, path: &str) -> Result<T, RequestError> {
        let response = self
            .http
            .get(self.endpoint(path))
            .send()
            .await
            .map_err(|e| RequestError::transport(resource, e))?;
        decode(resource, response).await
    }

    async fn post_json<B, T>(&self, resource: Resource, path: &str, body: &B) -> Result<T, RequestError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await
            .map_err(|e| RequestError::transport(resource, e))?;
        decode(resource, response).await
    }
}

async fn decode<T: DeserializeOwned>(resource: Resource, response: Response) -> Result<T, RequestError> {
    let status = response.status();
    // non-2xx is a failure whatever the body says
    if !status.is_success() {
        tracing::debug!(resource = %resource, status = status.as_u16(), "request rejected");
        return Err(RequestError::status(resource, status));
    }
    let bytes = response.bytes().await.map_err(|e| RequestError::transport(resource, e))?;
    serde_json::from_slice(&bytes).map_err(|e| RequestError::decode(resource, status, e))
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn create_transcript(&self, input: &TranscriptInput) -> Result<Transcript, RequestError> {
        self.post_json(Resource::Transcripts, "/api/transcripts/", input).await
    }

    async fn list_transcripts(&self) -> Result<Vec<Transcript>, RequestError> {
        self.get_json(Resource::Transcripts, "/api/transcripts/").await
    }

    async fn get_transcript(&self, id: &RecordId) -> Result<Transcript, RequestError> {
        self.get_json(Resource::Transcripts, &format!("/api/transcripts/{}", id.as_str())).await
    }

    async fn create_linkedin_insight(&self, input: &LinkedInInput) -> Result<LinkedInInsight, RequestError> {
        self.post_json(Resource::LinkedInInsights, "/api/linkedin/", input).await
    }

    async fn list_linkedin_insights(&self) -> Result<Vec<LinkedInInsight>, RequestError> {
        self.get_json(Resource::LinkedInInsights, "/api/linkedin/").await
    }

    async fn get_linkedin_insight(&self, id: &RecordId) -> Result<LinkedInInsight, RequestError> {
        self.get_json(Resource::LinkedInInsights, &format!("/api/linkedin/{}", id.as_str())).await
    }

    async fn get_task_status(&self, task_id: &str) -> Result<TaskStatus, RequestError> {
        self.get_json(Resource::TaskStatus, &format!("/api/tasks/status/{task_id}")).await
    }

    async fn get_queue_stats(&self) -> Result<QueueStats, RequestError> {
        self.get_json(Resource::QueueStats, "/api/tasks/queue/stats").await
    }

    async fn health_check(&self) -> Result<HealthStatus, RequestError> {
        self.get_json(Resource::Health, "/health").await
    }
}
