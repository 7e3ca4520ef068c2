use async_trait::async_trait;

use crate::error::RequestError;

mod http;
#[cfg(test)]
pub mod mock;
pub mod types;

pub use http::{ApiClientConfig, HttpApiClient};
use types::{
    HealthStatus, LinkedInInput, LinkedInInsight, QueueStats, RecordId, TaskStatus, Transcript,
    TranscriptInput,
};

/// One call per backend resource. Implementations never retry; callers own that policy.
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn create_transcript(&self, input: &TranscriptInput) -> Result<Transcript, RequestError>;
    async fn list_transcripts(&self) -> Result<Vec<Transcript>, RequestError>;
    async fn get_transcript(&self, id: &RecordId) -> Result<Transcript, RequestError>;

    async fn create_linkedin_insight(&self, input: &LinkedInInput) -> Result<LinkedInInsight, RequestError>;
    async fn list_linkedin_insights(&self) -> Result<Vec<LinkedInInsight>, RequestError>;
    async fn get_linkedin_insight(&self, id: &RecordId) -> Result<LinkedInInsight, RequestError>;

    async fn get_task_status(&self, task_id: &str) -> Result<TaskStatus, RequestError>;
    async fn get_queue_stats(&self) -> Result<QueueStats, RequestError>;
    async fn health_check(&self) -> Result<HealthStatus, RequestError>;
}
