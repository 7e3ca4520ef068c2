use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use super::types::{
    HealthStatus, LinkedInInput, LinkedInInsight, QueueStats, RecordId, TaskStatus, Transcript,
    TranscriptInput,
};
use super::ApiClient;
use crate::error::{FailureKind, RequestError, Resource};

type Queue<T> = Mutex<VecDeque<Result<T, RequestError>>>;

/// In-memory `ApiClient`. Each queue hands out responses in order and keeps
/// repeating its last entry once only one is left.
#[derive(Debug, Default)]
pub struct MockApi {
    transcripts: Queue<Vec<Transcript>>,
    insights: Queue<Vec<LinkedInInsight>>,
    created_transcripts: Queue<Transcript>,
    created_insights: Queue<LinkedInInsight>,
    queue_stats: Queue<QueueStats>,
    transcript_inputs: Mutex<Vec<TranscriptInput>>,
    linkedin_inputs: Mutex<Vec<LinkedInInput>>,
    calls: Mutex<Vec<&'static str>>,
    list_latency: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_transcripts(&self, resp: Result<Vec<Transcript>, RequestError>) {
        self.transcripts.lock().unwrap().push_back(resp);
    }

    pub fn push_insights(&self, resp: Result<Vec<LinkedInInsight>, RequestError>) {
        self.insights.lock().unwrap().push_back(resp);
    }

    pub fn push_created_transcript(&self, resp: Result<Transcript, RequestError>) {
        self.created_transcripts.lock().unwrap().push_back(resp);
    }

    pub fn push_created_insight(&self, resp: Result<LinkedInInsight, RequestError>) {
        self.created_insights.lock().unwrap().push_back(resp);
    }

    pub fn push_queue_stats(&self, resp: Result<QueueStats, RequestError>) {
        self.queue_stats.lock().unwrap().push_back(resp);
    }

    /// Delay every list call; lets tests observe in-flight cycles.
    pub fn set_list_latency(&self, latency: Duration) {
        *self.list_latency.lock().unwrap() = Some(latency);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == name).count()
    }

    pub fn transcript_inputs(&self) -> Vec<TranscriptInput> {
        self.transcript_inputs.lock().unwrap().clone()
    }

    pub fn linkedin_inputs(&self) -> Vec<LinkedInInput> {
        self.linkedin_inputs.lock().unwrap().clone()
    }

    /// Highest number of list calls that were outstanding at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }

    async fn list_delay(&self) {
        let latency = *self.list_latency.lock().unwrap();
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(d) = latency {
            tokio::time::sleep(d).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

fn next<T: Clone>(queue: &Queue<T>, resource: Resource) -> Result<T, RequestError> {
    let mut q = queue.lock().unwrap();
    if q.len() > 1 {
        return q.pop_front().unwrap_or_else(|| Err(empty(resource)));
    }
    q.front().cloned().unwrap_or_else(|| Err(empty(resource)))
}

fn empty(resource: Resource) -> RequestError {
    RequestError {
        resource,
        status: None,
        kind: FailureKind::Transport,
        detail: Some("mock response queue is empty".into()),
    }
}

pub fn server_error(resource: Resource) -> RequestError {
    RequestError::status(resource, StatusCode::INTERNAL_SERVER_ERROR)
}

pub fn transcript(id: &str, created_at: &str) -> Transcript {
    Transcript {
        id: RecordId::new(id),
        company_name: "Acme".into(),
        attendees: vec!["Jo".into(), "Sam".into()],
        date: "2024-01-01".into(),
        transcript_text: "Jo: thanks for joining. Sam: happy to be here.".into(),
        created_at: created_at.into(),
        ..Transcript::default()
    }
}

pub fn linkedin(id: &str, created_at: &str) -> LinkedInInsight {
    LinkedInInsight {
        id: RecordId::new(id),
        linkedin_bio: "VP of Operations at TechStart Inc.".into(),
        pitch_deck_content: "Slide 1: AI-Powered Project Management Tool".into(),
        created_at: created_at.into(),
        ..LinkedInInsight::default()
    }
}

#[async_trait]
impl ApiClient for MockApi {
    async fn create_transcript(&self, input: &TranscriptInput) -> Result<Transcript, RequestError> {
        self.record("create_transcript");
        self.transcript_inputs.lock().unwrap().push(input.clone());
        next(&self.created_transcripts, Resource::Transcripts)
    }

    async fn list_transcripts(&self) -> Result<Vec<Transcript>, RequestError> {
        self.record("list_transcripts");
        self.list_delay().await;
        next(&self.transcripts, Resource::Transcripts)
    }

    async fn get_transcript(&self, id: &RecordId) -> Result<Transcript, RequestError> {
        self.record("get_transcript");
        let found = self
            .transcripts
            .lock()
            .unwrap()
            .front()
            .and_then(|r| r.as_ref().ok())
            .and_then(|rows| rows.iter().find(|t| &t.id == id).cloned());
        found.ok_or_else(|| RequestError::status(Resource::Transcripts, StatusCode::NOT_FOUND))
    }

    async fn create_linkedin_insight(&self, input: &LinkedInInput) -> Result<LinkedInInsight, RequestError> {
        self.record("create_linkedin_insight");
        self.linkedin_inputs.lock().unwrap().push(input.clone());
        next(&self.created_insights, Resource::LinkedInInsights)
    }

    async fn list_linkedin_insights(&self) -> Result<Vec<LinkedInInsight>, RequestError> {
        self.record("list_linkedin_insights");
        self.list_delay().await;
        next(&self.insights, Resource::LinkedInInsights)
    }

    async fn get_linkedin_insight(&self, id: &RecordId) -> Result<LinkedInInsight, RequestError> {
        self.record("get_linkedin_insight");
        let found = self
            .insights
            .lock()
            .unwrap()
            .front()
            .and_then(|r| r.as_ref().ok())
            .and_then(|rows| rows.iter().find(|l| &l.id == id).cloned());
        found.ok_or_else(|| RequestError::status(Resource::LinkedInInsights, StatusCode::NOT_FOUND))
    }

    async fn get_task_status(&self, task_id: &str) -> Result<TaskStatus, RequestError> {
        self.record("get_task_status");
        Ok(TaskStatus {
            task_id: task_id.to_string(),
            status: "PENDING".into(),
            result: None,
            info: None,
            traceback: None,
        })
    }

    async fn get_queue_stats(&self) -> Result<QueueStats, RequestError> {
        self.record("get_queue_stats");
        next(&self.queue_stats, Resource::QueueStats)
    }

    async fn health_check(&self) -> Result<HealthStatus, RequestError> {
        self.record("health_check");
        Ok(HealthStatus { status: "healthy".into() })
    }
}
