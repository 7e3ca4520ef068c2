use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

/// Backend resources the client talks to. Used to label failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    Transcripts,
    LinkedInInsights,
    TaskStatus,
    QueueStats,
    Health,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Transcripts => "transcripts",
            Resource::LinkedInInsights => "linkedin insights",
            Resource::TaskStatus => "task status",
            Resource::QueueStats => "queue stats",
            Resource::Health => "health",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// Non-2xx response.
    Status,
    /// Connection refused, reset, DNS, ...
    Transport,
    Timeout,
    /// 2xx response whose body did not match the expected shape.
    Decode,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureKind::Status => "http status",
            FailureKind::Transport => "transport",
            FailureKind::Timeout => "timeout",
            FailureKind::Decode => "decode",
        })
    }
}

/// A failed call to one backend resource. `status` is None when no response arrived.
#[derive(Clone, Debug, Error)]
#[error("{resource} request failed ({kind}{}){}", fmt_status(.status), fmt_detail(.detail))]
pub struct RequestError {
    pub resource: Resource,
    pub status: Option<StatusCode>,
    pub kind: FailureKind,
    pub detail: Option<String>,
}

fn fmt_status(status: &Option<StatusCode>) -> String {
    match status {
        Some(s) => format!(" {}", s.as_u16()),
        None => String::new(),
    }
}

fn fmt_detail(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(": {d}"),
        None => String::new(),
    }
}

impl RequestError {
    pub fn status(resource: Resource, status: StatusCode) -> Self {
        Self { resource, status: Some(status), kind: FailureKind::Status, detail: None }
    }

    pub fn transport(resource: Resource, err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() { FailureKind::Timeout } else { FailureKind::Transport };
        Self { resource, status: None, kind, detail: Some(err.to_string()) }
    }

    pub fn decode(resource: Resource, status: StatusCode, err: serde_json::Error) -> Self {
        Self { resource, status: Some(status), kind: FailureKind::Decode, detail: Some(err.to_string()) }
    }

    pub fn is_retryable(&self) -> bool {
        match self.kind {
            FailureKind::Transport | FailureKind::Timeout => true,
            FailureKind::Status => self.status.is_some_and(|s| s.is_server_error()),
            FailureKind::Decode => false,
        }
    }
}

/// One reconciliation cycle failed. The feed keeps its previous contents.
#[derive(Clone, Debug, Error)]
#[error("Failed to load insights. Please try again.")]
pub struct ReconciliationError {
    #[source]
    pub cause: RequestError,
}

impl From<RequestError> for ReconciliationError {
    fn from(cause: RequestError) -> Self {
        Self { cause }
    }
}

/// Local form problems. These block submission and never reach the network.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required.")]
    MissingField(&'static str),
    #[error("Transcript seems too short. Please provide a more complete conversation.")]
    TranscriptTooShort,
    #[error("Please include at least 2 attendees (you and the prospect).")]
    TooFewAttendees,
    #[error("Meeting date must be a calendar date (YYYY-MM-DD), got {0:?}.")]
    InvalidDate(String),
    #[error("LinkedIn bio seems too short. Please provide more detail.")]
    BioTooShort,
    #[error("Pitch deck content seems too short. Please provide more detail.")]
    PitchTooShort,
}

#[derive(Clone, Debug, Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    /// The backend refused or could not be reached; the form still holds the user's input.
    #[error("{message}")]
    Rejected {
        message: &'static str,
        #[source]
        cause: RequestError,
    },
}

impl SubmissionError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SubmissionError::Rejected { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_display_includes_resource_and_code() {
        let err = RequestError::status(Resource::Transcripts, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "transcripts request failed (http status 500)");
        assert!(err.is_retryable());
    }

    #[test]
    fn client_errors_are_not_retryable() {
        let err = RequestError::status(Resource::LinkedInInsights, StatusCode::NOT_FOUND);
        assert!(!err.is_retryable());
        assert_eq!(err.status, Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn reconciliation_error_is_user_facing() {
        let err = ReconciliationError::from(RequestError::status(Resource::Transcripts, StatusCode::BAD_GATEWAY));
        assert_eq!(err.to_string(), "Failed to load insights. Please try again.");
        assert_eq!(err.cause.resource, Resource::Transcripts);
    }
}
