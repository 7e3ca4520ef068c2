use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::api::types::{LinkedInInsight, RecordId, Transcript};
use crate::util::time::parse_timestamp;

pub const PREVIEW_CHARS: usize = 150;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    Transcript,
    Linkedin,
}

impl FeedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedKind::Transcript => "transcript",
            FeedKind::Linkedin => "linkedin",
        }
    }
}

/// Lifecycle of a feed item. Server-provided values are kept verbatim, so
/// anything outside the four known states lands in `Other`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Other(String),
}

impl ItemStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "pending" => ItemStatus::Pending,
            "processing" => ItemStatus::Processing,
            "completed" => ItemStatus::Completed,
            "failed" => ItemStatus::Failed,
            other => ItemStatus::Other(other.to_string()),
        }
    }

    /// Explicit status wins; otherwise a non-empty result means done.
    pub fn derive(explicit: Option<&str>, result: Option<&str>) -> Self {
        match explicit {
            Some(s) if !s.is_empty() => ItemStatus::parse(s),
            _ if result.is_some_and(|r| !r.is_empty()) => ItemStatus::Completed,
            _ => ItemStatus::Processing,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Processing => "processing",
            ItemStatus::Completed => "completed",
            ItemStatus::Failed => "failed",
            ItemStatus::Other(s) => s,
        }
    }

    /// Still waiting on the backend; keeps the poller armed.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, ItemStatus::Pending | ItemStatus::Processing)
    }

    pub fn badge(&self) -> Badge {
        match self {
            ItemStatus::Completed => Badge::Completed,
            ItemStatus::Processing => Badge::Processing,
            ItemStatus::Failed => Badge::Failed,
            ItemStatus::Pending | ItemStatus::Other(_) => Badge::Pending,
        }
    }

    /// Shown in place of the analysis while there is no result yet.
    pub fn progress_message(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "Your request is queued and will be processed shortly...",
            ItemStatus::Processing => "AI is analyzing your content. This may take a few moments...",
            ItemStatus::Failed => "Processing failed. Please try resubmitting or contact support.",
            _ => "Processing...",
        }
    }
}

impl Serialize for ItemStatus {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Badge {
    Completed,
    Processing,
    Pending,
    Failed,
}

impl Badge {
    pub fn label(&self) -> &'static str {
        match self {
            Badge::Completed => "✅ Completed",
            Badge::Processing => "⏳ Processing",
            Badge::Pending => "📋 Queued",
            Badge::Failed => "❌ Failed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeedItem {
    pub id: RecordId,
    pub kind: FeedKind,
    pub title: String,
    pub subtitle: String,
    pub content_preview: String,
    pub result: Option<String>,
    /// None when the server timestamp could not be parsed; such items sort last.
    #[serde(skip)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "created_at")]
    pub created_at_raw: String,
    pub status: ItemStatus,
}

impl FeedItem {
    pub fn from_transcript(t: &Transcript) -> Self {
        FeedItem {
            id: t.id.clone(),
            kind: FeedKind::Transcript,
            title: format!("{} - Transcript Analysis", t.company_name),
            subtitle: format!("{} • {}", t.attendees.join(", "), t.date),
            content_preview: preview(&t.transcript_text),
            result: t.insight_result.clone(),
            created_at: parse_timestamp(&t.created_at),
            created_at_raw: t.created_at.clone(),
            status: ItemStatus::derive(t.status.as_deref(), t.insight_result.as_deref()),
        }
    }

    pub fn from_linkedin(l: &LinkedInInsight) -> Self {
        FeedItem {
            id: l.id.clone(),
            kind: FeedKind::Linkedin,
            title: "LinkedIn Icebreaker Analysis".to_string(),
            subtitle: "Cold outreach strategy".to_string(),
            content_preview: preview(&l.linkedin_bio),
            result: l.icebreaker_result.clone(),
            created_at: parse_timestamp(&l.created_at),
            created_at_raw: l.created_at.clone(),
            status: ItemStatus::derive(l.status.as_deref(), l.icebreaker_result.as_deref()),
        }
    }

    pub fn badge(&self) -> Badge { self.status.badge() }

    pub fn has_result(&self) -> bool {
        self.result.as_deref().is_some_and(|r| !r.is_empty())
    }
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(PREVIEW_CHARS).collect();
    out.push_str("...");
    out
}
