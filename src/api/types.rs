use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Server-assigned record id. The backend hands out uuids, but numeric ids decode too.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw { Text(String), Int(i64), Uint(u64) }
        Ok(match Raw::deserialize(d)? {
            Raw::Text(s) => RecordId(s),
            Raw::Int(n) => RecordId(n.to_string()),
            Raw::Uint(n) => RecordId(n.to_string()),
        })
    }
}

/// Transcript record. Create responses only carry `id`, `task_id`, `status` and
/// `message`, so the display fields default to empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub id: RecordId,
    #[serde(default)]
    pub company_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attendees: Vec<String>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub transcript_text: String,
    #[serde(default)]
    pub insight_result: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkedInInsight {
    pub id: RecordId,
    #[serde(default)]
    pub linkedin_bio: String,
    #[serde(default)]
    pub company_linkedin: Option<String>,
    #[serde(default)]
    pub company_website: Option<String>,
    #[serde(default)]
    pub pitch_deck_content: String,
    #[serde(default)]
    pub icebreaker_result: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TranscriptInput {
    pub company_name: String,
    pub attendees: Vec<String>,
    pub date: String,
    pub transcript_text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LinkedInInput {
    pub linkedin_bio: String,
    pub pitch_deck_content: String,
}

/// Background task state as reported by the queue (`PENDING`, `STARTED`, `SUCCESS`, ...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub task_id: String,
    pub status: String,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub traceback: Option<String>,
}

impl TaskStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self.status.as_str(), "SUCCESS" | "FAILURE" | "REVOKED")
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub active_tasks: u64,
    pub scheduled_tasks: u64,
    pub reserved_tasks: u64,
    pub workers_online: u64,
    #[serde(default)]
    pub worker_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}
