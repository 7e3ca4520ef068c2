use serde::Serialize;

use crate::api::types::QueueStats;

use super::item::FeedItem;
use super::scheduler::PollState;

// Result envelope types
#[derive(Serialize)]
pub struct FeedList<'a> {
    pub total: usize,
    pub unresolved: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll: Option<PollState>,
    pub items: &'a [FeedItem],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_stats: Option<&'a QueueStats>,
}

#[derive(Serialize)]
pub struct FeedFailure {
    pub error: String,
    pub cause: String,
    pub retryable: bool,
}
