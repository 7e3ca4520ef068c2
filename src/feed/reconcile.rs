use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::Instrument;

use crate::api::types::{LinkedInInsight, QueueStats, Transcript};
use crate::api::ApiClient;
use crate::error::ReconciliationError;
use crate::telemetry::{self};
use crate::telemetry::ops::feed::Phase as FeedPhase;

use super::item::FeedItem;

/// Project both collections and order them newest first.
/// Ties keep concatenation order: transcripts before LinkedIn items.
pub fn merge(transcripts: &[Transcript], insights: &[LinkedInInsight]) -> Vec<FeedItem> {
    let mut items: Vec<FeedItem> = transcripts
        .iter()
        .map(FeedItem::from_transcript)
        .chain(insights.iter().map(FeedItem::from_linkedin))
        .collect();
    // stable; None (unparseable) compares lowest so it ends up last
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    items
}

/// The feed as the view sees it. Only the reconciliation paths mutate it.
#[derive(Clone, Debug, Default)]
pub struct FeedState {
    items: Vec<FeedItem>,
    error: Option<ReconciliationError>,
    loading: bool,
    refreshed_at: Option<DateTime<Utc>>,
    queue_stats: Option<QueueStats>,
    cycles: u64,
    started: Option<Instant>,
    last_duration: Option<Duration>,
}

impl FeedState {
    pub fn items(&self) -> &[FeedItem] { &self.items }
    pub fn error(&self) -> Option<&ReconciliationError> { self.error.as_ref() }
    pub fn is_loading(&self) -> bool { self.loading }
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> { self.refreshed_at }
    pub fn queue_stats(&self) -> Option<&QueueStats> { self.queue_stats.as_ref() }
    /// Completed reconciliation attempts, successful or not.
    pub fn cycles(&self) -> u64 { self.cycles }
    /// Wall time of the most recent cycle, including failed ones.
    pub fn last_duration(&self) -> Option<Duration> { self.last_duration }

    pub fn unresolved_count(&self) -> usize {
        self.items.iter().filter(|i| i.status.is_unresolved()).count()
    }

    pub fn has_unresolved(&self) -> bool { self.unresolved_count() > 0 }

    pub(crate) fn begin_cycle(&mut self) {
        self.loading = true;
        self.error = None;
        self.started = Some(Instant::now());
    }

    /// Apply a finished cycle. Failures leave the previous items in place.
    pub(crate) fn apply(&mut self, outcome: Result<Vec<FeedItem>, ReconciliationError>) {
        self.loading = false;
        self.cycles += 1;
        self.last_duration = self.started.take().map(|t| t.elapsed());
        match outcome {
            Ok(items) => {
                self.items = items;
                self.error = None;
                self.refreshed_at = Some(Utc::now());
            }
            Err(e) => self.error = Some(e),
        }
    }

    pub(crate) fn set_queue_stats(&mut self, stats: Option<QueueStats>) {
        self.queue_stats = stats;
    }
}

/// Fetches both source collections and rebuilds the feed.
#[derive(Clone)]
pub struct Reconciler {
    api: Arc<dyn ApiClient>,
}

impl Reconciler {
    pub fn new(api: Arc<dyn ApiClient>) -> Self { Self { api } }

    /// One reconciliation cycle. Both lists are requested together; the first
    /// failure aborts the cycle and no partial feed is produced.
    pub async fn fetch(&self) -> Result<Vec<FeedItem>, ReconciliationError> {
        let log = telemetry::feed();
        let fetched = async { tokio::try_join!(self.api.list_transcripts(), self.api.list_linkedin_insights()) }
            .instrument(log.span(&FeedPhase::Fetch))
            .await;
        let (transcripts, insights) = match fetched {
            Ok(pair) => pair,
            Err(e) => {
                log.warn_kv("⚠️ reconciliation failed", [("resource", e.resource.to_string()), ("error", e.to_string())]);
                return Err(e.into());
            }
        };

        let items = {
            let _s = log.span_kv(&FeedPhase::Merge, [
                ("transcripts", transcripts.len().to_string()),
                ("linkedin", insights.len().to_string()),
            ]).entered();
            merge(&transcripts, &insights)
        };
        let unresolved = items.iter().filter(|i| i.status.is_unresolved()).count();
        log.cycle_summary(items.len(), unresolved);
        Ok(items)
    }

    /// Fetch and apply to `state` in one go (one-shot views and manual retries).
    pub async fn refresh(&self, state: &mut FeedState) -> Result<(), ReconciliationError> {
        state.begin_cycle();
        let outcome = self.fetch().await;
        let err = outcome.as_ref().err().cloned();
        state.apply(outcome);
        match err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub async fn queue_stats(&self) -> Option<QueueStats> {
        let log = telemetry::feed();
        match self.api.get_queue_stats().instrument(log.span(&FeedPhase::QueueStats)).await {
            Ok(stats) => Some(stats),
            Err(e) => {
                // stats are informational; polling carries on without them
                log.warn_kv("⚠️ queue stats unavailable", [("error", e.to_string())]);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{linkedin, server_error, transcript, MockApi};
    use crate::error::Resource;
    use crate::feed::item::{FeedKind, ItemStatus};

    #[test]
    fn merge_orders_newest_first() {
        let t = vec![transcript("t1", "2024-01-01T00:00:00Z"), transcript("t2", "2024-01-03T00:00:00Z")];
        let l = vec![linkedin("l1", "2024-01-02T00:00:00Z")];
        let items = merge(&t, &l);
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["t2", "l1", "t1"]);
        assert_eq!(items.len(), t.len() + l.len());
    }

    #[test]
    fn merge_ties_put_transcripts_first() {
        let ts = "2024-05-05T12:00:00Z";
        let t = vec![transcript("t1", ts), transcript("t2", ts)];
        let l = vec![linkedin("l1", ts), linkedin("l2", ts)];
        let items = merge(&t, &l);
        let kinds: Vec<FeedKind> = items.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![FeedKind::Transcript, FeedKind::Transcript, FeedKind::Linkedin, FeedKind::Linkedin]);
        assert_eq!(items[0].id.as_str(), "t1");
        assert_eq!(items[2].id.as_str(), "l1");
    }

    #[test]
    fn merge_same_ids_across_kinds_are_kept() {
        let items = merge(&[transcript("1", "2024-01-01T00:00:00Z")], &[linkedin("1", "2024-01-01T00:00:00Z")]);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn merge_unparseable_timestamps_sort_last() {
        let t = vec![transcript("bad", "not a date"), transcript("ok", "2020-01-01T00:00:00Z")];
        let items = merge(&t, &[]);
        assert_eq!(items[0].id.as_str(), "ok");
        assert_eq!(items[1].id.as_str(), "bad");
    }

    #[tokio::test]
    async fn refresh_publishes_merged_feed() {
        let api = Arc::new(MockApi::new());
        let mut done = transcript("t1", "2024-01-01T00:00:00Z");
        done.insight_result = Some("Strong discovery questions".into());
        api.push_transcripts(Ok(vec![done]));
        api.push_insights(Ok(vec![linkedin("l1", "2024-01-02T00:00:00Z")]));

        let reconciler = Reconciler::new(api.clone());
        let mut state = FeedState::default();
        reconciler.refresh(&mut state).await.unwrap();

        assert_eq!(state.items().len(), 2);
        assert_eq!(state.items()[0].status, ItemStatus::Processing);
        assert_eq!(state.items()[1].status, ItemStatus::Completed);
        assert_eq!(state.unresolved_count(), 1);
        assert!(!state.is_loading());
        assert!(state.refreshed_at().is_some());
        assert_eq!(api.call_count("list_transcripts"), 1);
        assert_eq!(api.call_count("list_linkedin_insights"), 1);
    }

    #[tokio::test]
    async fn failed_join_keeps_previous_feed() {
        let api = Arc::new(MockApi::new());
        api.push_transcripts(Ok(vec![transcript("t1", "2024-01-01T00:00:00Z")]));
        api.push_transcripts(Ok(vec![transcript("t1", "2024-01-01T00:00:00Z"), transcript("t2", "2024-01-02T00:00:00Z")]));
        api.push_insights(Ok(vec![]));
        api.push_insights(Err(server_error(Resource::LinkedInInsights)));

        let reconciler = Reconciler::new(api.clone());
        let mut state = FeedState::default();
        reconciler.refresh(&mut state).await.unwrap();
        let before = state.items().to_vec();

        let err = reconciler.refresh(&mut state).await.unwrap_err();
        assert_eq!(err.cause.resource, Resource::LinkedInInsights);
        assert_eq!(state.items(), before.as_slice());
        assert_eq!(state.error().map(|e| e.to_string()).as_deref(), Some("Failed to load insights. Please try again."));
        assert_eq!(state.cycles(), 2);
    }

    #[tokio::test]
    async fn success_clears_previous_error() {
        let api = Arc::new(MockApi::new());
        api.push_transcripts(Err(server_error(Resource::Transcripts)));
        api.push_transcripts(Ok(vec![]));
        api.push_insights(Ok(vec![]));

        let reconciler = Reconciler::new(api.clone());
        let mut state = FeedState::default();
        assert!(reconciler.refresh(&mut state).await.is_err());
        assert!(state.error().is_some());
        reconciler.refresh(&mut state).await.unwrap();
        assert!(state.error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_records_cycle_duration() {
        let api = Arc::new(MockApi::new());
        api.push_transcripts(Ok(vec![]));
        api.push_insights(Ok(vec![]));
        api.set_list_latency(std::time::Duration::from_millis(1500));

        let reconciler = Reconciler::new(api.clone());
        let mut state = FeedState::default();
        assert!(state.last_duration().is_none());
        reconciler.refresh(&mut state).await.unwrap();

        // both lists wait concurrently, so one latency and not two
        let took = state.last_duration().unwrap();
        assert!(took >= std::time::Duration::from_millis(1500));
        assert!(took < std::time::Duration::from_millis(3000));
        assert_eq!(api.max_in_flight(), 2);
    }

    #[tokio::test]
    async fn queue_stats_failure_is_swallowed() {
        let api = Arc::new(MockApi::new());
        api.push_queue_stats(Err(server_error(Resource::QueueStats)));
        let reconciler = Reconciler::new(api.clone());
        assert!(reconciler.queue_stats().await.is_none());
        assert_eq!(api.call_count("get_queue_stats"), 1);
    }
}
