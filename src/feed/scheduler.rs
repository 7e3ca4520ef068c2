use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::Instrument;

use crate::telemetry::{self};
use crate::telemetry::ops::feed::Phase as FeedPhase;

use super::item::FeedItem;
use super::reconcile::{FeedState, Reconciler};

const DEFAULT_POLL_INTERVAL_SECS: u64 = 15;

#[derive(Clone, Debug)]
pub struct PollConfig {
    pub interval: Duration,
    pub queue_stats: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS), queue_stats: false }
    }
}

impl PollConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(secs) = std::env::var("INSIGHT_POLL_INTERVAL_SECS") {
            if let Ok(parsed) = secs.parse::<u64>() {
                cfg.interval = Duration::from_secs(parsed.max(1));
            }
        }
        if let Ok(v) = std::env::var("INSIGHT_QUEUE_STATS") {
            cfg.queue_stats = matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        cfg
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PollState {
    #[default]
    Idle,
    Armed,
}

impl PollState {
    pub fn as_str(&self) -> &'static str {
        match self { PollState::Idle => "idle", PollState::Armed => "armed" }
    }
}

/// Idle/Armed timer. Holds at most one interval; arming always replaces it.
pub struct PollingScheduler {
    period: Duration,
    timer: Option<Interval>,
}

impl PollingScheduler {
    pub fn new(period: Duration) -> Self {
        Self { period, timer: None }
    }

    pub fn state(&self) -> PollState {
        if self.timer.is_some() { PollState::Armed } else { PollState::Idle }
    }

    /// Arm while anything is still pending/processing, otherwise go idle.
    pub fn observe(&mut self, items: &[FeedItem]) -> PollState {
        if items.iter().any(|i| i.status.is_unresolved()) { self.arm(); } else { self.disarm(); }
        self.state()
    }

    fn arm(&mut self) {
        // first tick one full period from now, not immediately
        let mut timer = interval_at(Instant::now() + self.period, self.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.timer = Some(timer);
    }

    pub fn disarm(&mut self) {
        self.timer = None;
    }

    /// Resolves on the next tick; never resolves while idle.
    pub async fn tick(&mut self) {
        match self.timer.as_mut() {
            Some(t) => { t.tick().await; }
            None => std::future::pending::<()>().await,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedCommand {
    Refresh,
    ShowQueueStats(bool),
}

/// What observers of a running poller see.
#[derive(Clone, Debug, Default)]
pub struct FeedSnapshot {
    pub feed: FeedState,
    pub poll: PollState,
    pub show_queue_stats: bool,
}

/// Something that can ask the feed to reconcile again.
pub trait RefreshSignal: Send + Sync {
    fn request_refresh(&self);
}

/// Cheap clonable sender handed to submission workflows.
#[derive(Clone, Debug)]
pub struct FeedRefresher {
    commands: mpsc::Sender<FeedCommand>,
}

impl RefreshSignal for FeedRefresher {
    fn request_refresh(&self) {
        // a full queue already holds a pending refresh
        let _ = self.commands.try_send(FeedCommand::Refresh);
    }
}

/// Owns the feed state and runs every cycle sequentially on one task.
struct FeedPoller {
    reconciler: Reconciler,
    scheduler: PollingScheduler,
    state: FeedState,
    show_queue_stats: bool,
    snapshots: watch::Sender<FeedSnapshot>,
}

impl FeedPoller {
    async fn run(mut self, mut commands: mpsc::Receiver<FeedCommand>, cancel: CancellationToken) -> FeedState {
        let log = telemetry::feed();
        // initial load, as when the view first mounts
        self.cycle(&cancel).await;
        if self.show_queue_stats {
            self.poll_queue_stats(&cancel).await;
            self.publish();
        }

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                cmd = commands.recv() => match cmd {
                    Some(FeedCommand::Refresh) => self.cycle(&cancel).await,
                    Some(FeedCommand::ShowQueueStats(on)) => {
                        self.show_queue_stats = on;
                        if on { self.poll_queue_stats(&cancel).await; } else { self.state.set_queue_stats(None); }
                        self.publish();
                    }
                    // every handle is gone: nobody is watching any more
                    None => break,
                },
                _ = self.scheduler.tick() => {
                    log.debug("tick");
                    self.cycle(&cancel).await;
                    if self.show_queue_stats {
                        self.poll_queue_stats(&cancel).await;
                        self.publish();
                    }
                }
            }
        }

        let before = self.scheduler.state();
        self.scheduler.disarm();
        if before == PollState::Armed { log.poll_transition(before.as_str(), PollState::Idle.as_str()); }
        self.state
    }

    async fn cycle(&mut self, cancel: &CancellationToken) {
        let log = telemetry::feed();
        self.state.begin_cycle();
        self.publish();

        let span = log.span_kv(&FeedPhase::Cycle, [("cycle", (self.state.cycles() + 1).to_string())]);
        let outcome = tokio::select! {
            biased;
            // torn down mid-flight: drop the result on the floor
            _ = cancel.cancelled() => return,
            r = self.reconciler.fetch().instrument(span) => r,
        };

        // a failed cycle keeps the current timer; the next tick retries
        if let Ok(items) = &outcome {
            let before = self.scheduler.state();
            let after = self.scheduler.observe(items);
            if before != after { log.poll_transition(before.as_str(), after.as_str()); }
        }
        self.state.apply(outcome);
        self.publish();
    }

    async fn poll_queue_stats(&mut self, cancel: &CancellationToken) {
        let stats = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            s = self.reconciler.queue_stats() => s,
        };
        // keep the last good snapshot when a refresh of the stats fails
        if stats.is_some() { self.state.set_queue_stats(stats); }
    }

    fn publish(&self) {
        let _ = self.snapshots.send(FeedSnapshot {
            feed: self.state.clone(),
            poll: self.scheduler.state(),
            show_queue_stats: self.show_queue_stats,
        });
    }
}

/// Handle to a running poller. Dropping it tears the poller down.
pub struct PollerHandle {
    commands: mpsc::Sender<FeedCommand>,
    snapshots: watch::Receiver<FeedSnapshot>,
    cancel: CancellationToken,
    _teardown: DropGuard,
    task: JoinHandle<FeedState>,
}

impl PollerHandle {
    pub fn refresh(&self) { self.refresher().request_refresh(); }

    pub fn refresher(&self) -> FeedRefresher { FeedRefresher { commands: self.commands.clone() } }

    pub fn show_queue_stats(&self, on: bool) {
        let _ = self.commands.try_send(FeedCommand::ShowQueueStats(on));
    }

    pub fn snapshots(&self) -> watch::Receiver<FeedSnapshot> { self.snapshots.clone() }

    /// Stop the timer, discard any in-flight cycle and hand back the last applied state.
    pub async fn shutdown(self) -> Result<FeedState> {
        let PollerHandle { cancel, task, .. } = self;
        cancel.cancel();
        task.await.context("feed poller task panicked")
    }
}

/// Start the poller task. The first reconciliation runs immediately.
pub fn spawn(reconciler: Reconciler, cfg: &PollConfig) -> PollerHandle {
    let (commands, rx) = mpsc::channel(16);
    let (snap_tx, snapshots) = watch::channel(FeedSnapshot { show_queue_stats: cfg.queue_stats, ..FeedSnapshot::default() });
    let cancel = CancellationToken::new();
    let poller = FeedPoller {
        reconciler,
        scheduler: PollingScheduler::new(cfg.interval),
        state: FeedState::default(),
        show_queue_stats: cfg.queue_stats,
        snapshots: snap_tx,
    };
    let task = tokio::spawn(poller.run(rx, cancel.clone()));
    PollerHandle { commands, snapshots, _teardown: cancel.clone().drop_guard(), cancel, task }
}
