use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Args;
use tokio::sync::mpsc;

use crate::api::ApiClient;
use crate::output::types::Meta;
use crate::telemetry::config::json_mode;
use crate::telemetry::{self};
use crate::telemetry::ops::feed::Phase as FeedPhase;
use crate::view;

pub mod item;
pub mod reconcile;
pub mod scheduler;
pub mod types;

pub use reconcile::{FeedState, Reconciler};
pub use scheduler::{spawn, PollConfig, PollState, PollerHandle, RefreshSignal};

use types::{FeedFailure, FeedList};

/// insight feed [--watch]
#[derive(Args)]
pub struct FeedCmd {
    /// Keep polling while any insight is still queued or processing
    #[arg(long, default_value_t = false)]
    pub watch: bool,
    /// Poll period in seconds (defaults to INSIGHT_POLL_INTERVAL_SECS or 15)
    #[arg(long)]
    pub interval: Option<u64>,
    /// Include queue/worker statistics
    #[arg(long, default_value_t = false)]
    pub queue_stats: bool,
}

pub async fn run(api: Arc<dyn ApiClient>, args: FeedCmd) -> Result<()> {
    let log = telemetry::feed();
    let _g = log.root_span_kv([("watch", args.watch.to_string())]).entered();

    let mut cfg = PollConfig::from_env();
    if let Some(secs) = args.interval { cfg.interval = Duration::from_secs(secs.max(1)); }
    cfg.queue_stats |= args.queue_stats;

    let reconciler = Reconciler::new(api);
    if args.watch { watch(reconciler, &cfg).await } else { show_once(&reconciler, cfg.queue_stats).await }
}

/// One reconciliation, rendered once. Exits non-zero when the feed failed to load.
pub async fn show_once(reconciler: &Reconciler, queue_stats: bool) -> Result<()> {
    let log = telemetry::feed();
    let mut state = FeedState::default();
    let outcome = reconciler.refresh(&mut state).await;
    if queue_stats && outcome.is_ok() {
        let stats = reconciler.queue_stats().await;
        state.set_queue_stats(stats);
    }
    present(&state, None)?;
    if let Err(e) = outcome {
        log.error(format!("❌ {e}"));
        bail!(e);
    }
    Ok(())
}

/// Poll until every item settles (or ctrl-c), rendering each finished cycle.
pub async fn watch(reconciler: Reconciler, cfg: &PollConfig) -> Result<()> {
    let log = telemetry::feed();
    log.info_kv("👀 watching feed", [("interval_secs", cfg.interval.as_secs().to_string())]);
    let handle = spawn(reconciler, cfg);
    follow(&handle, stdin_lines()).await?;
    let state = handle.shutdown().await?;
    log.info_kv("🏁 watch finished", [("cycles", state.cycles().to_string()), ("settled", (!state.has_unresolved()).to_string())]);
    Ok(())
}

/// `keys` is line-oriented input: `r` refreshes now, `s` toggles queue stats.
async fn follow(handle: &PollerHandle, mut keys: mpsc::Receiver<String>) -> Result<()> {
    let log = telemetry::feed();
    let mut rx = handle.snapshots();
    let mut rendered: Option<(u64, bool)> = None;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut keys_open = true;

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                log.info("interrupted");
                return Ok(());
            }
            line = keys.recv(), if keys_open => match line {
                Some(cmd) => match cmd.trim() {
                    "r" => handle.refresh(),
                    "s" => handle.show_queue_stats(!rx.borrow().show_queue_stats),
                    _ => {}
                },
                None => keys_open = false,
            },
            changed = rx.changed() => {
                if changed.is_err() { return Ok(()); }
                let snap = rx.borrow_and_update().clone();
                if snap.feed.is_loading() || snap.feed.cycles() == 0 { continue; }

                let key = (snap.feed.cycles(), snap.feed.queue_stats().is_some());
                if rendered != Some(key) {
                    rendered = Some(key);
                    let _s = log.span(&FeedPhase::Render).entered();
                    present(&snap.feed, Some(snap.poll))?;
                }
                if snap.poll == PollState::Idle {
                    // the first load failed and there is nothing pending to retry on a timer
                    if let Some(e) = snap.feed.error() { bail!(e.clone()); }
                    return Ok(());
                }
            }
        }
    }
}

/// Lines typed on stdin. The reader thread is detached so a pending read never
/// holds up process exit.
fn stdin_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(8);
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() { break; }
        }
    });
    rx
}

fn present(state: &FeedState, poll: Option<PollState>) -> Result<()> {
    let log = telemetry::feed();
    if !json_mode() {
        print!("{}", view::render_feed(state));
        return Ok(());
    }
    match state.error() {
        Some(e) => log.result(&FeedFailure {
            error: e.to_string(),
            cause: e.cause.to_string(),
            retryable: e.cause.is_retryable(),
        }),
        None => {
            let list = FeedList {
                total: state.items().len(),
                unresolved: state.unresolved_count(),
                poll,
                items: state.items(),
                queue_stats: state.queue_stats(),
            };
            let meta = Meta {
                duration_ms: state.last_duration().map(|d| d.as_millis()),
                cycle: Some(state.cycles()),
            };
            log.result_meta(&list, meta)
        }
    }
}
