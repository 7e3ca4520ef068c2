use anyhow::Result;
use clap::{Args, Subcommand};
use tracing::Instrument;

use crate::api::types::RecordId;
use crate::api::ApiClient;
use crate::feed::item::FeedItem;
use crate::telemetry::config::json_mode;
use crate::telemetry::{self};
use crate::telemetry::ops::tasks::Phase as TasksPhase;
use crate::view;

/// insight task <TASK_ID>
#[derive(Args)]
pub struct TaskCmd {
    pub task_id: String,
}

/// insight get transcript|linkedin <ID>
#[derive(Args)]
pub struct GetCmd {
    #[command(subcommand)]
    pub kind: GetKind,
}

#[derive(Subcommand)]
pub enum GetKind {
    Transcript { id: String },
    Linkedin { id: String },
}

pub async fn run_task(api: &dyn ApiClient, args: TaskCmd) -> Result<()> {
    let log = telemetry::tasks();
    let _g = log.root_span_kv([("task_id", args.task_id.clone())]).entered();
    let task = api.get_task_status(&args.task_id).instrument(log.span(&TasksPhase::Status)).await?;
    log.info_kv("🧾 task", [("status", task.status.clone()), ("finished", task.is_finished().to_string())]);
    if json_mode() { log.result(&task) } else { print!("{}", view::render_task(&task)); Ok(()) }
}

pub async fn run_queue(api: &dyn ApiClient) -> Result<()> {
    let log = telemetry::tasks();
    let _g = log.root_span().entered();
    let stats = api.get_queue_stats().instrument(log.span(&TasksPhase::QueueStats)).await?;
    if let Some(err) = &stats.error { log.warn(format!("⚠️ queue reported an error: {err}")); }
    if json_mode() { log.result(&stats) } else { print!("{}", view::render_queue_stats(&stats)); Ok(()) }
}

pub async fn run_health(api: &dyn ApiClient) -> Result<()> {
    let log = telemetry::tasks();
    let _g = log.root_span().entered();
    let health = api.health_check().instrument(log.span(&TasksPhase::Health)).await?;
    if json_mode() { log.result(&health) } else { println!("API: {}", health.status); Ok(()) }
}

pub async fn run_get(api: &dyn ApiClient, args: GetCmd) -> Result<()> {
    let log = telemetry::tasks();
    let _g = log.root_span().entered();
    let item = fetch_item(api, args.kind).instrument(log.span(&TasksPhase::Record)).await?;
    if json_mode() { log.result(&item) } else { print!("{}", view::render_item(&item)); Ok(()) }
}

async fn fetch_item(api: &dyn ApiClient, kind: GetKind) -> Result<FeedItem> {
    Ok(match kind {
        GetKind::Transcript { id } => FeedItem::from_transcript(&api.get_transcript(&RecordId::new(id)).await?),
        GetKind::Linkedin { id } => FeedItem::from_linkedin(&api.get_linkedin_insight(&RecordId::new(id)).await?),
    })
}
