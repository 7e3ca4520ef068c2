use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;

use crate::api::types::RecordId;
use crate::api::ApiClient;
use crate::error::{SubmissionError, ValidationError};
use crate::feed::{self, PollConfig, Reconciler, RefreshSignal};
use crate::telemetry::config::json_mode;
use crate::telemetry::{self};
use crate::telemetry::ops::submit::Phase as SubmitPhase;

pub mod linkedin;
pub mod transcript;

pub use linkedin::LinkedInForm;
pub use transcript::TranscriptForm;

/// insight transcript --company .. --attendees .. --date .. --text-file ..
#[derive(Args)]
pub struct TranscriptCmd {
    #[arg(long)]
    pub company: String,
    /// Comma-separated, e.g. "John Smith (you), Sarah Johnson"
    #[arg(long)]
    pub attendees: String,
    /// Meeting date, YYYY-MM-DD
    #[arg(long)]
    pub date: String,
    #[arg(long, conflicts_with = "text_file")]
    pub text: Option<String>,
    #[arg(long)]
    pub text_file: Option<PathBuf>,
    /// Actually submit (plan-only by default)
    #[arg(long, default_value_t = false)]
    pub apply: bool,
    /// After submitting, follow the feed until the new insight settles
    #[arg(long, default_value_t = false)]
    pub watch: bool,
}

/// insight linkedin --bio-file .. --pitch-file ..
#[derive(Args)]
pub struct LinkedInCmd {
    #[arg(long, conflicts_with = "bio_file")]
    pub bio: Option<String>,
    #[arg(long)]
    pub bio_file: Option<PathBuf>,
    #[arg(long, conflicts_with = "pitch_file")]
    pub pitch: Option<String>,
    #[arg(long)]
    pub pitch_file: Option<PathBuf>,
    #[arg(long, default_value_t = false)]
    pub apply: bool,
    #[arg(long, default_value_t = false)]
    pub watch: bool,
}

/// Records whether a submission asked for a refresh; the CLI runs it afterwards.
#[derive(Debug, Default)]
pub struct PendingRefresh(AtomicBool);

impl PendingRefresh {
    pub fn requested(&self) -> bool { self.0.load(Ordering::SeqCst) }
}

impl RefreshSignal for PendingRefresh {
    fn request_refresh(&self) { self.0.store(true, Ordering::SeqCst); }
}

#[derive(Serialize)]
struct SubmissionPlan<'a, T: Serialize> {
    kind: &'static str,
    payload: &'a T,
}

#[derive(Serialize)]
struct SubmissionResult {
    kind: &'static str,
    id: RecordId,
    #[serde(skip_serializing_if = "Option::is_none")]
    task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

pub(crate) fn required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() { Err(ValidationError::MissingField(field)) } else { Ok(()) }
}

#[derive(Serialize)]
struct SubmissionFailure {
    error: String,
    retryable: bool,
}

impl From<&SubmissionError> for SubmissionFailure {
    fn from(err: &SubmissionError) -> Self {
        SubmissionFailure { error: err.to_string(), retryable: err.is_retryable() }
    }
}

/// Report a failed submission (a JSON result in `--json` mode) and hand the error back.
fn reject(err: SubmissionError) -> anyhow::Error {
    let log = telemetry::submit();
    let report = SubmissionFailure::from(&err);
    log.warn_kv("❌ submission failed", [("retryable", report.retryable.to_string())]);
    if json_mode() {
        if let Err(e) = log.result(&report) { log.warn(format!("could not emit failure: {e}")); }
    } else if report.retryable {
        eprintln!("{} Your input was kept; run the same command again to retry.", report.error);
    }
    anyhow::Error::new(err)
}

fn read_text(inline: Option<String>, file: Option<PathBuf>, flag: &str) -> Result<String> {
    match (inline, file) {
        (Some(text), _) => Ok(text),
        (None, Some(path)) => std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display())),
        (None, None) => bail!("provide --{flag} or --{flag}-file"),
    }
}

pub async fn run_transcript(api: Arc<dyn ApiClient>, args: TranscriptCmd) -> Result<()> {
    let log = telemetry::submit();
    let _g = log.root_span_kv([("kind", "transcript".to_string()), ("apply", args.apply.to_string())]).entered();

    let mut form = TranscriptForm {
        company_name: args.company,
        attendees: args.attendees,
        date: args.date,
        transcript_text: read_text(args.text, args.text_file, "text")?,
    };

    if !args.apply {
        let input = form.validate()?;
        let _s = log.span(&SubmitPhase::Plan).entered();
        log.info_kv("📝 plan: would submit transcript", [
            ("company", input.company_name.clone()),
            ("attendees", input.attendees.len().to_string()),
            ("chars", input.transcript_text.chars().count().to_string()),
        ]);
        return log.plan(&SubmissionPlan { kind: "transcript", payload: &input });
    }

    let refresh = PendingRefresh::default();
    let created = form.submit(api.as_ref(), &refresh).await.map_err(reject)?;
    log.result(&SubmissionResult {
        kind: "transcript",
        id: created.id,
        task_id: created.task_id,
        status: created.status,
        message: created.message,
    })?;
    after_submit(api, &refresh, args.watch).await
}

pub async fn run_linkedin(api: Arc<dyn ApiClient>, args: LinkedInCmd) -> Result<()> {
    let log = telemetry::submit();
    let _g = log.root_span_kv([("kind", "linkedin".to_string()), ("apply", args.apply.to_string())]).entered();

    let mut form = LinkedInForm {
        linkedin_bio: read_text(args.bio, args.bio_file, "bio")?,
        pitch_deck_content: read_text(args.pitch, args.pitch_file, "pitch")?,
    };

    if !args.apply {
        let input = form.validate()?;
        let _s = log.span(&SubmitPhase::Plan).entered();
        log.info_kv("📝 plan: would submit linkedin analysis", [
            ("bio_chars", input.linkedin_bio.chars().count().to_string()),
            ("pitch_chars", input.pitch_deck_content.chars().count().to_string()),
        ]);
        return log.plan(&SubmissionPlan { kind: "linkedin", payload: &input });
    }

    let refresh = PendingRefresh::default();
    let created = form.submit(api.as_ref(), &refresh).await.map_err(reject)?;
    log.result(&SubmissionResult {
        kind: "linkedin",
        id: created.id,
        task_id: created.task_id,
        status: created.status,
        message: created.message,
    })?;
    after_submit(api, &refresh, args.watch).await
}

async fn after_submit(api: Arc<dyn ApiClient>, refresh: &PendingRefresh, watch: bool) -> Result<()> {
    if !refresh.requested() { return Ok(()); }
    let reconciler = Reconciler::new(api);
    let cfg = PollConfig::from_env();
    if watch { feed::watch(reconciler, &cfg).await } else { feed::show_once(&reconciler, cfg.queue_stats).await }
}

#[cfg(test)]
pub(crate) use tests::CountingRefresh;
