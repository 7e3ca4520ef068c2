//! Plain-text rendering of the feed. Everything here is a pure function of
//! the state it is handed.

use std::fmt::Write;

use crate::api::types::{QueueStats, TaskStatus};
use crate::feed::item::{FeedItem, FeedKind};
use crate::feed::reconcile::FeedState;

pub fn render_feed(state: &FeedState) -> String {
    let mut out = String::new();
    if let Some(err) = state.error() {
        let _ = writeln!(out, "{err}");
        let _ = writeln!(out, "  (retry with `insight feed`)");
        if state.items().is_empty() { return out; }
        out.push('\n');
    }
    if state.items().is_empty() {
        if state.is_loading() {
            out.push_str("Loading insights...\n");
        } else {
            out.push_str("No insights yet\nSubmit a transcript or LinkedIn analysis to get started!\n");
        }
        return out;
    }

    let unresolved = state.unresolved_count();
    let _ = write!(out, "Recent Insights: {} total", state.items().len());
    if unresolved > 0 { let _ = write!(out, ", {unresolved} processing"); }
    out.push('\n');
    if let Some(at) = state.refreshed_at() {
        let _ = writeln!(out, "Last updated {}", at.format("%H:%M:%S UTC"));
    }
    if let Some(stats) = state.queue_stats() {
        out.push_str(&render_queue_stats(stats));
    }
    for item in state.items() {
        out.push('\n');
        out.push_str(&render_item(item));
    }
    out
}

pub fn render_item(item: &FeedItem) -> String {
    let icon = match item.kind { FeedKind::Transcript => "📞", FeedKind::Linkedin => "💼" };
    let date = item
        .created_at
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| item.created_at_raw.clone());

    let mut out = String::new();
    let _ = writeln!(out, "{icon} {} [{}] {}  ({date})", item.kind.as_str(), item.badge().label(), item.title);
    if !item.subtitle.is_empty() { let _ = writeln!(out, "   {}", item.subtitle); }
    let _ = writeln!(out, "   Original: {}", item.content_preview);
    match item.result.as_deref() {
        Some(r) if item.has_result() => {
            out.push_str("   AI Analysis:\n");
            for line in r.lines() { let _ = writeln!(out, "     {line}"); }
        }
        _ => { let _ = writeln!(out, "   {}", item.status.progress_message()); }
    }
    out
}

pub fn render_queue_stats(stats: &QueueStats) -> String {
    let mut out = format!(
        "Queue: active={} scheduled={} reserved={} workers_online={}\n",
        stats.active_tasks, stats.scheduled_tasks, stats.reserved_tasks, stats.workers_online
    );
    if !stats.worker_names.is_empty() {
        let _ = writeln!(out, "Workers: {}", stats.worker_names.join(", "));
    }
    if let Some(err) = &stats.error { let _ = writeln!(out, "Queue error: {err}"); }
    out
}

pub fn render_task(task: &TaskStatus) -> String {
    let mut out = format!("Task {}: {}\n", task.task_id, task.status);
    if let Some(info) = &task.info { let _ = writeln!(out, "  info: {info}"); }
    if let Some(result) = &task.result { let _ = writeln!(out, "  result: {result}"); }
    if let Some(tb) = &task.traceback { let _ = writeln!(out, "  traceback:\n{tb}"); }
    out
}
