use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Tasks;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Status, QueueStats, Health, Record }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self { Phase::Status => "status", Phase::QueueStats => "queue_stats", Phase::Health => "health", Phase::Record => "record" } }
    fn span(&self) -> Span { match self { Phase::Status => info_span!("status"), Phase::QueueStats => info_span!("queue_stats"), Phase::Health => info_span!("health"), Phase::Record => info_span!("record") } }
}

impl OpMarker for Tasks {
    const NAME: &'static str = "tasks";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("tasks") }
}
