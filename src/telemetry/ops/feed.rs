use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Feed;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Fetch, Merge, Cycle, QueueStats, Render }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Fetch => "fetch",
        Phase::Merge => "merge",
        Phase::Cycle => "cycle",
        Phase::QueueStats => "queue_stats",
        Phase::Render => "render",
    }}
    fn span(&self) -> Span { match self {
        Phase::Fetch => info_span!("fetch"),
        Phase::Merge => info_span!("merge"),
        Phase::Cycle => info_span!("cycle"),
        Phase::QueueStats => info_span!("queue_stats"),
        Phase::Render => info_span!("render"),
    }}
}

impl OpMarker for Feed {
    const NAME: &'static str = "feed";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("feed") }
}
