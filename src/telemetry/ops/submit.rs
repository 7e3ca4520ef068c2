use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Submit;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Validate, Plan, Create, Refresh }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self { Phase::Validate => "validate", Phase::Plan => "plan", Phase::Create => "create", Phase::Refresh => "refresh" } }
    fn span(&self) -> Span { match self { Phase::Validate => info_span!("validate"), Phase::Plan => info_span!("plan"), Phase::Create => info_span!("create"), Phase::Refresh => info_span!("refresh") } }
}

impl OpMarker for Submit {
    const NAME: &'static str = "submit";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("submit") }
}
