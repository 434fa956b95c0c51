// ── Refresh cycle ──
//
// Capability probing and per-tick fetch planning.

pub(crate) mod planner;
pub(crate) mod probe;

pub use planner::Phase;
