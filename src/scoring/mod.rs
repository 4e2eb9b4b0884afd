pub mod badge;
pub mod engine;
pub mod updater;

pub use badge::HonorBadge;
pub use engine::{calculate_score, HonorBreakdown, ScoreInputs};
pub use updater::{RecomputeOutcome, ScoreUpdater};
