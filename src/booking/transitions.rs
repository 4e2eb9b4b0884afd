use crate::error::{Error, Result};
use crate::store::types::BookingStatus;

/// Guard for booking status transitions.
///
/// Forward moves go one step at a time (pending -> accepted -> in_progress
/// -> completed) and any non-terminal booking may divert to cancelled.
/// Terminal states admit nothing, including a repeat cancellation. The
/// legacy backend accepted any status write and trusted callers; validating
/// here is a deliberate behavior change.
pub fn check_transition(from: BookingStatus, to: BookingStatus) -> Result<()> {
    use BookingStatus::*;

    let allowed = match (from, to) {
        (Pending, Accepted) => true,
        (Accepted, InProgress) => true,
        (InProgress, Completed) => true,
        (from, Cancelled) => !from.is_terminal(),
        _ => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(Error::InvalidTransition { from, to })
    }
}
