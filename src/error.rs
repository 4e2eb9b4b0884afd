use crate::store::types::{BookingId, BookingStatus, ProviderId};
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Domain errors surfaced by the reputation core.
///
/// Validation-class failures never leave partial mutations behind; callers
/// can rely on the store being untouched when one of these comes back.
#[derive(Debug, Error)]
pub enum Error {
    #[error("provider {0} not found")]
    ProviderNotFound(ProviderId),

    #[error("booking {0} not found")]
    BookingNotFound(BookingId),

    #[error("notification {0} not found")]
    NotificationNotFound(u64),

    #[error("provider {asserted} is not authorized for booking {booking}")]
    Unauthorized {
        booking: BookingId,
        asserted: ProviderId,
    },

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(u8),

    #[error("booking {0} already has a review")]
    AlreadyReviewed(BookingId),

    #[error("only completed bookings can be reviewed (booking {0})")]
    ReviewRequiresCompletion(BookingId),

    #[error("unknown booking status '{0}'")]
    UnknownStatus(String),

    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl Error {
    /// True for the validation-class errors of the domain (bad rating,
    /// duplicate review, disallowed transition). Useful when a caller wants
    /// to map these to a 4xx-style response and everything else to a 5xx.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidTransition { .. }
                | Error::RatingOutOfRange(_)
                | Error::AlreadyReviewed(_)
                | Error::ReviewRequiresCompletion(_)
                | Error::UnknownStatus(_)
        )
    }
}
