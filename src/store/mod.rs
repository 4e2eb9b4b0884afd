//! Data store boundary. The engine reads aggregate facts and writes derived
//! fields through this trait; the concrete schema behind it is out of scope.

pub mod file;
pub mod memory;
pub mod types;

pub use memory::{MemoryStore, StoreData};

use crate::error::Result;
use crate::scoring::{HonorBreakdown, ScoreInputs};
use types::{Booking, BookingId, BookingStatus, ProviderId, ReviewId, UserId};

/// Review facts for one provider: mean rating over all reviews and how many
/// there are. Zeroes for a provider with no reviews.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReviewAggregate {
    pub avg_rating: f64,
    pub review_count: u64,
}

/// Booking counters for one provider, bucketed the way the score needs them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookingAggregate {
    /// status == completed
    pub completed: u64,
    /// status in {accepted, in_progress, completed, cancelled}
    pub committed: u64,
    /// status != pending
    pub responded: u64,
    pub total: u64,
}

/// Fields supplied by the customer when placing a booking. Pricing is not
/// among them; the engine computes and freezes `total_amount`.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: UserId,
    pub provider_id: ProviderId,
    pub booking_date: String,
    pub estimated_hours: u32,
    pub description: Option<String>,
}

/// Storage operations the reputation core depends on.
///
/// Implementations must serialize the read-modify-write of a provider's
/// derived fields (`honor_score`, `rating`, `total_reviews`, `total_jobs`)
/// so that two concurrent completions for the same provider cannot compute
/// from stale aggregates. [`DataStore::recompute_honor_score`] is the
/// seam for that: it runs the whole fetch-compute-persist sequence as one
/// store operation.
pub trait DataStore {
    fn provider(&self, provider_id: ProviderId) -> Result<types::Provider>;

    fn review_aggregate(&self, provider_id: ProviderId) -> Result<ReviewAggregate>;

    fn booking_aggregate(&self, provider_id: ProviderId) -> Result<BookingAggregate>;

    fn provider_experience(&self, provider_id: ProviderId) -> Result<u32> {
        Ok(self.provider(provider_id)?.experience_years)
    }

    /// All scoring inputs for one provider. Override to fetch the three
    /// aggregates under a single serialization boundary.
    fn score_inputs(&self, provider_id: ProviderId) -> Result<ScoreInputs> {
        let reviews = self.review_aggregate(provider_id)?;
        let bookings = self.booking_aggregate(provider_id)?;
        let experience_years = self.provider_experience(provider_id)?;
        Ok(ScoreInputs {
            avg_rating: reviews.avg_rating,
            review_count: reviews.review_count,
            completed: bookings.completed,
            committed: bookings.committed,
            responded: bookings.responded,
            total_bookings: bookings.total,
            experience_years,
        })
    }

    fn persist_honor_score(&self, provider_id: ProviderId, score: f64) -> Result<()>;

    /// Fetch aggregates, compute, and persist one provider's honor score
    /// as a single store operation.
    ///
    /// The default chains [`DataStore::score_inputs`] and
    /// [`DataStore::persist_honor_score`]; implementations backed by
    /// shared mutable state must override it so the whole sequence runs
    /// under one serialization boundary (a transaction, or one lock
    /// acquisition) and a concurrent completion for the same provider
    /// cannot interleave a stale write between the read and the write.
    fn recompute_honor_score(
        &self,
        provider_id: ProviderId,
        compute: &dyn Fn(&ScoreInputs) -> HonorBreakdown,
    ) -> Result<HonorBreakdown> {
        let inputs = self.score_inputs(provider_id)?;
        let breakdown = compute(&inputs);
        self.persist_honor_score(provider_id, breakdown.total)?;
        Ok(breakdown)
    }

    /// Providers eligible for batch recompute: verified/active only.
    fn verified_providers(&self) -> Result<Vec<ProviderId>>;

    fn booking(&self, booking_id: BookingId) -> Result<Booking>;

    fn set_booking_status(&self, booking_id: BookingId, status: BookingStatus) -> Result<()>;

    fn create_booking(&self, new: NewBooking, total_amount: f64) -> Result<BookingId>;

    fn increment_total_jobs(&self, provider_id: ProviderId) -> Result<()>;

    /// Creates the review, enforcing one-review-per-booking and the
    /// completed-only rule even if the caller forgot to check.
    fn create_review(
        &self,
        booking_id: BookingId,
        user_id: UserId,
        provider_id: ProviderId,
        rating: u8,
        comment: Option<String>,
    ) -> Result<ReviewId>;

    fn update_provider_rating(
        &self,
        provider_id: ProviderId,
        rating: f64,
        total_reviews: u64,
    ) -> Result<()>;

    fn user_name(&self, user_id: UserId) -> Result<Option<String>>;

    /// Flips `is_read`, the only mutation a notification ever sees.
    fn mark_notification_read(&self, notification_id: u64) -> Result<()>;
}
