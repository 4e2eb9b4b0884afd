use serde::Serialize;

/// Aggregate facts the Honor Score is computed from. All counters are for a
/// single provider.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreInputs {
    /// Mean review rating, 0 when the provider has no reviews.
    pub avg_rating: f64,
    pub review_count: u64,
    /// Bookings that reached `completed`.
    pub completed: u64,
    /// Bookings that ever left `pending` (accepted, in_progress, completed
    /// or cancelled). Denominator of the completion rate.
    pub committed: u64,
    /// Bookings whose status is anything but `pending`.
    pub responded: u64,
    pub total_bookings: u64,
    pub experience_years: u32,
}

/// The five weighted sub-scores and their total. Kept alongside the total
/// so callers can audit why a provider scores what it scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HonorBreakdown {
    /// Average rating scaled to 40 points.
    pub rating_score: f64,
    /// Completion rate scaled to 30 points.
    pub completion_score: f64,
    /// Response rate scaled to 15 points.
    pub response_score: f64,
    /// Review volume, 10 points at 50+ reviews.
    pub review_bonus: f64,
    /// Years of experience, 5 points at 10+.
    pub experience_bonus: f64,
    pub total: f64,
}

/// Round to one decimal, the precision every persisted score carries.
pub(crate) fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Compute the Honor Score for one provider.
///
/// Each sub-score is rounded to one decimal before the terms are summed,
/// and the sum is rounded again; persisted scores therefore always match
/// the sum of their displayed breakdown.
pub fn calculate_score(inputs: &ScoreInputs) -> HonorBreakdown {
    // Ratings come from 1-5 star reviews; guard malformed input.
    let avg_rating = inputs.avg_rating.clamp(0.0, 5.0);

    let rating_score = if avg_rating > 0.0 {
        round1((avg_rating / 5.0) * 40.0)
    } else {
        0.0
    };

    // A provider with no committed bookings yet gets neutral half-credit
    // rather than a zero completion rate.
    let completion_score = if inputs.committed > 0 {
        round1((inputs.completed as f64 / inputs.committed as f64) * 30.0)
    } else {
        15.0
    };

    let response_score = if inputs.total_bookings > 0 {
        round1((inputs.responded as f64 / inputs.total_bookings as f64) * 15.0)
    } else {
        7.5
    };

    let review_bonus = round1((inputs.review_count as f64 / 50.0).min(1.0) * 10.0);

    let experience_bonus = round1((inputs.experience_years as f64 / 10.0).min(1.0) * 5.0);

    let total = round1(
        rating_score + completion_score + response_score + review_bonus + experience_bonus,
    );

    HonorBreakdown {
        rating_score,
        completion_score,
        response_score,
        review_bonus,
        experience_bonus,
        total,
    }
}
