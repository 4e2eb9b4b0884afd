use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type UserId = u64;
pub type ProviderId = u64;
pub type BookingId = u64;
pub type ReviewId = u64;

/// Lifecycle status of a booking.
///
/// Stored as snake_case strings on the wire (`in_progress` etc.), matching
/// the mobile app's status vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// A booking the provider has committed to (left `pending` for good or
    /// ill). Denominator of the completion rate.
    pub fn is_committed(self) -> bool {
        matches!(
            self,
            BookingStatus::Accepted
                | BookingStatus::InProgress
                | BookingStatus::Completed
                | BookingStatus::Cancelled
        )
    }

    /// Any status other than `pending` counts as the provider having
    /// responded to the request.
    pub fn is_responded(self) -> bool {
        self != BookingStatus::Pending
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "accepted" => Ok(BookingStatus::Accepted),
            "in_progress" => Ok(BookingStatus::InProgress),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(crate::error::Error::UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: ProviderId,
    pub full_name: String,
    pub service_name: String,
    pub hourly_rate: f64,
    pub experience_years: u32,
    pub is_verified: bool,
    /// Composite 0-100 reputation. Written only by the score updater.
    pub honor_score: f64,
    /// Mean review rating, 0-5, rounded to one decimal. Derived.
    pub rating: f64,
    pub total_reviews: u64,
    /// Incremented only when a booking completes.
    pub total_jobs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub provider_id: ProviderId,
    pub status: BookingStatus,
    pub booking_date: String,
    pub estimated_hours: u32,
    /// hourly_rate x estimated_hours, frozen at creation. Later rate changes
    /// do not reprice existing bookings.
    pub total_amount: f64,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Reviews are immutable once created and belong to exactly one booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub booking_id: BookingId,
    pub user_id: UserId,
    pub provider_id: ProviderId,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Accepted,
            BookingStatus::InProgress,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<BookingStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!("rejected".parse::<BookingStatus>().is_err());
        assert!("".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(!BookingStatus::Pending.is_terminal());
        assert!(!BookingStatus::Accepted.is_terminal());
        assert!(!BookingStatus::InProgress.is_terminal());
    }

    #[test]
    fn test_committed_excludes_pending_only() {
        assert!(!BookingStatus::Pending.is_committed());
        assert!(BookingStatus::Accepted.is_committed());
        assert!(BookingStatus::Cancelled.is_committed());
    }

    #[test]
    fn test_status_serde_uses_snake_case() {
        let json = serde_json::to_string(&BookingStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let parsed: BookingStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(parsed, BookingStatus::Cancelled);
    }
}
