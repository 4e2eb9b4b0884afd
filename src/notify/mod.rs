//! Notification boundary. The core decides what gets emitted and when; how
//! the message reaches a device is someone else's problem.

use crate::error::Result;
use crate::store::types::{BookingId, ProviderId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Exactly one of the two parties to a booking. A notification is never
/// addressed to both sides at once; transitions that inform both parties
/// emit two notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recipient {
    User(UserId),
    Provider(ProviderId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BookingCreated,
    BookingSubmitted,
    BookingAccepted,
    BookingStarted,
    BookingCompleted,
    JobCompleted,
    BookingCancelled,
}

/// A notification as handed to the sink. The sink assigns identity and
/// timestamps on delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub recipient: Recipient,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub related_booking_id: Option<BookingId>,
}

/// A delivered notification. Immutable except for the `is_read` flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub recipient: Recipient,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub related_booking_id: Option<BookingId>,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Where emitted notifications go. Emission is best-effort from the
/// caller's point of view: booking and score mutations are never rolled
/// back because a sink failed, callers log the error and move on.
pub trait NotificationSink {
    fn emit(&self, notification: NewNotification) -> Result<()>;
}
