use super::types::{
    Booking, BookingId, BookingStatus, Provider, ProviderId, Review, ReviewId, User, UserId,
};
use super::{BookingAggregate, DataStore, NewBooking, ReviewAggregate};
use crate::error::{Error, Result};
use crate::notify::{NewNotification, Notification, NotificationSink};
use crate::scoring::{HonorBreakdown, ScoreInputs};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

fn default_version() -> u32 {
    1
}

/// The full marketplace dataset, as persisted to the JSON store file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreData {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub providers: Vec<Provider>,
    #[serde(default)]
    pub bookings: Vec<Booking>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

impl Default for StoreData {
    fn default() -> Self {
        Self {
            version: 1,
            users: Vec::new(),
            providers: Vec::new(),
            bookings: Vec::new(),
            reviews: Vec::new(),
            notifications: Vec::new(),
        }
    }
}

/// In-memory [`DataStore`] used by the CLI and tests.
///
/// A single mutex guards the whole dataset. `recompute_honor_score` holds
/// it across the aggregate reads, the compute, and the `honor_score`
/// write, so a concurrent completion for the same provider cannot slip a
/// stale score in between. That is the lost-update guard the score
/// updater relies on.
pub struct MemoryStore {
    inner: Mutex<StoreData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::from_data(StoreData::default())
    }

    pub fn from_data(data: StoreData) -> Self {
        Self {
            inner: Mutex::new(data),
        }
    }

    /// Clone of the current dataset, for persisting back to disk.
    pub fn snapshot(&self) -> Result<StoreData> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreData>> {
        self.inner
            .lock()
            .map_err(|_| Error::Persistence("store lock poisoned".to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn find_provider(data: &StoreData, provider_id: ProviderId) -> Result<&Provider> {
    data.providers
        .iter()
        .find(|p| p.id == provider_id)
        .ok_or(Error::ProviderNotFound(provider_id))
}

fn find_provider_mut(data: &mut StoreData, provider_id: ProviderId) -> Result<&mut Provider> {
    data.providers
        .iter_mut()
        .find(|p| p.id == provider_id)
        .ok_or(Error::ProviderNotFound(provider_id))
}

fn review_aggregate_of(data: &StoreData, provider_id: ProviderId) -> ReviewAggregate {
    let ratings: Vec<f64> = data
        .reviews
        .iter()
        .filter(|r| r.provider_id == provider_id)
        .map(|r| r.rating as f64)
        .collect();
    if ratings.is_empty() {
        ReviewAggregate::default()
    } else {
        ReviewAggregate {
            avg_rating: ratings.iter().sum::<f64>() / ratings.len() as f64,
            review_count: ratings.len() as u64,
        }
    }
}

fn booking_aggregate_of(data: &StoreData, provider_id: ProviderId) -> BookingAggregate {
    let mut agg = BookingAggregate::default();
    for booking in data.bookings.iter().filter(|b| b.provider_id == provider_id) {
        agg.total += 1;
        if booking.status == BookingStatus::Completed {
            agg.completed += 1;
        }
        if booking.status.is_committed() {
            agg.committed += 1;
        }
        if booking.status.is_responded() {
            agg.responded += 1;
        }
    }
    agg
}

impl DataStore for MemoryStore {
    fn provider(&self, provider_id: ProviderId) -> Result<Provider> {
        let data = self.lock()?;
        find_provider(&data, provider_id).cloned()
    }

    fn review_aggregate(&self, provider_id: ProviderId) -> Result<ReviewAggregate> {
        let data = self.lock()?;
        find_provider(&data, provider_id)?;
        Ok(review_aggregate_of(&data, provider_id))
    }

    fn booking_aggregate(&self, provider_id: ProviderId) -> Result<BookingAggregate> {
        let data = self.lock()?;
        find_provider(&data, provider_id)?;
        Ok(booking_aggregate_of(&data, provider_id))
    }

    // All three aggregate reads under one lock acquisition.
    fn score_inputs(&self, provider_id: ProviderId) -> Result<ScoreInputs> {
        let data = self.lock()?;
        let provider = find_provider(&data, provider_id)?;
        let reviews = review_aggregate_of(&data, provider_id);
        let bookings = booking_aggregate_of(&data, provider_id);
        Ok(ScoreInputs {
            avg_rating: reviews.avg_rating,
            review_count: reviews.review_count,
            completed: bookings.completed,
            committed: bookings.committed,
            responded: bookings.responded,
            total_bookings: bookings.total,
            experience_years: provider.experience_years,
        })
    }

    fn persist_honor_score(&self, provider_id: ProviderId, score: f64) -> Result<()> {
        let mut data = self.lock()?;
        find_provider_mut(&mut data, provider_id)?.honor_score = score;
        Ok(())
    }

    // Fetch, compute, and persist under one lock acquisition.
    fn recompute_honor_score(
        &self,
        provider_id: ProviderId,
        compute: &dyn Fn(&ScoreInputs) -> HonorBreakdown,
    ) -> Result<HonorBreakdown> {
        let mut data = self.lock()?;
        let provider = find_provider(&data, provider_id)?;
        let reviews = review_aggregate_of(&data, provider_id);
        let bookings = booking_aggregate_of(&data, provider_id);
        let inputs = ScoreInputs {
            avg_rating: reviews.avg_rating,
            review_count: reviews.review_count,
            completed: bookings.completed,
            committed: bookings.committed,
            responded: bookings.responded,
            total_bookings: bookings.total,
            experience_years: provider.experience_years,
        };
        let breakdown = compute(&inputs);
        find_provider_mut(&mut data, provider_id)?.honor_score = breakdown.total;
        Ok(breakdown)
    }

    fn verified_providers(&self) -> Result<Vec<ProviderId>> {
        let data = self.lock()?;
        Ok(data
            .providers
            .iter()
            .filter(|p| p.is_verified)
            .map(|p| p.id)
            .collect())
    }

    fn booking(&self, booking_id: BookingId) -> Result<Booking> {
        let data = self.lock()?;
        data.bookings
            .iter()
            .find(|b| b.id == booking_id)
            .cloned()
            .ok_or(Error::BookingNotFound(booking_id))
    }

    fn set_booking_status(&self, booking_id: BookingId, status: BookingStatus) -> Result<()> {
        let mut data = self.lock()?;
        let booking = data
            .bookings
            .iter_mut()
            .find(|b| b.id == booking_id)
            .ok_or(Error::BookingNotFound(booking_id))?;
        booking.status = status;
        Ok(())
    }

    fn create_booking(&self, new: NewBooking, total_amount: f64) -> Result<BookingId> {
        let mut data = self.lock()?;
        find_provider(&data, new.provider_id)?;
        let id = data.bookings.iter().map(|b| b.id).max().unwrap_or(0) + 1;
        data.bookings.push(Booking {
            id,
            user_id: new.user_id,
            provider_id: new.provider_id,
            status: BookingStatus::Pending,
            booking_date: new.booking_date,
            estimated_hours: new.estimated_hours,
            total_amount,
            description: new.description,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    fn increment_total_jobs(&self, provider_id: ProviderId) -> Result<()> {
        let mut data = self.lock()?;
        find_provider_mut(&mut data, provider_id)?.total_jobs += 1;
        Ok(())
    }

    fn create_review(
        &self,
        booking_id: BookingId,
        user_id: UserId,
        provider_id: ProviderId,
        rating: u8,
        comment: Option<String>,
    ) -> Result<ReviewId> {
        let mut data = self.lock()?;
        let booking = data
            .bookings
            .iter()
            .find(|b| b.id == booking_id)
            .ok_or(Error::BookingNotFound(booking_id))?;
        if booking.status != BookingStatus::Completed {
            return Err(Error::ReviewRequiresCompletion(booking_id));
        }
        if data.reviews.iter().any(|r| r.booking_id == booking_id) {
            return Err(Error::AlreadyReviewed(booking_id));
        }
        let id = data.reviews.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        data.reviews.push(Review {
            id,
            booking_id,
            user_id,
            provider_id,
            rating,
            comment,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    fn update_provider_rating(
        &self,
        provider_id: ProviderId,
        rating: f64,
        total_reviews: u64,
    ) -> Result<()> {
        let mut data = self.lock()?;
        let provider = find_provider_mut(&mut data, provider_id)?;
        provider.rating = rating;
        provider.total_reviews = total_reviews;
        Ok(())
    }

    fn user_name(&self, user_id: UserId) -> Result<Option<String>> {
        let data = self.lock()?;
        Ok(data
            .users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.full_name.clone()))
    }

    fn mark_notification_read(&self, notification_id: u64) -> Result<()> {
        let mut data = self.lock()?;
        let notification = data
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id)
            .ok_or(Error::NotificationNotFound(notification_id))?;
        notification.is_read = true;
        Ok(())
    }
}

/// The store doubles as the notification sink: delivered notifications land
/// in the notifications table, where the app polls for them.
impl NotificationSink for MemoryStore {
    fn emit(&self, notification: NewNotification) -> Result<()> {
        let mut data = self.lock()?;
        let id = data.notifications.iter().map(|n| n.id).max().unwrap_or(0) + 1;
        data.notifications.push(Notification {
            id,
            recipient: notification.recipient,
            kind: notification.kind,
            title: notification.title,
            message: notification.message,
            related_booking_id: notification.related_booking_id,
            is_read: false,
            created_at: Utc::now(),
        });
        Ok(())
    }
}
