use super::transitions::check_transition;
use crate::error::{Error, Result};
use crate::notify::{NewNotification, NotificationKind, NotificationSink, Recipient};
use crate::scoring::engine::round1;
use crate::scoring::{HonorBreakdown, ScoreUpdater};
use crate::store::types::{BookingId, BookingStatus, ProviderId, ReviewId, UserId};
use crate::store::{DataStore, NewBooking};

/// Customer-supplied fields for a new booking.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub user_id: UserId,
    pub provider_id: ProviderId,
    pub booking_date: String,
    pub estimated_hours: u32,
    pub description: Option<String>,
}

/// Drives the booking lifecycle and its side effects: notifications to the
/// counterparty, job counters, and honor score recomputes. All mutation of
/// a provider's derived fields funnels through here and the score updater;
/// no call site touches them directly.
pub struct BookingService<'a, S: DataStore, N: NotificationSink> {
    store: &'a S,
    notifier: &'a N,
}

impl<'a, S: DataStore, N: NotificationSink> BookingService<'a, S, N> {
    pub fn new(store: &'a S, notifier: &'a N) -> Self {
        Self { store, notifier }
    }

    /// Place a new booking in `pending`. The total amount is priced at the
    /// provider's current hourly rate and frozen; later rate changes do not
    /// reprice it. Both parties are notified.
    pub fn create_booking(&self, request: BookingRequest) -> Result<BookingId> {
        let provider = self.store.provider(request.provider_id)?;
        let total_amount = provider.hourly_rate * f64::from(request.estimated_hours);

        let booking_id = self.store.create_booking(
            NewBooking {
                user_id: request.user_id,
                provider_id: request.provider_id,
                booking_date: request.booking_date.clone(),
                estimated_hours: request.estimated_hours,
                description: request.description,
            },
            total_amount,
        )?;

        let user_name = self.display_user_name(request.user_id)?;
        self.notify(NewNotification {
            recipient: Recipient::Provider(provider.id),
            kind: NotificationKind::BookingCreated,
            title: "New Booking Request".to_string(),
            message: format!(
                "You have a new booking request from {} for {} on {}.",
                user_name, provider.service_name, request.booking_date
            ),
            related_booking_id: Some(booking_id),
        });
        self.notify(NewNotification {
            recipient: Recipient::User(request.user_id),
            kind: NotificationKind::BookingSubmitted,
            title: "Booking Submitted".to_string(),
            message: format!(
                "Your booking for {} with {} has been submitted. Waiting for confirmation.",
                provider.service_name, provider.full_name
            ),
            related_booking_id: Some(booking_id),
        });

        Ok(booking_id)
    }

    /// Move a booking to a new status.
    ///
    /// When a provider identity is asserted it must match the booking's
    /// provider; a mismatch fails with no state change. Completion and
    /// cancellation trigger an honor score recompute, returned for
    /// auditability.
    pub fn set_status(
        &self,
        booking_id: BookingId,
        new_status: BookingStatus,
        asserting_provider: Option<ProviderId>,
    ) -> Result<Option<HonorBreakdown>> {
        let booking = self.store.booking(booking_id)?;

        if let Some(asserted) = asserting_provider {
            if asserted != booking.provider_id {
                return Err(Error::Unauthorized {
                    booking: booking_id,
                    asserted,
                });
            }
        }

        check_transition(booking.status, new_status)?;

        let provider = self.store.provider(booking.provider_id)?;
        // Every fallible read happens before the status write; a store
        // failure here must not leave a terminal booking with its job
        // counter and recompute skipped.
        let user_name = match new_status {
            BookingStatus::Completed | BookingStatus::Cancelled => {
                Some(self.display_user_name(booking.user_id)?)
            }
            _ => None,
        };
        self.store.set_booking_status(booking_id, new_status)?;

        match new_status {
            BookingStatus::Accepted => {
                self.notify(NewNotification {
                    recipient: Recipient::User(booking.user_id),
                    kind: NotificationKind::BookingAccepted,
                    title: "Booking Confirmed".to_string(),
                    message: format!(
                        "Your booking for {} with {} has been confirmed.",
                        provider.service_name, provider.full_name
                    ),
                    related_booking_id: Some(booking_id),
                });
                Ok(None)
            }
            BookingStatus::InProgress => {
                self.notify(NewNotification {
                    recipient: Recipient::User(booking.user_id),
                    kind: NotificationKind::BookingStarted,
                    title: "Service Started".to_string(),
                    message: format!(
                        "{} has started working on your {} service.",
                        provider.full_name, provider.service_name
                    ),
                    related_booking_id: Some(booking_id),
                });
                Ok(None)
            }
            BookingStatus::Completed => {
                let user_name = user_name.unwrap_or_else(|| "a customer".to_string());
                self.notify(NewNotification {
                    recipient: Recipient::User(booking.user_id),
                    kind: NotificationKind::BookingCompleted,
                    title: "Task Completed!".to_string(),
                    message: format!(
                        "Your {} service has been completed. Please rate your experience with {}.",
                        provider.service_name, provider.full_name
                    ),
                    related_booking_id: Some(booking_id),
                });
                self.notify(NewNotification {
                    recipient: Recipient::Provider(booking.provider_id),
                    kind: NotificationKind::JobCompleted,
                    title: "Job Completed".to_string(),
                    message: format!(
                        "You have successfully completed the {} job for {}. Payment of \u{20b9}{} is due.",
                        provider.service_name, user_name, booking.total_amount
                    ),
                    related_booking_id: Some(booking_id),
                });

                self.store.increment_total_jobs(booking.provider_id)?;
                let breakdown = ScoreUpdater::new(self.store).recompute(booking.provider_id)?;
                Ok(Some(breakdown))
            }
            BookingStatus::Cancelled => {
                let user_name = user_name.unwrap_or_else(|| "a customer".to_string());
                self.notify(NewNotification {
                    recipient: Recipient::User(booking.user_id),
                    kind: NotificationKind::BookingCancelled,
                    title: "Booking Cancelled".to_string(),
                    message: format!(
                        "Your booking for {} on {} has been cancelled.",
                        provider.service_name, booking.booking_date
                    ),
                    related_booking_id: Some(booking_id),
                });
                self.notify(NewNotification {
                    recipient: Recipient::Provider(booking.provider_id),
                    kind: NotificationKind::BookingCancelled,
                    title: "Booking Cancelled".to_string(),
                    message: format!(
                        "The booking from {} for {} has been cancelled.",
                        user_name, booking.booking_date
                    ),
                    related_booking_id: Some(booking_id),
                });

                // Cancellations count against the completion rate.
                let breakdown = ScoreUpdater::new(self.store).recompute(booking.provider_id)?;
                Ok(Some(breakdown))
            }
            // The transition guard never lets a booking return to pending.
            BookingStatus::Pending => Ok(None),
        }
    }

    /// Submit the one review a completed booking may receive. Recomputes
    /// the provider's mean rating, review count and honor score.
    pub fn submit_review(
        &self,
        booking_id: BookingId,
        user_id: UserId,
        rating: u8,
        comment: Option<String>,
    ) -> Result<ReviewId> {
        if !(1..=5).contains(&rating) {
            return Err(Error::RatingOutOfRange(rating));
        }

        let booking = self.store.booking(booking_id)?;
        // Reviews are tied to the booking's own customer.
        if booking.user_id != user_id {
            return Err(Error::BookingNotFound(booking_id));
        }
        if booking.status != BookingStatus::Completed {
            return Err(Error::ReviewRequiresCompletion(booking_id));
        }

        let review_id = self.store.create_review(
            booking_id,
            user_id,
            booking.provider_id,
            rating,
            comment,
        )?;

        let aggregate = self.store.review_aggregate(booking.provider_id)?;
        self.store.update_provider_rating(
            booking.provider_id,
            round1(aggregate.avg_rating),
            aggregate.review_count,
        )?;

        ScoreUpdater::new(self.store).recompute(booking.provider_id)?;

        Ok(review_id)
    }

    fn display_user_name(&self, user_id: UserId) -> Result<String> {
        Ok(self
            .store
            .user_name(user_id)?
            .unwrap_or_else(|| "a customer".to_string()))
    }

    // Notification delivery is best-effort: the booking or score mutation
    // stands even if the sink fails.
    fn notify(&self, notification: NewNotification) {
        if let Err(e) = self.notifier.emit(notification) {
            tracing::warn!(error = %e, "notification emission failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Notification;
    use crate::store::memory::{MemoryStore, StoreData};
    use crate::store::types::{Booking, Provider, User};
    use chrono::Utc;

    fn seeded_store() -> MemoryStore {
        MemoryStore::from_data(StoreData {
            users: vec![User {
                id: 1,
                full_name: "Asha Verma".to_string(),
            }],
            providers: vec![Provider {
                id: 10,
                full_name: "Ravi Kumar".to_string(),
                service_name: "Plumbing".to_string(),
                hourly_rate: 50.0,
                experience_years: 5,
                is_verified: true,
                honor_score: 0.0,
                rating: 0.0,
                total_reviews: 0,
                total_jobs: 0,
            }],
            bookings: vec![Booking {
                id: 100,
                user_id: 1,
                provider_id: 10,
                status: BookingStatus::Pending,
                booking_date: "2026-09-01".to_string(),
                estimated_hours: 2,
                total_amount: 100.0,
                description: None,
                created_at: Utc::now(),
            }],
            ..Default::default()
        })
    }

    fn notifications(store: &MemoryStore) -> Vec<Notification> {
        store.snapshot().unwrap().notifications
    }

    #[test]
    fn test_create_booking_freezes_total_amount() {
        let store = seeded_store();
        let service = BookingService::new(&store, &store);

        let id = service
            .create_booking(BookingRequest {
                user_id: 1,
                provider_id: 10,
                booking_date: "2026-09-15".to_string(),
                estimated_hours: 3,
                description: None,
            })
            .unwrap();

        let booking = store.booking(id).unwrap();
        assert_eq!(booking.total_amount, 150.0);
        assert_eq!(booking.status, BookingStatus::Pending);

        // Both parties heard about it.
        let sent = notifications(&store);
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].recipient, Recipient::Provider(10));
        assert_eq!(sent[0].kind, NotificationKind::BookingCreated);
        assert_eq!(sent[1].recipient, Recipient::User(1));
        assert_eq!(sent[1].kind, NotificationKind::BookingSubmitted);
    }

    #[test]
    fn test_accept_notifies_user_only() {
        let store = seeded_store();
        let service = BookingService::new(&store, &store);

        let breakdown = service
            .set_status(100, BookingStatus::Accepted, Some(10))
            .unwrap();
        assert!(breakdown.is_none());

        let sent = notifications(&store);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, Recipient::User(1));
        assert_eq!(sent[0].kind, NotificationKind::BookingAccepted);
        assert_eq!(sent[0].title, "Booking Confirmed");
        assert_eq!(sent[0].related_booking_id, Some(100));
    }

    #[test]
    fn test_completion_increments_jobs_and_recomputes_once() {
        let store = seeded_store();
        let service = BookingService::new(&store, &store);

        service.set_status(100, BookingStatus::Accepted, None).unwrap();
        service
            .set_status(100, BookingStatus::InProgress, None)
            .unwrap();
        let breakdown = service
            .set_status(100, BookingStatus::Completed, None)
            .unwrap()
            .expect("completion recomputes");

        let provider = store.provider(10).unwrap();
        assert_eq!(provider.total_jobs, 1);
        // 0 rating + 30 completion (1/1) + 15 response (1/1) + 0 + 2.5 exp.
        assert_eq!(breakdown.total, 47.5);
        assert_eq!(provider.honor_score, 47.5);

        // accepted + started + completion pair.
        let sent = notifications(&store);
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[2].recipient, Recipient::User(1));
        assert_eq!(sent[2].kind, NotificationKind::BookingCompleted);
        assert_eq!(sent[3].recipient, Recipient::Provider(10));
        assert_eq!(sent[3].kind, NotificationKind::JobCompleted);
        assert!(sent[3].message.contains("\u{20b9}100"));
    }

    #[test]
    fn test_cancel_pending_notifies_both_and_recomputes() {
        let store = seeded_store();
        let service = BookingService::new(&store, &store);

        let breakdown = service
            .set_status(100, BookingStatus::Cancelled, None)
            .unwrap()
            .expect("cancellation recomputes");

        // 0 completed of 1 committed, 1 responded of 1 total.
        assert_eq!(breakdown.completion_score, 0.0);
        assert_eq!(breakdown.response_score, 15.0);

        let sent = notifications(&store);
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].recipient, Recipient::User(1));
        assert_eq!(sent[1].recipient, Recipient::Provider(10));
        assert!(sent.iter().all(|n| n.kind == NotificationKind::BookingCancelled));

        // A second cancellation of the now-terminal booking is an error.
        let err = service
            .set_status(100, BookingStatus::Cancelled, None)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
        assert_eq!(notifications(&store).len(), 2);
    }

    #[test]
    fn test_provider_mismatch_is_unauthorized_without_mutation() {
        let store = seeded_store();
        let service = BookingService::new(&store, &store);

        let err = service
            .set_status(100, BookingStatus::Accepted, Some(77))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Unauthorized {
                booking: 100,
                asserted: 77
            }
        ));

        assert_eq!(store.booking(100).unwrap().status, BookingStatus::Pending);
        assert!(notifications(&store).is_empty());
    }

    #[test]
    fn test_unknown_booking_is_not_found() {
        let store = seeded_store();
        let service = BookingService::new(&store, &store);
        assert!(matches!(
            service.set_status(999, BookingStatus::Accepted, None),
            Err(Error::BookingNotFound(999))
        ));
    }

    fn complete_booking(service: &BookingService<'_, MemoryStore, MemoryStore>) {
        service.set_status(100, BookingStatus::Accepted, None).unwrap();
        service
            .set_status(100, BookingStatus::InProgress, None)
            .unwrap();
        service
            .set_status(100, BookingStatus::Completed, None)
            .unwrap();
    }

    #[test]
    fn test_review_updates_rating_and_honor_score() {
        let store = seeded_store();
        let service = BookingService::new(&store, &store);
        complete_booking(&service);

        service
            .submit_review(100, 1, 4, Some("solid work".to_string()))
            .unwrap();

        let provider = store.provider(10).unwrap();
        assert_eq!(provider.rating, 4.0);
        assert_eq!(provider.total_reviews, 1);
        // 32 rating + 30 completion + 15 response + 0.2 reviews + 2.5 exp.
        assert_eq!(provider.honor_score, 79.7);
    }

    #[test]
    fn test_duplicate_review_rejected_without_drift() {
        let store = seeded_store();
        let service = BookingService::new(&store, &store);
        complete_booking(&service);

        service.submit_review(100, 1, 4, None).unwrap();
        let before = store.provider(10).unwrap();

        let err = service.submit_review(100, 1, 5, None).unwrap_err();
        assert!(matches!(err, Error::AlreadyReviewed(100)));

        let after = store.provider(10).unwrap();
        assert_eq!(after.rating, before.rating);
        assert_eq!(after.total_reviews, before.total_reviews);
        assert_eq!(after.honor_score, before.honor_score);
    }

    #[test]
    fn test_review_requires_completed_booking() {
        let store = seeded_store();
        let service = BookingService::new(&store, &store);

        let err = service.submit_review(100, 1, 5, None).unwrap_err();
        assert!(matches!(err, Error::ReviewRequiresCompletion(100)));
    }

    #[test]
    fn test_review_rating_bounds() {
        let store = seeded_store();
        let service = BookingService::new(&store, &store);
        complete_booking(&service);

        assert!(matches!(
            service.submit_review(100, 1, 0, None),
            Err(Error::RatingOutOfRange(0))
        ));
        assert!(matches!(
            service.submit_review(100, 1, 6, None),
            Err(Error::RatingOutOfRange(6))
        ));
    }

    #[test]
    fn test_review_by_wrong_user_looks_like_missing_booking() {
        let store = seeded_store();
        let service = BookingService::new(&store, &store);
        complete_booking(&service);

        assert!(matches!(
            service.submit_review(100, 42, 5, None),
            Err(Error::BookingNotFound(100))
        ));
    }

    #[test]
    fn test_user_lookup_failure_leaves_booking_untouched() {
        // A store whose user lookup fails mid-transition.
        struct NoUsers {
            inner: MemoryStore,
        }

        impl DataStore for NoUsers {
            fn provider(&self, id: u64) -> crate::error::Result<Provider> {
                self.inner.provider(id)
            }
            fn review_aggregate(
                &self,
                id: u64,
            ) -> crate::error::Result<crate::store::ReviewAggregate> {
                self.inner.review_aggregate(id)
            }
            fn booking_aggregate(
                &self,
                id: u64,
            ) -> crate::error::Result<crate::store::BookingAggregate> {
                self.inner.booking_aggregate(id)
            }
            fn persist_honor_score(&self, id: u64, score: f64) -> crate::error::Result<()> {
                self.inner.persist_honor_score(id, score)
            }
            fn verified_providers(&self) -> crate::error::Result<Vec<u64>> {
                self.inner.verified_providers()
            }
            fn booking(&self, id: u64) -> crate::error::Result<Booking> {
                self.inner.booking(id)
            }
            fn set_booking_status(
                &self,
                id: u64,
                status: BookingStatus,
            ) -> crate::error::Result<()> {
                self.inner.set_booking_status(id, status)
            }
            fn create_booking(
                &self,
                new: crate::store::NewBooking,
                total_amount: f64,
            ) -> crate::error::Result<u64> {
                self.inner.create_booking(new, total_amount)
            }
            fn increment_total_jobs(&self, id: u64) -> crate::error::Result<()> {
                self.inner.increment_total_jobs(id)
            }
            fn create_review(
                &self,
                booking_id: u64,
                user_id: u64,
                provider_id: u64,
                rating: u8,
                comment: Option<String>,
            ) -> crate::error::Result<u64> {
                self.inner
                    .create_review(booking_id, user_id, provider_id, rating, comment)
            }
            fn update_provider_rating(
                &self,
                id: u64,
                rating: f64,
                total: u64,
            ) -> crate::error::Result<()> {
                self.inner.update_provider_rating(id, rating, total)
            }
            fn user_name(&self, _id: u64) -> crate::error::Result<Option<String>> {
                Err(Error::Persistence("users table unavailable".to_string()))
            }
            fn mark_notification_read(&self, id: u64) -> crate::error::Result<()> {
                self.inner.mark_notification_read(id)
            }
        }

        let inner = seeded_store();
        {
            let service = BookingService::new(&inner, &inner);
            service.set_status(100, BookingStatus::Accepted, None).unwrap();
            service
                .set_status(100, BookingStatus::InProgress, None)
                .unwrap();
        }

        let store = NoUsers { inner };
        let sink = MemoryStore::new();
        let service = BookingService::new(&store, &sink);

        let err = service
            .set_status(100, BookingStatus::Completed, None)
            .unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));

        // The booking is still in progress and no side effect fired.
        assert_eq!(
            store.inner.booking(100).unwrap().status,
            BookingStatus::InProgress
        );
        assert_eq!(store.inner.provider(10).unwrap().total_jobs, 0);
        assert!(sink.snapshot().unwrap().notifications.is_empty());
    }

    #[test]
    fn test_notification_failure_does_not_block_transition() {
        struct FailingSink;
        impl NotificationSink for FailingSink {
            fn emit(&self, _n: NewNotification) -> crate::error::Result<()> {
                Err(Error::Persistence("sink offline".to_string()))
            }
        }

        let store = seeded_store();
        let sink = FailingSink;
        let service = BookingService::new(&store, &sink);

        service.set_status(100, BookingStatus::Accepted, None).unwrap();
        assert_eq!(store.booking(100).unwrap().status, BookingStatus::Accepted);
    }
}
