use super::engine::{calculate_score, HonorBreakdown};
use crate::error::{Error, Result};
use crate::store::types::ProviderId;
use crate::store::DataStore;

/// Outcome of one provider's recompute within a batch. Failures carry the
/// error instead of aborting the batch.
#[derive(Debug)]
pub struct RecomputeOutcome {
    pub provider_id: ProviderId,
    pub result: Result<HonorBreakdown>,
}

/// Owns the fetch-compute-persist sequence for honor scores. Every call
/// site that needs a recompute goes through here; nothing else writes
/// `honor_score`.
pub struct ScoreUpdater<'a, S: DataStore> {
    store: &'a S,
}

impl<'a, S: DataStore> ScoreUpdater<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Recompute and persist one provider's score. The store runs the
    /// fetch-compute-persist sequence as a single operation
    /// ([`DataStore::recompute_honor_score`]) so concurrent completions
    /// for the same provider cannot clobber each other.
    pub fn recompute(&self, provider_id: ProviderId) -> Result<HonorBreakdown> {
        let breakdown = self
            .store
            .recompute_honor_score(provider_id, &calculate_score)?;
        tracing::debug!(
            provider_id,
            total = breakdown.total,
            "honor score recomputed"
        );
        Ok(breakdown)
    }

    /// Recompute every verified provider. One provider failing is recorded
    /// in its outcome and the rest of the batch proceeds; prior successful
    /// updates stand.
    pub fn recompute_all(&self) -> Result<Vec<RecomputeOutcome>> {
        let providers = self.store.verified_providers()?;
        let mut outcomes = Vec::with_capacity(providers.len());
        for provider_id in providers {
            let result = self.recompute(provider_id);
            if let Err(ref e) = result {
                tracing::warn!(provider_id, error = %e, "recompute failed, continuing batch");
            }
            outcomes.push(RecomputeOutcome {
                provider_id,
                result,
            });
        }
        Ok(outcomes)
    }
}

impl RecomputeOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn error(&self) -> Option<&Error> {
        self.result.as_ref().err()
    }
}
