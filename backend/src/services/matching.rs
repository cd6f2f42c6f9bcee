//! Stateless plant matching over the current catalog

use std::sync::Arc;

use shared::{match_plants, validate_observed, MatchResult, MatchingPolicy, ObservedConditions};

use crate::error::{AppError, AppResult};
use crate::store::SurveyStore;

/// Scores the plant catalog against observed conditions without recording anything
#[derive(Clone)]
pub struct MatchingService {
    store: Arc<dyn SurveyStore>,
    policy: MatchingPolicy,
}

impl MatchingService {
    pub fn new(store: Arc<dyn SurveyStore>, policy: MatchingPolicy) -> Self {
        Self { store, policy }
    }

    /// Partition the catalog into recommended and other plants
    pub async fn match_plants(&self, observed: ObservedConditions) -> AppResult<MatchResult> {
        validate_observed(&observed).map_err(|(field, message)| AppError::validation(field, message))?;

        // One read so scoring never sees a half-updated catalog
        let catalog = self.store.plant_catalog().await?;
        let result = match_plants(&catalog, &observed, &self.policy);

        tracing::debug!(
            candidates = catalog.len(),
            recommended = result.recommended.len(),
            "Plant matching completed"
        );
        Ok(result)
    }
}
