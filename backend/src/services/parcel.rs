//! Parcel administration service

use std::sync::Arc;

use serde::Serialize;
use shared::{validate_elevation, LandParcel, LifecycleState};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::{NewParcel, ParcelWithCount, SurveyStore};

/// Parcel service for registering and inspecting land parcels
#[derive(Clone)]
pub struct ParcelService {
    store: Arc<dyn SurveyStore>,
    recommendation_threshold: u32,
}

/// Parcel with its submission count and derived lifecycle state
#[derive(Debug, Clone, Serialize)]
pub struct ParcelSummary {
    #[serde(flatten)]
    pub parcel: LandParcel,
    pub survey_count: u32,
    pub lifecycle_state: LifecycleState,
}

impl ParcelService {
    /// Create a new ParcelService instance
    pub fn new(store: Arc<dyn SurveyStore>, recommendation_threshold: u32) -> Self {
        Self {
            store,
            recommendation_threshold,
        }
    }

    fn summarize(&self, entry: ParcelWithCount) -> ParcelSummary {
        ParcelSummary {
            lifecycle_state: LifecycleState::for_count(
                entry.survey_count,
                self.recommendation_threshold,
            ),
            parcel: entry.parcel,
            survey_count: entry.survey_count,
        }
    }

    /// Register a parcel for a farmer. No surveyor is assigned yet.
    pub async fn create_parcel(&self, input: NewParcel) -> AppResult<LandParcel> {
        if let Some(elevation) = input.elevation {
            validate_elevation(elevation).map_err(|e| AppError::validation("elevation", e))?;
        }

        let parcel = self.store.create_parcel(input).await?;
        tracing::info!(parcel_id = %parcel.id, owner_id = %parcel.owner_id, "Parcel registered");
        Ok(parcel)
    }

    pub async fn get_parcel(&self, parcel_id: Uuid) -> AppResult<ParcelSummary> {
        self.store
            .get_parcel(parcel_id)
            .await?
            .map(|entry| self.summarize(entry))
            .ok_or_else(|| AppError::not_found("Parcel"))
    }

    /// Parcels in creation order, optionally restricted to one owner
    pub async fn list_parcels(&self, owner_id: Option<Uuid>) -> AppResult<Vec<ParcelSummary>> {
        let parcels = self.store.list_parcels(owner_id).await?;
        Ok(parcels.into_iter().map(|entry| self.summarize(entry)).collect())
    }

    /// Delete a parcel together with its submissions
    pub async fn delete_parcel(&self, parcel_id: Uuid) -> AppResult<()> {
        if !self.store.delete_parcel(parcel_id).await? {
            return Err(AppError::not_found("Parcel"));
        }
        tracing::info!(parcel_id = %parcel_id, "Parcel deleted");
        Ok(())
    }
}
