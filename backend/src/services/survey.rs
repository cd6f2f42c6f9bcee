//! Survey ledger service: claims, submissions and soil summaries
//!
//! The storage collaborator owns atomicity. This service validates input,
//! takes one snapshot of the plant catalog per submission and lifts ledger
//! outcomes into [`AppError`]s.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    average_recent_soil, validate_elevation, ClaimOutcome, LifecyclePolicy, MatchResult,
    MatchingPolicy, SoilAverage, SubmissionPlanner, SurveyStatus,
};
use uuid::Uuid;

use crate::config::SurveyConfig;
use crate::error::{AppError, AppResult};
use crate::store::{SubmissionDraft, SurveyRecord, SurveyStore};

/// Number of submissions shown in a survey history when no limit is given
pub const DEFAULT_HISTORY_LIMIT: u32 = 3;

/// Survey service for the claim and submission lifecycle
#[derive(Clone)]
pub struct SurveyService {
    store: Arc<dyn SurveyStore>,
    lifecycle: LifecyclePolicy,
    matching: MatchingPolicy,
    soil_average_window: u32,
}

/// Input for submitting a survey on a claimed parcel
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitSurveyInput {
    pub climate_id: Uuid,
    pub soil_condition_id: Uuid,
    /// Measured elevation in meters
    pub elevation: Decimal,
    /// Plant picked by the surveyor instead of the top recommendation
    #[serde(default)]
    pub chosen_plant_id: Option<Uuid>,
}

/// Result of a successful claim
#[derive(Debug, Clone, Serialize)]
pub struct ClaimReceipt {
    pub parcel_id: Uuid,
    pub surveyor_id: Uuid,
    /// False when the surveyor already held the claim
    pub newly_assigned: bool,
}

/// Result of a stored survey submission
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub submission_id: Uuid,
    pub parcel_id: Uuid,
    pub sequence: u32,
    pub status: SurveyStatus,
    pub recommended_plant_id: Option<Uuid>,
    /// Present only when this submission ran the matching engine
    pub recommendation: Option<MatchResult>,
}

impl SurveyService {
    /// Create a new SurveyService instance
    pub fn new(store: Arc<dyn SurveyStore>, survey: &SurveyConfig, matching: MatchingPolicy) -> Self {
        Self {
            store,
            lifecycle: survey.lifecycle(),
            matching,
            soil_average_window: survey.soil_average_window,
        }
    }

    /// Claim a parcel for a surveyor. Re-claiming by the holder succeeds.
    pub async fn claim_parcel(&self, parcel_id: Uuid, surveyor_id: Uuid) -> AppResult<ClaimReceipt> {
        match self.store.claim_parcel(parcel_id, surveyor_id).await? {
            ClaimOutcome::Granted => {
                tracing::info!(parcel_id = %parcel_id, surveyor_id = %surveyor_id, "Parcel claimed");
                Ok(ClaimReceipt {
                    parcel_id,
                    surveyor_id,
                    newly_assigned: true,
                })
            }
            ClaimOutcome::AlreadyHeld => Ok(ClaimReceipt {
                parcel_id,
                surveyor_id,
                newly_assigned: false,
            }),
            ClaimOutcome::HeldByOther { surveyor_id: holder } => {
                tracing::warn!(
                    parcel_id = %parcel_id,
                    surveyor_id = %surveyor_id,
                    holder = %holder,
                    "Claim denied, parcel held by another surveyor"
                );
                Err(AppError::AlreadyClaimed)
            }
        }
    }

    /// Append a survey to the parcel's ledger.
    ///
    /// The submission's sequence decides whether the matching engine runs.
    /// When it does, the submission is `completed` and carries the chosen or
    /// top recommended plant; otherwise it is `waiting`.
    pub async fn submit_survey(
        &self,
        parcel_id: Uuid,
        surveyor_id: Uuid,
        input: SubmitSurveyInput,
    ) -> AppResult<SubmissionReceipt> {
        validate_elevation(input.elevation).map_err(|e| AppError::validation("elevation", e))?;

        let catalog = self.store.plant_catalog().await?;
        let planner = SubmissionPlanner::new(catalog, self.lifecycle, self.matching.clone())
            .with_chosen_plant(input.chosen_plant_id);

        let draft = SubmissionDraft {
            parcel_id,
            surveyor_id,
            climate_id: input.climate_id,
            soil_condition_id: input.soil_condition_id,
            elevation: input.elevation,
        };
        let (submission, plan) = self.store.append_submission(draft, &planner).await?;

        tracing::info!(
            parcel_id = %parcel_id,
            submission_id = %submission.id,
            sequence = submission.sequence,
            status = %submission.status,
            "Survey submitted"
        );
        if let Some(plant_id) = submission.recommended_plant_id {
            tracing::info!(parcel_id = %parcel_id, plant_id = %plant_id, "Recommendation attached");
        }

        Ok(SubmissionReceipt {
            submission_id: submission.id,
            parcel_id,
            sequence: submission.sequence,
            status: submission.status,
            recommended_plant_id: submission.recommended_plant_id,
            recommendation: plan.recommendation.map(|r| r.matches),
        })
    }

    /// Mean soil readings over the most recent submissions
    pub async fn recent_soil_average(
        &self,
        parcel_id: Uuid,
        window: Option<u32>,
    ) -> AppResult<SoilAverage> {
        let window = window.unwrap_or(self.soil_average_window);
        if window == 0 {
            return Err(AppError::validation("window", "Window must be at least 1"));
        }

        let samples = self.store.recent_soil_samples(parcel_id, window).await?;
        average_recent_soil(&samples, window).ok_or_else(|| AppError::not_found("Survey data"))
    }

    /// Latest submissions of a parcel with their readings, newest first
    pub async fn survey_history(
        &self,
        parcel_id: Uuid,
        limit: Option<u32>,
    ) -> AppResult<Vec<SurveyRecord>> {
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT).max(1);
        self.store.survey_history(parcel_id, limit).await
    }
}
