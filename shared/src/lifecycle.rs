//! Survey submission lifecycle
//!
//! Decides, from the number of submissions a parcel already has, what the
//! next submission looks like: its sequence number, its status and whether
//! the matching engine runs for it. Stores call [`SubmissionPlanner::plan`]
//! while holding the per-parcel lock so that counting and inserting happen
//! as one unit.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::matching::{match_plants, MatchResult, MatchingPolicy};
use crate::models::{PlantProfile, SurveyStatus};
use crate::types::ObservedConditions;

/// Default number of submissions before recommendations are computed
pub const DEFAULT_RECOMMENDATION_THRESHOLD: u32 = 3;

/// Which submissions at or past the threshold run the matching engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RetriggerPolicy {
    /// Every submission numbered at or above the threshold
    #[default]
    EverySubmission,
    /// Only the submission numbered exactly at the threshold
    ThresholdOnly,
}

/// Threshold rules for one deployment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LifecyclePolicy {
    pub recommendation_threshold: u32,
    pub retrigger: RetriggerPolicy,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            recommendation_threshold: DEFAULT_RECOMMENDATION_THRESHOLD,
            retrigger: RetriggerPolicy::default(),
        }
    }
}

impl LifecyclePolicy {
    /// Whether the submission with this 1-based sequence runs matching
    pub fn runs_matching(&self, sequence: u32) -> bool {
        match self.retrigger {
            RetriggerPolicy::EverySubmission => sequence >= self.recommendation_threshold,
            RetriggerPolicy::ThresholdOnly => sequence == self.recommendation_threshold,
        }
    }
}

/// Errors raised while planning a submission
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("Plant {0} is not in the catalog")]
    UnknownPlant(Uuid),

    #[error("Submission {sequence} does not compute recommendations, a plant cannot be chosen")]
    ChoiceWithoutRecommendation { sequence: u32 },
}

/// Recommendation attached to a submission that ran matching
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    /// Plant stored on the submission
    pub plant_id: Option<Uuid>,
    pub matches: MatchResult,
}

/// Outcome of planning the next submission for a parcel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmissionPlan {
    pub sequence: u32,
    pub status: SurveyStatus,
    pub recommendation: Option<Recommendation>,
}

impl SubmissionPlan {
    pub fn recommended_plant_id(&self) -> Option<Uuid> {
        self.recommendation.as_ref().and_then(|r| r.plant_id)
    }
}

/// Plans a submission against a consistent snapshot of the plant catalog
#[derive(Debug, Clone)]
pub struct SubmissionPlanner {
    catalog: Vec<PlantProfile>,
    lifecycle: LifecyclePolicy,
    matching: MatchingPolicy,
    chosen_plant_id: Option<Uuid>,
}

impl SubmissionPlanner {
    pub fn new(
        catalog: Vec<PlantProfile>,
        lifecycle: LifecyclePolicy,
        matching: MatchingPolicy,
    ) -> Self {
        Self {
            catalog,
            lifecycle,
            matching,
            chosen_plant_id: None,
        }
    }

    /// Attach a surveyor-picked plant instead of the top recommendation
    pub fn with_chosen_plant(mut self, plant_id: Option<Uuid>) -> Self {
        self.chosen_plant_id = plant_id;
        self
    }

    pub fn lifecycle(&self) -> &LifecyclePolicy {
        &self.lifecycle
    }

    /// Plan the submission following `existing_count` earlier ones
    pub fn plan(
        &self,
        existing_count: u32,
        observed: &ObservedConditions,
    ) -> Result<SubmissionPlan, PlanError> {
        let sequence = existing_count + 1;

        if !self.lifecycle.runs_matching(sequence) {
            if self.chosen_plant_id.is_some() {
                return Err(PlanError::ChoiceWithoutRecommendation { sequence });
            }
            return Ok(SubmissionPlan {
                sequence,
                status: SurveyStatus::Waiting,
                recommendation: None,
            });
        }

        let matches = match_plants(&self.catalog, observed, &self.matching);
        let plant_id = match self.chosen_plant_id {
            Some(id) if self.catalog.iter().any(|p| p.id == id) => Some(id),
            Some(id) => return Err(PlanError::UnknownPlant(id)),
            None => matches.best().map(|scored| scored.plant.id),
        };

        Ok(SubmissionPlan {
            sequence,
            status: SurveyStatus::Completed,
            recommendation: Some(Recommendation { plant_id, matches }),
        })
    }
}
