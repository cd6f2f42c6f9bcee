//! Survey submission models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One surveyor visit recorded against a parcel. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SurveySubmission {
    pub id: Uuid,
    pub parcel_id: Uuid,
    pub surveyor_id: Uuid,
    pub climate_id: Uuid,
    pub soil_condition_id: Uuid,
    pub recommended_plant_id: Option<Uuid>,
    pub status: SurveyStatus,
    /// 1-based position of this submission within its parcel
    pub sequence: u32,
    /// Elevation measured on this visit, in meters
    pub elevation: Decimal,
    pub submitted_at: DateTime<Utc>,
}

/// Submission status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SurveyStatus {
    /// Collected, no recommendation computed
    Waiting,
    /// Matching ran for this submission
    Completed,
}

impl SurveyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SurveyStatus::Waiting => "waiting",
            SurveyStatus::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "waiting" => Some(SurveyStatus::Waiting),
            "completed" => Some(SurveyStatus::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for SurveyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a parcel, derived from its submission count
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// No submissions yet
    New,
    /// Below the recommendation threshold
    Collecting,
    /// Threshold reached, recommendations have been computed
    Recommending,
}

impl LifecycleState {
    pub fn for_count(submission_count: u32, threshold: u32) -> Self {
        if submission_count == 0 {
            LifecycleState::New
        } else if submission_count < threshold {
            LifecycleState::Collecting
        } else {
            LifecycleState::Recommending
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleState::New => write!(f, "New"),
            LifecycleState::Collecting => write!(f, "Collecting"),
            LifecycleState::Recommending => write!(f, "Recommending"),
        }
    }
}
