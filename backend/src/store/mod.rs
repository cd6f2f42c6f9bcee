//! Storage collaborators for the survey ledger
//!
//! [`SurveyStore`] is the contract the core needs from durable storage:
//! an atomic conditional claim, a transactional count-and-append for
//! submissions, and consistent reads of the plant catalog and reference
//! tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    ClaimOutcome, ClimateProfile, LandParcel, PlantProfile, PlantType, SoilCondition, SoilSample,
    SubmissionPlan, SubmissionPlanner, SurveyStatus, SurveySubmission,
};
use uuid::Uuid;

use crate::error::AppResult;

pub mod memory;
pub mod postgres;

pub use memory::MemorySurveyStore;
pub use postgres::PgSurveyStore;

/// Input for registering a parcel
#[derive(Debug, Clone, Deserialize)]
pub struct NewParcel {
    pub owner_id: Uuid,
    pub address_id: Option<Uuid>,
    pub elevation: Option<Decimal>,
}

/// Parcel together with its submission count
#[derive(Debug, Clone, Serialize)]
pub struct ParcelWithCount {
    #[serde(flatten)]
    pub parcel: LandParcel,
    pub survey_count: u32,
}

/// Input for storing a measured soil condition
#[derive(Debug, Clone, Deserialize)]
pub struct NewSoilCondition {
    pub texture: String,
    pub ph: Decimal,
    pub nutrient: Decimal,
    pub humidity: Decimal,
}

/// Input for adding a plant to the catalog
#[derive(Debug, Clone, Deserialize)]
pub struct NewPlant {
    pub plant_type_id: Uuid,
    pub name: String,
    pub ideal_elevation: Option<Decimal>,
    pub ideal_ph: Option<Decimal>,
    pub ideal_nutrient: Option<Decimal>,
    pub ideal_humidity: Option<Decimal>,
    pub ideal_climate_id: Option<Uuid>,
    pub soil_texture: Option<String>,
}

/// A survey a surveyor wants to append
#[derive(Debug, Clone)]
pub struct SubmissionDraft {
    pub parcel_id: Uuid,
    pub surveyor_id: Uuid,
    pub climate_id: Uuid,
    pub soil_condition_id: Uuid,
    pub elevation: Decimal,
}

/// Submission joined with its readings for history views
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SurveyRecord {
    pub submission_id: Uuid,
    pub parcel_id: Uuid,
    pub surveyor_id: Uuid,
    pub sequence: u32,
    pub status: SurveyStatus,
    pub submitted_at: DateTime<Utc>,
    pub elevation: Decimal,
    pub weather_type: String,
    pub soil_texture: String,
    pub ph: Decimal,
    pub nutrient: Decimal,
    pub humidity: Decimal,
    pub recommended_plant_id: Option<Uuid>,
    pub recommended_plant_name: Option<String>,
}

/// Storage contract for the survey ledger and its reference data
#[async_trait]
pub trait SurveyStore: Send + Sync {
    /// Cheap connectivity check
    async fn ping(&self) -> AppResult<()>;

    // Parcels

    async fn create_parcel(&self, input: NewParcel) -> AppResult<LandParcel>;

    async fn get_parcel(&self, parcel_id: Uuid) -> AppResult<Option<ParcelWithCount>>;

    /// Parcels in creation order, optionally only those owned by `owner_id`
    async fn list_parcels(&self, owner_id: Option<Uuid>) -> AppResult<Vec<ParcelWithCount>>;

    /// Remove a parcel and its submissions. Returns false when absent.
    async fn delete_parcel(&self, parcel_id: Uuid) -> AppResult<bool>;

    /// Read-and-assign as one atomic unit. `NotFound` when the parcel is absent.
    async fn claim_parcel(&self, parcel_id: Uuid, surveyor_id: Uuid) -> AppResult<ClaimOutcome>;

    // Submissions

    /// Count existing submissions, plan and insert the next one atomically per parcel.
    ///
    /// Fails with `NotFound` for an unknown parcel, climate or soil condition and
    /// with `NotClaimedBySurveyor` when the surveyor does not hold the claim. The
    /// parcel's elevation is overwritten with the draft's elevation.
    async fn append_submission(
        &self,
        draft: SubmissionDraft,
        planner: &SubmissionPlanner,
    ) -> AppResult<(SurveySubmission, SubmissionPlan)>;

    /// Soil readings of the `limit` most recent submissions, newest first
    async fn recent_soil_samples(&self, parcel_id: Uuid, limit: u32) -> AppResult<Vec<SoilSample>>;

    /// Submissions newest first with their readings
    async fn survey_history(&self, parcel_id: Uuid, limit: u32) -> AppResult<Vec<SurveyRecord>>;

    // Reference data

    async fn record_soil_condition(&self, input: NewSoilCondition) -> AppResult<SoilCondition>;

    async fn list_soil_conditions(&self) -> AppResult<Vec<SoilCondition>>;

    async fn list_climates(&self) -> AppResult<Vec<ClimateProfile>>;

    async fn list_plant_types(&self) -> AppResult<Vec<PlantType>>;

    /// Full catalog in one consistent read, ordered by plant id
    async fn plant_catalog(&self) -> AppResult<Vec<PlantProfile>>;

    /// Fails with `NotFound` for an unknown plant type or climate and `Conflict`
    /// when the name already exists within the plant type.
    async fn create_plant(&self, input: NewPlant) -> AppResult<PlantProfile>;

    /// Fails with `NotFound` when absent and `Conflict` when a submission references it.
    async fn delete_plant(&self, plant_id: Uuid) -> AppResult<()>;
}
