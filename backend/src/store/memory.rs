//! In-process survey store
//!
//! Keeps the whole ledger behind one async mutex, so every operation is
//! atomic with respect to every other. Used for `storage = "memory"` and
//! in tests.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use shared::{
    evaluate_claim, sort_recent_first, ClaimOutcome, ClimateProfile, LandParcel,
    ObservedConditions, PlantProfile, PlantType, SoilCondition, SoilSample, SubmissionPlan,
    SubmissionPlanner, SurveySubmission,
};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    NewParcel, NewPlant, NewSoilCondition, ParcelWithCount, SubmissionDraft, SurveyRecord,
    SurveyStore,
};
use crate::error::{AppError, AppResult};

/// Weather types available in a freshly seeded store
pub const DEFAULT_CLIMATES: &[&str] = &["Tropical wet", "Tropical dry", "Highland", "Temperate"];

/// Plant types available in a freshly seeded store
pub const DEFAULT_PLANT_TYPES: &[&str] = &["Vegetable", "Grain", "Fruit", "Plantation"];

#[derive(Debug, Default)]
struct Ledger {
    parcels: Vec<LandParcel>,
    submissions: Vec<SurveySubmission>,
    soil_conditions: Vec<SoilCondition>,
    climates: Vec<ClimateProfile>,
    plant_types: Vec<PlantType>,
    plants: Vec<PlantProfile>,
    last_submitted_at: Option<DateTime<Utc>>,
}

impl Ledger {
    fn parcel(&self, parcel_id: Uuid) -> AppResult<&LandParcel> {
        self.parcels
            .iter()
            .find(|p| p.id == parcel_id)
            .ok_or_else(|| AppError::not_found("Parcel"))
    }

    fn survey_count(&self, parcel_id: Uuid) -> u32 {
        self.submissions
            .iter()
            .filter(|s| s.parcel_id == parcel_id)
            .count() as u32
    }

    fn with_count(&self, parcel: &LandParcel) -> ParcelWithCount {
        ParcelWithCount {
            parcel: parcel.clone(),
            survey_count: self.survey_count(parcel.id),
        }
    }

    fn soil_condition(&self, id: Uuid) -> Option<&SoilCondition> {
        self.soil_conditions.iter().find(|s| s.id == id)
    }

    /// Submission timestamps strictly increase so recency order is total
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_submitted_at {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_submitted_at = Some(stamp);
        stamp
    }

    /// Submissions of a parcel, newest first
    fn recent_submissions(&self, parcel_id: Uuid) -> Vec<&SurveySubmission> {
        let mut submissions: Vec<&SurveySubmission> = self
            .submissions
            .iter()
            .filter(|s| s.parcel_id == parcel_id)
            .collect();
        submissions.sort_by(|a, b| {
            b.submitted_at
                .cmp(&a.submitted_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        submissions
    }
}

/// Survey store held entirely in memory
#[derive(Clone, Default)]
pub struct MemorySurveyStore {
    ledger: Arc<Mutex<Ledger>>,
}

impl MemorySurveyStore {
    /// Empty store without reference data
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with the default climates and plant types
    pub async fn seeded() -> Self {
        let store = Self::new();
        for weather_type in DEFAULT_CLIMATES {
            store.add_climate(weather_type).await;
        }
        for name in DEFAULT_PLANT_TYPES {
            store.add_plant_type(name).await;
        }
        store
    }

    pub async fn add_climate(&self, weather_type: &str) -> ClimateProfile {
        let climate = ClimateProfile {
            id: Uuid::new_v4(),
            weather_type: weather_type.to_string(),
        };
        self.ledger.lock().await.climates.push(climate.clone());
        climate
    }

    pub async fn add_plant_type(&self, name: &str) -> PlantType {
        let plant_type = PlantType {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        self.ledger.lock().await.plant_types.push(plant_type.clone());
        plant_type
    }
}

#[async_trait]
impl SurveyStore for MemorySurveyStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn create_parcel(&self, input: NewParcel) -> AppResult<LandParcel> {
        let parcel = LandParcel {
            id: Uuid::new_v4(),
            owner_id: input.owner_id,
            assigned_surveyor_id: None,
            elevation: input.elevation,
            address_id: input.address_id,
            created_at: Utc::now(),
        };
        self.ledger.lock().await.parcels.push(parcel.clone());
        Ok(parcel)
    }

    async fn get_parcel(&self, parcel_id: Uuid) -> AppResult<Option<ParcelWithCount>> {
        let ledger = self.ledger.lock().await;
        Ok(ledger
            .parcels
            .iter()
            .find(|p| p.id == parcel_id)
            .map(|p| ledger.with_count(p)))
    }

    async fn list_parcels(&self, owner_id: Option<Uuid>) -> AppResult<Vec<ParcelWithCount>> {
        let ledger = self.ledger.lock().await;
        Ok(ledger
            .parcels
            .iter()
            .filter(|p| owner_id.map_or(true, |owner| p.owner_id == owner))
            .map(|p| ledger.with_count(p))
            .collect())
    }

    async fn delete_parcel(&self, parcel_id: Uuid) -> AppResult<bool> {
        let mut ledger = self.ledger.lock().await;
        let before = ledger.parcels.len();
        ledger.parcels.retain(|p| p.id != parcel_id);
        if ledger.parcels.len() == before {
            return Ok(false);
        }
        ledger.submissions.retain(|s| s.parcel_id != parcel_id);
        Ok(true)
    }

    async fn claim_parcel(&self, parcel_id: Uuid, surveyor_id: Uuid) -> AppResult<ClaimOutcome> {
        let mut ledger = self.ledger.lock().await;
        let parcel = ledger
            .parcels
            .iter_mut()
            .find(|p| p.id == parcel_id)
            .ok_or_else(|| AppError::not_found("Parcel"))?;

        let outcome = evaluate_claim(parcel.assigned_surveyor_id, surveyor_id);
        if outcome == ClaimOutcome::Granted {
            parcel.assigned_surveyor_id = Some(surveyor_id);
        }
        Ok(outcome)
    }

    async fn append_submission(
        &self,
        draft: SubmissionDraft,
        planner: &SubmissionPlanner,
    ) -> AppResult<(SurveySubmission, SubmissionPlan)> {
        let mut ledger = self.ledger.lock().await;

        if !ledger.parcel(draft.parcel_id)?.is_claimed_by(draft.surveyor_id) {
            return Err(AppError::NotClaimedBySurveyor);
        }
        if !ledger.climates.iter().any(|c| c.id == draft.climate_id) {
            return Err(AppError::not_found("Climate"));
        }
        let soil = ledger
            .soil_condition(draft.soil_condition_id)
            .ok_or_else(|| AppError::not_found("Soil condition"))?;
        if ledger
            .submissions
            .iter()
            .any(|s| s.soil_condition_id == draft.soil_condition_id)
        {
            return Err(AppError::conflict(
                "soil condition",
                "Soil condition already backs another submission",
            ));
        }

        let observed = ObservedConditions {
            elevation: draft.elevation,
            ph: soil.ph,
            nutrient: soil.nutrient,
            humidity: soil.humidity,
            climate_id: draft.climate_id,
        };
        let existing = ledger.survey_count(draft.parcel_id);
        let plan = planner.plan(existing, &observed)?;

        let submission = SurveySubmission {
            id: Uuid::new_v4(),
            parcel_id: draft.parcel_id,
            surveyor_id: draft.surveyor_id,
            climate_id: draft.climate_id,
            soil_condition_id: draft.soil_condition_id,
            recommended_plant_id: plan.recommended_plant_id(),
            status: plan.status,
            sequence: plan.sequence,
            elevation: draft.elevation,
            submitted_at: ledger.next_timestamp(),
        };
        ledger.submissions.push(submission.clone());

        if let Some(parcel) = ledger.parcels.iter_mut().find(|p| p.id == draft.parcel_id) {
            parcel.elevation = Some(draft.elevation);
        }

        Ok((submission, plan))
    }

    async fn recent_soil_samples(&self, parcel_id: Uuid, limit: u32) -> AppResult<Vec<SoilSample>> {
        let ledger = self.ledger.lock().await;
        ledger.parcel(parcel_id)?;

        let mut samples: Vec<SoilSample> = ledger
            .recent_submissions(parcel_id)
            .into_iter()
            .filter_map(|s| {
                ledger.soil_condition(s.soil_condition_id).map(|soil| SoilSample {
                    submission_id: s.id,
                    submitted_at: s.submitted_at,
                    ph: soil.ph,
                    nutrient: soil.nutrient,
                    humidity: soil.humidity,
                })
            })
            .collect();
        sort_recent_first(&mut samples);
        samples.truncate(limit as usize);
        Ok(samples)
    }

    async fn survey_history(&self, parcel_id: Uuid, limit: u32) -> AppResult<Vec<SurveyRecord>> {
        let ledger = self.ledger.lock().await;
        ledger.parcel(parcel_id)?;

        let records = ledger
            .recent_submissions(parcel_id)
            .into_iter()
            .take(limit as usize)
            .filter_map(|s| {
                let soil = ledger.soil_condition(s.soil_condition_id)?;
                let climate = ledger.climates.iter().find(|c| c.id == s.climate_id)?;
                let plant = s
                    .recommended_plant_id
                    .and_then(|id| ledger.plants.iter().find(|p| p.id == id));
                Some(SurveyRecord {
                    submission_id: s.id,
                    parcel_id: s.parcel_id,
                    surveyor_id: s.surveyor_id,
                    sequence: s.sequence,
                    status: s.status,
                    submitted_at: s.submitted_at,
                    elevation: s.elevation,
                    weather_type: climate.weather_type.clone(),
                    soil_texture: soil.texture.clone(),
                    ph: soil.ph,
                    nutrient: soil.nutrient,
                    humidity: soil.humidity,
                    recommended_plant_id: s.recommended_plant_id,
                    recommended_plant_name: plant.map(|p| p.name.clone()),
                })
            })
            .collect();
        Ok(records)
    }

    async fn record_soil_condition(&self, input: NewSoilCondition) -> AppResult<SoilCondition> {
        let soil = SoilCondition {
            id: Uuid::new_v4(),
            texture: input.texture,
            ph: input.ph,
            nutrient: input.nutrient,
            humidity: input.humidity,
            created_at: Utc::now(),
        };
        self.ledger.lock().await.soil_conditions.push(soil.clone());
        Ok(soil)
    }

    async fn list_soil_conditions(&self) -> AppResult<Vec<SoilCondition>> {
        Ok(self.ledger.lock().await.soil_conditions.clone())
    }

    async fn list_climates(&self) -> AppResult<Vec<ClimateProfile>> {
        Ok(self.ledger.lock().await.climates.clone())
    }

    async fn list_plant_types(&self) -> AppResult<Vec<PlantType>> {
        Ok(self.ledger.lock().await.plant_types.clone())
    }

    async fn plant_catalog(&self) -> AppResult<Vec<PlantProfile>> {
        let mut catalog = self.ledger.lock().await.plants.clone();
        catalog.sort_by_key(|p| p.id);
        Ok(catalog)
    }

    async fn create_plant(&self, input: NewPlant) -> AppResult<PlantProfile> {
        let mut ledger = self.ledger.lock().await;

        if !ledger.plant_types.iter().any(|t| t.id == input.plant_type_id) {
            return Err(AppError::not_found("Plant type"));
        }
        if let Some(climate_id) = input.ideal_climate_id {
            if !ledger.climates.iter().any(|c| c.id == climate_id) {
                return Err(AppError::not_found("Climate"));
            }
        }
        let duplicate = ledger.plants.iter().any(|p| {
            p.plant_type_id == input.plant_type_id
                && p.name.to_lowercase() == input.name.to_lowercase()
        });
        if duplicate {
            return Err(AppError::conflict(
                "plant",
                "A plant with this name already exists for this type",
            ));
        }

        let plant = PlantProfile {
            id: Uuid::new_v4(),
            plant_type_id: input.plant_type_id,
            name: input.name,
            ideal_elevation: input.ideal_elevation,
            ideal_ph: input.ideal_ph,
            ideal_nutrient: input.ideal_nutrient,
            ideal_humidity: input.ideal_humidity,
            ideal_climate_id: input.ideal_climate_id,
            soil_texture: input.soil_texture,
        };
        ledger.plants.push(plant.clone());
        Ok(plant)
    }

    async fn delete_plant(&self, plant_id: Uuid) -> AppResult<()> {
        let mut ledger = self.ledger.lock().await;

        if !ledger.plants.iter().any(|p| p.id == plant_id) {
            return Err(AppError::not_found("Plant"));
        }
        if ledger
            .submissions
            .iter()
            .any(|s| s.recommended_plant_id == Some(plant_id))
        {
            return Err(AppError::conflict(
                "plant",
                "This plant is referenced by survey data and cannot be deleted",
            ));
        }

        ledger.plants.retain(|p| p.id != plant_id);
        Ok(())
    }
}
