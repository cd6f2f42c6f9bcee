//! Service layer tests over the in-memory store
//!
//! Exercise claim exclusivity, threshold gating, soil averages and catalog
//! administration end to end, including concurrent claims and submissions.

use std::str::FromStr;
use std::sync::Arc;

use land_survey::config::SurveyConfig;
use land_survey::services::survey::{SubmitSurveyInput, SurveyService};
use land_survey::services::{MatchingService, ParcelService, PlantService, SoilService};
use land_survey::store::{MemorySurveyStore, NewParcel, NewPlant, NewSoilCondition, SurveyStore};
use land_survey::AppError;
use rust_decimal::Decimal;
use shared::{
    LifecycleState, MatchingPolicy, ObservedConditions, RetriggerPolicy, SurveyStatus,
};
use uuid::Uuid;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

struct Fixture {
    store: Arc<dyn SurveyStore>,
    survey: SurveyService,
    climate_id: Uuid,
    plant_type_id: Uuid,
    owner_id: Uuid,
}

impl Fixture {
    async fn new() -> Self {
        Self::with_config(SurveyConfig::default()).await
    }

    async fn with_config(config: SurveyConfig) -> Self {
        let store: Arc<dyn SurveyStore> = Arc::new(MemorySurveyStore::seeded().await);
        let climate_id = store.list_climates().await.unwrap()[0].id;
        let plant_type_id = store.list_plant_types().await.unwrap()[0].id;
        let survey = SurveyService::new(store.clone(), &config, MatchingPolicy::default());

        Self {
            store,
            survey,
            climate_id,
            plant_type_id,
            owner_id: Uuid::new_v4(),
        }
    }

    async fn parcel(&self) -> Uuid {
        self.store
            .create_parcel(NewParcel {
                owner_id: self.owner_id,
                address_id: None,
                elevation: None,
            })
            .await
            .unwrap()
            .id
    }

    async fn soil(&self, ph: &str) -> Uuid {
        SoilService::new(self.store.clone())
            .record_soil_condition(NewSoilCondition {
                texture: "Loam".to_string(),
                ph: dec(ph),
                nutrient: dec("50"),
                humidity: dec("60"),
            })
            .await
            .unwrap()
            .id
    }

    async fn plant(&self, name: &str, elevation: &str) -> Uuid {
        PlantService::new(self.store.clone())
            .create_plant(NewPlant {
                plant_type_id: self.plant_type_id,
                name: name.to_string(),
                ideal_elevation: Some(dec(elevation)),
                ideal_ph: Some(dec("6.0")),
                ideal_nutrient: Some(dec("50")),
                ideal_humidity: Some(dec("60")),
                ideal_climate_id: Some(self.climate_id),
                soil_texture: Some("Loam".to_string()),
            })
            .await
            .unwrap()
            .id
    }

    async fn input(&self, ph: &str, chosen_plant_id: Option<Uuid>) -> SubmitSurveyInput {
        SubmitSurveyInput {
            climate_id: self.climate_id,
            soil_condition_id: self.soil(ph).await,
            elevation: dec("1500"),
            chosen_plant_id,
        }
    }
}

// ============================================================================
// Claims
// ============================================================================

#[tokio::test]
async fn claim_is_exclusive_and_idempotent() {
    let fx = Fixture::new().await;
    let parcel_id = fx.parcel().await;
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

    let first = fx.survey.claim_parcel(parcel_id, a).await.unwrap();
    assert!(first.newly_assigned);

    let again = fx.survey.claim_parcel(parcel_id, a).await.unwrap();
    assert!(!again.newly_assigned);

    let denied = fx.survey.claim_parcel(parcel_id, b).await;
    assert!(matches!(denied, Err(AppError::AlreadyClaimed)));
}

#[tokio::test]
async fn claim_of_unknown_parcel_is_not_found() {
    let fx = Fixture::new().await;
    let result = fx.survey.claim_parcel(Uuid::new_v4(), Uuid::new_v4()).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn concurrent_claims_grant_exactly_one() {
    let fx = Fixture::new().await;
    let parcel_id = fx.parcel().await;

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let survey = fx.survey.clone();
            tokio::spawn(async move { survey.claim_parcel(parcel_id, Uuid::new_v4()).await })
        })
        .collect();

    let mut granted = 0;
    let mut denied = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(receipt) if receipt.newly_assigned => granted += 1,
            Err(AppError::AlreadyClaimed) => denied += 1,
            other => panic!("unexpected claim result: {:?}", other.map(|r| r.surveyor_id)),
        }
    }

    assert_eq!(granted, 1);
    assert_eq!(denied, 15);
}

// ============================================================================
// Submissions
// ============================================================================

#[tokio::test]
async fn submission_requires_the_claim() {
    let fx = Fixture::new().await;
    let parcel_id = fx.parcel().await;
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

    let unclaimed = fx.survey.submit_survey(parcel_id, a, fx.input("6.0", None).await).await;
    assert!(matches!(unclaimed, Err(AppError::NotClaimedBySurveyor)));

    fx.survey.claim_parcel(parcel_id, a).await.unwrap();
    let other = fx.survey.submit_survey(parcel_id, b, fx.input("6.0", None).await).await;
    assert!(matches!(other, Err(AppError::NotClaimedBySurveyor)));
}

#[tokio::test]
async fn submission_with_unknown_references_is_not_found() {
    let fx = Fixture::new().await;
    let surveyor = Uuid::new_v4();

    let missing_parcel = fx
        .survey
        .submit_survey(Uuid::new_v4(), surveyor, fx.input("6.0", None).await)
        .await;
    assert!(matches!(missing_parcel, Err(AppError::NotFound(ref r)) if r == "Parcel"));

    let parcel_id = fx.parcel().await;
    fx.survey.claim_parcel(parcel_id, surveyor).await.unwrap();

    let mut input = fx.input("6.0", None).await;
    input.climate_id = Uuid::new_v4();
    let missing_climate = fx.survey.submit_survey(parcel_id, surveyor, input).await;
    assert!(matches!(missing_climate, Err(AppError::NotFound(ref r)) if r == "Climate"));

    let mut input = fx.input("6.0", None).await;
    input.soil_condition_id = Uuid::new_v4();
    let missing_soil = fx.survey.submit_survey(parcel_id, surveyor, input).await;
    assert!(matches!(missing_soil, Err(AppError::NotFound(ref r)) if r == "Soil condition"));
}

#[tokio::test]
async fn out_of_range_elevation_is_rejected() {
    let fx = Fixture::new().await;
    let parcel_id = fx.parcel().await;
    let surveyor = Uuid::new_v4();
    fx.survey.claim_parcel(parcel_id, surveyor).await.unwrap();

    let mut input = fx.input("6.0", None).await;
    input.elevation = dec("3500");
    let result = fx.survey.submit_survey(parcel_id, surveyor, input).await;

    assert!(matches!(result, Err(AppError::Validation { ref field, .. }) if field == "elevation"));
}

#[tokio::test]
async fn third_submission_computes_recommendation() {
    let fx = Fixture::new().await;
    let best = fx.plant("Arabica", "1500").await;
    fx.plant("Robusta", "800").await;
    let parcel_id = fx.parcel().await;
    let surveyor = Uuid::new_v4();
    fx.survey.claim_parcel(parcel_id, surveyor).await.unwrap();

    for expected in 1..=2 {
        let receipt = fx
            .survey
            .submit_survey(parcel_id, surveyor, fx.input("6.0", None).await)
            .await
            .unwrap();
        assert_eq!(receipt.sequence, expected);
        assert_eq!(receipt.status, SurveyStatus::Waiting);
        assert!(receipt.recommendation.is_none());
        assert_eq!(receipt.recommended_plant_id, None);
    }

    let third = fx
        .survey
        .submit_survey(parcel_id, surveyor, fx.input("6.0", None).await)
        .await
        .unwrap();
    assert_eq!(third.sequence, 3);
    assert_eq!(third.status, SurveyStatus::Completed);
    assert_eq!(third.recommended_plant_id, Some(best));

    let matches = third.recommendation.unwrap();
    assert_eq!(matches.recommended[0].plant.id, best);
    assert_eq!(matches.recommended[0].score, 9);

    let parcel = ParcelService::new(fx.store.clone(), 3)
        .get_parcel(parcel_id)
        .await
        .unwrap();
    assert_eq!(parcel.survey_count, 3);
    assert_eq!(parcel.lifecycle_state, LifecycleState::Recommending);
    assert_eq!(parcel.parcel.elevation, Some(dec("1500")));
}

#[tokio::test]
async fn threshold_only_leaves_later_submissions_waiting() {
    let fx = Fixture::with_config(SurveyConfig {
        retrigger: RetriggerPolicy::ThresholdOnly,
        ..SurveyConfig::default()
    })
    .await;
    let parcel_id = fx.parcel().await;
    let surveyor = Uuid::new_v4();
    fx.survey.claim_parcel(parcel_id, surveyor).await.unwrap();

    let mut statuses = Vec::new();
    for _ in 0..4 {
        let receipt = fx
            .survey
            .submit_survey(parcel_id, surveyor, fx.input("6.0", None).await)
            .await
            .unwrap();
        statuses.push(receipt.status);
    }

    assert_eq!(
        statuses,
        vec![
            SurveyStatus::Waiting,
            SurveyStatus::Waiting,
            SurveyStatus::Completed,
            SurveyStatus::Waiting,
        ]
    );
}

#[tokio::test]
async fn concurrent_submissions_get_distinct_sequences() {
    let fx = Fixture::with_config(SurveyConfig {
        retrigger: RetriggerPolicy::ThresholdOnly,
        ..SurveyConfig::default()
    })
    .await;
    let parcel_id = fx.parcel().await;
    let surveyor = Uuid::new_v4();
    fx.survey.claim_parcel(parcel_id, surveyor).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..6 {
        let survey = fx.survey.clone();
        let input = fx.input("6.0", None).await;
        handles.push(tokio::spawn(async move {
            survey.submit_survey(parcel_id, surveyor, input).await
        }));
    }

    let mut receipts = Vec::new();
    for handle in handles {
        receipts.push(handle.await.unwrap().unwrap());
    }
    receipts.sort_by_key(|r| r.sequence);

    let sequences: Vec<u32> = receipts.iter().map(|r| r.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3, 4, 5, 6]);
    let completed = receipts
        .iter()
        .filter(|r| r.status == SurveyStatus::Completed)
        .count();
    assert_eq!(completed, 1);
}

#[tokio::test]
async fn chosen_plant_rules() {
    let fx = Fixture::new().await;
    fx.plant("Arabica", "1500").await;
    let lowland = fx.plant("Robusta", "100").await;
    let parcel_id = fx.parcel().await;
    let surveyor = Uuid::new_v4();
    fx.survey.claim_parcel(parcel_id, surveyor).await.unwrap();

    let early = fx
        .survey
        .submit_survey(parcel_id, surveyor, fx.input("6.0", Some(lowland)).await)
        .await;
    assert!(matches!(early, Err(AppError::Validation { ref field, .. }) if field == "chosen_plant_id"));

    for _ in 0..2 {
        fx.survey
            .submit_survey(parcel_id, surveyor, fx.input("6.0", None).await)
            .await
            .unwrap();
    }

    let unknown = fx
        .survey
        .submit_survey(parcel_id, surveyor, fx.input("6.0", Some(Uuid::new_v4())).await)
        .await;
    assert!(matches!(unknown, Err(AppError::NotFound(ref r)) if r == "Plant"));

    let chosen = fx
        .survey
        .submit_survey(parcel_id, surveyor, fx.input("6.0", Some(lowland)).await)
        .await
        .unwrap();
    assert_eq!(chosen.sequence, 3);
    assert_eq!(chosen.recommended_plant_id, Some(lowland));
}

// ============================================================================
// Soil averages and history
// ============================================================================

#[tokio::test]
async fn soil_average_uses_latest_three() {
    let fx = Fixture::new().await;
    let parcel_id = fx.parcel().await;
    let surveyor = Uuid::new_v4();
    fx.survey.claim_parcel(parcel_id, surveyor).await.unwrap();

    // Oldest first, so the latest three are 5.0, 6.0 and 7.0
    for ph in ["12.0", "7.0", "6.0", "5.0"] {
        fx.survey
            .submit_survey(parcel_id, surveyor, fx.input(ph, None).await)
            .await
            .unwrap();
    }

    let average = fx.survey.recent_soil_average(parcel_id, None).await.unwrap();
    assert_eq!(average.ph_avg, dec("6.0"));
    assert_eq!(average.sample_count, 3);

    let latest = fx.survey.recent_soil_average(parcel_id, Some(1)).await.unwrap();
    assert_eq!(latest.ph_avg, dec("5.0"));
}

#[tokio::test]
async fn soil_reading_backs_only_one_submission() {
    let fx = Fixture::new().await;
    let parcel_id = fx.parcel().await;
    let surveyor = Uuid::new_v4();
    fx.survey.claim_parcel(parcel_id, surveyor).await.unwrap();

    let alkaline = fx.soil("8.0").await;
    let acidic = fx.soil("5.0").await;
    let submit = |soil_condition_id| SubmitSurveyInput {
        climate_id: fx.climate_id,
        soil_condition_id,
        elevation: dec("1500"),
        chosen_plant_id: None,
    };

    fx.survey
        .submit_survey(parcel_id, surveyor, submit(alkaline))
        .await
        .unwrap();
    fx.survey
        .submit_survey(parcel_id, surveyor, submit(acidic))
        .await
        .unwrap();

    let reused = fx
        .survey
        .submit_survey(parcel_id, surveyor, submit(acidic))
        .await;
    assert!(matches!(
        reused,
        Err(AppError::Conflict { ref resource, .. }) if resource == "soil condition"
    ));

    let history = fx.survey.survey_history(parcel_id, None).await.unwrap();
    assert_eq!(history.len(), 2);
    let average = fx.survey.recent_soil_average(parcel_id, None).await.unwrap();
    assert_eq!(average.ph_avg, dec("6.5"));
    assert_eq!(average.sample_count, 2);

    let fresh = fx
        .survey
        .submit_survey(parcel_id, surveyor, fx.input("6.0", None).await)
        .await
        .unwrap();
    assert_eq!(fresh.sequence, 3);
}

#[tokio::test]
async fn fine_grained_readings_keep_their_precision() {
    let fx = Fixture::new().await;
    let parcel_id = fx.parcel().await;
    let surveyor = Uuid::new_v4();
    fx.survey.claim_parcel(parcel_id, surveyor).await.unwrap();

    let mut input = fx.input("6.125", None).await;
    input.elevation = dec("1500.25");
    fx.survey
        .submit_survey(parcel_id, surveyor, input)
        .await
        .unwrap();

    let average = fx.survey.recent_soil_average(parcel_id, None).await.unwrap();
    assert_eq!(average.ph_avg, dec("6.125"));

    let history = fx.survey.survey_history(parcel_id, None).await.unwrap();
    assert_eq!(history[0].elevation, dec("1500.25"));
}

#[tokio::test]
async fn soil_average_without_surveys_is_not_found() {
    let fx = Fixture::new().await;
    let parcel_id = fx.parcel().await;

    let empty = fx.survey.recent_soil_average(parcel_id, None).await;
    assert!(matches!(empty, Err(AppError::NotFound(ref r)) if r == "Survey data"));

    let missing = fx.survey.recent_soil_average(Uuid::new_v4(), None).await;
    assert!(matches!(missing, Err(AppError::NotFound(ref r)) if r == "Parcel"));
}

#[tokio::test]
async fn history_is_newest_first() {
    let fx = Fixture::new().await;
    let plant_id = fx.plant("Arabica", "1500").await;
    let parcel_id = fx.parcel().await;
    let surveyor = Uuid::new_v4();
    fx.survey.claim_parcel(parcel_id, surveyor).await.unwrap();

    for _ in 0..4 {
        fx.survey
            .submit_survey(parcel_id, surveyor, fx.input("6.0", None).await)
            .await
            .unwrap();
    }

    let history = fx.survey.survey_history(parcel_id, None).await.unwrap();
    let sequences: Vec<u32> = history.iter().map(|r| r.sequence).collect();
    assert_eq!(sequences, vec![4, 3, 2]);
    assert_eq!(history[0].recommended_plant_id, Some(plant_id));
    assert_eq!(history[0].recommended_plant_name.as_deref(), Some("Arabica"));
    assert_eq!(history[2].recommended_plant_name, None);
    assert_eq!(history[0].weather_type, "Tropical wet");
}

// ============================================================================
// Catalog, parcels and soil readings
// ============================================================================

#[tokio::test]
async fn plant_catalog_administration() {
    let fx = Fixture::new().await;
    let plants = PlantService::new(fx.store.clone());
    fx.plant("Robusta", "800").await;
    let arabica = fx.plant("Arabica", "1500").await;

    let duplicate = plants
        .create_plant(NewPlant {
            plant_type_id: fx.plant_type_id,
            name: "  arabica ".to_string(),
            ideal_elevation: None,
            ideal_ph: None,
            ideal_nutrient: None,
            ideal_humidity: None,
            ideal_climate_id: None,
            soil_texture: None,
        })
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict { .. })));

    let bad_ph = plants
        .create_plant(NewPlant {
            plant_type_id: fx.plant_type_id,
            name: "Durian".to_string(),
            ideal_elevation: None,
            ideal_ph: Some(dec("15")),
            ideal_nutrient: None,
            ideal_humidity: None,
            ideal_climate_id: None,
            soil_texture: None,
        })
        .await;
    assert!(matches!(bad_ph, Err(AppError::Validation { ref field, .. }) if field == "ideal_ph"));

    let names: Vec<String> = plants
        .list_plants(None)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["Arabica", "Robusta"]);
    assert!(plants.list_plants(Some(Uuid::new_v4())).await.unwrap().is_empty());

    plants.delete_plant(arabica).await.unwrap();
    assert!(matches!(
        plants.delete_plant(arabica).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn recommended_plant_cannot_be_deleted() {
    let fx = Fixture::new().await;
    let plant_id = fx.plant("Arabica", "1500").await;
    let parcel_id = fx.parcel().await;
    let surveyor = Uuid::new_v4();
    fx.survey.claim_parcel(parcel_id, surveyor).await.unwrap();
    for _ in 0..3 {
        fx.survey
            .submit_survey(parcel_id, surveyor, fx.input("6.0", None).await)
            .await
            .unwrap();
    }

    let result = PlantService::new(fx.store.clone()).delete_plant(plant_id).await;
    assert!(matches!(result, Err(AppError::Conflict { .. })));
}

#[tokio::test]
async fn parcel_administration() {
    let fx = Fixture::new().await;
    let parcels = ParcelService::new(fx.store.clone(), 3);

    let invalid = parcels
        .create_parcel(NewParcel {
            owner_id: fx.owner_id,
            address_id: None,
            elevation: Some(dec("-5")),
        })
        .await;
    assert!(matches!(invalid, Err(AppError::Validation { .. })));

    let parcel = parcels
        .create_parcel(NewParcel {
            owner_id: fx.owner_id,
            address_id: Some(Uuid::new_v4()),
            elevation: Some(dec("900")),
        })
        .await
        .unwrap();
    assert_eq!(parcel.assigned_surveyor_id, None);
    fx.parcel().await;

    let summary = parcels.get_parcel(parcel.id).await.unwrap();
    assert_eq!(summary.lifecycle_state, LifecycleState::New);

    let surveyor = Uuid::new_v4();
    fx.survey.claim_parcel(parcel.id, surveyor).await.unwrap();
    fx.survey
        .submit_survey(parcel.id, surveyor, fx.input("6.0", None).await)
        .await
        .unwrap();
    let summary = parcels.get_parcel(parcel.id).await.unwrap();
    assert_eq!(summary.lifecycle_state, LifecycleState::Collecting);

    assert_eq!(parcels.list_parcels(Some(fx.owner_id)).await.unwrap().len(), 2);
    assert!(parcels.list_parcels(Some(Uuid::new_v4())).await.unwrap().is_empty());

    parcels.delete_parcel(parcel.id).await.unwrap();
    assert!(matches!(parcels.get_parcel(parcel.id).await, Err(AppError::NotFound(_))));
    assert!(matches!(parcels.delete_parcel(parcel.id).await, Err(AppError::NotFound(_))));
    assert!(fx.store.survey_history(parcel.id, 3).await.is_err());
}

#[tokio::test]
async fn soil_readings_are_validated() {
    let fx = Fixture::new().await;
    let soil = SoilService::new(fx.store.clone());

    let blank = soil
        .record_soil_condition(NewSoilCondition {
            texture: "   ".to_string(),
            ph: dec("6.0"),
            nutrient: dec("50"),
            humidity: dec("60"),
        })
        .await;
    assert!(matches!(blank, Err(AppError::Validation { ref field, .. }) if field == "texture"));

    let humid = soil
        .record_soil_condition(NewSoilCondition {
            texture: "Clay".to_string(),
            ph: dec("6.0"),
            nutrient: dec("50"),
            humidity: dec("101"),
        })
        .await;
    assert!(matches!(humid, Err(AppError::Validation { ref field, .. }) if field == "humidity"));

    assert!(soil.list_soil_conditions().await.unwrap().is_empty());
    assert_eq!(soil.list_climates().await.unwrap().len(), 4);
}

#[tokio::test]
async fn adhoc_matching_validates_and_scores() {
    let fx = Fixture::new().await;
    let plant_id = fx.plant("Arabica", "1500").await;
    let matching = MatchingService::new(fx.store.clone(), MatchingPolicy::default());

    let observed = ObservedConditions {
        elevation: dec("1500"),
        ph: dec("6.0"),
        nutrient: dec("50"),
        humidity: dec("60"),
        climate_id: fx.climate_id,
    };
    let result = matching.match_plants(observed).await.unwrap();
    assert_eq!(result.best().map(|s| s.plant.id), Some(plant_id));

    let invalid = matching
        .match_plants(ObservedConditions {
            ph: dec("14.5"),
            ..observed
        })
        .await;
    assert!(matches!(invalid, Err(AppError::Validation { ref field, .. }) if field == "ph"));
}
