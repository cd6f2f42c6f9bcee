//! PostgreSQL survey store
//!
//! Claims use a single conditional UPDATE. Submissions are appended inside a
//! transaction that holds a row lock on the parcel, and `UNIQUE (parcel_id,
//! sequence)` rejects any append that slipped past the lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{
    ClaimOutcome, ClimateProfile, LandParcel, ObservedConditions, PlantProfile, PlantType,
    SoilCondition, SoilSample, SubmissionPlan, SubmissionPlanner, SurveyStatus, SurveySubmission,
};
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    NewParcel, NewPlant, NewSoilCondition, ParcelWithCount, SubmissionDraft, SurveyRecord,
    SurveyStore,
};
use crate::error::{AppError, AppResult};

const PARCEL_COLUMNS: &str =
    "id, owner_id, assigned_surveyor_id, elevation, address_id, created_at";

const PLANT_COLUMNS: &str = "id, plant_type_id, name, ideal_elevation, ideal_ph, ideal_nutrient, \
     ideal_humidity, ideal_climate_id, soil_texture";

/// Survey store backed by PostgreSQL
#[derive(Clone)]
pub struct PgSurveyStore {
    db: PgPool,
}

impl PgSurveyStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Database row for a parcel
#[derive(Debug, sqlx::FromRow)]
struct ParcelRow {
    id: Uuid,
    owner_id: Uuid,
    assigned_surveyor_id: Option<Uuid>,
    elevation: Option<Decimal>,
    address_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<ParcelRow> for LandParcel {
    fn from(row: ParcelRow) -> Self {
        LandParcel {
            id: row.id,
            owner_id: row.owner_id,
            assigned_surveyor_id: row.assigned_surveyor_id,
            elevation: row.elevation,
            address_id: row.address_id,
            created_at: row.created_at,
        }
    }
}

/// Database row for a parcel with its survey count
#[derive(Debug, sqlx::FromRow)]
struct ParcelCountRow {
    #[sqlx(flatten)]
    parcel: ParcelRow,
    survey_count: i64,
}

impl From<ParcelCountRow> for ParcelWithCount {
    fn from(row: ParcelCountRow) -> Self {
        ParcelWithCount {
            parcel: row.parcel.into(),
            survey_count: row.survey_count as u32,
        }
    }
}

/// Database row for a submission
#[derive(Debug, sqlx::FromRow)]
struct SubmissionRow {
    id: Uuid,
    parcel_id: Uuid,
    surveyor_id: Uuid,
    climate_id: Uuid,
    soil_condition_id: Uuid,
    recommended_plant_id: Option<Uuid>,
    status: String,
    sequence: i32,
    elevation: Decimal,
    submitted_at: DateTime<Utc>,
}

impl TryFrom<SubmissionRow> for SurveySubmission {
    type Error = AppError;

    fn try_from(row: SubmissionRow) -> Result<Self, Self::Error> {
        Ok(SurveySubmission {
            id: row.id,
            parcel_id: row.parcel_id,
            surveyor_id: row.surveyor_id,
            climate_id: row.climate_id,
            soil_condition_id: row.soil_condition_id,
            recommended_plant_id: row.recommended_plant_id,
            status: parse_status(&row.status)?,
            sequence: row.sequence as u32,
            elevation: row.elevation,
            submitted_at: row.submitted_at,
        })
    }
}

/// Database row for a soil condition
#[derive(Debug, sqlx::FromRow)]
struct SoilRow {
    id: Uuid,
    texture: String,
    ph: Decimal,
    nutrient: Decimal,
    humidity: Decimal,
    created_at: DateTime<Utc>,
}

impl From<SoilRow> for SoilCondition {
    fn from(row: SoilRow) -> Self {
        SoilCondition {
            id: row.id,
            texture: row.texture,
            ph: row.ph,
            nutrient: row.nutrient,
            humidity: row.humidity,
            created_at: row.created_at,
        }
    }
}

/// Database row for a plant profile
#[derive(Debug, sqlx::FromRow)]
struct PlantRow {
    id: Uuid,
    plant_type_id: Uuid,
    name: String,
    ideal_elevation: Option<Decimal>,
    ideal_ph: Option<Decimal>,
    ideal_nutrient: Option<Decimal>,
    ideal_humidity: Option<Decimal>,
    ideal_climate_id: Option<Uuid>,
    soil_texture: Option<String>,
}

impl From<PlantRow> for PlantProfile {
    fn from(row: PlantRow) -> Self {
        PlantProfile {
            id: row.id,
            plant_type_id: row.plant_type_id,
            name: row.name,
            ideal_elevation: row.ideal_elevation,
            ideal_ph: row.ideal_ph,
            ideal_nutrient: row.ideal_nutrient,
            ideal_humidity: row.ideal_humidity,
            ideal_climate_id: row.ideal_climate_id,
            soil_texture: row.soil_texture,
        }
    }
}

/// Database row for the survey history view
#[derive(Debug, sqlx::FromRow)]
struct HistoryRow {
    submission_id: Uuid,
    parcel_id: Uuid,
    surveyor_id: Uuid,
    sequence: i32,
    status: String,
    submitted_at: DateTime<Utc>,
    elevation: Decimal,
    weather_type: String,
    soil_texture: String,
    ph: Decimal,
    nutrient: Decimal,
    humidity: Decimal,
    recommended_plant_id: Option<Uuid>,
    recommended_plant_name: Option<String>,
}

impl TryFrom<HistoryRow> for SurveyRecord {
    type Error = AppError;

    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        Ok(SurveyRecord {
            submission_id: row.submission_id,
            parcel_id: row.parcel_id,
            surveyor_id: row.surveyor_id,
            sequence: row.sequence as u32,
            status: parse_status(&row.status)?,
            submitted_at: row.submitted_at,
            elevation: row.elevation,
            weather_type: row.weather_type,
            soil_texture: row.soil_texture,
            ph: row.ph,
            nutrient: row.nutrient,
            humidity: row.humidity,
            recommended_plant_id: row.recommended_plant_id,
            recommended_plant_name: row.recommended_plant_name,
        })
    }
}

fn parse_status(value: &str) -> AppResult<SurveyStatus> {
    SurveyStatus::parse(value)
        .ok_or_else(|| AppError::Internal(format!("Unknown survey status '{}'", value)))
}

impl PgSurveyStore {
    async fn ensure_parcel_exists(&self, parcel_id: Uuid) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM land_parcels WHERE id = $1")
            .bind(parcel_id)
            .fetch_one(&self.db)
            .await?;

        if exists == 0 {
            return Err(AppError::not_found("Parcel"));
        }
        Ok(())
    }
}

#[async_trait]
impl SurveyStore for PgSurveyStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }

    async fn create_parcel(&self, input: NewParcel) -> AppResult<LandParcel> {
        let row = sqlx::query_as::<_, ParcelRow>(&format!(
            r#"
            INSERT INTO land_parcels (owner_id, address_id, elevation)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            PARCEL_COLUMNS
        ))
        .bind(input.owner_id)
        .bind(input.address_id)
        .bind(input.elevation)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    async fn get_parcel(&self, parcel_id: Uuid) -> AppResult<Option<ParcelWithCount>> {
        let row = sqlx::query_as::<_, ParcelCountRow>(
            r#"
            SELECT l.id, l.owner_id, l.assigned_surveyor_id, l.elevation, l.address_id,
                   l.created_at,
                   (SELECT COUNT(*) FROM survey_submissions s WHERE s.parcel_id = l.id) AS survey_count
            FROM land_parcels l
            WHERE l.id = $1
            "#,
        )
        .bind(parcel_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_parcels(&self, owner_id: Option<Uuid>) -> AppResult<Vec<ParcelWithCount>> {
        let rows = sqlx::query_as::<_, ParcelCountRow>(
            r#"
            SELECT l.id, l.owner_id, l.assigned_surveyor_id, l.elevation, l.address_id,
                   l.created_at,
                   (SELECT COUNT(*) FROM survey_submissions s WHERE s.parcel_id = l.id) AS survey_count
            FROM land_parcels l
            WHERE $1::uuid IS NULL OR l.owner_id = $1
            ORDER BY l.created_at ASC, l.id ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_parcel(&self, parcel_id: Uuid) -> AppResult<bool> {
        // Submissions go with the parcel through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM land_parcels WHERE id = $1")
            .bind(parcel_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn claim_parcel(&self, parcel_id: Uuid, surveyor_id: Uuid) -> AppResult<ClaimOutcome> {
        let granted = sqlx::query(
            r#"
            UPDATE land_parcels
            SET assigned_surveyor_id = $2
            WHERE id = $1 AND assigned_surveyor_id IS NULL
            "#,
        )
        .bind(parcel_id)
        .bind(surveyor_id)
        .execute(&self.db)
        .await?;

        if granted.rows_affected() == 1 {
            return Ok(ClaimOutcome::Granted);
        }

        // Assignments are never released, so the holder read here is final
        let holder = sqlx::query_scalar::<_, Option<Uuid>>(
            "SELECT assigned_surveyor_id FROM land_parcels WHERE id = $1",
        )
        .bind(parcel_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::not_found("Parcel"))?;

        match holder {
            Some(holder) if holder == surveyor_id => Ok(ClaimOutcome::AlreadyHeld),
            Some(holder) => Ok(ClaimOutcome::HeldByOther {
                surveyor_id: holder,
            }),
            None => Err(AppError::conflict(
                "parcel",
                "Claim state changed during the request, retry",
            )),
        }
    }

    async fn append_submission(
        &self,
        draft: SubmissionDraft,
        planner: &SubmissionPlanner,
    ) -> AppResult<(SurveySubmission, SubmissionPlan)> {
        let mut tx = self.db.begin().await?;

        let parcel = sqlx::query_as::<_, ParcelRow>(&format!(
            "SELECT {} FROM land_parcels WHERE id = $1 FOR UPDATE",
            PARCEL_COLUMNS
        ))
        .bind(draft.parcel_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Parcel"))?;

        if parcel.assigned_surveyor_id != Some(draft.surveyor_id) {
            return Err(AppError::NotClaimedBySurveyor);
        }

        let climate_exists =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM climates WHERE id = $1")
                .bind(draft.climate_id)
                .fetch_one(&mut *tx)
                .await?;
        if climate_exists == 0 {
            return Err(AppError::not_found("Climate"));
        }

        let soil = sqlx::query_as::<_, SoilRow>(
            "SELECT id, texture, ph, nutrient, humidity, created_at FROM soil_conditions WHERE id = $1",
        )
        .bind(draft.soil_condition_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Soil condition"))?;

        let soil_in_use = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM survey_submissions WHERE soil_condition_id = $1",
        )
        .bind(draft.soil_condition_id)
        .fetch_one(&mut *tx)
        .await?;
        if soil_in_use > 0 {
            return Err(AppError::conflict(
                "soil condition",
                "Soil condition already backs another submission",
            ));
        }

        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM survey_submissions WHERE parcel_id = $1",
        )
        .bind(draft.parcel_id)
        .fetch_one(&mut *tx)
        .await?;

        let observed = ObservedConditions {
            elevation: draft.elevation,
            ph: soil.ph,
            nutrient: soil.nutrient,
            humidity: soil.humidity,
            climate_id: draft.climate_id,
        };
        let plan = planner.plan(existing as u32, &observed)?;

        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            INSERT INTO survey_submissions (parcel_id, surveyor_id, climate_id, soil_condition_id,
                                            recommended_plant_id, status, sequence, elevation)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, parcel_id, surveyor_id, climate_id, soil_condition_id,
                      recommended_plant_id, status, sequence, elevation, submitted_at
            "#,
        )
        .bind(draft.parcel_id)
        .bind(draft.surveyor_id)
        .bind(draft.climate_id)
        .bind(draft.soil_condition_id)
        .bind(plan.recommended_plant_id())
        .bind(plan.status.as_str())
        .bind(plan.sequence as i32)
        .bind(draft.elevation)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::from_write(e, "survey submission"))?;

        sqlx::query("UPDATE land_parcels SET elevation = $1 WHERE id = $2")
            .bind(draft.elevation)
            .bind(draft.parcel_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok((SurveySubmission::try_from(row)?, plan))
    }

    async fn recent_soil_samples(&self, parcel_id: Uuid, limit: u32) -> AppResult<Vec<SoilSample>> {
        self.ensure_parcel_exists(parcel_id).await?;

        let rows = sqlx::query_as::<_, (Uuid, DateTime<Utc>, Decimal, Decimal, Decimal)>(
            r#"
            SELECT s.id, s.submitted_at, k.ph, k.nutrient, k.humidity
            FROM survey_submissions s
            JOIN soil_conditions k ON k.id = s.soil_condition_id
            WHERE s.parcel_id = $1
            ORDER BY s.submitted_at DESC, s.id DESC
            LIMIT $2
            "#,
        )
        .bind(parcel_id)
        .bind(i64::from(limit))
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(submission_id, submitted_at, ph, nutrient, humidity)| SoilSample {
                submission_id,
                submitted_at,
                ph,
                nutrient,
                humidity,
            })
            .collect())
    }

    async fn survey_history(&self, parcel_id: Uuid, limit: u32) -> AppResult<Vec<SurveyRecord>> {
        self.ensure_parcel_exists(parcel_id).await?;

        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT s.id AS submission_id, s.parcel_id, s.surveyor_id, s.sequence, s.status,
                   s.submitted_at, s.elevation,
                   c.weather_type,
                   k.texture AS soil_texture, k.ph, k.nutrient, k.humidity,
                   s.recommended_plant_id,
                   p.name AS recommended_plant_name
            FROM survey_submissions s
            JOIN climates c ON c.id = s.climate_id
            JOIN soil_conditions k ON k.id = s.soil_condition_id
            LEFT JOIN plants p ON p.id = s.recommended_plant_id
            WHERE s.parcel_id = $1
            ORDER BY s.submitted_at DESC, s.id DESC
            LIMIT $2
            "#,
        )
        .bind(parcel_id)
        .bind(i64::from(limit))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(SurveyRecord::try_from).collect()
    }

    async fn record_soil_condition(&self, input: NewSoilCondition) -> AppResult<SoilCondition> {
        let row = sqlx::query_as::<_, SoilRow>(
            r#"
            INSERT INTO soil_conditions (texture, ph, nutrient, humidity)
            VALUES ($1, $2, $3, $4)
            RETURNING id, texture, ph, nutrient, humidity, created_at
            "#,
        )
        .bind(&input.texture)
        .bind(input.ph)
        .bind(input.nutrient)
        .bind(input.humidity)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    async fn list_soil_conditions(&self) -> AppResult<Vec<SoilCondition>> {
        let rows = sqlx::query_as::<_, SoilRow>(
            "SELECT id, texture, ph, nutrient, humidity, created_at FROM soil_conditions ORDER BY created_at ASC",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_climates(&self) -> AppResult<Vec<ClimateProfile>> {
        let rows = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, weather_type FROM climates ORDER BY weather_type ASC",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, weather_type)| ClimateProfile { id, weather_type })
            .collect())
    }

    async fn list_plant_types(&self) -> AppResult<Vec<PlantType>> {
        let rows = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, name FROM plant_types ORDER BY name ASC",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name)| PlantType { id, name })
            .collect())
    }

    async fn plant_catalog(&self) -> AppResult<Vec<PlantProfile>> {
        let rows = sqlx::query_as::<_, PlantRow>(&format!(
            "SELECT {} FROM plants ORDER BY id ASC",
            PLANT_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_plant(&self, input: NewPlant) -> AppResult<PlantProfile> {
        let type_exists =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM plant_types WHERE id = $1")
                .bind(input.plant_type_id)
                .fetch_one(&self.db)
                .await?;
        if type_exists == 0 {
            return Err(AppError::not_found("Plant type"));
        }

        if let Some(climate_id) = input.ideal_climate_id {
            let climate_exists =
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM climates WHERE id = $1")
                    .bind(climate_id)
                    .fetch_one(&self.db)
                    .await?;
            if climate_exists == 0 {
                return Err(AppError::not_found("Climate"));
            }
        }

        let duplicate = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM plants WHERE plant_type_id = $1 AND LOWER(name) = LOWER($2)",
        )
        .bind(input.plant_type_id)
        .bind(&input.name)
        .fetch_one(&self.db)
        .await?;
        if duplicate > 0 {
            return Err(AppError::conflict(
                "plant",
                "A plant with this name already exists for this type",
            ));
        }

        let row = sqlx::query_as::<_, PlantRow>(&format!(
            r#"
            INSERT INTO plants (plant_type_id, name, ideal_elevation, ideal_ph, ideal_nutrient,
                                ideal_humidity, ideal_climate_id, soil_texture)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            PLANT_COLUMNS
        ))
        .bind(input.plant_type_id)
        .bind(&input.name)
        .bind(input.ideal_elevation)
        .bind(input.ideal_ph)
        .bind(input.ideal_nutrient)
        .bind(input.ideal_humidity)
        .bind(input.ideal_climate_id)
        .bind(&input.soil_texture)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::from_write(e, "plant"))?;

        Ok(row.into())
    }

    async fn delete_plant(&self, plant_id: Uuid) -> AppResult<()> {
        let in_use = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM survey_submissions WHERE recommended_plant_id = $1",
        )
        .bind(plant_id)
        .fetch_one(&self.db)
        .await?;
        if in_use > 0 {
            return Err(AppError::conflict(
                "plant",
                "This plant is referenced by survey data and cannot be deleted",
            ));
        }

        // A submission committed after the count still trips the foreign key
        let result = sqlx::query("DELETE FROM plants WHERE id = $1")
            .bind(plant_id)
            .execute(&self.db)
            .await
            .map_err(|e| AppError::from_write(e, "plant"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Plant"));
        }
        Ok(())
    }
}
