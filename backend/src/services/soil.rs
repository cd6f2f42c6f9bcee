//! Soil readings and climate reference data

use std::sync::Arc;

use shared::{validate_soil_reading, validate_texture, ClimateProfile, SoilCondition};

use crate::error::{AppError, AppResult};
use crate::store::{NewSoilCondition, SurveyStore};

#[derive(Clone)]
pub struct SoilService {
    store: Arc<dyn SurveyStore>,
}

impl SoilService {
    pub fn new(store: Arc<dyn SurveyStore>) -> Self {
        Self { store }
    }

    /// Store a measured soil condition. Surveyors call this before submitting a survey.
    pub async fn record_soil_condition(&self, input: NewSoilCondition) -> AppResult<SoilCondition> {
        validate_texture(&input.texture).map_err(|e| AppError::validation("texture", e))?;
        validate_soil_reading(input.ph, input.nutrient, input.humidity)
            .map_err(|(field, message)| AppError::validation(field, message))?;

        let input = NewSoilCondition {
            texture: input.texture.trim().to_string(),
            ..input
        };
        let condition = self.store.record_soil_condition(input).await?;
        tracing::debug!(soil_condition_id = %condition.id, "Soil condition recorded");
        Ok(condition)
    }

    pub async fn list_soil_conditions(&self) -> AppResult<Vec<SoilCondition>> {
        self.store.list_soil_conditions().await
    }

    pub async fn list_climates(&self) -> AppResult<Vec<ClimateProfile>> {
        self.store.list_climates().await
    }
}
