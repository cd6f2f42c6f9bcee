//! Plant catalog administration

use std::sync::Arc;

use shared::{
    validate_elevation, validate_humidity, validate_nutrient, validate_ph, PlantProfile, PlantType,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::{NewPlant, SurveyStore};

/// Plant service for managing the plant catalog
#[derive(Clone)]
pub struct PlantService {
    store: Arc<dyn SurveyStore>,
}

impl PlantService {
    pub fn new(store: Arc<dyn SurveyStore>) -> Self {
        Self { store }
    }

    /// Add a plant profile. Unknown ideals may be left empty.
    pub async fn create_plant(&self, input: NewPlant) -> AppResult<PlantProfile> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::validation("name", "Plant name cannot be empty"));
        }

        if let Some(elevation) = input.ideal_elevation {
            validate_elevation(elevation).map_err(|e| AppError::validation("ideal_elevation", e))?;
        }
        if let Some(ph) = input.ideal_ph {
            validate_ph(ph).map_err(|e| AppError::validation("ideal_ph", e))?;
        }
        if let Some(nutrient) = input.ideal_nutrient {
            validate_nutrient(nutrient).map_err(|e| AppError::validation("ideal_nutrient", e))?;
        }
        if let Some(humidity) = input.ideal_humidity {
            validate_humidity(humidity).map_err(|e| AppError::validation("ideal_humidity", e))?;
        }

        let soil_texture = input
            .soil_texture
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let plant = self
            .store
            .create_plant(NewPlant {
                name,
                soil_texture,
                ..input
            })
            .await?;

        if !plant.is_complete() {
            tracing::warn!(plant_id = %plant.id, "Plant has unknown ideals and will never be recommended");
        }
        tracing::info!(plant_id = %plant.id, name = %plant.name, "Plant added to catalog");
        Ok(plant)
    }

    pub async fn delete_plant(&self, plant_id: Uuid) -> AppResult<()> {
        self.store.delete_plant(plant_id).await?;
        tracing::info!(plant_id = %plant_id, "Plant removed from catalog");
        Ok(())
    }

    /// Catalog ordered by name, optionally restricted to one plant type
    pub async fn list_plants(&self, plant_type_id: Option<Uuid>) -> AppResult<Vec<PlantProfile>> {
        let mut plants: Vec<PlantProfile> = self
            .store
            .plant_catalog()
            .await?
            .into_iter()
            .filter(|p| plant_type_id.map_or(true, |type_id| p.plant_type_id == type_id))
            .collect();

        plants.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(plants)
    }

    pub async fn list_plant_types(&self) -> AppResult<Vec<PlantType>> {
        self.store.list_plant_types().await
    }
}
