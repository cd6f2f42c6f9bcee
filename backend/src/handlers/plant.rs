//! Plant catalog HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::services::PlantService;
use crate::store::NewPlant;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListPlantsQuery {
    pub plant_type_id: Option<Uuid>,
}

pub async fn list_plants(
    State(state): State<AppState>,
    Query(query): Query<ListPlantsQuery>,
) -> impl IntoResponse {
    let service = PlantService::new(state.store.clone());

    match service.list_plants(query.plant_type_id).await {
        Ok(plants) => (StatusCode::OK, Json(serde_json::json!({ "plants": plants }))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Add a plant profile to the catalog
pub async fn create_plant(
    State(state): State<AppState>,
    Json(input): Json<NewPlant>,
) -> impl IntoResponse {
    let service = PlantService::new(state.store.clone());

    match service.create_plant(input).await {
        Ok(plant) => (StatusCode::CREATED, Json(plant)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Remove a plant that no submission references
pub async fn delete_plant(
    State(state): State<AppState>,
    Path(plant_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = PlantService::new(state.store.clone());

    match service.delete_plant(plant_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn list_plant_types(State(state): State<AppState>) -> impl IntoResponse {
    let service = PlantService::new(state.store.clone());

    match service.list_plant_types().await {
        Ok(types) => {
            (StatusCode::OK, Json(serde_json::json!({ "plant_types": types }))).into_response()
        }
        Err(e) => e.into_response(),
    }
}
