//! Soil condition and climate HTTP handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::services::SoilService;
use crate::store::NewSoilCondition;
use crate::AppState;

/// Record a soil reading before submitting a survey
pub async fn record_soil_condition(
    State(state): State<AppState>,
    Json(input): Json<NewSoilCondition>,
) -> impl IntoResponse {
    let service = SoilService::new(state.store.clone());

    match service.record_soil_condition(input).await {
        Ok(condition) => (StatusCode::CREATED, Json(condition)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn list_soil_conditions(State(state): State<AppState>) -> impl IntoResponse {
    let service = SoilService::new(state.store.clone());

    match service.list_soil_conditions().await {
        Ok(conditions) => (
            StatusCode::OK,
            Json(serde_json::json!({ "soil_conditions": conditions })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn list_climates(State(state): State<AppState>) -> impl IntoResponse {
    let service = SoilService::new(state.store.clone());

    match service.list_climates().await {
        Ok(climates) => {
            (StatusCode::OK, Json(serde_json::json!({ "climates": climates }))).into_response()
        }
        Err(e) => e.into_response(),
    }
}
