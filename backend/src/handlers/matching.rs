//! Ad-hoc plant matching handler

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use shared::ObservedConditions;

use crate::services::MatchingService;
use crate::AppState;

/// Score the catalog against posted conditions without recording a survey
pub async fn match_plants(
    State(state): State<AppState>,
    Json(observed): Json<ObservedConditions>,
) -> impl IntoResponse {
    let service = MatchingService::new(state.store.clone(), state.config.matching.clone());

    match service.match_plants(observed).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => e.into_response(),
    }
}
