//! Survey ledger HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::middleware::Actor;
use crate::services::survey::{SubmitSurveyInput, SurveyService};
use crate::AppState;

fn survey_service(state: &AppState) -> SurveyService {
    SurveyService::new(
        state.store.clone(),
        &state.config.survey,
        state.config.matching.clone(),
    )
}

#[derive(Debug, Deserialize)]
pub struct SoilAverageQuery {
    pub window: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

/// Claim a parcel for the acting surveyor
pub async fn claim_parcel(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(parcel_id): Path<Uuid>,
) -> impl IntoResponse {
    match survey_service(&state).claim_parcel(parcel_id, actor.0).await {
        Ok(receipt) => (StatusCode::OK, Json(receipt)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Submit a survey as the acting surveyor
pub async fn submit_survey(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(parcel_id): Path<Uuid>,
    Json(input): Json<SubmitSurveyInput>,
) -> impl IntoResponse {
    match survey_service(&state)
        .submit_survey(parcel_id, actor.0, input)
        .await
    {
        Ok(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Average soil readings over the latest submissions
pub async fn get_soil_average(
    State(state): State<AppState>,
    Path(parcel_id): Path<Uuid>,
    Query(query): Query<SoilAverageQuery>,
) -> impl IntoResponse {
    match survey_service(&state)
        .recent_soil_average(parcel_id, query.window)
        .await
    {
        Ok(average) => (StatusCode::OK, Json(average)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Latest submissions with their readings
pub async fn get_survey_history(
    State(state): State<AppState>,
    Path(parcel_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    match survey_service(&state)
        .survey_history(parcel_id, query.limit)
        .await
    {
        Ok(surveys) => {
            (StatusCode::OK, Json(serde_json::json!({ "surveys": surveys }))).into_response()
        }
        Err(e) => e.into_response(),
    }
}
