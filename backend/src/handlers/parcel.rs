//! Parcel administration HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::middleware::Actor;
use crate::services::ParcelService;
use crate::store::NewParcel;
use crate::AppState;

fn parcel_service(state: &AppState) -> ParcelService {
    ParcelService::new(
        state.store.clone(),
        state.config.survey.recommendation_threshold,
    )
}

/// Body for registering a parcel; the owner is the acting farmer
#[derive(Debug, Deserialize)]
pub struct CreateParcelRequest {
    pub address_id: Option<Uuid>,
    pub elevation: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct ListParcelsQuery {
    pub owner_id: Option<Uuid>,
}

/// Register a parcel owned by the acting user
pub async fn create_parcel(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<CreateParcelRequest>,
) -> impl IntoResponse {
    let input = NewParcel {
        owner_id: actor.0,
        address_id: input.address_id,
        elevation: input.elevation,
    };

    match parcel_service(&state).create_parcel(input).await {
        Ok(parcel) => (StatusCode::CREATED, Json(parcel)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get a parcel with its survey count and lifecycle state
pub async fn get_parcel(
    State(state): State<AppState>,
    Path(parcel_id): Path<Uuid>,
) -> impl IntoResponse {
    match parcel_service(&state).get_parcel(parcel_id).await {
        Ok(parcel) => (StatusCode::OK, Json(parcel)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// List parcels, optionally for one owner
pub async fn list_parcels(
    State(state): State<AppState>,
    Query(query): Query<ListParcelsQuery>,
) -> impl IntoResponse {
    match parcel_service(&state).list_parcels(query.owner_id).await {
        Ok(parcels) => {
            (StatusCode::OK, Json(serde_json::json!({ "parcels": parcels }))).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Delete a parcel and its submissions
pub async fn delete_parcel(
    State(state): State<AppState>,
    Path(parcel_id): Path<Uuid>,
) -> impl IntoResponse {
    match parcel_service(&state).delete_parcel(parcel_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}
