//! Route definitions for the Land Survey Platform

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use crate::{handlers, middleware::actor_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Reference data (public)
        .route("/climates", get(handlers::list_climates))
        .route("/plant-types", get(handlers::list_plant_types))
        // Routes acting on behalf of a user
        .nest("/parcels", parcel_routes())
        .nest("/plants", plant_routes())
        .nest("/soil-conditions", soil_routes())
        .nest("/matching", matching_routes())
}

/// Parcel administration and survey ledger routes
fn parcel_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_parcels).post(handlers::create_parcel),
        )
        .route(
            "/:parcel_id",
            get(handlers::get_parcel).delete(handlers::delete_parcel),
        )
        .route("/:parcel_id/claim", post(handlers::claim_parcel))
        .route("/:parcel_id/surveys", post(handlers::submit_survey))
        .route("/:parcel_id/surveys/history", get(handlers::get_survey_history))
        .route("/:parcel_id/soil-average", get(handlers::get_soil_average))
        .route_layer(middleware::from_fn(actor_middleware))
}

/// Plant catalog routes
fn plant_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_plants).post(handlers::create_plant))
        .route("/:plant_id", delete(handlers::delete_plant))
        .route_layer(middleware::from_fn(actor_middleware))
}

/// Soil reading routes
fn soil_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_soil_conditions).post(handlers::record_soil_condition),
        )
        .route_layer(middleware::from_fn(actor_middleware))
}

/// Stateless matching routes
fn matching_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::match_plants))
        .route_layer(middleware::from_fn(actor_middleware))
}
