//! HTTP surface tests against the in-memory store

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use land_survey::store::MemorySurveyStore;
use land_survey::{create_app, AppState, Config};
use serde_json::{json, Value};
use tower::ServiceExt; // for oneshot
use uuid::Uuid;

async fn test_app() -> Router {
    let state = AppState {
        store: Arc::new(MemorySurveyStore::seeded().await),
        config: Arc::new(Config::in_memory()),
    };
    create_app(state)
}

fn request(method: &str, uri: &str, actor: Option<Uuid>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
        builder = builder.header("x-actor-id", actor.to_string());
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_response(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&body).expect("Failed to parse JSON")
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = test_app().await;

    let response = app.clone().oneshot(request("GET", "/health", None, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(request("GET", "/api/v1/health", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_response(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], "connected");
}

#[tokio::test]
async fn test_reference_data_is_public() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(request("GET", "/api/v1/climates", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_response(response).await;
    assert_eq!(body["climates"].as_array().unwrap().len(), 4);

    let response = app
        .oneshot(request("GET", "/api/v1/plant-types", None, None))
        .await
        .unwrap();
    let body = json_response(response).await;
    assert_eq!(body["plant_types"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_missing_actor_is_unauthorized() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(request("POST", "/api/v1/parcels", None, Some(json!({}))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_response(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let mut bad = request("GET", "/api/v1/parcels", None, None);
    bad.headers_mut()
        .insert("x-actor-id", "not-a-uuid".parse().unwrap());
    let response = app.oneshot(bad).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_claim_flow_over_http() {
    let app = test_app().await;
    let farmer = Uuid::new_v4();
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/parcels",
            Some(farmer),
            Some(json!({ "elevation": "950" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let parcel = json_response(response).await;
    assert_eq!(parcel["owner_id"], farmer.to_string());
    let parcel_id = parcel["id"].as_str().unwrap().to_string();

    let claim_uri = format!("/api/v1/parcels/{}/claim", parcel_id);
    let response = app
        .clone()
        .oneshot(request("POST", &claim_uri, Some(a), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_response(response).await["newly_assigned"], true);

    let response = app
        .clone()
        .oneshot(request("POST", &claim_uri, Some(b), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_response(response).await["error"]["code"], "ALREADY_CLAIMED");

    let response = app
        .oneshot(request(
            "GET",
            &format!("/api/v1/parcels/{}", parcel_id),
            Some(farmer),
            None,
        ))
        .await
        .unwrap();
    let summary = json_response(response).await;
    assert_eq!(summary["assigned_surveyor_id"], a.to_string());
    assert_eq!(summary["lifecycle_state"], "new");
    assert_eq!(summary["survey_count"], 0);
}

#[tokio::test]
async fn test_soil_average_without_surveys_is_404() {
    let app = test_app().await;
    let farmer = Uuid::new_v4();

    let response = app
        .clone()
        .oneshot(request("POST", "/api/v1/parcels", Some(farmer), Some(json!({}))))
        .await
        .unwrap();
    let parcel = json_response(response).await;

    let response = app
        .oneshot(request(
            "GET",
            &format!("/api/v1/parcels/{}/soil-average", parcel["id"].as_str().unwrap()),
            Some(farmer),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_response(response).await["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_invalid_soil_reading_is_400() {
    let app = test_app().await;

    let response = app
        .oneshot(request(
            "POST",
            "/api/v1/soil-conditions",
            Some(Uuid::new_v4()),
            Some(json!({ "texture": "Loam", "ph": "15", "nutrient": "40", "humidity": "50" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_response(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["field"], "ph");
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, json_response(response).await)
}

/// First seeded climate and plant type, plus a catalog plant ideal for 1500 m
async fn seed_catalog(app: &Router, actor: Uuid) -> (String, String) {
    let (_, climates) = send(app, request("GET", "/api/v1/climates", None, None)).await;
    let climate_id = climates["climates"][0]["id"].as_str().unwrap().to_string();
    let (_, types) = send(app, request("GET", "/api/v1/plant-types", None, None)).await;
    let plant_type_id = types["plant_types"][0]["id"].as_str().unwrap().to_string();

    let (status, plant) = send(
        app,
        request(
            "POST",
            "/api/v1/plants",
            Some(actor),
            Some(json!({
                "plant_type_id": plant_type_id,
                "name": "Arabica",
                "ideal_elevation": "1500",
                "ideal_ph": "6.0",
                "ideal_nutrient": "50",
                "ideal_humidity": "60",
                "ideal_climate_id": climate_id,
                "soil_texture": "Loam"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    (climate_id, plant["id"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn test_survey_submissions_over_http() {
    let app = test_app().await;
    let farmer = Uuid::new_v4();
    let surveyor = Uuid::new_v4();
    let (climate_id, plant_id) = seed_catalog(&app, farmer).await;

    let (_, parcel) = send(
        &app,
        request("POST", "/api/v1/parcels", Some(farmer), Some(json!({}))),
    )
    .await;
    let parcel_id = parcel["id"].as_str().unwrap().to_string();
    let surveys_uri = format!("/api/v1/parcels/{}/surveys", parcel_id);

    let (status, _) = send(
        &app,
        request("POST", &format!("/api/v1/parcels/{}/claim", parcel_id), Some(surveyor), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let mut receipts = Vec::new();
    for _ in 0..3 {
        let (status, soil) = send(
            &app,
            request(
                "POST",
                "/api/v1/soil-conditions",
                Some(surveyor),
                Some(json!({ "texture": "Loam", "ph": "6.0", "nutrient": "50", "humidity": "60" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, receipt) = send(
            &app,
            request(
                "POST",
                &surveys_uri,
                Some(surveyor),
                Some(json!({
                    "climate_id": climate_id,
                    "soil_condition_id": soil["id"],
                    "elevation": "1500"
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        receipts.push(receipt);
    }

    assert_eq!(receipts[0]["status"], "waiting");
    assert_eq!(receipts[1]["status"], "waiting");
    assert!(receipts[1]["recommended_plant_id"].is_null());
    assert_eq!(receipts[2]["status"], "completed");
    assert_eq!(receipts[2]["sequence"], 3);
    assert_eq!(receipts[2]["recommended_plant_id"], plant_id);
    assert_eq!(
        receipts[2]["recommendation"]["recommended"][0]["plant"]["id"],
        plant_id
    );

    // The owner never claimed the parcel, so the ledger refuses their survey
    let (_, soil) = send(
        &app,
        request(
            "POST",
            "/api/v1/soil-conditions",
            Some(farmer),
            Some(json!({ "texture": "Clay", "ph": "7.0", "nutrient": "40", "humidity": "50" })),
        ),
    )
    .await;
    let (status, body) = send(
        &app,
        request(
            "POST",
            &surveys_uri,
            Some(farmer),
            Some(json!({
                "climate_id": climate_id,
                "soil_condition_id": soil["id"],
                "elevation": "1500"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "NOT_CLAIMED_BY_SURVEYOR");
}

#[tokio::test]
async fn test_adhoc_matching_over_http() {
    let app = test_app().await;
    let actor = Uuid::new_v4();
    let (climate_id, plant_id) = seed_catalog(&app, actor).await;

    let (status, result) = send(
        &app,
        request(
            "POST",
            "/api/v1/matching",
            Some(actor),
            Some(json!({
                "elevation": "1450",
                "ph": "6.5",
                "nutrient": "45",
                "humidity": "70",
                "climate_id": climate_id
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["recommended"][0]["plant"]["id"], plant_id);
    assert_eq!(result["recommended"][0]["score"], 9);
    assert_eq!(result["recommended"][0]["category"], "recommended");
    assert!(result["others"].as_array().unwrap().is_empty());

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/v1/matching",
            Some(actor),
            Some(json!({
                "elevation": "1450",
                "ph": "15",
                "nutrient": "45",
                "humidity": "70",
                "climate_id": climate_id
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "ph");
}
