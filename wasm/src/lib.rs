//! WebAssembly module for the Land Survey Platform
//!
//! Provides client-side computation for surveyors working offline:
//! - Plant matching against a cached catalog
//! - Survey lifecycle stage of a parcel
//! - Soil reading validation before upload

use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;

use shared::{LifecycleState, MatchingPolicy, PlantProfile, DEFAULT_RECOMMENDATION_THRESHOLD};

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::log_1(&"land survey wasm module loaded".into());
}

/// Score a JSON plant catalog against JSON observed conditions.
///
/// `policy_json` overrides the default tolerances and weights. Returns the
/// `{ recommended, others }` partition as JSON.
#[wasm_bindgen]
pub fn match_plants_json(
    catalog_json: &str,
    observed_json: &str,
    policy_json: Option<String>,
) -> Result<String, JsValue> {
    match_plants_str(catalog_json, observed_json, policy_json.as_deref())
        .map_err(|e| JsValue::from_str(&e))
}

fn match_plants_str(
    catalog_json: &str,
    observed_json: &str,
    policy_json: Option<&str>,
) -> Result<String, String> {
    let catalog: Vec<PlantProfile> = serde_json::from_str(catalog_json)
        .map_err(|e| format!("Invalid catalog JSON: {}", e))?;
    let observed: ObservedConditions = serde_json::from_str(observed_json)
        .map_err(|e| format!("Invalid observed conditions JSON: {}", e))?;
    let policy = match policy_json {
        Some(json) => serde_json::from_str(json)
            .map_err(|e| format!("Invalid matching policy JSON: {}", e))?,
        None => MatchingPolicy::default(),
    };
    policy.validate().map_err(|e| e.to_string())?;

    shared::validate_observed(&observed).map_err(|(field, message)| format!("{}: {}", field, message))?;

    let result = shared::match_plants(&catalog, &observed, &policy);
    serde_json::to_string(&result).map_err(|e| format!("Failed to encode result: {}", e))
}

/// Lifecycle stage of a parcel with `count` submissions
#[wasm_bindgen]
pub fn survey_stage(count: u32) -> String {
    format!(
        "{}",
        LifecycleState::for_count(count, DEFAULT_RECOMMENDATION_THRESHOLD)
    )
}

/// Validate a soil reading. Returns the error message, or nothing when valid.
#[wasm_bindgen]
pub fn validate_soil_reading(ph: f64, nutrient: f64, humidity: f64) -> Option<String> {
    let to_decimal = |field: &str, value: f64| {
        Decimal::try_from(value).map_err(|_| format!("{}: not a finite number", field))
    };

    let reading = to_decimal("ph", ph).and_then(|ph| {
        Ok((ph, to_decimal("nutrient", nutrient)?, to_decimal("humidity", humidity)?))
    });

    match reading {
        Ok((ph, nutrient, humidity)) => shared::validate_soil_reading(ph, nutrient, humidity)
            .err()
            .map(|(field, message)| format!("{}: {}", field, message)),
        Err(message) => Some(message),
    }
}
