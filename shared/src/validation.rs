//! Validation utilities for survey measurements
//!
//! Domain bounds follow what field surveyors can physically record.

use rust_decimal::Decimal;

use crate::types::{MeasurementRange, ObservedConditions};

/// Elevation in meters above sea level
pub const ELEVATION_RANGE: MeasurementRange =
    MeasurementRange::new(Decimal::ZERO, Decimal::from_parts(3000, 0, 0, false, 0));

/// Soil acidity
pub const PH_RANGE: MeasurementRange =
    MeasurementRange::new(Decimal::ZERO, Decimal::from_parts(14, 0, 0, false, 0));

/// Nutrient index
pub const NUTRIENT_RANGE: MeasurementRange =
    MeasurementRange::new(Decimal::ZERO, Decimal::ONE_HUNDRED);

/// Humidity index
pub const HUMIDITY_RANGE: MeasurementRange =
    MeasurementRange::new(Decimal::ZERO, Decimal::ONE_HUNDRED);

/// Validate measured elevation
pub fn validate_elevation(elevation: Decimal) -> Result<(), &'static str> {
    if !ELEVATION_RANGE.contains(elevation) {
        return Err("Elevation must be between 0 and 3000 meters");
    }
    Ok(())
}

/// Validate soil pH
pub fn validate_ph(ph: Decimal) -> Result<(), &'static str> {
    if !PH_RANGE.contains(ph) {
        return Err("pH must be between 0 and 14");
    }
    Ok(())
}

/// Validate nutrient index
pub fn validate_nutrient(nutrient: Decimal) -> Result<(), &'static str> {
    if !NUTRIENT_RANGE.contains(nutrient) {
        return Err("Nutrient index must be between 0 and 100");
    }
    Ok(())
}

/// Validate humidity index
pub fn validate_humidity(humidity: Decimal) -> Result<(), &'static str> {
    if !HUMIDITY_RANGE.contains(humidity) {
        return Err("Humidity index must be between 0 and 100");
    }
    Ok(())
}

/// Validate a soil texture label
pub fn validate_texture(texture: &str) -> Result<(), &'static str> {
    if texture.trim().is_empty() {
        return Err("Soil texture cannot be empty");
    }
    Ok(())
}

/// Validate a full soil reading, reporting the first offending field
pub fn validate_soil_reading(
    ph: Decimal,
    nutrient: Decimal,
    humidity: Decimal,
) -> Result<(), (&'static str, &'static str)> {
    validate_ph(ph).map_err(|e| ("ph", e))?;
    validate_nutrient(nutrient).map_err(|e| ("nutrient", e))?;
    validate_humidity(humidity).map_err(|e| ("humidity", e))?;
    Ok(())
}

/// Validate observed conditions before matching
pub fn validate_observed(observed: &ObservedConditions) -> Result<(), (&'static str, &'static str)> {
    validate_elevation(observed.elevation).map_err(|e| ("elevation", e))?;
    validate_soil_reading(observed.ph, observed.nutrient, observed.humidity)
}
