//! Common types used across the platform

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Inclusive range of valid values for a measurement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MeasurementRange {
    pub min: Decimal,
    pub max: Decimal,
}

impl MeasurementRange {
    pub const fn new(min: Decimal, max: Decimal) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: Decimal) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Soil and climate conditions observed on a parcel, input to matching
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ObservedConditions {
    pub elevation: Decimal,
    pub ph: Decimal,
    pub nutrient: Decimal,
    pub humidity: Decimal,
    pub climate_id: Uuid,
}
