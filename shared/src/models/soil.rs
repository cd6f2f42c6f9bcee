//! Soil and climate reference records

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Soil condition measured during one survey visit. Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SoilCondition {
    pub id: Uuid,
    /// Free-form texture label (e.g. loose, muddy, fertile)
    pub texture: String,
    pub ph: Decimal,
    pub nutrient: Decimal,
    pub humidity: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Weather type reference data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClimateProfile {
    pub id: Uuid,
    pub weather_type: String,
}
