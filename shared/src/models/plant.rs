//! Plant catalog models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Plant type grouping (e.g. vegetables, grains, fruit trees)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlantType {
    pub id: Uuid,
    pub name: String,
}

/// A crop and the conditions it grows best in.
///
/// Any ideal may be unknown. A profile with an unknown ideal is never
/// recommended by the matching engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlantProfile {
    pub id: Uuid,
    pub plant_type_id: Uuid,
    pub name: String,
    pub ideal_elevation: Option<Decimal>,
    pub ideal_ph: Option<Decimal>,
    pub ideal_nutrient: Option<Decimal>,
    pub ideal_humidity: Option<Decimal>,
    pub ideal_climate_id: Option<Uuid>,
    /// Preferred soil texture, informational only
    pub soil_texture: Option<String>,
}

/// The five scored ideals of a fully known plant profile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdealConditions {
    pub elevation: Decimal,
    pub ph: Decimal,
    pub nutrient: Decimal,
    pub humidity: Decimal,
    pub climate_id: Uuid,
}

impl PlantProfile {
    /// Returns the ideals only when all five are known
    pub fn ideal_conditions(&self) -> Option<IdealConditions> {
        Some(IdealConditions {
            elevation: self.ideal_elevation?,
            ph: self.ideal_ph?,
            nutrient: self.ideal_nutrient?,
            humidity: self.ideal_humidity?,
            climate_id: self.ideal_climate_id?,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.ideal_conditions().is_some()
    }
}
