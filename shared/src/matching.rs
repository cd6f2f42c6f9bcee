//! Plant matching engine
//!
//! Scores every plant profile in a catalog snapshot against one set of
//! observed conditions and partitions the catalog into `recommended` and
//! `others`.
//!
//! Each complete profile is checked on five independent criteria. A satisfied
//! criterion adds its weight to the score:
//!
//! | Criterion | Satisfied when                     | Default weight |
//! |-----------|------------------------------------|----------------|
//! | climate   | ideal climate equals observed      | 3              |
//! | elevation | \|Δ\| ≤ 200 m                      | 2              |
//! | pH        | \|Δ\| ≤ 1.0                        | 2              |
//! | nutrient  | \|Δ\| ≤ 20                         | 1              |
//! | humidity  | \|Δ\| ≤ 15                         | 1              |
//!
//! Climate is a hard gate: a plant is recommended only when its climate
//! matches and its score reaches the minimum. Profiles with any unknown ideal
//! score 0 and always land in `others`.
//!
//! Both partitions are ordered by descending score, then ascending plant id.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{IdealConditions, PlantProfile};
use crate::types::ObservedConditions;

/// Tolerances, weights and cut-off used when scoring plants
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MatchingPolicy {
    /// Maximum elevation difference in meters
    pub elevation_tolerance: Decimal,
    /// Maximum pH difference
    pub ph_tolerance: Decimal,
    /// Maximum nutrient index difference
    pub nutrient_tolerance: Decimal,
    /// Maximum humidity index difference
    pub humidity_tolerance: Decimal,
    pub weights: MatchWeights,
    /// Lowest score a climate-matching plant needs to be recommended
    pub min_recommended_score: u32,
}

impl Default for MatchingPolicy {
    fn default() -> Self {
        Self {
            elevation_tolerance: Decimal::from(200),
            ph_tolerance: Decimal::ONE,
            nutrient_tolerance: Decimal::from(20),
            humidity_tolerance: Decimal::from(15),
            weights: MatchWeights::default(),
            min_recommended_score: 5,
        }
    }
}

/// Score contributed by each satisfied criterion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MatchWeights {
    pub climate: u32,
    pub elevation: u32,
    pub ph: u32,
    pub nutrient: u32,
    pub humidity: u32,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            climate: 3,
            elevation: 2,
            ph: 2,
            nutrient: 1,
            humidity: 1,
        }
    }
}

impl MatchWeights {
    /// Sum of all weights, `None` when it does not fit in a `u32`
    pub fn checked_max_score(&self) -> Option<u32> {
        [self.elevation, self.ph, self.nutrient, self.humidity]
            .into_iter()
            .try_fold(self.climate, u32::checked_add)
    }

    pub fn max_score(&self) -> u32 {
        self.checked_max_score().unwrap_or(u32::MAX)
    }
}

impl MatchingPolicy {
    /// Reject tolerances and weights that cannot produce a meaningful score
    pub fn validate(&self) -> Result<(), &'static str> {
        let tolerances = [
            self.elevation_tolerance,
            self.ph_tolerance,
            self.nutrient_tolerance,
            self.humidity_tolerance,
        ];
        if tolerances.iter().any(|t| *t < Decimal::ZERO) {
            return Err("Matching tolerances must not be negative");
        }
        if self.weights.checked_max_score().is_none() {
            return Err("Matching weights overflow the score range");
        }
        Ok(())
    }
}

/// Which criteria a complete profile satisfied
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CriteriaMatch {
    pub climate: bool,
    pub elevation: bool,
    pub ph: bool,
    pub nutrient: bool,
    pub humidity: bool,
}

impl CriteriaMatch {
    fn evaluate(
        ideal: &IdealConditions,
        observed: &ObservedConditions,
        policy: &MatchingPolicy,
    ) -> Self {
        let within = |ideal: Decimal, actual: Decimal, tolerance: Decimal| {
            (actual - ideal).abs() <= tolerance
        };

        Self {
            climate: ideal.climate_id == observed.climate_id,
            elevation: within(ideal.elevation, observed.elevation, policy.elevation_tolerance),
            ph: within(ideal.ph, observed.ph, policy.ph_tolerance),
            nutrient: within(ideal.nutrient, observed.nutrient, policy.nutrient_tolerance),
            humidity: within(ideal.humidity, observed.humidity, policy.humidity_tolerance),
        }
    }

    pub fn score(&self, weights: &MatchWeights) -> u32 {
        [
            (self.climate, weights.climate),
            (self.elevation, weights.elevation),
            (self.ph, weights.ph),
            (self.nutrient, weights.nutrient),
            (self.humidity, weights.humidity),
        ]
        .into_iter()
        .filter(|(hit, _)| *hit)
        .fold(0u32, |total, (_, weight)| total.saturating_add(weight))
    }
}

/// Category a plant falls into for one matching run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchCategory {
    Recommended,
    Other,
    /// At least one ideal is unknown, never recommended
    IncompleteProfile,
}

/// A plant together with its score for one matching run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredPlant {
    pub plant: PlantProfile,
    pub score: u32,
    pub category: MatchCategory,
    /// Absent for incomplete profiles
    pub criteria: Option<CriteriaMatch>,
}

/// Output partitions of one matching run
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MatchResult {
    pub recommended: Vec<ScoredPlant>,
    pub others: Vec<ScoredPlant>,
}

impl MatchResult {
    /// Highest ranked recommended plant, if any
    pub fn best(&self) -> Option<&ScoredPlant> {
        self.recommended.first()
    }
}

/// Score a single plant profile
pub fn score_plant(
    plant: &PlantProfile,
    observed: &ObservedConditions,
    policy: &MatchingPolicy,
) -> ScoredPlant {
    let Some(ideal) = plant.ideal_conditions() else {
        return ScoredPlant {
            plant: plant.clone(),
            score: 0,
            category: MatchCategory::IncompleteProfile,
            criteria: None,
        };
    };

    let criteria = CriteriaMatch::evaluate(&ideal, observed, policy);
    let score = criteria.score(&policy.weights);
    let category = if criteria.climate && score >= policy.min_recommended_score {
        MatchCategory::Recommended
    } else {
        MatchCategory::Other
    };

    ScoredPlant {
        plant: plant.clone(),
        score,
        category,
        criteria: Some(criteria),
    }
}

/// Score the whole catalog and partition it
pub fn match_plants(
    catalog: &[PlantProfile],
    observed: &ObservedConditions,
    policy: &MatchingPolicy,
) -> MatchResult {
    let (mut recommended, mut others): (Vec<_>, Vec<_>) = catalog
        .iter()
        .map(|plant| score_plant(plant, observed, policy))
        .partition(|scored| scored.category == MatchCategory::Recommended);

    recommended.sort_by(rank_order);
    others.sort_by(rank_order);

    MatchResult {
        recommended,
        others,
    }
}

fn rank_order(a: &ScoredPlant, b: &ScoredPlant) -> std::cmp::Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| a.plant.id.cmp(&b.plant.id))
}
