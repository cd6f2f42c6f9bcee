//! Rolling soil statistics over a parcel's most recent submissions

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default number of recent submissions averaged
pub const DEFAULT_SOIL_AVERAGE_WINDOW: u32 = 3;

/// Soil reading of one submission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SoilSample {
    pub submission_id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub ph: Decimal,
    pub nutrient: Decimal,
    pub humidity: Decimal,
}

/// Mean soil values across the sampled submissions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SoilAverage {
    pub ph_avg: Decimal,
    pub nutrient_avg: Decimal,
    pub humidity_avg: Decimal,
    pub sample_count: u32,
}

/// Sort samples newest first, ties broken by descending submission id
pub fn sort_recent_first(samples: &mut [SoilSample]) {
    samples.sort_by(|a, b| {
        b.submitted_at
            .cmp(&a.submitted_at)
            .then_with(|| b.submission_id.cmp(&a.submission_id))
    });
}

/// Average the `window` most recent samples. `None` when there is nothing to average.
pub fn average_recent_soil(samples: &[SoilSample], window: u32) -> Option<SoilAverage> {
    let mut recent = samples.to_vec();
    sort_recent_first(&mut recent);
    recent.truncate(window as usize);

    if recent.is_empty() {
        return None;
    }

    let count = Decimal::from(recent.len() as u32);
    let (ph, nutrient, humidity) = recent.iter().fold(
        (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
        |(ph, nutrient, humidity), s| (ph + s.ph, nutrient + s.nutrient, humidity + s.humidity),
    );

    Some(SoilAverage {
        ph_avg: (ph / count).normalize(),
        nutrient_avg: (nutrient / count).normalize(),
        humidity_avg: (humidity / count).normalize(),
        sample_count: recent.len() as u32,
    })
}
