//! Land parcel models and claim rules

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered plot of land owned by a farmer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LandParcel {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// Set once by the first successful claim, never released
    pub assigned_surveyor_id: Option<Uuid>,
    /// Meters above sea level, overwritten by every accepted survey
    pub elevation: Option<Decimal>,
    pub address_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl LandParcel {
    /// Whether `surveyor_id` holds the claim on this parcel
    pub fn is_claimed_by(&self, surveyor_id: Uuid) -> bool {
        self.assigned_surveyor_id == Some(surveyor_id)
    }
}

/// Result of attempting to claim a parcel
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum ClaimOutcome {
    /// The parcel was unassigned and now belongs to the surveyor
    Granted,
    /// The surveyor already held the claim
    AlreadyHeld,
    /// Another surveyor holds the claim
    HeldByOther { surveyor_id: Uuid },
}

impl ClaimOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ClaimOutcome::Granted | ClaimOutcome::AlreadyHeld)
    }
}

/// Decide a claim against the parcel's current assignment.
///
/// Stores must call this while holding whatever lock makes the
/// read-then-assign sequence atomic for the parcel.
pub fn evaluate_claim(current: Option<Uuid>, surveyor_id: Uuid) -> ClaimOutcome {
    match current {
        None => ClaimOutcome::Granted,
        Some(holder) if holder == surveyor_id => ClaimOutcome::AlreadyHeld,
        Some(holder) => ClaimOutcome::HeldByOther {
            surveyor_id: holder,
        },
    }
}
