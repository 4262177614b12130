use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::accounts::domain::AccountId;

/// Identifier wrapper for reservations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReservationId(pub Uuid);

impl ReservationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a listing in the external catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingId(pub String);

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Field-level rejection raised before any state is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

/// Half-open stay: the guest occupies `[check_in, check_out)`, so back-to-back
/// stays sharing a turnover day do not collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StayInterval {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl StayInterval {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, ValidationError> {
        if check_out <= check_in {
            return Err(ValidationError {
                field: "check_out",
                reason: "must be after check_in".to_string(),
            });
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    pub fn overlaps(&self, other: &StayInterval) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        day >= self.check_in && day < self.check_out
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }
}

/// Lifecycle states of a reservation. `Active` is derived, never stored: a
/// stored `Confirmed` reads as `Active` from check-in day onwards, and stays
/// so past check-out until the host confirms the checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Active,
    Completed,
    Cancelled,
}

impl ReservationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Active => "active",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Cancelled => "cancelled",
        }
    }

    /// Whether this state keeps the listing's calendar blocked.
    pub const fn holds_calendar(self) -> bool {
        matches!(
            self,
            ReservationStatus::Pending | ReservationStatus::Confirmed | ReservationStatus::Active
        )
    }
}

/// Who triggered a cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationActor {
    Guest,
    Host,
}

impl CancellationActor {
    pub const fn label(self) -> &'static str {
        match self {
            CancellationActor::Guest => "guest",
            CancellationActor::Host => "host",
        }
    }
}

/// Outcome of a cancellation, frozen at the moment it happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancellationRecord {
    pub cancelled_by: CancellationActor,
    pub refund_amount: u32,
    pub policy_tier: &'static str,
    pub cancelled_at: DateTime<Utc>,
}

/// Unit condition reported by the host at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionRating {
    Excellent,
    Good,
    Fair,
    Poor,
    Damaged,
}

impl ConditionRating {
    /// Only the top two ratings leave the deposit refundable.
    pub const fn deposit_eligible(self) -> bool {
        matches!(self, ConditionRating::Excellent | ConditionRating::Good)
    }

    pub const fn label(self) -> &'static str {
        match self {
            ConditionRating::Excellent => "excellent",
            ConditionRating::Good => "good",
            ConditionRating::Fair => "fair",
            ConditionRating::Poor => "poor",
            ConditionRating::Damaged => "damaged",
        }
    }
}

/// Condition report attached when the host confirms checkout. Immutable once
/// recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutRecord {
    pub condition: ConditionRating,
    pub damages_reported: bool,
    pub damage_description: Option<String>,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Ledger entry for one stay. `status` holds the stored state and never takes
/// the derived `Active` value; amounts are whole currency units.
#[derive(Debug, Clone)]
pub struct Reservation {
    pub id: ReservationId,
    pub listing_id: ListingId,
    pub guest: AccountId,
    pub stay: StayInterval,
    pub total_amount: u32,
    pub deposit_amount: u32,
    pub status: ReservationStatus,
    pub deposit_refunded: bool,
    pub checkout: Option<CheckoutRecord>,
    pub cancellation: Option<CancellationRecord>,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    pub fn new(
        listing_id: ListingId,
        guest: AccountId,
        stay: StayInterval,
        total_amount: u32,
        deposit_amount: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ReservationId::generate(),
            listing_id,
            guest,
            stay,
            total_amount,
            deposit_amount,
            status: ReservationStatus::Pending,
            deposit_refunded: false,
            checkout: None,
            cancellation: None,
            created_at,
        }
    }

    pub fn effective_status(&self, today: NaiveDate) -> ReservationStatus {
        match self.status {
            ReservationStatus::Confirmed if today >= self.stay.check_in() => {
                ReservationStatus::Active
            }
            other => other,
        }
    }

    pub fn holds_calendar(&self) -> bool {
        self.status.holds_calendar()
    }

    pub fn view(&self, today: NaiveDate) -> ReservationView {
        ReservationView {
            id: self.id,
            listing_id: self.listing_id.clone(),
            guest: self.guest,
            check_in: self.stay.check_in(),
            check_out: self.stay.check_out(),
            nights: self.stay.nights(),
            total_amount: self.total_amount,
            deposit_amount: self.deposit_amount,
            status: self.effective_status(today).label(),
            deposit_refunded: self.deposit_refunded,
            cancellation: self.cancellation.clone(),
            checkout: self.checkout.clone(),
            created_at: self.created_at,
        }
    }
}

/// Serialization shape for API responses; carries the effective status.
#[derive(Debug, Clone, Serialize)]
pub struct ReservationView {
    pub id: ReservationId,
    pub listing_id: ListingId,
    pub guest: AccountId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: i64,
    pub total_amount: u32,
    pub deposit_amount: u32,
    pub status: &'static str,
    pub deposit_refunded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation: Option<CancellationRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout: Option<CheckoutRecord>,
    pub created_at: DateTime<Utc>,
}
