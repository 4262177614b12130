use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{CheckoutRecord, ConditionRating};

/// Host-submitted condition report at checkout time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutAssessment {
    pub condition: ConditionRating,
    pub damages_reported: bool,
    #[serde(default)]
    pub damage_description: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CheckoutValidationError {
    #[error("damage_description is required when damages are reported")]
    MissingDamageDescription,
}

/// Validated checkout record plus the deposit disposition it implies.
#[derive(Debug, Clone)]
pub struct AppraisedCheckout {
    pub record: CheckoutRecord,
    pub deposit_refundable: bool,
}

/// Turn a raw assessment into an immutable record. Reported damages require
/// a non-empty description; nothing is recorded on failure. The deposit is
/// refundable only for an eligible condition with no damages reported.
pub fn appraise(
    assessment: CheckoutAssessment,
    now: DateTime<Utc>,
) -> Result<AppraisedCheckout, CheckoutValidationError> {
    let description = assessment
        .damage_description
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string);

    if assessment.damages_reported && description.is_none() {
        return Err(CheckoutValidationError::MissingDamageDescription);
    }

    let deposit_refundable =
        assessment.condition.deposit_eligible() && !assessment.damages_reported;

    Ok(AppraisedCheckout {
        record: CheckoutRecord {
            condition: assessment.condition,
            damages_reported: assessment.damages_reported,
            damage_description: description,
            notes: assessment
                .notes
                .filter(|text| !text.trim().is_empty()),
            recorded_at: now,
        },
        deposit_refundable,
    })
}
