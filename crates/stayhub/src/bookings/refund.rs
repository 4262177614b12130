use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

/// One row of the cancellation refund table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefundTier {
    pub min_days_before_check_in: i64,
    pub percent: u32,
    pub label: &'static str,
}

const NO_REFUND: RefundTier = RefundTier {
    min_days_before_check_in: i64::MIN,
    percent: 0,
    label: "no_refund",
};

/// Data-driven refund schedule. Tiers are kept sorted by descending lower
/// bound; the first row whose bound is met wins, and anything below the last
/// bound refunds nothing.
#[derive(Debug, Clone)]
pub struct RefundPolicy {
    tiers: Vec<RefundTier>,
}

impl Default for RefundPolicy {
    /// Standard schedule: 30+ days out refunds everything, 14+ half,
    /// 7+ a quarter, later nothing.
    fn default() -> Self {
        Self::new(vec![
            RefundTier {
                min_days_before_check_in: 30,
                percent: 100,
                label: "full_refund",
            },
            RefundTier {
                min_days_before_check_in: 14,
                percent: 50,
                label: "half_refund",
            },
            RefundTier {
                min_days_before_check_in: 7,
                percent: 25,
                label: "quarter_refund",
            },
        ])
    }
}

impl RefundPolicy {
    pub fn new(mut tiers: Vec<RefundTier>) -> Self {
        tiers.sort_by(|a, b| b.min_days_before_check_in.cmp(&a.min_days_before_check_in));
        Self { tiers }
    }

    /// Pure assessment of a cancellation at `now`. Days are counted as whole
    /// days between `now` and midnight UTC on the check-in date; the refund
    /// percentage applies to the stay total plus the deposit.
    pub fn assess(
        &self,
        check_in: NaiveDate,
        total_amount: u32,
        deposit_amount: u32,
        now: DateTime<Utc>,
    ) -> RefundAssessment {
        let check_in_start = check_in.and_time(NaiveTime::MIN).and_utc();
        let days_until_check_in = (check_in_start - now).num_days();

        let tier = self
            .tiers
            .iter()
            .find(|tier| days_until_check_in >= tier.min_days_before_check_in)
            .copied()
            .unwrap_or(NO_REFUND);

        let basis = u64::from(total_amount) + u64::from(deposit_amount);
        let refund_amount = (basis * u64::from(tier.percent) / 100) as u32;

        RefundAssessment {
            days_until_check_in,
            percent: tier.percent,
            refund_amount,
            tier: tier.label,
        }
    }
}

/// Result of running the refund table at a given instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefundAssessment {
    pub days_until_check_in: i64,
    pub percent: u32,
    pub refund_amount: u32,
    pub tier: &'static str,
}
