//! Contribution and threshold arithmetic. Every function here is total and
//! pure; nothing rounds, rounding to cents is left to `fmt`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::{ActivityType, CalculationRecord};

pub const RATE_SALES: Decimal = dec!(0.128);
pub const RATE_SERVICES: Decimal = dec!(0.220);
pub const RATE_LIBERAL: Decimal = dec!(0.220);

pub const THRESHOLD_SALES: Decimal = dec!(188700);
pub const THRESHOLD_SERVICES: Decimal = dec!(77700);

pub fn rate_for(activity: ActivityType) -> Decimal {
    match activity {
        ActivityType::Sales => RATE_SALES,
        ActivityType::Services => RATE_SERVICES,
        ActivityType::LiberalProfession => RATE_LIBERAL,
    }
}

/// Rate actually applied, halved while ACRE is active.
pub fn effective_rate(activity: ActivityType, acre: bool) -> Decimal {
    let rate = rate_for(activity);
    if acre {
        rate / dec!(2)
    } else {
        rate
    }
}

/// Negative revenue is not rejected here; callers validate before saving.
pub fn compute_contributions(revenue: Decimal, activity: ActivityType, acre: bool) -> Decimal {
    revenue * effective_rate(activity, acre)
}

pub fn compute_net_income(revenue: Decimal, activity: ActivityType, acre: bool) -> Decimal {
    revenue - compute_contributions(revenue, activity, acre)
}

pub fn threshold_for(activity: ActivityType) -> Decimal {
    match activity {
        ActivityType::Sales => THRESHOLD_SALES,
        ActivityType::Services | ActivityType::LiberalProfession => THRESHOLD_SERVICES,
    }
}

pub fn is_over_threshold(annual_revenue: Decimal, activity: ActivityType) -> bool {
    annual_revenue > threshold_for(activity)
}

/// Share of the threshold already reached, in percent. Not clamped.
pub fn threshold_percentage(annual_revenue: Decimal, activity: ActivityType) -> Decimal {
    annual_revenue / threshold_for(activity) * dec!(100)
}

pub fn remaining_before_threshold(annual_revenue: Decimal, activity: ActivityType) -> Decimal {
    (threshold_for(activity) - annual_revenue).max(Decimal::ZERO)
}

/// Saturates at `Decimal::MAX` instead of overflowing.
pub fn annual_revenue_total(records: &[CalculationRecord], year: i32) -> Decimal {
    records
        .iter()
        .filter(|r| r.year == year)
        .fold(Decimal::ZERO, |acc, r| {
            acc.checked_add(r.revenue).unwrap_or(Decimal::MAX)
        })
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// Live figures for one revenue input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Estimate {
    pub revenue: Decimal,
    pub activity: ActivityType,
    pub acre: bool,
    pub rate: Decimal,
    pub contributions: Decimal,
    pub net_income: Decimal,
}

impl Estimate {
    pub fn new(revenue: Decimal, activity: ActivityType, acre: bool) -> Self {
        Self {
            revenue,
            activity,
            acre,
            rate: effective_rate(activity, acre),
            contributions: compute_contributions(revenue, activity, acre),
            net_income: compute_net_income(revenue, activity, acre),
        }
    }
}

/// Where a year's declared revenue stands against the regime threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdStatus {
    pub year: i32,
    pub activity: ActivityType,
    pub annual_revenue: Decimal,
    pub threshold: Decimal,
    pub percentage: Decimal,
    pub remaining: Decimal,
    pub over: bool,
}

impl ThresholdStatus {
    pub fn new(annual_revenue: Decimal, year: i32, activity: ActivityType) -> Self {
        Self {
            year,
            activity,
            annual_revenue,
            threshold: threshold_for(activity),
            percentage: threshold_percentage(annual_revenue, activity),
            remaining: remaining_before_threshold(annual_revenue, activity),
            over: is_over_threshold(annual_revenue, activity),
        }
    }

    pub fn for_year(records: &[CalculationRecord], year: i32, activity: ActivityType) -> Self {
        Self::new(annual_revenue_total(records, year), year, activity)
    }
}
