//! Turns raw revenue input into estimates and saved calculations.

use std::str::FromStr;

use chrono::{DateTime, TimeZone};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::charges::{Estimate, ThresholdStatus};
use crate::error::{Result, ValidationError};
use crate::models::{ActivityType, CalculationRecord, NewCalculation};
use crate::store::CalculationStore;

/// Largest accepted revenue. Keeps every product and yearly sum in range.
pub const MAX_REVENUE: Decimal = dec!(1000000000000000);

/// Parse a revenue amount typed by the user. Accepts `.` or `,` as the
/// decimal separator and ignores spaces used as thousands separators.
pub fn parse_revenue(input: &str) -> std::result::Result<Decimal, ValidationError> {
    let cleaned: String = input
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return Err(ValidationError::Empty);
    }
    let value = Decimal::from_str(&cleaned)
        .map_err(|_| ValidationError::NotANumber(input.trim().to_string()))?;
    if value <= Decimal::ZERO {
        return Err(ValidationError::NotPositive);
    }
    if value > MAX_REVENUE {
        return Err(ValidationError::TooLarge(MAX_REVENUE));
    }
    Ok(value)
}

/// Figures to show while the user is still typing. Unparseable input
/// shows as zero rather than an error.
pub fn estimate_input(input: &str, activity: ActivityType, acre: bool) -> Estimate {
    let revenue = parse_revenue(input).unwrap_or(Decimal::ZERO);
    Estimate::new(revenue, activity, acre)
}

/// Validate `input` and store the resulting calculation, dated `at`.
pub fn save<Tz: TimeZone>(
    store: &dyn CalculationStore,
    input: &str,
    activity: ActivityType,
    acre: bool,
    at: &DateTime<Tz>,
) -> Result<CalculationRecord> {
    let revenue = parse_revenue(input)?;
    let record = store.insert(NewCalculation::compute(revenue, activity, acre, at))?;
    log::info!(
        "Saved calculation {} ({} {}, acre={acre})",
        record.id,
        record.revenue,
        activity
    );
    Ok(record)
}

pub fn threshold_status(
    store: &dyn CalculationStore,
    year: i32,
    activity: ActivityType,
) -> Result<ThresholdStatus> {
    let records = store.list_by_year(year)?;
    Ok(ThresholdStatus::for_year(&records, year, activity))
}
