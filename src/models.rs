use std::fmt;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::charges;

/// Kind of activity declared under the micro-entrepreneur regime.
/// Decides both the contribution rate and the annual revenue threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ActivityType {
    Sales,
    #[default]
    Services,
    LiberalProfession,
}

impl ActivityType {
    pub const ALL: [ActivityType; 3] = [
        ActivityType::Sales,
        ActivityType::Services,
        ActivityType::LiberalProfession,
    ];

    /// Parse a stored or user-supplied tag. Anything unrecognized falls back
    /// to `Services`, matching how historical records were read.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "vente" => ActivityType::Sales,
            "prestations" => ActivityType::Services,
            "liberales" => ActivityType::LiberalProfession,
            _ => ActivityType::Services,
        }
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            ActivityType::Sales => "vente",
            ActivityType::Services => "prestations",
            ActivityType::LiberalProfession => "liberales",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActivityType::Sales => "Vente de marchandises",
            ActivityType::Services => "Prestations de services",
            ActivityType::LiberalProfession => "Professions libérales",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl From<String> for ActivityType {
    fn from(tag: String) -> Self {
        ActivityType::from_tag(&tag)
    }
}

impl From<ActivityType> for String {
    fn from(activity: ActivityType) -> Self {
        activity.as_tag().to_string()
    }
}

/// A saved calculation. Never updated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculationRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub revenue: Decimal,
    pub activity_type: ActivityType,
    pub contributions: Decimal,
    pub net_income: Decimal,
    pub period_label: String,
    pub year: i32,
}

/// A calculation on its way into a store. `id: None` lets the store assign one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCalculation {
    pub id: Option<i64>,
    pub timestamp: DateTime<Utc>,
    pub revenue: Decimal,
    pub activity_type: ActivityType,
    pub contributions: Decimal,
    pub net_income: Decimal,
    pub period_label: String,
    pub year: i32,
}

impl NewCalculation {
    /// Derive every computed field from the inputs. Period label and year
    /// follow the calendar of `at`, the timestamp is kept to the millisecond.
    pub fn compute<Tz: TimeZone>(
        revenue: Decimal,
        activity_type: ActivityType,
        acre: bool,
        at: &DateTime<Tz>,
    ) -> Self {
        let utc = at.with_timezone(&Utc);
        let timestamp = DateTime::<Utc>::from_timestamp_millis(utc.timestamp_millis()).unwrap_or(utc);
        Self {
            id: None,
            timestamp,
            revenue,
            activity_type,
            contributions: charges::compute_contributions(revenue, activity_type, acre),
            net_income: charges::compute_net_income(revenue, activity_type, acre),
            period_label: period_label(at.month(), at.year()),
            year: at.year(),
        }
    }

    pub fn with_id(self, id: i64) -> CalculationRecord {
        CalculationRecord {
            id,
            timestamp: self.timestamp,
            revenue: self.revenue,
            activity_type: self.activity_type,
            contributions: self.contributions,
            net_income: self.net_income,
            period_label: self.period_label,
            year: self.year,
        }
    }
}

const MONTHS_FR: [&str; 12] = [
    "Janvier", "Février", "Mars", "Avril", "Mai", "Juin", "Juillet", "Août", "Septembre",
    "Octobre", "Novembre", "Décembre",
];

/// "Janvier 2024" style label. `month` is 1-based.
pub fn period_label(month: u32, year: i32) -> String {
    let idx = month.clamp(1, 12) as usize - 1;
    format!("{} {year}", MONTHS_FR[idx])
}
