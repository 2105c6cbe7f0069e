use crate::utils::error::{EtlError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Calendar month, always in `1..=12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Month(u8);

impl Month {
    pub const JANUARY: Month = Month(1);
    pub const FEBRUARY: Month = Month(2);

    pub fn new(number: u8) -> Option<Month> {
        (1..=12).contains(&number).then_some(Month(number))
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn index(self) -> usize {
        usize::from(self.0 - 1)
    }

    pub fn name(self) -> &'static str {
        MONTH_NAMES[self.index()]
    }

    pub fn all() -> impl Iterator<Item = Month> {
        (1..=12).map(Month)
    }
}

impl TryFrom<u8> for Month {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        Month::new(value).ok_or_else(|| format!("month must be between 1 and 12, got {}", value))
    }
}

impl From<Month> for u8 {
    fn from(month: Month) -> u8 {
        month.0
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Accepts a month number (`"3"`) or an English month name (`"March"`, `"mar"`).
impl FromStr for Month {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(number) = s.parse::<u8>() {
            return Month::try_from(number);
        }

        let lower = s.to_lowercase();
        Month::all()
            .find(|m| {
                let name = m.name().to_lowercase();
                name == lower || (lower.len() >= 3 && name.starts_with(&lower))
            })
            .ok_or_else(|| format!("unknown month '{}'", s))
    }
}

/// One side of a filter: either everything, or one concrete value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector<T> {
    All,
    Only(T),
}

impl<T> Default for Selector<T> {
    fn default() -> Self {
        Selector::All
    }
}

impl<T: PartialEq> Selector<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Selector::All => true,
            Selector::Only(wanted) => wanted == value,
        }
    }
}

impl<T> Selector<T> {
    pub fn as_only(&self) -> Option<&T> {
        match self {
            Selector::All => None,
            Selector::Only(value) => Some(value),
        }
    }
}

impl<T: FromStr> FromStr for Selector<T> {
    type Err = T::Err;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Selector::All)
        } else {
            s.parse().map(Selector::Only)
        }
    }
}

impl<T: fmt::Display> fmt::Display for Selector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::All => f.write_str("all"),
            Selector::Only(value) => value.fmt(f),
        }
    }
}

impl<T: fmt::Display> Serialize for Selector<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSelection {
    pub year: Selector<String>,
    pub month: Selector<Month>,
    pub salesperson: Selector<String>,
}

impl FilterSelection {
    pub fn all() -> Self {
        Self::default()
    }

    /// Builds a selection from the raw selector values, `"all"` meaning no restriction.
    pub fn from_parts(year: &str, month: &str, salesperson: &str) -> Result<Self> {
        let month = month
            .parse::<Selector<Month>>()
            .map_err(|reason| EtlError::InvalidConfigValueError {
                field: "filter.month".to_string(),
                value: month.to_string(),
                reason,
            })?;

        Ok(Self {
            year: text_selector(year),
            month,
            salesperson: text_selector(salesperson),
        })
    }
}

fn text_selector(value: &str) -> Selector<String> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("all") {
        Selector::All
    } else {
        Selector::Only(value.to_string())
    }
}

/// One parsed row of the sales feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    pub sales_year: String,
    pub month: Month,
    pub salesperson: String,
    pub amount: f64,
    /// Columns not used by the aggregates, in header order.
    pub extra: Vec<(String, String)>,
}

/// Header names of the columns the aggregates depend on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedColumns {
    pub year: String,
    pub month: String,
    pub salesperson: String,
    pub amount: String,
}

impl Default for FeedColumns {
    fn default() -> Self {
        Self {
            year: "Sales year".to_string(),
            month: "Month".to_string(),
            salesperson: "Sales person name".to_string(),
            amount: "Sales amount".to_string(),
        }
    }
}

/// Monthly sales targets, indexed by month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyTargets([f64; 12]);

impl Default for MonthlyTargets {
    fn default() -> Self {
        Self([
            0.0, 35_000.0, 35_000.0, 20_000.0, 20_000.0, 35_000.0, 35_000.0, 35_000.0, 35_000.0,
            35_000.0, 35_000.0, 35_000.0,
        ])
    }
}

impl MonthlyTargets {
    pub fn new(targets: [f64; 12]) -> Self {
        Self(targets)
    }

    /// Default table with the given months replaced. Keys are month numbers or names.
    pub fn with_overrides(overrides: &HashMap<String, f64>) -> Result<Self> {
        let mut targets = Self::default();
        for (key, value) in overrides {
            let month = key
                .parse::<Month>()
                .map_err(|reason| EtlError::InvalidConfigValueError {
                    field: "targets".to_string(),
                    value: key.clone(),
                    reason,
                })?;
            if !value.is_finite() || *value < 0.0 {
                return Err(EtlError::InvalidConfigValueError {
                    field: format!("targets.{}", key),
                    value: value.to_string(),
                    reason: "Target must be a non-negative number".to_string(),
                });
            }
            targets.0[month.index()] = *value;
        }
        Ok(targets)
    }

    pub fn target(&self, month: Month) -> f64 {
        self.0[month.index()]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TopPerformer {
    pub name: String,
    pub amount: f64,
}

impl TopPerformer {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonStats {
    pub name: String,
    pub total: f64,
    pub count: usize,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTopPerformer {
    pub month: Month,
    pub name: String,
    pub amount: f64,
    pub month_total: f64,
    /// Share of the month's total, one decimal place.
    pub share_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonMonthly {
    pub name: String,
    pub monthly: [f64; 12],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetAttainment {
    pub month: Month,
    pub total: f64,
    pub target: f64,
    pub percent: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FiscalYearTotal {
    pub start_year: i32,
    pub start_month: Month,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonYearly {
    pub name: String,
    pub totals: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct YearlyByPerson {
    pub years: Vec<String>,
    pub rows: Vec<PersonYearly>,
}

/// Everything a view needs for one filter selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub total: f64,
    pub average: f64,
    pub count: usize,
    pub top_performer: TopPerformer,
    pub person_stats: Vec<PersonStats>,
    pub monthly_totals: [f64; 12],
    pub monthly_top_performers: Vec<MonthlyTopPerformer>,
    pub person_monthly: Vec<PersonMonthly>,
    pub target_attainment: Vec<TargetAttainment>,
    pub fiscal_year: FiscalYearTotal,
    pub yearly_by_person: YearlyByPerson,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub years: Vec<String>,
    pub salespeople: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SalesReport {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub selection: FilterSelection,
    pub feed_records: usize,
    pub filter_options: FilterOptions,
    pub aggregates: AggregateResult,
}
