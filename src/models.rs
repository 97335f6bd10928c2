// src/models.rs
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ReportError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub symbol: String,
    pub name: String,
    pub country: String,
}

impl IndexDescriptor {
    pub fn new(symbol: &str, name: &str, country: &str) -> Self {
        IndexDescriptor {
            symbol: symbol.to_string(),
            name: name.to_string(),
            country: country.to_string(),
        }
    }
}

/// Calendar month, stored as the first day of that month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth(NaiveDate);

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(YearMonth)
    }

    pub fn from_date(date: NaiveDate) -> Self {
        YearMonth(date.with_day(1).unwrap_or(date))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    pub fn next(&self) -> Option<Self> {
        if self.month() == 12 {
            YearMonth::new(self.year() + 1, 1)
        } else {
            YearMonth::new(self.year(), self.month() + 1)
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m"))
    }
}

impl FromStr for YearMonth {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let full = if s.len() == 7 { format!("{}-01", s) } else { s.to_string() };
        NaiveDate::parse_from_str(&full, "%Y-%m-%d")
            .map(YearMonth::from_date)
            .map_err(|e| ReportError::InvalidInput(format!("bad year-month '{}': {}", s, e)))
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyObservation {
    pub date: YearMonth,
    pub value: f64,
}

/// One analyzed index. The derived fields are filled by
/// `services::analytics::compute_metrics` and are never trusted from input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexRecord {
    #[serde(flatten)]
    pub descriptor: IndexDescriptor,
    #[serde(default)]
    pub start_value: f64,
    #[serde(default)]
    pub end_value: f64,
    #[serde(default)]
    pub total_return: f64,
    #[serde(default)]
    pub annualized_return: f64,
    #[serde(default)]
    pub volatility: f64,
    pub monthly_data: Vec<MonthlyObservation>,
}

impl IndexRecord {
    pub fn new(descriptor: IndexDescriptor, monthly_data: Vec<MonthlyObservation>) -> Self {
        let start_value = monthly_data.first().map(|o| o.value).unwrap_or(0.0);
        IndexRecord {
            descriptor,
            start_value,
            end_value: 0.0,
            total_return: 0.0,
            annualized_return: 0.0,
            volatility: 0.0,
            monthly_data,
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Length of the series in years (observations / 12).
    pub fn years(&self) -> f64 {
        self.monthly_data.len() as f64 / 12.0
    }

    pub fn date_range(&self) -> Option<(YearMonth, YearMonth)> {
        match (self.monthly_data.first(), self.monthly_data.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date)),
            _ => None,
        }
    }
}

/// Row of `summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSummary {
    #[serde(flatten)]
    pub descriptor: IndexDescriptor,
    pub total_return: f64,
    pub annualized_return: f64,
    pub volatility: f64,
}

impl From<&IndexRecord> for IndexSummary {
    fn from(record: &IndexRecord) -> Self {
        IndexSummary {
            descriptor: record.descriptor.clone(),
            total_return: record.total_return,
            annualized_return: record.annualized_return,
            volatility: record.volatility,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedReport {
    pub sorted: Vec<IndexRecord>,
    pub best_performers: Vec<IndexRecord>,
    pub worst_performers: Vec<IndexRecord>,
}
