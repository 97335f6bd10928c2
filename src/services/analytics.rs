// src/services/analytics.rs
use log::{debug, error, warn};

use crate::error::{ReportError, Result};
use crate::models::{IndexRecord, IndexSummary, RankedReport};

const MONTHS_PER_YEAR: f64 = 12.0;

fn calculate_cagr(start_value: f64, end_value: f64, years: f64) -> f64 {
    (end_value / start_value).powf(1.0 / years) - 1.0
}

fn calculate_average(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Month-over-month simple returns: `(p[i] - p[i-1]) / p[i-1]`.
pub fn monthly_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

/// Population standard deviation of monthly returns, annualized by √12.
///
/// An empty return series (single observation) yields 0.0.
pub fn annualized_volatility(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }

    let mean = calculate_average(returns);
    let var = returns
        .iter()
        .map(|r| {
            let diff = r - mean;
            diff * diff
        })
        .sum::<f64>()
        / returns.len() as f64;

    var.sqrt() * MONTHS_PER_YEAR.sqrt()
}

fn validate_series(record: &IndexRecord) -> Result<()> {
    let symbol = &record.descriptor.symbol;

    if record.monthly_data.is_empty() {
        return Err(ReportError::InvalidInput(format!(
            "{}: monthly data is empty",
            symbol
        )));
    }

    if let Some(bad) = record
        .monthly_data
        .iter()
        .find(|o| !(o.value.is_finite() && o.value > 0.0))
    {
        return Err(ReportError::InvalidInput(format!(
            "{}: non-positive price {} at {}",
            symbol, bad.value, bad.date
        )));
    }

    if let Some(w) = record
        .monthly_data
        .windows(2)
        .find(|w| w[1].date <= w[0].date)
    {
        return Err(ReportError::InvalidInput(format!(
            "{}: observations out of order or duplicated at {} -> {}",
            symbol, w[0].date, w[1].date
        )));
    }

    Ok(())
}

/// Fills `start_value`, `end_value`, `total_return`, `annualized_return` and
/// `volatility` from `monthly_data`.
pub fn compute_metrics(mut record: IndexRecord) -> Result<IndexRecord> {
    validate_series(&record)?;

    let prices: Vec<f64> = record.monthly_data.iter().map(|o| o.value).collect();
    let start_value = prices[0];
    let end_value = prices[prices.len() - 1];
    let years = record.years();

    record.start_value = start_value;
    record.end_value = end_value;
    record.total_return = end_value / start_value - 1.0;
    record.annualized_return = calculate_cagr(start_value, end_value, years);
    record.volatility = annualized_volatility(&monthly_returns(&prices));

    debug!(
        "{}: total {:.4}, annualized {:.4}, volatility {:.4}",
        record.descriptor.symbol, record.total_return, record.annualized_return, record.volatility
    );

    Ok(record)
}

/// Sorts by total return (descending, stable) and picks the two best and the
/// two worst records. The worst list starts with the single worst record.
pub fn rank_and_select(records: &[IndexRecord]) -> Result<RankedReport> {
    if records.is_empty() {
        return Err(ReportError::InvalidInput(
            "cannot rank an empty collection of indices".to_string(),
        ));
    }
    if records.len() < 4 {
        warn!(
            "Only {} indices supplied; best and worst performers will overlap",
            records.len()
        );
    }

    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| b.total_return.total_cmp(&a.total_return));

    let best_performers: Vec<IndexRecord> = sorted.iter().take(2).cloned().collect();
    let worst_performers: Vec<IndexRecord> = sorted.iter().rev().take(2).cloned().collect();

    Ok(RankedReport {
        sorted,
        best_performers,
        worst_performers,
    })
}

/// Computes metrics for every record and ranks the valid ones.
///
/// An invalid record is logged and dropped. If records were supplied but none
/// of them is valid, the build is `DataUnavailable`.
pub fn analyze(records: Vec<IndexRecord>) -> Result<RankedReport> {
    let supplied = records.len();
    let mut analyzed = Vec::with_capacity(supplied);
    for record in records {
        let symbol = record.descriptor.symbol.clone();
        match compute_metrics(record) {
            Ok(record) => analyzed.push(record),
            Err(e) => error!("Dropping {} from the report: {}", symbol, e),
        }
    }

    if supplied > 0 && analyzed.is_empty() {
        return Err(ReportError::DataUnavailable(format!(
            "none of the {} supplied indices has a valid series",
            supplied
        )));
    }
    rank_and_select(&analyzed)
}

/// Summary rows, best to worst.
pub fn summarize(records: &[IndexRecord]) -> Vec<IndexSummary> {
    let mut rows: Vec<IndexSummary> = records.iter().map(IndexSummary::from).collect();
    rows.sort_by(|a, b| b.total_return.total_cmp(&a.total_return));
    rows
}
