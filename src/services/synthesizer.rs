// src/services/synthesizer.rs
use log::{debug, info};
use rand::Rng;

use crate::error::{ReportError, Result};
use crate::models::{IndexDescriptor, IndexRecord, MonthlyObservation};
use crate::services::analytics::compute_metrics;
use crate::services::indices::SynthesisWindow;

const BASE_LEVEL_MIN: u32 = 1000;
const BASE_LEVEL_MAX: u32 = 5000;
const ANNUAL_RETURN_MIN: f64 = -0.20;
const ANNUAL_RETURN_MAX: f64 = 0.40;
// Keeps every monthly growth factor above zero for any annual target in range.
const MONTHLY_NOISE: f64 = 0.01;

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Equivalent compounding monthly rate for an annual return.
pub fn monthly_rate(annual_return: f64) -> f64 {
    (1.0 + annual_return).powf(1.0 / 12.0) - 1.0
}

/// Builds a plausible monthly price path for one index.
///
/// Values are random; only the shape is stable: one observation per month of
/// `window`, in order, all strictly positive. Metrics are not filled in.
pub fn synthesize_index<R: Rng + ?Sized>(
    descriptor: &IndexDescriptor,
    window: SynthesisWindow,
    rng: &mut R,
) -> Result<IndexRecord> {
    let mut month = window.first_month().ok_or_else(|| {
        ReportError::InvalidInput(format!("invalid synthesis start year {}", window.start_year))
    })?;

    let base_level = rng.gen_range(BASE_LEVEL_MIN..BASE_LEVEL_MAX) as f64;
    let annual_returns: Vec<f64> = (0..window.years)
        .map(|_| rng.gen_range(ANNUAL_RETURN_MIN..ANNUAL_RETURN_MAX))
        .collect();

    let mut monthly_data = Vec::with_capacity(window.months());
    let mut current_value = base_level;

    for annual_return in &annual_returns {
        let rate = monthly_rate(*annual_return);
        for _ in 0..12 {
            let noise = rng.gen_range(-MONTHLY_NOISE..MONTHLY_NOISE);
            current_value *= 1.0 + rate + noise;
            monthly_data.push(MonthlyObservation {
                date: month,
                value: round_cents(current_value),
            });
            month = month
                .next()
                .ok_or_else(|| ReportError::InvalidInput(format!("calendar overflow after {}", month)))?;
        }
    }

    debug!(
        "Synthesized {} months for {} from base level {}",
        monthly_data.len(),
        descriptor.symbol,
        base_level
    );

    Ok(IndexRecord::new(descriptor.clone(), monthly_data))
}

/// Synthesizes and analyzes a record for every descriptor.
pub fn generate_mock_data<R: Rng + ?Sized>(
    descriptors: &[IndexDescriptor],
    window: SynthesisWindow,
    rng: &mut R,
) -> Result<Vec<IndexRecord>> {
    info!(
        "Generating mock data for {} indices ({} months from {})",
        descriptors.len(),
        window.months(),
        window.start_year
    );

    descriptors
        .iter()
        .map(|descriptor| synthesize_index(descriptor, window, rng).and_then(compute_metrics))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::indices::default_indices;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn generated_series_are_positive_and_chronological() {
        for seed in 0..25 {
            let mut rng = StdRng::seed_from_u64(seed);
            let records = generate_mock_data(&default_indices(), SynthesisWindow::default(), &mut rng).unwrap();
            assert_eq!(records.len(), 10);

            for record in &records {
                assert_eq!(record.monthly_data.len(), 120);
                assert!(record.monthly_data.iter().all(|o| o.value > 0.0));

                let (first, last) = record.date_range().unwrap();
                assert_eq!(first.to_string(), "2013-01");
                assert_eq!(last.to_string(), "2022-12");
                for pair in record.monthly_data.windows(2) {
                    assert_eq!(pair[0].date.next(), Some(pair[1].date));
                }
            }
        }
    }

    #[test]
    fn prices_are_rounded_to_cents() {
        let mut rng = StdRng::seed_from_u64(7);
        let descriptor = IndexDescriptor::new("SPX", "S&P 500", "United States");
        let record = synthesize_index(&descriptor, SynthesisWindow::default(), &mut rng).unwrap();
        for obs in &record.monthly_data {
            let cents = obs.value * 100.0;
            assert!((cents - cents.round()).abs() < 1e-6);
        }
        assert_eq!(record.start_value, record.monthly_data[0].value);
    }

    #[test]
    fn same_seed_same_series() {
        let descriptor = IndexDescriptor::new("DAX", "DAX", "Germany");
        let a = synthesize_index(&descriptor, SynthesisWindow::default(), &mut StdRng::seed_from_u64(99)).unwrap();
        let b = synthesize_index(&descriptor, SynthesisWindow::default(), &mut StdRng::seed_from_u64(99)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn first_step_stays_within_bounds() {
        // One step from the base level can move at most by the largest monthly rate plus noise.
        let max_step = 1.0 + monthly_rate(ANNUAL_RETURN_MAX) + MONTHLY_NOISE;
        let min_step = 1.0 + monthly_rate(ANNUAL_RETURN_MIN) - MONTHLY_NOISE;
        assert!(min_step > 0.0);

        let mut rng = StdRng::seed_from_u64(3);
        let descriptor = IndexDescriptor::new("HSI", "Hang Seng Index", "Hong Kong");
        let record = synthesize_index(&descriptor, SynthesisWindow::default(), &mut rng).unwrap();
        let first = record.monthly_data[0].value;
        assert!(first >= BASE_LEVEL_MIN as f64 * min_step - 0.01);
        assert!(first <= BASE_LEVEL_MAX as f64 * max_step + 0.01);
    }

    #[test]
    fn monthly_rate_compounds_to_annual() {
        let rate = monthly_rate(0.25);
        assert!(((1.0 + rate).powi(12) - 1.25).abs() < 1e-12);
    }

    #[test]
    fn mock_data_carries_metrics() {
        let mut rng = StdRng::seed_from_u64(11);
        let records = generate_mock_data(&default_indices(), SynthesisWindow::default(), &mut rng).unwrap();
        for record in records {
            assert!((record.total_return - (record.end_value / record.start_value - 1.0)).abs() < 1e-9);
            assert!(record.volatility > 0.0);
        }
    }
}
