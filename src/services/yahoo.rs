// src/services/yahoo.rs
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use chrono_tz::Tz;
use log::{error, info, warn};
use reqwest::Client;
use serde::Deserialize;

use crate::error::{ReportError, Result};
use crate::models::{IndexDescriptor, IndexRecord, MonthlyObservation, YearMonth};
use crate::services::analytics::compute_metrics;

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// The report's indices keyed by their Yahoo Finance tickers.
pub fn yahoo_indices() -> Vec<IndexDescriptor> {
    vec![
        IndexDescriptor::new("^GSPC", "S&P 500", "United States"),
        IndexDescriptor::new("^DJI", "Dow Jones Industrial Average", "United States"),
        IndexDescriptor::new("^IXIC", "NASDAQ Composite", "United States"),
        IndexDescriptor::new("^FTSE", "FTSE 100", "United Kingdom"),
        IndexDescriptor::new("^GDAXI", "DAX", "Germany"),
        IndexDescriptor::new("^FCHI", "CAC 40", "France"),
        IndexDescriptor::new("^N225", "Nikkei 225", "Japan"),
        IndexDescriptor::new("^HSI", "Hang Seng Index", "Hong Kong"),
        IndexDescriptor::new("^SSEC", "Shanghai Composite", "China"),
        IndexDescriptor::new("^BSESN", "BSE SENSEX", "India"),
    ]
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    exchange_timezone_name: Option<String>,
    #[serde(rename = "gmtoffset")]
    gmt_offset: Option<i32>,
}

/// Zone the exchange stamps its bars in. Monthly bars sit at local midnight
/// on the first of the month, so the month must be read in this zone.
#[derive(Debug, Clone, Copy)]
enum ExchangeZone {
    Named(Tz),
    Offset(FixedOffset),
    Universal,
}

impl ExchangeZone {
    fn from_meta(meta: Option<&ChartMeta>) -> Self {
        let Some(meta) = meta else {
            return ExchangeZone::Universal;
        };
        if let Some(name) = &meta.exchange_timezone_name {
            match name.parse::<Tz>() {
                Ok(tz) => return ExchangeZone::Named(tz),
                Err(e) => warn!("Unknown exchange time zone {}: {}", name, e),
            }
        }
        match meta.gmt_offset.and_then(FixedOffset::east_opt) {
            Some(offset) => ExchangeZone::Offset(offset),
            None => ExchangeZone::Universal,
        }
    }

    fn local_date(&self, timestamp: i64) -> Option<NaiveDate> {
        let utc = DateTime::<Utc>::from_timestamp(timestamp, 0)?;
        Some(match self {
            ExchangeZone::Named(tz) => utc.with_timezone(tz).date_naive(),
            ExchangeZone::Offset(offset) => utc.with_timezone(offset).date_naive(),
            ExchangeZone::Universal => utc.date_naive(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
    #[serde(default)]
    adjclose: Vec<AdjClose>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Turns a chart API body into month-keyed observations.
///
/// Months are read in the exchange's own time zone. Adjusted close wins over
/// close; null points are skipped, and when two points land in the same month
/// the later one is kept.
pub fn parse_monthly_chart(body: &str) -> Result<Vec<MonthlyObservation>> {
    let response: ChartResponse = serde_json::from_str(body)?;

    if let Some(err) = response.chart.error {
        return Err(ReportError::DataUnavailable(format!(
            "{}: {}",
            err.code, err.description
        )));
    }

    let result = response
        .chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
        .ok_or_else(|| ReportError::DataUnavailable("chart response has no result".to_string()))?;

    let closes: &[Option<f64>] = match result.indicators.adjclose.first() {
        Some(adj) if !adj.adjclose.is_empty() => &adj.adjclose,
        _ => result
            .indicators
            .quote
            .first()
            .map(|q| q.close.as_slice())
            .unwrap_or(&[]),
    };

    let zone = ExchangeZone::from_meta(result.meta.as_ref());
    let mut observations: Vec<MonthlyObservation> = Vec::new();
    for (ts, close) in result.timestamp.iter().zip(closes.iter()) {
        let Some(value) = close.filter(|v| v.is_finite() && *v > 0.0) else {
            continue;
        };
        let Some(date) = zone.local_date(*ts) else {
            warn!("Skipping unrepresentable timestamp {}", ts);
            continue;
        };
        let month = YearMonth::from_date(date);
        let obs = MonthlyObservation {
            date: month,
            value: round_cents(value),
        };
        match observations.last_mut() {
            Some(last) if last.date == month => *last = obs,
            _ => observations.push(obs),
        }
    }

    if observations.is_empty() {
        return Err(ReportError::DataUnavailable("chart response has no prices".to_string()));
    }

    Ok(observations)
}

pub struct YahooClient {
    client: Client,
}

impl YahooClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(YahooClient { client })
    }

    /// Downloads monthly closes for one ticker between `start` and `end`.
    pub async fn fetch_monthly(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MonthlyObservation>> {
        let period1 = start.and_hms_opt(0, 0, 0).map(|d| d.and_utc().timestamp()).unwrap_or(0);
        let period2 = end.and_hms_opt(0, 0, 0).map(|d| d.and_utc().timestamp()).unwrap_or(0);
        let url = format!("{}/{}", CHART_URL, symbol);
        info!("Fetching monthly chart for {} from {}", symbol, url);

        let body = self
            .client
            .get(&url)
            .query(&[
                ("interval", "1mo".to_string()),
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("events", "history".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_monthly_chart(&body)
    }

    /// Fetches and analyzes every index; failures are logged and skipped.
    pub async fn fetch_indices(
        &self,
        descriptors: &[IndexDescriptor],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<IndexRecord> {
        let mut records = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            info!("Fetching data for {}...", descriptor.name);
            let outcome = self
                .fetch_monthly(&descriptor.symbol, start, end)
                .await
                .and_then(|data| compute_metrics(IndexRecord::new(descriptor.clone(), data)));
            match outcome {
                Ok(record) => {
                    info!("Successfully processed {}.", descriptor.name);
                    records.push(record);
                }
                Err(e) => error!("Error processing {}: {}", descriptor.name, e),
            }
        }
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2013-01-01, 2013-02-01, 2013-03-01, 2013-03-15 (UTC)
    const BODY: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "^GSPC"},
                "timestamp": [1356998400, 1359676800, 1362096000, 1363305600],
                "indicators": {
                    "quote": [{"close": [1498.11, null, 1569.19, 1560.70]}],
                    "adjclose": [{"adjclose": [1498.111, null, 1569.187, 1560.704]}]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn parses_adjusted_closes_and_skips_nulls() {
        let data = parse_monthly_chart(BODY).unwrap();
        let dates: Vec<String> = data.iter().map(|o| o.date.to_string()).collect();
        assert_eq!(dates, vec!["2013-01", "2013-03"]);
        assert_eq!(data[0].value, 1498.11);
        // later point in the same month wins
        assert_eq!(data[1].value, 1560.7);
    }

    fn months(data: &[MonthlyObservation]) -> Vec<String> {
        data.iter().map(|o| o.date.to_string()).collect()
    }

    #[test]
    fn tokyo_bars_stay_in_their_own_month() {
        // 2013-01-01, 2013-02-01, 2013-03-01 at 00:00 JST
        let body = r#"{"chart":{"result":[{
            "meta": {"symbol": "^N225", "exchangeTimezoneName": "Asia/Tokyo", "gmtoffset": 32400},
            "timestamp": [1356966000, 1359644400, 1362063600],
            "indicators": {"quote": [{"close": [10604.5, 11559.36, 12397.91]}]}
        }],"error":null}}"#;
        let data = parse_monthly_chart(body).unwrap();
        assert_eq!(months(&data), vec!["2013-01", "2013-02", "2013-03"]);
        assert_eq!(data[0].value, 10604.5);
    }

    #[test]
    fn london_summer_time_keeps_every_month() {
        // 2013-03-01 00:00 GMT, then 2013-04-01 and 2013-05-01 at 00:00 BST
        let body = r#"{"chart":{"result":[{
            "meta": {"symbol": "^FTSE", "exchangeTimezoneName": "Europe/London", "gmtoffset": 3600},
            "timestamp": [1362096000, 1364770800, 1367362800],
            "indicators": {"quote": [{"close": [6411.74, 6430.12, 6583.09]}]}
        }],"error":null}}"#;
        let data = parse_monthly_chart(body).unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(months(&data), vec!["2013-03", "2013-04", "2013-05"]);
        assert_eq!(data[0].value, 6411.74);
        assert_eq!(data[1].value, 6430.12);
    }

    #[test]
    fn gmt_offset_used_without_zone_name() {
        let body = r#"{"chart":{"result":[{
            "meta": {"gmtoffset": 32400},
            "timestamp": [1356966000, 1359644400],
            "indicators": {"quote": [{"close": [100.0, 101.0]}]}
        }],"error":null}}"#;
        let data = parse_monthly_chart(body).unwrap();
        assert_eq!(months(&data), vec!["2013-01", "2013-02"]);
    }

    #[test]
    fn falls_back_to_close() {
        let body = r#"{"chart":{"result":[{"timestamp":[1356998400],
            "indicators":{"quote":[{"close":[100.456]}]}}],"error":null}}"#;
        let data = parse_monthly_chart(body).unwrap();
        assert_eq!(data[0].value, 100.46);
    }

    #[test]
    fn api_error_is_unavailable() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#;
        assert!(matches!(parse_monthly_chart(body), Err(ReportError::DataUnavailable(_))));
    }

    #[test]
    fn tickers_cover_ten_indices() {
        let indices = yahoo_indices();
        assert_eq!(indices.len(), 10);
        assert!(indices.iter().all(|i| i.symbol.starts_with('^')));
    }
}
