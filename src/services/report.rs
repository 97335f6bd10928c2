// src/services/report.rs
use chrono::{NaiveDate, Utc};
use log::info;
use std::path::{Path, PathBuf};

use crate::error::{ReportError, Result};
use crate::models::{IndexRecord, RankedReport, YearMonth};
use crate::services::charts;

const DEFAULT_TITLE: &str = "Global Stock Market Indices: 10-Year Performance Analysis";
const DEFAULT_TEMPLATE: &str = include_str!("report_template.html");
const DISCLAIMER: &str = "Disclaimer: This report is for informational purposes only and does not constitute investment advice. \
Past performance is not indicative of future results. Investors should conduct their own research or \
consult with a financial advisor before making investment decisions.";

const BEST_NARRATIVES: [&str; 2] = [
    "has shown exceptional performance over the last decade, driven by strong economic growth, technological innovation, and favorable monetary policies.",
    "has delivered consistent growth throughout the decade, benefiting from strong market fundamentals and strategic sectoral positioning.",
];
const WORST_NARRATIVES: [&str; 2] = [
    "has underperformed relative to other global indices, facing challenges from economic uncertainty, regulatory pressures, and structural market changes.",
    "has struggled with consistent growth, impacted by geopolitical tensions, currency fluctuations, and sector-specific challenges.",
];

pub struct ReportOptions {
    pub title: String,
    pub generated_on: NaiveDate,
    pub output: Option<PathBuf>,
    pub template_path: Option<PathBuf>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            generated_on: Utc::now().date_naive(),
            output: None,
            template_path: None,
        }
    }
}

impl ReportOptions {
    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_output<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_template_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.template_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_generated_on(mut self, date: NaiveDate) -> Self {
        self.generated_on = date;
        self
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn signed_class(value: f64) -> &'static str {
    if value >= 0.0 {
        "text-success"
    } else {
        "text-danger"
    }
}

fn date_span(records: &[IndexRecord]) -> Option<(YearMonth, YearMonth)> {
    let first = records.iter().filter_map(|r| r.date_range()).map(|(f, _)| f).min()?;
    let last = records.iter().filter_map(|r| r.date_range()).map(|(_, l)| l).max()?;
    Some((first, last))
}

fn span_years(records: &[IndexRecord]) -> u32 {
    records
        .first()
        .map(|r| r.years().round().max(1.0) as u32)
        .unwrap_or(10)
}

/// Percentage-point gap between the best and the worst total return.
pub fn performance_spread(report: &RankedReport) -> f64 {
    match (report.best_performers.first(), report.worst_performers.first()) {
        (Some(best), Some(worst)) => (best.total_return - worst.total_return) * 100.0,
        _ => 0.0,
    }
}

fn build_introduction(count: usize, years: u32, span: &str) -> String {
    format!(
        "<p>This report analyzes the performance of {count} major global stock market indices over \
the past {years} years ({span}). The analysis focuses on identifying the best and worst performing \
indices, explaining volatility factors, and providing fundamental analysis of market behavior.</p>",
        count = count,
        years = years,
        span = span
    )
}

fn build_overview_table(sorted: &[IndexRecord], years: u32) -> String {
    let mut html = String::new();
    html.push_str("<table><thead><tr><th>Index</th><th>Country</th>");
    html.push_str(&format!(
        r#"<th class="num">{}-Year Return</th><th class="num">Annualized Return</th><th class="num">Volatility</th></tr></thead><tbody>"#,
        years
    ));

    let n = sorted.len();
    for (i, record) in sorted.iter().enumerate() {
        let row_class = if i < 2 {
            r#" class="table-success""#
        } else if i + 2 >= n {
            r#" class="table-danger""#
        } else {
            ""
        };
        html.push_str(&format!(
            r#"<tr{row_class}><td><strong>{name}</strong></td><td>{country}</td><td class="num"><span class="{tc}">{total}</span></td><td class="num"><span class="{ac}">{annual}</span></td><td class="num"><span class="text-secondary">{vol}</span></td></tr>"#,
            row_class = row_class,
            name = escape_html(record.name()),
            country = escape_html(&record.descriptor.country),
            tc = signed_class(record.total_return),
            total = pct(record.total_return),
            ac = signed_class(record.annualized_return),
            annual = pct(record.annualized_return),
            vol = pct(record.volatility),
        ));
    }

    html.push_str("</tbody></table>");
    html
}

fn build_performer_card(record: &IndexRecord, years: u32, narrative: &str, color: &str, value_class: &str) -> String {
    format!(
        r#"<div class="card"><h3>{name} <small class="text-secondary">({country})</small></h3><div class="stats"><div class="stat-item"><span class="stat-label">{years}-Year Return:</span><span class="stat-value {vc}">{total}</span></div><div class="stat-item"><span class="stat-label">Annualized Return:</span><span class="stat-value {vc}">{annual}</span></div><div class="stat-item"><span class="stat-label">Volatility:</span><span class="stat-value">{vol}</span></div></div>{chart}<p class="mt-3">The {name} {narrative}</p></div>"#,
        name = escape_html(record.name()),
        country = escape_html(&record.descriptor.country),
        years = years,
        vc = value_class,
        total = pct(record.total_return),
        annual = pct(record.annualized_return),
        vol = pct(record.volatility),
        chart = charts::performer_chart(record, color),
        narrative = narrative,
    )
}

fn build_performers(records: &[IndexRecord], years: u32, narratives: &[&str; 2], color: &str, value_class: &str) -> String {
    let mut html = String::from(r#"<div class="performers">"#);
    for (i, record) in records.iter().enumerate() {
        html.push_str(&build_performer_card(
            record,
            years,
            narratives[i.min(narratives.len() - 1)],
            color,
            value_class,
        ));
    }
    html.push_str("</div>");
    html
}

fn bullet_list(items: &[&str]) -> String {
    let mut html = String::from(r#"<ul class="analysis-list">"#);
    for item in items {
        html.push_str("<li>");
        html.push_str(item);
        html.push_str("</li>");
    }
    html.push_str("</ul>");
    html
}

struct Names {
    best1: String,
    best2: String,
    worst1: String,
    worst2: String,
}

impl Names {
    fn from_report(report: &RankedReport) -> Self {
        let name_at = |list: &[IndexRecord], i: usize| {
            list.get(i)
                .or_else(|| list.last())
                .map(|r| escape_html(r.name()))
                .unwrap_or_default()
        };
        Names {
            best1: name_at(report.best_performers.as_slice(), 0),
            best2: name_at(report.best_performers.as_slice(), 1),
            worst1: name_at(report.worst_performers.as_slice(), 0),
            worst2: name_at(report.worst_performers.as_slice(), 1),
        }
    }
}

fn build_economic_factors(names: &Names, span: &str) -> String {
    format!(
        r#"<h4 class="analysis-title">Global Economic Trends ({span})</h4><p>The past decade has witnessed significant economic events that shaped the performance of global stock indices:</p>{list}<p>These factors have contributed significantly to the divergent performance between indices like {best} and {worst}.</p>"#,
        span = span,
        list = bullet_list(&[
            "<strong>Post-2008 Recovery (2013-2015):</strong> Many markets experienced strong growth as they recovered from the global financial crisis.",
            "<strong>Monetary Policies:</strong> Central banks maintained historically low interest rates for much of the decade, boosting equities.",
            "<strong>Trade Tensions (2018-2019):</strong> US-China trade disputes created volatility across global markets.",
            "<strong>COVID-19 Pandemic (2020):</strong> A sharp market decline followed by unprecedented recovery supported by massive fiscal stimulus.",
            "<strong>Inflation Concerns (2021-2023):</strong> Rising inflation and subsequent monetary tightening affected market performance.",
        ]),
        best = names.best1,
        worst = names.worst1,
    )
}

fn build_market_sentiment(names: &Names) -> String {
    format!(
        r#"<h4 class="analysis-title">Sentiment Analysis</h4><p>Market sentiment has varied widely across different regions:</p>{list}<p>Sentiment indicators show that {b1} and {b2} benefited from sustained positive investor outlook, while {w1} and {w2} faced more cautious or negative sentiment during significant periods.</p>"#,
        list = bullet_list(&[
            "<strong>US Markets:</strong> Generally bullish sentiment driven by tech sector dominance and strong corporate earnings.",
            "<strong>European Markets:</strong> Mixed sentiment with periodic concerns about economic growth, Brexit, and political stability.",
            "<strong>Asian Markets:</strong> Variable sentiment influenced by regulatory changes, property market concerns, and regional geopolitics.",
        ]),
        b1 = names.best1,
        b2 = names.best2,
        w1 = names.worst1,
        w2 = names.worst2,
    )
}

fn build_sectoral_analysis(names: &Names) -> String {
    format!(
        r#"<h4 class="analysis-title">Sector Performance Differences</h4><p>Sector composition has been a key differentiator in index performance:</p>{list}<p>The superior performance of {best} can be partially attributed to its favorable sector allocation, with greater exposure to high-growth industries.</p>"#,
        list = bullet_list(&[
            "<strong>Technology Sector:</strong> Indices with higher technology weighting (like NASDAQ) have generally outperformed.",
            "<strong>Financial Services:</strong> Performance varied based on interest rate environments and regulatory landscapes.",
            "<strong>Energy Sector:</strong> Significant volatility due to oil price fluctuations and the energy transition.",
            "<strong>Healthcare:</strong> Generally resilient performance, especially during the pandemic period.",
        ]),
        best = names.best1,
    )
}

fn build_volatility_explanation(names: &Names) -> String {
    format!(
        r#"<h4 class="analysis-title">Understanding Index Volatility</h4><p>Volatility differences between indices reflect their unique risk profiles:</p>{list}<p>The observed volatility patterns align with historical risk-return relationships, where higher-returning indices like {best} have sometimes exhibited higher volatility, though not always proportionally.</p>"#,
        list = bullet_list(&[
            "<strong>Market Structure:</strong> Some markets have higher retail investor participation, leading to greater volatility.",
            "<strong>Liquidity Factors:</strong> More liquid markets tend to experience less extreme price movements.",
            "<strong>Economic Stability:</strong> Indices in economies with greater policy certainty often show lower volatility.",
            "<strong>Sector Composition:</strong> Technology-heavy indices typically exhibit higher volatility than those dominated by utilities or consumer staples.",
        ]),
        best = names.best1,
    )
}

fn build_conclusion(report: &RankedReport) -> String {
    let spread = format!(
        "Significant performance divergence between top and bottom-performing indices, with a difference of approximately {:.2} percentage points in total return.",
        performance_spread(report)
    );
    format!(
        "<p>This analysis reveals several key insights about global market performance over the past decade:</p>{list}<p>Investors should consider these findings when constructing globally diversified portfolios, recognizing both the opportunities and risks presented by different market indices.</p>",
        list = bullet_list(&[
            spread.as_str(),
            "The importance of sector allocation in driving returns, particularly exposure to technology and growth sectors.",
            "The impact of regional economic policies and structural market differences on long-term performance.",
            "The relationship between volatility and returns has not always been linear, challenging conventional risk-return assumptions.",
        ]),
    )
}

/// Replaces every `{{key}}` in one pass over the template. Inserted values are
/// never scanned again; unknown keys are left as they are.
fn fill_template(template: &str, values: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            out.push_str(&rest[open..]);
            return out;
        };
        let key = &after[..close];
        match values.iter().find(|(k, _)| *k == key) {
            Some((_, value)) => out.push_str(value),
            None => {
                out.push_str("{{");
                out.push_str(key);
                out.push_str("}}");
            }
        }
        rest = &after[close + 2..];
    }

    out.push_str(rest);
    out
}

/// Renders the full HTML page for a ranked report. When `options.output` is
/// set the page is also written to that path.
pub fn render_report(report: &RankedReport, options: &ReportOptions) -> Result<String> {
    let (first, last) = date_span(&report.sorted)
        .ok_or_else(|| ReportError::InvalidInput("report has no observations".to_string()))?;

    let tpl = if let Some(path) = &options.template_path {
        std::fs::read_to_string(path)?
    } else {
        DEFAULT_TEMPLATE.to_string()
    };

    let years = span_years(&report.sorted);
    let span = format!("{}-{}", first.year(), last.year());
    let names = Names::from_report(report);

    let values: Vec<(&str, String)> = vec![
        ("title", escape_html(&options.title)),
        ("generated_on", options.generated_on.format("%B %d, %Y").to_string()),
        ("date_range", format!("{} to {}", first, last)),
        ("introduction", build_introduction(report.sorted.len(), years, &span)),
        ("overview_table", build_overview_table(&report.sorted, years)),
        ("performance_chart", charts::performance_comparison(&report.sorted)),
        ("volatility_chart", charts::risk_return_scatter(&report.sorted)),
        (
            "best_performers",
            build_performers(&report.best_performers, years, &BEST_NARRATIVES, charts::BEST_COLOR, "text-success"),
        ),
        (
            "worst_performers",
            build_performers(&report.worst_performers, years, &WORST_NARRATIVES, charts::WORST_COLOR, "text-danger"),
        ),
        ("economic_factors", build_economic_factors(&names, &span)),
        ("market_sentiment", build_market_sentiment(&names)),
        ("sectoral_analysis", build_sectoral_analysis(&names)),
        ("volatility_explanation", build_volatility_explanation(&names)),
        ("conclusion", build_conclusion(report)),
        ("disclaimer", DISCLAIMER.to_string()),
    ];
    let tpl = fill_template(&tpl, &values);

    if let Some(path) = &options.output {
        std::fs::write(path, &tpl)?;
        info!("Wrote HTML report ({} bytes) to {}", tpl.len(), path.display());
    }

    Ok(tpl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IndexDescriptor, MonthlyObservation};
    use crate::services::analytics::analyze;

    fn record(symbol: &str, name: &str, end: f64) -> IndexRecord {
        let mut month = YearMonth::new(2013, 1).unwrap();
        let mut data = Vec::new();
        for i in 0..24 {
            let value = 100.0 + (end - 100.0) * i as f64 / 23.0;
            data.push(MonthlyObservation { date: month, value });
            month = month.next().unwrap();
        }
        IndexRecord::new(IndexDescriptor::new(symbol, name, "Somewhere"), data)
    }

    fn sample_report() -> RankedReport {
        analyze(vec![
            record("A", "Alpha", 150.0),
            record("B", "Beta <B>", 80.0),
            record("C", "Gamma", 120.0),
            record("D", "Delta", 60.0),
            record("E", "Epsilon", 100.5),
        ])
        .unwrap()
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn renders_every_section() {
        let report = sample_report();
        let options = ReportOptions::default()
            .with_generated_on(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        let html = render_report(&report, &options).unwrap();

        assert!(!html.contains("{{"));
        assert!(html.contains("March 05, 2024"));
        assert!(html.contains("2013-01 to 2014-12"));
        assert!(html.contains("Beta &lt;B&gt;"));
        assert!(!html.contains("Beta <B>"));
        assert_eq!(html.matches("table-success").count(), 3); // 2 rows + stylesheet
        assert_eq!(html.matches(r#"class="table-danger""#).count(), 2);
        assert!(html.contains("The Alpha has shown exceptional performance"));
        assert!(html.contains("The Delta has underperformed"));
        assert!(html.contains("2-Year Return"));
    }

    #[test]
    fn conclusion_quotes_best_minus_worst() {
        let report = sample_report();
        // Alpha +50%, Delta -40%
        assert!((performance_spread(&report) - 90.0).abs() < 1e-9);
        let html = render_report(&report, &ReportOptions::default()).unwrap();
        assert!(html.contains("approximately 90.00 percentage points"));
    }

    #[test]
    fn writes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.html");
        let html = render_report(&sample_report(), &ReportOptions::default().with_output(&path)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), html);
    }

    #[test]
    fn placeholders_in_title_are_not_expanded() {
        let options = ReportOptions::default().with_title("Report {{conclusion}} {{disclaimer}}");
        let html = render_report(&sample_report(), &options).unwrap();
        assert!(html.contains("<h1>Report {{conclusion}} {{disclaimer}}</h1>"));
        assert_eq!(html.matches("approximately 90.00 percentage points").count(), 1);
        assert_eq!(html.matches("Disclaimer:").count(), 1);
    }

    #[test]
    fn fill_template_is_single_pass() {
        let values = vec![("a", "{{b}}".to_string()), ("b", "B".to_string())];
        assert_eq!(fill_template("[{{a}}|{{b}}|{{c}}|{{open", &values), "[{{b}}|B|{{c}}|{{open");
    }

    #[test]
    fn custom_template_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let tpl = dir.path().join("tpl.html");
        std::fs::write(&tpl, "<h1>{{title}}</h1>{{conclusion}}").unwrap();
        let html = render_report(
            &sample_report(),
            &ReportOptions::default().with_title("Custom").with_template_path(&tpl),
        )
        .unwrap();
        assert!(html.starts_with("<h1>Custom</h1>"));
    }
}
