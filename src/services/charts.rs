// src/services/charts.rs
//
// Static SVG charts embedded into the HTML report.
use crate::models::{IndexRecord, YearMonth};
use crate::services::report::escape_html;

const WIDTH: i32 = 720;
const HEIGHT: i32 = 360;
const SMALL_WIDTH: i32 = 480;
const SMALL_HEIGHT: i32 = 260;
const PADDING: f64 = 44.0;
const GRID_COLOR: &str = "#e5e5e5";
const COVID_MONTH: (i32, u32) = (2020, 3);

pub const CHART_COLORS: [&str; 10] = [
    "rgb(54, 162, 235)",
    "rgb(255, 99, 132)",
    "rgb(75, 192, 192)",
    "rgb(255, 159, 64)",
    "rgb(153, 102, 255)",
    "rgb(255, 205, 86)",
    "rgb(201, 203, 207)",
    "rgb(255, 99, 71)",
    "rgb(46, 139, 87)",
    "rgb(106, 90, 205)",
];
pub const BEST_COLOR: &str = "rgb(40, 167, 69)";
pub const WORST_COLOR: &str = "rgb(220, 53, 69)";

struct Frame {
    width: f64,
    height: f64,
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl Frame {
    fn new(width: i32, height: i32, (x_min, x_max): (f64, f64), (y_min, y_max): (f64, f64)) -> Self {
        Frame {
            width: width as f64,
            height: height as f64,
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    fn x(&self, value: f64) -> f64 {
        if (self.x_max - self.x_min).abs() < f64::EPSILON {
            return self.width / 2.0;
        }
        let inner = self.width - 2.0 * PADDING;
        PADDING + (value - self.x_min) / (self.x_max - self.x_min) * inner
    }

    fn y(&self, value: f64) -> f64 {
        if (self.y_max - self.y_min).abs() < f64::EPSILON {
            return self.height / 2.0;
        }
        let inner = self.height - 2.0 * PADDING;
        PADDING + (1.0 - (value - self.y_min) / (self.y_max - self.y_min)) * inner
    }
}

fn svg_header(width: i32, height: i32) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" role="img"><style>text{{font-family:Poppins,Arial,sans-serif;font-size:10px;fill:#555}}</style>"#,
        w = width,
        h = height
    )
}

fn svg_footer() -> &'static str {
    "</svg>"
}

fn wrap_plot(title: &str, svg_body: String) -> String {
    format!(
        r#"<figure class="chart"><figcaption class="chart-title">{title}</figcaption>{svg}</figure>"#,
        title = escape_html(title),
        svg = svg_body
    )
}

/// Min/max over finite values, widened when flat.
fn extent<I: IntoIterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    let mut min_v = f64::INFINITY;
    let mut max_v = f64::NEG_INFINITY;
    for v in values.into_iter().filter(|v| v.is_finite()) {
        min_v = min_v.min(v);
        max_v = max_v.max(v);
    }
    if !min_v.is_finite() || !max_v.is_finite() {
        return None;
    }
    if min_v == max_v {
        let adjust = if min_v == 0.0 { 1.0 } else { min_v.abs() * 0.1 };
        min_v -= adjust;
        max_v += adjust;
    }
    Some((min_v, max_v))
}

/// Months since year 0, used as a linear x coordinate.
fn month_ordinal(month: YearMonth) -> f64 {
    (month.year() as f64) * 12.0 + (month.month() as f64 - 1.0)
}

fn polyline(points: &[(f64, f64)], stroke: &str, width: f64) -> String {
    if points.is_empty() {
        return String::new();
    }
    let coords = points
        .iter()
        .map(|(x, y)| format!("{:.2},{:.2}", x, y))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        r#"<polyline fill="none" stroke="{stroke}" stroke-width="{width}" stroke-linejoin="round" points="{coords}" />"#,
        stroke = stroke,
        width = width,
        coords = coords
    )
}

fn area(points: &[(f64, f64)], baseline: f64, fill: &str) -> String {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return String::new();
    };
    let mut coords = format!("{:.2},{:.2} ", first.0, baseline);
    for (x, y) in points {
        coords.push_str(&format!("{:.2},{:.2} ", x, y));
    }
    coords.push_str(&format!("{:.2},{:.2}", last.0, baseline));
    format!(
        r#"<polygon fill="{fill}" fill-opacity="0.2" stroke="none" points="{coords}" />"#,
        fill = fill,
        coords = coords
    )
}

fn horizontal_grid(svg: &mut String, frame: &Frame, ticks: usize, fmt: impl Fn(f64) -> String) {
    for i in 0..=ticks {
        let value = frame.y_min + (frame.y_max - frame.y_min) * i as f64 / ticks as f64;
        let y = frame.y(value);
        svg.push_str(&format!(
            r#"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="{c}" stroke-width="0.5" />"#,
            x1 = PADDING,
            x2 = frame.width - PADDING,
            y = y,
            c = GRID_COLOR
        ));
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="end">{label}</text>"#,
            x = PADDING - 4.0,
            y = y + 3.0,
            label = fmt(value)
        ));
    }
}

/// Year labels along the bottom, every `step` years.
fn add_year_axis(svg: &mut String, frame: &Frame, first: YearMonth, last: YearMonth, step: i32) {
    let axis_y = frame.height - PADDING;
    svg.push_str(&format!(
        r##"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="#999" stroke-width="1" />"##,
        x1 = PADDING,
        x2 = frame.width - PADDING,
        y = axis_y
    ));

    let mut year = if first.month() == 1 { first.year() } else { first.year() + 1 };
    while year <= last.year() {
        if let Some(tick) = YearMonth::new(year, 1) {
            let x = frame.x(month_ordinal(tick));
            svg.push_str(&format!(
                r##"<line x1="{x:.2}" y1="{y1:.2}" x2="{x:.2}" y2="{y2:.2}" stroke="#999" stroke-width="1" />"##,
                x = x,
                y1 = axis_y,
                y2 = axis_y + 4.0
            ));
            svg.push_str(&format!(
                r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle">{year}</text>"#,
                x = x,
                y = axis_y + 16.0,
                year = year
            ));
        }
        year += step;
    }
}

fn axis_title(svg: &mut String, frame: &Frame, x_title: &str, y_title: &str) {
    svg.push_str(&format!(
        r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle">{t}</text>"#,
        x = frame.width / 2.0,
        y = frame.height - 6.0,
        t = escape_html(x_title)
    ));
    svg.push_str(&format!(
        r#"<text x="12" y="{y:.2}" text-anchor="middle" transform="rotate(-90 12 {y:.2})">{t}</text>"#,
        y = frame.height / 2.0,
        t = escape_html(y_title)
    ));
}

fn legend(svg: &mut String, entries: &[(&str, &str)]) {
    let x = PADDING + 10.0;
    let mut y = PADDING + 10.0;
    for (label, color) in entries {
        svg.push_str(&format!(
            r#"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="{color}" stroke-width="2" />"#,
            x1 = x,
            x2 = x + 16.0,
            y = y - 3.0,
            color = color
        ));
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}">{label}</text>"#,
            x = x + 20.0,
            y = y,
            label = escape_html(label)
        ));
        y += 13.0;
    }
}

/// Every index rebased to 100 at its first observation.
pub fn performance_comparison(records: &[IndexRecord]) -> String {
    let series: Vec<(&IndexRecord, Vec<(f64, f64)>)> = records
        .iter()
        .filter(|r| r.start_value > 0.0)
        .map(|r| {
            let points = r
                .monthly_data
                .iter()
                .map(|o| (month_ordinal(o.date), o.value / r.start_value * 100.0))
                .collect();
            (r, points)
        })
        .collect();

    let first = records.iter().filter_map(|r| r.date_range()).map(|(f, _)| f).min();
    let last = records.iter().filter_map(|r| r.date_range()).map(|(_, l)| l).max();
    let (Some(first), Some(last)) = (first, last) else {
        return String::new();
    };
    let Some(y_extent) = extent(series.iter().flat_map(|(_, p)| p.iter().map(|(_, y)| *y)).chain([100.0])) else {
        return String::new();
    };

    let frame = Frame::new(
        WIDTH,
        HEIGHT,
        (month_ordinal(first), month_ordinal(last)),
        y_extent,
    );

    let mut svg = svg_header(WIDTH, HEIGHT);
    horizontal_grid(&mut svg, &frame, 5, |v| format!("{:.0}", v));

    let mut entries = Vec::with_capacity(series.len());
    for (i, (record, points)) in series.iter().enumerate() {
        let color = CHART_COLORS[i % CHART_COLORS.len()];
        let scaled: Vec<(f64, f64)> = points.iter().map(|(x, y)| (frame.x(*x), frame.y(*y))).collect();
        svg.push_str(&polyline(&scaled, color, 1.5));
        entries.push((record.name(), color));
    }

    add_year_axis(&mut svg, &frame, first, last, 2);
    axis_title(&mut svg, &frame, "Year", "Normalized Value (Start = 100)");
    legend(&mut svg, &entries);
    svg.push_str(svg_footer());

    wrap_plot(
        &format!("{}-Year Performance Comparison ({}-{})", (last.year() - first.year() + 1), first.year(), last.year()),
        svg,
    )
}

/// Percent change from the first observation for one index, with a COVID-19
/// marker when March 2020 falls inside the series.
pub fn performer_chart(record: &IndexRecord, color: &str) -> String {
    let Some((first, last)) = record.date_range() else {
        return String::new();
    };
    if record.start_value <= 0.0 {
        return String::new();
    }

    let raw: Vec<(f64, f64)> = record
        .monthly_data
        .iter()
        .map(|o| (month_ordinal(o.date), (o.value / record.start_value - 1.0) * 100.0))
        .collect();
    let Some(y_extent) = extent(raw.iter().map(|(_, y)| *y).chain([0.0])) else {
        return String::new();
    };

    let frame = Frame::new(
        SMALL_WIDTH,
        SMALL_HEIGHT,
        (month_ordinal(first), month_ordinal(last)),
        y_extent,
    );
    let points: Vec<(f64, f64)> = raw.iter().map(|(x, y)| (frame.x(*x), frame.y(*y))).collect();

    let mut svg = svg_header(SMALL_WIDTH, SMALL_HEIGHT);
    horizontal_grid(&mut svg, &frame, 4, |v| format!("{:.0}%", v));
    svg.push_str(&area(&points, frame.y(0.0), color));
    svg.push_str(&polyline(&points, color, 2.0));

    if let Some(covid) = YearMonth::new(COVID_MONTH.0, COVID_MONTH.1) {
        if covid >= first && covid <= last {
            let x = frame.x(month_ordinal(covid));
            svg.push_str(&format!(
                r#"<line x1="{x:.2}" y1="{y1:.2}" x2="{x:.2}" y2="{y2:.2}" stroke="rgb(255, 99, 132)" stroke-width="1.5" stroke-dasharray="5 5" />"#,
                x = x,
                y1 = PADDING,
                y2 = frame.height - PADDING
            ));
            svg.push_str(&format!(
                r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle" class="marker">COVID-19</text>"#,
                x = x,
                y = PADDING - 6.0
            ));
        }
    }

    add_year_axis(&mut svg, &frame, first, last, 2);
    svg.push_str(svg_footer());

    wrap_plot(
        &format!("{} Performance ({}-{})", record.name(), first.year(), last.year()),
        svg,
    )
}

/// Simplified efficient-frontier guide: `y = √x · 1.5 − 3` (percent units).
pub fn frontier_curve(min_x: f64, max_x: f64) -> Vec<(f64, f64)> {
    let mut points = Vec::new();
    let mut x = min_x.max(0.0);
    while x <= max_x {
        points.push((x, x.sqrt() * 1.5 - 3.0));
        x += 0.5;
    }
    points
}

/// Bubble radius grows with the magnitude of the total return.
pub fn bubble_radius(total_return: f64) -> f64 {
    (10.0 + (total_return * 20.0).abs()) * 0.5
}

/// Volatility against annualized return, one bubble per index.
pub fn risk_return_scatter(records: &[IndexRecord]) -> String {
    if records.is_empty() {
        return String::new();
    }

    let points: Vec<(f64, f64)> = records
        .iter()
        .map(|r| (r.volatility * 100.0, r.annualized_return * 100.0))
        .collect();
    let Some((x_lo, x_hi)) = extent(points.iter().map(|(x, _)| *x)) else {
        return String::new();
    };
    let (min_x, max_x) = (x_lo - 2.0, x_hi + 2.0);
    let frontier = frontier_curve(min_x, max_x);
    let Some(y_extent) = extent(
        points
            .iter()
            .map(|(_, y)| *y)
            .chain(frontier.iter().map(|(_, y)| *y))
            .chain([0.0]),
    ) else {
        return String::new();
    };

    let frame = Frame::new(WIDTH, HEIGHT, (min_x, max_x), (y_extent.0 - 1.0, y_extent.1 + 1.0));

    let mut svg = svg_header(WIDTH, HEIGHT);
    horizontal_grid(&mut svg, &frame, 5, |v| format!("{:.1}%", v));

    let frontier_px: Vec<(f64, f64)> = frontier.iter().map(|(x, y)| (frame.x(*x), frame.y(*y))).collect();
    if !frontier_px.is_empty() {
        let coords = frontier_px
            .iter()
            .map(|(x, y)| format!("{:.2},{:.2}", x, y))
            .collect::<Vec<_>>()
            .join(" ");
        svg.push_str(&format!(
            r#"<polyline fill="none" stroke="rgba(0, 0, 0, 0.3)" stroke-width="1" stroke-dasharray="5 5" points="{}" />"#,
            coords
        ));
    }

    for (i, (record, (x, y))) in records.iter().zip(points.iter()).enumerate() {
        let color = CHART_COLORS[i % CHART_COLORS.len()];
        let (cx, cy) = (frame.x(*x), frame.y(*y));
        svg.push_str(&format!(
            r#"<circle cx="{cx:.2}" cy="{cy:.2}" r="{r:.2}" fill="{color}" fill-opacity="0.6" stroke="{color}" />"#,
            cx = cx,
            cy = cy,
            r = bubble_radius(record.total_return),
            color = color
        ));
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" font-size="9">{label}</text>"#,
            x = cx + 8.0,
            y = cy - 8.0,
            label = escape_html(record.name())
        ));
    }

    for i in 0..=5 {
        let value = frame.x_min + (frame.x_max - frame.x_min) * i as f64 / 5.0;
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle">{v:.1}%</text>"#,
            x = frame.x(value),
            y = frame.height - PADDING + 16.0,
            v = value
        ));
    }
    axis_title(
        &mut svg,
        &frame,
        "Volatility (Annualized Standard Deviation, %)",
        "Annualized Return (%)",
    );
    svg.push_str(svg_footer());

    wrap_plot("Risk-Return Profile of Global Indices", svg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IndexDescriptor, MonthlyObservation};
    use crate::services::analytics::compute_metrics;

    fn record(name: &str, start: (i32, u32), prices: &[f64]) -> IndexRecord {
        let mut month = YearMonth::new(start.0, start.1).unwrap();
        let mut data = Vec::new();
        for &value in prices {
            data.push(MonthlyObservation { date: month, value });
            month = month.next().unwrap();
        }
        compute_metrics(IndexRecord::new(IndexDescriptor::new(name, name, "X"), data)).unwrap()
    }

    #[test]
    fn comparison_has_one_line_per_index() {
        let records = vec![
            record("A&B", (2013, 1), &[100.0, 110.0, 120.0]),
            record("C", (2013, 1), &[50.0, 45.0, 60.0]),
        ];
        let html = performance_comparison(&records);
        assert_eq!(html.matches("<polyline").count(), 2);
        assert!(html.contains("A&amp;B"));
        assert!(html.starts_with("<figure"));
    }

    #[test]
    fn covid_marker_only_inside_range() {
        let inside = record("In", (2020, 1), &[100.0, 90.0, 80.0, 95.0]);
        assert!(performer_chart(&inside, BEST_COLOR).contains("COVID-19"));

        let outside = record("Out", (2013, 1), &[100.0, 90.0, 80.0, 95.0]);
        assert!(!performer_chart(&outside, WORST_COLOR).contains("COVID-19"));
    }

    #[test]
    fn scatter_draws_bubble_per_index() {
        let records = vec![
            record("A", (2013, 1), &[100.0, 110.0, 105.0, 130.0]),
            record("B", (2013, 1), &[100.0, 95.0, 97.0, 90.0]),
            record("C", (2013, 1), &[100.0, 100.5, 101.0, 101.5]),
        ];
        let html = risk_return_scatter(&records);
        assert_eq!(html.matches("<circle").count(), 3);
        assert!(html.contains("stroke-dasharray"));
    }

    #[test]
    fn frontier_follows_square_root() {
        let curve = frontier_curve(4.0, 9.0);
        assert_eq!(curve.first(), Some(&(4.0, 0.0)));
        assert_eq!(curve.last(), Some(&(9.0, 1.5)));
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert!(performance_comparison(&[]).is_empty());
        assert!(risk_return_scatter(&[]).is_empty());
    }
}
