//! Self-contained HTML rendering of the dashboard: inline CSS, inline SVG
//! charts and plain tables. Works offline.

use chrono::{DateTime, NaiveDate, Utc};
use std::fmt::Write as _;

use crate::dashboard::charts::{DashboardView, Heatmap, Trend};
use crate::output::format_thousands;

const PALETTE: &[&str] = &[
    "#dc3545", "#fd7e14", "#4299e1", "#38a169", "#805ad5", "#d69e2e", "#319795", "#e53e8c",
];

const CHART_WIDTH: f64 = 900.0;
const CHART_HEIGHT: f64 = 320.0;
const MARGIN: f64 = 48.0;

/// Renders the full dashboard page.
pub fn render_dashboard(view: &DashboardView, source: &str, generated_at: DateTime<Utc>) -> String {
    let body = [
        render_kpis(view),
        section(
            "Traffic Volume Trends",
            &line_chart(&view.region_trends, true),
        ),
        render_covid(view),
        render_regions(view),
        render_road_categories(view),
        render_seasonal(view),
    ]
    .concat();

    page(
        &body,
        &format!(
            "Source: {} • Generated {}",
            escape(source),
            generated_at.format("%Y-%m-%d %H:%M UTC")
        ),
    )
}

/// Renders the page shown when there is no processed table to display.
pub fn render_guidance(reason: &str, command: &str) -> String {
    let body = format!(
        r#"<section class="guidance">
<h2>No data available</h2>
<p>{}</p>
<p>Run the processing step first:</p>
<pre>{}</pre>
</section>"#,
        escape(reason),
        escape(command)
    );
    page(&body, "")
}

fn page(body: &str, footer: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>NVDB Traffic Insights</title>
<style>{css}</style>
</head>
<body>
<div class="container">
<header>
<h1>NVDB Traffic Insights</h1>
<p class="meta">Norwegian road traffic analytics: pandemic impact, regional variation and recovery trends from NVDB counts (AADT).</p>
</header>
{body}
<footer>{footer}</footer>
</div>
</body>
</html>
"#,
        css = inline_css(),
    )
}

fn inline_css() -> &'static str {
    r#"
* { box-sizing: border-box; margin: 0; padding: 0; }
body { font-family: system-ui, -apple-system, 'Segoe UI', sans-serif; color: #1a202c; background: #fff; line-height: 1.5; }
.container { max-width: 1100px; margin: 0 auto; padding: 2rem; }
header { margin-bottom: 2rem; border-bottom: 3px solid #dc3545; padding-bottom: 1rem; }
header h1 { color: #dc3545; font-size: 2.25rem; }
.meta, footer { color: #718096; font-size: 0.875rem; }
section { margin: 2rem 0; }
h2 { font-size: 1.4rem; margin-bottom: 1rem; }
.kpis { display: grid; grid-template-columns: repeat(4, 1fr); gap: 1rem; }
.kpi { background: #f8f9fa; border-left: 5px solid #dc3545; border-radius: 8px; padding: 1rem; }
.kpi .label { color: #718096; font-size: 0.8rem; text-transform: uppercase; }
.kpi .value { font-size: 1.5rem; font-weight: 700; }
.kpi .delta { color: #4a5568; font-size: 0.8rem; }
table { border-collapse: collapse; width: 100%; font-size: 0.9rem; }
th, td { padding: 0.4rem 0.6rem; border-bottom: 1px solid #e2e8f0; text-align: right; }
th:first-child, td:first-child { text-align: left; }
th { background: #f7fafc; }
svg { width: 100%; height: auto; background: #fff; }
svg text { font-size: 11px; fill: #4a5568; }
.legend span { display: inline-block; margin-right: 1rem; font-size: 0.85rem; }
.legend i { display: inline-block; width: 12px; height: 12px; margin-right: 4px; vertical-align: middle; }
.guidance { background: #fff5f5; border-left: 5px solid #dc3545; padding: 1.5rem; border-radius: 8px; }
pre { background: #edf2f7; padding: 0.75rem; margin-top: 0.5rem; border-radius: 4px; }
footer { margin-top: 3rem; border-top: 1px solid #e2e8f0; padding-top: 1rem; }
"#
}

fn section(title: &str, content: &str) -> String {
    format!("<section>\n<h2>{}</h2>\n{}\n</section>\n", escape(title), content)
}

fn kpi(label: &str, value: &str, delta: &str) -> String {
    format!(
        r#"<div class="kpi"><div class="label">{}</div><div class="value">{}</div><div class="delta">{}</div></div>"#,
        escape(label),
        escape(value),
        escape(delta)
    )
}

fn render_kpis(view: &DashboardView) -> String {
    let k = &view.kpis;
    let direction = if k.avg_monthly_change > 0.0 { "Growth" } else { "Decline" };
    let cards = [
        kpi("Total Traffic Volume", &format_thousands(k.total_traffic), "Cumulative count"),
        kpi(
            "Average Daily Traffic",
            &format_thousands(k.avg_daily_traffic),
            &format!("Across {} regions", k.region_count),
        ),
        kpi(
            "Average Monthly Change",
            &format!("{:.1}%", k.avg_monthly_change),
            direction,
        ),
        kpi(
            "Analysis Period",
            &format!("{} days", k.span_days),
            &format!("{} monthly records", k.record_count),
        ),
    ]
    .concat();

    section(
        "Key Traffic Metrics",
        &format!(
            r#"<div class="kpis">{cards}</div><p class="meta">Peak daily traffic {} • {} to {}</p>"#,
            format_thousands(k.peak_daily_traffic),
            k.first_date,
            k.last_date
        ),
    )
}

fn render_covid(view: &DashboardView) -> String {
    let c = &view.covid;
    let cards = [
        kpi(
            "Pre-COVID Average",
            &c.pre_covid_avg.map_or_else(|| "n/a".to_string(), format_thousands),
            "Before March 2020",
        ),
        kpi("Peak Decline", &format!("{:.1}%", c.peak_decline_pct), "Mar-May 2020 vs pre-COVID"),
        kpi(
            "Recovery Level",
            &format!("{:.1}%", c.recovery_level_pct),
            if c.recovery_level_pct > 0.0 { "Above pre-COVID" } else { "Below pre-COVID" },
        ),
        kpi("Current Status", &format!("{:.1}%", c.current_status_pct), "vs pre-COVID levels"),
    ]
    .concat();

    let bars: Vec<(String, f64)> = c
        .by_region
        .iter()
        .map(|p| (format!("{} / {}", p.phase, p.region), p.traffic_mean))
        .collect();

    section(
        "COVID-19 Impact Analysis",
        &format!(
            r#"<div class="kpis">{cards}</div>{}"#,
            bar_chart(&bars)
        ),
    )
}

fn render_regions(view: &DashboardView) -> String {
    let bars: Vec<(String, f64)> = view
        .regions
        .iter()
        .map(|r| (r.region.clone(), r.avg_traffic))
        .collect();

    let mut table = String::from(
        "<table><tr><th>Region</th><th>Average Traffic</th><th>Peak Traffic</th><th>Variability</th><th>Average Growth</th></tr>",
    );
    for r in &view.regions {
        let _ = write!(
            table,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:.1}%</td></tr>",
            escape(&r.region),
            format_thousands(r.avg_traffic),
            format_thousands(r.peak_traffic),
            r.variability.map_or_else(|| "n/a".to_string(), format_thousands),
            r.avg_growth
        );
    }
    table.push_str("</table>");

    section("Regional Traffic Analysis", &format!("{}{table}", bar_chart(&bars)))
}

fn render_road_categories(view: &DashboardView) -> String {
    let bars: Vec<(String, f64)> = view
        .road_categories
        .iter()
        .map(|c| (c.road_category.clone(), c.traffic_mean))
        .collect();

    section(
        "Road Category Analysis",
        &format!(
            "{}{}",
            bar_chart(&bars),
            line_chart(&view.category_trends, false)
        ),
    )
}

fn render_seasonal(view: &DashboardView) -> String {
    let bars: Vec<(String, f64)> = view
        .seasonal
        .iter()
        .map(|s| (format!("{} / {}", s.season, s.region), s.traffic_mean))
        .collect();

    section(
        "Seasonal Traffic Patterns",
        &format!("{}{}", bar_chart(&bars), heatmap_table(&view.heatmap)),
    )
}

fn color(i: usize) -> &'static str {
    PALETTE[i % PALETTE.len()]
}

/// Horizontal bar chart, one bar per label.
fn bar_chart(bars: &[(String, f64)]) -> String {
    if bars.is_empty() {
        return String::new();
    }

    let bar_height = 22.0;
    let label_width = 220.0;
    let height = bars.len() as f64 * (bar_height + 6.0) + 10.0;
    let max = bars.iter().map(|(_, v)| *v).fold(0.0, f64::max).max(1.0);
    let scale = (CHART_WIDTH - label_width - 90.0) / max;

    let mut svg = format!(r#"<svg viewBox="0 0 {CHART_WIDTH} {height}">"#);
    for (i, (label, value)) in bars.iter().enumerate() {
        let y = 5.0 + i as f64 * (bar_height + 6.0);
        let width = (value.max(0.0) * scale).max(1.0);
        let _ = write!(
            svg,
            r#"<text x="{tx}" y="{ty}" text-anchor="end">{label}</text><rect x="{label_width}" y="{y}" width="{width:.1}" height="{bar_height}" fill="{fill}"/><text x="{vx:.1}" y="{ty}">{value}</text>"#,
            tx = label_width - 8.0,
            ty = y + bar_height * 0.7,
            label = escape(label),
            fill = color(i),
            vx = label_width + width + 6.0,
            value = format_thousands(*value),
        );
    }
    svg.push_str("</svg>");
    svg
}

/// Line chart over time; one polyline per trend, plus a dashed rolling
/// average line when `with_rolling` is set.
fn line_chart(trends: &[Trend], with_rolling: bool) -> String {
    let dates: Vec<NaiveDate> = trends
        .iter()
        .flat_map(|t| t.points.iter().map(|p| p.date))
        .collect();
    let (Some(first), Some(last)) = (dates.iter().min(), dates.iter().max()) else {
        return String::new();
    };

    let max = trends
        .iter()
        .flat_map(|t| t.points.iter().map(|p| p.traffic_mean))
        .fold(0.0, f64::max)
        .max(1.0);
    let span = (*last - *first).num_days().max(1) as f64;
    let plot_w = CHART_WIDTH - 2.0 * MARGIN;
    let plot_h = CHART_HEIGHT - 2.0 * MARGIN;

    let x = |d: NaiveDate| MARGIN + (d - *first).num_days() as f64 / span * plot_w;
    let y = |v: f64| CHART_HEIGHT - MARGIN - v / max * plot_h;

    let mut svg = format!(r#"<svg viewBox="0 0 {CHART_WIDTH} {CHART_HEIGHT}">"#);
    let _ = write!(
        svg,
        r##"<line x1="{MARGIN}" y1="{b}" x2="{r}" y2="{b}" stroke="#a0aec0"/><line x1="{MARGIN}" y1="{MARGIN}" x2="{MARGIN}" y2="{b}" stroke="#a0aec0"/><text x="{MARGIN}" y="{ly}">{first}</text><text x="{r}" y="{ly}" text-anchor="end">{last}</text><text x="{tx}" y="{MARGIN}" text-anchor="end">{max}</text>"##,
        b = CHART_HEIGHT - MARGIN,
        r = CHART_WIDTH - MARGIN,
        ly = CHART_HEIGHT - MARGIN + 16.0,
        tx = MARGIN - 4.0,
        max = format_thousands(max),
    );

    let mut legend = String::from(r#"<div class="legend">"#);
    for (i, trend) in trends.iter().enumerate() {
        let points: Vec<String> = trend
            .points
            .iter()
            .map(|p| format!("{:.1},{:.1}", x(p.date), y(p.traffic_mean)))
            .collect();
        let _ = write!(
            svg,
            r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="2.5"/>"#,
            points.join(" "),
            color(i)
        );

        if with_rolling {
            let rolling: Vec<String> = trend
                .points
                .iter()
                .filter_map(|p| p.rolling_3m_avg.map(|v| format!("{:.1},{:.1}", x(p.date), y(v))))
                .collect();
            if rolling.len() > 1 {
                let _ = write!(
                    svg,
                    r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="1.5" stroke-dasharray="6 4" opacity="0.7"/>"#,
                    rolling.join(" "),
                    color(i)
                );
            }
        }

        let _ = write!(
            legend,
            r#"<span><i style="background:{}"></i>{}</span>"#,
            color(i),
            escape(&trend.name)
        );
    }
    svg.push_str("</svg>");
    legend.push_str("</div>");

    format!("{svg}{legend}")
}

/// Month × region table with cell shading proportional to traffic.
fn heatmap_table(heatmap: &Heatmap) -> String {
    let max = heatmap
        .rows
        .iter()
        .flat_map(|r| r.values.iter().flatten().copied())
        .fold(0.0, f64::max)
        .max(1.0);

    let mut table = String::from("<table><tr><th>Month</th>");
    for region in &heatmap.regions {
        let _ = write!(table, "<th>{}</th>", escape(region));
    }
    table.push_str("</tr>");

    for row in &heatmap.rows {
        let _ = write!(table, "<tr><td>{}</td>", row.month);
        for value in &row.values {
            match value {
                Some(v) => {
                    let _ = write!(
                        table,
                        r#"<td style="background: rgba(220, 53, 69, {:.2})">{}</td>"#,
                        (v / max).clamp(0.05, 1.0) * 0.6,
                        format_thousands(*v)
                    );
                }
                None => table.push_str("<td></td>"),
            }
        }
        table.push_str("</tr>");
    }
    table.push_str("</table>");
    table
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
