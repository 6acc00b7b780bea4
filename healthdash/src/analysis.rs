//! Chart and correlation building for the analysis page.
//!
//! Everything here is a pure function of the stored entries and the metric catalogue. The
//! output figures serialize to the `{data, layout}` JSON shape that Plotly consumes directly,
//! so the page template only has to hand them to `Plotly.newPlot`.

use crate::config::{MetricConfig, default_metric_color};
use crate::db::models::entries::Entry;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// All recorded points of one metric, sorted by date
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSeries<'a> {
    pub name: String,
    pub points: Vec<(NaiveDate, f64)>,
    /// Catalogue entry, if the metric is still configured
    pub config: Option<&'a MetricConfig>,
}

impl MetricSeries<'_> {
    pub fn color(&self) -> String {
        self.config.map(|c| c.color.clone()).unwrap_or_else(default_metric_color)
    }

    fn dates(&self) -> Vec<String> {
        self.points.iter().map(|(d, _)| d.format("%Y-%m-%d").to_string()).collect()
    }

    fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }
}

/// Group entries by metric name. Configured metrics come first in catalogue order, followed by
/// any names no longer in the catalogue, alphabetically.
pub fn group_by_metric<'a>(entries: &[Entry], catalogue: &'a [MetricConfig]) -> Vec<MetricSeries<'a>> {
    let mut grouped: BTreeMap<&str, Vec<(NaiveDate, f64)>> = BTreeMap::new();
    for entry in entries {
        grouped.entry(entry.name.as_str()).or_default().push((entry.date, entry.metric_value));
    }

    let mut series = Vec::with_capacity(grouped.len());
    for metric in catalogue {
        if let Some(points) = grouped.remove(metric.name.as_str()) {
            series.push(MetricSeries {
                name: metric.name.clone(),
                points,
                config: Some(metric),
            });
        }
    }
    series.extend(grouped.into_iter().map(|(name, points)| MetricSeries {
        name: name.to_string(),
        points,
        config: None,
    }));

    for s in &mut series {
        s.points.sort_by_key(|(date, _)| *date);
    }
    series
}

/// Scale `value` into `[0, 1]` relative to `min..=max`. A zero-width range maps to 0.
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    let range = max - min;
    if range == 0.0 { 0.0 } else { (value - min) / range }
}

/// Normalized values of a series: slider metrics use their configured bounds, everything else
/// the observed minimum and maximum.
pub fn normalized_values(series: &MetricSeries<'_>) -> Vec<f64> {
    let values = series.values();
    let (min, max) = series.config.and_then(MetricConfig::bounds).unwrap_or_else(|| {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (min, max)
    });
    values.into_iter().map(|v| normalize(v, min, max)).collect()
}

/// Pearson correlation coefficient. `None` for fewer than two points or a constant input.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }

    let r = cov / (var_x.sqrt() * var_y.sqrt());
    r.is_finite().then_some(r)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correlation {
    pub first: String,
    pub second: String,
    pub coefficient: f64,
}

impl Correlation {
    pub fn label(&self) -> String {
        format!("{} vs {}", self.first, self.second)
    }
}

/// Pairwise correlations over the dates on which every metric has a value, strongest positive
/// first. Pairs without enough aligned data or with a constant side are left out.
pub fn correlations(series: &[MetricSeries<'_>]) -> Vec<Correlation> {
    if series.len() < 2 {
        return Vec::new();
    }

    let lookups: Vec<HashMap<NaiveDate, f64>> = series.iter().map(|s| s.points.iter().copied().collect()).collect();

    let mut aligned: BTreeSet<NaiveDate> = lookups[0].keys().copied().collect();
    for lookup in &lookups[1..] {
        aligned.retain(|d| lookup.contains_key(d));
    }

    let mut results = Vec::new();
    if aligned.len() < 2 {
        tracing::debug!("Not enough aligned dates to calculate correlations");
        return results;
    }

    for i in 0..series.len() {
        for j in (i + 1)..series.len() {
            let xs: Vec<f64> = aligned.iter().map(|d| lookups[i][d]).collect();
            let ys: Vec<f64> = aligned.iter().map(|d| lookups[j][d]).collect();

            match pearson(&xs, &ys) {
                Some(r) => results.push(Correlation {
                    first: series[i].name.clone(),
                    second: series[j].name.clone(),
                    coefficient: round2(r),
                }),
                None => tracing::debug!("Correlation between {} and {} is undefined", series[i].name, series[j].name),
            }
        }
    }

    results.sort_by(|a, b| b.coefficient.total_cmp(&a.coefficient));
    results
}

/// Same color at 10% opacity, for the area under a line
pub fn fill_color(color: &str) -> String {
    if let Some(inner) = color.strip_prefix("rgba(").and_then(|c| c.strip_suffix(')'))
        && let Some((rgb, _alpha)) = inner.rsplit_once(',')
    {
        return format!("rgba({rgb},0.1)");
    }
    if let Some(inner) = color.strip_prefix("rgb(").and_then(|c| c.strip_suffix(')')) {
        return format!("rgba({inner},0.1)");
    }
    color.to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Scatter {
        x: Vec<String>,
        y: Vec<f64>,
        mode: &'static str,
        name: String,
        fill: &'static str,
        line: Line,
        fillcolor: String,
    },
    Bar {
        x: Vec<f64>,
        y: Vec<String>,
        orientation: &'static str,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct Line {
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<Axis>,
    pub autosize: bool,
    pub margin: Margin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<Legend>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Axis {
    pub tickangle: i32,
    pub tickformat: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Margin {
    pub t: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub l: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Legend {
    pub orientation: &'static str,
    pub yanchor: &'static str,
    pub y: f64,
    pub xanchor: &'static str,
    pub x: f64,
}

fn date_axis() -> Option<Axis> {
    Some(Axis {
        tickangle: 0,
        tickformat: "%m-%d",
    })
}

fn scatter(series: &MetricSeries<'_>, y: Vec<f64>) -> Trace {
    let color = series.color();
    Trace::Scatter {
        x: series.dates(),
        y,
        mode: "lines",
        name: series.name.clone(),
        fill: "tozeroy",
        fillcolor: fill_color(&color),
        line: Line { color },
    }
}

/// One chart per metric, raw values
pub fn metric_figure(series: &MetricSeries<'_>) -> Figure {
    Figure {
        data: vec![scatter(series, series.values())],
        layout: Layout {
            title: series.name.clone(),
            xaxis: date_axis(),
            autosize: true,
            margin: Margin { t: 65, l: None },
            legend: None,
        },
    }
}

/// All metrics on one chart, each normalized to `[0, 1]`
pub fn combined_figure(series: &[MetricSeries<'_>]) -> Figure {
    Figure {
        data: series.iter().map(|s| scatter(s, normalized_values(s))).collect(),
        layout: Layout {
            title: "Metrics".to_string(),
            xaxis: date_axis(),
            autosize: true,
            margin: Margin { t: 65, l: None },
            legend: Some(Legend {
                orientation: "h",
                yanchor: "bottom",
                y: -0.3,
                xanchor: "center",
                x: 0.5,
            }),
        },
    }
}

/// Horizontal bar chart of correlations, with room on the left for the longest pair label
pub fn correlation_figure(correlations: &[Correlation]) -> Figure {
    let labels: Vec<String> = correlations.iter().map(Correlation::label).collect();
    let longest = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u32;

    Figure {
        data: vec![Trace::Bar {
            x: correlations.iter().map(|c| c.coefficient).collect(),
            y: labels,
            orientation: "h",
        }],
        layout: Layout {
            title: "Correlations".to_string(),
            xaxis: None,
            autosize: true,
            margin: Margin {
                t: 65,
                l: Some(longest.saturating_mul(8).max(100)),
            },
            legend: None,
        },
    }
}

/// Everything the analysis page draws
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub figures: Vec<Figure>,
    pub combined: Figure,
    pub correlations: Option<Figure>,
}

/// Build the analysis page charts. `None` when there is nothing to chart.
pub fn build_report(entries: &[Entry], catalogue: &[MetricConfig]) -> Option<AnalysisReport> {
    let series = group_by_metric(entries, catalogue);
    if series.is_empty() {
        return None;
    }

    let correlations = correlations(&series);

    Some(AnalysisReport {
        figures: series.iter().map(metric_figure).collect(),
        combined: combined_figure(&series),
        correlations: (!correlations.is_empty()).then(|| correlation_figure(&correlations)),
    })
}
