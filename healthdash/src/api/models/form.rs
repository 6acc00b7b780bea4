//! Models for the data-entry form.

use crate::api::models::entries::parse_metric_value;
use crate::config::{MetricConfig, MetricKind};
use crate::db::models::entries::EntryCreateDBRequest;
use crate::errors::Error;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One input on the rendered form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricInput {
    pub name: String,
    /// HTML input type: `number` or `range`
    pub input: &'static str,
    pub min: Option<i64>,
    pub max: Option<i64>,
    /// Prefilled value: the latest recorded value, or `0`
    pub value: String,
}

impl MetricInput {
    pub fn new(metric: &MetricConfig, last_value: Option<f64>) -> Self {
        let (input, min, max) = match metric.kind {
            MetricKind::Number => ("number", None, None),
            MetricKind::Slider { min, max } => ("range", Some(min), Some(max)),
        };

        Self {
            name: metric.name.clone(),
            input,
            min,
            max,
            value: last_value.map(|v| v.to_string()).unwrap_or_else(|| "0".to_string()),
        }
    }
}

/// A validated form submission: one value per configured metric for a single date
#[derive(Debug, Clone, PartialEq)]
pub struct FormSubmission {
    pub date: NaiveDate,
    pub values: Vec<(String, f64)>,
}

impl FormSubmission {
    /// Validate the posted fields. A missing or blank date means `today`; a missing metric
    /// means `0`. Any unparseable value rejects the whole submission.
    pub fn parse(fields: &HashMap<String, String>, metrics: &[MetricConfig], today: NaiveDate) -> Result<Self, Error> {
        let date = match fields.get("date").map(|d| d.trim()).filter(|d| !d.is_empty()) {
            Some(raw) => NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| Error::BadRequest {
                message: format!("Invalid date {raw:?}, expected YYYY-MM-DD"),
            })?,
            None => today,
        };

        let values = metrics
            .iter()
            .map(|metric| {
                let raw = fields.get(&metric.name).map(String::as_str).unwrap_or("0");
                parse_metric_value(raw)
                    .map(|value| (metric.name.clone(), value))
                    .ok_or_else(|| Error::InvalidValue {
                        field: metric.name.clone(),
                        value: raw.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { date, values })
    }

    pub fn into_requests(self) -> Vec<EntryCreateDBRequest> {
        let date = self.date;
        self.values
            .into_iter()
            .map(|(name, metric_value)| EntryCreateDBRequest { date, name, metric_value })
            .collect()
    }
}
