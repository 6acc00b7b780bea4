//! API request/response models for metric entries.

use crate::db::models::entries::EntryUpdateDBRequest;
use crate::errors::Error;
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, fmt, str::FromStr};

/// Outcome reported by the update endpoint (and by every error response)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// `{"status": "success"}` or `{"status": "error", "message": "..."}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusResponse {
    pub fn success() -> Self {
        Self {
            status: Status::Success,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: Some(message.into()),
        }
    }
}

/// Body of `POST /update_entry/{entry_id}`.
///
/// `field` stays a plain string here so that an unknown name is reported as an invalid field
/// rather than a malformed body.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpdateEntryRequest {
    pub field: String,
    pub value: EntryValue,
}

/// The new cell content. Browsers send the cell text; JSON numbers are accepted too.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum EntryValue {
    Text(String),
    Number(serde_json::Number),
}

impl EntryValue {
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            EntryValue::Text(s) => Cow::Borrowed(s.as_str()),
            EntryValue::Number(n) => Cow::Owned(n.to_string()),
        }
    }
}

/// The allow-list of entry fields that may be updated through the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryField {
    MetricValue,
}

impl EntryField {
    pub const ALL: &'static [EntryField] = &[EntryField::MetricValue];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryField::MetricValue => "metric_value",
        }
    }

    /// Convert raw input into a typed update for this field
    pub fn parse_value(self, raw: &str) -> Result<EntryUpdateDBRequest, Error> {
        match self {
            EntryField::MetricValue => parse_metric_value(raw)
                .map(EntryUpdateDBRequest::MetricValue)
                .ok_or_else(|| Error::InvalidValue {
                    field: self.as_str().to_string(),
                    value: raw.to_string(),
                }),
        }
    }
}

impl fmt::Display for EntryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntryField::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| Error::InvalidField { field: s.to_string() })
    }
}

/// Parse a metric value: an optionally signed decimal with at least one digit and at most one
/// decimal point, surrounding whitespace ignored. Exponents, `inf`, `NaN` and digit separators
/// are rejected. Any number of digits is accepted as long as the result is finite.
pub fn parse_metric_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let unsigned = trimmed.strip_prefix(['-', '+']).unwrap_or(trimmed);

    let digits = unsigned.chars().filter(char::is_ascii_digit).count();
    let points = unsigned.chars().filter(|c| *c == '.').count();
    if digits == 0 || points > 1 || digits + points != unsigned.len() {
        return None;
    }

    let value: f64 = unsigned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }

    Some(if trimmed.starts_with('-') { -value } else { value })
}
