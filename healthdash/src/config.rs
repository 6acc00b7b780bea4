//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `HEALTHDASH_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `HEALTHDASH_` override YAML values
//! 3. **DATABASE_URL** - Special case: overrides `database.url` if set
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `HEALTHDASH_DATABASE__MAX_CONNECTIONS=4` sets the `database.max_connections` field.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use healthdash::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = Args::parse();
//! let config = Config::load(&args)?;
//!
//! println!("Server will bind to {}:{}", config.host, config.port);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration Structure
//!
//! - **Server**: `host`, `port` - HTTP server binding configuration
//! - **Database**: `database.url`, `database.max_connections` - SQLite connection settings
//! - **Metrics catalogue**: `metrics` - the tracked metrics, in display order
//! - **Features**: `enable_metrics`, `enable_otel_export` - Optional feature toggles
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! # Override server port
//! HEALTHDASH_PORT=8080
//!
//! # Point at a different database file
//! DATABASE_URL="sqlite://data/health.sqlite"
//!
//! # Toggle the Prometheus endpoint
//! HEALTHDASH_ENABLE_METRICS=true
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "HEALTHDASH_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// All fields have defaults, so an empty (or missing) config file yields a working server that
/// tracks the default metric catalogue in `health_data.sqlite`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Overrides `database.url` when set (populated from `DATABASE_URL`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    /// Database connection settings
    pub database: DatabaseConfig,
    /// Tracked metrics, in the order they appear on the form and the analysis page
    pub metrics: Vec<MetricConfig>,
    /// Enable Prometheus metrics endpoint at `/internal/metrics`
    pub enable_metrics: bool,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
}

/// SQLite connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// SQLite connection string. The file is created if it does not exist.
    pub url: String,
    /// Maximum number of pooled connections
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://health_data.sqlite".to_string(),
            max_connections: 5,
        }
    }
}

/// A tracked metric: how it is entered and how it is charted.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MetricConfig {
    /// Display name; also the value stored in the `name` column of each entry
    pub name: String,
    /// Input widget used on the entry form
    #[serde(flatten)]
    pub kind: MetricKind,
    /// Chart line color as a CSS `rgba(...)` string
    #[serde(default = "default_metric_color")]
    pub color: String,
}

/// How a metric is entered on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetricKind {
    /// Free numeric input
    Number,
    /// Range input bounded by `min..=max`; the bounds are also used for normalization
    Slider { min: i64, max: i64 },
}

pub fn default_metric_color() -> String {
    "rgba(128,128,128,1.0)".to_string()
}

impl MetricConfig {
    fn new(name: &str, kind: MetricKind, color: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            color: color.to_string(),
        }
    }

    /// Fixed normalization bounds, if the metric declares any
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match self.kind {
            MetricKind::Number => None,
            MetricKind::Slider { min, max } => Some((min as f64, max as f64)),
        }
    }
}

/// The default metric catalogue
pub fn default_metrics() -> Vec<MetricConfig> {
    vec![
        MetricConfig::new("Resting Heart Rate", MetricKind::Number, "rgba(240,128,128,1.0)"),
        MetricConfig::new("Sleep Hours", MetricKind::Number, "rgba(135,206,250,1.0)"),
        MetricConfig::new("Calories", MetricKind::Number, "rgba(144,238,144,1.0)"),
        MetricConfig::new("Mood", MetricKind::Slider { min: 1, max: 5 }, "rgba(255,182,193,1.0)"),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            database_url: None,
            database: DatabaseConfig::default(),
            metrics: default_metrics(),
            enable_metrics: false,
            enable_otel_export: false,
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        if let Some(url) = config.database_url.take() {
            config.database.url = url;
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.database.max_connections == 0 {
            return Err(Error::Internal {
                operation: "Config validation: database.max_connections must be at least 1".to_string(),
            });
        }

        if self.metrics.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: metrics cannot be empty. Configure at least one tracked metric.".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for metric in &self.metrics {
            if metric.name.trim().is_empty() {
                return Err(Error::Internal {
                    operation: "Config validation: metric names cannot be empty".to_string(),
                });
            }

            // The entry form uses metric names as field names, so `date` would collide
            if metric.name == "date" {
                return Err(Error::Internal {
                    operation: "Config validation: 'date' is reserved and cannot be used as a metric name".to_string(),
                });
            }

            if !seen.insert(metric.name.as_str()) {
                return Err(Error::Internal {
                    operation: format!("Config validation: metric '{}' is configured more than once", metric.name),
                });
            }

            if let MetricKind::Slider { min, max } = metric.kind
                && min >= max
            {
                return Err(Error::Internal {
                    operation: format!(
                        "Config validation: slider metric '{}' has min ({}) not less than max ({})",
                        metric.name, min, max
                    ),
                });
            }
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            // HEALTHDASH_CONFIG names the file itself and is not a config key
            .merge(Env::prefixed("HEALTHDASH_").ignore(&["config"]).split("__"))
            .merge(Env::raw().only(&["DATABASE_URL"]))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
