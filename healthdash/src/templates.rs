//! Server-rendered HTML pages.
//!
//! Templates are compiled into the binary and parsed once at startup. Autoescaping is on for
//! every `.html` template; chart data is the only value marked `|safe`, and it goes through
//! [`script_json`] first.

use crate::errors::Error;
use anyhow::Context;
use axum::response::Html;
use minijinja::Environment;
use serde::Serialize;
use std::sync::Arc;

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("entries.html", include_str!("../templates/entries.html")),
    ("form.html", include_str!("../templates/form.html")),
    ("analysis.html", include_str!("../templates/analysis.html")),
];

/// Shared, immutable template environment
#[derive(Clone)]
pub struct Templates {
    env: Arc<Environment<'static>>,
}

impl Templates {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env: Arc::new(env) })
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<Html<String>, Error> {
        let html = self.env.get_template(name)?.render(ctx)?;
        Ok(Html(html))
    }
}

/// Serialize a value for embedding inside an inline `<script>` block.
///
/// `<` is escaped so a metric name can never close the script element.
pub fn script_json<T: Serialize>(value: &T) -> Result<String, Error> {
    let json = serde_json::to_string(value).context("serialize chart data")?;
    Ok(json.replace('<', "\\u003c"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn test_all_templates_parse() {
        let templates = Templates::new().unwrap();
        for &(name, _) in TEMPLATES {
            assert!(templates.env.get_template(name).is_ok(), "{name} should load");
        }
    }

    #[test]
    fn test_render_escapes_html() {
        let templates = Templates::new().unwrap();
        let html = templates
            .render(
                "entries.html",
                context! {
                    entries => vec![context! { id => 1, date => "2024-01-01", name => "<b>Mood</b>", metric_value => 3.0 }],
                },
            )
            .unwrap();

        // minijinja's html escaping also encodes `/`
        assert!(html.0.contains("&lt;b&gt;Mood&lt;&#x2f;b&gt;"));
        assert!(!html.0.contains("<b>Mood"));
    }

    #[test]
    fn test_script_json_escapes_angle_brackets() {
        let json = script_json(&serde_json::json!({"name": "</script><script>alert(1)"})).unwrap();
        assert!(!json.contains('<'));
        assert!(json.contains("\\u003c/script>"));

        let back: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back["name"], "</script><script>alert(1)");
    }

    #[test]
    fn test_unknown_template_is_an_error() {
        let templates = Templates::new().unwrap();
        assert!(matches!(templates.render("missing.html", ()), Err(Error::Template(_))));
    }
}
