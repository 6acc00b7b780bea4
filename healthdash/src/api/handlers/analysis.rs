use crate::{
    AppState,
    analysis::build_report,
    db::{
        handlers::{Entries, Repository},
        models::entries::EntryFilter,
    },
    errors::{Error, Result},
    templates::script_json,
};
use axum::{extract::State, response::Html};
use minijinja::context;
use tracing::{debug, instrument};

/// Render per-metric charts, the normalized overview and the correlation chart.
#[instrument(skip_all)]
pub async fn get_analysis(State(state): State<AppState>) -> Result<Html<String>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let entries = Entries::new(&mut pool_conn).list(&EntryFilter::oldest_first()).await?;

    let Some(report) = build_report(&entries, &state.config.metrics) else {
        debug!("No entries recorded, rendering empty analysis page");
        return state.templates.render("analysis.html", context! { report => None::<String> });
    };

    state.templates.render(
        "analysis.html",
        context! {
            chart_count => report.figures.len(),
            has_correlations => report.correlations.is_some(),
            report => script_json(&report)?,
        },
    )
}
