use crate::{
    AppState,
    api::models::form::{DATE_FORMAT, FormSubmission, MetricInput},
    db::handlers::{Entries, Repository},
    errors::{Error, Result},
};
use axum::{
    Form,
    extract::{State, rejection::FormRejection},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Local;
use minijinja::context;
use sqlx::Acquire;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Render the entry form, one input per configured metric, prefilled with its latest value.
#[instrument(skip_all)]
pub async fn get_form(State(state): State<AppState>) -> Result<Html<String>> {
    render_form(&state, None).await
}

async fn render_form(state: &AppState, error: Option<String>) -> Result<Html<String>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Entries::new(&mut pool_conn);

    let mut metrics = Vec::with_capacity(state.config.metrics.len());
    for metric in &state.config.metrics {
        let last_value = repo.latest_value(&metric.name).await?;
        metrics.push(MetricInput::new(metric, last_value));
    }

    let today = Local::now().date_naive().format(DATE_FORMAT).to_string();
    state.templates.render("form.html", context! { today, metrics, error })
}

/// Record one value per configured metric for the submitted date, then show the charts.
///
/// The whole submission is validated before anything is written, and all rows are written
/// in one transaction. A rejected submission gets the form back with the reason.
#[instrument(skip_all)]
pub async fn submit_form(
    State(state): State<AppState>,
    form: std::result::Result<Form<HashMap<String, String>>, FormRejection>,
) -> Result<Response> {
    let parsed = form
        .map_err(|e| Error::BadRequest { message: e.body_text() })
        .and_then(|Form(fields)| FormSubmission::parse(&fields, &state.config.metrics, Local::now().date_naive()));
    let submission = match parsed {
        Ok(submission) => submission,
        Err(e) => {
            debug!("Rejected form submission: {}", e);
            let page = render_form(&state, Some(e.user_message())).await?;
            return Ok((e.status_code(), page).into_response());
        }
    };
    let date = submission.date;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let recorded;
    {
        let mut repo = Entries::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?);
        let requests = submission.into_requests();
        recorded = requests.len();
        for request in &requests {
            repo.create(request).await?;
        }
    }
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    info!("Recorded {} metrics for {}", recorded, date);
    Ok(Redirect::to("/analysis").into_response())
}
