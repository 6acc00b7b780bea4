use crate::{
    AppState,
    api::models::entries::{EntryField, StatusResponse, UpdateEntryRequest},
    db::{
        errors::DbError,
        handlers::{Entries, Repository},
        models::entries::EntryFilter,
    },
    errors::{Error, Result},
    types::EntryId,
};
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    response::{Html, Redirect},
};
use minijinja::context;
use tracing::{debug, info, instrument};

/// Render every entry, newest first, with an editable value column.
#[instrument(skip_all)]
pub async fn list_entries(State(state): State<AppState>) -> Result<Html<String>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let entries = Entries::new(&mut pool_conn).list(&EntryFilter::newest_first()).await?;

    state.templates.render("entries.html", context! { entries })
}

/// Update one field of one entry from the inline editor.
///
/// Malformed paths and bodies are reported with the same JSON status shape as every other
/// failure, so the client only ever has to look at `status`.
#[instrument(skip_all, fields(entry_id))]
pub async fn update_entry(
    State(state): State<AppState>,
    path: std::result::Result<Path<EntryId>, PathRejection>,
    body: std::result::Result<Json<UpdateEntryRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>> {
    let Path(entry_id) = path.map_err(|e| Error::BadRequest { message: e.body_text() })?;
    let Json(request) = body.map_err(|e| Error::BadRequest { message: e.body_text() })?;
    tracing::Span::current().record("entry_id", entry_id);

    let field: EntryField = request.field.parse()?;
    let update = field.parse_value(&request.value.as_text())?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Entries::new(&mut pool_conn);

    match repo.update(entry_id, &update).await {
        Ok(entry) => {
            info!("Updated {} of entry {} to {}", field, entry.id, entry.metric_value);
            Ok(Json(StatusResponse::success()))
        }
        Err(DbError::NotFound) => Err(Error::NotFound {
            resource: "Entry".to_string(),
            id: entry_id.to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

/// Delete an entry and return to the table. Deleting an unknown id changes nothing.
#[instrument(skip(state))]
pub async fn delete_entry(State(state): State<AppState>, Path(entry_id): Path<EntryId>) -> Result<Redirect> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    if Entries::new(&mut pool_conn).delete(entry_id).await? {
        info!("Deleted entry {}", entry_id);
    } else {
        debug!("Entry {} not found, nothing to delete", entry_id);
    }

    Ok(Redirect::to("/entries"))
}

#[cfg(test)]
mod tests {
    use crate::api::models::entries::{Status, StatusResponse};
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::SqlitePool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_entries_renders_rows_newest_first(pool: SqlitePool) {
        let app = create_test_app(pool.clone()).await;
        let older = create_test_entry(&pool, "2024-02-01", "Calories", 1800.0).await;
        let newer = create_test_entry(&pool, "2024-02-03", "Mood", 4.0).await;

        let response = app.get("/entries").await;
        response.assert_status_ok();

        let html = response.text();
        assert!(html.contains(&format!(r#"data-id="{}" data-field="metric_value""#, older.id)));
        assert!(html.contains(&format!(r#"action="/delete/{}""#, newer.id)));

        let newer_at = html.find("2024-02-03").unwrap();
        let older_at = html.find("2024-02-01").unwrap();
        assert!(newer_at < older_at);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_entries_empty(pool: SqlitePool) {
        let app = create_test_app(pool).await;

        let response = app.get("/entries").await;
        response.assert_status_ok();
        assert!(response.text().contains("No entries recorded yet"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_entry_changes_only_that_row(pool: SqlitePool) {
        let app = create_test_app(pool.clone()).await;
        let target = create_test_entry(&pool, "2024-02-01", "Sleep Hours", 6.0).await;
        let other = create_test_entry(&pool, "2024-02-01", "Calories", 2000.0).await;

        let response = app
            .post(&format!("/update_entry/{}", target.id))
            .json(&json!({"field": "metric_value", "value": "7.25"}))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<StatusResponse>(), StatusResponse::success());

        assert_eq!(get_entry(&pool, target.id).await.unwrap().metric_value, 7.25);
        assert_eq!(get_entry(&pool, other.id).await.unwrap(), other);

        let listing = app.get("/entries").await.text();
        assert!(listing.contains(">7.25<"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_entry_accepts_json_number(pool: SqlitePool) {
        let app = create_test_app(pool.clone()).await;
        let entry = create_test_entry(&pool, "2024-02-01", "Mood", 2.0).await;

        let response = app
            .post(&format!("/update_entry/{}", entry.id))
            .json(&json!({"field": "metric_value", "value": 3}))
            .await;

        response.assert_status_ok();
        assert_eq!(get_entry(&pool, entry.id).await.unwrap().metric_value, 3.0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_entry_keeps_extreme_magnitudes(pool: SqlitePool) {
        let app = create_test_app(pool.clone()).await;
        let entry = create_test_entry(&pool, "2024-02-01", "Calories", 1800.0).await;

        app.post(&format!("/update_entry/{}", entry.id))
            .json(&json!({"field": "metric_value", "value": "100000000000000000000000000000"}))
            .await
            .assert_status_ok();
        assert_eq!(get_entry(&pool, entry.id).await.unwrap().metric_value, 1e29);

        app.post(&format!("/update_entry/{}", entry.id))
            .json(&json!({"field": "metric_value", "value": "0.000000000000000000000000000001"}))
            .await
            .assert_status_ok();
        let stored = get_entry(&pool, entry.id).await.unwrap().metric_value;
        assert!(stored > 0.0);
        assert_eq!(stored, 1e-30);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_entry_rejects_non_numeric_value(pool: SqlitePool) {
        let app = create_test_app(pool.clone()).await;
        let entry = create_test_entry(&pool, "2024-02-01", "Calories", 1800.0).await;

        let response = app
            .post(&format!("/update_entry/{}", entry.id))
            .json(&json!({"field": "metric_value", "value": "not-a-number"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: StatusResponse = response.json();
        assert_eq!(body.status, Status::Error);
        assert!(body.message.is_some());

        assert_eq!(get_entry(&pool, entry.id).await.unwrap(), entry);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_entry_rejects_field_outside_allow_list(pool: SqlitePool) {
        let app = create_test_app(pool.clone()).await;
        let entry = create_test_entry(&pool, "2024-02-01", "Calories", 1800.0).await;

        for field in ["name", "date", "id", "metric_value = 0 --"] {
            let response = app
                .post(&format!("/update_entry/{}", entry.id))
                .json(&json!({"field": field, "value": "5"}))
                .await;

            response.assert_status(StatusCode::BAD_REQUEST);
            assert_eq!(response.json::<StatusResponse>(), StatusResponse::error("Invalid field"));
        }

        assert_eq!(get_entry(&pool, entry.id).await.unwrap(), entry);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_missing_entry_is_not_found(pool: SqlitePool) {
        let app = create_test_app(pool.clone()).await;

        let response = app
            .post("/update_entry/4242")
            .json(&json!({"field": "metric_value", "value": "5"}))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<StatusResponse>().status, Status::Error);
        assert_eq!(count_entries(&pool).await, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_entry_malformed_requests(pool: SqlitePool) {
        let app = create_test_app(pool.clone()).await;
        let entry = create_test_entry(&pool, "2024-02-01", "Mood", 2.0).await;

        let missing_value = app
            .post(&format!("/update_entry/{}", entry.id))
            .json(&json!({"field": "metric_value"}))
            .await;
        missing_value.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(missing_value.json::<StatusResponse>().status, Status::Error);

        let not_json = app.post(&format!("/update_entry/{}", entry.id)).text("metric_value=5").await;
        not_json.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(not_json.json::<StatusResponse>().status, Status::Error);

        let bad_id = app
            .post("/update_entry/abc")
            .json(&json!({"field": "metric_value", "value": "5"}))
            .await;
        bad_id.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(bad_id.json::<StatusResponse>().status, Status::Error);

        assert_eq!(get_entry(&pool, entry.id).await.unwrap(), entry);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_sequential_updates_last_write_wins(pool: SqlitePool) {
        let app = create_test_app(pool.clone()).await;
        let entry = create_test_entry(&pool, "2024-02-01", "Mood", 1.0).await;

        for value in ["5", "7"] {
            app.post(&format!("/update_entry/{}", entry.id))
                .json(&json!({"field": "metric_value", "value": value}))
                .await
                .assert_status_ok();
        }

        assert_eq!(get_entry(&pool, entry.id).await.unwrap().metric_value, 7.0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_entry_removes_exactly_one_row(pool: SqlitePool) {
        let app = create_test_app(pool.clone()).await;
        let gone = create_test_entry(&pool, "2024-02-01", "Mood", 3.0).await;
        create_test_entry(&pool, "2024-02-02", "Mood", 4.0).await;
        create_test_entry(&pool, "2024-02-02", "Calories", 2100.0).await;

        let response = app.post(&format!("/delete/{}", gone.id)).await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get("location").unwrap(), "/entries");
        assert_eq!(count_entries(&pool).await, 2);
        assert!(get_entry(&pool, gone.id).await.is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_missing_entry_still_redirects(pool: SqlitePool) {
        let app = create_test_app(pool.clone()).await;
        create_test_entry(&pool, "2024-02-01", "Mood", 3.0).await;

        let response = app.post("/delete/999").await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get("location").unwrap(), "/entries");
        assert_eq!(count_entries(&pool).await, 1);
    }
}
