//! Test utilities for HTTP-level and repository tests.

use crate::db::handlers::{Entries, Repository};
use crate::db::models::entries::{Entry, EntryCreateDBRequest, EntryFilter};
use crate::types::EntryId;
use axum_test::TestServer;
use chrono::NaiveDate;
use sqlx::SqlitePool;

pub async fn create_test_app(pool: SqlitePool) -> TestServer {
    let config = create_test_config();

    let app = crate::Application::new_with_pool(config, pool)
        .await
        .expect("Failed to create application");

    app.into_test_server()
}

pub fn create_test_config() -> crate::config::Config {
    crate::config::Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database: crate::config::DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        },
        ..Default::default()
    }
}

pub async fn create_test_entry(pool: &SqlitePool, date: &str, name: &str, value: f64) -> Entry {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let request = EntryCreateDBRequest {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("Invalid test date"),
        name: name.to_string(),
        metric_value: value,
    };

    Entries::new(&mut conn)
        .create(&request)
        .await
        .expect("Failed to create test entry")
}

pub async fn get_entry(pool: &SqlitePool, id: EntryId) -> Option<Entry> {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Entries::new(&mut conn).get_by_id(id).await.expect("Failed to fetch entry")
}

pub async fn list_all_entries(pool: &SqlitePool) -> Vec<Entry> {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Entries::new(&mut conn)
        .list(&EntryFilter::default())
        .await
        .expect("Failed to list entries")
}

pub async fn count_entries(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM metric_entries")
        .fetch_one(pool)
        .await
        .expect("Failed to count entries")
}
