//! Database repository for metric entries.

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::entries::{Entry, EntryCreateDBRequest, EntryDBResponse, EntryFilter, EntryOrder, EntryUpdateDBRequest},
    },
    types::EntryId,
};
use sqlx::SqliteConnection;
use tracing::instrument;

const LIST_NEWEST_FIRST: &str = r#"
    SELECT id, date, name, metric_value
    FROM metric_entries
    ORDER BY date DESC, id ASC
"#;

const LIST_OLDEST_FIRST: &str = r#"
    SELECT id, date, name, metric_value
    FROM metric_entries
    ORDER BY date ASC, id ASC
"#;

pub struct Entries<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Entries<'c> {
    /// Create a new Entries repository instance
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Most recent value recorded for a metric, by date
    #[instrument(skip(self), err)]
    pub async fn latest_value(&mut self, name: &str) -> Result<Option<f64>> {
        let value = sqlx::query_scalar::<_, f64>(
            r#"
            SELECT metric_value
            FROM metric_entries
            WHERE name = ?
            ORDER BY date DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(value)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Entries<'c> {
    type CreateRequest = EntryCreateDBRequest;
    type UpdateRequest = EntryUpdateDBRequest;
    type Response = EntryDBResponse;
    type Id = EntryId;
    type Filter = EntryFilter;

    #[instrument(skip(self, request), fields(date = %request.date, name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let entry = sqlx::query_as::<_, Entry>(
            r#"
            INSERT INTO metric_entries (date, name, metric_value)
            VALUES (?, ?, ?)
            ON CONFLICT (date, name) DO UPDATE SET metric_value = excluded.metric_value
            RETURNING id, date, name, metric_value
            "#,
        )
        .bind(request.date)
        .bind(&request.name)
        .bind(request.metric_value)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(entry)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let entry = sqlx::query_as::<_, Entry>("SELECT id, date, name, metric_value FROM metric_entries WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(entry)
    }

    #[instrument(skip(self, filter), fields(order = ?filter.order), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let query = match filter.order {
            EntryOrder::NewestFirst => LIST_NEWEST_FIRST,
            EntryOrder::OldestFirst => LIST_OLDEST_FIRST,
        };

        let entries = sqlx::query_as::<_, Entry>(query)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(entries)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM metric_entries WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let query = match request {
            EntryUpdateDBRequest::MetricValue(value) => sqlx::query_as::<_, Entry>(
                r#"
                UPDATE metric_entries
                SET metric_value = ?
                WHERE id = ?
                RETURNING id, date, name, metric_value
                "#,
            )
            .bind(*value),
        };

        let entry = query.bind(id).fetch_optional(&mut *self.db).await?;

        entry.ok_or(DbError::NotFound)
    }
}
