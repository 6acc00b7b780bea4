use thiserror::Error;

/// Unified error type for database operations that application code can handle
#[derive(Error, Debug)]
pub enum DbError {
    /// Entity not found by the given identifier
    #[error("Entity not found")]
    NotFound,

    /// Catch-all for non-recoverable errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convert from sqlx::Error, keeping only the distinction callers act on
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            // Writes are upserts and the schema has no CHECK constraints, so constraint
            // failures are as unrecoverable as pool timeouts or I/O errors
            _ => DbError::Other(anyhow::Error::from(err)),
        }
    }
}

/// Type alias for database operation results
pub type Result<T> = std::result::Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::SqlitePool;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert!(matches!(DbError::from(sqlx::Error::RowNotFound), DbError::NotFound));
    }

    #[test]
    fn test_pool_errors_are_not_recoverable() {
        assert!(matches!(DbError::from(sqlx::Error::PoolTimedOut), DbError::Other(_)));
    }

    #[sqlx::test]
    async fn test_constraint_violations_are_not_recoverable(pool: SqlitePool) {
        let err = sqlx::query("INSERT INTO metric_entries (date, name, metric_value) VALUES ('2024-01-01', 'Mood', NULL)")
            .execute(&pool)
            .await
            .unwrap_err();
        assert!(matches!(DbError::from(err), DbError::Other(_)));

        sqlx::query("INSERT INTO metric_entries (date, name, metric_value) VALUES ('2024-01-01', 'Mood', 1.0)")
            .execute(&pool)
            .await
            .unwrap();
        let err = sqlx::query("INSERT INTO metric_entries (date, name, metric_value) VALUES ('2024-01-01', 'Mood', 2.0)")
            .execute(&pool)
            .await
            .unwrap_err();
        assert!(matches!(DbError::from(err), DbError::Other(_)));
    }
}
