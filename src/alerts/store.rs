//! SQLite persistence for alert thresholds and the alert log
//!
//! The two tables are independent: nothing joins a log entry back to the
//! threshold it was compared against.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use super::model::{NewAlertLog, NewAlertThreshold};

const CREATE_THRESHOLDS: &str = r#"
    CREATE TABLE IF NOT EXISTS alert_thresholds (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        location_name VARCHAR(100) NOT NULL,
        parameter VARCHAR(50) NOT NULL,
        threshold_value REAL NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT 1
    )
"#;

const CREATE_ALERT_LOG: &str = r#"
    CREATE TABLE IF NOT EXISTS alert_log (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        location_name VARCHAR(100) NOT NULL,
        parameter VARCHAR(50) NOT NULL,
        triggered_value REAL NOT NULL,
        threshold_value REAL NOT NULL,
        log_message TEXT NOT NULL,
        is_resolved BOOLEAN NOT NULL DEFAULT 0
    )
"#;

#[derive(Clone)]
pub struct AlertStore {
    pool: SqlitePool,
}

impl AlertStore {
    /// Connect to a database URL such as `sqlite://riverwatch.db`.
    /// The database file is created if missing.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Private in-memory database. A single long-lived connection keeps the
    /// data alive for the life of the pool.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create both tables if they do not exist
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_THRESHOLDS).execute(&self.pool).await?;
        sqlx::query(CREATE_ALERT_LOG).execute(&self.pool).await?;
        Ok(())
    }

    /// Insert the default threshold when the table is empty.
    /// Returns whether a row was inserted.
    pub async fn seed_default_threshold(&self) -> Result<bool, StoreError> {
        if self.count_thresholds().await? > 0 {
            return Ok(false);
        }

        self.insert_threshold(&NewAlertThreshold::seed()).await?;
        tracing::info!("Initial alert threshold added to the database");
        Ok(true)
    }

    pub async fn count_thresholds(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM alert_thresholds")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn insert_threshold(&self, threshold: &NewAlertThreshold) -> Result<i64, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO alert_thresholds (location_name, parameter, threshold_value, is_active)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&threshold.location_name)
        .bind(&threshold.parameter)
        .bind(threshold.threshold_value)
        .bind(threshold.is_active)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn count_alert_logs(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM alert_log")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Append an alert. The insert runs in its own transaction, which rolls
    /// back when dropped uncommitted.
    pub async fn insert_alert_log(&self, alert: &NewAlertLog) -> Result<i64, StoreError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO alert_log
                (location_name, parameter, triggered_value, threshold_value, log_message)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&alert.location_name)
        .bind(&alert.parameter)
        .bind(alert.triggered_value)
        .bind(alert.threshold_value)
        .bind(&alert.log_message)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.last_insert_rowid())
    }

    /// Log the fixed simulated exceedance. No real comparison is made.
    pub async fn trigger_placeholder_alert(&self) -> Result<i64, StoreError> {
        let alert = NewAlertLog::placeholder();
        let id = self.insert_alert_log(&alert).await?;

        tracing::warn!(
            alert_id = id,
            location = %alert.location_name,
            parameter = %alert.parameter,
            triggered_value = alert.triggered_value,
            threshold_value = alert.threshold_value,
            "Placeholder alert logged"
        );

        Ok(id)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> AlertStore {
        let store = AlertStore::in_memory().await.unwrap();
        store.init_schema().await.unwrap();
        store
    }

    type LogRow = (String, String, f64, f64, bool);

    async fn fetch_log_row(store: &AlertStore, id: i64) -> LogRow {
        sqlx::query_as(
            r#"
            SELECT location_name, parameter, triggered_value, threshold_value, is_resolved
            FROM alert_log
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_one(store.pool())
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_seed_inserts_once() {
        let store = test_store().await;
        assert_eq!(store.count_thresholds().await.unwrap(), 0);

        assert!(store.seed_default_threshold().await.unwrap());
        assert!(!store.seed_default_threshold().await.unwrap());
        assert_eq!(store.count_thresholds().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_init_schema_is_idempotent() {
        let store = test_store().await;
        store.seed_default_threshold().await.unwrap();
        store.init_schema().await.unwrap();
        assert_eq!(store.count_thresholds().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_count_tracks_inserts() {
        let store = test_store().await;
        store
            .insert_threshold(&NewAlertThreshold::new("Shiroli", "STAGE", 543.0))
            .await
            .unwrap();
        store
            .insert_threshold(&NewAlertThreshold::new("Ichalkaranji", "FLOW", 2_100.0).with_active(false))
            .await
            .unwrap();

        assert_eq!(store.count_thresholds().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_placeholder_alert_is_unresolved() {
        let store = test_store().await;

        let id = store.trigger_placeholder_alert().await.unwrap();
        let (location, parameter, triggered, threshold, is_resolved) =
            fetch_log_row(&store, id).await;

        assert_eq!(location, "Rajaram Bridge");
        assert_eq!(parameter, "FLOW");
        assert_eq!(triggered, 99_999.99);
        assert_eq!(threshold, 50_000.0);
        assert!(!is_resolved);
    }

    #[tokio::test]
    async fn test_placeholder_alert_appends() {
        let store = test_store().await;

        let first = store.trigger_placeholder_alert().await.unwrap();
        let second = store.trigger_placeholder_alert().await.unwrap();

        assert_ne!(first, second);
        assert_eq!(store.count_alert_logs().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_insert_without_schema_fails() {
        let store = AlertStore::in_memory().await.unwrap();
        let err = store.trigger_placeholder_alert().await.unwrap_err();
        assert!(matches!(err, StoreError::Database(_)));
    }
}
