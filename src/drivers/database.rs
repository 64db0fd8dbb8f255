use std::{str::FromStr, time::Duration};

use log::LevelFilter;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    ConnectOptions, SqlitePool,
};

use crate::{
    config::DriverSettings,
    errors::{ConfigurationError, DeliveryError},
    logging::{Driver, Event, Severity},
};

use super::runtime::DriverRuntime;

const CREATE_LOGS_TABLE: &str = "create table if not exists logs (
    id          integer primary key autoincrement,
    timestamp   text not null,
    level       text not null,
    message     text not null,
    metadata    text,
    trace_id    text
)";

/// Inserts each event as a row of the `logs` table in a SQLite database.
pub struct DatabaseDriver {
    level: Severity,
    pool: SqlitePool,
    runtime: DriverRuntime,
}

impl DatabaseDriver {
    /// Opens (creating if needed) the database at `dsn` and ensures the
    /// `logs` table exists. `dsn` is a `sqlite:` URL or a plain file path.
    pub fn connect(
        level: Severity,
        dsn: &str,
        timeout: Duration,
    ) -> Result<Self, ConfigurationError> {
        let opts = SqliteConnectOptions::from_str(dsn)
            .map_err(|err| ConfigurationError::InvalidSetting {
                driver: "database".to_string(),
                key: "dsn",
                reason: err.to_string(),
            })?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .create_if_missing(true)
            // Statement records would be routed back here once a dispatcher
            // is installed as the `log` backend.
            .log_statements(LevelFilter::Off);

        let runtime = DriverRuntime::new("database", timeout)
            .map_err(|err| ConfigurationError::unavailable("database", err))?;

        let pool = runtime
            .run(async move {
                let pool = SqlitePoolOptions::new()
                    .acquire_timeout(timeout)
                    .connect_with(opts)
                    .await
                    .map_err(DeliveryError::transport)?;

                Self::setup_db(&pool).await?;

                Ok(pool)
            })
            .map_err(|err| ConfigurationError::unavailable("database", err))?;

        Ok(Self {
            level,
            pool,
            runtime,
        })
    }

    async fn setup_db(pool: &SqlitePool) -> Result<(), DeliveryError> {
        sqlx::query(CREATE_LOGS_TABLE)
            .execute(pool)
            .await
            .map_err(DeliveryError::transport)?;

        Ok(())
    }

    pub(crate) fn from_settings(
        settings: &DriverSettings<'_>,
    ) -> Result<Self, ConfigurationError> {
        Self::connect(
            settings.level()?,
            settings.required_str("dsn")?,
            settings.timeout()?,
        )
    }

    #[cfg(test)]
    fn rows(&self) -> Result<Vec<(String, String, Option<String>, Option<String>)>, DeliveryError> {
        let pool = self.pool.clone();
        self.runtime.run(async move {
            sqlx::query_as("select level, message, metadata, trace_id from logs order by id")
                .fetch_all(&pool)
                .await
                .map_err(DeliveryError::transport)
        })
    }
}

impl Driver for DatabaseDriver {
    fn deliver(&self, event: &Event) -> Result<(), DeliveryError> {
        if event.level() < self.level {
            return Ok(());
        }

        let metadata = if event.metadata().is_empty() {
            None
        } else {
            Some(serde_json::to_string(event.metadata())?)
        };
        let timestamp = event.timestamp();
        let level = event.level().as_str();
        let message = event.message().to_string();
        let trace_id = event.trace_id().map(str::to_string);
        let pool = self.pool.clone();

        self.runtime.run(async move {
            sqlx::query(
                "insert into logs(timestamp, level, message, metadata, trace_id)
                values(?1, ?2, ?3, ?4, ?5)",
            )
            .bind(timestamp)
            .bind(level)
            .bind(message)
            .bind(metadata)
            .bind(trace_id)
            .execute(&pool)
            .await
            .map_err(|err| {
                DeliveryError::transport(format!("failed to insert log into database: {}", err))
            })?;

            Ok(())
        })
    }

    fn name(&self) -> &str {
        "database"
    }
}

impl Drop for DatabaseDriver {
    fn drop(&mut self) {
        let pool = self.pool.clone();
        let _ = self.runtime.run(async move {
            pool.close().await;
            Ok(())
        });
    }
}
