use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

use shared::domain::EventId;

const EVENT_COLUMNS: &str = "id, title, category, start_at, end_at, color, created_at, updated_at";

/// Validated field set written on insert and on full replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub title: String,
    pub category: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEvent {
    pub event_id: EventId,
    pub title: String,
    pub category: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persistence seam for event records.
///
/// Lookups by id report absence through `Option`/`bool`; `Err` is reserved
/// for store failures.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn health_check(&self) -> Result<()>;
    async fn insert_event(&self, event: &NewEvent) -> Result<StoredEvent>;
    /// All events in insertion order.
    async fn list_events(&self) -> Result<Vec<StoredEvent>>;
    async fn replace_event(
        &self,
        event_id: &EventId,
        event: &NewEvent,
    ) -> Result<Option<StoredEvent>>;
    async fn delete_event(&self, event_id: &EventId) -> Result<bool>;
}

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every connection to `:memory:` opens a fresh database, so pin it to one.
        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(connect_options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl EventStore for Storage {
    async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    async fn insert_event(&self, event: &NewEvent) -> Result<StoredEvent> {
        let event_id = EventId::generate();
        let now = Utc::now();
        let row = sqlx::query(&format!(
            "INSERT INTO events (id, title, category, start_at, end_at, color, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(event_id.as_str())
        .bind(&event.title)
        .bind(&event.category)
        .bind(event.start)
        .bind(event.end)
        .bind(event.color.as_deref())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert event")?;
        debug!(event_id = %event_id, "event row inserted");
        stored_event_from_row(&row)
    }

    async fn list_events(&self) -> Result<Vec<StoredEvent>> {
        let rows = sqlx::query(&format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY seq ASC"))
            .fetch_all(&self.pool)
            .await
            .context("failed to list events")?;
        rows.iter().map(stored_event_from_row).collect()
    }

    async fn replace_event(
        &self,
        event_id: &EventId,
        event: &NewEvent,
    ) -> Result<Option<StoredEvent>> {
        let row = sqlx::query(&format!(
            "UPDATE events
             SET title = ?, category = ?, start_at = ?, end_at = ?, color = ?, updated_at = ?
             WHERE id = ?
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(&event.title)
        .bind(&event.category)
        .bind(event.start)
        .bind(event.end)
        .bind(event.color.as_deref())
        .bind(Utc::now())
        .bind(event_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to update event {event_id}"))?;
        row.as_ref().map(stored_event_from_row).transpose()
    }

    async fn delete_event(&self, event_id: &EventId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(event_id.as_str())
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete event {event_id}"))?;
        Ok(result.rows_affected() == 1)
    }
}

fn stored_event_from_row(row: &SqliteRow) -> Result<StoredEvent> {
    Ok(StoredEvent {
        event_id: EventId(row.try_get("id")?),
        title: row.try_get("title")?,
        category: row.try_get("category")?,
        start: row.try_get("start_at")?,
        end: row.try_get("end_at")?,
        color: row.try_get("color")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.contains(":memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
