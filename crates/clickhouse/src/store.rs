//! Record persistence.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use clickhouse::Row;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use telemetry::{health, metrics};
use tracing::{debug, warn};
use utm_core::{AttributionRecord, Error, NewRecord, Result};
use uuid::Uuid;

use crate::client::ClickHouseClient;

/// Storage seam between the HTTP layer and the database.
///
/// ClickHouse in production, an in-memory store in tests.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist one record, assigning its id and creation time.
    async fn insert(&self, record: NewRecord) -> Result<AttributionRecord>;

    /// Every stored record, newest first.
    async fn list_all(&self) -> Result<Vec<AttributionRecord>>;

    /// Last known health of the backing store.
    fn is_healthy(&self) -> bool;
}

/// Row layout of the `utm_data` table.
#[derive(Debug, Clone, Row, Serialize, Deserialize)]
pub struct UtmRow {
    pub id: String,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
    pub created_at: i64, // DateTime64(3) as milliseconds
}

impl From<&AttributionRecord> for UtmRow {
    fn from(record: &AttributionRecord) -> Self {
        Self {
            id: record.id.clone().unwrap_or_default(),
            utm_source: record.utm_source.clone(),
            utm_medium: record.utm_medium.clone(),
            utm_campaign: record.utm_campaign.clone(),
            utm_term: record.utm_term.clone(),
            utm_content: record.utm_content.clone(),
            created_at: record.created_at.map_or(0, |ts| ts.timestamp_millis()),
        }
    }
}

impl From<UtmRow> for AttributionRecord {
    fn from(row: UtmRow) -> Self {
        let created_at: Option<DateTime<Utc>> = Utc.timestamp_millis_opt(row.created_at).single();
        Self {
            id: Some(row.id),
            utm_source: row.utm_source,
            utm_medium: row.utm_medium,
            utm_campaign: row.utm_campaign,
            utm_term: row.utm_term,
            utm_content: row.utm_content,
            created_at,
        }
    }
}

const SELECT_COLUMNS: &str =
    "id, utm_source, utm_medium, utm_campaign, utm_term, utm_content, created_at";

#[async_trait]
impl RecordStore for ClickHouseClient {
    async fn insert(&self, record: NewRecord) -> Result<AttributionRecord> {
        let start = Instant::now();
        let stored = AttributionRecord::from_new(Uuid::new_v4().to_string(), record, Utc::now());
        let row = UtmRow::from(&stored);

        let fail = |stage: &str, e: clickhouse::error::Error| {
            metrics().insert_errors.inc();
            warn!(error = %e, stage, "ClickHouse insert failed");
            Error::store(format!("{} error: {}", stage, e))
        };

        let mut insert = self
            .inner()
            .insert::<UtmRow>(&self.config().table())
            .map_err(|e| fail("Insert", e))?;
        insert.write(&row).await.map_err(|e| fail("Write", e))?;
        insert.end().await.map_err(|e| fail("End", e))?;

        let elapsed = start.elapsed();
        metrics().store_latency_ms.observe(elapsed.as_millis() as u64);
        metrics().records_inserted.inc();

        debug!(
            id = %row.id,
            latency_ms = %elapsed.as_millis(),
            "Inserted UTM record"
        );

        Ok(stored)
    }

    async fn list_all(&self) -> Result<Vec<AttributionRecord>> {
        let start = Instant::now();
        let sql = format!(
            "SELECT {} FROM {} ORDER BY created_at DESC",
            SELECT_COLUMNS,
            self.config().table()
        );

        let rows: Vec<UtmRow> = self
            .inner()
            .query(&sql)
            .fetch_all()
            .await
            .map_err(|e| {
                metrics().query_errors.inc();
                warn!(error = %e, "ClickHouse list query failed");
                Error::store(format!("Query error: {}", e))
            })?;

        metrics().store_latency_ms.observe(start.elapsed().as_millis() as u64);
        debug!(count = rows.len(), "Fetched UTM records");

        Ok(rows.into_iter().map(AttributionRecord::from).collect())
    }

    fn is_healthy(&self) -> bool {
        health().store.is_healthy()
    }
}
