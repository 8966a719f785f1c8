//! ClickHouse table schema.
//!
//! One row per captured visit. UTM columns are nullable; absent labels are
//! substituted at aggregation time, never in storage.

use crate::client::ClickHouseClient;
use tracing::debug;
use utm_core::{Error, Result};

/// Name of the records table inside the configured database.
pub const RECORDS_TABLE: &str = "utm_data";

/// SQL for creating the database.
pub fn create_database(database: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {}", database)
}

/// SQL for creating the records table.
pub fn create_records_table(database: &str) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {database}.{RECORDS_TABLE} (
    id String,
    utm_source Nullable(String),
    utm_medium Nullable(String),
    utm_campaign Nullable(String),
    utm_term Nullable(String),
    utm_content Nullable(String),
    created_at DateTime64(3, 'UTC')
)
ENGINE = MergeTree()
PARTITION BY toYYYYMM(created_at)
ORDER BY (created_at, id)
"#
    )
}

/// All schema statements, in execution order.
pub fn all_statements(database: &str) -> Vec<String> {
    vec![create_database(database), create_records_table(database)]
}

/// Initialize the database schema.
///
/// Creates the database and the records table if they don't exist.
pub async fn init_schema(client: &ClickHouseClient) -> Result<()> {
    let bootstrap = client.bootstrap();
    for sql in all_statements(&client.config().database) {
        bootstrap
            .query(&sql)
            .execute()
            .await
            .map_err(|e| Error::store(format!("Schema init error: {}", e)))?;
    }
    debug!(database = %client.config().database, "ClickHouse schema initialized");
    Ok(())
}
