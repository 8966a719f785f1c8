//! Maintenance queries (used in tests and admin).

use crate::client::ClickHouseClient;
use utm_core::{Error, Result};

/// Count stored records.
pub async fn count_records(client: &ClickHouseClient) -> Result<u64> {
    let sql = format!("SELECT count() FROM {}", client.config().table());
    let count: u64 = client
        .inner()
        .query(&sql)
        .fetch_one()
        .await
        .map_err(|e| Error::store(format!("Query error: {}", e)))?;
    Ok(count)
}

/// Truncate the records table (test cleanup).
pub async fn truncate_records(client: &ClickHouseClient) -> Result<()> {
    let sql = format!("TRUNCATE TABLE IF EXISTS {}", client.config().table());
    client
        .inner()
        .query(&sql)
        .execute()
        .await
        .map_err(|e| Error::store(format!("Truncate error: {}", e)))?;
    Ok(())
}
