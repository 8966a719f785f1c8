//! Record submission and listing.

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use telemetry::metrics;
use tracing::{debug, info, warn};
use utm_core::{
    limits::MAX_RECORD_BODY_BYTES, AttributionRecord, Error, NewRecord, ValidationErrorCode,
};

use crate::response::{ApiError, SaveResponse};
use crate::state::AppState;

/// Validate and persist one submitted record.
async fn store_record(state: &AppState, body: &[u8]) -> Result<AttributionRecord, ApiError> {
    metrics().records_received.inc();

    if body.len() > MAX_RECORD_BODY_BYTES {
        metrics().records_rejected.inc();
        return Err(Error::validation_code(
            ValidationErrorCode::PayloadTooLarge,
            format!(
                "Payload size {}KB exceeds {}KB limit",
                body.len() / 1024,
                MAX_RECORD_BODY_BYTES / 1024
            ),
        )
        .into());
    }

    let record = NewRecord::parse(body).map_err(|e| {
        metrics().records_rejected.inc();
        warn!(error = %e, "Rejected UTM record");
        e
    })?;

    let stored = state.store.insert(record).await?;
    info!(
        id = stored.id.as_deref().unwrap_or_default(),
        source = stored.utm_source.as_deref().unwrap_or_default(),
        "Stored UTM record"
    );
    Ok(stored)
}

/// POST /add-utm - Store one record, 201 with its id.
pub async fn add_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<SaveResponse>), ApiError> {
    let stored = store_record(&state, &body).await?;
    Ok((
        StatusCode::CREATED,
        Json(SaveResponse::saved(stored.id.unwrap_or_default())),
    ))
}

/// POST /save-utm-data - Same as `/add-utm`, answering 200.
pub async fn save_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SaveResponse>, ApiError> {
    let stored = store_record(&state, &body).await?;
    Ok(Json(SaveResponse::saved(stored.id.unwrap_or_default())))
}

/// GET /utm-data - Every stored record, newest first.
pub async fn list_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<AttributionRecord>>, ApiError> {
    let records = state.store.list_all().await?;
    debug!(count = records.len(), "Listed UTM records");
    Ok(Json(records))
}
