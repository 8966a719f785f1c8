//! Pivot rendering endpoints.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use telemetry::metrics;
use tracing::{info, warn};
use utm_core::{
    limits::MAX_SNAPSHOT_BODY_BYTES, parse_snapshot, Error, ValidationErrorCode,
};

use crate::extractors::SelectedDepth;
use crate::response::{ApiError, PivotResponse};
use crate::state::AppState;

/// GET /pivot - Refresh from the store and return the grid.
pub async fn refresh_handler(
    State(state): State<AppState>,
    SelectedDepth(depth): SelectedDepth,
) -> Result<Json<PivotResponse>, ApiError> {
    let outcome = state.refresh.refresh(state.store.as_ref(), depth).await?;
    Ok(Json(PivotResponse::from_outcome(&outcome)))
}

/// POST /pivot - Render a caller-supplied snapshot.
///
/// Malformed records are skipped and listed in `skipped`. The result is
/// never published, so `/pivot/current` keeps showing store data.
pub async fn snapshot_handler(
    State(state): State<AppState>,
    SelectedDepth(depth): SelectedDepth,
    body: Bytes,
) -> Result<Json<PivotResponse>, ApiError> {
    if body.len() > MAX_SNAPSHOT_BODY_BYTES {
        return Err(Error::validation_code(
            ValidationErrorCode::PayloadTooLarge,
            format!(
                "Snapshot size {}KB exceeds {}KB limit",
                body.len() / 1024,
                MAX_SNAPSHOT_BODY_BYTES / 1024
            ),
        )
        .into());
    }

    let (records, errors) = parse_snapshot(&body)?;

    if !errors.is_empty() {
        metrics().snapshot_records_skipped.inc_by(errors.len() as u64);
        warn!(
            skipped = errors.len(),
            accepted = records.len(),
            "Skipped malformed snapshot records"
        );
    }

    let view = state.refresh.preview(depth, &records);
    info!(
        depth = %depth,
        records = records.len(),
        "Rendered snapshot"
    );

    let skipped = errors.iter().map(ToString::to_string).collect();
    Ok(Json(PivotResponse::from_view(&view, false).with_skipped(skipped)))
}

/// GET /pivot/current - The last published view, 204 if none.
pub async fn current_handler(State(state): State<AppState>) -> Response {
    match state.refresh.current() {
        Some(view) => Json(PivotResponse::from_view(&view, true)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
