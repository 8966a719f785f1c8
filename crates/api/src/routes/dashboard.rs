//! Dashboard page.

use axum::{
    extract::{RawQuery, State},
    response::Html,
};
use telemetry::metrics;
use tracing::{info, warn};
use utm_core::capture_from_query;

use crate::extractors::SelectedDepth;
use crate::html::render_page;
use crate::response::ApiError;
use crate::state::AppState;

/// GET / - Capture the visit's UTM parameters, then render the table.
///
/// A visit carrying no UTM values is not recorded. Capture failures are
/// shown on the page instead of failing it.
pub async fn dashboard_handler(
    State(state): State<AppState>,
    SelectedDepth(depth): SelectedDepth,
    RawQuery(query): RawQuery,
) -> Result<Html<String>, ApiError> {
    let mut notices = Vec::new();

    match capture_from_query(query.as_deref().unwrap_or_default()) {
        Ok(Some(record)) => {
            metrics().records_received.inc();
            match state.store.insert(record).await {
                Ok(stored) => {
                    info!(id = stored.id.as_deref().unwrap_or_default(), "Captured visit");
                    notices.push("Visit recorded".to_string());
                }
                Err(e) => {
                    warn!(error = %e, "Failed to store captured visit");
                    notices.push(format!("Could not record visit: {}", e));
                }
            }
        }
        Ok(None) => {}
        Err(e) => {
            metrics().records_rejected.inc();
            warn!(error = %e, "Rejected captured UTM parameters");
            notices.push(format!("UTM parameters rejected: {}", e));
        }
    }

    let view = match state.refresh.refresh(state.store.as_ref(), depth).await {
        Ok(outcome) => outcome.view,
        Err(e) => match state.refresh.current() {
            Some(previous) => {
                notices.push(format!("Refresh failed, showing the last table: {}", e));
                previous
            }
            None => return Err(e.into()),
        },
    };

    let notice = (!notices.is_empty()).then(|| notices.join(". "));
    Ok(Html(render_page(&view.grid, notice.as_deref())))
}
