//! Refresh coordination.
//!
//! A refresh fetches the record snapshot, aggregates it and renders a grid.
//! Refreshes may overlap; each takes a ticket when it starts and its view is
//! published only if no later ticket has published first. The published
//! view is always swapped whole.

use chrono::{DateTime, Utc};
use clickhouse_client::RecordStore;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use telemetry::metrics;
use tracing::{debug, warn};
use utm_core::{aggregate, render, AttributionRecord, Depth, Grid, Result};

/// A rendered grid together with the refresh that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedView {
    pub ticket: u64,
    pub depth: Depth,
    pub rendered_at: DateTime<Utc>,
    pub grid: Grid,
}

/// Result of one refresh.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    /// The view this refresh rendered
    pub view: Arc<RenderedView>,
    /// False when a newer refresh had already published
    pub published: bool,
}

/// Latest-wins publisher of rendered views.
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    last_ticket: AtomicU64,
    published: RwLock<Option<Arc<RenderedView>>>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next ticket. Tickets start at 1 and only grow.
    pub fn begin(&self) -> u64 {
        self.last_ticket.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The most recently published view.
    pub fn current(&self) -> Option<Arc<RenderedView>> {
        self.published.read().clone()
    }

    /// Aggregate and render `records` under `ticket`, then try to publish.
    pub fn render(&self, ticket: u64, depth: Depth, records: &[AttributionRecord]) -> RefreshOutcome {
        let view = build_view(ticket, depth, records);
        let published = self.publish(view.clone());

        debug!(
            ticket,
            depth = %depth,
            records = records.len(),
            published,
            "Rendered pivot"
        );

        RefreshOutcome { view, published }
    }

    /// Render records that did not come from the store.
    ///
    /// The view carries ticket 0 and is never published.
    pub fn preview(&self, depth: Depth, records: &[AttributionRecord]) -> Arc<RenderedView> {
        build_view(0, depth, records)
    }

    /// Fetch the full snapshot from `store` and render it.
    ///
    /// A failed fetch leaves the published view untouched.
    pub async fn refresh(&self, store: &dyn RecordStore, depth: Depth) -> Result<RefreshOutcome> {
        let ticket = self.begin();
        metrics().refreshes.inc();

        let records = store.list_all().await.map_err(|e| {
            metrics().refresh_failures.inc();
            warn!(ticket, error = %e, "Refresh fetch failed");
            e
        })?;

        Ok(self.render(ticket, depth, &records))
    }

    fn publish(&self, view: Arc<RenderedView>) -> bool {
        let mut slot = self.published.write();
        match slot.as_ref() {
            Some(current) if current.ticket > view.ticket => {
                metrics().refreshes_superseded.inc();
                debug!(
                    stale = view.ticket,
                    current = current.ticket,
                    "Discarding superseded refresh"
                );
                false
            }
            _ => {
                *slot = Some(view);
                true
            }
        }
    }
}

fn build_view(ticket: u64, depth: Depth, records: &[AttributionRecord]) -> Arc<RenderedView> {
    let start = Instant::now();
    let grid = render(&aggregate(depth, records));
    metrics()
        .render_latency_ms
        .observe(start.elapsed().as_millis() as u64);

    Arc::new(RenderedView {
        ticket,
        depth,
        rendered_at: Utc::now(),
        grid,
    })
}
