//! HTTP API and dashboard for UTM attribution data.

pub mod extractors;
pub mod html;
pub mod refresh;
pub mod response;
pub mod routes;
pub mod state;

pub use refresh::{RefreshCoordinator, RefreshOutcome, RenderedView};
pub use routes::router;
pub use state::AppState;
