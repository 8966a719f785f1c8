//! Request extractors.

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;
use utm_core::{Depth, Error, ValidationErrorCode};

use crate::response::ApiError;
use crate::state::AppState;

/// Raw depth selection from the query string.
///
/// Either an explicit `depth=term`, or the dashboard's filter checkboxes
/// (`source=on&medium=on`).
#[derive(Debug, Default, Deserialize)]
pub struct DepthQuery {
    pub depth: Option<String>,
    pub source: Option<String>,
    pub medium: Option<String>,
    pub campaign: Option<String>,
    pub term: Option<String>,
}

impl DepthQuery {
    /// Resolve to a depth. An explicit depth wins over the flags; with
    /// neither, `default` applies.
    pub fn resolve(&self, default: Depth) -> Result<Depth, Error> {
        if let Some(depth) = self.depth.as_deref().filter(|d| !d.trim().is_empty()) {
            return depth.parse();
        }

        let flags = [&self.source, &self.medium, &self.campaign, &self.term];
        if flags.iter().all(|f| f.is_none()) {
            return Ok(default);
        }

        let [source, medium, campaign, term] = flags.map(|f| is_checked(f.as_deref()));
        Depth::from_flags(source, medium, campaign, term).ok_or_else(|| {
            Error::validation_code(
                ValidationErrorCode::InvalidDepth,
                "filters must select source, then optionally medium, campaign and term in order",
            )
        })
    }
}

fn is_checked(value: Option<&str>) -> bool {
    match value {
        None => false,
        Some(v) => !matches!(v.trim().to_ascii_lowercase().as_str(), "false" | "0" | "off"),
    }
}

/// The grouping depth selected by the request.
#[derive(Debug, Clone, Copy)]
pub struct SelectedDepth(pub Depth);

#[async_trait]
impl FromRequestParts<AppState> for SelectedDepth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<DepthQuery>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;

        Ok(SelectedDepth(query.resolve(state.default_depth)?))
    }
}
