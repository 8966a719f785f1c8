//! Core types, validation, and pivot aggregation for the UTM dashboard.

pub mod error;
pub mod limits;
pub mod params;
pub mod pivot;
pub mod record;

pub use error::{Error, Result, ValidationErrorCode};
pub use params::*;
pub use pivot::{aggregate, render, Depth, Grid, Pivot, PivotBuilder};
pub use record::*;
