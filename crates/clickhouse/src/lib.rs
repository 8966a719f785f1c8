//! ClickHouse record store for UTM attribution data.

pub mod client;
pub mod config;
pub mod health;
pub mod query;
pub mod schema;
pub mod store;

pub use client::*;
pub use config::*;
pub use health::check_connection;
pub use query::*;
pub use schema::init_schema;
pub use store::{RecordStore, UtmRow};
