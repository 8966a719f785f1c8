//! Size limits for captured attribution data.
//!
//! Labels are stored as free text; these bounds keep a single visit from
//! blowing up the header catalog or the stored row.
//!
//! The `#[validate]` derive macro requires literal values in attributes,
//! so `MAX_LABEL_LEN` is duplicated on `NewRecord`; a record test pins the
//! two together.

/// Maximum length of a single UTM label in chars.
pub const MAX_LABEL_LEN: usize = 255;

/// Maximum request body size for a single record submission (16KB).
pub const MAX_RECORD_BODY_BYTES: usize = 16 * 1024;

/// Maximum snapshot body size accepted by the render endpoint (8MB).
///
/// Snapshots are whole-table dumps, the dataset is small and bounded.
pub const MAX_SNAPSHOT_BODY_BYTES: usize = 8 * 1024 * 1024;
