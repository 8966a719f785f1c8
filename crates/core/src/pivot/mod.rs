//! Pivot aggregation of attribution records.
//!
//! A single implementation serves every grouping depth: the depth decides
//! how many UTM dimensions participate in the key path, and the sentinel
//! and increment rules are shared.

pub mod render;
pub mod tree;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, ValidationErrorCode};
use crate::record::{AttributionRecord, DayKey, UtmField};

pub use render::{render, CellKind, DataCell, DataRow, Grid, HeaderCell, HeaderRow};
pub use tree::{HeaderCatalog, HeaderCatalogBuilder, HeaderNode, RowCatalog, RowNode};

/// Active grouping depth.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Depth {
    /// Source only
    Source,
    /// Source + medium
    Medium,
    /// Source + medium + campaign
    #[default]
    Campaign,
    /// Source + medium + campaign + term
    Term,
}

impl Depth {
    pub const ALL: [Depth; 4] = [Self::Source, Self::Medium, Self::Campaign, Self::Term];

    /// Number of UTM dimensions in the key path.
    pub fn levels(&self) -> usize {
        match self {
            Self::Source => 1,
            Self::Medium => 2,
            Self::Campaign => 3,
            Self::Term => 4,
        }
    }

    /// The participating dimensions, outermost first.
    pub fn fields(&self) -> &'static [UtmField] {
        &UtmField::ALL[..self.levels()]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Medium => "medium",
            Self::Campaign => "campaign",
            Self::Term => "term",
        }
    }

    /// Resolve the dashboard filter checkboxes to a depth.
    ///
    /// Only contiguous prefixes starting at `source` are meaningful.
    pub fn from_flags(source: bool, medium: bool, campaign: bool, term: bool) -> Option<Self> {
        match (source, medium, campaign, term) {
            (true, true, true, true) => Some(Self::Term),
            (true, true, true, false) => Some(Self::Campaign),
            (true, true, false, false) => Some(Self::Medium),
            (true, false, false, false) => Some(Self::Source),
            _ => None,
        }
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Depth {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "source" => Ok(Self::Source),
            "medium" => Ok(Self::Medium),
            "campaign" => Ok(Self::Campaign),
            "term" => Ok(Self::Term),
            other => Err(Error::validation_code(
                ValidationErrorCode::InvalidDepth,
                format!("unknown depth '{}', expected source|medium|campaign|term", other),
            )),
        }
    }
}

/// Header and row catalogs for one depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pivot {
    pub depth: Depth,
    pub headers: HeaderCatalog,
    pub rows: RowCatalog,
    pub record_count: u64,
}

/// Accumulates records into the two catalogs.
#[derive(Debug)]
pub struct PivotBuilder {
    depth: Depth,
    headers: HeaderCatalogBuilder,
    rows: BTreeMap<DayKey, RowNode>,
    record_count: u64,
}

impl PivotBuilder {
    pub fn new(depth: Depth) -> Self {
        Self {
            depth,
            headers: HeaderCatalogBuilder::new(depth.levels()),
            rows: BTreeMap::new(),
            record_count: 0,
        }
    }

    /// Add one record. Records without labels land under the sentinels.
    pub fn add(&mut self, record: &AttributionRecord) {
        let key = record.grouping_key();
        let levels = self.depth.levels();

        self.headers.register(key.path(levels));

        // At term depth the row tree keeps one more level: per-content counts.
        let row_levels = if self.depth == Depth::Term { levels + 1 } else { levels };
        self.rows
            .entry(key.day)
            .or_default()
            .tally(key.path(row_levels));

        self.record_count += 1;
    }

    pub fn finish(self) -> Pivot {
        Pivot {
            depth: self.depth,
            headers: self.headers.finish(),
            rows: RowCatalog::from_days(self.rows),
            record_count: self.record_count,
        }
    }
}

/// Pivot a full record snapshot at the given depth.
pub fn aggregate<'a, I>(depth: Depth, records: I) -> Pivot
where
    I: IntoIterator<Item = &'a AttributionRecord>,
{
    let mut builder = PivotBuilder::new(depth);
    for record in records {
        builder.add(record);
    }
    builder.finish()
}
