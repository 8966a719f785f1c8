//! Pivot rendering into a grid description.
//!
//! The grid is display-agnostic: header rows with colspan/rowspan, and one
//! data row per day. Column order follows the header catalog; the renderer
//! never re-sorts.
//!
//! Layout for a depth with `D` header rows:
//! - Row `L` holds one cell per header node at level `L`, spanning the
//!   columns of everything nested beneath it.
//! - Every non-leaf node is followed on its own row by a `Total` cell whose
//!   rowspan reaches the last header row.
//! - A `Grand Total` cell on the first row spans all `D` rows.

use serde::Serialize;

use super::tree::{HeaderNode, RowNode};
use super::{Depth, Pivot};

/// Label of the synthetic per-group subtotal column.
pub const TOTAL_LABEL: &str = "Total";

/// Label of the final column.
pub const GRAND_TOTAL_LABEL: &str = "Grand Total";

/// What a cell represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    /// A header spanning nested labels
    Group,
    /// A deepest-level label or count
    Leaf,
    /// A per-group subtotal
    Total,
    /// The per-row grand total
    GrandTotal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderCell {
    pub text: String,
    pub kind: CellKind,
    pub colspan: usize,
    pub rowspan: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderRow {
    /// Static label column ("Source", "Medium", ...)
    pub label: String,
    pub cells: Vec<HeaderCell>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataCell {
    pub value: u64,
    pub kind: CellKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataRow {
    /// ISO day key (`YYYY-MM-DD` or `unknown-date`)
    pub day: String,
    /// Display label (`dd-mm-yyyy`)
    pub label: String,
    pub cells: Vec<DataCell>,
}

impl DataRow {
    pub fn grand_total(&self) -> Option<u64> {
        self.cells
            .last()
            .filter(|c| c.kind == CellKind::GrandTotal)
            .map(|c| c.value)
    }
}

/// Display-ready pivot table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grid {
    pub depth: Depth,
    pub record_count: u64,
    pub header_rows: Vec<HeaderRow>,
    pub rows: Vec<DataRow>,
}

impl Grid {
    /// Number of data columns, excluding the label column.
    pub fn column_count(&self) -> usize {
        self.header_rows
            .first()
            .map_or(0, |row| row.cells.iter().map(|c| c.colspan).sum())
    }

    /// True when there is nothing but the label column to show.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.column_count() == 0
    }
}

/// Render a pivot into a grid.
pub fn render(pivot: &Pivot) -> Grid {
    let levels = pivot.depth.levels();
    let roots = pivot.headers.roots();

    let mut header_rows: Vec<HeaderRow> = pivot
        .depth
        .fields()
        .iter()
        .map(|field| HeaderRow {
            label: capitalize(field.as_str()),
            cells: Vec::new(),
        })
        .collect();

    for root in roots {
        push_header_cells(root, 0, levels, &mut header_rows);
    }

    if !roots.is_empty() {
        header_rows[0].cells.push(HeaderCell {
            text: GRAND_TOTAL_LABEL.to_string(),
            kind: CellKind::GrandTotal,
            colspan: 1,
            rowspan: levels,
        });
    }

    let rows = pivot
        .rows
        .days()
        .map(|(day, counts)| {
            let mut cells = Vec::new();
            let mut grand_total = 0;
            for root in roots {
                grand_total += push_data_cells(root, Some(counts), &mut cells);
            }
            if !roots.is_empty() {
                cells.push(DataCell {
                    value: grand_total,
                    kind: CellKind::GrandTotal,
                });
            }
            DataRow {
                day: day.to_string(),
                label: day.display_label(),
                cells,
            }
        })
        .collect();

    Grid {
        depth: pivot.depth,
        record_count: pivot.record_count,
        header_rows,
        rows,
    }
}

fn push_header_cells(node: &HeaderNode, level: usize, levels: usize, rows: &mut [HeaderRow]) {
    let leaf = node.is_leaf();
    rows[level].cells.push(HeaderCell {
        text: node.label.clone(),
        kind: if leaf { CellKind::Leaf } else { CellKind::Group },
        colspan: node.span(),
        rowspan: 1,
    });

    if leaf {
        return;
    }

    for child in &node.children {
        push_header_cells(child, level + 1, levels, rows);
    }

    rows[level].cells.push(HeaderCell {
        text: TOTAL_LABEL.to_string(),
        kind: CellKind::Total,
        colspan: 1,
        rowspan: levels - level,
    });
}

/// Emit the cells under `node` and return its subtotal.
///
/// `parent` is the row-catalog node one level up; a missing branch means the
/// combination was not observed that day and every cell beneath is zero.
fn push_data_cells(node: &HeaderNode, parent: Option<&RowNode>, cells: &mut Vec<DataCell>) -> u64 {
    let here = parent.and_then(|p| p.child(&node.label));

    if node.is_leaf() {
        let value = here.map_or(0, RowNode::count);
        cells.push(DataCell {
            value,
            kind: CellKind::Leaf,
        });
        return value;
    }

    let mut subtotal = 0;
    for child in &node.children {
        subtotal += push_data_cells(child, here, cells);
    }
    cells.push(DataCell {
        value: subtotal,
        kind: CellKind::Total,
    });
    subtotal
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
