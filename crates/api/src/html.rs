//! HTML adapter for rendered grids.
//!
//! The dashboard is server-rendered: the filter form submits back to `/`
//! and the table is rebuilt from the grid on every request.

use std::fmt::Write;
use utm_core::{pivot::CellKind, Depth, Grid, UtmField};

const CELL_CLASS: &str = "align-middle text-center";
const LABEL_CLASS: &str = "align-middle text-left";

/// Escape text for element content and double-quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn class_for(kind: CellKind) -> String {
    match kind {
        CellKind::Total => format!("{} total-field", CELL_CLASS),
        CellKind::GrandTotal => format!("{} grand-total", CELL_CLASS),
        CellKind::Group | CellKind::Leaf => CELL_CLASS.to_string(),
    }
}

/// Leaf cells are plain data cells; groups and totals are header cells.
fn tag_for(kind: CellKind) -> &'static str {
    match kind {
        CellKind::Leaf => "td",
        CellKind::Group | CellKind::Total | CellKind::GrandTotal => "th",
    }
}

fn span_attrs(colspan: usize, rowspan: usize) -> String {
    let mut attrs = String::new();
    if colspan > 1 {
        let _ = write!(attrs, r#" colspan="{}""#, colspan);
    }
    if rowspan > 1 {
        let _ = write!(attrs, r#" rowspan="{}""#, rowspan);
    }
    attrs
}

/// Render the pivot table element.
pub fn render_table(grid: &Grid) -> String {
    let mut html = String::new();
    html.push_str(r#"<table class="table table-bordered" id="utm-table">"#);

    html.push_str("<thead>");
    for row in &grid.header_rows {
        html.push_str("<tr>");
        let _ = write!(html, r#"<th class="{}">{}</th>"#, LABEL_CLASS, escape(&row.label));
        for cell in &row.cells {
            let tag = tag_for(cell.kind);
            let _ = write!(
                html,
                r#"<{tag} class="{}"{}>{}</{tag}>"#,
                class_for(cell.kind),
                span_attrs(cell.colspan, cell.rowspan),
                escape(&cell.text),
            );
        }
        html.push_str("</tr>");
    }
    html.push_str("</thead>");

    html.push_str("<tbody>");
    for row in &grid.rows {
        let _ = write!(
            html,
            r#"<tr data-day="{}"><th class="{}">{}</th>"#,
            escape(&row.day),
            LABEL_CLASS,
            escape(&row.label)
        );
        for cell in &row.cells {
            let tag = tag_for(cell.kind);
            let _ = write!(
                html,
                r#"<{tag} class="{}">{}</{tag}>"#,
                class_for(cell.kind),
                cell.value
            );
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");

    html
}

/// Render the filter form. Checking a box submits the form.
pub fn render_filters(depth: Depth) -> String {
    let mut html = String::from(r#"<form method="get" action="/" id="filters" class="mb-3">"#);
    for field in &UtmField::ALL[..Depth::Term.levels()] {
        let name = field.as_str();
        let checked = if depth.fields().contains(field) { " checked" } else { "" };
        let _ = write!(
            html,
            r#"<div class="form-check form-check-inline"><input class="form-check-input" type="checkbox" id="{name}-checkbox" name="{name}" value="on" onchange="this.form.submit()"{checked}><label class="form-check-label" for="{name}-checkbox">{label}</label></div>"#,
            label = capitalize(name),
        );
    }
    html.push_str("</form>");
    html
}

/// Full dashboard page.
pub fn render_page(grid: &Grid, notice: Option<&str>) -> String {
    let mut html = String::from(
        r#"<!DOCTYPE html><html lang="en"><head><meta charset="utf-8"><meta name="viewport" content="width=device-width, initial-scale=1"><title>UTM Dashboard</title><link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css"></head><body><main class="container-fluid py-3"><h1 class="h3">UTM Dashboard</h1>"#,
    );

    if let Some(notice) = notice {
        let _ = write!(html, r#"<div class="alert alert-info">{}</div>"#, escape(notice));
    }

    html.push_str(&render_filters(grid.depth));
    let _ = write!(
        html,
        r#"<p class="text-muted">{} records</p><div class="table-responsive">{}</div>"#,
        grid.record_count,
        render_table(grid)
    );
    html.push_str("</main></body></html>");
    html
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
