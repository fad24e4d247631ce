//! Result formatting.
//!
//! Turns a successful [`QueryResult`] into what the agent shows: an HTML
//! table for the table strategies, or the first cell for the natural-language
//! strategy. Failures never reach this module.

use common::models::query::QueryResult;
use serde_json::Value;

/// Sentinel shown when a statement returns no rows.
pub const NO_RESULTS: &str = "No results";

const HEADER_CELL: &str = "<th>";
const WIDE_HEADER_CELL: &str = r#"<th style="min-width:100px;">"#;

/// Display-ready payload of one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormattedPayload {
    /// Rendered HTML table.
    Table(String),
    /// Zero rows came back.
    NoResults,
    /// Single value read from row 0, column 0.
    Scalar(String),
}

impl FormattedPayload {
    pub fn as_text(&self) -> &str {
        match self {
            FormattedPayload::Table(html) => html,
            FormattedPayload::NoResults => NO_RESULTS,
            FormattedPayload::Scalar(value) => value,
        }
    }
}

/// Renders rows and columns as an HTML table with widened header cells.
pub fn format_as_table(result: &QueryResult) -> FormattedPayload {
    if result.row_count == 0 {
        return FormattedPayload::NoResults;
    }
    FormattedPayload::Table(widen_header_cells(&render_html_table(result)))
}

/// Reads the value at row 0, column 0. A NULL there counts as no result.
pub fn extract_scalar(result: &QueryResult) -> FormattedPayload {
    match result.first_value() {
        None | Some(Value::Null) => FormattedPayload::NoResults,
        Some(value) => FormattedPayload::Scalar(cell_text(value)),
    }
}

fn render_html_table(result: &QueryResult) -> String {
    let mut html = String::from("<table>\n<thead>\n<tr>");
    for name in result.column_names() {
        html.push_str(HEADER_CELL);
        html.push_str(&escape_html(name));
        html.push_str("</th>");
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");

    for row in &result.rows {
        html.push_str("<tr>");
        for value in row {
            html.push_str("<td>");
            html.push_str(&escape_html(&cell_text(value)));
            html.push_str("</td>");
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>");
    html
}

/// Injects a minimum width into every bare header cell.
fn widen_header_cells(html: &str) -> String {
    html.replace(HEADER_CELL, WIDE_HEADER_CELL)
}

/// Plain-text rendering of one cell. Strings are unquoted, NULL is empty.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }
    escaped
}
