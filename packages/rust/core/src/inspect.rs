//! Layout inspection for a single dump, used to debug odd source tables.

use std::path::Path;

use tracing::debug;

use atplan_extract::{TableLayout, TermResolver};
use atplan_shared::Result;

use crate::dump::TableDump;

/// Data rows shown per table.
const SAMPLE_ROWS: usize = 2;

/// Detected structure of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSummary {
    pub page: usize,
    /// Position of the table on its page.
    pub index: usize,
    pub rows: usize,
    /// `None` when the table has no week header and would be skipped.
    pub header_row: Option<usize>,
    pub term: Option<u32>,
    /// `(column, weeks)` for every mapped column.
    pub columns: Vec<(usize, Vec<u32>)>,
    /// First data rows after the header, cells joined with ` | `.
    pub sample: Vec<String>,
}

/// Summarise the tables on the first `pages` pages of a dump.
pub fn inspect_dump(path: &Path, pages: usize) -> Result<Vec<TableSummary>> {
    let dump = TableDump::load(path)?;
    Ok(inspect_tables(&dump, pages))
}

/// Summarise an already loaded dump.
///
/// The term resolver runs over the inspected tables in order, so reported
/// terms match what extraction would assign.
pub fn inspect_tables(dump: &TableDump, pages: usize) -> Vec<TableSummary> {
    let mut terms = TermResolver::new();
    let mut summaries = Vec::new();

    for (page, tables) in dump.pages.iter().take(pages).enumerate() {
        for (index, table) in tables.iter().enumerate() {
            let summary = match TableLayout::detect(table, &mut terms) {
                Some(layout) => TableSummary {
                    page,
                    index,
                    rows: table.len(),
                    header_row: Some(layout.header_row),
                    term: Some(layout.term),
                    columns: layout
                        .columns
                        .mapped()
                        .map(|(col, weeks)| (col, weeks.to_vec()))
                        .collect(),
                    sample: table
                        .rows()
                        .iter()
                        .skip(layout.header_row + 1)
                        .take(SAMPLE_ROWS)
                        .map(|row| render_row(row))
                        .collect(),
                },
                None => TableSummary {
                    page,
                    index,
                    rows: table.len(),
                    header_row: None,
                    term: None,
                    columns: Vec::new(),
                    sample: Vec::new(),
                },
            };
            summaries.push(summary);
        }
    }

    debug!(tables = summaries.len(), "inspected dump");
    summaries
}

fn render_row(row: &[Option<String>]) -> String {
    row.iter()
        .map(|cell| {
            cell.as_deref()
                .map(|text| text.replace('\n', " "))
                .unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join(" | ")
}
