//! Table layout detection: header row, active term, and column→week mapping.
//!
//! Pacing-plan tables declare their weeks in a single header row. Header
//! cells are frequently merged, so an empty cell inherits the weeks of the
//! column to its left.

use std::sync::LazyLock;

use regex::Regex;

use atplan_shared::RawTable;

/// Term assumed when a document never declares one.
pub const DEFAULT_TERM: u32 = 1;

/// Matches `Week 4` or `Week 4-6` (bounds captured separately).
static WEEK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)week\s*(\d+)(?:\s*-\s*(\d+))?").expect("week regex")
});

/// Matches `Term 2`; only the first digit counts.
static TERM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)term\s*([0-9])").expect("term regex")
});

// ---------------------------------------------------------------------------
// Header locator
// ---------------------------------------------------------------------------

/// Index of the first row with a cell mentioning "week", if any.
pub fn locate_header(table: &RawTable) -> Option<usize> {
    table.rows().iter().position(|row| {
        row.iter()
            .flatten()
            .any(|cell| cell.to_lowercase().contains("week"))
    })
}

// ---------------------------------------------------------------------------
// Term resolver
// ---------------------------------------------------------------------------

/// Tracks the active term across the tables of one document.
///
/// Documents often declare the term once per section, so a table without its
/// own marker keeps the last resolved term.
#[derive(Debug, Clone)]
pub struct TermResolver {
    current: u32,
}

impl Default for TermResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TermResolver {
    pub fn new() -> Self {
        Self {
            current: DEFAULT_TERM,
        }
    }

    /// The term currently in effect.
    pub fn current(&self) -> u32 {
        self.current
    }

    /// Update the active term from the rows around `header_row` and return it.
    pub fn resolve(&mut self, table: &RawTable, header_row: usize) -> u32 {
        if let Some(term) = find_term(table, header_row) {
            // "Term 0" is not a real term
            self.current = if term == 0 { DEFAULT_TERM } else { term };
        }
        self.current
    }
}

/// Search the row above the header through the row below it for `Term N`.
pub fn find_term(table: &RawTable, header_row: usize) -> Option<u32> {
    let rows = table.rows();
    let start = header_row.saturating_sub(1);
    let end = (header_row + 2).min(rows.len());

    rows.get(start..end)?.iter().find_map(|row| {
        let joined = row
            .iter()
            .flatten()
            .filter(|cell| !cell.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        let caps = TERM_RE.captures(&joined)?;
        caps[1].parse().ok()
    })
}

// ---------------------------------------------------------------------------
// Week column mapper
// ---------------------------------------------------------------------------

/// Widest range a single header cell may cover: one calendar year of weeks.
pub const MAX_WEEK_SPAN: u32 = 53;

/// Parse a week marker cell into the weeks it covers.
///
/// Returns `None` when the text is not a week marker (including bounds that
/// overflow and ranges wider than [`MAX_WEEK_SPAN`]). A reversed range such
/// as `Week 5-3` yields an empty list.
pub fn parse_week_marker(text: &str) -> Option<Vec<u32>> {
    let caps = WEEK_RE.captures(text)?;
    let start: u32 = caps[1].parse().ok()?;
    let end: u32 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => start,
    };
    if end >= start && end - start >= MAX_WEEK_SPAN {
        return None;
    }
    Some((start..=end).filter(|week| *week >= 1).collect())
}

/// Column index → weeks covered by that column. Columns with no weeks are unmapped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeekColumnMap {
    columns: Vec<Vec<u32>>,
}

impl WeekColumnMap {
    /// Weeks covered by `column`; empty when unmapped or past the header.
    pub fn weeks_for(&self, column: usize) -> &[u32] {
        self.columns.get(column).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Mapped columns in left-to-right order.
    pub fn mapped(&self) -> impl Iterator<Item = (usize, &[u32])> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, weeks)| !weeks.is_empty())
            .map(|(col, weeks)| (col, weeks.as_slice()))
    }

    /// Whether no column maps to any week.
    pub fn is_unmapped(&self) -> bool {
        self.mapped().next().is_none()
    }
}

/// Build the column map for a header row, forward-filling across empty and
/// non-marker cells.
pub fn map_week_columns(header: &[Option<String>]) -> WeekColumnMap {
    let mut active: Vec<u32> = Vec::new();
    let mut columns = Vec::with_capacity(header.len());

    for cell in header {
        if let Some(text) = cell.as_deref().filter(|t| !t.is_empty()) {
            if let Some(weeks) = parse_week_marker(&text.replace('\n', " ")) {
                active = weeks;
            }
        }
        columns.push(active.clone());
    }

    WeekColumnMap { columns }
}

// ---------------------------------------------------------------------------
// Combined layout
// ---------------------------------------------------------------------------

/// Everything the aggregator needs to know about one table's structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    /// Index of the header row; data rows follow it.
    pub header_row: usize,
    /// Term in effect for this table.
    pub term: u32,
    pub columns: WeekColumnMap,
}

impl TableLayout {
    /// Detect the layout of `table`, updating the document's active term.
    ///
    /// Returns `None` for tables without a week header.
    pub fn detect(table: &RawTable, terms: &mut TermResolver) -> Option<Self> {
        let header_row = locate_header(table)?;
        let term = terms.resolve(table, header_row);
        let columns = map_week_columns(&table.rows()[header_row]);

        Some(Self {
            header_row,
            term,
            columns,
        })
    }
}
