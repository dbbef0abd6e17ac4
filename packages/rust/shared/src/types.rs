//! Core domain types: raw tables in, curriculum documents out.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RawTable
// ---------------------------------------------------------------------------

/// A 2-D grid of nullable text cells, as delivered per page by a table source.
///
/// Rows may have differing lengths; a `None` cell usually means the source
/// cell was merged into a neighbour.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawTable(pub Vec<Vec<Option<String>>>);

impl RawTable {
    /// Build a table from string rows. Empty strings become `None`.
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        Self(
            rows.into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|cell| {
                            let cell = cell.as_ref();
                            (!cell.is_empty()).then(|| cell.to_string())
                        })
                        .collect()
                })
                .collect(),
        )
    }

    /// All rows, top to bottom.
    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.0
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// WeekSlot
// ---------------------------------------------------------------------------

/// The `(term, week)` coordinate of one teaching unit.
///
/// Ordering is by term, then week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WeekSlot {
    pub term: u32,
    pub week: u32,
}

impl WeekSlot {
    pub fn new(term: u32, week: u32) -> Self {
        Self { term, week }
    }
}

impl std::fmt::Display for WeekSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "T{}W{}", self.term, self.week)
    }
}

// ---------------------------------------------------------------------------
// Document identity
// ---------------------------------------------------------------------------

/// Grade and subject of a source document, supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentIdentity {
    pub grade: String,
    pub subject: String,
}

impl DocumentIdentity {
    pub fn new(grade: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            grade: grade.into(),
            subject: subject.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Output document
// ---------------------------------------------------------------------------

/// Final, frozen data for one `(term, week)` slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekRecord {
    pub week: u32,
    pub main_topic: String,
    /// Sorted, no duplicates.
    pub subtopics: Vec<String>,
    /// Sorted, no duplicates.
    pub formulas: Vec<String>,
    pub formal_assessment: String,
}

/// All weeks of one term, ascending by week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermBlock {
    pub term: u32,
    pub weeks: Vec<WeekRecord>,
}

/// The extraction result for one source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurriculumDocument {
    pub grade: String,
    pub subject: String,
    /// Ascending by term.
    pub terms: Vec<TermBlock>,
}

impl CurriculumDocument {
    /// Look up a week record by slot.
    pub fn week(&self, slot: WeekSlot) -> Option<&WeekRecord> {
        self.terms
            .iter()
            .find(|t| t.term == slot.term)?
            .weeks
            .iter()
            .find(|w| w.week == slot.week)
    }

    /// Total number of week records across all terms.
    pub fn week_count(&self) -> usize {
        self.terms.iter().map(|t| t.weeks.len()).sum()
    }
}
