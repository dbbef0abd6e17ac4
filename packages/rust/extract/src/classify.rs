//! Row classification from the row's leading cell.

/// Semantic role of a data row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// Topic heading; the first line of each cell is the week's main topic.
    Topic,
    /// Formal assessment note (tasks, SBA).
    Assessment,
    /// Ordinary content, concepts and skills.
    Content,
}

/// Keywords marking an assessment row.
const ASSESSMENT_KEYWORDS: &[&str] = &["assessment", "sba", "task"];

/// Classify a row by its first non-empty cell.
///
/// "Subtopic" rows are content, not topic headings.
pub fn classify_row(row: &[Option<String>]) -> RowKind {
    let lead = row
        .iter()
        .flatten()
        .find(|cell| !cell.is_empty())
        .map(|cell| cell.trim().to_lowercase())
        .unwrap_or_default();

    if lead.contains("topic") && !lead.contains("sub") {
        RowKind::Topic
    } else if ASSESSMENT_KEYWORDS.iter().any(|k| lead.contains(k)) {
        RowKind::Assessment
    } else {
        RowKind::Content
    }
}
