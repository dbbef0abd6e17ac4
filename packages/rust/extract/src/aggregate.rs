//! Per-document aggregation of table cells into `(term, week)` entries.
//!
//! Tables are fed in document order. Each mapped cell below the header is
//! classified, segmented and merged into every week its column covers.
//! Merge rules are order dependent (write-once topics, append-if-new
//! assessments), so a document is always processed sequentially.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace};

use atplan_shared::{CurriculumDocument, DocumentIdentity, RawTable, WeekRecord, WeekSlot};

use crate::assemble;
use crate::classify::{RowKind, classify_row};
use crate::formula::detect_formulas;
use crate::layout::{TableLayout, TermResolver};
use crate::segment::{clean_assessment, is_label_echo, is_noise, segment_content, split_topic};

/// Separator between accumulated assessment notes.
const ASSESSMENT_SEPARATOR: &str = "; ";

// ---------------------------------------------------------------------------
// WeekEntry
// ---------------------------------------------------------------------------

/// Mutable aggregate for one week slot while a document is being scanned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeekEntry {
    main_topic: String,
    subtopics: BTreeSet<String>,
    formulas: BTreeSet<String>,
    formal_assessment: String,
}

impl WeekEntry {
    pub fn main_topic(&self) -> &str {
        &self.main_topic
    }

    pub fn subtopics(&self) -> &BTreeSet<String> {
        &self.subtopics
    }

    pub fn formulas(&self) -> &BTreeSet<String> {
        &self.formulas
    }

    pub fn formal_assessment(&self) -> &str {
        &self.formal_assessment
    }

    /// Set the main topic unless one is already recorded. Returns whether it was set.
    pub fn offer_main_topic(&mut self, title: &str) -> bool {
        if title.is_empty() || !self.main_topic.is_empty() {
            return false;
        }
        self.main_topic = title.to_string();
        true
    }

    pub fn add_subtopic(&mut self, subtopic: impl Into<String>) {
        self.subtopics.insert(subtopic.into());
    }

    pub fn add_formula(&mut self, formula: impl Into<String>) {
        self.formulas.insert(formula.into());
    }

    /// Append an assessment note unless the accumulated text already contains it.
    pub fn append_assessment(&mut self, note: &str) {
        if note.is_empty() {
            return;
        }
        if self.formal_assessment.is_empty() {
            self.formal_assessment = note.to_string();
        } else if !self.formal_assessment.contains(note) {
            self.formal_assessment.push_str(ASSESSMENT_SEPARATOR);
            self.formal_assessment.push_str(note);
        }
    }

    /// Freeze into the output record for `week`.
    pub fn into_record(self, week: u32) -> WeekRecord {
        WeekRecord {
            week,
            main_topic: self.main_topic,
            subtopics: self.subtopics.into_iter().collect(),
            formulas: self.formulas.into_iter().collect(),
            formal_assessment: self.formal_assessment,
        }
    }
}

// ---------------------------------------------------------------------------
// WeekEntries
// ---------------------------------------------------------------------------

/// Sparse store of week entries keyed by slot, ordered by term then week.
#[derive(Debug, Clone, Default)]
pub struct WeekEntries {
    slots: BTreeMap<WeekSlot, WeekEntry>,
}

impl WeekEntries {
    /// Fetch the entry for `slot`, creating an empty one if absent.
    pub fn entry_mut(&mut self, slot: WeekSlot) -> &mut WeekEntry {
        self.slots.entry(slot).or_default()
    }

    pub fn get(&self, slot: WeekSlot) -> Option<&WeekEntry> {
        self.slots.get(&slot)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl IntoIterator for WeekEntries {
    type Item = (WeekSlot, WeekEntry);
    type IntoIter = std::collections::btree_map::IntoIter<WeekSlot, WeekEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.into_iter()
    }
}

// ---------------------------------------------------------------------------
// Cell contributions
// ---------------------------------------------------------------------------

/// What a single cell adds to each week its column covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellContribution {
    pub main_topic: Option<String>,
    pub subtopics: Vec<String>,
    pub formulas: Vec<String>,
    pub assessment: Option<String>,
}

impl CellContribution {
    /// Segment a non-empty, noise-free cell according to its row kind.
    pub fn from_cell(kind: RowKind, text: &str) -> Self {
        match kind {
            RowKind::Topic => {
                let parts = split_topic(text);
                let fragments = parts
                    .remainder
                    .as_deref()
                    .map(segment_content)
                    .unwrap_or_default();
                Self {
                    main_topic: (!parts.title.is_empty()).then_some(parts.title),
                    formulas: formulas_in(&fragments),
                    subtopics: fragments,
                    assessment: None,
                }
            }
            RowKind::Assessment => Self {
                assessment: Some(clean_assessment(text)),
                ..Self::default()
            },
            RowKind::Content => {
                let fragments = segment_content(text);
                Self {
                    formulas: formulas_in(&fragments),
                    subtopics: fragments,
                    ..Self::default()
                }
            }
        }
    }

    /// Merge into a week entry.
    pub fn apply(&self, entry: &mut WeekEntry) {
        if let Some(title) = &self.main_topic {
            entry.offer_main_topic(title);
        }
        for subtopic in &self.subtopics {
            entry.add_subtopic(subtopic.as_str());
        }
        for formula in &self.formulas {
            entry.add_formula(formula.as_str());
        }
        if let Some(note) = &self.assessment {
            entry.append_assessment(note);
        }
    }
}

fn formulas_in(fragments: &[String]) -> Vec<String> {
    fragments.iter().flat_map(|f| detect_formulas(f)).collect()
}

// ---------------------------------------------------------------------------
// DocumentExtractor
// ---------------------------------------------------------------------------

/// Accumulates the tables of one document into week entries.
///
/// Create one per document; the active term starts at the default term.
#[derive(Debug, Default)]
pub struct DocumentExtractor {
    terms: TermResolver,
    entries: WeekEntries,
    tables_used: usize,
    tables_skipped: usize,
}

impl DocumentExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries aggregated so far.
    pub fn entries(&self) -> &WeekEntries {
        &self.entries
    }

    /// Merge one table. Tables without a week header are skipped.
    pub fn process_table(&mut self, table: &RawTable) {
        let Some(layout) = TableLayout::detect(table, &mut self.terms) else {
            debug!(rows = table.len(), "no week header, skipping table");
            self.tables_skipped += 1;
            return;
        };
        if layout.columns.is_unmapped() {
            debug!(header_row = layout.header_row, "header has no usable week columns, skipping table");
            self.tables_skipped += 1;
            return;
        }
        self.tables_used += 1;

        trace!(
            header_row = layout.header_row,
            term = layout.term,
            mapped_columns = layout.columns.mapped().count(),
            "table layout"
        );

        // Forward-filled topic text for merged topic cells, scoped to this table.
        let mut active_topic: Option<String> = None;

        for row in &table.rows()[layout.header_row + 1..] {
            if row.is_empty() {
                continue;
            }
            let kind = classify_row(row);

            for (column, cell) in row.iter().enumerate() {
                let weeks = layout.columns.weeks_for(column);
                if weeks.is_empty() {
                    continue;
                }

                let mut text = cell.as_deref().map(str::trim).unwrap_or_default().to_string();
                if text.is_empty() {
                    match (&kind, &active_topic) {
                        (RowKind::Topic, Some(topic)) => text = topic.clone(),
                        _ => continue,
                    }
                }

                if is_noise(&text) || is_label_echo(&text) {
                    continue;
                }

                if kind == RowKind::Topic {
                    active_topic = Some(text.clone());
                }

                let contribution = CellContribution::from_cell(kind, &text);
                for &week in weeks {
                    let slot = WeekSlot::new(layout.term, week);
                    trace!(%slot, column, ?kind, "cell applied");
                    contribution.apply(self.entries.entry_mut(slot));
                }
            }
        }
    }

    /// Freeze the aggregate into the output document.
    pub fn finish(self, identity: &DocumentIdentity) -> CurriculumDocument {
        debug!(
            tables_used = self.tables_used,
            tables_skipped = self.tables_skipped,
            final_term = self.terms.current(),
            slots = self.entries.len(),
            "document aggregated"
        );
        assemble::assemble(identity, self.entries)
    }
}
