//! Table-to-curriculum extraction engine.
//!
//! Converts the raw tables of an Annual Teaching Plan into a
//! term → week → topic/assessment/formula hierarchy. This crate does no I/O;
//! tables arrive through a [`TableProvider`].
//!
//! - [`layout`]: header row, active term, column→week mapping
//! - [`classify`]: topic / assessment / content rows
//! - [`segment`]: noise filter, topic titles, bullet fragments
//! - [`formula`]: short-token equation detection
//! - [`aggregate`]: per-document `(term, week)` merge
//! - [`assemble`]: ordered output document

pub mod aggregate;
pub mod assemble;
pub mod classify;
pub mod formula;
pub mod layout;
pub mod provider;
pub mod segment;

use tracing::{info, instrument, warn};

use atplan_shared::{CurriculumDocument, DocumentIdentity, Result};

pub use aggregate::{CellContribution, DocumentExtractor, WeekEntries, WeekEntry};
pub use classify::{RowKind, classify_row};
pub use formula::detect_formulas;
pub use layout::{
    DEFAULT_TERM, MAX_WEEK_SPAN, TableLayout, TermResolver, WeekColumnMap, find_term, locate_header,
    map_week_columns, parse_week_marker,
};
pub use provider::TableProvider;

/// Extract one document.
///
/// Pages are read in order and every table is merged into the document's
/// aggregate. If the provider fails on any page the partial aggregate is
/// dropped and the error returned.
#[instrument(skip_all, fields(grade = %identity.grade, subject = %identity.subject))]
pub fn extract_document<P>(identity: &DocumentIdentity, provider: &mut P) -> Result<CurriculumDocument>
where
    P: TableProvider + ?Sized,
{
    let mut extractor = DocumentExtractor::new();
    let pages = provider.page_count();

    for page in 0..pages {
        let tables = provider.page_tables(page).inspect_err(|e| {
            warn!(page, error = %e, "table provider failed, discarding document");
        })?;
        for table in &tables {
            extractor.process_table(table);
        }
    }

    let document = extractor.finish(identity);
    info!(
        pages,
        terms = document.terms.len(),
        weeks = document.week_count(),
        "document extracted"
    );
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use atplan_shared::{AtplanError, RawTable, WeekSlot};

    fn identity() -> DocumentIdentity {
        DocumentIdentity::new("Grade 10", "Mathematics")
    }

    fn single_page(tables: Vec<RawTable>) -> Vec<Vec<RawTable>> {
        vec![tables]
    }

    /// A provider whose second page cannot be read.
    struct BrokenProvider;

    impl TableProvider for BrokenProvider {
        fn page_count(&self) -> usize {
            2
        }

        fn page_tables(&mut self, page: usize) -> Result<Vec<RawTable>> {
            match page {
                0 => Ok(vec![RawTable::from_rows([
                    vec!["Week 1"],
                    vec!["Topic: Algebra"],
                ])]),
                _ => Err(AtplanError::provider("corrupt page stream")),
            }
        }
    }

    // -----------------------------------------------------------------------
    // End-to-end scenarios
    // -----------------------------------------------------------------------

    #[test]
    fn range_column_applies_to_every_week() {
        let table = RawTable::from_rows([
            vec!["Term 1", "Week 1", "Week 2-3", ""],
            vec!["Topic 1", "Linear equations", "Graphs\n• slope\n• intercept", ""],
        ]);
        let doc = extract_document(&identity(), &mut single_page(vec![table])).expect("extract");

        let week1 = doc.week(WeekSlot::new(1, 1)).expect("week 1");
        assert_eq!(week1.main_topic, "Linear equations");
        assert!(week1.subtopics.is_empty());

        for week in [2, 3] {
            let record = doc.week(WeekSlot::new(1, week)).expect("range week");
            assert_eq!(record.main_topic, "Graphs");
            assert_eq!(record.subtopics, vec!["intercept", "slope"]);
        }
        assert_eq!(doc.week_count(), 3);
    }

    #[test]
    fn noise_cells_are_discarded_in_every_row_kind() {
        let table = RawTable::from_rows([
            vec!["", "Week 1"],
            vec!["Topic", "Teacher: ___________"],
            vec!["Assessment", "Teacher: ___________"],
            vec!["Content", "Teacher: ___________"],
            vec!["Content", "Kinematics"],
        ]);
        let doc = extract_document(&identity(), &mut single_page(vec![table])).expect("extract");
        let week1 = doc.week(WeekSlot::new(1, 1)).expect("week 1");
        assert_eq!(week1.main_topic, "");
        assert_eq!(week1.formal_assessment, "");
        assert_eq!(week1.subtopics, vec!["Kinematics"]);
    }

    #[test]
    fn formulas_and_duration_stripping() {
        let table = RawTable::from_rows([
            vec!["Concepts", "Week 4"],
            vec!["Skills", "• Force = mass × acceleration\n• F = ma\n• Solve linear equations (2 hrs)"],
        ]);
        let doc = extract_document(&identity(), &mut single_page(vec![table])).expect("extract");
        let week = doc.week(WeekSlot::new(1, 4)).expect("week 4");

        assert_eq!(week.formulas, vec!["F = ma"]);
        assert!(week.subtopics.contains(&"Solve linear equations".to_string()));
        assert!(week.subtopics.contains(&"Force = mass × acceleration".to_string()));
    }

    #[test]
    fn main_topic_survives_later_tables() {
        let first = RawTable::from_rows([vec!["Term 2", "Week 5"], vec!["Topic", "Electrostatics"]]);
        let second = RawTable::from_rows([vec!["", "Week 5"], vec!["Topic", "Electric circuits"]]);
        let doc = extract_document(&identity(), &mut vec![vec![first], vec![second]])
            .expect("extract");

        let week = doc.week(WeekSlot::new(2, 5)).expect("week 5");
        assert_eq!(week.main_topic, "Electrostatics");
        assert_eq!(doc.terms.len(), 1);
    }

    #[test]
    fn term_persists_until_redeclared() {
        let t3 = RawTable::from_rows([vec!["TERM 3", "Week 1"], vec!["Topic", "Optics"]]);
        let carry = RawTable::from_rows([vec!["", "Week 2"], vec!["Topic", "Lenses"]]);
        let t4 = RawTable::from_rows([vec!["Term 4", "Week 1"], vec!["Topic", "Revision"]]);
        let doc = extract_document(&identity(), &mut vec![vec![t3, carry], vec![t4]])
            .expect("extract");

        assert_eq!(doc.week(WeekSlot::new(3, 2)).expect("t3w2").main_topic, "Lenses");
        assert_eq!(doc.week(WeekSlot::new(4, 1)).expect("t4w1").main_topic, "Revision");
        let terms: Vec<u32> = doc.terms.iter().map(|t| t.term).collect();
        assert_eq!(terms, vec![3, 4]);
    }

    #[test]
    fn term_resets_for_each_document() {
        let declared = RawTable::from_rows([vec!["Term 3", "Week 1"], vec!["Topic", "Optics"]]);
        extract_document(&identity(), &mut single_page(vec![declared])).expect("first");

        let undeclared = RawTable::from_rows([vec!["", "Week 1"], vec!["Topic", "Cells"]]);
        let doc = extract_document(&identity(), &mut single_page(vec![undeclared])).expect("second");
        assert_eq!(doc.terms[0].term, DEFAULT_TERM);
    }

    #[test]
    fn assessment_notes_accumulate_across_rows() {
        let table = RawTable::from_rows([
            vec!["", "Week 8"],
            vec!["Formal Assessment", "Test 1"],
            vec!["SBA Task", "Investigation\n(written)"],
            vec!["Assessment", "Test 1"],
        ]);
        let doc = extract_document(&identity(), &mut single_page(vec![table])).expect("extract");
        let week = doc.week(WeekSlot::new(1, 8)).expect("week 8");
        assert_eq!(week.formal_assessment, "Test 1; Investigation (written)");
    }

    #[test]
    fn tables_without_header_are_skipped() {
        let signoff = RawTable::from_rows([["Signature:", "Date:"], ["HOD", "Principal"]]);
        let doc = extract_document(&identity(), &mut single_page(vec![signoff])).expect("extract");
        assert!(doc.terms.is_empty());
        assert_eq!(doc.grade, "Grade 10");
        assert_eq!(doc.subject, "Mathematics");
    }

    #[test]
    fn provider_failure_discards_document() {
        let err = extract_document(&identity(), &mut BrokenProvider).unwrap_err();
        assert!(matches!(err, AtplanError::Provider(_)));
    }

    // -----------------------------------------------------------------------
    // Output properties
    // -----------------------------------------------------------------------

    fn busy_document() -> Vec<Vec<RawTable>> {
        vec![
            vec![RawTable::from_rows([
                vec!["Term 1", "Week 1", "Week 2", "Week 3-4"],
                vec!["Topic 1", "Kinematics\n- Vectors\n- Scalars", "", "Momentum\n• p = mv"],
                vec!["Content", "• v = u + at\n• Vectors", "• Graphs (2 hrs)\n• Graphs", "• p = mv"],
                vec!["Assessment", "Practical", "", "Test"],
            ])],
            vec![
                RawTable::from_rows([vec!["Annual Teaching Plan page 2"]]),
                RawTable::from_rows([
                    vec!["", "Week 2"],
                    vec!["Subtopic", "Acceleration\n• Scalars"],
                ]),
            ],
        ]
    }

    #[test]
    fn identical_input_gives_identical_output() {
        let first = extract_document(&identity(), &mut busy_document()).expect("first");
        let second = extract_document(&identity(), &mut busy_document()).expect("second");
        assert_eq!(
            serde_json::to_string(&first).expect("serialize"),
            serde_json::to_string(&second).expect("serialize")
        );
    }

    #[test]
    fn output_lists_are_sorted_and_unique() {
        let doc = extract_document(&identity(), &mut busy_document()).expect("extract");
        for term in &doc.terms {
            for week in &term.weeks {
                for list in [&week.subtopics, &week.formulas] {
                    assert!(list.windows(2).all(|w| w[0] < w[1]), "unsorted or duplicate: {list:?}");
                }
            }
        }

        let week2 = doc.week(WeekSlot::new(1, 2)).expect("week 2");
        assert_eq!(week2.main_topic, "Kinematics");
        assert_eq!(week2.subtopics, vec!["Acceleration", "Graphs", "Scalars", "Vectors"]);

        let week4 = doc.week(WeekSlot::new(1, 4)).expect("week 4");
        assert_eq!(week4.formulas, vec!["p = mv"]);
        assert_eq!(week4.formal_assessment, "Test");
    }
}
