//! Final ordering of aggregated entries into a [`CurriculumDocument`].

use atplan_shared::{CurriculumDocument, DocumentIdentity, TermBlock};

use crate::aggregate::WeekEntries;

/// Group entries into ascending terms with ascending weeks.
///
/// Slot order already sorts by term then week, so one pass suffices.
pub fn assemble(identity: &DocumentIdentity, entries: WeekEntries) -> CurriculumDocument {
    let mut terms: Vec<TermBlock> = Vec::new();

    for (slot, entry) in entries {
        let record = entry.into_record(slot.week);
        match terms.last_mut() {
            Some(block) if block.term == slot.term => block.weeks.push(record),
            _ => terms.push(TermBlock {
                term: slot.term,
                weeks: vec![record],
            }),
        }
    }

    CurriculumDocument {
        grade: identity.grade.clone(),
        subject: identity.subject.clone(),
        terms,
    }
}
