//! Document identity from the organised source tree.
//!
//! Sources are filed as `<root>/Grade_<n>/<Subject>.<ext>`; the grade comes
//! from the parent directory and the subject from the file name.

use std::path::Path;

use atplan_shared::DocumentIdentity;

/// Marker identifying a grade directory.
const GRADE_DIR_MARKER: &str = "Grade_";

/// Derive grade and subject from a dump path.
///
/// A parent directory without the grade marker gives an empty grade. A
/// `.pdf` left in the stem (as in `History.pdf.json`) is dropped.
pub fn identity_from_path(path: &Path) -> DocumentIdentity {
    let grade = path
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy())
        .filter(|name| name.contains(GRADE_DIR_MARKER))
        .map(|name| name.replace('_', " "))
        .unwrap_or_default();

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let subject = stem.strip_suffix(".pdf").unwrap_or(&stem).to_string();

    DocumentIdentity { grade, subject }
}
