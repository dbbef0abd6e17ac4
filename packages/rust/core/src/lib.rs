//! Batch orchestration for atplan.
//!
//! Ties table dumps, document identity, the extraction engine and output
//! writing into the end-to-end `extract` workflow.

pub mod batch;
pub mod dump;
pub mod identity;
pub mod inspect;
pub mod output;

pub use batch::{
    BatchResult, DocumentFailure, ExtractedDocument, ProgressReporter, SilentProgress,
    discover_dumps, extract_batch, extract_file,
};
pub use dump::TableDump;
pub use identity::identity_from_path;
pub use inspect::{TableSummary, inspect_dump, inspect_tables};
pub use output::{BatchReport, OutputSummary, document_digest, write_output};
