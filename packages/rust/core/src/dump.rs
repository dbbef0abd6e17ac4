//! Table dumps: the JSON hand-off from the external PDF table extractor.
//!
//! Layout: `{"pages": [[table, ...], ...]}` where a table is an array of rows
//! and each row an array of `string | null`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use atplan_extract::TableProvider;
use atplan_shared::{AtplanError, RawTable, Result};

/// Every table of one source document, grouped by page.
///
/// `pages` is required and no other fields are accepted, so stray JSON files
/// in the input tree fail to load instead of passing as empty documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableDump {
    pub pages: Vec<Vec<RawTable>>,
}

impl TableDump {
    /// Parse a dump from JSON text.
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| AtplanError::parse(format!("invalid table dump: {e}")))
    }

    /// Read and parse a dump file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AtplanError::io(path, e))?;
        let dump = Self::from_json(&content)?;
        debug!(
            path = %path.display(),
            pages = dump.pages.len(),
            tables = dump.table_count(),
            "loaded table dump"
        );
        Ok(dump)
    }

    /// Total tables across all pages.
    pub fn table_count(&self) -> usize {
        self.pages.iter().map(Vec::len).sum()
    }
}

impl TableProvider for TableDump {
    fn page_count(&self) -> usize {
        self.pages.page_count()
    }

    fn page_tables(&mut self, page: usize) -> Result<Vec<RawTable>> {
        self.pages.page_tables(page)
    }
}
