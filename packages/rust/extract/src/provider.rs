//! The table source boundary.

use atplan_shared::{AtplanError, RawTable, Result};

/// Supplies the raw tables of a document, one page at a time.
///
/// Implementations own all decoding and I/O. An error from any page is a read
/// failure for the whole document.
pub trait TableProvider {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Tables found on `page` (zero-based), in reading order.
    fn page_tables(&mut self, page: usize) -> Result<Vec<RawTable>>;
}

/// In-memory pages. Each page is handed out once.
impl TableProvider for Vec<Vec<RawTable>> {
    fn page_count(&self) -> usize {
        self.len()
    }

    fn page_tables(&mut self, page: usize) -> Result<Vec<RawTable>> {
        self.get_mut(page)
            .map(std::mem::take)
            .ok_or_else(|| AtplanError::provider(format!("page {page} out of range")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_provider_yields_pages_once() {
        let mut pages = vec![vec![RawTable::from_rows([["Week 1"]])], vec![]];
        assert_eq!(pages.page_count(), 2);
        assert_eq!(pages.page_tables(0).expect("page 0").len(), 1);
        assert!(pages.page_tables(0).expect("page 0 again").is_empty());
        assert!(pages.page_tables(1).expect("page 1").is_empty());
    }

    #[test]
    fn vec_provider_rejects_missing_page() {
        let mut pages: Vec<Vec<RawTable>> = Vec::new();
        let err = pages.page_tables(3).unwrap_err();
        assert!(err.to_string().contains("page 3"));
    }
}
