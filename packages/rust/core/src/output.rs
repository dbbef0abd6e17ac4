//! Output writer: the combined document array plus an optional report.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use atplan_shared::{AtplanError, BatchConfig, CurriculumDocument, Result};

use crate::batch::BatchResult;

/// Per-document line in the batch report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub path: String,
    pub grade: String,
    pub subject: String,
    pub terms: usize,
    pub weeks: usize,
    /// SHA-256 of the document's compact JSON.
    pub sha256: String,
}

/// Failed document line in the batch report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportFailure {
    pub path: String,
    pub error: String,
}

/// Contents of `<output stem>.report.json`, written beside the output file.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub documents: Vec<ReportEntry>,
    pub failures: Vec<ReportFailure>,
    pub elapsed_ms: u128,
    pub completed_at: String,
}

/// Where the outputs landed.
#[derive(Debug, Clone)]
pub struct OutputSummary {
    pub output_file: PathBuf,
    pub report_file: Option<PathBuf>,
    pub document_count: usize,
}

/// Write the extracted documents (and report, if enabled).
#[instrument(skip_all, fields(output = %config.output_file.display()))]
pub fn write_output(config: &BatchConfig, result: &BatchResult) -> Result<OutputSummary> {
    let documents: Vec<&CurriculumDocument> =
        result.documents.iter().map(|d| &d.document).collect();

    write_json_atomic(&config.output_file, &documents, config.pretty)?;

    let report_file = if config.write_report {
        let report = build_report(result)?;
        let path = report_path(&config.output_file);
        write_json_atomic(&path, &report, true)?;
        Some(path)
    } else {
        None
    };

    info!(
        documents = documents.len(),
        failures = result.failures.len(),
        "output written"
    );

    Ok(OutputSummary {
        output_file: config.output_file.clone(),
        report_file,
        document_count: documents.len(),
    })
}

/// Build the report for a batch result.
pub fn build_report(result: &BatchResult) -> Result<BatchReport> {
    let documents = result
        .documents
        .iter()
        .map(|d| {
            Ok(ReportEntry {
                path: d.path.display().to_string(),
                grade: d.document.grade.clone(),
                subject: d.document.subject.clone(),
                terms: d.document.terms.len(),
                weeks: d.document.week_count(),
                sha256: document_digest(&d.document)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let failures = result
        .failures
        .iter()
        .map(|f| ReportFailure {
            path: f.path.display().to_string(),
            error: f.error.clone(),
        })
        .collect();

    Ok(BatchReport {
        documents,
        failures,
        elapsed_ms: result.elapsed.as_millis(),
        completed_at: Utc::now().to_rfc3339(),
    })
}

/// Hex SHA-256 of a document's compact JSON serialization.
pub fn document_digest(document: &CurriculumDocument) -> Result<String> {
    let json = serde_json::to_vec(document)?;
    let mut hasher = Sha256::new();
    hasher.update(&json);
    Ok(format!("{:x}", hasher.finalize()))
}

/// `extracted.json` → `extracted.report.json`.
pub(crate) fn report_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output.with_file_name(format!("{stem}.report.json"))
}

/// Write JSON to a temp file beside `path`, then rename over it.
fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, data: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(data)?
    } else {
        serde_json::to_string(data)?
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| AtplanError::io(parent, e))?;
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| AtplanError::validation(format!("not a file path: {}", path.display())))?;
    let temp = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));

    std::fs::write(&temp, json).map_err(|e| AtplanError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| AtplanError::io(path, e))?;

    debug!(path = %path.display(), "wrote JSON file");
    Ok(())
}
