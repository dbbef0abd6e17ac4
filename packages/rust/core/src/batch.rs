//! Batch extraction: one worker per document, results in input order.
//!
//! Documents share no state, so each runs on its own blocking worker. The
//! number of documents in flight is bounded by `BatchConfig::concurrency`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use atplan_extract::extract_document;
use atplan_shared::{AtplanError, BatchConfig, CurriculumDocument, Result};

use crate::dump::TableDump;
use crate::identity::identity_from_path;
use crate::output::report_path;

/// A document that could not be extracted.
#[derive(Debug, Clone)]
pub struct DocumentFailure {
    pub path: PathBuf,
    pub error: String,
}

/// A successfully extracted document and its source dump.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub path: PathBuf,
    pub document: CurriculumDocument,
}

/// Result of a batch run.
#[derive(Debug)]
pub struct BatchResult {
    /// Successful documents, in input path order.
    pub documents: Vec<ExtractedDocument>,
    /// Failed documents, in input path order.
    pub failures: Vec<DocumentFailure>,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting batch status.
pub trait ProgressReporter: Send + Sync {
    /// Called once the input set is known.
    fn started(&self, total: usize);
    /// Called as each document's result is collected.
    fn document_finished(&self, path: &Path, succeeded: bool);
    /// Called when the batch completes.
    fn done(&self, result: &BatchResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn started(&self, _total: usize) {}
    fn document_finished(&self, _path: &Path, _succeeded: bool) {}
    fn done(&self, _result: &BatchResult) {}
}

/// Find table dumps under `root` with the given extension, sorted by path.
///
/// A file root is returned as-is when its extension matches. Symlinks are
/// not followed.
pub fn discover_dumps(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let extension = extension.trim_start_matches('.');
    let mut found = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            AtplanError::io(path, e.into())
        })?;
        if entry.file_type().is_file() && has_extension(entry.path(), extension) {
            found.push(entry.into_path());
        }
    }

    found.sort();
    debug!(root = %root.display(), count = found.len(), "discovered table dumps");
    Ok(found)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
}

/// Whether `path` is one of the files this batch writes.
fn is_batch_output(path: &Path, outputs: &[PathBuf]) -> bool {
    let Ok(path) = path.canonicalize() else {
        return false;
    };
    outputs.iter().any(|output| *output == path)
}

/// Load one dump and extract it.
pub fn extract_file(path: &Path) -> Result<CurriculumDocument> {
    let identity = identity_from_path(path);
    let mut dump = TableDump::load(path)?;
    extract_document(&identity, &mut dump)
}

/// Extract every dump under `config.input_root`.
///
/// Per-document failures are collected, never propagated; only problems with
/// the input set itself (unreadable root, no dumps) fail the batch.
#[instrument(skip_all, fields(root = %config.input_root.display(), concurrency = config.concurrency))]
pub async fn extract_batch(
    config: &BatchConfig,
    progress: &dyn ProgressReporter,
) -> Result<BatchResult> {
    config.validate()?;
    let start = Instant::now();

    let outputs: Vec<PathBuf> = [config.output_file.clone(), report_path(&config.output_file)]
        .iter()
        .filter_map(|p| p.canonicalize().ok())
        .collect();
    let paths: Vec<PathBuf> = discover_dumps(&config.input_root, &config.input_extension)?
        .into_iter()
        .filter(|path| {
            let skip = is_batch_output(path, &outputs);
            if skip {
                debug!(path = %path.display(), "skipping previous batch output");
            }
            !skip
        })
        .collect();
    if paths.is_empty() {
        return Err(AtplanError::validation(format!(
            "no .{} table dumps found under {}",
            config.input_extension.trim_start_matches('.'),
            config.input_root.display()
        )));
    }

    info!(documents = paths.len(), "starting batch extraction");
    let (documents, failures) =
        run_workers(paths, config.concurrency as usize, extract_file, progress).await;

    let result = BatchResult {
        documents,
        failures,
        elapsed: start.elapsed(),
    };

    info!(
        extracted = result.documents.len(),
        failed = result.failures.len(),
        duration_ms = result.elapsed.as_millis(),
        "batch extraction complete"
    );
    progress.done(&result);

    Ok(result)
}

/// Run `work` over `paths` on blocking workers, at most `concurrency` at once.
///
/// Progress is reported as each document completes; the returned lists keep
/// input order.
async fn run_workers<F>(
    paths: Vec<PathBuf>,
    concurrency: usize,
    work: F,
    progress: &dyn ProgressReporter,
) -> (Vec<ExtractedDocument>, Vec<DocumentFailure>)
where
    F: Fn(&Path) -> Result<CurriculumDocument> + Send + Sync + Copy + 'static,
{
    progress.started(paths.len());

    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut workers = JoinSet::new();

    for (index, path) in paths.iter().cloned().enumerate() {
        let semaphore = semaphore.clone();
        workers.spawn(async move {
            let outcome = match semaphore.acquire_owned().await {
                Ok(permit) => tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    work(&path)
                })
                .await
                .unwrap_or_else(|e| {
                    Err(AtplanError::provider(format!("extraction worker failed: {e}")))
                }),
                Err(e) => Err(AtplanError::validation(format!("worker pool closed: {e}"))),
            };
            (index, outcome)
        });
    }

    let mut outcomes: Vec<Option<Result<CurriculumDocument>>> =
        paths.iter().map(|_| None).collect();

    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok((index, outcome)) => {
                progress.document_finished(&paths[index], outcome.is_ok());
                outcomes[index] = Some(outcome);
            }
            Err(e) => warn!(error = %e, "extraction task aborted"),
        }
    }

    let mut documents = Vec::new();
    let mut failures = Vec::new();

    for (path, outcome) in paths.into_iter().zip(outcomes) {
        let outcome = outcome.unwrap_or_else(|| {
            Err(AtplanError::provider("extraction worker did not report a result"))
        });
        match outcome {
            Ok(document) => documents.push(ExtractedDocument { path, document }),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "document extraction failed");
                failures.push(DocumentFailure {
                    path,
                    error: e.to_string(),
                });
            }
        }
    }

    (documents, failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use atplan_shared::{AppConfig, WeekSlot};

    const HISTORY_DUMP: &str = r#"{"pages": [[
        [["Term 1", "Week 1", "Week 2"],
         ["Topic", "The world around 1600", "Expansion and conquest"],
         ["Assessment", "Source-based task", null]]
    ]]}"#;

    const SCIENCE_DUMP: &str = r#"{"pages": [[
        [["TERM 2", "Week 3-4"],
         ["Concepts", "• Newton's laws\n• F = ma (4 hrs)"]]
    ]]}"#;

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path, content).expect("write");
        path
    }

    fn batch_config(root: &Path, concurrency: u32) -> BatchConfig {
        let mut config = BatchConfig::from(&AppConfig::default());
        config.input_root = root.to_path_buf();
        config.output_file = root.join("out.json");
        config.concurrency = concurrency;
        config
    }

    #[derive(Default)]
    struct RecordingProgress {
        finished: Mutex<Vec<(PathBuf, bool)>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn started(&self, _total: usize) {}
        fn document_finished(&self, path: &Path, succeeded: bool) {
            self.finished
                .lock()
                .expect("lock")
                .push((path.to_path_buf(), succeeded));
        }
        fn done(&self, _result: &BatchResult) {}
    }

    #[test]
    fn discover_dumps_walks_tree_sorted() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "Grade_12/Physics.json", "{}");
        write(dir.path(), "Grade_10/History.json", "{}");
        write(dir.path(), "Grade_10/notes.txt", "ignore me");

        let found = discover_dumps(dir.path(), "json").expect("discover");
        assert_eq!(found.len(), 2);
        assert!(found[0].ends_with("Grade_10/History.json"));
        assert!(found[1].ends_with("Grade_12/Physics.json"));
    }

    #[test]
    fn discover_dumps_accepts_single_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = write(dir.path(), "Grade_10/History.json", "{}");
        let found = discover_dumps(&file, ".JSON").expect("discover");
        assert_eq!(found, vec![file]);
    }

    #[test]
    fn extract_file_uses_path_identity() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = write(dir.path(), "Grade_10/History.json", HISTORY_DUMP);

        let doc = extract_file(&file).expect("extract");
        assert_eq!(doc.grade, "Grade 10");
        assert_eq!(doc.subject, "History");
        let week1 = doc.week(WeekSlot::new(1, 1)).expect("week 1");
        assert_eq!(week1.main_topic, "The world around 1600");
        assert_eq!(week1.formal_assessment, "Source-based task");
    }

    #[tokio::test]
    async fn batch_isolates_failures() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "Grade_10/History.json", HISTORY_DUMP);
        write(dir.path(), "Grade_11/Broken.json", "{ not json");
        write(dir.path(), "Grade_12/Physical Science.json", SCIENCE_DUMP);

        let progress = RecordingProgress::default();
        let result = extract_batch(&batch_config(dir.path(), 2), &progress)
            .await
            .expect("batch");

        assert_eq!(result.documents.len(), 2);
        assert_eq!(result.failures.len(), 1);
        assert!(result.failures[0].path.ends_with("Grade_11/Broken.json"));
        assert!(result.failures[0].error.contains("invalid table dump"));

        let subjects: Vec<&str> = result
            .documents
            .iter()
            .map(|d| d.document.subject.as_str())
            .collect();
        assert_eq!(subjects, vec!["History", "Physical Science"]);

        let science = &result.documents[1].document;
        for week in [3, 4] {
            let record = science.week(WeekSlot::new(2, week)).expect("science week");
            assert_eq!(record.formulas, vec!["F = ma"]);
            assert_eq!(record.subtopics, vec!["F = ma", "Newton's laws"]);
        }

        let finished = progress.finished.lock().expect("lock");
        assert_eq!(finished.len(), 3);
        assert_eq!(finished.iter().filter(|(_, ok)| !ok).count(), 1);
    }

    #[tokio::test]
    async fn batch_output_is_independent_of_concurrency() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "Grade_10/History.json", HISTORY_DUMP);
        write(dir.path(), "Grade_12/Physical Science.json", SCIENCE_DUMP);

        let serial = extract_batch(&batch_config(dir.path(), 1), &SilentProgress)
            .await
            .expect("serial");
        let parallel = extract_batch(&batch_config(dir.path(), 8), &SilentProgress)
            .await
            .expect("parallel");

        let docs = |r: &BatchResult| -> Vec<CurriculumDocument> {
            r.documents.iter().map(|d| d.document.clone()).collect()
        };
        assert_eq!(docs(&serial), docs(&parallel));
    }

    #[tokio::test]
    async fn empty_input_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = extract_batch(&batch_config(dir.path(), 2), &SilentProgress)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no .json table dumps"));
    }

    #[cfg(unix)]
    #[test]
    fn discover_dumps_does_not_follow_symlinks() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "Grade_10/History.json", "{}");
        std::fs::create_dir_all(dir.path().join("a")).expect("mkdir");
        std::os::unix::fs::symlink(dir.path(), dir.path().join("a").join("loop"))
            .expect("symlink");

        let found = discover_dumps(dir.path(), "json").expect("discover");
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("Grade_10/History.json"));
    }

    #[tokio::test]
    async fn batch_skips_its_own_previous_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "Grade_10/History.json", HISTORY_DUMP);
        write(dir.path(), "extracted_atp_data.json", "[]");
        write(
            dir.path(),
            "extracted_atp_data.report.json",
            r#"{"documents": [], "failures": [], "elapsed_ms": 1, "completed_at": "2026-01-01T00:00:00Z"}"#,
        );

        let mut config = batch_config(dir.path(), 2);
        config.output_file = dir.path().join("extracted_atp_data.json");
        let result = extract_batch(&config, &SilentProgress).await.expect("batch");

        let subjects: Vec<&str> = result
            .documents
            .iter()
            .map(|d| d.document.subject.as_str())
            .collect();
        assert_eq!(subjects, vec!["History"]);
        assert!(result.failures.is_empty());
    }

    #[tokio::test]
    async fn foreign_json_in_input_tree_is_a_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "Grade_10/History.json", HISTORY_DUMP);
        write(dir.path(), "Grade_10/notes.json", r#"{"documents": []}"#);

        let result = extract_batch(&batch_config(dir.path(), 2), &SilentProgress)
            .await
            .expect("batch");
        assert_eq!(result.documents.len(), 1);
        assert_eq!(result.failures.len(), 1);
        assert!(result.failures[0].path.ends_with("Grade_10/notes.json"));
    }

    fn timed_work(path: &Path) -> Result<CurriculumDocument> {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        match stem.as_str() {
            "slow" => std::thread::sleep(Duration::from_millis(300)),
            "broken" => return Err(AtplanError::parse("unreadable")),
            _ => {}
        }
        Ok(CurriculumDocument {
            grade: String::new(),
            subject: stem,
            terms: Vec::new(),
        })
    }

    #[tokio::test]
    async fn progress_follows_completion_while_output_keeps_input_order() {
        let paths = vec![
            PathBuf::from("slow.json"),
            PathBuf::from("broken.json"),
            PathBuf::from("fast.json"),
        ];
        let progress = RecordingProgress::default();
        let (documents, failures) = run_workers(paths, 3, timed_work, &progress).await;

        let subjects: Vec<&str> = documents.iter().map(|d| d.document.subject.as_str()).collect();
        assert_eq!(subjects, vec!["slow", "fast"]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].path, PathBuf::from("broken.json"));

        let finished = progress.finished.lock().expect("lock");
        assert_eq!(finished.len(), 3);
        assert_eq!(finished.last(), Some(&(PathBuf::from("slow.json"), true)));
    }
}
