//! Bounded worker pool for local extraction.
//!
//! Units are handed to blocking workers, at most `workers` at a time.
//! Workers share nothing; each returns its [`ExtractionResult`] through the
//! join set and the coordinator task is the only writer of the results map.
//! Output order is rebuilt from the enumeration order, so completion order
//! never leaks into the artifact.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument};

use docbundle_shared::{
    ContentUnit, ExtractionResult, FailureKind, ProgressReporter, ProgressTracker,
    SourceLocation, UnitKind,
};

/// Turns one unit into its result. Must not share mutable state between calls.
pub trait UnitExtractor: Send + Sync + 'static {
    fn extract(&self, unit: &ContentUnit) -> ExtractionResult;
}

/// Reads a local file and runs the format extractor on its bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileExtractor;

impl UnitExtractor for FileExtractor {
    fn extract(&self, unit: &ContentUnit) -> ExtractionResult {
        let SourceLocation::Path(path) = &unit.location else {
            return ExtractionResult::failed(
                &unit.identity,
                FailureKind::ReadError,
                "not a local file",
            );
        };

        match std::fs::read(path) {
            Ok(bytes) => docbundle_extract::extract(&unit.identity, &unit.kind, &bytes),
            Err(e) => ExtractionResult::failed(&unit.identity, FailureKind::ReadError, e),
        }
    }
}

/// Schedules extraction across a fixed number of blocking workers.
pub struct Coordinator<E> {
    extractor: Arc<E>,
    workers: usize,
}

impl<E: UnitExtractor> Coordinator<E> {
    pub fn new(extractor: E, workers: usize) -> Self {
        Self {
            extractor: Arc::new(extractor),
            workers: workers.max(1),
        }
    }

    /// Extract every unit and return results in the order of `units`.
    ///
    /// Unsupported units are answered with a warning without reaching the
    /// extractor. Exactly one result is returned per unit.
    #[instrument(skip_all, fields(units = units.len(), workers = self.workers))]
    pub async fn run(
        &self,
        units: &[ContentUnit],
        progress: &dyn ProgressReporter,
    ) -> Vec<ExtractionResult> {
        let tracker = ProgressTracker::new(units.len());
        let mut results: HashMap<String, ExtractionResult> = HashMap::with_capacity(units.len());
        let mut pending = units.iter();
        let mut in_flight: JoinSet<ExtractionResult> = JoinSet::new();

        loop {
            while in_flight.len() < self.workers {
                let Some(unit) = pending.next() else {
                    break;
                };

                if let UnitKind::Unsupported(ext) = &unit.kind {
                    let result = ExtractionResult::unsupported(&unit.identity, ext);
                    record(result, &tracker, progress, &mut results);
                    continue;
                }

                let extractor = Arc::clone(&self.extractor);
                let unit = unit.clone();
                in_flight.spawn_blocking(move || extract_guarded(extractor.as_ref(), &unit));
            }

            match in_flight.join_next().await {
                Some(Ok(result)) => record(result, &tracker, progress, &mut results),
                Some(Err(e)) => error!(error = %e, "extraction worker failed"),
                None => break,
            }
        }

        let ordered: Vec<ExtractionResult> = units
            .iter()
            .map(|unit| {
                results.remove(&unit.identity).unwrap_or_else(|| {
                    ExtractionResult::failed(
                        &unit.identity,
                        FailureKind::ExtractionError,
                        "worker did not report a result",
                    )
                })
            })
            .collect();

        info!(completed = tracker.processed(), "extraction finished");
        ordered
    }
}

/// Run the extractor, turning a panic into an error result for this unit.
fn extract_guarded<E: UnitExtractor>(extractor: &E, unit: &ContentUnit) -> ExtractionResult {
    panic::catch_unwind(AssertUnwindSafe(|| extractor.extract(unit))).unwrap_or_else(|_| {
        ExtractionResult::failed(
            &unit.identity,
            FailureKind::ExtractionError,
            "extractor panicked",
        )
    })
}

fn record(
    result: ExtractionResult,
    tracker: &ProgressTracker,
    progress: &dyn ProgressReporter,
    results: &mut HashMap<String, ExtractionResult>,
) {
    tracker.record();
    debug!(identity = %result.identity, status = ?result.status, "unit done");
    progress.unit_done(&result.identity, result.status, &tracker.snapshot());

    let previous = results.insert(result.identity.clone(), result);
    debug_assert!(previous.is_none(), "identity extracted twice");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use docbundle_shared::{RunSummary, SilentProgress, UnitStatus};

    fn unit(identity: &str, kind: UnitKind) -> ContentUnit {
        ContentUnit::new(
            identity,
            kind,
            SourceLocation::Path(PathBuf::from(format!("/virtual/{identity}"))),
        )
    }

    fn text_units(n: usize) -> Vec<ContentUnit> {
        (0..n)
            .map(|i| unit(&format!("file-{i}.txt"), UnitKind::PlainText))
            .collect()
    }

    /// Earlier units sleep longer, so they finish last.
    struct ReversedCompletion {
        total: usize,
        finished: Mutex<Vec<String>>,
    }

    impl UnitExtractor for ReversedCompletion {
        fn extract(&self, unit: &ContentUnit) -> ExtractionResult {
            let index: usize = unit
                .identity
                .trim_start_matches("file-")
                .trim_end_matches(".txt")
                .parse()
                .unwrap();
            std::thread::sleep(Duration::from_millis(40 * (self.total - index) as u64));
            self.finished.lock().unwrap().push(unit.identity.clone());
            ExtractionResult::ok(&unit.identity, format!("content {index}"))
        }
    }

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    impl UnitExtractor for Counting {
        fn extract(&self, unit: &ContentUnit) -> ExtractionResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ExtractionResult::ok(&unit.identity, "x")
        }
    }

    struct PanicsOn(&'static str);

    impl UnitExtractor for PanicsOn {
        fn extract(&self, unit: &ContentUnit) -> ExtractionResult {
            if unit.identity == self.0 {
                panic!("parser exploded");
            }
            ExtractionResult::ok(&unit.identity, "fine")
        }
    }

    /// Records every completion the coordinator reports.
    #[derive(Default)]
    struct Recording {
        seen: Mutex<Vec<(String, usize)>>,
    }

    impl ProgressReporter for Recording {
        fn phase(&self, _name: &str) {}
        fn unit_done(
            &self,
            identity: &str,
            _status: UnitStatus,
            snapshot: &docbundle_shared::ProgressSnapshot,
        ) {
            self.seen
                .lock()
                .unwrap()
                .push((identity.to_string(), snapshot.processed));
        }
        fn done(&self, _summary: &RunSummary) {}
    }

    #[tokio::test]
    async fn output_follows_enumeration_not_completion() {
        let units = text_units(4);
        let extractor = ReversedCompletion {
            total: units.len(),
            finished: Mutex::new(Vec::new()),
        };
        let coordinator = Coordinator::new(extractor, 4);

        let results = coordinator.run(&units, &SilentProgress).await;

        let finished = coordinator.extractor.finished.lock().unwrap().clone();
        assert_eq!(
            finished,
            vec!["file-3.txt", "file-2.txt", "file-1.txt", "file-0.txt"],
            "completion order was not reversed"
        );

        let order: Vec<&str> = results.iter().map(|r| r.identity.as_str()).collect();
        assert_eq!(order, vec!["file-0.txt", "file-1.txt", "file-2.txt", "file-3.txt"]);
        assert_eq!(results[0].rendered_block, "content 0");
    }

    #[tokio::test]
    async fn unsupported_never_reaches_extractor() {
        let units = vec![
            unit("report.doc", UnitKind::Unsupported("doc".into())),
            unit("notes.txt", UnitKind::PlainText),
        ];
        let coordinator = Coordinator::new(Counting::default(), 2);

        let results = coordinator.run(&units, &SilentProgress).await;

        assert_eq!(coordinator.extractor.calls.load(Ordering::SeqCst), 1);
        assert_eq!(results[0].status, UnitStatus::Warning);
        assert!(results[0].rendered_block.contains(".doc"));
        assert_eq!(results[1].status, UnitStatus::Ok);
    }

    #[tokio::test]
    async fn panic_is_isolated_to_its_unit() {
        let units = text_units(3);
        let coordinator = Coordinator::new(PanicsOn("file-1.txt"), 2);

        let results = coordinator.run(&units, &SilentProgress).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].status, UnitStatus::Ok);
        assert_eq!(results[1].status, UnitStatus::Error);
        assert!(results[1].rendered_block.starts_with("[extraction-error] file-1.txt"));
        assert_eq!(results[2].status, UnitStatus::Ok);
    }

    #[tokio::test]
    async fn every_unit_reported_once() {
        let units = text_units(10);
        let reporter = Recording::default();
        let coordinator = Coordinator::new(Counting::default(), 3);

        coordinator.run(&units, &reporter).await;

        let seen = reporter.seen.lock().unwrap();
        assert_eq!(seen.len(), 10);
        let counts: Vec<usize> = seen.iter().map(|(_, n)| *n).collect();
        assert_eq!(counts, (1..=10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn single_worker_still_completes() {
        let units = text_units(5);
        let coordinator = Coordinator::new(Counting::default(), 0);
        let results = coordinator.run(&units, &SilentProgress).await;
        assert_eq!(results.len(), 5);
    }

    #[test]
    fn file_extractor_reports_read_errors() {
        let missing = unit("ghost.txt", UnitKind::PlainText);
        let result = FileExtractor.extract(&missing);
        assert_eq!(result.status, UnitStatus::Error);
        assert!(result.rendered_block.starts_with("[read-error] ghost.txt:"));
    }
}
