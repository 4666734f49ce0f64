//! Background catalog fetches.
//!
//! One fetch at a time runs on its own thread; the result comes back over an
//! `mpsc` channel that the UI drains once per frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

use crate::error::{CatalogError, CatalogResult};

use super::pipeline::{CatalogEngine, CatalogLoad};

/// A finished fetch, successful or not.
#[derive(Debug)]
pub struct FetchOutcome {
    /// Requested by the auto-refresh timer rather than the user.
    pub silent: bool,
    pub command_line: String,
    pub result: CatalogResult<CatalogLoad>,
}

#[derive(Default)]
pub struct CatalogWorker {
    rx: Option<mpsc::Receiver<FetchOutcome>>,
    cancel: Option<Arc<AtomicBool>>,
}

impl CatalogWorker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.rx.is_some()
    }

    /// Start a fetch on a background thread. `notify` runs once the outcome
    /// is queued, typically to wake the UI.
    pub fn request<F>(&mut self, engine: &CatalogEngine, silent: bool, notify: F) -> CatalogResult<()>
    where
        F: Fn() + Send + 'static,
    {
        if self.is_busy() {
            return Err(CatalogError::FetchInFlight);
        }

        let (tx, rx) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));
        self.rx = Some(rx);
        self.cancel = Some(Arc::clone(&cancel));

        let engine = engine.clone();
        log::debug!("Catalog fetch requested (silent: {})", silent);
        std::thread::spawn(move || {
            let command_line = engine.command().to_string();
            let mut result = engine.load(&cancel);
            if cancel.load(Ordering::SeqCst) && result.is_ok() {
                result = Err(CatalogError::Cancelled);
            }
            let _ = tx.send(FetchOutcome {
                silent,
                command_line,
                result,
            });
            notify();
        });
        Ok(())
    }

    /// Take the outcome of the running fetch, if it has finished.
    pub fn poll(&mut self) -> Option<FetchOutcome> {
        let rx = self.rx.as_ref()?;
        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(mpsc::TryRecvError::Empty) => return None,
            Err(mpsc::TryRecvError::Disconnected) => FetchOutcome {
                silent: false,
                command_line: String::new(),
                result: Err(CatalogError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "catalog worker exited without a result",
                ))),
            },
        };
        self.rx = None;
        self.cancel = None;
        Some(outcome)
    }

    /// Ask the running fetch to stop. Returns false when nothing is running.
    pub fn cancel(&mut self) -> bool {
        match &self.cancel {
            Some(flag) => {
                flag.store(true, Ordering::SeqCst);
                log::info!("Catalog fetch cancellation requested");
                true
            }
            None => false,
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::engine::fetch::CatalogCommand;
    use std::time::{Duration, Instant};

    fn shell(script: &str) -> CatalogEngine {
        CatalogEngine::new(CatalogCommand::new("sh", vec!["-c".into(), script.into()], "."))
    }

    fn wait(worker: &mut CatalogWorker) -> FetchOutcome {
        let deadline = Instant::now() + Duration::from_secs(15);
        loop {
            if let Some(outcome) = worker.poll() {
                return outcome;
            }
            assert!(Instant::now() < deadline, "fetch did not finish");
            std::thread::sleep(Duration::from_millis(20));
        }
    }

    #[test]
    fn delivers_outcome_and_becomes_idle() {
        let mut worker = CatalogWorker::new();
        worker
            .request(&shell("echo '{\"category\":\"universe\",\"name\":\"A\"}'"), true, || {})
            .unwrap();
        assert!(worker.is_busy());
        let outcome = wait(&mut worker);
        assert!(outcome.silent);
        assert!(outcome.command_line.starts_with("sh -c"));
        assert_eq!(outcome.result.unwrap().document["name"], "A");
        assert!(!worker.is_busy());
    }

    #[test]
    fn second_request_is_rejected_while_busy() {
        let mut worker = CatalogWorker::new();
        worker.request(&shell("sleep 1"), false, || {}).unwrap();
        let err = worker.request(&shell("true"), false, || {}).unwrap_err();
        assert!(matches!(err, CatalogError::FetchInFlight));
        worker.cancel();
        wait(&mut worker);
    }

    #[test]
    fn cancel_reports_cancelled() {
        let mut worker = CatalogWorker::new();
        assert!(!worker.cancel());
        worker.request(&shell("echo '{}'; sleep 30"), false, || {}).unwrap();
        std::thread::sleep(Duration::from_millis(100));
        assert!(worker.cancel());
        let outcome = wait(&mut worker);
        assert!(matches!(outcome.result, Err(CatalogError::Cancelled)));
    }

    #[test]
    fn notify_runs_after_outcome_is_queued() {
        let flag = Arc::new(AtomicBool::new(false));
        let seen = Arc::clone(&flag);
        let mut worker = CatalogWorker::new();
        worker
            .request(&shell("exit 2"), false, move || seen.store(true, Ordering::SeqCst))
            .unwrap();
        let outcome = wait(&mut worker);
        assert!(matches!(outcome.result, Err(CatalogError::ProcessFailure { .. })));
        let deadline = Instant::now() + Duration::from_secs(5);
        while !flag.load(Ordering::SeqCst) && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(flag.load(Ordering::SeqCst));
    }
}
