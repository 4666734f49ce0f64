//! Browser session state.
//!
//! `Session` owns everything the view reads: the catalog tree, the detail
//! panes of the selected node, the running orbital scene, the status line
//! and the console log. The UI thread drives it by calling [`Session::poll`]
//! once per frame with the current instant; nothing in here reads the clock
//! on its own, apart from measuring how long an animation step took.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::catalog::details::NodeDetails;
use crate::catalog::tree::{CatalogTree, NodeHandle, SyncMode, SyncOutcome};
use crate::config::{clamp_refresh_seconds, Config};
use crate::dynamics::{normalize, DynamicsState};
use crate::engine::{CatalogEngine, CatalogLoad, CatalogWorker, FetchOutcome};
use crate::error::CatalogError;
use crate::render::animator::AnimationScheduler;
use crate::render::scene::Rgb;

/// Transient statuses fall back to idle after this long.
pub const STATUS_RESET: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Loading,
    Loaded,
    Error,
    Cancelled,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Idle => "Idle",
            Status::Loading => "Loading catalog...",
            Status::Loaded => "Catalog loaded",
            Status::Error => "Catalog error",
            Status::Cancelled => "Catalog cancelled",
        }
    }

    pub fn tone(self) -> Rgb {
        match self {
            Status::Idle | Status::Cancelled => [0xe0, 0xe0, 0xe0],
            Status::Loading => [0x81, 0xc7, 0x84],
            Status::Loaded => [0x64, 0xb5, 0xf6],
            Status::Error => [0xef, 0x53, 0x50],
        }
    }

    pub fn is_transient(self) -> bool {
        matches!(self, Status::Loaded | Status::Error | Status::Cancelled)
    }
}

type Notifier = Arc<dyn Fn() + Send + Sync>;

pub struct Session {
    config: Config,
    tree: CatalogTree,
    details: Option<NodeDetails>,
    scheduler: AnimationScheduler,
    worker: CatalogWorker,
    notifier: Notifier,
    status: Status,
    status_since: Instant,
    console: String,
    notice: Option<String>,
    auto_refresh: bool,
    next_refresh: Option<Instant>,
    pub search_query: String,
}

impl Session {
    pub fn new(config: Config, now: Instant) -> Self {
        let mut session = Self {
            auto_refresh: false,
            config,
            tree: CatalogTree::new(),
            details: None,
            scheduler: AnimationScheduler::new(),
            worker: CatalogWorker::new(),
            notifier: Arc::new(|| {}),
            status: Status::Idle,
            status_since: now,
            console: String::new(),
            notice: None,
            next_refresh: None,
            search_query: String::new(),
        };
        let enabled = session.config.auto_refresh;
        session.set_auto_refresh(enabled, now);
        session
    }

    /// Called from the worker thread whenever a fetch finishes.
    pub fn with_notifier<F>(mut self, notify: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.notifier = Arc::new(notify);
        self
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn tree(&self) -> &CatalogTree {
        &self.tree
    }

    pub fn details(&self) -> Option<&NodeDetails> {
        self.details.as_ref()
    }

    pub fn dynamics(&self) -> Option<&DynamicsState> {
        self.scheduler.state()
    }

    pub fn scheduler(&self) -> &AnimationScheduler {
        &self.scheduler
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn console(&self) -> &str {
        &self.console
    }

    pub fn clear_console(&mut self) {
        self.console.clear();
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn is_loading(&self) -> bool {
        self.worker.is_busy()
    }

    pub fn auto_refresh(&self) -> bool {
        self.auto_refresh
    }

    // ─── Catalog loading ─────────────────────────────────────────────────

    /// Start a user-requested catalog load. Returns whether a fetch started.
    pub fn load(&mut self, now: Instant) -> bool {
        self.request(false, now)
    }

    /// Ask a running fetch to stop.
    pub fn cancel(&mut self) -> bool {
        self.worker.cancel()
    }

    fn request(&mut self, silent: bool, now: Instant) -> bool {
        if self.worker.is_busy() {
            if silent {
                log::debug!("Auto-refresh skipped; a catalog load is running");
            } else {
                self.report(false, &CatalogError::FetchInFlight.to_string());
            }
            return false;
        }

        let engine = match self.config.catalog_command() {
            Ok(command) => CatalogEngine::new(command),
            Err(err) => {
                self.fail(silent, &err, now);
                return false;
            }
        };
        if !silent {
            self.log(&format!("$ {}\n", engine.command()));
        }

        let notifier = Arc::clone(&self.notifier);
        match self.worker.request(&engine, silent, move || notifier()) {
            Ok(()) => {
                self.set_status(Status::Loading, now);
                true
            }
            Err(err) => {
                self.fail(silent, &err, now);
                false
            }
        }
    }

    fn finish(&mut self, outcome: FetchOutcome, now: Instant) {
        let FetchOutcome { silent, result, .. } = outcome;
        match result {
            Ok(load) => self.apply(load, silent, now),
            Err(CatalogError::Cancelled) => self.set_status(Status::Cancelled, now),
            Err(err) => self.fail(silent, &err, now),
        }
    }

    fn apply(&mut self, load: CatalogLoad, silent: bool, now: Instant) {
        if !load.stderr.is_empty() && !silent {
            self.log(&load.stderr);
        }
        let synced = if silent && !self.tree.is_empty() && self.tree.selected_path().is_some() {
            self.tree.refresh(&load.document)
        } else {
            self.tree.populate(&load.document)
        };
        match synced {
            Ok(outcome) => {
                log::info!(
                    "Catalog synced: {} nodes, {:?}, selection restored: {}",
                    self.tree.len(),
                    outcome.mode,
                    outcome.restored
                );
                if !silent {
                    self.log("Catalog loaded.\n");
                }
                self.after_sync(outcome, now);
                self.set_status(Status::Loaded, now);
            }
            Err(err) => self.fail(silent, &err, now),
        }
    }

    fn after_sync(&mut self, outcome: SyncOutcome, now: Instant) {
        if outcome.mode == SyncMode::Rebuilt && !self.search_query.trim().is_empty() {
            if let Some(handle) = self.tree.find_by_query(&self.search_query) {
                self.tree.select(handle);
            }
        }
        self.show_selected(now);
    }

    /// Route a failure to the console (silent) or the notice, plus any
    /// captured output.
    fn fail(&mut self, silent: bool, err: &CatalogError, now: Instant) {
        log::warn!("Catalog load failed: {}", err);
        match err {
            CatalogError::Parse { preview, stderr } => {
                if silent {
                    self.log("Unable to parse catalog output.\n");
                } else {
                    self.notice = Some("Unable to parse catalog output. See console for details.".into());
                }
                if !preview.is_empty() {
                    self.log(&format!("Catalog stdout preview:\n{}\n", preview));
                }
                if !stderr.is_empty() {
                    self.log(&format!("Catalog stderr:\n{}\n", stderr));
                }
            }
            CatalogError::ProcessFailure {
                message,
                stdout_preview,
                stderr,
            } => {
                self.report(silent, &format!("Catalog command failed: {}", message));
                if !stdout_preview.is_empty() {
                    self.log(&format!("Catalog stdout preview:\n{}\n", stdout_preview));
                }
                if !stderr.is_empty() {
                    self.log(&format!("Catalog stderr:\n{}\n", stderr));
                }
            }
            other => self.report(silent, &format!("Catalog command failed: {}", other)),
        }
        self.set_status(Status::Error, now);
    }

    fn report(&mut self, silent: bool, message: &str) {
        if silent {
            self.log(&format!("{}\n", message));
        } else {
            self.notice = Some(message.to_string());
        }
    }

    fn log(&mut self, text: &str) {
        self.console.push_str(text);
    }

    fn set_status(&mut self, status: Status, now: Instant) {
        self.status = status;
        self.status_since = now;
    }

    // ─── Selection and search ────────────────────────────────────────────

    /// Select a node and rebuild the panes and scene for it.
    pub fn select(&mut self, handle: NodeHandle, now: Instant) -> bool {
        if self.tree.select(handle).is_none() {
            return false;
        }
        self.show_selected(now);
        true
    }

    fn show_selected(&mut self, now: Instant) {
        let Some(node) = self.tree.selected_node() else {
            self.details = None;
            self.scheduler.stop();
            return;
        };
        self.details = Some(NodeDetails::from_node(node));
        match node.dynamics().and_then(|d| normalize(node, d)) {
            Some(state) => self.scheduler.start(state, now),
            None => {
                self.scheduler.stop();
            }
        }
    }

    /// Select the first node matching the search box.
    pub fn search(&mut self, now: Instant) -> Option<NodeHandle> {
        let query = self.search_query.trim().to_string();
        if query.is_empty() {
            return None;
        }
        match self.tree.find_by_query(&query) {
            Some(handle) => {
                self.select(handle, now);
                Some(handle)
            }
            None => {
                self.notice = Some(format!("No catalog entries matching '{}'.", query));
                None
            }
        }
    }

    pub fn clear_search(&mut self) {
        self.search_query.clear();
    }

    // ─── Auto-refresh ────────────────────────────────────────────────────

    pub fn set_auto_refresh(&mut self, enabled: bool, now: Instant) {
        self.auto_refresh = enabled;
        self.config.auto_refresh = enabled;
        self.next_refresh = enabled.then(|| now + self.config.refresh_interval());
    }

    /// Change the refresh period (clamped to one second .. one hour); the
    /// timer restarts from `now`.
    pub fn set_refresh_seconds(&mut self, seconds: f64, now: Instant) {
        self.config.refresh_seconds = clamp_refresh_seconds(seconds);
        if self.auto_refresh {
            self.next_refresh = Some(now + self.config.refresh_interval());
        }
    }

    // ─── Frame loop ──────────────────────────────────────────────────────

    /// Drain the worker, fire due timers and advance the scene. Returns
    /// whether anything visible changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        let mut changed = false;

        if let Some(outcome) = self.worker.poll() {
            self.finish(outcome, now);
            changed = true;
        }

        if let Some(due) = self.next_refresh {
            if now >= due {
                self.next_refresh = Some(now + self.config.refresh_interval());
                changed |= self.request(true, now);
            }
        }

        changed |= self.scheduler.poll(now);

        if self.status.is_transient() && now.duration_since(self.status_since) >= STATUS_RESET {
            self.set_status(Status::Idle, now);
            changed = true;
        }
        changed
    }

    /// How long the UI may sleep before the next poll is useful.
    pub fn next_wakeup(&self, now: Instant) -> Option<Duration> {
        let status_reset = self
            .status
            .is_transient()
            .then(|| (self.status_since + STATUS_RESET).saturating_duration_since(now));
        let refresh = self.next_refresh.map(|at| at.saturating_duration_since(now));
        [self.scheduler.time_until_next(now), refresh, status_reset]
            .into_iter()
            .flatten()
            .min()
    }

    /// Feed raw catalog output through the same path as a finished fetch.
    /// Returns the resulting status.
    pub fn apply_output(&mut self, stdout: &str, stderr: &str, silent: bool, now: Instant) -> Status {
        let outcome = FetchOutcome {
            silent,
            command_line: String::new(),
            result: CatalogEngine::process_output(stdout, stderr),
        };
        self.finish(outcome, now);
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(Config::default(), Instant::now())
    }

    const DOC: &str = r#"{"category":"universe","name":"Alpha","children":[
        {"category":"galaxy","name":"Milky","summary":"barred spiral","children":[
            {"category":"system","name":"Sol","metadata":{"dynamics":{"objects":[
                {"name":"Sun","category":"star","mass":10},
                {"name":"Earth","category":"planet","mass":1,"position":{"x":1},"velocity":{"y":1}}
            ]}}}
        ]}
    ]}"#;

    #[test]
    fn populate_selects_root_and_shows_details() {
        let now = Instant::now();
        let mut s = session();
        assert_eq!(s.apply_output(DOC, "", false, now), Status::Loaded);
        assert_eq!(s.status(), Status::Loaded);
        assert_eq!(s.tree().len(), 4);
        assert!(s.details().unwrap().overview.starts_with("Universe: Alpha"));
        assert!(s.dynamics().is_none());
        assert!(s.console().contains("Catalog loaded."));
    }

    #[test]
    fn selecting_telemetry_node_starts_animation() {
        let now = Instant::now();
        let mut s = session();
        assert_eq!(s.apply_output(DOC, "", false, now), Status::Loaded);
        s.search_query = "sol".into();
        let handle = s.search(now).unwrap();
        assert_eq!(s.tree().node(handle).unwrap().name, "Sol");
        assert_eq!(s.dynamics().unwrap().primary().unwrap().name, "Sun");

        let root = s.tree().root().unwrap();
        assert!(s.select(root, now));
        assert!(s.dynamics().is_none());
    }

    #[test]
    fn parse_error_keeps_previous_catalog() {
        let now = Instant::now();
        let mut s = session();
        assert_eq!(s.apply_output(DOC, "", false, now), Status::Loaded);
        assert_eq!(s.apply_output("fatal: out of memory", "", false, now), Status::Error);
        assert_eq!(s.status(), Status::Error);
        assert_eq!(s.tree().len(), 4);
        assert!(s.notice().unwrap().contains("Unable to parse"));
        assert!(s.console().contains("Catalog stdout preview:\nfatal: out of memory"));
    }

    #[test]
    fn parse_error_logs_stderr() {
        let now = Instant::now();
        let mut s = session();
        assert_eq!(
            s.apply_output("PHP Warning: nothing", "Fatal: seed table missing", false, now),
            Status::Error
        );
        assert!(s.console().contains("Catalog stdout preview:\nPHP Warning: nothing\n"));
        assert!(s.console().contains("Catalog stderr:\nFatal: seed table missing\n"));
    }

    #[test]
    fn silent_refresh_keeps_selection_handle() {
        let now = Instant::now();
        let mut s = session();
        assert_eq!(s.apply_output(DOC, "", false, now), Status::Loaded);
        s.search_query = "milky".into();
        let milky = s.search(now).unwrap();
        let updated = DOC.replace("barred spiral", "grand design");
        assert_eq!(s.apply_output(&updated, "", true, now), Status::Loaded);
        assert_eq!(s.tree().selected(), Some(milky));
        assert!(s.details().unwrap().overview.contains("grand design"));
    }

    #[test]
    fn missed_search_raises_notice() {
        let mut s = session();
        s.apply_output(DOC, "", false, Instant::now());
        s.search_query = "andromeda".into();
        assert!(s.search(Instant::now()).is_none());
        assert_eq!(s.notice(), Some("No catalog entries matching 'andromeda'."));
    }

    #[test]
    fn transient_status_resets_after_five_seconds() {
        let now = Instant::now();
        let mut s = session();
        assert_eq!(s.apply_output(DOC, "", false, now), Status::Loaded);
        s.poll(now + Duration::from_secs(4));
        assert_eq!(s.status(), Status::Loaded);
        s.poll(now + STATUS_RESET);
        assert_eq!(s.status(), Status::Idle);
    }

    #[test]
    fn refresh_seconds_are_clamped() {
        let now = Instant::now();
        let mut s = session();
        s.set_refresh_seconds(0.1, now);
        assert_eq!(s.config().refresh_seconds, 1.0);
        assert!(s.next_wakeup(now).is_none());
        s.set_auto_refresh(true, now);
        assert_eq!(s.next_wakeup(now), Some(Duration::from_secs(1)));
        s.set_refresh_seconds(1e20, now);
        assert_eq!(s.config().refresh_seconds, 3600.0);
        assert_eq!(s.next_wakeup(now), Some(Duration::from_secs(3600)));
    }

    #[test]
    fn huge_refresh_period_is_capped_at_startup() {
        let now = Instant::now();
        let config = Config {
            refresh_seconds: 1e20,
            auto_refresh: true,
            ..Config::default()
        };
        let s = Session::new(config, now);
        assert!(s.auto_refresh());
        assert_eq!(s.next_wakeup(now), Some(Duration::from_secs(3600)));
    }

    #[test]
    fn missing_script_is_reported_without_spawning() {
        let now = Instant::now();
        let mut config = Config::default();
        config.project_root = "/definitely/not/a/simulator".into();
        let mut s = Session::new(config, now);
        assert!(!s.load(now));
        assert!(!s.is_loading());
        assert_eq!(s.status(), Status::Error);
        assert!(s.notice().unwrap().contains("Unable to locate universe.php"));
    }
}
