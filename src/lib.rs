//! A filename search engine: a concurrent crawler builds a bucketed,
//! bitmap-prefiltered index of two directory regions ("main" and
//! "secondary"), and searches run a two-phase match against a point-in-time
//! snapshot of either or both.
//!
//! The public surface is deliberately narrow — [`Engine`] with a handful of
//! setters and the two search entry points — a plain library facade around
//! the index, the crawler, and the background refresh scheduler.

pub mod bitmap;
pub mod config;
pub mod crawler;
pub mod entry;
pub mod error;
pub mod index;
pub mod matcher;
pub mod path_util;
pub mod ranker;
pub mod scheduler;

pub use config::Config;
pub use error::{BitdexError, Result};
pub use index::IndexState;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use entry::Pattern;
use index::FilesystemIndex;
use scheduler::Scheduler;

/// The top-level handle: owns the index, the configuration, and the
/// background refresh threads.
pub struct Engine {
    index: Arc<FilesystemIndex>,
    config: Arc<RwLock<Config>>,
    scheduler: RwLock<Option<Scheduler>>,
}

impl Engine {
    /// Build an engine from an already-validated configuration and crawl
    /// both regions once synchronously, so the first `search` call has
    /// something to search.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let index = Arc::new(FilesystemIndex::default());
        let config = Arc::new(RwLock::new(config));

        let engine = Self {
            index,
            config,
            scheduler: RwLock::new(None),
        };
        engine.force_refresh();

        let scheduler = Scheduler::start(Arc::clone(&engine.index), Arc::clone(&engine.config));
        *engine.scheduler.write() = Some(scheduler);

        Ok(engine)
    }

    /// Build an engine from the documented defaults with `<USERNAME>`
    /// expanded to the current OS user.
    pub fn with_default_config() -> Result<Self> {
        let username = path_util::current_username()?;
        let config = Config::default().with_username_expanded(&username);
        Self::new(config)
    }

    /// A process-wide singleton, lazily built from [`Self::with_default_config`]
    /// on first access. Optional convenience; callers that want more than one
    /// engine (e.g. in tests) should use [`Self::new`] directly instead.
    pub fn global() -> &'static Result<Engine> {
        static ENGINE: OnceLock<Result<Engine>> = OnceLock::new();
        ENGINE.get_or_init(Self::with_default_config)
    }

    /// Search for `needle`, optionally filtered by `extensions`, optionally
    /// extended into the secondary region. Not cancelable; see
    /// [`Self::search_cancelable`] for a version a caller can abort.
    #[must_use]
    pub fn search(&self, needle: &str, extensions: &[String], extended: bool) -> Vec<String> {
        let (hits, _) = self.search_cancelable(needle, extensions, extended, &AtomicBool::new(false));
        hits
    }

    /// Search for `needle`, stopping early if `cancel` becomes `true`.
    /// Returns the ranked paths found so far and whether the search was
    /// actually cancelled mid-flight (`true` means the result is partial).
    #[must_use]
    pub fn search_cancelable(
        &self,
        needle: &str,
        extensions: &[String],
        extended: bool,
        cancel: &AtomicBool,
    ) -> (Vec<String>, bool) {
        let span = tracing::debug_span!("search", needle, extended);
        let _enter = span.enter();

        let pattern = Pattern::new(needle, extensions);

        let main_snapshot = self.index.main.snapshot();
        let secondary_snapshot = if extended {
            Some(self.index.secondary.snapshot())
        } else {
            None
        };

        let hits = matcher::start(
            &main_snapshot,
            secondary_snapshot.as_deref(),
            &pattern,
            extended,
            cancel,
        );

        let ranked = ranker::rank(hits, &pattern, cancel);
        let paths = ranked.into_iter().map(|h| h.path).collect();
        let canceled = cancel.load(Ordering::Relaxed);

        (paths, canceled)
    }

    /// Synchronously rebuild both regions right now, blocking any in-flight
    /// readers only for the instant it takes to swap in the fresh index.
    pub fn force_refresh(&self) {
        let span = tracing::debug_span!("crawl", which = "force_refresh");
        let _enter = span.enter();

        let config = self.config.read().clone();

        self.index.main.mark_building();
        let main_fresh = crawler::crawl(&config, &config.main_dirs, true);
        self.index.main.replace(main_fresh);

        self.index.secondary.mark_building();
        let secondary_roots = config.secondary_roots();
        let secondary_fresh = crawler::crawl(&config, &secondary_roots, false);
        self.index.secondary.replace(secondary_fresh);
    }

    pub fn set_main_dirs(&self, dirs: Vec<String>) -> Result<()> {
        self.update_config(|c| c.main_dirs = dirs)
    }

    pub fn set_exclude_sub_main_dirs(&self, dirs: Vec<String>) -> Result<()> {
        self.update_config(|c| c.exclude_sub_main_dirs = dirs)
    }

    pub fn set_secondary_dirs(&self, dirs: Vec<String>) -> Result<()> {
        self.update_config(|c| c.secondary_dirs = dirs)
    }

    pub fn set_exclude_dirs(&self, dirs: Vec<String>) -> Result<()> {
        self.update_config(|c| c.exclude_dirs = dirs)
    }

    pub fn set_exclude_dirs_by_name(&self, names: Vec<String>) -> Result<()> {
        self.update_config(|c| c.exclude_dirs_by_name = names)
    }

    pub fn set_worker_count(&self, worker_count: usize) -> Result<()> {
        self.update_config(|c| c.worker_count = worker_count)
    }

    /// Apply `mutate` to a clone of the current config, validate it, and
    /// only on success publish it and mark both regions stale for the next
    /// refresh tick (or an explicit [`Self::force_refresh`]).
    fn update_config(&self, mutate: impl FnOnce(&mut Config)) -> Result<()> {
        let mut candidate = self.config.read().clone();
        mutate(&mut candidate);
        candidate.validate()?;

        *self.config.write() = candidate;
        self.index.main.mark_building();
        self.index.secondary.mark_building();
        Ok(())
    }

    #[must_use]
    pub fn config(&self) -> Config {
        self.config.read().clone()
    }

    #[must_use]
    pub fn is_built(&self) -> bool {
        self.index.is_built()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Some(mut scheduler) = self.scheduler.write().take() {
            scheduler.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn engine_over(dir: &std::path::Path) -> Engine {
        let config = Config {
            worker_count: 1,
            main_dirs: vec![dir.to_string_lossy().to_string()],
            exclude_sub_main_dirs: vec![],
            secondary_dirs: vec![dir.to_string_lossy().to_string()],
            exclude_dirs: vec![],
            exclude_dirs_by_name: vec![],
        };
        Engine::new(config).unwrap()
    }

    #[test]
    fn engine_builds_and_searches() {
        let tmp = tempfile::tempdir().unwrap();
        File::create(tmp.path().join("Haribo.txt")).unwrap();

        let engine = engine_over(tmp.path());
        assert!(engine.is_built());

        let hits = engine.search("hari", &[], false);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].ends_with("Haribo.txt"));
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = Config {
            worker_count: 1,
            main_dirs: vec![],
            exclude_sub_main_dirs: vec![],
            secondary_dirs: vec![],
            exclude_dirs: vec![],
            exclude_dirs_by_name: vec![],
        };
        assert!(matches!(Engine::new(config), Err(BitdexError::EmptyMainDirs)));
    }

    #[test]
    fn setter_rejects_nonexistent_dir_and_leaves_config_unchanged() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = engine_over(tmp.path());
        let before = engine.config();

        let result = engine.set_main_dirs(vec!["/this/path/does/not/exist".to_string()]);
        assert!(result.is_err());
        assert_eq!(engine.config(), before);
    }

    #[test]
    fn force_refresh_picks_up_new_files() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = engine_over(tmp.path());
        assert!(engine.search("latecomer", &[], false).is_empty());

        File::create(tmp.path().join("latecomer.txt")).unwrap();
        engine.force_refresh();

        let hits = engine.search("latecomer", &[], false);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn extended_flag_reaches_the_secondary_region() {
        let tmp = tempfile::tempdir().unwrap();
        let secondary = tmp.path().join("sys");
        std::fs::create_dir(&secondary).unwrap();
        File::create(secondary.join("onlysecondary.dat")).unwrap();

        let config = Config {
            worker_count: 1,
            main_dirs: vec![tmp.path().to_string_lossy().to_string()],
            exclude_sub_main_dirs: vec![secondary.to_string_lossy().to_string()],
            secondary_dirs: vec![secondary.to_string_lossy().to_string()],
            exclude_dirs: vec![],
            exclude_dirs_by_name: vec![],
        };
        let engine = Engine::new(config).unwrap();

        assert!(engine.search("onlysecondary", &[], false).is_empty());
        assert_eq!(engine.search("onlysecondary", &[], true).len(), 1);
    }
}
