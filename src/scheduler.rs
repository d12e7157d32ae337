//! The background refresh scheduler (component H).
//!
//! Two independent cadences — main every 3 minutes, secondary every 30 —
//! each run on their own thread so a slow secondary crawl never delays the
//! fast-refreshing main one. Grounded in the codebase's existing pattern of
//! a long-lived background worker gated by an `Arc<AtomicBool>` stop flag
//! (the same shape this codebase uses for its file-watcher workers),
//! generalized here from event-driven watching to interval polling since
//! live notification-based updates are out of scope (spec §1 Non-goals).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::crawler;
use crate::index::{FilesystemIndex, IndexState};

pub const MAIN_REFRESH_INTERVAL: Duration = Duration::from_secs(3 * 60);
pub const SECONDARY_REFRESH_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// How long a scheduler thread sleeps between deadline checks; short enough
/// that `stop` is observed promptly without busy-spinning.
const TICK_GRANULARITY: Duration = Duration::from_millis(200);

/// Handle to the two background refresh threads. Dropping it (or calling
/// [`Scheduler::stop`] explicitly) signals both loops to exit and joins
/// them, so no thread outlives the owning [`crate::Engine`].
pub struct Scheduler {
    stop: Arc<AtomicBool>,
    main_thread: Option<std::thread::JoinHandle<()>>,
    secondary_thread: Option<std::thread::JoinHandle<()>>,
}

impl Scheduler {
    pub fn start(index: Arc<FilesystemIndex>, config: Arc<parking_lot::RwLock<Config>>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));

        let main_thread = spawn_cadence(
            "main",
            Arc::clone(&index),
            Arc::clone(&config),
            Arc::clone(&stop),
            MAIN_REFRESH_INTERVAL,
            true,
        );
        let secondary_thread = spawn_cadence(
            "secondary",
            Arc::clone(&index),
            Arc::clone(&config),
            Arc::clone(&stop),
            SECONDARY_REFRESH_INTERVAL,
            false,
        );

        Self {
            stop,
            main_thread: Some(main_thread),
            secondary_thread: Some(secondary_thread),
        }
    }

    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(h) = self.main_thread.take() {
            let _ = h.join();
        }
        if let Some(h) = self.secondary_thread.take() {
            let _ = h.join();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_cadence(
    which: &'static str,
    index: Arc<FilesystemIndex>,
    config: Arc<parking_lot::RwLock<Config>>,
    stop: Arc<AtomicBool>,
    interval: Duration,
    is_main: bool,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let mut elapsed = Duration::ZERO;
        while !stop.load(Ordering::SeqCst) {
            std::thread::sleep(TICK_GRANULARITY);
            elapsed += TICK_GRANULARITY;
            if elapsed < interval {
                continue;
            }
            elapsed = Duration::ZERO;

            let span = tracing::debug_span!("refresh_tick", which);
            let _enter = span.enter();
            tick(&index, &config, is_main);
        }
    })
}

/// One scheduler tick: skip if there's no baseline index yet, skip if a
/// search currently holds the sub-index, otherwise rebuild and publish.
fn tick(index: &Arc<FilesystemIndex>, config: &Arc<parking_lot::RwLock<Config>>, is_main: bool) {
    if !index.is_built() {
        return;
    }

    let slot = if is_main { &index.main } else { &index.secondary };
    if slot.state() == IndexState::Building {
        return;
    }

    let config_snapshot = config.read().clone();
    let roots = if is_main {
        config_snapshot.main_dirs.clone()
    } else {
        config_snapshot.secondary_roots()
    };

    let fresh = crawler::crawl(&config_snapshot, &roots, is_main);
    if !slot.try_replace(fresh) {
        tracing::debug!(which = if is_main { "main" } else { "secondary" }, "skipped tick: writer busy");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn scheduler_starts_and_stops_cleanly() {
        let tmp = tempfile::tempdir().unwrap();
        File::create(tmp.path().join("a.txt")).unwrap();

        let config = Config {
            worker_count: 1,
            main_dirs: vec![tmp.path().to_string_lossy().to_string()],
            exclude_sub_main_dirs: vec![],
            secondary_dirs: vec![tmp.path().to_string_lossy().to_string()],
            exclude_dirs: vec![],
            exclude_dirs_by_name: vec![],
        };

        let index = Arc::new(FilesystemIndex::default());
        let config = Arc::new(parking_lot::RwLock::new(config));

        let mut scheduler = Scheduler::start(Arc::clone(&index), config);
        // The index isn't built yet, so a tick firing before interval
        // elapses is inert; we're only asserting clean shutdown here.
        scheduler.stop();
    }

    #[test]
    fn tick_is_a_noop_before_index_is_built() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config {
            worker_count: 1,
            main_dirs: vec![tmp.path().to_string_lossy().to_string()],
            exclude_sub_main_dirs: vec![],
            secondary_dirs: vec![tmp.path().to_string_lossy().to_string()],
            exclude_dirs: vec![],
            exclude_dirs_by_name: vec![],
        };
        let index = Arc::new(FilesystemIndex::default());
        let config = Arc::new(parking_lot::RwLock::new(config));

        tick(&index, &config, true);
        assert_eq!(index.main.state(), IndexState::Empty);
    }
}
