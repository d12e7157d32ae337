//! The concurrent, exclusion-aware crawler (component E).
//!
//! Uses a bounded `crossbeam_channel` plus an outstanding-work
//! `AtomicUsize` counter instead of an unbounded queue — the subtle
//! correctness point being that a transiently-empty queue does not mean
//! the crawl is done, since peer workers may still be about to enqueue
//! more directories.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Sender};

use crate::config::Config;
use crate::entry::{Entry, FILE_EXT, FOLDER_EXT};
use crate::index::{insert, SubIndex};
use crate::path_util::normalize_path;

/// One raw entry as emitted by a worker, before it's folded into a
/// [`SubIndex`] by the reducer.
enum RawEntry {
    File { path: String, basename: String, ext: String },
    Dir { path: String, basename: String },
}

/// Crawl `roots` (already exclusion-filtered at the top level by the
/// caller's choice of `is_main`) and return a freshly-built sub-index.
pub fn crawl(config: &Config, roots: &[String], is_main: bool) -> SubIndex {
    let worker_count = config.worker_count.max(1);
    // A small multiple of worker_count is enough to give real backpressure
    // without ever blocking progress — workers drain faster than a single
    // `read_dir` call can enqueue new children.
    let queue_capacity = (worker_count * 64).max(256);

    let (work_tx, work_rx) = bounded::<String>(queue_capacity);
    let (result_tx, result_rx) = bounded::<RawEntry>(queue_capacity);
    let outstanding = Arc::new(AtomicUsize::new(0));

    for root in roots {
        let resolved = normalize_path(root, true);
        if Path::new(&resolved).is_dir() {
            outstanding.fetch_add(1, Ordering::SeqCst);
            // A full queue here would mean more roots than capacity, which
            // only happens with a pathological config; fall back to a
            // blocking send rather than dropping a configured root.
            let _ = work_tx.send(resolved);
        }
    }

    if outstanding.load(Ordering::SeqCst) == 0 {
        return SubIndex::new();
    }

    std::thread::scope(|scope| {
        for _ in 0..worker_count {
            let work_rx = work_rx.clone();
            let work_tx = work_tx.clone();
            let result_tx = result_tx.clone();
            let outstanding = Arc::clone(&outstanding);
            let config = &*config;
            scope.spawn(move || {
                worker_loop(config, is_main, work_rx, work_tx, result_tx, outstanding);
            });
        }
        drop(work_tx);
        drop(work_rx);
        drop(result_tx);

        reduce(config, result_rx)
    })
}

fn worker_loop(
    config: &Config,
    is_main: bool,
    work_rx: crossbeam_channel::Receiver<String>,
    work_tx: Sender<String>,
    result_tx: Sender<RawEntry>,
    outstanding: Arc<AtomicUsize>,
) {
    // A transiently-empty queue does not mean the crawl is finished: a peer
    // worker may be mid-`process_directory` and about to enqueue more
    // subdirectories. The outstanding counter is the actual completion
    // signal, so workers poll with a short timeout and re-check it rather
    // than blocking forever on a channel nobody is guaranteed to close.
    loop {
        match work_rx.recv_timeout(std::time::Duration::from_millis(20)) {
            Ok(dir) => {
                process_directory(config, is_main, &dir, &work_tx, &result_tx, &outstanding);
                outstanding.fetch_sub(1, Ordering::SeqCst);
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                if outstanding.load(Ordering::SeqCst) == 0 {
                    break;
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }
    }
}

fn process_directory(
    config: &Config,
    is_main: bool,
    dir: &str,
    work_tx: &Sender<String>,
    result_tx: &Sender<RawEntry>,
    outstanding: &Arc<AtomicUsize>,
) {
    let children = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) => {
            tracing::debug!(dir, error = %e, "permission denied or unreadable directory, skipping");
            return;
        }
    };

    for child in children.flatten() {
        let path = child.path();
        let basename = child.file_name().to_string_lossy().to_string();

        let is_dir = child.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir {
            let dir_path = normalize_path(&path.to_string_lossy(), true);
            if is_excluded_dir(config, is_main, &basename, &dir_path) {
                continue;
            }

            outstanding.fetch_add(1, Ordering::SeqCst);
            if work_tx.send(dir_path.clone()).is_err() {
                // channel closed underneath us (crawl winding down); undo
                // the count bump since nobody will ever process this node.
                outstanding.fetch_sub(1, Ordering::SeqCst);
                continue;
            }

            let _ = result_tx.send(RawEntry::Dir { path: dir_path, basename });
        } else {
            let file_path = normalize_path(&path.to_string_lossy(), false);
            let ext = basename
                .rfind('.')
                .filter(|&i| i > 0)
                .map(|i| basename[i..].to_string())
                .unwrap_or_else(|| FILE_EXT.to_string());

            let _ = result_tx.send(RawEntry::File {
                path: file_path,
                basename,
                ext,
            });
        }
    }
}

/// Exclusion rules from spec §4.E, rules 1-4 (rule 5 is applied by the
/// caller when it computes the root set for a secondary crawl).
fn is_excluded_dir(config: &Config, is_main: bool, basename: &str, normalized_path: &str) -> bool {
    if config.exclude_dirs_by_name.iter().any(|n| n == basename) {
        return true;
    }
    if config.exclude_dirs.iter().any(|d| d == normalized_path) {
        return true;
    }
    if !is_main && config.main_dirs.iter().any(|d| d == normalized_path) {
        return true;
    }
    if is_main && config.exclude_sub_main_dirs.iter().any(|d| d == normalized_path) {
        return true;
    }
    false
}

fn reduce(_config: &Config, result_rx: crossbeam_channel::Receiver<RawEntry>) -> SubIndex {
    let mut index = SubIndex::new();
    for raw in result_rx.iter() {
        match raw {
            RawEntry::Dir { path, basename } => {
                insert(&mut index, FOLDER_EXT, Entry::new(path, &basename));
            }
            RawEntry::File { path, basename, ext } => {
                let stem = if ext == FILE_EXT {
                    basename.as_str()
                } else {
                    &basename[..basename.len() - ext.len()]
                };
                insert(&mut index, &ext, Entry::new(path, stem));
            }
        }
    }
    index
}
