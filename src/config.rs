//! The configuration view (component C).
//!
//! Loading/merging configuration from a file or environment is explicitly
//! out of scope (see spec §1); `Config` is the already-resolved shape the
//! engine consumes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BitdexError;
use crate::path_util::normalize_path;

/// Read-only (from the caller's perspective) view of the directories the
/// engine is allowed to crawl and how many workers to use while doing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub worker_count: usize,
    pub main_dirs: Vec<String>,
    pub exclude_sub_main_dirs: Vec<String>,
    pub secondary_dirs: Vec<String>,
    pub exclude_dirs: Vec<String>,
    pub exclude_dirs_by_name: Vec<String>,
}

fn default_worker_count() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1);
    cpus.div_ceil(4).max(1)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            main_dirs: vec!["C:/Users/<USERNAME>/".to_string()],
            exclude_sub_main_dirs: vec!["C:/Users/<USERNAME>/AppData/Roaming".to_string()],
            secondary_dirs: vec!["C:/".to_string()],
            exclude_dirs: vec![
                "C:/Windows/".to_string(),
                "C:/$Recycle.Bin/".to_string(),
                "C:/Users/<USERNAME>/AppData/Local".to_string(),
                "C:/Users/<USERNAME>/AppData/LocalLow".to_string(),
            ],
            exclude_dirs_by_name: vec![
                ".git".to_string(),
                "bin".to_string(),
                "node_modules".to_string(),
                "steamapps".to_string(),
            ],
        }
    }
}

impl Config {
    /// Expand `<USERNAME>` in every path set and normalise separators.
    #[must_use]
    pub fn with_username_expanded(mut self, username: &str) -> Self {
        for set in [
            &mut self.main_dirs,
            &mut self.exclude_sub_main_dirs,
            &mut self.secondary_dirs,
            &mut self.exclude_dirs,
        ] {
            for entry in set.iter_mut() {
                *entry = normalize_path(&crate::path_util::expand_username(entry, username), true);
            }
        }
        self.exclude_dirs_by_name = self
            .exclude_dirs_by_name
            .iter()
            .map(|n| normalize_path(n, false))
            .collect();
        self
    }

    /// The root set a secondary crawl walks: `secondary_dirs ∪
    /// exclude_sub_main_dirs` (§4.E rule 5) — excluded-from-main regions
    /// are deliberately reachable from extended search.
    #[must_use]
    pub fn secondary_roots(&self) -> Vec<String> {
        let mut roots = self.secondary_dirs.clone();
        for dir in &self.exclude_sub_main_dirs {
            if !roots.contains(dir) {
                roots.push(dir.clone());
            }
        }
        roots
    }

    /// Validate the configuration: non-empty `main_dirs`, every configured
    /// path must exist and be a directory, and the worker count must lie in
    /// `[1, logical_cpu_count]`.
    pub fn validate(&self) -> Result<(), BitdexError> {
        if self.main_dirs.is_empty() {
            return Err(BitdexError::EmptyMainDirs);
        }

        let max_workers = std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(1);
        if self.worker_count < 1 || self.worker_count > max_workers {
            return Err(BitdexError::WorkerCountOutOfRange {
                requested: self.worker_count,
                max: max_workers,
            });
        }

        for set in [
            &self.main_dirs,
            &self.exclude_sub_main_dirs,
            &self.secondary_dirs,
            &self.exclude_dirs,
        ] {
            for raw in set {
                validate_directory(raw)?;
            }
        }

        Ok(())
    }
}

fn validate_directory(raw: &str) -> Result<(), BitdexError> {
    let path = Path::new(raw);
    if !path.exists() {
        return Err(BitdexError::PathNotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(BitdexError::NotADirectory(path.to_path_buf()));
    }
    Ok(())
}
