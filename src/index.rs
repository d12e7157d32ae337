//! The index store (component D).
//!
//! Tracks each sub-index's lifecycle with an explicit `IndexState` plus a
//! real `parking_lot::RwLock`, instead of ad-hoc boolean flags.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::entry::Entry;

/// `extension -> stem length -> entries`.
pub type SubIndex = HashMap<String, HashMap<usize, Vec<Entry>>>;

#[must_use]
pub fn stem_len(stem: &str) -> usize {
    stem.chars().count()
}

/// Insert `entry` (whose stem is `stem`) into `index` under `ext`.
pub fn insert(index: &mut SubIndex, ext: &str, entry: Entry) {
    index
        .entry(ext.to_string())
        .or_default()
        .entry(stem_len(&entry.lowercased_stem))
        .or_default()
        .push(entry);
}

/// The coarse lifecycle of a sub-index, layered over the fine-grained
/// reader/writer locking that actually enforces exclusivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    Empty,
    Building,
    Ready,
}

/// One half of the filesystem index (either `main` or `secondary`).
///
/// A search acquires a read guard (many readers, no writer); a crawl publish
/// acquires a write guard just long enough to swap the `Arc<SubIndex>`
/// pointer, so readers already in flight keep looking at the pre-swap data
/// and never observe a half-built index.
pub struct IndexSlot {
    data: RwLock<Arc<SubIndex>>,
    state: RwLock<IndexState>,
}

impl Default for IndexSlot {
    fn default() -> Self {
        Self {
            data: RwLock::new(Arc::new(SubIndex::new())),
            state: RwLock::new(IndexState::Empty),
        }
    }
}

impl IndexSlot {
    /// A stable, point-in-time view for the duration of a search.
    #[must_use]
    pub fn snapshot(&self) -> Arc<SubIndex> {
        Arc::clone(&self.data.read())
    }

    #[must_use]
    pub fn state(&self) -> IndexState {
        *self.state.read()
    }

    pub fn mark_building(&self) {
        *self.state.write() = IndexState::Building;
    }

    /// Atomically publish a freshly-built sub-index. Blocks until any
    /// in-flight readers release their guard; used for the synchronous
    /// `ForceRefresh` path where blocking is acceptable.
    pub fn replace(&self, fresh: SubIndex) {
        *self.data.write() = Arc::new(fresh);
        *self.state.write() = IndexState::Ready;
    }

    /// Publish `fresh` only if no reader currently holds the data lock.
    /// Returns `false` (without blocking) if a search is in flight, which
    /// is how the refresh scheduler implements "writable=false skips this
    /// tick" without starving active readers.
    #[must_use]
    pub fn try_replace(&self, fresh: SubIndex) -> bool {
        let Some(mut guard) = self.data.try_write() else {
            return false;
        };
        *guard = Arc::new(fresh);
        *self.state.write() = IndexState::Ready;
        true
    }
}

/// Holds both sub-indices behind independent locks so a `main` rebuild never
/// blocks a `secondary`-only search and vice versa.
#[derive(Default)]
pub struct FilesystemIndex {
    pub main: IndexSlot,
    pub secondary: IndexSlot,
}

impl FilesystemIndex {
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.main.state() == IndexState::Ready
    }
}
