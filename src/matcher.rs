//! The two-phase matcher (component F): a constant-time bitmap pre-filter
//! followed by an exact, case-folded substring confirmation.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::entry::Pattern;
use crate::index::SubIndex;

/// A match before ranking: the entry's path and its lowercased stem (the
/// ranker needs the stem to test for an exact-match bonus).
#[derive(Debug, Clone)]
pub struct Hit {
    pub path: String,
    pub lowercased_stem: String,
}

/// Search a single sub-index snapshot for `pattern`, honouring `cancel`.
pub fn search_sub_index(index: &SubIndex, pattern: &Pattern, cancel: &AtomicBool) -> Vec<Hit> {
    let mut hits = Vec::new();

    for (ext, by_length) in index {
        if !pattern.extension_admitted(ext) {
            continue;
        }

        for (&length, entries) in by_length {
            if length < pattern.length {
                continue;
            }

            for entry in entries {
                if cancel.load(Ordering::Relaxed) {
                    return hits;
                }

                if !pattern.bitmap.covers(entry.bitmap) {
                    continue;
                }

                if !entry.lowercased_stem.contains(&pattern.lowercased_needle) {
                    continue;
                }

                hits.push(Hit {
                    path: entry.path.clone(),
                    lowercased_stem: entry.lowercased_stem.clone(),
                });
            }
        }
    }

    hits
}

/// Run the matcher against `main`, and additionally against `secondary`
/// iff `extended` is set.
pub fn start(
    main: &SubIndex,
    secondary: Option<&SubIndex>,
    pattern: &Pattern,
    extended: bool,
    cancel: &AtomicBool,
) -> Vec<Hit> {
    let mut hits = search_sub_index(main, pattern, cancel);

    if extended && !cancel.load(Ordering::Relaxed) {
        if let Some(secondary) = secondary {
            hits.extend(search_sub_index(secondary, pattern, cancel));
        }
    }

    hits
}
