//! The ranker (component G): scores hits from live filesystem metadata and
//! sorts them.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rayon::prelude::*;

use crate::entry::{Pattern, RankedHit};
use crate::matcher::Hit;

const EXACT_MATCH_BONUS: i64 = 500;
const MINIMUM_SIZE_BONUS: i64 = 25;
const MINIMUM_FILE_SIZE_BYTES: u64 = 100;
const RECENCY_MAX_BONUS: f64 = 200.0;
const LENGTH_PENALTY_MAX: f64 = 100.0;
const FOUR_YEARS_SECONDS: f64 = 4.0 * 365.25 * 86_400.0;

/// `round(x * 100) / 100`, rounding half away from zero.
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn score_hit(hit: &Hit, pattern: &Pattern, size: u64, mtime_secs: i64, now_secs: i64) -> i64 {
    let mut points: i64 = 0;

    if hit.lowercased_stem == pattern.lowercased_needle {
        points += EXACT_MATCH_BONUS;
    }

    if size > MINIMUM_FILE_SIZE_BYTES {
        points += MINIMUM_SIZE_BONUS;
    }

    let delta = (now_secs - mtime_secs).max(0) as f64;
    if delta < FOUR_YEARS_SECONDS {
        let reduction = 1.0 - round2(delta / FOUR_YEARS_SECONDS);
        points += (RECENCY_MAX_BONUS * reduction) as i64;
    }

    let stem_len = hit.lowercased_stem.chars().count().max(1);
    let length_reduction = round2(pattern.length as f64 / stem_len as f64);
    points += (LENGTH_PENALTY_MAX * length_reduction) as i64;

    points
}

fn now_unix_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn mtime_unix_secs(metadata: &std::fs::Metadata) -> i64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Rank `hits`, dropping any whose path no longer exists, then sort
/// strictly by score descending (stable, so ties keep encounter order).
///
/// `stat` dominates cost for large result sets, so lookups are fanned out
/// across a rayon scope — one task per hit, matching §5's "ranker also
/// fan-outs over workers to stat files".
pub fn rank(hits: Vec<Hit>, pattern: &Pattern, cancel: &AtomicBool) -> Vec<RankedHit> {
    let now = now_unix_secs();

    let mut ranked: Vec<RankedHit> = hits
        .into_par_iter()
        .filter_map(|hit| {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }

            let metadata = Path::new(&hit.path).symlink_metadata().ok()?;
            let size = metadata.len();
            let mtime = mtime_unix_secs(&metadata);
            let score = score_hit(&hit, pattern, size, mtime, now);

            Some(RankedHit { path: hit.path, score })
        })
        .collect();

    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    fn hit(path: &str, stem: &str) -> Hit {
        Hit {
            path: path.to_string(),
            lowercased_stem: stem.to_string(),
        }
    }

    #[test]
    fn s4_exact_match_ranks_above_partial_match() {
        let tmp = tempfile::tempdir().unwrap();
        let cat = tmp.path().join("cat.txt");
        let scatter = tmp.path().join("scatter.txt");
        let mut f1 = File::create(&cat).unwrap();
        f1.write_all(&[0u8; 500]).unwrap();
        let mut f2 = File::create(&scatter).unwrap();
        f2.write_all(&[0u8; 500]).unwrap();

        let hits = vec![
            hit(scatter.to_str().unwrap(), "scatter"),
            hit(cat.to_str().unwrap(), "cat"),
        ];
        let pattern = Pattern::new("cat", &[]);
        let ranked = rank(hits, &pattern, &AtomicBool::new(false));

        assert_eq!(ranked[0].path, cat.to_str().unwrap());
        assert_eq!(ranked[1].path, scatter.to_str().unwrap());
    }

    #[test]
    fn missing_file_is_silently_dropped() {
        let hits = vec![hit("/this/does/not/exist.txt", "exist")];
        let pattern = Pattern::new("exist", &[]);
        let ranked = rank(hits, &pattern, &AtomicBool::new(false));
        assert!(ranked.is_empty());
    }

    #[test]
    fn sort_is_strictly_score_descending() {
        let tmp = tempfile::tempdir().unwrap();
        let mut paths = vec![];
        for (name, size) in [("a.txt", 1u8), ("bb.txt", 200u8), ("ccc.txt", 10u8)] {
            let p = tmp.path().join(name);
            let mut f = File::create(&p).unwrap();
            f.write_all(&vec![0u8; size as usize]).unwrap();
            paths.push(p);
        }
        let hits: Vec<Hit> = paths
            .iter()
            .map(|p| hit(p.to_str().unwrap(), p.file_stem().unwrap().to_str().unwrap()))
            .collect();
        let pattern = Pattern::new("a", &[]);
        let ranked = rank(hits, &pattern, &AtomicBool::new(false));

        for window in ranked.windows(2) {
            assert!(window[0].score >= window[1].score);
        }
    }

    #[test]
    fn cancellation_drops_all_hits() {
        let hits = vec![hit("/tmp", "tmp")];
        let pattern = Pattern::new("tmp", &[]);
        let ranked = rank(hits, &pattern, &AtomicBool::new(true));
        assert!(ranked.is_empty());
    }

    #[test]
    fn round2_matches_go_rounding() {
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(1.0), 1.0);
    }
}
