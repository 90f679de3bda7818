// partition.rs
// Worker count, thread pool and per-worker work ranges

//! Work partitioning for the interaction phase.
//!
//! Workers come from one persistent rayon pool per simulation. Each frame
//! hands every worker one contiguous range of cells (or of body indices in
//! all-pairs mode); ranges never overlap, so no two workers ever produce
//! the same body's velocity delta.

use rayon::{ThreadPool, ThreadPoolBuilder};
use std::ops::Range;

use crate::config;
use crate::error::Result;

/// Resolve the number of interaction workers.
///
/// `None` means hardware concurrency. Zero is coerced to one. The optional
/// ceiling is applied last.
pub fn resolve_worker_count(requested: Option<usize>, ceiling: Option<usize>) -> usize {
    let mut threads = match requested {
        Some(0) => {
            log::warn!("worker_threads = 0 requested, using {}", config::MIN_THREADS);
            config::MIN_THREADS
        }
        Some(n) => n,
        None => std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(config::MIN_THREADS),
    };
    if let Some(max) = ceiling {
        threads = threads.min(max);
    }
    threads.max(config::MIN_THREADS)
}

/// Build the persistent pool used for every frame's fork-join.
pub fn build_pool(workers: usize) -> Result<ThreadPool> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("interact-{i}"))
        .build()?;
    Ok(pool)
}

/// Split cells into exactly `workers` contiguous ranges holding roughly the
/// same number of bodies. Ranges are disjoint and cover every cell; some may
/// be empty.
pub fn balanced_cell_ranges(cell_starts: &[usize], workers: usize) -> Vec<Range<usize>> {
    let workers = workers.max(1);
    let cells = cell_starts.len().saturating_sub(1);
    let total = cell_starts.last().copied().unwrap_or(0);

    let mut ranges = Vec::with_capacity(workers);
    let mut start = 0;
    for k in 1..=workers {
        let end = if k == workers {
            cells
        } else {
            let target = total * k / workers;
            start + cell_starts[start..=cells].partition_point(|&s| s < target)
        };
        let end = end.clamp(start, cells);
        ranges.push(start..end);
        start = end;
    }
    ranges
}

/// Split `0..len` into `workers` contiguous, near-equal ranges.
pub fn index_ranges(len: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.max(1);
    (0..workers)
        .map(|k| (len * k / workers)..(len * (k + 1) / workers))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_tiles(ranges: &[Range<usize>], len: usize) {
        let mut next = 0;
        for r in ranges {
            assert_eq!(r.start, next, "ranges must be contiguous: {ranges:?}");
            assert!(r.end >= r.start);
            next = r.end;
        }
        assert_eq!(next, len);
    }

    #[test]
    fn zero_workers_becomes_one() {
        assert_eq!(resolve_worker_count(Some(0), None), 1);
        assert_eq!(resolve_worker_count(Some(8), Some(3)), 3);
        assert_eq!(resolve_worker_count(Some(2), Some(0)), 1);
        assert!(resolve_worker_count(None, None) >= 1);
    }

    #[test]
    fn cell_ranges_tile_all_cells() {
        // 6 cells holding 0, 4, 0, 1, 5, 2 bodies
        let starts = [0, 0, 4, 4, 5, 10, 12];
        for workers in 1..=8 {
            let ranges = balanced_cell_ranges(&starts, workers);
            assert_eq!(ranges.len(), workers);
            assert_tiles(&ranges, 6);
        }
    }

    #[test]
    fn cell_ranges_balance_bodies() {
        // 100 cells with one body each
        let starts: Vec<usize> = (0..=100).collect();
        let ranges = balanced_cell_ranges(&starts, 4);
        assert_eq!(ranges, vec![0..25, 25..50, 50..75, 75..100]);
    }

    #[test]
    fn empty_grid_goes_to_last_worker() {
        let starts = [0, 0, 0, 0];
        let ranges = balanced_cell_ranges(&starts, 3);
        assert_tiles(&ranges, 3);
    }

    #[test]
    fn index_ranges_tile() {
        for workers in 1..6 {
            assert_tiles(&index_ranges(17, workers), 17);
        }
        assert_tiles(&index_ranges(2, 5), 2);
    }

    #[test]
    fn pool_has_requested_threads() {
        let pool = build_pool(3).unwrap();
        assert_eq!(pool.current_num_threads(), 3);
    }
}
