// simulation/forces.rs
// Parallel species-rule interaction engine

//! Species-rule interaction between bodies.
//!
//! The engine owns a persistent worker pool. Each call is one fork-join:
//! work is split into disjoint ranges, every range writes its own slice of
//! a delta buffer, and the call returns only after every worker is done.
//! Positions, species and rules are read-only for the whole call.

use rayon::prelude::*;
use rayon::ThreadPool;
use std::ops::Range;
use ultraviolet::Vec2;

use super::force_law::ForceLaw;
use crate::body::Body;
use crate::cell_list::CellList;
use crate::error::Result;
use crate::partition;
use crate::species::RuleMatrix;

/// Shared, read-only state for one interaction phase.
#[derive(Clone, Copy)]
pub struct InteractionContext<'a> {
    pub bodies: &'a [Body],
    pub rules: &'a RuleMatrix,
    pub law: &'a ForceLaw,
}

impl InteractionContext<'_> {
    /// Velocity contribution on body `i` from body `j`.
    #[inline]
    pub fn pair_delta(&self, i: usize, j: usize) -> Vec2 {
        let a = &self.bodies[i];
        let b = &self.bodies[j];
        let d = b.pos - a.pos;
        let dist = d.mag();
        if !(dist > 0.0) {
            return Vec2::zero();
        }
        let peak = self.rules.get(a.species, b.species);
        let min_dist = self.law.min_distance(a.radius, b.radius);
        let mag = self.law.magnitude(dist, min_dist, peak);
        d * (mag / dist)
    }
}

/// Split `buf` into consecutive disjoint chunks of the given lengths.
fn carve<'a, T>(mut rest: &'a mut [T], lens: impl Iterator<Item = usize>) -> Vec<&'a mut [T]> {
    let mut chunks = Vec::new();
    for len in lens {
        let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(len);
        chunks.push(chunk);
        rest = tail;
    }
    chunks
}

pub struct InteractionEngine {
    pool: ThreadPool,
    // per-slot deltas, grouped by cell like `CellList::entries`
    slot_deltas: Vec<Vec2>,
}

impl InteractionEngine {
    pub fn new(workers: usize) -> Result<Self> {
        Ok(Self {
            pool: partition::build_pool(workers)?,
            slot_deltas: Vec::new(),
        })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Gridded path: each worker owns a contiguous run of cells and sums,
    /// for every body in them, the pull of every body in the 3x3 block
    /// around its cell.
    ///
    /// `deltas` is indexed like `ctx.bodies` and fully overwritten; bodies
    /// the grid left out get zero.
    pub fn accumulate_gridded(
        &mut self,
        ctx: InteractionContext<'_>,
        grid: &CellList,
        deltas: &mut [Vec2],
    ) {
        let ranges = partition::balanced_cell_ranges(grid.cell_starts(), self.workers());

        self.slot_deltas.clear();
        self.slot_deltas.resize(grid.entries().len(), Vec2::zero());
        let chunks = carve(
            self.slot_deltas.as_mut_slice(),
            ranges.iter().map(|cells| grid.slot_range(cells.clone()).len()),
        );
        let work: Vec<(Range<usize>, &mut [Vec2])> = ranges.into_iter().zip(chunks).collect();

        self.pool.install(|| {
            work.into_par_iter()
                .for_each(|(cells, out)| interact_cells(ctx, grid, cells, out));
        });

        deltas.fill(Vec2::zero());
        for (&i, &dv) in grid.entries().iter().zip(&self.slot_deltas) {
            deltas[i] = dv;
        }
    }

    /// Reference path: bodies are split by index and each one is summed
    /// against every other body. O(n^2).
    pub fn accumulate_all_pairs(&self, ctx: InteractionContext<'_>, deltas: &mut [Vec2]) {
        let n = ctx.bodies.len();
        let ranges = partition::index_ranges(n, self.workers());
        let chunks = carve(deltas, ranges.iter().map(|r| r.len()));
        let work: Vec<(Range<usize>, &mut [Vec2])> = ranges.into_iter().zip(chunks).collect();

        self.pool.install(|| {
            work.into_par_iter().for_each(|(range, out)| {
                for (i, dv) in range.zip(out.iter_mut()) {
                    let mut acc = Vec2::zero();
                    for j in 0..n {
                        if j != i {
                            acc += ctx.pair_delta(i, j);
                        }
                    }
                    *dv = acc;
                }
            });
        });
    }
}

fn interact_cells(
    ctx: InteractionContext<'_>,
    grid: &CellList,
    cells: Range<usize>,
    out: &mut [Vec2],
) {
    let base = grid.slot_range(cells.clone()).start;
    let entries = grid.entries();
    for cell in cells {
        let neighbors = grid.neighbors_of(cell);
        for slot in grid.slot_range(cell..cell + 1) {
            let i = entries[slot];
            let mut acc = Vec2::zero();
            for &n in &neighbors {
                for &j in grid.cell(n) {
                    if j != i {
                        acc += ctx.pair_delta(i, j);
                    }
                }
            }
            out[slot - base] = acc;
        }
    }
}
