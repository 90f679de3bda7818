// cell_list.rs
// Uniform bucket grid used for the neighbour search

use smallvec::SmallVec;
use std::ops::Range;
use ultraviolet::Vec2;

use crate::body::Body;
use crate::config::MAX_GRID_CELLS;

/// Uniform bucket grid over `[0, width] x [0, height]`.
///
/// Cells are stored contiguously: `entries[cell_start[c]..cell_start[c + 1]]`
/// holds the body indices of cell `c` in ascending order. A position in
/// `entries` is called a slot.
///
/// `cell_size` is never below the requested minimum (the interaction
/// cutoff) and grows for very large domains so the grid stays within
/// `MAX_GRID_CELLS` cells.
pub struct CellList {
    pub domain_width: f32,
    pub domain_height: f32,
    pub cell_size: f32,
    min_cell_size: f32,
    grid_size_x: usize,
    grid_size_y: usize,
    cell_start: Vec<usize>,
    entries: Vec<usize>,
    // scratch: cell of each body from the last rebuild, usize::MAX if excluded
    body_cell: Vec<usize>,
    cursor: Vec<usize>,
    excluded: usize,
}

impl CellList {
    pub fn new(domain_width: f32, domain_height: f32, cell_size: f32) -> Self {
        let mut list = Self {
            domain_width,
            domain_height,
            cell_size,
            min_cell_size: cell_size,
            grid_size_x: 1,
            grid_size_y: 1,
            cell_start: vec![0, 0],
            entries: Vec::new(),
            body_cell: Vec::new(),
            cursor: Vec::new(),
            excluded: 0,
        };
        list.resize_grid();
        list
    }

    fn resize_grid(&mut self) {
        // +1 so that a body exactly on the far edge still has a column/row
        let axis = |extent: f32, cell: f64| (f64::from(extent) / cell).floor() + 1.0;
        let mut cell = f64::from(self.min_cell_size).max(f64::MIN_POSITIVE);
        while axis(self.domain_width, cell) * axis(self.domain_height, cell) > MAX_GRID_CELLS as f64
            && cell.is_finite()
        {
            cell *= 2.0;
        }
        self.cell_size = cell as f32;
        self.grid_size_x = axis(self.domain_width, cell) as usize;
        self.grid_size_y = axis(self.domain_height, cell) as usize;
    }

    /// Clear and repopulate from current positions.
    ///
    /// Bodies outside the domain are left out for this frame.
    pub fn rebuild(&mut self, bodies: &[Body]) {
        self.resize_grid();
        let cells = self.cell_count();

        self.cell_start.clear();
        self.cell_start.resize(cells + 1, 0);
        self.body_cell.clear();
        self.excluded = 0;

        for body in bodies {
            match self.cell_of(body.pos) {
                Some(c) => {
                    self.cell_start[c + 1] += 1;
                    self.body_cell.push(c);
                }
                None => {
                    self.excluded += 1;
                    self.body_cell.push(usize::MAX);
                }
            }
        }
        for c in 0..cells {
            self.cell_start[c + 1] += self.cell_start[c];
        }

        let placed = self.cell_start[cells];
        self.entries.clear();
        self.entries.resize(placed, 0);
        self.cursor.clear();
        self.cursor.extend_from_slice(&self.cell_start[..cells]);
        for (i, &c) in self.body_cell.iter().enumerate() {
            if c != usize::MAX {
                self.entries[self.cursor[c]] = i;
                self.cursor[c] += 1;
            }
        }

        if self.excluded > 0 {
            log::debug!(
                "cell list: {} of {} bodies outside {}x{} excluded",
                self.excluded,
                bodies.len(),
                self.domain_width,
                self.domain_height
            );
        }
    }

    /// Resize the grid. Cell contents are refreshed by the next `rebuild`.
    pub fn update_domain_size(&mut self, domain_width: f32, domain_height: f32) {
        self.domain_width = domain_width;
        self.domain_height = domain_height;
        self.resize_grid();
        if self.cell_size > self.min_cell_size {
            log::debug!(
                "cell list: {}x{} domain, cell size raised to {}",
                domain_width,
                domain_height,
                self.cell_size
            );
        }
    }

    /// Cell holding `pos`, or `None` when it is outside the domain.
    pub fn cell_of(&self, pos: Vec2) -> Option<usize> {
        let in_x = pos.x >= 0.0 && pos.x <= self.domain_width;
        let in_y = pos.y >= 0.0 && pos.y <= self.domain_height;
        if !(in_x && in_y) {
            return None;
        }
        let x = ((pos.x / self.cell_size).floor() as usize).min(self.grid_size_x - 1);
        let y = ((pos.y / self.cell_size).floor() as usize).min(self.grid_size_y - 1);
        Some(x + y * self.grid_size_x)
    }

    pub fn cell_count(&self) -> usize {
        self.grid_size_x * self.grid_size_y
    }

    pub fn grid_size(&self) -> (usize, usize) {
        (self.grid_size_x, self.grid_size_y)
    }

    /// Body indices in `cell`.
    pub fn cell(&self, cell: usize) -> &[usize] {
        &self.entries[self.cell_start[cell]..self.cell_start[cell + 1]]
    }

    /// The 3x3 block centred on `cell`, clipped at the grid edges.
    pub fn neighbors_of(&self, cell: usize) -> SmallVec<[usize; 9]> {
        let cx = (cell % self.grid_size_x) as isize;
        let cy = (cell / self.grid_size_x) as isize;
        let mut out = SmallVec::new();
        for dy in -1..=1 {
            for dx in -1..=1 {
                let x = cx + dx;
                let y = cy + dy;
                if x < 0 || y < 0 || x >= self.grid_size_x as isize || y >= self.grid_size_y as isize {
                    continue;
                }
                out.push(x as usize + y as usize * self.grid_size_x);
            }
        }
        out
    }

    /// Slots covered by a contiguous run of cells.
    pub fn slot_range(&self, cells: Range<usize>) -> Range<usize> {
        self.cell_start[cells.start]..self.cell_start[cells.end]
    }

    /// Prefix offsets of each cell into `entries`, `cell_count() + 1` long.
    pub fn cell_starts(&self) -> &[usize] {
        &self.cell_start
    }

    /// Body index for every slot, grouped by cell.
    pub fn entries(&self) -> &[usize] {
        &self.entries
    }

    /// Bodies left out of the last rebuild.
    pub fn excluded(&self) -> usize {
        self.excluded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_at(x: f32, y: f32) -> Body {
        Body::at_rest(Vec2::new(x, y), 1.0, 0)
    }

    #[test]
    fn every_in_bounds_body_is_in_exactly_one_cell() {
        let bodies: Vec<Body> = (0..50)
            .map(|i| body_at((i * 17 % 100) as f32, (i * 31 % 80) as f32))
            .collect();
        let mut cells = CellList::new(100.0, 80.0, 30.0);
        cells.rebuild(&bodies);

        let mut seen = vec![0usize; bodies.len()];
        for c in 0..cells.cell_count() {
            for &i in cells.cell(c) {
                seen[i] += 1;
                assert_eq!(cells.cell_of(bodies[i].pos), Some(c));
            }
        }
        assert!(seen.iter().all(|&n| n == 1));
        assert_eq!(cells.excluded(), 0);
    }

    #[test]
    fn far_edge_is_placed_and_outside_is_excluded() {
        let bodies = vec![
            body_at(90.0, 90.0),
            body_at(91.0, 10.0),
            body_at(-0.5, 10.0),
            body_at(10.0, f32::NAN),
        ];
        let mut cells = CellList::new(90.0, 90.0, 30.0);
        cells.rebuild(&bodies);
        assert_eq!(cells.grid_size(), (4, 4));
        assert_eq!(cells.cell_of(bodies[0].pos), Some(15));
        assert_eq!(cells.excluded(), 3);
        assert_eq!(cells.entries(), &[0]);
    }

    #[test]
    fn neighbourhood_is_clipped_at_edges() {
        let cells = CellList::new(100.0, 100.0, 30.0);
        // 4x4 grid
        assert_eq!(cells.neighbors_of(0).as_slice(), &[0, 1, 4, 5]);
        assert_eq!(cells.neighbors_of(5).len(), 9);
        assert_eq!(cells.neighbors_of(15).as_slice(), &[10, 11, 14, 15]);
    }

    #[test]
    fn shrinking_takes_effect_on_rebuild() {
        let bodies = vec![body_at(50.0, 50.0), body_at(150.0, 50.0)];
        let mut cells = CellList::new(200.0, 100.0, 25.0);
        cells.rebuild(&bodies);
        assert_eq!(cells.excluded(), 0);

        cells.update_domain_size(100.0, 100.0);
        assert_eq!(cells.excluded(), 0);
        cells.rebuild(&bodies);
        assert_eq!(cells.excluded(), 1);
        assert_eq!(cells.entries(), &[0]);
    }

    #[test]
    fn huge_domain_keeps_grid_bounded() {
        for (w, h) in [(1e30, 1e30), (1e7, 1e7), (f32::MAX, 10.0)] {
            let mut cells = CellList::new(w, h, 300.0);
            assert!(cells.cell_count() <= MAX_GRID_CELLS, "{w}x{h}: {}", cells.cell_count());
            assert!(cells.cell_size >= 300.0);

            let bodies = vec![body_at(0.0, 0.0), body_at(w, h), body_at(w / 2.0, h / 2.0)];
            cells.rebuild(&bodies);
            assert_eq!(cells.excluded(), 0);
            assert_eq!(cells.cell_of(bodies[1].pos), Some(cells.cell_count() - 1));
        }
    }

    #[test]
    fn ordinary_domain_keeps_requested_cell_size() {
        let mut cells = CellList::new(800.0, 600.0, 300.0);
        assert_eq!(cells.cell_size, 300.0);
        assert_eq!(cells.grid_size(), (3, 3));

        cells.update_domain_size(1e9, 600.0);
        assert!(cells.cell_size > 300.0);
        cells.update_domain_size(800.0, 600.0);
        assert_eq!(cells.cell_size, 300.0);
    }

    #[test]
    fn slots_follow_cell_order() {
        let bodies = vec![body_at(70.0, 5.0), body_at(5.0, 5.0), body_at(6.0, 6.0)];
        let mut cells = CellList::new(90.0, 30.0, 30.0);
        cells.rebuild(&bodies);
        assert_eq!(cells.entries(), &[1, 2, 0]);
        assert_eq!(cells.slot_range(0..1), 0..2);
        assert_eq!(cells.slot_range(2..3), 2..3);
    }
}
