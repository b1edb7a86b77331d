//! Uniform broad-phase grid
//!
//! Each cell remembers the cycle it was last written in. `clear()` only bumps
//! the current cycle; a stale cell is emptied the first time something is
//! inserted into it during the new cycle. Cost per tick is proportional to the
//! occupied cells, never to the whole grid.
//!
//! Cell size must be at least the largest moving entity's bounding box for
//! the pair enumeration to be tight; the grid itself stays correct (never
//! out of bounds) for any box, clamping coordinates outside the field.

use glam::Vec2;

use crate::consts::GRID_CELL_SIZE;

#[derive(Debug, Clone, Default)]
struct Cell {
    cycle: u32,
    ids: Vec<usize>,
}

/// Broad-phase index over entity arena indices
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    cols: usize,
    rows: usize,
    cycle: u32,
    cells: Vec<Cell>,
}

/// Upper bound on cells allocated by one grid
pub const MAX_GRID_CELLS: usize = 1 << 16;

impl SpatialGrid {
    /// Grid covering `width` x `height`. Cells are widened (doubling) until
    /// the cell count fits in `MAX_GRID_CELLS`; an unusable size falls back
    /// to the default cell size.
    pub fn new(width: f32, height: f32, cell_size: f32) -> Self {
        let mut cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            GRID_CELL_SIZE
        };
        let requested = cell_size;

        // Float-to-int casts saturate and map NaN to 0
        let axis = |len: f32, size: f32| ((len / size).ceil() as usize).max(1);
        let (cols, rows) = loop {
            let (cols, rows) = (axis(width, cell_size), axis(height, cell_size));
            match cols.checked_mul(rows) {
                Some(count) if count <= MAX_GRID_CELLS => break (cols, rows),
                _ if cell_size.is_finite() => cell_size *= 2.0,
                _ => break (1, 1),
            }
        };
        if cell_size != requested {
            log::warn!(
                "Grid cell size {} too fine for {}x{} - using {}",
                requested,
                width,
                height,
                cell_size
            );
        }

        Self {
            cell_size,
            cols,
            rows,
            // Cells start at cycle 0; the first clear() makes them all stale
            cycle: 0,
            cells: vec![Cell::default(); cols * rows],
        }
    }

    /// Grid dimensions in cells (columns, rows)
    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Start a new cycle. O(1)
    pub fn clear(&mut self) {
        self.cycle = self.cycle.wrapping_add(1);
    }

    /// Cell range covered by a box, clamped to the grid
    fn cell_range(&self, min: Vec2, max: Vec2) -> (usize, usize, usize, usize) {
        let clamp = |v: f32, len: usize| -> usize {
            // NaN and negatives land in cell 0
            let c = (v / self.cell_size).floor();
            if c.is_nan() || c < 0.0 {
                0
            } else {
                (c as usize).min(len - 1)
            }
        };
        let x0 = clamp(min.x, self.cols);
        let y0 = clamp(min.y, self.rows);
        let x1 = clamp(max.x, self.cols).max(x0);
        let y1 = clamp(max.y, self.rows).max(y0);
        (x0, y0, x1, y1)
    }

    /// Register `id` in every cell its bounding box touches
    pub fn insert(&mut self, min: Vec2, max: Vec2, id: usize) {
        let (x0, y0, x1, y1) = self.cell_range(min, max);
        let cycle = self.cycle;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let cell = &mut self.cells[y * self.cols + x];
                if cell.cycle != cycle {
                    cell.cycle = cycle;
                    cell.ids.clear();
                }
                cell.ids.push(id);
            }
        }
    }

    /// All ids registered this cycle in cells touching the region, sorted and deduplicated
    pub fn query(&self, min: Vec2, max: Vec2) -> Vec<usize> {
        let (x0, y0, x1, y1) = self.cell_range(min, max);
        let mut result = Vec::new();
        for y in y0..=y1 {
            for x in x0..=x1 {
                let cell = &self.cells[y * self.cols + x];
                if cell.cycle == self.cycle {
                    result.extend_from_slice(&cell.ids);
                }
            }
        }
        result.sort_unstable();
        result.dedup();
        result
    }

    /// Every pair of ids sharing a cell this cycle, as `(low, high)`, sorted and deduplicated
    pub fn query_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for cell in &self.cells {
            if cell.cycle != self.cycle || cell.ids.len() < 2 {
                continue;
            }
            for (i, &a) in cell.ids.iter().enumerate() {
                for &b in &cell.ids[i + 1..] {
                    if a != b {
                        pairs.push((a.min(b), a.max(b)));
                    }
                }
            }
        }
        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }
}
