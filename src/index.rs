// PixelSplash
// copyright zipxing@hotmail.com 2022～2025

//! Neighborhood queries for the connection search.
//!
//! The uniform grid answers "who is near (x, y)" by visiting the block
//! of cells that covers the radius, returning a superset of the true
//! within-radius set; callers always re-check exact distance. The grid
//! is rebuilt from scratch every frame because every entity moves every
//! tick, so incremental maintenance would only add bookkeeping.
//!
//! LinearScan is the fallback strategy for hosts that disable spatial
//! optimization. Both strategies yield the same logical candidate set
//! once the caller's exact filter has run, they only differ in cost.

use crate::util::PointF32;
use itertools::Itertools;

pub trait NeighborQuery {
    /// Rebuild internal structures from current entity positions.
    fn rebuild(&mut self, positions: &[PointF32]);

    /// Push candidate entity indices near (x, y) into `out`.
    /// May over-approximate; never under-approximates.
    fn near(&self, x: f32, y: f32, radius: f32, out: &mut Vec<usize>);
}

pub struct UniformGrid {
    cell: f32,
    cols: i32,
    rows: i32,
    w: f32,
    h: f32,
    cells: Vec<Vec<usize>>,
}

impl UniformGrid {
    pub fn new(w: f32, h: f32, cell: f32) -> Self {
        let cell = if cell > 0.0 { cell } else { 100.0 };
        let cols = (w / cell).ceil().max(1.0) as i32;
        let rows = (h / cell).ceil().max(1.0) as i32;
        Self {
            cell,
            cols,
            rows,
            w,
            h,
            cells: vec![Vec::new(); (cols * rows) as usize],
        }
    }

    /// Empty every cell, keeping allocations. O(cells).
    pub fn clear(&mut self) {
        for c in &mut self.cells {
            c.clear();
        }
    }

    /// No-op outside the indexed bounds.
    pub fn insert(&mut self, idx: usize, x: f32, y: f32) {
        if x < 0.0 || y < 0.0 || x >= self.w || y >= self.h {
            return;
        }
        let cx = (x / self.cell) as i32;
        let cy = (y / self.cell) as i32;
        self.cells[(cy * self.cols + cx) as usize].push(idx);
    }
}

impl NeighborQuery for UniformGrid {
    fn rebuild(&mut self, positions: &[PointF32]) {
        self.clear();
        for (i, p) in positions.iter().enumerate() {
            self.insert(i, p.x, p.y);
        }
    }

    fn near(&self, x: f32, y: f32, radius: f32, out: &mut Vec<usize>) {
        let reach = (radius / self.cell).ceil() as i32;
        let cx = (x / self.cell) as i32;
        let cy = (y / self.cell) as i32;
        let x0 = (cx - reach).max(0);
        let x1 = (cx + reach).min(self.cols - 1);
        let y0 = (cy - reach).max(0);
        let y1 = (cy + reach).min(self.rows - 1);
        if x1 < x0 || y1 < y0 {
            return;
        }
        for (gy, gx) in (y0..=y1).cartesian_product(x0..=x1) {
            out.extend_from_slice(&self.cells[(gy * self.cols + gx) as usize]);
        }
    }
}

/// O(n) fallback: keeps the positions and filters exactly.
#[derive(Default)]
pub struct LinearScan {
    positions: Vec<PointF32>,
}

impl LinearScan {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NeighborQuery for LinearScan {
    fn rebuild(&mut self, positions: &[PointF32]) {
        self.positions.clear();
        self.positions.extend_from_slice(positions);
    }

    fn near(&self, x: f32, y: f32, radius: f32, out: &mut Vec<usize>) {
        let r2 = radius * radius;
        let p = PointF32::new(x, y);
        for (i, q) in self.positions.iter().enumerate() {
            if p.dist_sq(q) <= r2 {
                out.push(i);
            }
        }
    }
}

/// Strategy selection happens once, at field construction. The hot
/// loop only ever sees the trait object.
pub fn make_query(spatial: bool, w: f32, h: f32, cell: f32) -> Box<dyn NeighborQuery> {
    if spatial {
        Box::new(UniformGrid::new(w, h, cell))
    } else {
        Box::new(LinearScan::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Rand;

    fn brute_force(positions: &[PointF32], x: f32, y: f32, r: f32) -> Vec<usize> {
        let p = PointF32::new(x, y);
        positions
            .iter()
            .enumerate()
            .filter(|&(_, q)| p.dist_sq(q) <= r * r)
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn test_grid_superset_of_brute_force() {
        let mut rand = Rand::new();
        rand.srand(2024);
        for _ in 0..30 {
            let mut grid = UniformGrid::new(800.0, 600.0, 80.0);
            let positions: Vec<PointF32> = (0..120)
                .map(|_| {
                    PointF32::new(
                        rand.gen_range_f32(0.0, 799.0),
                        rand.gen_range_f32(0.0, 599.0),
                    )
                })
                .collect();
            grid.rebuild(&positions);
            let (qx, qy) = (
                rand.gen_range_f32(0.0, 800.0),
                rand.gen_range_f32(0.0, 600.0),
            );
            let r = rand.gen_range_f32(10.0, 200.0);
            let mut got = Vec::new();
            grid.near(qx, qy, r, &mut got);
            for idx in brute_force(&positions, qx, qy, r) {
                assert!(got.contains(&idx), "grid missed index {idx}");
            }
        }
    }

    #[test]
    fn test_linear_scan_matches_brute_force() {
        let mut rand = Rand::new();
        rand.srand(7);
        let positions: Vec<PointF32> = (0..60)
            .map(|_| PointF32::new(rand.gen_range_f32(0.0, 400.0), rand.gen_range_f32(0.0, 400.0)))
            .collect();
        let mut scan = LinearScan::new();
        scan.rebuild(&positions);
        let mut got = Vec::new();
        scan.near(200.0, 200.0, 90.0, &mut got);
        assert_eq!(got, brute_force(&positions, 200.0, 200.0, 90.0));
    }

    #[test]
    fn test_insert_outside_bounds_is_noop() {
        let mut grid = UniformGrid::new(100.0, 100.0, 50.0);
        grid.insert(0, -1.0, 10.0);
        grid.insert(1, 10.0, 200.0);
        grid.insert(2, 10.0, 10.0);
        let mut got = Vec::new();
        grid.near(10.0, 10.0, 500.0, &mut got);
        assert_eq!(got, vec![2]);
    }

    #[test]
    fn test_clear_empties_every_cell() {
        let mut grid = UniformGrid::new(100.0, 100.0, 25.0);
        for i in 0..10 {
            grid.insert(i, (i * 9) as f32, (i * 9) as f32);
        }
        grid.clear();
        let mut got = Vec::new();
        grid.near(50.0, 50.0, 100.0, &mut got);
        assert!(got.is_empty());
    }
}
