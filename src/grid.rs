//! World↔grid coordinate mapping and the planner's owned dense grids.
//! Occupancy-grid *construction* and CUDA dilation are external
//! collaborators — this module only owns the planner-side copies these
//! algorithms read and write.

use crate::geometry::Point;

/// Maps between a world-frame point and grid cell indices at a single
/// resolution/origin. The planner uses two of these: one for the raw
/// occupancy grid (`GM_RES`) supplied by the caller, one for its own
/// internal search grid (`PLANNER_RES`).
#[derive(Debug, Clone, Copy)]
pub struct GridTransform {
    pub res: f64,
    pub origin: Point,
}

impl GridTransform {
    pub fn new(res: f64, origin: Point) -> Self {
        Self { res, origin }
    }

    pub fn world_to_grid(&self, p: Point) -> (i32, i32) {
        (
            ((p.x - self.origin.x) / self.res).floor() as i32,
            ((p.y - self.origin.y) / self.res).floor() as i32,
        )
    }

    pub fn grid_to_world(&self, xi: i32, yi: i32) -> Point {
        Point::new(
            self.origin.x + (xi as f64 + 0.5) * self.res,
            self.origin.y + (yi as f64 + 0.5) * self.res,
        )
    }
}

/// Dense row-major planner-grid storage: occupancy, per-cell movement
/// weight, the Voronoi potential, adaptive motion resolution, and the
/// obstacle-potential gradient components. All share `dim` and `transform`.
#[derive(Debug, Clone)]
pub struct GridMaps {
    pub dim: usize,
    pub transform: GridTransform,
    pub astar_grid: Vec<u8>,
    pub movement_cost_map: Vec<f64>,
    pub h_prox_arr: Vec<f64>,
    pub motion_res_map: Vec<f64>,
    pub obs_x_grad: Vec<f64>,
    pub obs_y_grad: Vec<f64>,
}

impl GridMaps {
    pub fn new(dim: usize, transform: GridTransform, motion_res_default: f64) -> Self {
        let n = dim * dim;
        Self {
            dim,
            transform,
            astar_grid: vec![0u8; n],
            movement_cost_map: vec![1.0; n],
            h_prox_arr: vec![0.0; n],
            motion_res_map: vec![motion_res_default; n],
            obs_x_grad: vec![0.0; n],
            obs_y_grad: vec![0.0; n],
        }
    }

    #[inline]
    pub fn calc_index(&self, xi: i32, yi: i32) -> usize {
        yi as usize * self.dim + xi as usize
    }

    #[inline]
    pub fn in_bounds(&self, xi: i32, yi: i32) -> bool {
        xi >= 0 && yi >= 0 && (xi as usize) < self.dim && (yi as usize) < self.dim
    }

    pub fn is_occupied(&self, xi: i32, yi: i32) -> bool {
        if !self.in_bounds(xi, yi) {
            return true;
        }
        self.astar_grid[self.calc_index(xi, yi)] != 0
    }

    /// Recenter the grid on a new patch origin, carrying over the
    /// overlapping sub-rectangle of the Voronoi/heuristic-derived grids and
    /// zeroing the rest. CUDA dilation of the occupancy grid itself stays an
    /// external collaborator.
    pub fn reinit(&mut self, new_origin: Point, motion_res_default: f64) {
        let old = self.clone();
        let dim = self.dim;
        self.transform.origin = new_origin;
        self.astar_grid = vec![0u8; dim * dim];
        self.movement_cost_map = vec![1.0; dim * dim];
        self.h_prox_arr = vec![0.0; dim * dim];
        self.motion_res_map = vec![motion_res_default; dim * dim];
        self.obs_x_grad = vec![0.0; dim * dim];
        self.obs_y_grad = vec![0.0; dim * dim];

        let shift_x = ((old.transform.origin.x - new_origin.x) / self.transform.res).round() as i32;
        let shift_y = ((old.transform.origin.y - new_origin.y) / self.transform.res).round() as i32;

        for yi in 0..dim as i32 {
            for xi in 0..dim as i32 {
                let old_xi = xi - shift_x;
                let old_yi = yi - shift_y;
                if !old.in_bounds(old_xi, old_yi) {
                    continue;
                }
                let new_idx = self.calc_index(xi, yi);
                let old_idx = old.calc_index(old_xi, old_yi);
                self.astar_grid[new_idx] = old.astar_grid[old_idx];
                self.movement_cost_map[new_idx] = old.movement_cost_map[old_idx];
                self.h_prox_arr[new_idx] = old.h_prox_arr[old_idx];
                self.motion_res_map[new_idx] = old.motion_res_map[old_idx];
                self.obs_x_grad[new_idx] = old.obs_x_grad[old_idx];
                self.obs_y_grad[new_idx] = old.obs_y_grad[old_idx];
            }
        }
    }

    /// Reset the movement-cost map to uniform weight.
    pub fn reset_movement_map(&mut self) {
        self.movement_cost_map.iter_mut().for_each(|w| *w = 1.0);
    }

    /// Push externally-supplied per-cell movement weights (e.g. from a
    /// lane-graph collaborator) without this crate depending on lane-graph
    /// types.
    pub fn set_movement_map(&mut self, weights: impl Iterator<Item = (i32, i32, f64)>) {
        for (xi, yi, w) in weights {
            if self.in_bounds(xi, yi) {
                let idx = self.calc_index(xi, yi);
                self.movement_cost_map[idx] = w;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_grid_roundtrip() {
        let t = GridTransform::new(0.25, Point::new(-5.0, -5.0));
        let (xi, yi) = t.world_to_grid(Point::new(1.0, 5.0));
        let p = t.grid_to_world(xi, yi);
        assert!((p.x - 1.125).abs() < 1e-9);
        assert!((p.y - 5.125).abs() < 1e-9);
    }

    #[test]
    fn out_of_bounds_is_occupied() {
        let grid = GridMaps::new(10, GridTransform::new(0.25, Point::new(0.0, 0.0)), 0.1);
        assert!(grid.is_occupied(-1, 0));
        assert!(grid.is_occupied(10, 0));
    }

    #[test]
    fn reinit_preserves_overlap() {
        let mut grid = GridMaps::new(10, GridTransform::new(1.0, Point::new(0.0, 0.0)), 0.1);
        let idx = grid.calc_index(5, 5);
        grid.astar_grid[idx] = 1;
        grid.reinit(Point::new(1.0, 0.0), 0.1);
        // cell (5,5) in old frame is cell (4,5) in the shifted frame.
        let new_idx = grid.calc_index(4, 5);
        assert_eq!(grid.astar_grid[new_idx], 1);
    }
}
