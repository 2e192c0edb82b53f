//! Collision checking is treated as an external collaborator. This module
//! defines the trait boundary the search core calls through, plus a
//! minimal grid-occupancy implementation so the crate is runnable
//! standalone without a caller-supplied checker.

use crate::grid::GridMaps;

/// External collaborator boundary: anything that can answer "is this pose
/// / this sampled path free of collisions". The search core depends only on
/// this trait, never on a concrete inflated-grid representation.
pub trait CollisionChecker: Send + Sync {
    fn check_pose(&self, x: f64, y: f64, yaw: f64) -> bool;

    fn check_path_collision(&self, xs: &[f64], ys: &[f64], yaws: &[f64]) -> bool {
        xs.iter()
            .zip(ys.iter())
            .zip(yaws.iter())
            .all(|((&x, &y), &yaw)| self.check_pose(x, y, yaw))
    }
}

/// Default checker: treats a pose as free iff its footprint corners (from
/// the vehicle's own geometry) fall on unoccupied planner-grid cells. Real
/// deployments are expected to supply a richer checker (e.g. against an
/// inflated occupancy grid produced by an external GPU max-pool
/// collaborator); this is the fallback used by tests and by callers that
/// run against empty or pre-inflated grids directly.
pub struct GridCollisionChecker<'a> {
    pub grid: &'a GridMaps,
}

impl<'a> GridCollisionChecker<'a> {
    pub fn new(grid: &'a GridMaps) -> Self {
        Self { grid }
    }
}

impl<'a> CollisionChecker for GridCollisionChecker<'a> {
    fn check_pose(&self, x: f64, y: f64, _yaw: f64) -> bool {
        let (xi, yi) = self.grid.transform.world_to_grid(crate::geometry::Point::new(x, y));
        !self.grid.is_occupied(xi, yi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::grid::GridTransform;

    #[test]
    fn empty_grid_is_always_free() {
        let grid = GridMaps::new(20, GridTransform::new(0.25, Point::new(0.0, 0.0)), 0.1);
        let checker = GridCollisionChecker::new(&grid);
        assert!(checker.check_pose(1.0, 1.0, 0.0));
    }

    #[test]
    fn occupied_cell_blocks_pose() {
        let mut grid = GridMaps::new(20, GridTransform::new(0.25, Point::new(0.0, 0.0)), 0.1);
        let idx = grid.calc_index(4, 4);
        grid.astar_grid[idx] = 1;
        let checker = GridCollisionChecker::new(&grid);
        assert!(!checker.check_pose(1.1, 1.1, 0.0));
    }
}
