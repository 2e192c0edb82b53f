//! 2D grid A* distance heuristic. Expands outward from the goal over
//! 8-connected grid motions, biased by the per-cell movement weight,
//! Voronoi proximity, and an unknown-cell penalty. Feeds both the Hybrid
//! A* core's `h_2D` heuristic and the Voronoi field's adaptive motion
//! resolution.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use once_cell::sync::Lazy;

use crate::grid::GridMaps;
use crate::node::NodeDisc;

/// The 8 grid motions and their Euclidean lengths, computed once and shared
/// by every `Astar2D` instance.
static MOTIONS: Lazy<[(i32, i32, f64); 8]> = Lazy::new(|| {
    [
        (1, 0, 1.0),
        (0, 1, 1.0),
        (-1, 0, 1.0),
        (0, -1, 1.0),
        (-1, -1, std::f64::consts::SQRT_2),
        (-1, 1, std::f64::consts::SQRT_2),
        (1, -1, std::f64::consts::SQRT_2),
        (1, 1, std::f64::consts::SQRT_2),
    ]
});

pub const OUT_OF_HEURISTIC: f64 = f64::INFINITY;

#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    f: f64,
    order: u64,
    idx: usize,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.f == other.f && self.order == other.order
    }
}
impl Eq for QueueEntry {}
impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on f, FIFO (lower insertion order first) on ties.
        other
            .f
            .partial_cmp(&self.f)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.order.cmp(&self.order))
    }
}
impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Result of a 2D A* expansion: the closed set keyed by `yi * dim + xi`.
pub type ClosedSet = HashMap<usize, NodeDisc>;

pub struct Astar2D {
    pub astar_movement_cost: f64,
    pub astar_prox_cost: f64,
    pub unknown_cost_w: f64,
}

impl Astar2D {
    pub fn new(astar_movement_cost: f64, astar_prox_cost: f64, unknown_cost_w: f64) -> Self {
        Self { astar_movement_cost, astar_prox_cost, unknown_cost_w }
    }

    /// Expand from `goal` outward. `for_path=true` stops as soon as `start`
    /// settles (heuristic early exit); `for_path=false` explores the whole
    /// reachable region for global guidance.
    pub fn calc_distance_heuristic(
        &self,
        grid: &GridMaps,
        goal: (i32, i32),
        start: Option<(i32, i32)>,
        for_path: bool,
    ) -> ClosedSet {
        let mut closed: ClosedSet = HashMap::new();
        let mut open: HashMap<usize, NodeDisc> = HashMap::new();
        let mut heap: BinaryHeap<QueueEntry> = BinaryHeap::new();
        let mut order_counter: u64 = 0;

        let goal_idx = NodeDisc::calc_index(goal.0, goal.1, grid.dim);
        let root = NodeDisc { xi: goal.0, yi: goal.1, cost: 0.0, cost_dist: 0.0, parent_index: None };
        open.insert(goal_idx, root);
        heap.push(QueueEntry { f: 0.0, order: 0, idx: goal_idx });
        order_counter += 1;

        let start_idx = start.map(|(xi, yi)| NodeDisc::calc_index(xi, yi, grid.dim));

        while let Some(entry) = heap.pop() {
            let node = match open.remove(&entry.idx) {
                Some(n) => n,
                None => continue, // stale (lazy deletion)
            };
            if closed.contains_key(&entry.idx) {
                continue;
            }
            closed.insert(entry.idx, node);

            if for_path {
                if let Some(si) = start_idx {
                    if si == entry.idx {
                        break;
                    }
                }
            }

            for &(dx, dy, dist) in MOTIONS.iter() {
                let nxi = node.xi + dx;
                let nyi = node.yi + dy;
                if !grid.in_bounds(nxi, nyi) {
                    continue;
                }
                let nidx = NodeDisc::calc_index(nxi, nyi, grid.dim);
                if closed.contains_key(&nidx) {
                    continue;
                }
                if grid.is_occupied(nxi, nyi) {
                    continue;
                }
                let cell_idx = grid.calc_index(nxi, nyi);
                let weight = grid.movement_cost_map[cell_idx] * self.astar_movement_cost;
                let prox = grid.h_prox_arr[cell_idx];
                let unknown_penalty = 0.0; // occupancy here is binary; no "unknown" tri-state grid in-scope.
                let new_cost_dist = node.cost_dist + dist;
                let new_cost =
                    node.cost + dist * weight + dist * self.astar_prox_cost * prox + unknown_penalty * self.unknown_cost_w;

                let better = open.get(&nidx).map(|existing| new_cost < existing.cost).unwrap_or(true);
                if better {
                    open.insert(
                        nidx,
                        NodeDisc { xi: nxi, yi: nyi, cost: new_cost, cost_dist: new_cost_dist, parent_index: Some(entry.idx) },
                    );
                    heap.push(QueueEntry { f: new_cost, order: order_counter, idx: nidx });
                    order_counter += 1;
                }
            }
        }

        closed
    }

    /// `get_only_near=true` mode: collect the N lowest-cost reachable cells
    /// within `radius` of `goal`, used by `get_valid_close_pose`.
    pub fn nearest_cells(&self, grid: &GridMaps, goal: (i32, i32), radius: i32, n: usize) -> Vec<(usize, NodeDisc)> {
        let closed = self.calc_distance_heuristic(grid, goal, None, false);
        let mut candidates: Vec<(usize, NodeDisc)> = closed
            .into_iter()
            .filter(|(_, node)| {
                let dx = node.xi - goal.0;
                let dy = node.yi - goal.1;
                ((dx * dx + dy * dy) as f64).sqrt() <= radius as f64
            })
            .collect();
        candidates.sort_by(|a, b| a.1.cost.partial_cmp(&b.1.cost).unwrap());
        candidates.truncate(n);
        candidates
    }

    /// Look up the pure-Euclidean distance cost of `pos` in a closed set,
    /// or `OUT_OF_HEURISTIC` if `pos` never closed.
    pub fn lookup_dist(closed: &ClosedSet, pos: (i32, i32), dim: usize) -> f64 {
        let idx = NodeDisc::calc_index(pos.0, pos.1, dim);
        closed.get(&idx).map(|n| n.cost_dist).unwrap_or(OUT_OF_HEURISTIC)
    }

    pub fn lookup_cost(closed: &ClosedSet, pos: (i32, i32), dim: usize) -> f64 {
        let idx = NodeDisc::calc_index(pos.0, pos.1, dim);
        closed.get(&idx).map(|n| n.cost).unwrap_or(OUT_OF_HEURISTIC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::grid::GridTransform;

    fn empty_grid(dim: usize) -> GridMaps {
        GridMaps::new(dim, GridTransform::new(0.25, Point::new(0.0, 0.0)), 0.1)
    }

    #[test]
    fn distance_to_self_is_zero() {
        let grid = empty_grid(20);
        let astar = Astar2D::new(1.0, 1.0, 1.0);
        let closed = astar.calc_distance_heuristic(&grid, (5, 5), Some((5, 5)), true);
        assert_eq!(Astar2D::lookup_dist(&closed, (5, 5), 20), 0.0);
    }

    #[test]
    fn diagonal_is_cheaper_than_two_axials() {
        let grid = empty_grid(20);
        let astar = Astar2D::new(1.0, 0.0, 0.0);
        let closed = astar.calc_distance_heuristic(&grid, (0, 0), Some((3, 3)), true);
        let dist = Astar2D::lookup_dist(&closed, (3, 3), 20);
        assert!((dist - 3.0 * std::f64::consts::SQRT_2).abs() < 1e-9);
    }

    #[test]
    fn unreachable_cell_is_out_of_heuristic() {
        let mut grid = empty_grid(10);
        // Wall off the goal completely.
        for yi in 0..10 {
            let idx = grid.calc_index(5, yi);
            grid.astar_grid[idx] = 1;
        }
        let astar = Astar2D::new(1.0, 0.0, 0.0);
        let closed = astar.calc_distance_heuristic(&grid, (0, 0), None, false);
        assert_eq!(Astar2D::lookup_dist(&closed, (9, 9), 10), OUT_OF_HEURISTIC);
    }

    /// Heuristic consistency on randomized obstacle-free grids: for a cell
    /// and a direct grid-neighbor, `|h(n) - h(n')|` is bounded by the
    /// motion cost between them (triangle inequality on an admissible
    /// distance heuristic).
    #[test]
    fn heuristic_is_consistent_on_random_empty_grids() {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            let dim = 30usize;
            let grid = empty_grid(dim);
            let astar = Astar2D::new(1.0, 0.0, 0.0);
            let goal = (rng.gen_range(0..dim as i32), rng.gen_range(0..dim as i32));
            let closed = astar.calc_distance_heuristic(&grid, goal, None, false);

            for &(dx, dy, edge_cost) in MOTIONS.iter() {
                let xi = rng.gen_range(1..dim as i32 - 1);
                let yi = rng.gen_range(1..dim as i32 - 1);
                let h_here = Astar2D::lookup_dist(&closed, (xi, yi), dim);
                let h_there = Astar2D::lookup_dist(&closed, (xi + dx, yi + dy), dim);
                if h_here.is_finite() && h_there.is_finite() {
                    assert!((h_here - h_there).abs() <= edge_cost + 1e-9);
                }
            }
        }
    }
}
