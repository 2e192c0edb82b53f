//! Node and path-segment bookkeeping. `NodeDisc` belongs to the 2D A*
//! heuristic; `NodeHybrid` belongs to the Hybrid A* core. Both live in a
//! closed/open map keyed by a packed composite index rather than holding
//! pointers to each other.

/// Tagged variant for the kind of primitive a path sample came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentType {
    HaStar,
    ReedsShepp,
    RearAxis,
    Unknown,
}

/// A node in the 2D grid A* search.
#[derive(Debug, Clone, Copy)]
pub struct NodeDisc {
    pub xi: i32,
    pub yi: i32,
    /// Accumulated cost including Voronoi proximity and unknown-cell bias.
    pub cost: f64,
    /// Pure Euclidean-distance cost, used for NHWO comparisons.
    pub cost_dist: f64,
    /// Composite index of the parent cell, or `None` for the root.
    pub parent_index: Option<usize>,
}

impl NodeDisc {
    pub fn calc_index(xi: i32, yi: i32, dim: usize) -> usize {
        yi as usize * dim + xi as usize
    }
}

/// One byproduct of forward-simulating a motion primitive: the continuous
/// samples it traces plus per-step bookkeeping. Produced by the `motion`
/// module (and by the Reeds–Shepp / pivot analytic expansions), consumed by
/// the Hybrid A* core to build a `NodeHybrid`.
#[derive(Debug, Clone)]
pub struct MotionPrimitive {
    pub x_list: Vec<f64>,
    pub y_list: Vec<f64>,
    pub yaw_list: Vec<f64>,
    pub dir_list: Vec<i32>,
    pub type_list: Vec<SegmentType>,
    pub arc_length: f64,
    pub steer: f64,
}

impl MotionPrimitive {
    pub fn last_pose(&self) -> (f64, f64, f64) {
        (
            *self.x_list.last().expect("motion primitive has at least one sample"),
            *self.y_list.last().expect("motion primitive has at least one sample"),
            *self.yaw_list.last().expect("motion primitive has at least one sample"),
        )
    }
}

/// A node in the Hybrid A* search over `(xi, yi, yaw_i)`.
#[derive(Debug, Clone)]
pub struct NodeHybrid {
    pub xi: i32,
    pub yi: i32,
    pub yaw_i: i32,
    pub dir: i32,
    pub x_list: Vec<f64>,
    pub y_list: Vec<f64>,
    pub yaw_list: Vec<f64>,
    pub dir_list: Vec<i32>,
    pub type_list: Vec<SegmentType>,
    pub steer: f64,
    /// Composite index of the parent node; `None` for the root.
    pub parent_index: Option<u64>,
    pub cost: f64,
    pub arc_length: f64,
    pub is_analytic: bool,
}

impl NodeHybrid {
    /// Packed composite index `yaw_idx * dim^2 + yi * dim + xi`.
    pub fn calc_index(xi: i32, yi: i32, yaw_i: i32, dim: usize) -> u64 {
        let dim = dim as u64;
        yaw_i as u64 * dim * dim + yi as u64 * dim + xi as u64
    }

    pub fn index(&self, dim: usize) -> u64 {
        Self::calc_index(self.xi, self.yi, self.yaw_i, dim)
    }

    pub fn last_pose(&self) -> (f64, f64, f64) {
        (
            *self.x_list.last().expect("node has at least one sample"),
            *self.y_list.last().expect("node has at least one sample"),
            *self.yaw_list.last().expect("node has at least one sample"),
        )
    }

    pub fn from_root(xi: i32, yi: i32, yaw_i: i32, pose: (f64, f64, f64), dir: i32) -> Self {
        Self {
            xi,
            yi,
            yaw_i,
            dir,
            x_list: vec![pose.0],
            y_list: vec![pose.1],
            yaw_list: vec![pose.2],
            dir_list: vec![dir],
            type_list: vec![SegmentType::Unknown],
            steer: 0.0,
            parent_index: None,
            cost: 0.0,
            arc_length: 0.0,
            is_analytic: false,
        }
    }

    /// Build a child node from a parent plus a forward-simulated primitive.
    /// Upholds the invariant that sample lists are non-empty, `cost >=
    /// parent.cost`, and `parent_index != self`.
    pub fn from_primitive(
        parent: &NodeHybrid,
        parent_index: u64,
        primitive: &MotionPrimitive,
        xi: i32,
        yi: i32,
        yaw_i: i32,
        dir: i32,
        edge_cost: f64,
    ) -> Self {
        debug_assert!(!primitive.x_list.is_empty());
        Self {
            xi,
            yi,
            yaw_i,
            dir,
            x_list: primitive.x_list.clone(),
            y_list: primitive.y_list.clone(),
            yaw_list: primitive.yaw_list.clone(),
            dir_list: primitive.dir_list.clone(),
            type_list: primitive.type_list.clone(),
            steer: primitive.steer,
            parent_index: Some(parent_index),
            cost: parent.cost + edge_cost,
            arc_length: parent.arc_length + primitive.arc_length,
            is_analytic: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_index_round_trips_cell() {
        let dim = 40usize;
        let idx_a = NodeHybrid::calc_index(3, 4, 5, dim);
        let idx_b = NodeHybrid::calc_index(3, 4, 6, dim);
        assert_ne!(idx_a, idx_b);
    }

    #[test]
    fn child_cost_is_monotonic() {
        let root = NodeHybrid::from_root(0, 0, 0, (0.0, 0.0, 0.0), 1);
        let primitive = MotionPrimitive {
            x_list: vec![0.1, 0.2],
            y_list: vec![0.0, 0.0],
            yaw_list: vec![0.0, 0.0],
            dir_list: vec![1, 1],
            type_list: vec![SegmentType::HaStar, SegmentType::HaStar],
            arc_length: 0.2,
            steer: 0.0,
        };
        let child = NodeHybrid::from_primitive(&root, 0, &primitive, 1, 0, 0, 1, 0.5);
        assert!(child.cost >= root.cost);
        assert_ne!(child.parent_index, Some(child.index(40)));
    }
}
