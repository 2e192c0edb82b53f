//! Voronoi potential field. Crops a patch of the obstacle grid around ego,
//! builds obstacle and Voronoi-edge point sets, and computes a proximity
//! potential plus its gradient per cell.
//!
//! The diagram is built via the standard Delaunay-dual construction
//! (`spade`): the Voronoi vertices are the circumcenters of the Delaunay
//! triangulation of the obstacle samples, and Voronoi edges connect the
//! circumcenters of triangles sharing an edge. This produces the same
//! diagram a direct sweep-line construction would (see `DESIGN.md`).

use kdtree::distance::squared_euclidean;
use kdtree::KdTree;
use spade::{DelaunayTriangulation, HasPosition, Point2, Triangulation};

use crate::geometry::Point;
use crate::grid::GridMaps;

#[derive(Clone, Copy)]
struct SamplePoint {
    x: f64,
    y: f64,
}

impl HasPosition for SamplePoint {
    type Scalar = f64;
    fn position(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }
}

pub struct VoronoiField {
    pub alpha: f64,
    pub d_o_max: f64,
    pub d_o_min: f64,
}

impl VoronoiField {
    pub fn new(alpha: f64, d_o_max: f64, d_o_min: f64) -> Self {
        Self { alpha, d_o_max, d_o_min }
    }

    /// Obstacle cell centers inside `[min, max]` (patch bounds).
    fn obstacle_samples(grid: &GridMaps, min: (i32, i32), max: (i32, i32)) -> Vec<Point> {
        let mut samples = Vec::new();
        for yi in min.1..=max.1 {
            for xi in min.0..=max.0 {
                if grid.in_bounds(xi, yi) && grid.is_occupied(xi, yi) {
                    samples.push(grid.transform.grid_to_world(xi, yi));
                }
            }
        }
        samples
    }

    /// Voronoi-vertex and Voronoi-edge samples derived from the Delaunay
    /// dual of the obstacle samples, clipped to the patch bounds.
    fn voronoi_edge_samples(obstacles: &[Point], min: (f64, f64), max: (f64, f64)) -> Vec<Point> {
        if obstacles.len() < 3 {
            return Vec::new();
        }
        let mut triangulation: DelaunayTriangulation<SamplePoint> = DelaunayTriangulation::new();
        for p in obstacles {
            let _ = triangulation.insert(SamplePoint { x: p.x, y: p.y });
        }

        let mut edge_samples = Vec::new();
        for face in triangulation.inner_faces() {
            let verts: Vec<_> = face.vertices().iter().map(|v| v.position()).collect();
            if verts.len() != 3 {
                continue;
            }
            if let Some((cx, cy)) = circumcenter((verts[0].x, verts[0].y), (verts[1].x, verts[1].y), (verts[2].x, verts[2].y)) {
                if cx >= min.0 && cx <= max.0 && cy >= min.1 && cy <= max.1 {
                    edge_samples.push(Point::new(cx, cy));
                }
            }
        }
        edge_samples
    }

    /// Compute `h_prox_arr`/`obs_x_grad`/`obs_y_grad` over the interior
    /// patch centered on `ego`, with `padding` cells of margin, and derive
    /// an adaptive motion resolution between `motion_res_min`/`max`.
    #[allow(clippy::too_many_arguments)]
    pub fn calc_voronoi_potential_field(
        &self,
        grid: &mut GridMaps,
        ego: (i32, i32),
        patch_radius: i32,
        padding: i32,
        motion_res_min: f64,
        motion_res_max: f64,
    ) {
        let min = (
            (ego.0 - patch_radius - padding).max(0),
            (ego.1 - patch_radius - padding).max(0),
        );
        let max = (
            (ego.0 + patch_radius + padding).min(grid.dim as i32 - 1),
            (ego.1 + patch_radius + padding).min(grid.dim as i32 - 1),
        );

        let obstacles = Self::obstacle_samples(grid, min, max);
        if obstacles.is_empty() {
            return;
        }
        let world_min = grid.transform.grid_to_world(min.0, min.1);
        let world_max = grid.transform.grid_to_world(max.0, max.1);
        let voronoi_edges = Self::voronoi_edge_samples(&obstacles, (world_min.x, world_min.y), (world_max.x, world_max.y));

        let mut obs_tree: KdTree<f64, usize, [f64; 2]> = KdTree::new(2);
        for (i, p) in obstacles.iter().enumerate() {
            let _ = obs_tree.add([p.x, p.y], i);
        }
        let mut vor_tree: KdTree<f64, usize, [f64; 2]> = KdTree::new(2);
        for (i, p) in voronoi_edges.iter().enumerate() {
            let _ = vor_tree.add([p.x, p.y], i);
        }

        let inner_min = (min.0 + padding, min.1 + padding);
        let inner_max = (max.0 - padding, max.1 - padding);

        for yi in inner_min.1..=inner_max.1 {
            for xi in inner_min.0..=inner_max.0 {
                if !grid.in_bounds(xi, yi) {
                    continue;
                }
                let world = grid.transform.grid_to_world(xi, yi);
                let d_o = obs_tree
                    .nearest(&[world.x, world.y], 1, &squared_euclidean)
                    .ok()
                    .and_then(|r| r.first().map(|(d, _)| d.sqrt()))
                    .unwrap_or(f64::INFINITY);

                let idx = grid.calc_index(xi, yi);
                if d_o > self.d_o_max || !d_o.is_finite() {
                    grid.h_prox_arr[idx] = 0.0;
                    grid.motion_res_map[idx] = motion_res_max;
                    continue;
                }

                let d_v = vor_tree
                    .nearest(&[world.x, world.y], 1, &squared_euclidean)
                    .ok()
                    .and_then(|r| r.first().map(|(d, _)| d.sqrt()))
                    .unwrap_or(d_o);

                let rho = self.potential(d_o, d_v);
                grid.h_prox_arr[idx] = rho;

                // Motion resolution interpolates between min (near
                // obstacles) and max (far from obstacles).
                let t = ((d_o - self.d_o_min) / (self.d_o_max - self.d_o_min)).clamp(0.0, 1.0);
                grid.motion_res_map[idx] = motion_res_min + t * (motion_res_max - motion_res_min);
            }
        }

        // Central-difference gradient, stored per cell for the smoother.
        for yi in (inner_min.1 + 1)..inner_max.1 {
            for xi in (inner_min.0 + 1)..inner_max.0 {
                let idx = grid.calc_index(xi, yi);
                let gx = (grid.h_prox_arr[grid.calc_index(xi + 1, yi)] - grid.h_prox_arr[grid.calc_index(xi - 1, yi)])
                    / (2.0 * grid.transform.res);
                let gy = (grid.h_prox_arr[grid.calc_index(xi, yi + 1)] - grid.h_prox_arr[grid.calc_index(xi, yi - 1)])
                    / (2.0 * grid.transform.res);
                grid.obs_x_grad[idx] = gx;
                grid.obs_y_grad[idx] = gy;
            }
        }
    }

    /// `ρ(c) = α/(α+d_O) · d_V/(d_O+d_V) · max(0, (d_O_max-d_O)/d_O_max)²`
    /// for `d_O <= d_O_max`, else `0`.
    fn potential(&self, d_o: f64, d_v: f64) -> f64 {
        if d_o > self.d_o_max {
            return 0.0;
        }
        let term1 = self.alpha / (self.alpha + d_o);
        let term2 = if d_o + d_v > 1e-9 { d_v / (d_o + d_v) } else { 0.0 };
        let falloff = ((self.d_o_max - d_o) / self.d_o_max).max(0.0).powi(2);
        term1 * term2 * falloff
    }
}

/// Circumcenter of a triangle given its three vertices.
fn circumcenter(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> Option<(f64, f64)> {
    let d = 2.0 * (a.0 * (b.1 - c.1) + b.0 * (c.1 - a.1) + c.0 * (a.1 - b.1));
    if d.abs() < 1e-12 {
        return None;
    }
    let a_sq = a.0 * a.0 + a.1 * a.1;
    let b_sq = b.0 * b.0 + b.1 * b.1;
    let c_sq = c.0 * c.0 + c.1 * c.1;
    let ux = (a_sq * (b.1 - c.1) + b_sq * (c.1 - a.1) + c_sq * (a.1 - b.1)) / d;
    let uy = (a_sq * (c.0 - b.0) + b_sq * (a.0 - c.0) + c_sq * (b.0 - a.0)) / d;
    Some((ux, uy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridTransform;

    #[test]
    fn potential_is_zero_beyond_d_o_max() {
        let field = VoronoiField::new(1.0, 5.0, 0.5);
        assert_eq!(field.potential(6.0, 2.0), 0.0);
    }

    #[test]
    fn potential_rises_closer_to_obstacle() {
        let field = VoronoiField::new(1.0, 5.0, 0.5);
        let near = field.potential(0.5, 2.0);
        let far = field.potential(4.0, 2.0);
        assert!(near > far);
    }

    #[test]
    fn empty_obstacle_patch_leaves_potential_zero() {
        let mut grid = GridMaps::new(20, GridTransform::new(0.25, Point::new(0.0, 0.0)), 0.1);
        let field = VoronoiField::new(1.0, 5.0, 0.5);
        field.calc_voronoi_potential_field(&mut grid, (10, 10), 5, 2, 0.05, 0.2);
        assert!(grid.h_prox_arr.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn circumcenter_of_right_triangle() {
        let c = circumcenter((0.0, 0.0), (2.0, 0.0), (0.0, 2.0)).unwrap();
        assert!((c.0 - 1.0).abs() < 1e-9);
        assert!((c.1 - 1.0).abs() < 1e-9);
    }
}
