//! Gradient-descent path smoothing. Iteratively shifts interior path points
//! along a weighted sum of obstacle-gradient, smoothness, curvature, and
//! Voronoi-gradient terms, holding endpoints fixed, until a step/iteration
//! bound is met.

use crate::grid::GridMaps;
use crate::path::Path;

#[derive(Debug, Clone, Copy)]
pub struct SmootherWeights {
    pub obstacle: f64,
    pub smoothness: f64,
    pub curvature: f64,
    pub voronoi: f64,
}

impl Default for SmootherWeights {
    fn default() -> Self {
        Self { obstacle: 0.2, smoothness: 0.2, curvature: 0.1, voronoi: 0.1 }
    }
}

pub struct Smoother {
    pub weights: SmootherWeights,
    pub max_iterations: usize,
    pub step_size: f64,
    pub min_step: f64,
}

impl Default for Smoother {
    fn default() -> Self {
        Self { weights: SmootherWeights::default(), max_iterations: 100, step_size: 0.1, min_step: 1e-4 }
    }
}

impl Smoother {
    pub fn smooth_path(&self, path: &Path, grid: &GridMaps) -> Path {
        if path.len() < 3 {
            return path.clone();
        }
        let mut x = path.x.clone();
        let mut y = path.y.clone();
        let n = x.len();

        let mut step = self.step_size;
        for _ in 0..self.max_iterations {
            let mut max_shift: f64 = 0.0;
            for i in 1..n - 1 {
                let (gx_obs, gy_obs) = self.obstacle_gradient(x[i], y[i], grid);
                let (gx_smooth, gy_smooth) = self.smoothness_gradient(&x, &y, i);
                let (gx_curv, gy_curv) = self.curvature_gradient(&x, &y, i);
                let (gx_vor, gy_vor) = self.voronoi_gradient(x[i], y[i], grid);

                let dx = self.weights.obstacle * gx_obs
                    + self.weights.smoothness * gx_smooth
                    + self.weights.curvature * gx_curv
                    + self.weights.voronoi * gx_vor;
                let dy = self.weights.obstacle * gy_obs
                    + self.weights.smoothness * gy_smooth
                    + self.weights.curvature * gy_curv
                    + self.weights.voronoi * gy_vor;

                x[i] -= step * dx;
                y[i] -= step * dy;
                max_shift = max_shift.max((step * dx).abs().max((step * dy).abs()));
            }
            if max_shift < self.min_step {
                break;
            }
            step *= 0.99;
        }

        let mut out = path.clone();
        out.x = x;
        out.y = y;
        out
    }

    fn obstacle_gradient(&self, x: f64, y: f64, grid: &GridMaps) -> (f64, f64) {
        let (xi, yi) = grid.transform.world_to_grid(crate::geometry::Point::new(x, y));
        if !grid.in_bounds(xi, yi) {
            return (0.0, 0.0);
        }
        let idx = grid.calc_index(xi, yi);
        (grid.obs_x_grad[idx], grid.obs_y_grad[idx])
    }

    fn voronoi_gradient(&self, x: f64, y: f64, grid: &GridMaps) -> (f64, f64) {
        let (xi, yi) = grid.transform.world_to_grid(crate::geometry::Point::new(x, y));
        if !grid.in_bounds(xi, yi) {
            return (0.0, 0.0);
        }
        let idx = grid.calc_index(xi, yi);
        // The potential's own gradient doubles as the Voronoi-push term;
        // both are derived from h_prox_arr.
        (grid.obs_x_grad[idx] * -1.0, grid.obs_y_grad[idx] * -1.0)
    }

    fn smoothness_gradient(&self, x: &[f64], y: &[f64], i: usize) -> (f64, f64) {
        let gx = 2.0 * x[i] - x[i - 1] - x[i + 1];
        let gy = 2.0 * y[i] - y[i - 1] - y[i + 1];
        (gx, gy)
    }

    fn curvature_gradient(&self, x: &[f64], y: &[f64], i: usize) -> (f64, f64) {
        if i < 2 || i + 2 >= x.len() {
            return (0.0, 0.0);
        }
        // Discrete second-derivative (curvature proxy) gradient via finite
        // differences of neighbor deviation, extended one ring further than
        // `smoothness_gradient`.
        let gx = x[i - 2] - 4.0 * x[i - 1] + 6.0 * x[i] - 4.0 * x[i + 1] + x[i + 2];
        let gy = y[i - 2] - 4.0 * y[i - 1] + 6.0 * y[i] - 4.0 * y[i + 1] + y[i + 2];
        (gx, gy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::grid::GridTransform;
    use crate::node::SegmentType;

    fn zigzag_path() -> Path {
        let x: Vec<f64> = (0..9).map(|i| i as f64).collect();
        let y: Vec<f64> = (0..9).map(|i| if i % 2 == 0 { 0.0 } else { 1.0 }).collect();
        let n = x.len();
        Path {
            x,
            y,
            yaw: vec![0.0; n],
            direction: vec![1; n],
            segment_type: vec![SegmentType::HaStar; n],
            cost: 0.0,
            idx_analytic: None,
        }
    }

    #[test]
    fn smoothing_holds_endpoints_fixed() {
        let path = zigzag_path();
        let grid = GridMaps::new(20, GridTransform::new(1.0, Point::new(0.0, 0.0)), 0.1);
        let smoother = Smoother::default();
        let out = smoother.smooth_path(&path, &grid);
        assert_eq!(out.x[0], path.x[0]);
        assert_eq!(*out.x.last().unwrap(), *path.x.last().unwrap());
    }

    #[test]
    fn smoothing_reduces_zigzag_deviation() {
        let path = zigzag_path();
        let grid = GridMaps::new(20, GridTransform::new(1.0, Point::new(0.0, 0.0)), 0.1);
        let smoother = Smoother::default();
        let out = smoother.smooth_path(&path, &grid);
        let before: f64 = path.y.iter().map(|v| v.abs()).sum();
        let after: f64 = out.y.iter().map(|v| v.abs()).sum();
        assert!(after < before);
    }
}
