//! Final path reconstruction, segmentation, and re-interpolation. Walks
//! parent pointers from the final search node back to the root, splits at
//! type changes and cusps, re-fits each non-pivot segment with a quadratic
//! B-spline, and resamples to exact `interp_res` spacing.

use std::collections::HashMap;

use crate::bspline::QuadraticBSpline;
use crate::geometry::constrain_angle_min_pi_plus_pi;
use crate::node::{NodeHybrid, SegmentType};

/// Parallel-array path representation.
#[derive(Debug, Clone, Default)]
pub struct Path {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub yaw: Vec<f64>,
    pub direction: Vec<i32>,
    pub segment_type: Vec<SegmentType>,
    pub cost: f64,
    /// Index where the analytic tail begins, `None` if the whole path came
    /// from the grid search.
    pub idx_analytic: Option<usize>,
}

impl Path {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Walk parent pointers from `final_idx` to the root, concatenating
/// reversed per-node sample lists, then reverse once. The first direction
/// sample is patched to match the second (the root carries a synthetic
/// direction).
pub fn reconstruct_path(nodes: &HashMap<u64, NodeHybrid>, final_idx: u64, dim: usize) -> Path {
    let mut x = Vec::new();
    let mut y = Vec::new();
    let mut yaw = Vec::new();
    let mut direction = Vec::new();
    let mut segment_type = Vec::new();

    let mut cursor = Some(final_idx);
    let mut cost = 0.0;
    let mut first = true;
    while let Some(idx) = cursor {
        let node = match nodes.get(&idx) {
            Some(n) => n,
            None => break,
        };
        if first {
            cost = node.cost;
            first = false;
        }
        for i in (0..node.x_list.len()).rev() {
            x.push(node.x_list[i]);
            y.push(node.y_list[i]);
            yaw.push(node.yaw_list[i]);
            direction.push(node.dir_list[i]);
            segment_type.push(node.type_list[i]);
        }
        cursor = node.parent_index;
        let _ = dim;
    }

    x.reverse();
    y.reverse();
    yaw.reverse();
    direction.reverse();
    segment_type.reverse();

    if direction.len() >= 2 {
        direction[0] = direction[1];
    }

    Path { x, y, yaw, direction, segment_type, cost, idx_analytic: None }
}

/// Split on segment-type changes AND direction reversals (cusps).
pub fn segment_path(path: &Path) -> Vec<Path> {
    if path.is_empty() {
        return Vec::new();
    }
    let mut segments = Vec::new();
    let mut start = 0usize;
    for i in 1..path.len() {
        let type_changed = path.segment_type[i] != path.segment_type[i - 1];
        let cusp = path.direction[i] != path.direction[i - 1];
        if type_changed || cusp {
            segments.push(slice_path(path, start, i));
            start = i;
        }
    }
    segments.push(slice_path(path, start, path.len()));
    segments
}

fn slice_path(path: &Path, start: usize, end: usize) -> Path {
    Path {
        x: path.x[start..end].to_vec(),
        y: path.y[start..end].to_vec(),
        yaw: path.yaw[start..end].to_vec(),
        direction: path.direction[start..end].to_vec(),
        segment_type: path.segment_type[start..end].to_vec(),
        cost: path.cost,
        idx_analytic: None,
    }
}

/// Re-parametrize a non-pivot segment by cumulative arc length, drop points
/// within 1 cm of each other, fit quadratic B-splines for `x(s)`/`y(s)`, and
/// resample to exact `interp_res` spacing via the "exact distance" walker.
/// Pivot segments (`SegmentType::RearAxis`) pass through untouched.
pub fn interpolate_segment(segment: &Path, interp_res: f64) -> Path {
    if segment.segment_type.first() == Some(&SegmentType::RearAxis) {
        return segment.clone();
    }
    if segment.len() < 2 {
        return segment.clone();
    }

    let (xs, ys, arc) = dedup_and_parametrize(&segment.x, &segment.y, 0.01);
    if xs.len() < 2 {
        return segment.clone();
    }

    let spline_x = QuadraticBSpline::fit(&arc, &xs);
    let spline_y = QuadraticBSpline::fit(&arc, &ys);

    let dir = segment.direction[0];
    let (out_x, out_y) = exact_distance_interpolation(&spline_x, &spline_y, *arc.last().unwrap(), interp_res);

    let mut out_yaw = finite_difference_yaw(&out_x, &out_y, dir);
    flatten_yaw_jumps(&mut out_yaw, 10.0_f64.to_radians());

    let n = out_x.len();
    Path {
        x: out_x,
        y: out_y,
        yaw: out_yaw,
        direction: vec![dir; n],
        segment_type: vec![*segment.segment_type.first().unwrap_or(&SegmentType::Unknown); n],
        cost: segment.cost,
        idx_analytic: None,
    }
}

fn dedup_and_parametrize(x: &[f64], y: &[f64], min_spacing: f64) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut xs = vec![x[0]];
    let mut ys = vec![y[0]];
    for i in 1..x.len() {
        let last_x = *xs.last().unwrap();
        let last_y = *ys.last().unwrap();
        let d = ((x[i] - last_x).powi(2) + (y[i] - last_y).powi(2)).sqrt();
        if d >= min_spacing {
            xs.push(x[i]);
            ys.push(y[i]);
        }
    }
    let mut arc = vec![0.0];
    for i in 1..xs.len() {
        let d = ((xs[i] - xs[i - 1]).powi(2) + (ys[i] - ys[i - 1]).powi(2)).sqrt();
        arc.push(arc[i - 1] + d);
    }
    (xs, ys, arc)
}

/// Step `s` by `interp_res/10`, accumulate chord length, emit a linearly
/// interpolated sample whenever the accumulator crosses `interp_res`.
fn exact_distance_interpolation(
    spline_x: &QuadraticBSpline,
    spline_y: &QuadraticBSpline,
    s_max: f64,
    interp_res: f64,
) -> (Vec<f64>, Vec<f64>) {
    let step = interp_res / 10.0;
    let mut out_x = vec![spline_x.eval(0.0)];
    let mut out_y = vec![spline_y.eval(0.0)];

    let mut s = 0.0;
    let mut acc = 0.0;
    let mut last_x = out_x[0];
    let mut last_y = out_y[0];

    while s < s_max {
        let next_s = (s + step).min(s_max);
        let nx = spline_x.eval(next_s);
        let ny = spline_y.eval(next_s);
        let chord = ((nx - last_x).powi(2) + (ny - last_y).powi(2)).sqrt();
        acc += chord;

        if acc >= interp_res {
            let overshoot = acc - interp_res;
            let frac = if chord > 1e-12 { (chord - overshoot) / chord } else { 1.0 };
            let sample_x = last_x + frac * (nx - last_x);
            let sample_y = last_y + frac * (ny - last_y);
            out_x.push(sample_x);
            out_y.push(sample_y);
            last_x = sample_x;
            last_y = sample_y;
            acc = 0.0;
        } else {
            last_x = nx;
            last_y = ny;
        }
        s = next_s;
    }

    if out_x.len() < 2 || (out_x.last().unwrap() - spline_x.eval(s_max)).abs() > 1e-9 {
        out_x.push(spline_x.eval(s_max));
        out_y.push(spline_y.eval(s_max));
    }

    (out_x, out_y)
}

/// Yaw at each sample from finite differences, flipped by π when `dir=-1`.
fn finite_difference_yaw(x: &[f64], y: &[f64], dir: i32) -> Vec<f64> {
    let n = x.len();
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![0.0];
    }
    let mut yaw = Vec::with_capacity(n);
    for i in 0..n {
        let (dx, dy) = if i == 0 {
            (x[1] - x[0], y[1] - y[0])
        } else if i == n - 1 {
            (x[i] - x[i - 1], y[i] - y[i - 1])
        } else {
            (x[i + 1] - x[i - 1], y[i + 1] - y[i - 1])
        };
        let mut a = dy.atan2(dx);
        if dir < 0 {
            a = constrain_angle_min_pi_plus_pi(a + std::f64::consts::PI);
        }
        yaw.push(a);
    }
    yaw
}

/// Flatten any consecutive yaw jump greater than `threshold` to the prior
/// yaw (guards against spline branch flips).
fn flatten_yaw_jumps(yaw: &mut [f64], threshold: f64) {
    for i in 1..yaw.len() {
        let diff = crate::geometry::angle_diff(yaw[i], yaw[i - 1]);
        if diff > threshold {
            yaw[i] = yaw[i - 1];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_path(n: usize, dir: i32, seg_type: SegmentType) -> Path {
        let x: Vec<f64> = (0..n).map(|i| i as f64 * 0.1).collect();
        let y = vec![0.0; n];
        let yaw = vec![0.0; n];
        Path {
            x,
            y,
            yaw,
            direction: vec![dir; n],
            segment_type: vec![seg_type; n],
            cost: 1.0,
            idx_analytic: None,
        }
    }

    #[test]
    fn segments_split_on_cusp() {
        let mut path = straight_path(5, 1, SegmentType::HaStar);
        path.direction[3] = -1;
        path.direction[4] = -1;
        let segs = segment_path(&path);
        assert_eq!(segs.len(), 2);
    }

    #[test]
    fn interpolation_produces_even_spacing() {
        let path = straight_path(10, 1, SegmentType::HaStar);
        let resampled = interpolate_segment(&path, 0.2);
        for w in resampled.x.windows(2).zip(resampled.y.windows(2)) {
            let (wx, wy) = w;
            let d = ((wx[1] - wx[0]).powi(2) + (wy[1] - wy[0]).powi(2)).sqrt();
            assert!((d - 0.2).abs() < 0.05, "spacing {d}");
        }
    }

    #[test]
    fn pivot_segment_is_untouched() {
        let path = straight_path(5, 1, SegmentType::RearAxis);
        let out = interpolate_segment(&path, 0.2);
        assert_eq!(out.len(), path.len());
    }

    #[test]
    fn flatten_removes_large_jumps() {
        let mut yaw = vec![0.0, 0.05, 2.0, 0.1];
        flatten_yaw_jumps(&mut yaw, 10.0_f64.to_radians());
        assert!((yaw[2] - yaw[1]).abs() < 1e-9);
    }
}
