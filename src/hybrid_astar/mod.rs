//! Hybrid A* core: best-first search over `(x, y, yaw)` generated by
//! discretized vehicle motions, with branch-and-bound over steer×direction,
//! analytic-expansion shortcutting, and a heuristic blend of the 2D grid
//! distance and the NHWO cache. This is the orchestration layer: the one
//! place in the crate that logs and the one place that owns every other
//! component.

#[cfg(test)]
mod tests;

use std::collections::{BinaryHeap, HashMap};
use std::path::{Path as FsPath, PathBuf};
use std::time::Instant;

use rand::Rng;
use rayon::prelude::*;

use crate::algorithms::astar2d::{Astar2D, ClosedSet, OUT_OF_HEURISTIC};
use crate::algorithms::motion::{move_car_some_steps, turn_on_rear_axis};
use crate::algorithms::nhwo::NhwoCache;
use crate::algorithms::reeds_shepp::{reeds_shepp_path, ReedsSheppPath};
use crate::algorithms::voronoi::VoronoiField;
use crate::collision::CollisionChecker;
use crate::config::{PlannerConfig, WaypointType};
use crate::error::PlannerError;
use crate::geometry::{angle_diff, bilinear_interpolation, Point, Pose};
use crate::grid::{GridMaps, GridTransform};
use crate::node::{MotionPrimitive, NodeHybrid, SegmentType};
use crate::path::{interpolate_segment, reconstruct_path, segment_path, Path as PlannerPath};
use crate::smoother::Smoother;
use crate::vehicle::Vehicle;

const NB_GRID_MOTIONS_ASTAR_RES_FACTOR: f64 = 1.5;

pub struct Planner {
    pub config: PlannerConfig,
    pub vehicle: Vehicle,
    pub grid: GridMaps,
    astar: Astar2D,
    voronoi: VoronoiField,
    nhwo: NhwoCache,
    nhwo_path: PathBuf,
    closed_set_guidance: Option<ClosedSet>,
    smoother: Smoother,
}

impl Planner {
    /// Allocate and bind grids for a patch of `patch_dim` cells centered on
    /// `origin_utm`; load or regenerate the NHWO cache.
    pub fn initialize(config: PlannerConfig, vehicle: Vehicle, patch_dim: usize, origin_utm: Point, share_dir: &FsPath) -> Self {
        log::info!("initializing planner: patch_dim={patch_dim}, origin=({}, {})", origin_utm.x, origin_utm.y);
        let transform = GridTransform::new(config.planner_res, origin_utm);
        let grid = GridMaps::new(patch_dim, transform, config.motion_res_min);

        let astar = Astar2D::new(config.astar_movement_cost, config.astar_prox_cost, config.unknown_cost_w);
        let voronoi = VoronoiField::new(config.voronoi_alpha, config.d_o_max, config.d_o_min);

        let nhwo_path = share_dir.join("nonh_noobs.data");
        let yaw_dim = (360.0 / config.yaw_res_deg).round() as usize;
        let nhwo = NhwoCache::load(&nhwo_path, yaw_dim, config.non_h_no_obs_patch_dim).unwrap_or_else(|| {
            log::info!("{}", PlannerError::FileMissing { path: nhwo_path.clone() });
            let cache = NhwoCache::build(
                yaw_dim,
                config.non_h_no_obs_patch_dim,
                config.planner_res,
                vehicle.rho(),
                config.motion_res_min,
            );
            let _ = cache.save(&nhwo_path);
            cache
        });

        Self {
            config,
            vehicle,
            grid,
            astar,
            voronoi,
            nhwo,
            nhwo_path,
            closed_set_guidance: None,
            smoother: Smoother::default(),
        }
    }

    /// Recenter the patch on a new origin, carrying over overlapping grid
    /// data.
    pub fn reinit(&mut self, origin_utm: Point, patch_dim: usize) {
        log::info!("reinit planner at origin=({}, {})", origin_utm.x, origin_utm.y);
        if patch_dim != self.grid.dim {
            self.grid = GridMaps::new(patch_dim, GridTransform::new(self.config.planner_res, origin_utm), self.config.motion_res_min);
        } else {
            self.grid.reinit(origin_utm, self.config.motion_res_min);
        }
        self.closed_set_guidance = None;
    }

    fn direction_set(&self) -> Vec<i32> {
        if self.config.only_forward {
            vec![1]
        } else {
            vec![1, -1]
        }
    }

    fn steer_samples(&self) -> Vec<f64> {
        let n = self.config.edge_costs.nb_steer.max(1);
        if n == 1 {
            return vec![0.0];
        }
        (0..n)
            .map(|i| -self.vehicle.max_steer + 2.0 * self.vehicle.max_steer * i as f64 / (n - 1) as f64)
            .collect()
    }

    /// Top-level entry point: rebuild the environment (A* grid is assumed
    /// already populated by the caller via `set_movement_map`/raw occupancy
    /// writes — that part is the external collision-checker collaborator's
    /// job), then run the core search.
    pub fn hybrid_a_star_planning(
        &mut self,
        checker: &dyn CollisionChecker,
        _ego: Pose,
        start: Pose,
        goal: Pose,
        to_final_pose: bool,
        do_analytic: bool,
    ) -> Option<PlannerPath> {
        let goal_cell = self.grid.transform.world_to_grid(goal.point());
        let start_cell = self.grid.transform.world_to_grid(start.point());
        if !self.grid.in_bounds(goal_cell.0, goal_cell.1) || !self.grid.in_bounds(start_cell.0, start_cell.1) {
            return None;
        }

        let patch_radius = self.grid.dim as i32 / 2;
        self.voronoi.calc_voronoi_potential_field(
            &mut self.grid,
            start_cell,
            patch_radius,
            2,
            self.config.motion_res_min,
            self.config.motion_res_max,
        );

        let closed_path_heuristic = self.astar.calc_distance_heuristic(&self.grid, goal_cell, Some(start_cell), true);

        if self.config.waypoint_type == WaypointType::HeurRed && self.closed_set_guidance.is_none() {
            self.closed_set_guidance = Some(self.astar.calc_distance_heuristic(&self.grid, goal_cell, None, false));
        }

        let raw = self.h_astar_core(checker, start, goal, &closed_path_heuristic, do_analytic, to_final_pose)?;
        Some(self.post_process(raw))
    }

    /// Search a discretized neighborhood around the nearest reachable cell
    /// for a collision-free pose of minimum cost `d^2 + 0.1*|dyaw| + 5*prox`.
    pub fn get_valid_close_pose(&self, checker: &dyn CollisionChecker, _ego_pose: Pose, goal_pose: Pose) -> Option<Pose> {
        let goal_cell = self.grid.transform.world_to_grid(goal_pose.point());
        if !self.grid.in_bounds(goal_cell.0, goal_cell.1) {
            return None;
        }
        let candidates = self.astar.nearest_cells(&self.grid, goal_cell, 5, 25);

        let mut best: Option<(f64, Pose)> = None;
        for (_, node) in candidates {
            let world = self.grid.transform.grid_to_world(node.xi, node.yi);
            for yaw_steps in 0..8 {
                let yaw = yaw_steps as f64 * std::f64::consts::FRAC_PI_4;
                let pose = Pose::new(world.x, world.y, yaw);
                if !checker.check_pose(pose.x, pose.y, pose.yaw) {
                    continue;
                }
                let d2 = (world.x - goal_pose.x).powi(2) + (world.y - goal_pose.y).powi(2);
                let dyaw = angle_diff(yaw, goal_pose.yaw);
                let idx = self.grid.calc_index(node.xi, node.yi);
                let prox = self.grid.h_prox_arr[idx];
                let cost = d2 + 0.1 * dyaw + 5.0 * prox;
                if best.map(|(c, _)| cost < c).unwrap_or(true) {
                    best = Some((cost, pose));
                }
            }
        }
        best.map(|(_, p)| p)
    }

    fn heuristic(&self, node_pose: (f64, f64, f64), node_cell: (i32, i32), goal: Pose, closed: &ClosedSet) -> f64 {
        let h2d = Astar2D::lookup_dist(closed, node_cell, self.grid.dim);
        if h2d == OUT_OF_HEURISTIC {
            return OUT_OF_HEURISTIC;
        }
        let h_nhwo = self.nhwo.query(node_pose, (goal.x, goal.y, goal.yaw), self.config.planner_res);
        self.config.edge_costs.h_dist_cost * h2d.max(h_nhwo)
    }

    fn max_corner_prox(&self, pose: (f64, f64, f64)) -> f64 {
        let corners = self.vehicle.corner_world_positions(&Pose::new(pose.0, pose.1, pose.2));
        corners
            .iter()
            .map(|&(cx, cy)| self.sample_prox_bilinear(cx, cy))
            .fold(0.0_f64, f64::max)
    }

    fn sample_prox_bilinear(&self, x: f64, y: f64) -> f64 {
        let (xi, yi) = self.grid.transform.world_to_grid(Point::new(x, y));
        if !self.grid.in_bounds(xi, yi) || !self.grid.in_bounds(xi + 1, yi + 1) {
            return 0.0;
        }
        let q11 = self.grid.h_prox_arr[self.grid.calc_index(xi, yi)];
        let q21 = self.grid.h_prox_arr[self.grid.calc_index(xi + 1, yi)];
        let q12 = self.grid.h_prox_arr[self.grid.calc_index(xi, yi + 1)];
        let q22 = self.grid.h_prox_arr[self.grid.calc_index(xi + 1, yi + 1)];
        let world0 = self.grid.transform.grid_to_world(xi, yi);
        let value = bilinear_interpolation(q11, q12, q21, q22, 0, 1, 0, 1, (x - world0.x) / self.grid.transform.res, (y - world0.y) / self.grid.transform.res);
        if value.is_nan() {
            0.0
        } else {
            value
        }
    }

    /// Edge cost for a primitive.
    fn edge_cost(&self, node: &NodeHybrid, dir: i32, steer: f64, arc_l: f64, weight: f64, final_pose: (f64, f64, f64)) -> f64 {
        let c = &self.config.edge_costs;
        let switch_cost = if dir != node.dir { c.switch_cost } else { 0.0 };
        let steer_cost = c.steer_cost * steer.abs();
        let steer_change_cost = c.steer_change_cost * (steer - node.steer).abs();
        let back_factor = if dir == -1 { c.back_cost } else { 1.0 };
        let movement_cost = arc_l * weight * back_factor;
        let prox_cost = arc_l * c.h_prox_cost * self.max_corner_prox(final_pose);
        switch_cost + steer_cost + steer_change_cost + movement_cost + prox_cost
    }

    /// Try a forward primitive from `node` at `(steer, dir)`. Local failures
    /// are returned as `PlannerError` rather than silently as `None` — the
    /// caller matches on the error and discards it; a rejected primitive
    /// never aborts the search.
    fn try_expand_primitive(
        &self,
        checker: &dyn CollisionChecker,
        node: &NodeHybrid,
        steer: f64,
        dir: i32,
        arc_l: f64,
    ) -> Result<(MotionPrimitive, i32, i32, i32, f64), PlannerError> {
        let pose = node.last_pose();
        let cell = self.grid.transform.world_to_grid(Point::new(pose.0, pose.1));
        if !self.grid.in_bounds(cell.0, cell.1) {
            return Err(PlannerError::OutOfGrid { xi: cell.0, yi: cell.1, yaw_i: node.yaw_i, dim: self.grid.dim });
        }
        let motion_res = self.grid.motion_res_map[self.grid.calc_index(cell.0, cell.1)];
        let primitive = move_car_some_steps(pose, arc_l, motion_res, self.vehicle.wheelbase, dir, steer);

        if !checker.check_path_collision(&primitive.x_list, &primitive.y_list, &primitive.yaw_list) {
            return Err(PlannerError::Collision);
        }

        let final_pose = primitive.last_pose();
        let final_cell = self.grid.transform.world_to_grid(Point::new(final_pose.0, final_pose.1));
        if !self.grid.in_bounds(final_cell.0, final_cell.1) {
            let yaw_idx = yaw_to_index(final_pose.2, self.config.yaw_res_rad());
            return Err(PlannerError::OutOfGrid { xi: final_cell.0, yi: final_cell.1, yaw_i: yaw_idx, dim: self.grid.dim });
        }
        let yaw_idx = yaw_to_index(final_pose.2, self.config.yaw_res_rad());
        let weight = self.grid.movement_cost_map[self.grid.calc_index(final_cell.0, final_cell.1)];
        let cost = self.edge_cost(node, dir, steer, arc_l, weight, final_pose);

        Ok((primitive, final_cell.0, final_cell.1, yaw_idx, cost))
    }

    fn try_expand_pivot(
        &self,
        checker: &dyn CollisionChecker,
        node: &NodeHybrid,
        delta_angle: f64,
    ) -> Result<(MotionPrimitive, i32, i32, i32, f64), PlannerError> {
        let pose = node.last_pose();
        let primitive = turn_on_rear_axis(pose, delta_angle, self.config.yaw_res_coll);
        if !checker.check_path_collision(&primitive.x_list, &primitive.y_list, &primitive.yaw_list) {
            return Err(PlannerError::Collision);
        }
        let final_pose = primitive.last_pose();
        let cell = self.grid.transform.world_to_grid(Point::new(final_pose.0, final_pose.1));
        let yaw_idx = yaw_to_index(final_pose.2, self.config.yaw_res_rad());
        if !self.grid.in_bounds(cell.0, cell.1) {
            return Err(PlannerError::OutOfGrid { xi: cell.0, yi: cell.1, yaw_i: yaw_idx, dim: self.grid.dim });
        }
        let dir = *primitive.dir_list.first().unwrap_or(&node.dir);
        let weight = self.grid.movement_cost_map[self.grid.calc_index(cell.0, cell.1)];
        // Rear-axis turn cost plus the same switch/steer/movement/proximity
        // bundle a regular primitive pays, at an artificial arc_l of 1.0.
        let cost = pivot_cost(self.config.rear_axis_cost, delta_angle) + self.edge_cost(node, dir, 0.0, 1.0, weight, final_pose);
        Ok((primitive, cell.0, cell.1, yaw_idx, cost))
    }

    /// Neighbor generation: steer×direction grid, embarrassingly parallel
    /// over primitives, plus an optional pivot fan every `ra_freq`-th
    /// expansion.
    fn expand_neighbors(&self, checker: &dyn CollisionChecker, node: &NodeHybrid, closed_count: usize, arc_l: f64) -> Vec<(MotionPrimitive, i32, i32, i32, f64)> {
        let steers = self.steer_samples();
        let dirs = self.direction_set();

        let mut candidates: Vec<(f64, i32)> = Vec::with_capacity(steers.len() * dirs.len());
        for &s in &steers {
            for &d in &dirs {
                candidates.push((s, d));
            }
        }

        let mut results: Vec<_> = candidates
            .par_iter()
            .filter_map(|&(steer, dir)| self.try_expand_primitive(checker, node, steer, dir, arc_l).ok())
            .collect();

        if self.vehicle.can_pivot && closed_count % (self.config.ra_freq.max(1) as usize) == 0 {
            let theta = self.config.turn_on_point_angle.max(1e-3);
            let mut angle = -std::f64::consts::TAU + theta;
            let mut pivots = Vec::new();
            while angle < std::f64::consts::TAU - theta {
                if angle.abs() > 1e-6 {
                    pivots.push(angle);
                }
                angle += theta;
            }
            let pivot_results: Vec<_> = pivots
                .par_iter()
                .filter_map(|&delta| self.try_expand_pivot(checker, node, delta).ok())
                .collect();
            results.extend(pivot_results);
        }

        results
    }

    /// Analytic expansion: Reeds–Shepp + optional line-intersect pivot.
    fn try_analytic_expansion(&self, checker: &dyn CollisionChecker, node: &NodeHybrid, goal: Pose) -> Option<(ReedsSheppPath, f64)> {
        let start = node.last_pose();
        let primary = reeds_shepp_path(start, (goal.x, goal.y, goal.yaw), self.vehicle.rho(), self.config.motion_res_min);
        let secondary_rho = self.vehicle.rho() * (1.0 - self.config.rs_2nd_steer).max(0.1);
        let secondary = reeds_shepp_path(start, (goal.x, goal.y, goal.yaw), secondary_rho, self.config.motion_res_min);

        let mut best: Option<(ReedsSheppPath, f64)> = None;
        for candidate in [primary, secondary].into_iter().flatten() {
            if !checker.check_path_collision(&candidate.x, &candidate.y, &candidate.yaw) {
                continue;
            }
            let cost = self.get_rs_path_costs(&candidate);
            if best.as_ref().map(|(_, c)| cost < *c).unwrap_or(true) {
                best = Some((candidate, cost));
            }
        }
        best
    }

    fn get_rs_path_costs(&self, path: &ReedsSheppPath) -> f64 {
        let c = &self.config.edge_costs;
        let mut cost = 0.0;

        // Length cost: forward at face value, reverse scaled by back_cost.
        for &len in &path.lengths {
            if len >= 0.0 {
                cost += len;
            } else {
                cost += len.abs() * c.back_cost;
            }
        }

        // Switch-back penalty: one per sign change between consecutive segments.
        for pair in path.lengths.windows(2) {
            if pair[0] * pair[1] < 0.0 {
                cost += c.switch_cost;
            }
        }

        let max_steer = self.vehicle.max_steer;

        // Steer penalty: every curved (non-S) segment pays for how hard and
        // how long it turns.
        for (&letter, &len) in path.letters.iter().zip(path.lengths.iter()) {
            if letter != crate::algorithms::reeds_shepp::Letter::S {
                cost += self.config.extra_steer_cost_analytic * c.steer_cost * max_steer.abs() * len.abs();
            }
        }

        // Steer-change penalty between consecutive segments' commanded steer.
        let u_list: Vec<f64> = path
            .letters
            .iter()
            .map(|&letter| match letter {
                crate::algorithms::reeds_shepp::Letter::R => max_steer,
                crate::algorithms::reeds_shepp::Letter::L => -max_steer,
                crate::algorithms::reeds_shepp::Letter::S => 0.0,
            })
            .collect();
        for pair in u_list.windows(2) {
            cost += c.steer_change_cost * (pair[1] - pair[0]).abs();
        }

        // Corner-proximity integral over every sampled point along the path.
        let mut prox_cost = 0.0;
        for ((&x, &y), &yaw) in path.x.iter().zip(path.y.iter()).zip(path.yaw.iter()) {
            prox_cost += self.max_corner_prox((x, y, yaw)) * c.h_prox_cost * self.config.interp_res;
        }
        cost += prox_cost;

        cost
    }

    /// Probability of attempting an analytic expansion: strictly increases
    /// as `d2goal` decreases, zero at or beyond `dist_thresh_analytic_m`.
    fn analytic_probability(&self, d2goal: f64) -> f64 {
        (1.0 - d2goal / self.config.dist_thresh_analytic_m).max(0.0)
    }

    #[allow(clippy::too_many_arguments)]
    fn h_astar_core(
        &self,
        checker: &dyn CollisionChecker,
        start: Pose,
        goal: Pose,
        closed_path_heuristic: &ClosedSet,
        do_analytic: bool,
        _to_final_pose: bool,
    ) -> Option<PlannerPath> {
        let dim = self.grid.dim;
        let start_cell = self.grid.transform.world_to_grid(start.point());
        let start_yaw_idx = yaw_to_index(start.yaw, self.config.yaw_res_rad());
        let root = NodeHybrid::from_root(start_cell.0, start_cell.1, start_yaw_idx, (start.x, start.y, start.yaw), 1);
        let root_idx = root.index(dim);

        let mut nodes: HashMap<u64, NodeHybrid> = HashMap::new();
        let mut closed: HashMap<u64, NodeHybrid> = HashMap::new();
        let mut open: HashMap<u64, f64> = HashMap::new();
        let mut heap: BinaryHeap<QueueEntry> = BinaryHeap::new();
        let mut order_counter: u64 = 0;

        let h_root = self.heuristic((start.x, start.y, start.yaw), start_cell, goal, closed_path_heuristic);
        open.insert(root_idx, root.cost + h_root);
        heap.push(QueueEntry { f: root.cost + h_root, order: order_counter, idx: root_idx });
        order_counter += 1;
        nodes.insert(root_idx, root);

        let arc_l = NB_GRID_MOTIONS_ASTAR_RES_FACTOR * self.config.planner_res;
        let start_time = Instant::now();
        let mut analytic_candidates: Vec<(PlannerPath, f64)> = Vec::new();
        let mut rng = rand::thread_rng();

        while let Some(entry) = heap.pop() {
            let elapsed_ms = start_time.elapsed().as_millis() as u64;
            if elapsed_ms > self.config.timeout_ms {
                let err = PlannerError::Timeout { elapsed_ms, limit_ms: self.config.timeout_ms };
                log::warn!("{err}");
                return None;
            }

            let current_f = match open.get(&entry.idx) {
                Some(&f) => f,
                None => continue,
            };
            if (current_f - entry.f).abs() > 1e-9 {
                continue; // stale, superseded by a cheaper push (lazy deletion)
            }
            open.remove(&entry.idx);

            let node = match nodes.get(&entry.idx) {
                Some(n) => n.clone(),
                None => continue,
            };
            if closed.contains_key(&entry.idx) {
                continue;
            }

            let pose = node.last_pose();
            let cell = (node.xi, node.yi);
            let d2goal = Astar2D::lookup_dist(closed_path_heuristic, cell, dim);

            if !do_analytic {
                match self.config.waypoint_type {
                    WaypointType::Waypoint => {
                        let close_enough = ((pose.0 - goal.x).powi(2) + (pose.1 - goal.y).powi(2)).sqrt() < self.config.approx_goal_dist;
                        let aligned = angle_diff(pose.2, goal.yaw) < self.config.approx_goal_angle;
                        if close_enough && aligned {
                            closed.insert(entry.idx, node.clone());
                            return Some(reconstruct_path(&nodes, entry.idx, dim));
                        }
                    }
                    WaypointType::HeurRed => {
                        if let Some(guidance) = &self.closed_set_guidance {
                            let start_h = Astar2D::lookup_dist(guidance, start_cell, dim);
                            let here_h = Astar2D::lookup_dist(guidance, cell, dim);
                            if start_h.is_finite() && here_h.is_finite() && start_h - here_h >= self.config.waypoint_dist {
                                closed.insert(entry.idx, node.clone());
                                return Some(reconstruct_path(&nodes, entry.idx, dim));
                            }
                        }
                    }
                }
            } else if d2goal.is_finite() {
                let p_attempt = self.analytic_probability(d2goal);
                if rng.gen::<f64>() < p_attempt {
                    if let Some((rs_path, cost)) = self.try_analytic_expansion(checker, &node, goal) {
                        log::debug!("accepted analytic Reeds-Shepp candidate, cost={:.3}", node.cost + cost);
                        analytic_candidates.push((reeds_shepp_to_planner_path(&rs_path, node.cost + cost), node.cost + cost));
                    } else if self.vehicle.can_pivot {
                        if let Some(pivot_path) = self.try_line_intersect_pivot(checker, &node, goal) {
                            log::debug!("accepted analytic pivot candidate, cost={:.3}", pivot_path.1);
                            analytic_candidates.push(pivot_path);
                        }
                    }
                    if analytic_candidates.len() >= self.config.max_extra_nodes_hastar.max(1) {
                        break;
                    }
                }
            }

            log::trace!("settled node ({}, {}, {}) g={:.3}", node.xi, node.yi, node.yaw_i, node.cost);
            closed.insert(entry.idx, node.clone());

            for (primitive, xi, yi, yaw_idx, cost) in self.expand_neighbors(checker, &node, closed.len(), arc_l) {
                let child_dir = *primitive.dir_list.last().unwrap_or(&node.dir);
                let child_idx = NodeHybrid::calc_index(xi, yi, yaw_idx, dim);
                if closed.contains_key(&child_idx) {
                    continue;
                }
                let child = NodeHybrid::from_primitive(&node, entry.idx, &primitive, xi, yi, yaw_idx, child_dir, cost);
                let h = self.heuristic(child.last_pose(), (xi, yi), goal, closed_path_heuristic);
                if h == OUT_OF_HEURISTIC {
                    continue;
                }
                let f = child.cost + h;
                let better = open.get(&child_idx).map(|&existing_f| f < existing_f).unwrap_or(true);
                if better {
                    nodes.insert(child_idx, child);
                    open.insert(child_idx, f);
                    heap.push(QueueEntry { f, order: order_counter, idx: child_idx });
                    order_counter += 1;
                }
            }
        }

        if let Some((best_path, _)) = analytic_candidates.into_iter().min_by(|a, b| a.1.partial_cmp(&b.1).unwrap()) {
            return Some(best_path);
        }

        log::warn!("{}", PlannerError::OpenSetExhausted);
        best_effort_path(&nodes, &closed, dim)
    }

    fn try_line_intersect_pivot(&self, checker: &dyn CollisionChecker, node: &NodeHybrid, goal: Pose) -> Option<(PlannerPath, f64)> {
        let (sx, sy, syaw) = node.last_pose();
        let (gx, gy, gyaw) = (goal.x, goal.y, goal.yaw);

        let intersection = line_intersection((sx, sy, syaw), (gx, gy, gyaw))?;
        let d1 = ((intersection.0 - sx).powi(2) + (intersection.1 - sy).powi(2)).sqrt();
        let d2 = ((gx - intersection.0).powi(2) + (gy - intersection.1).powi(2)).sqrt();
        if d1 > self.config.turn_on_point_horizon || d2 > self.config.turn_on_point_horizon {
            return None;
        }

        let step = self.config.motion_res_min;
        let seg1 = sample_line((sx, sy), intersection, step, 1, SegmentType::ReedsShepp);
        let delta_yaw = crate::geometry::signed_angle_diff(gyaw, syaw);
        let pivot = turn_on_rear_axis((intersection.0, intersection.1, syaw), delta_yaw, self.config.yaw_res_coll);
        let seg2 = sample_line(intersection, (gx, gy), step, 1, SegmentType::ReedsShepp);

        let mut xs = seg1.0.clone();
        let mut ys = seg1.1.clone();
        let mut yaws = seg1.2.clone();
        xs.extend(&pivot.x_list);
        ys.extend(&pivot.y_list);
        yaws.extend(&pivot.yaw_list);
        xs.extend(&seg2.0);
        ys.extend(&seg2.1);
        yaws.extend(&seg2.2);

        if !checker.check_path_collision(&xs, &ys, &yaws) {
            return None;
        }

        let length = d1 + d2;
        let turn_cost = pivot_cost(self.config.rear_axis_cost, delta_yaw);
        let cost = node.cost + length + turn_cost;

        let n = xs.len();
        let path = PlannerPath {
            x: xs,
            y: ys,
            yaw: yaws,
            direction: vec![1; n],
            segment_type: vec![SegmentType::ReedsShepp; n],
            cost,
            idx_analytic: Some(0),
        };
        Some((path, cost))
    }

    fn post_process(&self, mut path: PlannerPath) -> PlannerPath {
        let segments = segment_path(&path);
        let mut out = PlannerPath { cost: path.cost, idx_analytic: path.idx_analytic, ..Default::default() };
        for segment in &segments {
            let resampled = interpolate_segment(segment, self.config.interp_res);
            out.x.extend(resampled.x);
            out.y.extend(resampled.y);
            out.yaw.extend(resampled.yaw);
            out.direction.extend(resampled.direction);
            out.segment_type.extend(resampled.segment_type);
        }
        out = self.smoother.smooth_path(&out, &self.grid);
        path = out;
        path
    }
}

/// Pivot edge cost: penalize pivots less as the swept angle approaches π (a
/// near-U-turn pivot is the cheapest way to reverse direction in place) and
/// more as it approaches 0.
fn pivot_cost(rear_axis_cost: f64, delta_yaw: f64) -> f64 {
    let dyaw = delta_yaw.abs();
    rear_axis_cost * (1.0 + (std::f64::consts::PI - dyaw).abs() * (dyaw / std::f64::consts::PI))
}

fn yaw_to_index(yaw: f64, yaw_res_rad: f64) -> i32 {
    let wrapped = crate::geometry::constrain_angle_zero_2pi(yaw);
    (wrapped / yaw_res_rad).round() as i32
}

fn best_effort_path(nodes: &HashMap<u64, NodeHybrid>, closed: &HashMap<u64, NodeHybrid>, dim: usize) -> Option<PlannerPath> {
    let last = closed.iter().max_by(|a, b| a.1.cost.partial_cmp(&b.1.cost).unwrap())?;
    Some(reconstruct_path(nodes, *last.0, dim))
}

fn reeds_shepp_to_planner_path(rs: &ReedsSheppPath, cost: f64) -> PlannerPath {
    let n = rs.x.len();
    PlannerPath {
        x: rs.x.clone(),
        y: rs.y.clone(),
        yaw: rs.yaw.clone(),
        direction: rs.directions.clone(),
        segment_type: vec![SegmentType::ReedsShepp; n],
        cost,
        idx_analytic: Some(0),
    }
}

fn line_intersection(start: (f64, f64, f64), goal: (f64, f64, f64)) -> Option<(f64, f64)> {
    let (x1, y1, yaw1) = start;
    let (x2, y2, yaw2) = goal;
    let (dx1, dy1) = (yaw1.cos(), yaw1.sin());
    let (dx2, dy2) = (yaw2.cos(), yaw2.sin());

    let det = dx1 * dy2 - dy1 * dx2;
    if det.abs() < 1e-9 {
        return None;
    }
    let t = ((x2 - x1) * dy2 - (y2 - y1) * dx2) / det;
    Some((x1 + t * dx1, y1 + t * dy1))
}

fn sample_line(from: (f64, f64), to: (f64, f64), step: f64, dir: i32, _seg_type: SegmentType) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let dist = ((to.0 - from.0).powi(2) + (to.1 - from.1).powi(2)).sqrt();
    let n = (dist / step).ceil().max(1.0) as usize;
    let yaw = (to.1 - from.1).atan2(to.0 - from.0);
    let mut xs = Vec::with_capacity(n + 1);
    let mut ys = Vec::with_capacity(n + 1);
    let mut yaws = Vec::with_capacity(n + 1);
    for i in 0..=n {
        let t = i as f64 / n as f64;
        xs.push(from.0 + t * (to.0 - from.0));
        ys.push(from.1 + t * (to.1 - from.1));
        yaws.push(yaw);
    }
    let _ = dir;
    (xs, ys, yaws)
}

#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    f: f64,
    order: u64,
    idx: u64,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.f == other.f && self.order == other.order
    }
}
impl Eq for QueueEntry {}
impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other.f.partial_cmp(&self.f).unwrap_or(std::cmp::Ordering::Equal).then_with(|| other.order.cmp(&self.order))
    }
}
impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
