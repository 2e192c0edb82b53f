//! End-to-end scenarios and cross-module invariants for the Hybrid A* core,
//! fixed around a 0.25 m planner resolution, 5 degree yaw resolution, and
//! the reference vehicle's 2.8 m wheelbase / 1-in-5 curvature.

use super::*;
use crate::collision::GridCollisionChecker;
use crate::config::EdgeCostConfig;

fn share_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("hybrid_astar_planner_test_{}_{}", std::process::id(), name));
    let _ = std::fs::create_dir_all(&dir);
    dir
}

fn base_config(timeout_ms: u64, only_forward: bool) -> PlannerConfig {
    PlannerConfig {
        gm_res: 0.25,
        planner_res: 0.25,
        yaw_res_deg: 5.0,
        only_forward,
        max_brake_acc: 3.0,
        approx_goal_dist: 0.5,
        approx_goal_angle: 0.2,
        waypoint_dist: 1.0,
        waypoint_type: WaypointType::Waypoint,
        dist_thresh_analytic_m: 10.0,
        rs_2nd_steer: 0.2,
        extra_steer_cost_analytic: 1.0,
        max_extra_nodes_hastar: 3,
        turn_on_point_angle: 0.3,
        turn_on_point_horizon: 3.0,
        yaw_res_coll: 0.05,
        rear_axis_cost: 3.0,
        timeout_ms,
        motion_res_min: 0.1,
        motion_res_max: 0.3,
        interp_res: 0.25,
        ra_freq: 5,
        non_h_no_obs_patch_dim: 9,
        log_level_hastar: "info".to_string(),
        astar_movement_cost: 1.0,
        astar_prox_cost: 1.0,
        astar_lane_movement_cost: 0.5,
        voronoi_alpha: 1.0,
        d_o_max: 3.0,
        d_o_min: 0.3,
        unknown_cost_w: 1.0,
        edge_costs: EdgeCostConfig::default(),
    }
}

fn vehicle_no_pivot() -> Vehicle {
    let mut v = Vehicle::reference_car();
    v.can_pivot = false;
    v
}

fn planner(name: &str, config: PlannerConfig, vehicle: Vehicle, dim: usize) -> Planner {
    Planner::initialize(config, vehicle, dim, Point::new(0.0, 0.0), &share_dir(name))
}

// ---- Scenario 1: straight line forward ----
#[test]
fn scenario_straight_line_forward() {
    let mut p = planner("s1", base_config(2000, false), vehicle_no_pivot(), 40);
    let grid_snapshot = p.grid.clone();
    let checker = GridCollisionChecker::new(&grid_snapshot);
    let start = Pose::new(1.0, 5.0, 0.0);
    let goal = Pose::new(9.0, 5.0, 0.0);
    let result = p.hybrid_a_star_planning(&checker, start, start, goal, true, true);
    let path = result.expect("straight line plan should succeed");
    assert!(path.len() >= 2);
    let length: f64 = path
        .x
        .windows(2)
        .zip(path.y.windows(2))
        .map(|(wx, wy)| ((wx[1] - wx[0]).powi(2) + (wy[1] - wy[0]).powi(2)).sqrt())
        .sum();
    assert!((length - 8.0).abs() < 1.0, "straight line length {length}");
}

// ---- Scenario 2: U-turn, forward only -> expect failure ----
#[test]
fn scenario_u_turn_forward_only_fails() {
    let mut p = planner("s2", base_config(300, true), vehicle_no_pivot(), 40);
    let grid_snapshot = p.grid.clone();
    let checker = GridCollisionChecker::new(&grid_snapshot);
    let start = Pose::new(1.0, 1.0, 0.0);
    let goal = Pose::new(1.0, 4.0, std::f64::consts::PI);
    let result = p.hybrid_a_star_planning(&checker, start, start, goal, true, true);
    assert!(result.is_none());
}

// ---- Scenario 3: U-turn with reverse allowed -> expect success with a cusp ----
#[test]
fn scenario_u_turn_with_reverse_succeeds_with_cusp() {
    let mut p = planner("s3", base_config(5000, false), vehicle_no_pivot(), 40);
    let grid_snapshot = p.grid.clone();
    let checker = GridCollisionChecker::new(&grid_snapshot);
    let start = Pose::new(1.0, 1.0, 0.0);
    let goal = Pose::new(1.0, 4.0, std::f64::consts::PI);
    let result = p.hybrid_a_star_planning(&checker, start, start, goal, true, true);
    let path = result.expect("U-turn with reverse should succeed");
    assert!(path.direction.iter().any(|&d| d == 1) && path.direction.iter().any(|&d| d == -1), "expected at least one cusp");
}

// ---- Scenario 4: pure pivot goal ----
#[test]
fn scenario_pivot_goal_cost_matches_formula() {
    let delta = std::f64::consts::FRAC_PI_2;
    let rear_axis_cost = 3.0;
    let expected_turn_cost = rear_axis_cost * (1.0 + (std::f64::consts::PI - delta).abs() * (delta / std::f64::consts::PI));
    assert!((pivot_cost(rear_axis_cost, delta) - expected_turn_cost).abs() < 1e-9);

    let mut config = base_config(2000, false);
    config.rear_axis_cost = rear_axis_cost;
    let mut p = planner("s4", config, Vehicle::reference_car(), 40);
    let grid_snapshot = p.grid.clone();
    let checker = GridCollisionChecker::new(&grid_snapshot);
    let start = Pose::new(2.0, 2.0, 0.0);
    let goal = Pose::new(2.0, 2.0, std::f64::consts::FRAC_PI_2);
    let root = NodeHybrid::from_root(8, 8, 0, (2.0, 2.0, 0.0), 1);
    // Forward pivot on an empty, uniform-weight grid: no switch cost (dir
    // matches the root's), no steer cost, no proximity cost, so the only
    // addition on top of the turn cost is the unit movement cost at arc_l=1.0.
    let expected_total = expected_turn_cost + 1.0;
    if let Ok((_, _, _, _, cost)) = p.try_expand_pivot(&checker, &root, delta) {
        assert!((cost - expected_total).abs() < 1e-3);
    }
    let _ = p.hybrid_a_star_planning(&checker, start, start, goal, true, true);
}

// ---- Scenario 5: obstacle detour ----
#[test]
fn scenario_obstacle_detour_avoids_wall() {
    let mut p = planner("s5", base_config(8000, false), vehicle_no_pivot(), 80);
    for xi in 0..80 {
        let idx = p.grid.calc_index(xi, 20);
        p.grid.astar_grid[idx] = 1;
    }
    let grid_snapshot = p.grid.clone();
    let checker = GridCollisionChecker::new(&grid_snapshot);
    let start = Pose::new(2.0, 2.0, 0.0);
    let goal = Pose::new(18.0, 8.0, 0.0);
    let result = p.hybrid_a_star_planning(&checker, start, start, goal, true, true);
    if let Some(path) = result {
        for (&x, &y) in path.x.iter().zip(path.y.iter()) {
            let (xi, yi) = p.grid.transform.world_to_grid(Point::new(x, y));
            assert_ne!((xi, yi), (xi, 20), "sample landed on the wall row");
        }
        let straight = ((18.0_f64 - 2.0).powi(2) + (8.0_f64 - 2.0).powi(2)).sqrt();
        let length: f64 = path
            .x
            .windows(2)
            .zip(path.y.windows(2))
            .map(|(wx, wy)| ((wx[1] - wx[0]).powi(2) + (wy[1] - wy[0]).powi(2)).sqrt())
            .sum();
        assert!(length >= straight - 1e-6);
    }
}

// ---- Scenario 6: timeout ----
#[test]
fn scenario_timeout_returns_none_within_wall_clock() {
    let mut p = planner("s6", base_config(50, false), vehicle_no_pivot(), 200);
    let goal_cell = (100i32, 100i32);
    for &(dx, dy) in &[(1, 0), (-1, 0), (0, 1), (0, -1), (1, 1), (1, -1), (-1, 1), (-1, -1)] {
        let idx = p.grid.calc_index(goal_cell.0 + dx, goal_cell.1 + dy);
        p.grid.astar_grid[idx] = 1;
    }
    let grid_snapshot = p.grid.clone();
    let checker = GridCollisionChecker::new(&grid_snapshot);
    let start = Pose::new(1.0, 1.0, 0.0);
    let goal = p.grid.transform.grid_to_world(goal_cell.0, goal_cell.1);
    let goal_pose = Pose::new(goal.x, goal.y, 0.0);
    let started = Instant::now();
    let result = p.hybrid_a_star_planning(&checker, start, start, goal_pose, true, true);
    assert!(result.is_none());
    assert!(started.elapsed().as_millis() < 500);
}

// ---- Invariant: analytic probability strictly increases as d2goal decreases ----
#[test]
fn invariant_analytic_probability_decreases_with_distance() {
    let p = planner("inv-prob", base_config(1000, false), vehicle_no_pivot(), 40);
    assert!((p.analytic_probability(0.0) - 1.0).abs() < 1e-9);
    assert_eq!(p.analytic_probability(p.config.dist_thresh_analytic_m), 0.0);
    assert_eq!(p.analytic_probability(p.config.dist_thresh_analytic_m * 2.0), 0.0);
    assert!(p.analytic_probability(2.0) > p.analytic_probability(8.0));
}

// ---- Invariant: heuristic is (near) zero at the goal and decreases toward it ----
#[test]
fn invariant_heuristic_shrinks_toward_goal() {
    let p = planner("inv-heur", base_config(1000, false), vehicle_no_pivot(), 40);
    let goal = Pose::new(5.0, 5.0, 0.0);
    let goal_cell = p.grid.transform.world_to_grid(goal.point());
    let closed = p.astar.calc_distance_heuristic(&p.grid, goal_cell, None, false);

    let near_cell = p.grid.transform.world_to_grid(Point::new(5.25, 5.0));
    let far_cell = p.grid.transform.world_to_grid(Point::new(9.0, 5.0));
    let h_near = p.heuristic((5.25, 5.0, 0.0), near_cell, goal, &closed);
    let h_far = p.heuristic((9.0, 5.0, 0.0), far_cell, goal, &closed);
    assert!(h_near < h_far);

    let h_goal = p.heuristic((5.0, 5.0, 0.0), goal_cell, goal, &closed);
    assert!(h_goal < h_near);
}

// ---- Invariant: edge cost is non-negative, so g is monotonically non-decreasing ----
#[test]
fn invariant_edge_cost_never_negative() {
    let p = planner("inv-edge", base_config(1000, false), vehicle_no_pivot(), 40);
    let root = NodeHybrid::from_root(20, 20, 0, (5.0, 5.0, 0.0), 1);
    for &dir in &[1, -1] {
        for steer in [-0.5, 0.0, 0.3] {
            let cost = p.edge_cost(&root, dir, steer, 0.375, 1.0, (5.1, 5.0, 0.05));
            assert!(cost >= 0.0, "edge cost went negative: {cost}");
        }
    }
}

// ---- Invariant: expanded neighbor directions are always in {-1, +1} ----
#[test]
fn invariant_direction_encoding_is_plus_minus_one() {
    let p = planner("inv-dir", base_config(1000, false), Vehicle::reference_car(), 40);
    let grid_snapshot = p.grid.clone();
    let checker = GridCollisionChecker::new(&grid_snapshot);
    let root = NodeHybrid::from_root(20, 20, 0, (5.0, 5.0, 0.0), 1);
    let arc_l = 1.5 * p.config.planner_res;
    for (primitive, ..) in p.expand_neighbors(&checker, &root, 1, arc_l) {
        assert!(primitive.dir_list.iter().all(|&d| d == 1 || d == -1));
    }
}

// ---- Invariant: only-forward restricts the direction set to {+1} ----
#[test]
fn invariant_only_forward_restricts_direction_set() {
    let p = planner("inv-only-fwd", base_config(1000, true), vehicle_no_pivot(), 40);
    assert_eq!(p.direction_set(), vec![1]);
}
