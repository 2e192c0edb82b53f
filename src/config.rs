//! Planner configuration, loaded from YAML. Field names use `#[serde(rename)]`
//! to match the on-disk SCREAMING_SNAKE_CASE keys verbatim, while the
//! Rust-side field names stay idiomatic snake_case.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Waypoint termination mode used by the Hybrid A* core when `do_analytic`
/// is false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum WaypointType {
    #[serde(rename = "WAYPOINT")]
    Waypoint,
    #[serde(rename = "HEUR_RED")]
    HeurRed,
}

/// All configuration required by the planner. Every field here corresponds
/// to a required YAML key — there are no defaulted fallbacks for missing
/// keys; a missing key is a hard parse error.
#[derive(Debug, Clone, Deserialize)]
pub struct PlannerConfig {
    #[serde(rename = "GM_RES")]
    pub gm_res: f64,
    #[serde(rename = "PLANNER_RES")]
    pub planner_res: f64,
    #[serde(rename = "YAW_RES")]
    pub yaw_res_deg: f64,
    #[serde(rename = "ONLY_FORWARD")]
    pub only_forward: bool,
    #[serde(rename = "MAX_BRAKE_ACC")]
    pub max_brake_acc: f64,

    #[serde(rename = "APPROX_GOAL_DIST")]
    pub approx_goal_dist: f64,
    #[serde(rename = "APPROX_GOAL_ANGLE")]
    pub approx_goal_angle: f64,
    #[serde(rename = "WAYPOINT_DIST")]
    pub waypoint_dist: f64,
    #[serde(rename = "WAYPOINT_TYPE")]
    pub waypoint_type: WaypointType,

    #[serde(rename = "DIST_THRESH_ANALYTIC_M")]
    pub dist_thresh_analytic_m: f64,
    #[serde(rename = "RS_2ND_STEER")]
    pub rs_2nd_steer: f64,
    #[serde(rename = "EXTRA_STEER_COST_ANALYTIC")]
    pub extra_steer_cost_analytic: f64,
    #[serde(rename = "MAX_EXTRA_NODES_HASTAR")]
    pub max_extra_nodes_hastar: usize,

    #[serde(rename = "TURN_ON_POINT_ANGLE")]
    pub turn_on_point_angle: f64,
    #[serde(rename = "TURN_ON_POINT_HORIZON")]
    pub turn_on_point_horizon: f64,
    #[serde(rename = "YAW_RES_COLL")]
    pub yaw_res_coll: f64,
    #[serde(rename = "REAR_AXIS_COST")]
    pub rear_axis_cost: f64,

    #[serde(rename = "TIMEOUT")]
    pub timeout_ms: u64,

    #[serde(rename = "MOTION_RES_MIN")]
    pub motion_res_min: f64,
    #[serde(rename = "MOTION_RES_MAX")]
    pub motion_res_max: f64,
    #[serde(rename = "INTERP_RES")]
    pub interp_res: f64,
    #[serde(rename = "RA_FREQ")]
    pub ra_freq: u32,
    #[serde(rename = "NON_H_NO_OBS_PATCH_DIM")]
    pub non_h_no_obs_patch_dim: usize,
    #[serde(rename = "LOG_LEVEL_HASTAR")]
    pub log_level_hastar: String,

    #[serde(rename = "astar_movement_cost")]
    pub astar_movement_cost: f64,
    #[serde(rename = "astar_prox_cost")]
    pub astar_prox_cost: f64,
    #[serde(rename = "astar_lane_movement_cost")]
    pub astar_lane_movement_cost: f64,
    #[serde(rename = "alpha")]
    pub voronoi_alpha: f64,
    #[serde(rename = "d_O_max")]
    pub d_o_max: f64,
    #[serde(rename = "d_O_min")]
    pub d_o_min: f64,
    #[serde(rename = "unknown_cost_w")]
    pub unknown_cost_w: f64,

    /// Edge-cost tunables needed to evaluate the Hybrid A* cost formula.
    /// These aren't part of the top-level required-key list, but the
    /// formula itself names them; they're collected here rather than
    /// hardcoded so they stay config-driven.
    #[serde(default)]
    pub edge_costs: EdgeCostConfig,
}

/// Supplemental edge-cost weights for the Hybrid A* core's cost formula.
/// Defaulted rather than required.
#[derive(Debug, Clone, Deserialize)]
pub struct EdgeCostConfig {
    #[serde(default = "EdgeCostConfig::default_nb_steer")]
    pub nb_steer: usize,
    #[serde(default = "EdgeCostConfig::default_switch_cost")]
    pub switch_cost: f64,
    #[serde(default = "EdgeCostConfig::default_steer_cost")]
    pub steer_cost: f64,
    #[serde(default = "EdgeCostConfig::default_steer_change_cost")]
    pub steer_change_cost: f64,
    #[serde(default = "EdgeCostConfig::default_back_cost")]
    pub back_cost: f64,
    #[serde(default = "EdgeCostConfig::default_h_prox_cost")]
    pub h_prox_cost: f64,
    #[serde(default = "EdgeCostConfig::default_h_dist_cost")]
    pub h_dist_cost: f64,
}

impl EdgeCostConfig {
    fn default_nb_steer() -> usize {
        5
    }
    fn default_switch_cost() -> f64 {
        10.0
    }
    fn default_steer_cost() -> f64 {
        1.0
    }
    fn default_steer_change_cost() -> f64 {
        1.5
    }
    fn default_back_cost() -> f64 {
        2.0
    }
    fn default_h_prox_cost() -> f64 {
        5.0
    }
    fn default_h_dist_cost() -> f64 {
        1.0
    }
}

impl Default for EdgeCostConfig {
    fn default() -> Self {
        Self {
            nb_steer: Self::default_nb_steer(),
            switch_cost: Self::default_switch_cost(),
            steer_cost: Self::default_steer_cost(),
            steer_change_cost: Self::default_steer_change_cost(),
            back_cost: Self::default_back_cost(),
            h_prox_cost: Self::default_h_prox_cost(),
            h_dist_cost: Self::default_h_dist_cost(),
        }
    }
}

impl PlannerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound { path: path.to_path_buf() });
        }
        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::NotFound {
            path: path.to_path_buf(),
        })?;
        let cfg: PlannerConfig = serde_yaml::from_str(&raw)?;
        Ok(cfg)
    }

    pub fn yaw_res_rad(&self) -> f64 {
        self.yaw_res_deg.to_radians()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
GM_RES: 0.25
PLANNER_RES: 0.25
YAW_RES: 5.0
ONLY_FORWARD: false
MAX_BRAKE_ACC: 3.0
APPROX_GOAL_DIST: 0.5
APPROX_GOAL_ANGLE: 0.2
WAYPOINT_DIST: 1.0
WAYPOINT_TYPE: WAYPOINT
DIST_THRESH_ANALYTIC_M: 10.0
RS_2ND_STEER: 0.2
EXTRA_STEER_COST_ANALYTIC: 1.0
MAX_EXTRA_NODES_HASTAR: 5
TURN_ON_POINT_ANGLE: 0.1
TURN_ON_POINT_HORIZON: 2.0
YAW_RES_COLL: 0.05
REAR_AXIS_COST: 3.0
TIMEOUT: 1000
MOTION_RES_MIN: 0.05
MOTION_RES_MAX: 0.2
INTERP_RES: 0.1
RA_FREQ: 20
NON_H_NO_OBS_PATCH_DIM: 81
LOG_LEVEL_HASTAR: info
astar_movement_cost: 1.0
astar_prox_cost: 1.0
astar_lane_movement_cost: 0.5
alpha: 1.0
d_O_max: 5.0
d_O_min: 0.5
unknown_cost_w: 2.0
"#
    }

    #[test]
    fn parses_all_required_keys() {
        let cfg: PlannerConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(cfg.gm_res, 0.25);
        assert_eq!(cfg.waypoint_type, WaypointType::Waypoint);
        assert_eq!(cfg.edge_costs.nb_steer, 5);
    }

    #[test]
    fn missing_required_key_is_an_error() {
        let truncated = sample_yaml().replace("GM_RES: 0.25\n", "");
        let result: Result<PlannerConfig, _> = serde_yaml::from_str(&truncated);
        assert!(result.is_err());
    }

    #[test]
    fn load_missing_file_errors() {
        let result = PlannerConfig::load(Path::new("/nonexistent/path/config.yaml"));
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }
}
