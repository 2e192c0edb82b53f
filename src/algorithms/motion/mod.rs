//! Motion primitives: forward-simulates the bicycle model for an arc
//! length at a steering angle, and in-place pivot ("turn on rear axis")
//! sweeps. Pure computation, no I/O, no logging.

use crate::node::{MotionPrimitive, SegmentType};

/// Forward-simulate the bicycle model:
/// ```text
/// yaw_{k+1} = yaw_k + dir * (ds / L) * tan(steer)
/// x_{k+1}   = x_k + dir * ds * cos(yaw_k)
/// y_{k+1}   = y_k + dir * ds * sin(yaw_k)
/// ```
/// over an arc of length `arc_l`, stepping by `motion_res` (adaptive per
/// cell), `nb_steps = ceil(arc_l / motion_res)`.
pub fn move_car_some_steps(
    pose: (f64, f64, f64),
    arc_l: f64,
    motion_res: f64,
    wheelbase: f64,
    dir: i32,
    steer: f64,
) -> MotionPrimitive {
    let nb_steps = (arc_l / motion_res).ceil().max(1.0) as usize;
    let ds = arc_l / nb_steps as f64;

    let mut x = pose.0;
    let mut y = pose.1;
    let mut yaw = pose.2;

    let mut x_list = Vec::with_capacity(nb_steps);
    let mut y_list = Vec::with_capacity(nb_steps);
    let mut yaw_list = Vec::with_capacity(nb_steps);
    let mut dir_list = Vec::with_capacity(nb_steps);
    let mut type_list = Vec::with_capacity(nb_steps);

    let dir_f = dir as f64;
    for _ in 0..nb_steps {
        yaw += dir_f * (ds / wheelbase) * steer.tan();
        x += dir_f * ds * yaw.cos();
        y += dir_f * ds * yaw.sin();
        x_list.push(x);
        y_list.push(y);
        yaw_list.push(yaw);
        dir_list.push(dir);
        type_list.push(SegmentType::HaStar);
    }

    MotionPrimitive {
        x_list,
        y_list,
        yaw_list,
        dir_list,
        type_list,
        arc_length: arc_l,
        steer,
    }
}

/// In-place pivot about the rear axle: position held fixed, yaw swept by
/// `delta_angle` in steps of `yaw_res_coll`. Emitted with segment type
/// `RearAxis`.
pub fn turn_on_rear_axis(pose: (f64, f64, f64), delta_angle: f64, yaw_res_coll: f64) -> MotionPrimitive {
    let nb_steps = (delta_angle.abs() / yaw_res_coll).ceil().max(1.0) as usize;
    let step = delta_angle / nb_steps as f64;
    let dir = if delta_angle >= 0.0 { 1 } else { -1 };

    let (x, y, yaw0) = pose;
    let mut x_list = Vec::with_capacity(nb_steps);
    let mut y_list = Vec::with_capacity(nb_steps);
    let mut yaw_list = Vec::with_capacity(nb_steps);
    let mut dir_list = Vec::with_capacity(nb_steps);
    let mut type_list = Vec::with_capacity(nb_steps);

    let mut yaw = yaw0;
    for _ in 0..nb_steps {
        yaw += step;
        x_list.push(x);
        y_list.push(y);
        yaw_list.push(crate::geometry::constrain_angle_min_pi_plus_pi(yaw));
        dir_list.push(dir);
        type_list.push(SegmentType::RearAxis);
    }

    MotionPrimitive {
        x_list,
        y_list,
        yaw_list,
        dir_list,
        type_list,
        arc_length: 0.0,
        steer: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn straight_steer_zero_moves_along_heading() {
        let p = move_car_some_steps((0.0, 0.0, 0.0), 1.0, 0.1, 2.8, 1, 0.0);
        let (x, y, yaw) = p.last_pose();
        assert!((x - 1.0).abs() < 1e-9);
        assert!(y.abs() < 1e-9);
        assert!(yaw.abs() < 1e-9);
    }

    #[test]
    fn reverse_direction_moves_backward() {
        let p = move_car_some_steps((0.0, 0.0, 0.0), 1.0, 0.1, 2.8, -1, 0.0);
        let (x, _, _) = p.last_pose();
        assert!(x < 0.0);
    }

    #[test]
    fn positive_steer_turns_left() {
        let p = move_car_some_steps((0.0, 0.0, 0.0), 2.0, 0.05, 2.8, 1, 0.3);
        let (_, _, yaw) = p.last_pose();
        assert!(yaw > 0.0);
    }

    #[test]
    fn pivot_holds_position_and_sweeps_yaw() {
        let p = turn_on_rear_axis((1.0, 2.0, 0.0), PI / 2.0, 0.05);
        let (x, y, yaw) = p.last_pose();
        assert!((x - 1.0).abs() < 1e-9);
        assert!((y - 2.0).abs() < 1e-9);
        assert!((yaw - PI / 2.0).abs() < 1e-6);
        assert!(p.type_list.iter().all(|t| matches!(t, SegmentType::RearAxis)));
    }
}
