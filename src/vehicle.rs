//! Vehicle geometry: wheelbase, footprint corners, steering/curvature
//! limits, treated as an external collaborator — the search core only ever
//! reads these constants and calls into the in-scope `motion` module with
//! them, never hardcodes a specific vehicle.

use crate::geometry::Pose;

/// Car-like (Ackermann) vehicle geometry and kinematic limits.
#[derive(Debug, Clone, Copy)]
pub struct Vehicle {
    /// Distance between front and rear axles, meters.
    pub wheelbase: f64,
    /// Maximum steering angle, radians.
    pub max_steer: f64,
    /// Maximum curvature `1/rho`, `rho` = minimum turning radius.
    pub kappa_max: f64,
    /// Footprint corners in the rear-axle body frame: (front-left,
    /// front-right, rear-right, rear-left).
    pub corners: [(f64, f64); 4],
    /// Whether this vehicle can pivot in place about the rear axle.
    pub can_pivot: bool,
}

impl Vehicle {
    /// A representative mid-size car: wheelbase 2.8 m, kappa_max = 1/5 m⁻¹.
    pub fn reference_car() -> Self {
        let half_width = 0.95;
        let front_overhang = 0.9;
        let rear_overhang = 0.4;
        Self {
            wheelbase: 2.8,
            max_steer: 0.6,
            kappa_max: 1.0 / 5.0,
            corners: [
                (2.8 + front_overhang, half_width),
                (2.8 + front_overhang, -half_width),
                (-rear_overhang, -half_width),
                (-rear_overhang, half_width),
            ],
            can_pivot: true,
        }
    }

    pub fn rho(&self) -> f64 {
        1.0 / self.kappa_max
    }

    /// Corner positions rotated and translated into the world frame at
    /// `pose`. Used by the Hybrid A* edge cost's corner-proximity bilinear
    /// sampling.
    pub fn corner_world_positions(&self, pose: &Pose) -> [(f64, f64); 4] {
        let (s, c) = pose.yaw.sin_cos();
        self.corners.map(|(cx, cy)| (pose.x + cx * c - cy * s, pose.y + cx * s + cy * c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_rotate_with_heading() {
        let v = Vehicle::reference_car();
        let pose = Pose::new(0.0, 0.0, std::f64::consts::FRAC_PI_2);
        let corners = v.corner_world_positions(&pose);
        // front-left corner, rotated 90 deg, should land near (-half_width, front_x)
        let (fl_x, fl_y) = corners[0];
        assert!(fl_x.abs() < 1.0);
        assert!(fl_y > 0.0);
    }
}
