use nalgebra::{Rotation3, Vector3};

use crate::geometry::{FloatType, WorldMatrix, WorldPoint, WorldVector};

/// Camera pose as delivered by the input-handling collaborator: a position
/// plus pitch (around X, applied first) and yaw (around Y).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Camera {
    pub position: WorldPoint,
    pub pitch: FloatType,
    pub yaw: FloatType,
}

impl Camera {
    pub fn new(position: WorldPoint, pitch: FloatType, yaw: FloatType) -> Camera {
        Camera {
            position,
            pitch,
            yaw,
        }
    }

    pub fn rotation_matrix(&self) -> WorldMatrix {
        (Rotation3::from_axis_angle(&Vector3::y_axis(), self.yaw)
            * Rotation3::from_axis_angle(&Vector3::x_axis(), self.pitch))
        .to_homogeneous()
    }

    /// World-space view direction (+Z is forward at zero rotation).
    pub fn forward(&self) -> WorldVector {
        self.rotation_matrix()
            .transform_vector(&WorldVector::new(0.0, 0.0, 1.0))
    }
}

impl Default for Camera {
    fn default() -> Camera {
        Camera {
            position: WorldPoint::origin(),
            pitch: 0.0,
            yaw: 0.0,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert2::assert;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn zero_rotation_looks_along_z() {
        let camera = Camera::default();
        assert!((camera.forward() - WorldVector::new(0.0, 0.0, 1.0)).norm() < 1e-6);
    }

    #[test]
    fn yaw_turns_right() {
        let camera = Camera::new(WorldPoint::origin(), 0.0, FRAC_PI_2);
        assert!((camera.forward() - WorldVector::new(1.0, 0.0, 0.0)).norm() < 1e-6);
    }

    #[test]
    fn pitch_is_applied_before_yaw() {
        let camera = Camera::new(WorldPoint::origin(), -FRAC_PI_2, FRAC_PI_2);
        // Pitch of -90 degrees points straight up regardless of yaw.
        assert!((camera.forward() - WorldVector::new(0.0, 1.0, 0.0)).norm() < 1e-6);
    }
}
