use nalgebra::{Matrix4, Rotation3, Vector3};

use crate::geometry::{FloatType, WorldMatrix, WorldVector};

/// Object-to-world placement: translation, euler rotation (radians, applied
/// as yaw around Y after pitch around X after roll around Z) and per-axis
/// scale. Scale components must be non-zero so that the inverse exists.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Transform {
    pub translation: WorldVector,
    pub rotation: WorldVector,
    pub scale: WorldVector,
}

impl Transform {
    pub fn new(translation: WorldVector, rotation: WorldVector, scale: WorldVector) -> Transform {
        Transform {
            translation,
            rotation,
            scale,
        }
    }

    pub fn from_translation(translation: WorldVector) -> Transform {
        Transform {
            translation,
            ..Transform::default()
        }
    }

    fn rotation_matrix(&self) -> Rotation3<FloatType> {
        Rotation3::from_axis_angle(&Vector3::y_axis(), self.rotation.y)
            * Rotation3::from_axis_angle(&Vector3::x_axis(), self.rotation.x)
            * Rotation3::from_axis_angle(&Vector3::z_axis(), self.rotation.z)
    }

    pub fn local_to_world(&self) -> WorldMatrix {
        Matrix4::new_translation(&self.translation)
            * self.rotation_matrix().to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&self.scale)
    }

    /// Analytic inverse of `local_to_world`, composed in reverse order.
    pub fn world_to_local(&self) -> WorldMatrix {
        Matrix4::new_nonuniform_scaling(&self.scale.map(FloatType::recip))
            * self.rotation_matrix().inverse().to_homogeneous()
            * Matrix4::new_translation(&-self.translation)
    }

    pub fn matrices(&self) -> (WorldMatrix, WorldMatrix) {
        (self.local_to_world(), self.world_to_local())
    }
}

impl Default for Transform {
    fn default() -> Transform {
        Transform {
            translation: WorldVector::zeros(),
            rotation: WorldVector::zeros(),
            scale: WorldVector::new(1.0, 1.0, 1.0),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::WorldPoint;
    use assert2::assert;
    use test_strategy::proptest;

    fn arb_transform() -> proptest::strategy::BoxedStrategy<Transform> {
        use crate::geometry::test::simple_float;
        use proptest::prelude::*;

        (
            (simple_float(), simple_float(), simple_float()),
            (-1.5f32..1.5, -1.5f32..1.5, -1.5f32..1.5),
            (0.1f32..4.0, 0.1f32..4.0, 0.1f32..4.0),
        )
            .prop_map(|(t, r, s)| {
                Transform::new(
                    WorldVector::new(t.0, t.1, t.2),
                    WorldVector::new(r.0, r.1, r.2),
                    WorldVector::new(s.0, s.1, s.2),
                )
            })
            .boxed()
    }

    #[test]
    fn default_is_identity() {
        let (forward, inverse) = Transform::default().matrices();
        assert!(forward == Matrix4::identity());
        assert!(inverse == Matrix4::identity());
    }

    #[proptest]
    fn world_to_local_inverts_local_to_world(#[strategy(arb_transform())] transform: Transform) {
        let (forward, inverse) = transform.matrices();
        let point = WorldPoint::new(1.0, -2.0, 3.0);
        let round_trip = inverse.transform_point(&forward.transform_point(&point));
        assert!((round_trip - point).norm() < 1e-3);
    }

    #[test]
    fn translation_moves_points() {
        let transform = Transform::from_translation(WorldVector::new(1.0, 2.0, 3.0));
        let moved = transform
            .local_to_world()
            .transform_point(&WorldPoint::origin());
        assert!(moved == WorldPoint::new(1.0, 2.0, 3.0));
    }
}
