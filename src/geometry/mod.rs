mod aabb;
mod ray_box_intersection;
mod ray_triangle_intersection;
mod triangle;

pub use aabb::{Aabb, Axis};
pub use ray_triangle_intersection::TriangleHit;
pub use triangle::Triangle;

pub type FloatType = f32;

pub const EPSILON: FloatType = 1e-6;

pub type WorldPoint = nalgebra::Point3<FloatType>;
pub type WorldVector = nalgebra::Vector3<FloatType>;
pub type WorldMatrix = nalgebra::Matrix4<FloatType>;

pub type ScreenSize = nalgebra::Vector2<u32>;

#[derive(Copy, Clone, Debug)]
pub struct Ray {
    pub origin: WorldPoint,
    /// Normalized direction of the ray
    pub direction: WorldVector,

    /// Componentwise inverse of the ray direction.
    /// Zeros in direction get turned into positive infinity regardless of the sign of the zero.
    pub inv_direction: WorldVector,
}

impl Ray {
    pub fn new(origin: WorldPoint, direction: WorldVector) -> Ray {
        let direction = direction.normalize();
        let inv_direction = direction.map(|x| if x == 0.0 { f32::INFINITY } else { 1.0 / x });

        Ray {
            origin,
            direction,
            inv_direction,
        }
    }

    pub fn point_at(&self, distance: FloatType) -> WorldPoint {
        self.origin + self.direction * distance
    }

    /// Ray transformed by a homogeneous matrix. The direction is re-normalized,
    /// so distances along the transformed ray are in the target space.
    pub fn transformed(&self, matrix: &WorldMatrix) -> Ray {
        let origin = matrix.transform_point(&self.origin);
        let direction = matrix.transform_vector(&self.direction);
        Ray::new(origin, direction)
    }
}
