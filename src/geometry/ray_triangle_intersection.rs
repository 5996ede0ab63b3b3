use super::{FloatType, Ray, Triangle};

#[derive(Copy, Clone, Debug)]
pub struct TriangleHit {
    pub t: FloatType,
    pub u: FloatType,
    pub v: FloatType,
}

impl Triangle {
    /// Calculates ray intersection with the (two sided) triangle.
    /// Returns distance along the ray and barycentric uv coordinates.
    /// Adapted from https://en.wikipedia.org/wiki/M%C3%B6ller%E2%80%93Trumbore_intersection_algorithm#Rust_implementation
    pub fn intersect(&self, ray: &Ray) -> Option<TriangleHit> {
        let [e1, e2] = self.edges();

        let ray_cross_e2 = ray.direction.cross(&e2);
        let det = e1.dot(&ray_cross_e2);

        let inv_det = 1.0 / det; // May be infinite
        let s = ray.origin - self[0];
        let u = inv_det * s.dot(&ray_cross_e2);

        let s_cross_e1 = s.cross(&e1);
        let v = inv_det * ray.direction.dot(&s_cross_e1);
        let t = inv_det * e2.dot(&s_cross_e1);

        if u >= 0.0 && v >= 0.0 && u + v <= 1.0 && t.is_finite() {
            Some(TriangleHit { t, u, v })
        } else {
            None
        }
    }
}
