use super::{Aabb, FloatType, Ray};

impl Aabb {
    /// Calculates ray intersection with the box using the slab method.
    /// Returns minimum and maximum distance along the ray; the ray intersects
    /// iff `min_t <= max_t` (both may be negative for boxes behind the origin).
    pub fn intersect(&self, ray: &Ray) -> (FloatType, FloatType) {
        // The multiplication is NAN if the ray starts inside a slab bounding plane
        // and is parallel to it. In that case we blend to +-infinity, so that
        // the range along that axis becomes infinite.
        let to_min = (self.min - ray.origin)
            .component_mul(&ray.inv_direction)
            .map(|x| if x.is_nan() { FloatType::NEG_INFINITY } else { x });
        let to_max = (self.max - ray.origin)
            .component_mul(&ray.inv_direction)
            .map(|x| if x.is_nan() { FloatType::INFINITY } else { x });

        let componentwise_min = to_min.zip_map(&to_max, FloatType::min);
        let componentwise_max = to_min.zip_map(&to_max, FloatType::max);

        let min_t = componentwise_min
            .x
            .max(componentwise_min.y)
            .max(componentwise_min.z);
        let max_t = componentwise_max
            .x
            .min(componentwise_max.y)
            .min(componentwise_max.z);

        (min_t, max_t)
    }

    pub fn intersects(&self, ray: &Ray, max_distance: FloatType) -> bool {
        let (min_t, max_t) = self.intersect(ray);
        min_t <= max_t && max_t >= 0.0 && min_t <= max_distance
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::{WorldPoint, WorldVector};
    use assert2::assert;
    use test_case::test_case;

    fn unit_box() -> Aabb {
        Aabb::new(WorldPoint::new(5.0, 5.0, 5.0), WorldPoint::new(10.0, 10.0, 10.0))
    }

    #[test]
    fn hit_through_center() {
        let ray = Ray::new(
            WorldPoint::new(7.5, 7.5, 0.0),
            WorldVector::new(0.0, 0.0, 1.0),
        );
        let (t1, t2) = unit_box().intersect(&ray);
        assert!(t1 == 5.0);
        assert!(t2 == 10.0);
    }

    #[test]
    fn hit_along_edge() {
        let ray = Ray::new(
            WorldPoint::new(5.0, 5.0, 0.0),
            WorldVector::new(0.0, 0.0, 1.0),
        );
        let (t1, t2) = unit_box().intersect(&ray);
        assert!(t1 <= t2);
        assert!(t1 == 5.0);
        assert!(t2 == 10.0);
    }

    /// Rays that lie parallel to one axis and start outside the corresponding
    /// slab must miss.
    #[test_case( 0.0,  7.0,  7.0,   0.0, 1.0, 0.0 ; "low_x_parallel_miss")]
    #[test_case(12.0,  7.0,  7.0,   0.0, 1.0, 0.0 ; "high_x_parallel_miss")]
    #[test_case( 7.0,  0.0,  7.0,   1.0, 0.0, 0.0 ; "low_y_parallel_miss")]
    #[test_case( 7.0, 12.0,  7.0,   1.0, 0.0, 0.0 ; "high_y_parallel_miss")]
    #[test_case( 7.0,  7.0,  0.0,   1.0, 0.0, 0.0 ; "low_z_parallel_miss")]
    #[test_case( 7.0,  7.0, 12.0,   1.0, 0.0, 0.0 ; "high_z_parallel_miss")]
    fn parallel_misses(px: f32, py: f32, pz: f32, dx: f32, dy: f32, dz: f32) {
        let ray = Ray::new(WorldPoint::new(px, py, pz), WorldVector::new(dx, dy, dz));
        let (t1, t2) = unit_box().intersect(&ray);
        assert!(t1 > t2);
    }

    #[test]
    fn behind_origin_is_rejected_by_intersects() {
        let ray = Ray::new(
            WorldPoint::new(7.5, 7.5, 20.0),
            WorldVector::new(0.0, 0.0, 1.0),
        );
        assert!(!unit_box().intersects(&ray, FloatType::INFINITY));
    }
}
