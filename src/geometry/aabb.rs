use super::{FloatType, Triangle, WorldPoint, WorldVector};

/// Split axis selection order doubles as the tie breaking order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
}

/// Axis aligned bounding box.
///
/// The empty box is represented by +inf/-inf corners, so that growing it by
/// any point produces a valid box around that point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    pub min: WorldPoint,
    pub max: WorldPoint,
}

impl Aabb {
    pub fn new(min: WorldPoint, max: WorldPoint) -> Aabb {
        Aabb { min, max }
    }

    pub fn empty() -> Aabb {
        Aabb {
            min: WorldPoint::new(
                FloatType::INFINITY,
                FloatType::INFINITY,
                FloatType::INFINITY,
            ),
            max: WorldPoint::new(
                FloatType::NEG_INFINITY,
                FloatType::NEG_INFINITY,
                FloatType::NEG_INFINITY,
            ),
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a WorldPoint>) -> Aabb {
        let mut result = Aabb::empty();
        for point in points {
            result.grow_to_include(point);
        }
        result
    }

    pub fn from_triangles<'a>(triangles: impl IntoIterator<Item = &'a Triangle>) -> Aabb {
        let mut result = Aabb::empty();
        for triangle in triangles {
            result.grow_to_include_triangle(triangle);
        }
        result
    }

    pub fn grow_to_include(&mut self, point: &WorldPoint) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    pub fn grow_to_include_triangle(&mut self, triangle: &Triangle) {
        for point in triangle.iter() {
            self.grow_to_include(point);
        }
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    pub fn size(&self) -> WorldVector {
        self.max - self.min
    }

    pub fn center(&self) -> WorldPoint {
        WorldPoint::from((self.min.coords + self.max.coords) / 2.0)
    }

    pub fn contains(&self, point: &WorldPoint) -> bool {
        point.x >= self.min.x
            && point.y >= self.min.y
            && point.z >= self.min.z
            && point.x <= self.max.x
            && point.y <= self.max.y
            && point.z <= self.max.z
    }

    /// Axis with the largest extent, ties broken in X, Y, Z order.
    pub fn largest_axis(&self) -> Axis {
        let size = self.size();
        if size.x >= size.y && size.x >= size.z {
            Axis::X
        } else if size.y >= size.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    /// Coordinate of the box center along the given axis.
    pub fn midpoint(&self, axis: Axis) -> FloatType {
        (self.min[axis as usize] + self.max[axis as usize]) / 2.0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert2::assert;
    use test_case::test_case;

    #[test]
    fn empty_grows_to_single_point() {
        let mut b = Aabb::empty();
        let p = WorldPoint::new(1.0, -2.0, 3.0);
        b.grow_to_include(&p);
        assert!(b.min == p);
        assert!(b.max == p);
    }

    #[test]
    fn grow_to_include_triangle_covers_all_vertices() {
        let t = Triangle::new(
            WorldPoint::new(0.0, 0.0, 0.0),
            WorldPoint::new(1.0, 2.0, 0.0),
            WorldPoint::new(-1.0, 0.5, 3.0),
        );
        let mut b = Aabb::empty();
        b.grow_to_include_triangle(&t);
        for p in t.iter() {
            assert!(b.contains(p));
        }
        assert!(b.min == WorldPoint::new(-1.0, 0.0, 0.0));
        assert!(b.max == WorldPoint::new(1.0, 2.0, 3.0));
    }

    #[test_case(5.0, 1.0, 1.0, Axis::X; "x_largest")]
    #[test_case(1.0, 5.0, 1.0, Axis::Y; "y_largest")]
    #[test_case(1.0, 1.0, 5.0, Axis::Z; "z_largest")]
    #[test_case(2.0, 2.0, 2.0, Axis::X; "all_tied_prefers_x")]
    #[test_case(1.0, 2.0, 2.0, Axis::Y; "yz_tied_prefers_y")]
    fn largest_axis(x: f32, y: f32, z: f32, expected: Axis) {
        let b = Aabb::new(WorldPoint::origin(), WorldPoint::new(x, y, z));
        assert!(b.largest_axis() == expected);
    }

    #[test]
    fn midpoint_is_extent_center() {
        let b = Aabb::new(WorldPoint::new(-1.0, 0.0, 2.0), WorldPoint::new(3.0, 4.0, 6.0));
        assert!(b.midpoint(Axis::X) == 1.0);
        assert!(b.midpoint(Axis::Y) == 2.0);
        assert!(b.midpoint(Axis::Z) == 4.0);
    }

    #[test]
    fn union_covers_both() {
        let a = Aabb::new(WorldPoint::new(0.0, 0.0, 0.0), WorldPoint::new(1.0, 1.0, 1.0));
        let b = Aabb::new(WorldPoint::new(-1.0, 0.5, 0.0), WorldPoint::new(0.5, 2.0, 1.0));
        let u = a.union(&b);
        assert!(u.min == WorldPoint::new(-1.0, 0.0, 0.0));
        assert!(u.max == WorldPoint::new(1.0, 2.0, 1.0));
    }
}
