use std::ops::{Index, IndexMut};

use super::{FloatType, WorldPoint, WorldVector};

/// Three vertex positions. Immutable once created; owned by the object
/// whose mesh produced it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Triangle([WorldPoint; 3]);

impl Triangle {
    pub fn new(a: WorldPoint, b: WorldPoint, c: WorldPoint) -> Triangle {
        Triangle([a, b, c])
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorldPoint> {
        self.0.iter()
    }

    pub fn centroid(&self) -> WorldPoint {
        WorldPoint::from(
            self.0.iter().map(|p| p.coords).sum::<WorldVector>() / self.0.len() as FloatType,
        )
    }

    /// Edge vectors, coming from self[0]
    pub fn edges(&self) -> [WorldVector; 2] {
        [self.0[1] - self.0[0], self.0[2] - self.0[0]]
    }

    /// Normal vector of the triangle, not normalized.
    pub fn normal(&self) -> WorldVector {
        let [e1, e2] = self.edges();
        e1.cross(&e2)
    }
}

impl Index<usize> for Triangle {
    type Output = WorldPoint;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl IndexMut<usize> for Triangle {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}
