mod building;

use index_vec::IndexVec;

use crate::geometry::Aabb;

index_vec::define_index_type! {
    /// Position of a node in one object's local node arena.
    pub struct NodeIdx = u32;
    IMPL_RAW_CONVERSIONS = true;
}

index_vec::define_index_type! {
    /// Position of a triangle in one object's local triangle array.
    pub struct TriangleIdx = u32;
    IMPL_RAW_CONVERSIONS = true;
}

/// Binary bounding volume hierarchy over one object's triangles.
///
/// Nodes live in a flat arena and reference each other by index; the root is
/// at index 0. An object with no triangles (analytic primitive) has an empty
/// arena.
#[derive(Clone, Debug, Default)]
pub struct Bvh {
    nodes: IndexVec<NodeIdx, Node>,
}

#[derive(Copy, Clone, Debug)]
pub struct Node {
    pub bounds: Aabb,
    pub kind: NodeKind,
}

/// A node is either a leaf referencing exactly one triangle, or an inner
/// node referencing exactly two children. There is no third state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Leaf { triangle: TriangleIdx },
    Inner { left: NodeIdx, right: NodeIdx },
}

impl Bvh {
    pub const ROOT: NodeIdx = NodeIdx::from_raw_unchecked(0);

    pub fn nodes(&self) -> &IndexVec<NodeIdx, Node> {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<&Node> {
        self.nodes.get(Self::ROOT)
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(Self::ROOT, 1usize)];
        if self.nodes.is_empty() {
            return 0;
        }
        while let Some((index, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let NodeKind::Inner { left, right } = self.nodes[index].kind {
                stack.push((left, depth + 1));
                stack.push((right, depth + 1));
            }
        }
        max_depth
    }

    /// Number of leaves, which equals the triangle count of the source mesh.
    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node.kind, NodeKind::Leaf { .. }))
            .count()
    }
}
