use index_vec::IndexVec;
use log::debug;

use crate::geometry::{Aabb, Triangle};

use super::{Bvh, Node, NodeIdx, NodeKind, TriangleIdx};

struct WorkItem {
    node: NodeIdx,
    members: Vec<TriangleIdx>,
}

impl Bvh {
    /// Builds the hierarchy over the given triangles, deterministic for a
    /// given input order. Zero triangles is a no-op yielding an empty arena;
    /// the splitting loop below never sees an empty member set.
    ///
    /// Splits use the midpoint of the node box's largest extent. This is a
    /// deliberately cheap heuristic; clustered or coplanar geometry routinely
    /// leaves one side empty, which is handled by peeling a single triangle
    /// off instead of splitting. An explicit work stack keeps the worst case
    /// (one peel per level, O(n) depth) from overflowing the call stack.
    pub fn build(triangles: &[Triangle]) -> Bvh {
        let mut nodes = IndexVec::new();

        if triangles.is_empty() {
            return Bvh { nodes };
        }

        let members: Vec<TriangleIdx> = (0..triangles.len() as u32)
            .map(TriangleIdx::from_raw)
            .collect();
        nodes.push(Node {
            bounds: Aabb::from_triangles(triangles),
            kind: PLACEHOLDER,
        });

        let mut stack = vec![WorkItem {
            node: Self::ROOT,
            members,
        }];

        while let Some(WorkItem { node, members }) = stack.pop() {
            if let [triangle] = members[..] {
                nodes[node].kind = NodeKind::Leaf { triangle };
                continue;
            }

            let (side_a, side_b) = split_members(triangles, &nodes[node].bounds, members);

            let member_bounds = |side: &[TriangleIdx]| {
                Aabb::from_triangles(side.iter().map(|i| &triangles[i.index()]))
            };

            let left = nodes.push(Node {
                bounds: member_bounds(&side_a),
                kind: PLACEHOLDER,
            });
            let right = nodes.push(Node {
                bounds: member_bounds(&side_b),
                kind: PLACEHOLDER,
            });
            nodes[node].kind = NodeKind::Inner { left, right };

            stack.push(WorkItem {
                node: right,
                members: side_b,
            });
            stack.push(WorkItem {
                node: left,
                members: side_a,
            });
        }

        let bvh = Bvh { nodes };
        debug!(
            "built hierarchy: {} triangles, {} nodes, depth {}",
            triangles.len(),
            bvh.node_count(),
            bvh.depth()
        );
        bvh
    }
}

/// Overwritten as soon as the owning work item is processed.
const PLACEHOLDER: NodeKind = NodeKind::Leaf {
    triangle: TriangleIdx::from_raw_unchecked(0),
};

/// Partitions members by centroid against the midpoint plane of the node
/// box's largest extent. If the plane split leaves either side empty, it is
/// abandoned: the first remaining triangle becomes a forced singleton on
/// side A and everything else goes to side B, guaranteeing forward progress.
fn split_members(
    triangles: &[Triangle],
    bounds: &Aabb,
    members: Vec<TriangleIdx>,
) -> (Vec<TriangleIdx>, Vec<TriangleIdx>) {
    let axis = bounds.largest_axis();
    let plane = bounds.midpoint(axis);

    let (side_a, side_b): (Vec<_>, Vec<_>) = members
        .into_iter()
        .partition(|i| triangles[i.index()].centroid()[axis as usize] < plane);

    if side_a.is_empty() || side_b.is_empty() {
        // Partition preserves relative order, so whichever side got everything
        // still holds the members in their original order.
        let mut rest = if side_a.is_empty() { side_b } else { side_a };
        let first = rest.remove(0);
        (vec![first], rest)
    } else {
        (side_a, side_b)
    }
}
