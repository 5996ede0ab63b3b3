mod buffers;

pub use buffers::{BufferCapacity, BufferError, RenderBuffers};

use bytemuck::{Pod, Zeroable};
use log::debug;

use crate::geometry::{Triangle, WorldMatrix, WorldPoint};
use crate::scene::bvh::{Node, NodeKind};
use crate::scene::{Material, Scene};

/// Triangle record in the layout the evaluator consumes: three homogeneous
/// vertex positions, 16 byte aligned each.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuTriangle {
    pub p: [[f32; 4]; 3],
}

/// Hierarchy node record. `triangle_index` is set (and both children are -1)
/// exactly on leaves; inner nodes have both children set and -1 for the
/// triangle. All three indices are object-local; the evaluator offsets them
/// by the owning descriptor's ranges.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuNode {
    pub min: [f32; 3],
    _pad0: f32,
    pub max: [f32; 3],
    _pad1: f32,
    pub triangle_index: i32,
    pub child_a: i32,
    pub child_b: i32,
    _pad2: i32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuMaterial {
    pub color: [f32; 3],
    pub roughness: f32,
    pub emission_color: [f32; 3],
    pub emission_strength: f32,
    pub absorb_color: [f32; 3],
    pub absorption_strength: f32,
    pub emission_scattering_index: f32,
    pub refractive_index: f32,
    pub reflective_index: f32,
    _pad: f32,
}

/// Per-object range descriptor. The matrices are column-major. The ranges
/// index the global triangle and node arrays, are non-overlapping and follow
/// object insertion order; both counts are zero for analytic primitives.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuObjectDescriptor {
    pub local_to_world: [[f32; 4]; 4],
    pub world_to_local: [[f32; 4]; 4],
    pub triangle_offset: u32,
    pub triangle_count: u32,
    pub node_offset: u32,
    pub node_count: u32,
    pub material: GpuMaterial,
}

/// Analytic sphere record, world-space center baked from the transform.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuSphere {
    pub center: [f32; 3],
    pub radius: f32,
    pub material: GpuMaterial,
}

impl From<&Triangle> for GpuTriangle {
    fn from(triangle: &Triangle) -> GpuTriangle {
        let h = |p: &WorldPoint| [p.x, p.y, p.z, 1.0];
        GpuTriangle {
            p: [h(&triangle[0]), h(&triangle[1]), h(&triangle[2])],
        }
    }
}

impl From<&Node> for GpuNode {
    fn from(node: &Node) -> GpuNode {
        let (triangle_index, child_a, child_b) = match node.kind {
            NodeKind::Leaf { triangle } => (triangle.raw() as i32, -1, -1),
            NodeKind::Inner { left, right } => (-1, left.raw() as i32, right.raw() as i32),
        };
        GpuNode {
            min: node.bounds.min.coords.into(),
            _pad0: 0.0,
            max: node.bounds.max.coords.into(),
            _pad1: 0.0,
            triangle_index,
            child_a,
            child_b,
            _pad2: 0,
        }
    }
}

impl From<&Material> for GpuMaterial {
    fn from(material: &Material) -> GpuMaterial {
        GpuMaterial {
            color: material.color.into(),
            roughness: material.roughness,
            emission_color: material.emission_color.into(),
            emission_strength: material.emission_strength,
            absorb_color: material.absorb_color.into(),
            absorption_strength: material.absorption_strength,
            emission_scattering_index: material.emission_scattering_index,
            refractive_index: material.refractive_index,
            reflective_index: material.reflective_index,
            _pad: 0.0,
        }
    }
}

pub(crate) fn matrix_columns(matrix: &WorldMatrix) -> [[f32; 4]; 4] {
    (*matrix).into()
}

/// All objects' geometry and hierarchies packed into contiguous arrays, plus
/// one descriptor per object. Produced by [`flatten`], consumed through
/// [`RenderBuffers::publish`].
#[derive(Clone, Debug, Default)]
pub struct FlattenedScene {
    pub triangles: Vec<GpuTriangle>,
    pub nodes: Vec<GpuNode>,
    pub descriptors: Vec<GpuObjectDescriptor>,
    pub spheres: Vec<GpuSphere>,

    /// Sphere record position for each descriptor slot, None for meshes.
    pub sphere_slots: Vec<Option<u32>>,
}

/// Full rebuild: concatenates every object's triangle and node arrays in
/// insertion order, tracking running offsets into one descriptor per object.
pub fn flatten(scene: &Scene) -> FlattenedScene {
    let mut flattened = FlattenedScene::default();

    for object in scene.objects() {
        let (local_to_world, world_to_local) = object.transform().matrices();
        let material = GpuMaterial::from(object.material());

        let descriptor = GpuObjectDescriptor {
            local_to_world: matrix_columns(&local_to_world),
            world_to_local: matrix_columns(&world_to_local),
            triangle_offset: flattened.triangles.len() as u32,
            triangle_count: object.triangles().len() as u32,
            node_offset: flattened.nodes.len() as u32,
            node_count: object.bvh().node_count() as u32,
            material,
        };
        flattened.descriptors.push(descriptor);

        flattened
            .triangles
            .extend(object.triangles().iter().map(GpuTriangle::from));
        flattened
            .nodes
            .extend(object.bvh().nodes().iter().map(GpuNode::from));

        if let Some(radius) = object.sphere_radius() {
            flattened.sphere_slots.push(Some(flattened.spheres.len() as u32));
            flattened.spheres.push(GpuSphere {
                center: local_to_world
                    .transform_point(&WorldPoint::origin())
                    .coords
                    .into(),
                radius,
                material,
            });
        } else {
            flattened.sphere_slots.push(None);
        }
    }

    debug!(
        "flattened {} objects: {} triangles, {} nodes, {} spheres",
        flattened.descriptors.len(),
        flattened.triangles.len(),
        flattened.nodes.len(),
        flattened.spheres.len()
    );
    flattened
}
