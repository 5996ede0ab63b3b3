use log::trace;
use thiserror::Error;

use crate::scene::{Material, Transform};

use super::{
    matrix_columns, FlattenedScene, GpuMaterial, GpuNode, GpuObjectDescriptor, GpuSphere,
    GpuTriangle,
};

/// Allocation budget of the published buffers, fixed at construction time,
/// standing in for the storage actually reserved on the evaluator's device.
#[derive(Copy, Clone, Debug)]
pub struct BufferCapacity {
    pub max_triangles: usize,
    pub max_nodes: usize,
    pub max_objects: usize,
    pub max_spheres: usize,
}

impl Default for BufferCapacity {
    fn default() -> BufferCapacity {
        BufferCapacity {
            max_triangles: 1 << 20,
            max_nodes: 1 << 21,
            max_objects: 1 << 10,
            max_spheres: 1 << 10,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    #[error("{buffer} buffer overflow: scene needs {needed}, capacity is {capacity}")]
    CapacityExceeded {
        buffer: &'static str,
        needed: usize,
        capacity: usize,
    },

    #[error("descriptor slot {0} is not published")]
    InvalidSlot(usize),
}

/// Single owner of the published scene buffers.
///
/// All writes go through [`publish`](Self::publish) (wholesale swap) or the
/// two `patch_*` entry points (one descriptor slot each); readers only ever
/// get shared slices. A publish that would exceed the capacity fails without
/// touching the previously published data.
#[derive(Debug, Default)]
pub struct RenderBuffers {
    capacity: BufferCapacity,

    triangles: Vec<GpuTriangle>,
    nodes: Vec<GpuNode>,
    descriptors: Vec<GpuObjectDescriptor>,
    spheres: Vec<GpuSphere>,
    sphere_slots: Vec<Option<u32>>,
}

impl RenderBuffers {
    pub fn new(capacity: BufferCapacity) -> RenderBuffers {
        RenderBuffers {
            capacity,
            ..RenderBuffers::default()
        }
    }

    /// Replaces the published buffers all at once. The capacity check runs
    /// before anything is written, so a failed publish leaves the previous
    /// buffers valid and in use.
    pub fn publish(&mut self, flattened: FlattenedScene) -> Result<(), BufferError> {
        let check = |buffer, needed, capacity| {
            if needed > capacity {
                Err(BufferError::CapacityExceeded {
                    buffer,
                    needed,
                    capacity,
                })
            } else {
                Ok(())
            }
        };
        check(
            "triangle",
            flattened.triangles.len(),
            self.capacity.max_triangles,
        )?;
        check("node", flattened.nodes.len(), self.capacity.max_nodes)?;
        check(
            "descriptor",
            flattened.descriptors.len(),
            self.capacity.max_objects,
        )?;
        check("sphere", flattened.spheres.len(), self.capacity.max_spheres)?;

        self.triangles = flattened.triangles;
        self.nodes = flattened.nodes;
        self.descriptors = flattened.descriptors;
        self.spheres = flattened.spheres;
        self.sphere_slots = flattened.sphere_slots;
        Ok(())
    }

    /// Writes one object's matrices in place, without touching any other
    /// slot or re-running the builder. Sphere objects additionally get their
    /// world-space center rewritten.
    pub fn patch_transform(
        &mut self,
        slot: usize,
        transform: &Transform,
    ) -> Result<(), BufferError> {
        let descriptor = self
            .descriptors
            .get_mut(slot)
            .ok_or(BufferError::InvalidSlot(slot))?;

        let (local_to_world, world_to_local) = transform.matrices();
        descriptor.local_to_world = matrix_columns(&local_to_world);
        descriptor.world_to_local = matrix_columns(&world_to_local);

        if let Some(sphere) = self.sphere_slots[slot] {
            self.spheres[sphere as usize].center = local_to_world
                .transform_point(&crate::geometry::WorldPoint::origin())
                .coords
                .into();
        }
        trace!("patched transform of slot {slot}");
        Ok(())
    }

    /// Writes one object's material in place.
    pub fn patch_material(&mut self, slot: usize, material: &Material) -> Result<(), BufferError> {
        let descriptor = self
            .descriptors
            .get_mut(slot)
            .ok_or(BufferError::InvalidSlot(slot))?;

        let material = GpuMaterial::from(material);
        descriptor.material = material;
        if let Some(sphere) = self.sphere_slots[slot] {
            self.spheres[sphere as usize].material = material;
        }
        trace!("patched material of slot {slot}");
        Ok(())
    }

    pub fn triangles(&self) -> &[GpuTriangle] {
        &self.triangles
    }

    pub fn nodes(&self) -> &[GpuNode] {
        &self.nodes
    }

    pub fn descriptors(&self) -> &[GpuObjectDescriptor] {
        &self.descriptors
    }

    pub fn spheres(&self) -> &[GpuSphere] {
        &self.spheres
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::flatten::flatten;
    use crate::geometry::{Triangle, WorldPoint, WorldVector};
    use crate::scene::{Geometry, Scene};
    use assert2::{assert, let_assert};

    fn triangle() -> Triangle {
        Triangle::new(
            WorldPoint::new(0.0, 0.0, 0.0),
            WorldPoint::new(1.0, 0.0, 0.0),
            WorldPoint::new(0.0, 1.0, 0.0),
        )
    }

    fn small_scene(triangle_count: usize) -> Scene {
        let mut scene = Scene::new();
        scene.add_object(
            Geometry::Mesh(vec![triangle(); triangle_count]),
            Transform::default(),
            Material::default(),
        );
        scene
    }

    #[test]
    fn publish_and_read_back() {
        let mut buffers = RenderBuffers::new(BufferCapacity::default());
        buffers.publish(flatten(&small_scene(3))).unwrap();

        assert!(buffers.triangles().len() == 3);
        assert!(buffers.descriptors().len() == 1);
        assert!(buffers.nodes().len() == 5);
    }

    #[test]
    fn capacity_failure_keeps_previous_buffers() {
        let mut buffers = RenderBuffers::new(BufferCapacity {
            max_triangles: 4,
            ..BufferCapacity::default()
        });
        buffers.publish(flatten(&small_scene(3))).unwrap();

        let result = buffers.publish(flatten(&small_scene(5)));
        let_assert!(
            Err(BufferError::CapacityExceeded {
                buffer: "triangle",
                needed: 5,
                capacity: 4,
            }) = result
        );

        // The old publish is still fully visible.
        assert!(buffers.triangles().len() == 3);
        assert!(buffers.descriptors().len() == 1);
    }

    #[test]
    fn patch_transform_touches_only_its_slot() {
        let mut scene = small_scene(2);
        scene.add_object(
            Geometry::Mesh(vec![triangle()]),
            Transform::default(),
            Material::default(),
        );
        let mut buffers = RenderBuffers::new(BufferCapacity::default());
        buffers.publish(flatten(&scene)).unwrap();

        let before = buffers.descriptors()[0];
        let moved = Transform::from_translation(WorldVector::new(5.0, 0.0, 0.0));
        buffers.patch_transform(1, &moved).unwrap();

        assert!(buffers.descriptors()[0] == before);
        let patched = buffers.descriptors()[1];
        assert!(patched.local_to_world[3][0] == 5.0);
        // Ranges are untouched by a patch.
        assert!(patched.triangle_offset == 2);
        assert!(patched.triangle_count == 1);
    }

    #[test]
    fn patch_material_updates_sphere_record() {
        let mut scene = Scene::new();
        scene.add_object(
            Geometry::Sphere { radius: 1.0 },
            Transform::default(),
            Material::default(),
        );
        let mut buffers = RenderBuffers::new(BufferCapacity::default());
        buffers.publish(flatten(&scene)).unwrap();

        let red = Material::new(WorldVector::new(1.0, 0.0, 0.0), 0.5, 0.0, 0.0, 0.0, 1.0, 1.0);
        buffers.patch_material(0, &red).unwrap();
        assert!(buffers.spheres()[0].material.color == [1.0, 0.0, 0.0]);
        assert!(buffers.descriptors()[0].material.color == [1.0, 0.0, 0.0]);
    }

    #[test]
    fn patch_out_of_range_is_an_error() {
        let mut buffers = RenderBuffers::new(BufferCapacity::default());
        let result = buffers.patch_transform(0, &Transform::default());
        let_assert!(Err(BufferError::InvalidSlot(0)) = result);
    }
}
