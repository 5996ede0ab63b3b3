pub mod bvh;
mod material;
mod mesh;
mod transform;

pub use material::Material;
pub use mesh::{MeshData, MeshLoadError};
pub use transform::Transform;

use indexmap::IndexMap;
use log::debug;
use thiserror::Error;

use crate::geometry::{FloatType, Triangle};

use bvh::Bvh;

/// Stable handle to an object in the scene. Handles stay valid across
/// insertions and removals of other objects; a removed object's handle is
/// never reused.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectId(u32);

/// Geometry accepted by [`Scene::add_object`]: a triangle mesh or an
/// analytic primitive (which carries no triangles and no hierarchy).
#[derive(Clone, Debug)]
pub enum Geometry {
    Mesh(Vec<Triangle>),
    Sphere { radius: FloatType },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("unknown object handle {0:?}")]
    UnknownObject(ObjectId),
}

/// One renderable object: its triangles (empty for analytic primitives), the
/// hierarchy built over them, a placement and a material. The triangle list
/// and hierarchy are immutable once built; transform and material mutate in
/// place.
#[derive(Clone, Debug)]
pub struct SceneObject {
    triangles: Vec<Triangle>,
    bvh: Bvh,
    sphere_radius: Option<FloatType>,

    transform: Transform,
    material: Material,
}

impl SceneObject {
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    pub fn sphere_radius(&self) -> Option<FloatType> {
        self.sphere_radius
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }
}

/// Ordered collection of scene objects. Iteration order is insertion order,
/// which is also the order the flattener packs objects in.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    objects: IndexMap<ObjectId, SceneObject>,
    next_id: u32,
}

impl Scene {
    pub fn new() -> Scene {
        Scene::default()
    }

    /// Builds the hierarchy for the geometry and appends the object.
    pub fn add_object(
        &mut self,
        geometry: Geometry,
        transform: Transform,
        material: Material,
    ) -> ObjectId {
        let (triangles, sphere_radius) = match geometry {
            Geometry::Mesh(triangles) => (triangles, None),
            Geometry::Sphere { radius } => (Vec::new(), Some(radius)),
        };
        let bvh = Bvh::build(&triangles);

        let id = ObjectId(self.next_id);
        self.next_id += 1;
        debug!(
            "added object {:?}: {} triangles, {} nodes",
            id,
            triangles.len(),
            bvh.node_count()
        );
        self.objects.insert(
            id,
            SceneObject {
                triangles,
                bvh,
                sphere_radius,
                transform,
                material,
            },
        );
        id
    }

    /// Removes the object, preserving the insertion order of the rest.
    pub fn remove_object(&mut self, id: ObjectId) -> Result<SceneObject, SceneError> {
        self.objects
            .shift_remove(&id)
            .ok_or(SceneError::UnknownObject(id))
    }

    pub fn get(&self, id: ObjectId) -> Result<&SceneObject, SceneError> {
        self.objects.get(&id).ok_or(SceneError::UnknownObject(id))
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Result<&mut SceneObject, SceneError> {
        self.objects
            .get_mut(&id)
            .ok_or(SceneError::UnknownObject(id))
    }

    /// Insertion-order position of the object, which equals its descriptor
    /// slot in the currently flattened buffers.
    pub fn slot_of(&self, id: ObjectId) -> Result<usize, SceneError> {
        self.objects
            .get_index_of(&id)
            .ok_or(SceneError::UnknownObject(id))
    }

    /// Position of the object among the scene's analytic spheres, if it is
    /// one. Mirrors the order the flattener emits sphere records in.
    pub fn sphere_slot_of(&self, id: ObjectId) -> Result<Option<usize>, SceneError> {
        let slot = self.slot_of(id)?;
        let object = &self.objects[slot];
        if object.sphere_radius.is_none() {
            return Ok(None);
        }
        Ok(Some(
            self.objects
                .values()
                .take(slot)
                .filter(|o| o.sphere_radius.is_some())
                .count(),
        ))
    }

    pub fn objects(&self) -> impl ExactSizeIterator<Item = &SceneObject> {
        self.objects.values()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
