use log::debug;
use thiserror::Error;

use crate::camera::Camera;
use crate::flatten::{flatten, BufferCapacity, BufferError, RenderBuffers};
use crate::framebuffer::Framebuffer;
use crate::geometry::ScreenSize;
use crate::renderer::{Accumulator, Evaluator, RenderMode, RenderSettings, StepError};
use crate::scene::{Geometry, Material, ObjectId, Scene, SceneError, Transform};

#[derive(Debug, Error)]
pub enum TracerError {
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Buffers(#[from] BufferError),
    #[error(transparent)]
    Step(#[from] StepError),
}

/// Ties the scene, the published buffers, the camera and the accumulation
/// controller together behind one mutation API.
///
/// Every mutation keeps the published buffers in sync with the scene and
/// invalidates the accumulated image; a failed mutation leaves all three
/// untouched.
pub struct Tracer<E> {
    scene: Scene,
    buffers: RenderBuffers,
    accumulator: Accumulator,
    camera: Camera,
    settings: RenderSettings,
    evaluator: E,
}

impl<E: Evaluator> Tracer<E> {
    pub fn new(evaluator: E, resolution: ScreenSize) -> Tracer<E> {
        Self::with_capacity(evaluator, resolution, BufferCapacity::default())
    }

    pub fn with_capacity(
        evaluator: E,
        resolution: ScreenSize,
        capacity: BufferCapacity,
    ) -> Tracer<E> {
        Tracer {
            scene: Scene::new(),
            buffers: RenderBuffers::new(capacity),
            accumulator: Accumulator::new(resolution),
            camera: Camera::default(),
            settings: RenderSettings::default(),
            evaluator,
        }
    }

    /// Builds the object's hierarchy, republishes the buffers and returns a
    /// stable handle. If the published capacity would be exceeded the object
    /// is backed out of the scene again and nothing changes.
    pub fn add_object(
        &mut self,
        geometry: Geometry,
        transform: Transform,
        material: Material,
    ) -> Result<ObjectId, TracerError> {
        let id = self.scene.add_object(geometry, transform, material);
        if let Err(error) = self.buffers.publish(flatten(&self.scene)) {
            debug!("publish failed, rolling back {id:?}: {error}");
            self.scene
                .remove_object(id)
                .unwrap_or_else(|_| unreachable!("object was just inserted"));
            return Err(error.into());
        }
        self.accumulator.mark_dirty();
        Ok(id)
    }

    pub fn remove_object(&mut self, id: ObjectId) -> Result<(), TracerError> {
        self.scene.remove_object(id)?;
        // Shrinking cannot exceed a capacity that the old contents fit.
        self.buffers.publish(flatten(&self.scene))?;
        self.accumulator.mark_dirty();
        Ok(())
    }

    /// Moves an object without a full rebuild: the scene is updated and the
    /// published descriptor (and sphere record, if any) is patched in place.
    pub fn update_transform(
        &mut self,
        id: ObjectId,
        transform: Transform,
    ) -> Result<(), TracerError> {
        let slot = self.scene.slot_of(id)?;
        self.scene.get_mut(id)?.set_transform(transform);
        self.buffers.patch_transform(slot, &transform)?;
        self.accumulator.mark_dirty();
        Ok(())
    }

    pub fn update_material(&mut self, id: ObjectId, material: Material) -> Result<(), TracerError> {
        let slot = self.scene.slot_of(id)?;
        self.scene.get_mut(id)?.set_material(material);
        self.buffers.patch_material(slot, &material)?;
        self.accumulator.mark_dirty();
        Ok(())
    }

    pub fn set_camera(&mut self, camera: Camera) {
        if camera != self.camera {
            self.camera = camera;
            self.accumulator.mark_dirty();
        }
    }

    pub fn set_settings(&mut self, settings: RenderSettings) {
        self.settings = settings;
        self.accumulator.mark_dirty();
    }

    pub fn set_mode(&mut self, mode: RenderMode) {
        self.accumulator.set_mode(mode);
    }

    pub fn set_resolution(&mut self, resolution: ScreenSize) {
        self.accumulator.set_resolution(resolution);
    }

    pub fn mark_dirty(&mut self) {
        self.accumulator.mark_dirty();
    }

    /// Renders one sample frame and folds it into the displayed image.
    pub fn step(&mut self) -> Result<&Framebuffer, TracerError> {
        let image = self.accumulator.step(
            &mut self.evaluator,
            &self.buffers,
            &self.camera,
            &self.settings,
        )?;
        Ok(image)
    }

    pub fn image(&self) -> &Framebuffer {
        self.accumulator.image()
    }

    pub fn export_image(&self) -> image::RgbaImage {
        self.accumulator.image().to_image()
    }

    pub fn sample_count(&self) -> u32 {
        self.accumulator.sample_count()
    }

    pub fn mode(&self) -> RenderMode {
        self.accumulator.mode()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }
}
