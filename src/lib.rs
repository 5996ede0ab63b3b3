mod camera;
pub mod flatten;
mod framebuffer;
pub mod geometry;
mod renderer;
pub mod scene;
mod tracer;

pub use camera::Camera;
pub use flatten::{flatten, BufferCapacity, BufferError, FlattenedScene, RenderBuffers};
pub use framebuffer::{Framebuffer, Rgba};
pub use renderer::{
    Accumulator, Evaluator, EvaluatorError, RenderMode, RenderSettings, SoftwareEvaluator,
    StepError,
};
pub use scene::{
    Geometry, Material, MeshData, MeshLoadError, ObjectId, Scene, SceneError, Transform,
};
pub use tracer::{Tracer, TracerError};
