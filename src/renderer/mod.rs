mod accumulation;
mod evaluator;

pub use accumulation::Accumulator;
pub use evaluator::{Evaluator, EvaluatorError, SoftwareEvaluator};

use std::num::NonZeroU32;

use thiserror::Error;

use crate::geometry::FloatType;

/// How each step's sample relates to the displayed image.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RenderMode {
    /// Blend every new sample into a running average, converging toward a
    /// lower-noise estimate while nothing moves.
    Progressive,
    /// Show the raw current sample. Used while the camera or an object is
    /// being manipulated, trading noise for bounded latency.
    Direct,
}

/// Settings forwarded to the evaluator on every step.
#[derive(Copy, Clone, Debug, bon::Builder)]
pub struct RenderSettings {
    /// Maximum bounce count per ray.
    #[builder(default = 12)]
    pub max_bounces: u32,
    /// Samples requested per pixel per step.
    #[builder(default = NonZeroU32::MIN)]
    pub samples_per_pixel: NonZeroU32,
    /// Controls the field of view.
    #[builder(default = 1.2)]
    pub perspective_slope: FloatType,
    /// Depth of field: distance of the focal plane.
    #[builder(default = 1.0)]
    pub focal_distance: FloatType,
    /// Depth of field: aperture size. Zero disables focal blur.
    #[builder(default = 0.0)]
    pub focal_blur: FloatType,
    /// Anti-aliasing jitter amplitude, derived from the viewport height by
    /// the caller (about one pixel, e.g. 1.1 / height).
    #[builder(default = 0.0)]
    pub blur: FloatType,
}

impl Default for RenderSettings {
    fn default() -> RenderSettings {
        RenderSettings::builder().build()
    }
}

#[derive(Debug, Error)]
pub enum StepError {
    #[error("evaluator failed")]
    Evaluator(#[from] EvaluatorError),
}
