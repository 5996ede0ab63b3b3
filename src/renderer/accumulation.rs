use log::debug;

use crate::camera::Camera;
use crate::flatten::RenderBuffers;
use crate::framebuffer::Framebuffer;
use crate::geometry::ScreenSize;

use super::{Evaluator, RenderMode, RenderSettings, StepError};

/// Progressive accumulation controller.
///
/// Owns the sample count and the dirty flag; any relevant mutation marks it
/// dirty through [`mark_dirty`](Self::mark_dirty), and the reset happens on
/// the next successful step, before the fresh sample is ever blended. A
/// failed step leaves the count and the flag exactly as they were, so
/// retrying is safe.
pub struct Accumulator {
    mode: RenderMode,
    sample_count: u32,
    dirty: bool,

    average: Framebuffer,
    scratch: Framebuffer,
}

impl Accumulator {
    pub fn new(resolution: ScreenSize) -> Accumulator {
        Accumulator {
            mode: RenderMode::Progressive,
            sample_count: 0,
            // Nothing has been rendered yet, so the first step must start
            // from scratch.
            dirty: true,
            average: Framebuffer::new(resolution),
            scratch: Framebuffer::new(resolution),
        }
    }

    /// Idempotent: the accumulated state is discarded once, on the next step.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Changing mode invalidates the accumulated state. Entering Direct mode
    /// forces the reset even when the mode does not change.
    pub fn set_mode(&mut self, mode: RenderMode) {
        if mode != self.mode || mode == RenderMode::Direct {
            self.dirty = true;
        }
        self.mode = mode;
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The current accumulated result, independent of stepping.
    pub fn image(&self) -> &Framebuffer {
        &self.average
    }

    pub fn set_resolution(&mut self, resolution: ScreenSize) {
        if resolution != self.average.size() {
            self.average = Framebuffer::new(resolution);
            self.scratch = Framebuffer::new(resolution);
            self.dirty = true;
        }
    }

    /// Runs one evaluator pass and folds the result into the displayed image.
    ///
    /// The evaluator writes into a scratch buffer and never sees the running
    /// average, so a pending reset only commits after the pass succeeds:
    /// stale samples cannot leak into a new view, and a failed pass changes
    /// nothing observable.
    pub fn step(
        &mut self,
        evaluator: &mut dyn Evaluator,
        buffers: &RenderBuffers,
        camera: &Camera,
        settings: &RenderSettings,
    ) -> Result<&Framebuffer, StepError> {
        let sample_index = if self.dirty { 0 } else { self.sample_count };

        evaluator
            .evaluate(buffers, camera, settings, sample_index, &mut self.scratch)
            .map_err(StepError::Evaluator)?;

        if self.dirty {
            debug!("accumulation reset (was {} samples)", self.sample_count);
            self.sample_count = 0;
            self.dirty = false;
        }

        match self.mode {
            // With sample_count == 0 the blend overwrites the stale average.
            RenderMode::Progressive => self.average.blend_sample(&self.scratch, self.sample_count),
            RenderMode::Direct => self.average.copy_from(&self.scratch),
        }
        self.sample_count += 1;

        Ok(&self.average)
    }
}
