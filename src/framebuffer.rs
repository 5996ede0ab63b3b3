use crate::geometry::ScreenSize;

pub type Rgba = rgb::RGBA<f32>;

/// Linear f32 RGBA pixel target. Used both for single evaluator samples and
/// for the running accumulated average.
#[derive(Clone, Debug)]
pub struct Framebuffer {
    size: ScreenSize,
    pixels: Vec<Rgba>,
}

impl Framebuffer {
    pub fn new(size: ScreenSize) -> Framebuffer {
        Framebuffer {
            size,
            pixels: vec![Rgba::new(0.0, 0.0, 0.0, 0.0); (size.x * size.y) as usize],
        }
    }

    pub fn size(&self) -> ScreenSize {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.x
    }

    pub fn height(&self) -> u32 {
        self.size.y
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        self.pixels[(y * self.size.x + x) as usize]
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, value: Rgba) {
        self.pixels[(y * self.size.x + x) as usize] = value;
    }

    pub fn clear(&mut self) {
        self.pixels.fill(Rgba::new(0.0, 0.0, 0.0, 0.0));
    }

    /// Blends one new sample frame into the running average:
    /// `new = (old * n + sample) / (n + 1)`. With `n == 0` this overwrites
    /// the previous content completely.
    ///
    /// Panics if the sizes differ; the accumulation controller keeps both
    /// buffers at the viewport resolution.
    pub fn blend_sample(&mut self, sample: &Framebuffer, n: u32) {
        assert2::assert!(self.size == sample.size);
        let n = n as f32;
        let scale = 1.0 / (n + 1.0);
        for (average, new) in self.pixels.iter_mut().zip(sample.pixels.iter()) {
            *average = (*average * n + *new) * scale;
        }
    }

    pub fn copy_from(&mut self, other: &Framebuffer) {
        assert2::assert!(self.size == other.size);
        self.pixels.copy_from_slice(&other.pixels);
    }

    /// Maps the 0-1 f32 pixels to an 8 bit image, clamping out-of-range
    /// values. Encoding to a file format stays with the caller.
    pub fn to_image(&self) -> image::RgbaImage {
        image::RgbaImage::from_fn(self.size.x, self.size.y, |x, y| {
            let color = self.pixel(x, y);
            image::Rgba([
                (color.r * 255.0).round().clamp(0.0, 255.0) as u8,
                (color.g * 255.0).round().clamp(0.0, 255.0) as u8,
                (color.b * 255.0).round().clamp(0.0, 255.0) as u8,
                (color.a * 255.0).round().clamp(0.0, 255.0) as u8,
            ])
        })
    }
}
