use serde::{Deserialize, Serialize};
use winit::dpi::PhysicalSize;

/// Viewport limits.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportParams {
    /// Cap on the device pixel ratio used for the drawing buffer.
    pub max_pixel_ratio: f32,
}

impl Default for ViewportParams {
    fn default() -> Self {
        Self {
            max_pixel_ratio: 2.0,
        }
    }
}

/// Logical window size plus the display's pixel density.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    width: f32,
    height: f32,
    device_pixel_ratio: f32,
    max_pixel_ratio: f32,
}

impl Viewport {
    /// `width` and `height` are logical units.
    pub fn new(width: f32, height: f32, device_pixel_ratio: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
            device_pixel_ratio: device_pixel_ratio.max(f32::EPSILON),
            max_pixel_ratio: ViewportParams::default().max_pixel_ratio,
        }
    }

    pub fn from_physical(size: PhysicalSize<u32>, scale_factor: f64) -> Self {
        let logical = size.to_logical::<f32>(scale_factor);
        Self::new(logical.width, logical.height, scale_factor as f32)
    }

    pub fn with_params(mut self, params: ViewportParams) -> Self {
        self.max_pixel_ratio = params.max_pixel_ratio;
        self
    }

    /// Applies a new size. Zero sizes (a minimized window) are ignored.
    ///
    /// Returns true when anything changed.
    pub fn resize(&mut self, width: f32, height: f32, device_pixel_ratio: f32) -> bool {
        if width <= 0.0 || height <= 0.0 {
            return false;
        }
        let next = Self {
            width,
            height,
            device_pixel_ratio: device_pixel_ratio.max(f32::EPSILON),
            max_pixel_ratio: self.max_pixel_ratio,
        };
        let changed = next != *self;
        *self = next;
        changed
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    pub fn device_pixel_ratio(&self) -> f32 {
        self.device_pixel_ratio
    }

    /// Device pixel ratio clamped to the configured maximum.
    pub fn pixel_ratio(&self) -> f32 {
        self.device_pixel_ratio.min(self.max_pixel_ratio)
    }

    /// Render target size in pixels, never smaller than 1×1.
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        let ratio = self.pixel_ratio();
        let scale = |v: f32| ((v * ratio).round() as u32).max(1);
        (scale(self.width), scale(self.height))
    }

    /// Window height in physical pixels, the unit pointer events arrive in.
    pub fn physical_height(&self) -> f32 {
        self.height * self.device_pixel_ratio
    }

    pub fn is_compact(&self, breakpoint: f32) -> bool {
        self.width < breakpoint
    }
}
