//! Application state that lives for the whole run, and the per-frame tick.
//!
//! [`SceneContext`] owns everything the frame loop touches except the window
//! and the GPU: the scene, its CPU-side resources, the camera rig, the
//! animation director and the viewport. Nothing in here needs a device, so
//! the whole demo can be driven headlessly.

use std::fmt;
use std::time::{Duration, Instant};

use image::RgbaImage;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::assets::AssetEvent;
use crate::config::DemoConfig;
use crate::director::AnimationDirector;
use crate::ecs::TextureId;
use crate::error::Result;
use crate::font::Font;
use crate::geometry::MeshStore;
use crate::input::Input;
use crate::material::{ColorBinding, Materials};
use crate::rig::CameraRig;
use crate::scene::{BuiltScene, Scene, SceneBuilder};
use crate::texture::TextureStore;
use crate::viewport::Viewport;

/// Font loading progress, shown in the control panel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FontStatus {
    #[default]
    Loading,
    Ready { family: String },
    Failed(String),
}

impl fmt::Display for FontStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontStatus::Loading => f.write_str("loading font..."),
            FontStatus::Ready { family } => write!(f, "font: {family}"),
            FontStatus::Failed(reason) => write!(f, "font failed: {reason}"),
        }
    }
}

/// What one tick did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Entities the spin touched.
    pub rotated: usize,
    /// Tweens that ended this frame.
    pub finished_tweens: usize,
    pub camera_moved: bool,
}

/// Frame delta with lag smoothing.
///
/// A gap longer than `lag_threshold` (a stalled or hidden window) is replaced
/// by `adjusted_lag` so animations resume where they stopped instead of jumping.
#[derive(Clone, Copy, Debug)]
pub struct FrameClock {
    last: Option<Instant>,
    lag_threshold: Duration,
    adjusted_lag: Duration,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self {
            last: None,
            lag_threshold: Duration::from_millis(500),
            adjusted_lag: Duration::from_secs_f64(1.0 / 30.0),
        }
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the previous tick. The first tick returns zero.
    pub fn tick(&mut self, now: Instant) -> f32 {
        let Some(last) = self.last.replace(now) else {
            return 0.0;
        };
        let elapsed = now.saturating_duration_since(last);
        if elapsed > self.lag_threshold {
            self.adjusted_lag.as_secs_f32()
        } else {
            elapsed.as_secs_f32()
        }
    }
}

/// The demo's state, minus window and GPU.
pub struct SceneContext {
    pub config: DemoConfig,
    pub scene: Scene,
    pub meshes: MeshStore,
    pub materials: Materials,
    pub textures: TextureStore,
    pub rig: CameraRig,
    pub director: AnimationDirector,
    pub viewport: Viewport,
    compact: bool,
    matcap: TextureId,
    built: Option<BuiltScene>,
    font_status: FontStatus,
    rng: StdRng,
}

impl SceneContext {
    /// Sets up the camera and starts the fly-in. The scene stays empty until
    /// [`populate`](Self::populate) receives the font.
    pub fn new(config: DemoConfig, viewport: Viewport) -> Self {
        let viewport = viewport.with_params(config.viewport);
        let compact = viewport.is_compact(config.fly_in.breakpoint);
        let mut rig = CameraRig::new(&config.camera, viewport.aspect());
        rig.camera.update_projection_matrix();

        let mut director = AnimationDirector::new(config.spin, config.fly_in);
        director.fly_in(compact);

        let mut textures = TextureStore::new();
        let matcap = textures.reserve(config.assets.matcap.display().to_string());

        let rng = match config.ornaments.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        log::debug!(
            "viewport {}x{} @{} (compact: {compact}), spin mode {}",
            viewport.width(),
            viewport.height(),
            viewport.device_pixel_ratio(),
            config.spin.mode
        );

        Self {
            config,
            scene: Scene::new(),
            meshes: MeshStore::new(),
            materials: Materials::new(),
            textures,
            rig,
            director,
            viewport,
            compact,
            matcap,
            built: None,
            font_status: FontStatus::Loading,
            rng,
        }
    }

    /// Texture slot the matcap image goes into.
    pub fn matcap(&self) -> TextureId {
        self.matcap
    }

    /// Whether the startup viewport was classified compact.
    pub fn is_compact(&self) -> bool {
        self.compact
    }

    pub fn font_status(&self) -> &FontStatus {
        &self.font_status
    }

    pub fn built(&self) -> Option<&BuiltScene> {
        self.built.as_ref()
    }

    /// Builds the label and ornaments. Only the first call has any effect.
    pub fn populate(&mut self, font: &Font) -> Option<&BuiltScene> {
        if self.built.is_some() {
            log::warn!("scene already populated; ignoring second font");
            return self.built.as_ref();
        }

        let built = SceneBuilder::new(&mut self.scene, &mut self.meshes, &mut self.materials)
            .build(
                font,
                self.matcap,
                &self.config.label,
                &self.config.ornaments,
                &mut self.rng,
            );
        self.font_status = FontStatus::Ready {
            family: font.family().to_owned(),
        };
        self.built = Some(built);
        self.built.as_ref()
    }

    pub fn on_texture(&mut self, id: TextureId, result: Result<RgbaImage>) {
        match result {
            Ok(image) => {
                log::info!(
                    "texture {} loaded ({}x{})",
                    self.textures.label(id).unwrap_or("?"),
                    image.width(),
                    image.height()
                );
                self.textures.fulfill(id, image);
            }
            Err(err) => log::warn!("texture load failed, keeping placeholder: {err}"),
        }
    }

    pub fn on_font(&mut self, result: Result<Font>) {
        match result {
            Ok(font) => {
                log::info!("font {:?} loaded", font.family());
                self.populate(&font);
            }
            Err(err) => {
                log::error!("font load failed: {err}");
                self.font_status = FontStatus::Failed(err.to_string());
            }
        }
    }

    /// Routes a finished load.
    pub fn handle_asset(&mut self, event: AssetEvent) {
        match event {
            AssetEvent::TextureLoaded { id, path, result } => {
                log::debug!("texture event for {}", path.display());
                self.on_texture(id, result);
            }
            AssetEvent::FontLoaded { path, result } => {
                log::debug!("font event for {}", path.display());
                self.on_font(result);
            }
        }
    }

    /// Applies a window resize. Returns the new drawing buffer size when it changed.
    pub fn resize(&mut self, width: f32, height: f32, device_pixel_ratio: f32) -> Option<(u32, u32)> {
        if !self.viewport.resize(width, height, device_pixel_ratio) {
            return None;
        }
        self.rig.set_aspect(self.viewport.aspect());
        let size = self.viewport.drawing_buffer_size();
        log::debug!(
            "resized to {width}x{height} @{device_pixel_ratio}, buffer {}x{}",
            size.0,
            size.1
        );
        Some(size)
    }

    /// Current label color, once the label exists.
    pub fn label_color(&self) -> Option<[u8; 3]> {
        self.built.as_ref().map(|b| b.color.rgb())
    }

    pub fn set_label_color(&mut self, rgb: [u8; 3]) {
        if let Some(built) = self.built.as_mut() {
            built.color.set(rgb, &mut self.materials);
        }
    }

    pub fn color_binding(&self) -> Option<&ColorBinding> {
        self.built.as_ref().map(|b| &b.color)
    }

    /// Runs one frame of simulation: controller first, then spin and tweens.
    pub fn tick(&mut self, input: &Input, dt: f32) -> FrameReport {
        let controlled = self.rig.update(input, self.viewport.physical_height());
        let rotated = self.director.rotate_tick(&mut self.scene, dt);
        let before = self.rig.camera.position;
        let finished_tweens = self
            .director
            .advance(dt, &mut self.scene, &mut self.rig.camera);

        FrameReport {
            rotated,
            finished_tweens,
            camera_moved: controlled || self.rig.camera.position != before,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::font::tests::test_font;
    use glam::Vec3;

    fn config(count: usize) -> DemoConfig {
        let mut config = DemoConfig::default();
        config.ornaments.count = count;
        config.ornaments.seed = Some(1);
        config.label.text = "IO".to_owned();
        config
    }

    #[test]
    fn clock_smooths_long_gaps() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        assert_eq!(clock.tick(start), 0.0);

        let next = start + Duration::from_millis(16);
        assert!((clock.tick(next) - 0.016).abs() < 1e-6);

        let stalled = next + Duration::from_secs(4);
        assert!((clock.tick(stalled) - 1.0 / 30.0).abs() < 1e-6);
    }

    #[test]
    fn compact_classification_is_fixed_at_startup() {
        let mut ctx = SceneContext::new(config(0), Viewport::new(400.0, 800.0, 1.0));
        assert!(ctx.is_compact());
        ctx.resize(1400.0, 800.0, 1.0);
        assert!(ctx.is_compact());

        ctx.tick(&Input::new(), 3.0);
        assert!((ctx.rig.camera.position - Vec3::new(7.0, -1.0, 10.0)).length() < 1e-3);
    }

    #[test]
    fn second_font_does_not_duplicate_scene() {
        let mut ctx = SceneContext::new(config(5), Viewport::new(800.0, 600.0, 1.0));
        ctx.on_font(Ok(test_font()));
        assert_eq!(ctx.scene.len(), 6);
        ctx.on_font(Ok(test_font()));
        assert_eq!(ctx.scene.len(), 6);
    }

    #[test]
    fn failed_font_leaves_empty_scene_running() {
        let mut ctx = SceneContext::new(config(5), Viewport::new(800.0, 600.0, 1.0));
        ctx.on_font(Err(Error::Outline {
            glyph: 'x',
            reason: "bad".to_owned(),
        }));
        assert!(matches!(ctx.font_status(), FontStatus::Failed(_)));
        assert!(ctx.scene.is_empty());
        assert!(ctx.label_color().is_none());

        let report = ctx.tick(&Input::new(), 1.0 / 60.0);
        assert_eq!(report.rotated, 0);
        assert!(report.camera_moved);
    }

    #[test]
    fn texture_result_fills_matcap_slot() {
        let mut ctx = SceneContext::new(config(0), Viewport::new(800.0, 600.0, 1.0));
        let id = ctx.matcap();
        ctx.on_texture(id, Err(Error::NoSurfaceFormat));
        assert!(!ctx.textures.is_ready(id));
        ctx.on_texture(id, Ok(RgbaImage::new(8, 8)));
        assert!(ctx.textures.is_ready(id));
    }

    #[test]
    fn color_edit_reaches_label_only() {
        let mut ctx = SceneContext::new(config(3), Viewport::new(800.0, 600.0, 1.0));
        ctx.populate(&test_font());
        assert_eq!(ctx.label_color(), Some([255, 0, 0]));

        ctx.set_label_color([0, 0, 255]);
        assert_eq!(ctx.label_color(), Some([0, 0, 255]));
        let built = ctx.built().unwrap();
        let ornament = ctx.materials.get(built.ornament_material).unwrap();
        assert_eq!(ornament.color, crate::color::Color::WHITE);
    }

    #[test]
    fn resize_updates_aspect_and_buffer() {
        let mut ctx = SceneContext::new(config(0), Viewport::new(800.0, 600.0, 1.0));
        assert_eq!(ctx.resize(1000.0, 500.0, 3.0), Some((2000, 1000)));
        assert_eq!(ctx.rig.camera.aspect(), 2.0);
        assert_eq!(ctx.resize(0.0, 500.0, 1.0), None);
        assert_eq!(ctx.resize(1000.0, 500.0, 3.0), None);
    }
}
