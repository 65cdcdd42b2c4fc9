//! # matcap-text
//!
//! **Extruded, beveled text with matcap shading, floating in a field of spinning tetrahedra.**
//!
//! The crate loads a typeface JSON font and a matcap image in the background,
//! builds the label and a thousand randomly placed ornaments, flies the camera
//! in, and keeps everything turning while the pointer orbits the view. A small
//! egui panel recolors the label.
//!
//! ## Quick Start
//!
//! ```no_run
//! use matcap_text::*;
//!
//! fn main() -> Result<()> {
//!     let mut config = DemoConfig::default();
//!     config.label.text = "Hello".into();
//!     config.spin.mode = SpinMode::Guarded;
//!     run(config)
//! }
//! ```
//!
//! ## Headless use
//!
//! Everything above the GPU lives in [`SceneContext`], which can be ticked
//! without a window:
//!
//! ```ignore
//! let mut ctx = SceneContext::new(DemoConfig::default(), Viewport::new(1920.0, 1080.0, 1.0));
//! ctx.populate(&Font::load("fonts/metold.json")?);
//! let report = ctx.tick(&Input::new(), 1.0 / 60.0);
//! ```

mod app;
mod assets;
mod camera;
mod color;
mod config;
mod context;
mod director;
mod ecs;
mod error;
mod extrude;
mod font;
mod geometry;
mod gpu;
mod gui;
mod input;
mod material;
mod mesh;
mod mesh_pass;
mod orbit_controls;
mod renderer;
mod rig;
mod scene;
mod texture;
mod triangulate;
mod tween;
mod viewport;

pub use app::run;
pub use assets::{AssetEvent, AssetLoader, AssetSink};
pub use camera::PerspectiveCamera;
pub use color::Color;
pub use config::{AssetPaths, DemoConfig, WindowConfig};
pub use context::{FontStatus, FrameClock, FrameReport, SceneContext};
pub use director::{AnimationDirector, FlyInParams, SpinMode, SpinParams};
pub use ecs::{Label, MaterialId, MeshId, Ornament, RenderMesh, TextureId};
pub use error::{Error, Result};
pub use extrude::{ExtrudeParams, extrude, text_geometry};
pub use font::{Font, Glyph, PathCommand, Shape};
pub use geometry::{MeshStore, RawGeometry};
pub use gpu::GpuContext;
pub use gui::{ControlsPanel, GuiPanel};
pub use input::Input;
pub use material::{ColorBinding, MatcapMaterial, Materials};
pub use mesh::{Mesh, Transform, Vertex3d};
pub use mesh_pass::{Batch, InstanceRaw, MatcapPass};
pub use orbit_controls::OrbitControls;
pub use renderer::{BatchKey, FrameStatus, Renderer, collect_instances};
pub use rig::{CameraParams, CameraRig};
pub use scene::{BuiltScene, LabelParams, RESERVED_CHILDREN, ScatterParams, Scene, SceneBuilder};
pub use texture::{Texture, TextureStore};
pub use triangulate::triangulate;
pub use tween::{Easing, Property, TweenHost, TweenValue, Tweener};
pub use viewport::{Viewport, ViewportParams};

// Re-export glam math types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3};

// Re-export commonly used winit types for convenience
pub use winit::event::MouseButton;

pub use hecs::{Entity, World};
