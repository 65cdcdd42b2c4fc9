use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::camera::PerspectiveCamera;
use crate::input::Input;
use crate::orbit_controls::OrbitControls;

/// Lens, start position and controller damping.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraParams {
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub damping: bool,
    pub damping_factor: f32,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 0.1,
            far: 100.0,
            position: [1.0, 1.0, 1.0],
            damping: true,
            damping_factor: 0.05,
        }
    }
}

/// The camera together with the orbit controller steering it.
#[derive(Clone, Debug)]
pub struct CameraRig {
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
}

impl CameraRig {
    pub fn new(params: &CameraParams, aspect: f32) -> Self {
        let camera = PerspectiveCamera::new(params.fov, aspect, params.near, params.far)
            .at(Vec3::from_array(params.position))
            .looking_at(Vec3::ZERO);
        let mut controls = OrbitControls::new();
        controls.enable_damping = params.damping;
        controls.damping_factor = params.damping_factor;
        Self { camera, controls }
    }

    /// Feeds this frame's pointer input to the controller and steps it.
    pub fn update(&mut self, input: &Input, viewport_height: f32) -> bool {
        self.controls.handle_input(&self.camera, input, viewport_height);
        self.controls.update(&mut self.camera)
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.camera.set_aspect(aspect);
        self.camera.update_projection_matrix();
    }
}
