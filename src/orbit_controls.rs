use std::f32::consts::{PI, TAU};

use glam::Vec3;
use winit::event::MouseButton;

use crate::camera::PerspectiveCamera;
use crate::input::Input;

const EPS: f32 = 1e-6;

/// Spherical coordinates around a target, Y up.
///
/// `phi` is the polar angle from +Y, `theta` the azimuth measured from +Z towards +X.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Spherical {
    radius: f32,
    phi: f32,
    theta: f32,
}

impl Spherical {
    fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius == 0.0 {
            return Self::default();
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vec3 {
        let ring = self.phi.sin() * self.radius;
        Vec3::new(
            ring * self.theta.sin(),
            self.phi.cos() * self.radius,
            ring * self.theta.cos(),
        )
    }
}

/// Orbit controller with inertial damping.
///
/// Left drag orbits, right drag pans in the screen plane, the wheel dollies.
/// Input only accumulates deltas; [`update`](Self::update) applies a fraction
/// of them each frame and lets the rest decay, so it has to run every frame
/// (with or without input) for motion to settle.
///
/// The orbit is recomputed from the camera's current position on every update,
/// so other code (such as a position tween) may move the camera freely.
///
/// # Example
/// ```ignore
/// let mut controls = OrbitControls::new().damping(0.05);
///
/// // In frame loop:
/// controls.handle_input(&camera, &input, viewport_height);
/// controls.update(&mut camera);
/// ```
#[derive(Clone, Debug)]
pub struct OrbitControls {
    /// Point the camera orbits around.
    pub target: Vec3,
    pub enable_damping: bool,
    /// Fraction of the pending motion applied per frame when damping.
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pending: Spherical,
    scale: f32,
    pan_offset: Vec3,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            pending: Spherical::default(),
            scale: 1.0,
            pan_offset: Vec3::ZERO,
        }
    }
}

impl OrbitControls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable damping with the given per-frame factor.
    pub fn damping(mut self, factor: f32) -> Self {
        self.enable_damping = true;
        self.damping_factor = factor;
        self
    }

    /// Turns this frame's pointer input into pending rotation, pan and dolly.
    ///
    /// `viewport_height` is in the same pixel unit as the pointer deltas.
    pub fn handle_input(&mut self, camera: &PerspectiveCamera, input: &Input, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        let delta = input.pointer_delta();

        if input.mouse_down(MouseButton::Left) {
            self.rotate_left(TAU * delta.x / height * self.rotate_speed);
            self.rotate_up(TAU * delta.y / height * self.rotate_speed);
        } else if input.mouse_down(MouseButton::Right) {
            self.pan(camera, delta.x * self.pan_speed, delta.y * self.pan_speed, height);
        }

        let scroll = input.scroll_delta().y;
        if scroll != 0.0 {
            let zoom_scale = 0.95f32.powf(self.zoom_speed);
            // Scrolling away from the user dollies in.
            self.scale *= zoom_scale.powf(scroll);
        }
    }

    fn rotate_left(&mut self, angle: f32) {
        self.pending.theta -= angle;
    }

    fn rotate_up(&mut self, angle: f32) {
        self.pending.phi -= angle;
    }

    fn pan(&mut self, camera: &PerspectiveCamera, dx: f32, dy: f32, height: f32) {
        let distance = (camera.position - self.target).length()
            * (camera.fov().to_radians() / 2.0).tan();
        let world = camera.world_matrix();
        let right = world.x_axis.truncate();
        let up = world.y_axis.truncate();
        self.pan_offset += right * (-2.0 * dx * distance / height);
        self.pan_offset += up * (2.0 * dy * distance / height);
    }

    /// Advances the controller one frame and writes the camera position and target.
    ///
    /// Returns true when the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let before = camera.position;
        let mut spherical = Spherical::from_offset(camera.position - self.target);

        let step = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        spherical.theta += self.pending.theta * step;
        spherical.phi += self.pending.phi * step;
        spherical.phi = spherical
            .phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(EPS, PI - EPS);
        spherical.radius = (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);

        self.target += self.pan_offset * step;

        camera.position = self.target + spherical.to_offset();
        camera.look_at(self.target);

        if self.enable_damping {
            let decay = 1.0 - self.damping_factor;
            self.pending.theta *= decay;
            self.pending.phi *= decay;
            self.pan_offset *= decay;
        } else {
            self.pending = Spherical::default();
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        camera.position.distance_squared(before) > EPS * EPS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::default().at(Vec3::new(0.0, 0.0, 5.0))
    }

    #[test]
    fn idle_update_keeps_camera_still() {
        let mut camera = camera().at(Vec3::new(1.0, 1.0, 1.0));
        let mut controls = OrbitControls::new().damping(0.05);
        for _ in 0..10 {
            controls.update(&mut camera);
        }
        assert!((camera.position - Vec3::ONE).length() < 1e-4);
    }

    #[test]
    fn drag_orbits_at_constant_distance() {
        let mut camera = camera();
        let mut controls = OrbitControls::new();
        let mut input = Input::new();
        input.simulate_drag(MouseButton::Left, Vec2::new(100.0, 0.0));

        controls.handle_input(&camera, &input, 600.0);
        assert!(controls.update(&mut camera));

        assert!((camera.position.length() - 5.0).abs() < 1e-4);
        // Dragging right swings the camera towards -X.
        assert!(camera.position.x < 0.0);
        assert_eq!(camera.target, Vec3::ZERO);
    }

    #[test]
    fn damping_spreads_motion_over_following_frames() {
        let mut camera = camera();
        let mut controls = OrbitControls::new().damping(0.05);
        let mut input = Input::new();
        input.simulate_drag(MouseButton::Left, Vec2::new(100.0, 0.0));
        controls.handle_input(&camera, &input, 600.0);

        controls.update(&mut camera);
        let first = camera.position;
        controls.update(&mut camera);
        let second = camera.position;
        controls.update(&mut camera);
        let third = camera.position;

        let step1 = first.distance(Vec3::new(0.0, 0.0, 5.0));
        let step2 = second.distance(first);
        let step3 = third.distance(second);
        assert!(step1 > 0.0 && step2 > 0.0);
        assert!(step2 < step1 && step3 < step2);
    }

    #[test]
    fn scrolling_away_dollies_in() {
        let mut camera = camera();
        let mut controls = OrbitControls::new();
        let mut input = Input::new();
        input.simulate_scroll(1.0);

        controls.handle_input(&camera, &input, 600.0);
        controls.update(&mut camera);
        assert!((camera.position.length() - 4.75).abs() < 1e-4);
    }

    #[test]
    fn polar_angle_never_flips_over_the_pole() {
        let mut camera = camera();
        let mut controls = OrbitControls::new();
        let mut input = Input::new();
        input.simulate_drag(MouseButton::Left, Vec2::new(0.0, 5000.0));

        controls.handle_input(&camera, &input, 600.0);
        controls.update(&mut camera);
        assert!(camera.position.y > 4.99);
        assert!(camera.position.x.is_finite() && camera.position.z.is_finite());
    }

    #[test]
    fn right_drag_pans_target_and_camera_together() {
        let mut camera = camera();
        let mut controls = OrbitControls::new();
        let mut input = Input::new();
        input.simulate_drag(MouseButton::Right, Vec2::new(-50.0, 0.0));

        controls.handle_input(&camera, &input, 600.0);
        controls.update(&mut camera);
        assert!(controls.target.x > 0.0);
        assert!((camera.position - controls.target - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-4);
    }
}
