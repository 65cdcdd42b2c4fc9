use std::cell::Cell;

use glam::{Mat4, Vec3};

/// A perspective camera looking at a target point.
///
/// The projection matrix is cached. Changing the aspect ratio or lens only
/// marks it stale; [`update_projection_matrix`](Self::update_projection_matrix)
/// (or the next [`projection_matrix`](Self::projection_matrix) call) rebuilds it.
#[derive(Clone, Debug)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    fov_degrees: f32,
    aspect: f32,
    near: f32,
    far: f32,
    projection: Cell<Mat4>,
    projection_dirty: Cell<bool>,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(75.0, 1.0, 0.1, 100.0)
    }
}

impl PerspectiveCamera {
    pub fn new(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_degrees,
            aspect,
            near,
            far,
            projection: Cell::new(Mat4::IDENTITY),
            projection_dirty: Cell::new(true),
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn looking_at(mut self, target: Vec3) -> Self {
        self.target = target;
        self
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Vertical field of view in degrees.
    pub fn fov(&self) -> f32 {
        self.fov_degrees
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.projection_dirty.set(true);
    }

    pub fn is_projection_dirty(&self) -> bool {
        self.projection_dirty.get()
    }

    pub fn update_projection_matrix(&self) {
        self.projection.set(Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            self.aspect,
            self.near,
            self.far,
        ));
        self.projection_dirty.set(false);
    }

    pub fn projection_matrix(&self) -> Mat4 {
        if self.projection_dirty.get() {
            self.update_projection_matrix();
        }
        self.projection.get()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Camera-to-world transform; its X and Y columns are the screen right and up directions.
    pub fn world_matrix(&self) -> Mat4 {
        self.view_matrix().inverse()
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
