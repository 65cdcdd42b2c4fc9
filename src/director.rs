//! Scripted motion: the one-time camera fly-in and the continuous ornament spin.

use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::camera::PerspectiveCamera;
use crate::scene::Scene;
use crate::tween::{Property, TweenHost, TweenValue, Tweener};

/// How [`AnimationDirector::rotate_tick`] spins the animated entities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinMode {
    /// Add `rate * dt` to the Y rotation directly.
    #[default]
    Integrate,
    /// Start a step tween only when none is running for the entity.
    Guarded,
    /// Start a step tween for every entity on every frame.
    Legacy,
}

impl SpinMode {
    pub const ALL: [SpinMode; 3] = [SpinMode::Integrate, SpinMode::Guarded, SpinMode::Legacy];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpinMode::Integrate => "integrate",
            SpinMode::Guarded => "guarded",
            SpinMode::Legacy => "legacy",
        }
    }
}

impl fmt::Display for SpinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpinMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SpinMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown spin mode {s:?} (expected integrate, guarded or legacy)"))
    }
}

/// Ornament spin settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpinParams {
    pub mode: SpinMode,
    /// Radians added by one step tween.
    pub step: f32,
    /// Seconds one step tween lasts.
    pub duration: f32,
    /// Radians per second in `integrate` mode.
    pub rate: f32,
}

impl Default for SpinParams {
    fn default() -> Self {
        Self {
            mode: SpinMode::Integrate,
            step: 0.4,
            duration: 1.0,
            rate: 0.8,
        }
    }
}

/// Startup camera flight.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlyInParams {
    /// Logical widths below this count as compact.
    pub breakpoint: f32,
    pub compact_target: [f32; 3],
    pub wide_target: [f32; 3],
    pub duration: f32,
}

impl Default for FlyInParams {
    fn default() -> Self {
        Self {
            breakpoint: 576.0,
            compact_target: [7.0, -1.0, 10.0],
            wide_target: [5.0, -1.0, 5.0],
            duration: 3.0,
        }
    }
}

impl FlyInParams {
    pub fn target(&self, compact: bool) -> Vec3 {
        Vec3::from_array(if compact {
            self.compact_target
        } else {
            self.wide_target
        })
    }
}

/// Owns the tween engine and decides what gets animated.
#[derive(Debug, Default)]
pub struct AnimationDirector {
    tweener: Tweener,
    pub spin: SpinParams,
    pub fly_in: FlyInParams,
}

impl AnimationDirector {
    pub fn new(spin: SpinParams, fly_in: FlyInParams) -> Self {
        Self {
            tweener: Tweener::new(),
            spin,
            fly_in,
        }
    }

    /// Starts the camera flight towards the compact or wide target.
    pub fn fly_in(&mut self, compact: bool) {
        let target = self.fly_in.target(compact);
        log::debug!("fly-in to {target} over {}s (compact: {compact})", self.fly_in.duration);
        self.tweener.to(
            Property::CameraPosition,
            TweenValue::Vector(target),
            self.fly_in.duration,
        );
    }

    /// Spins every animated entity for this frame. Returns how many were affected.
    pub fn rotate_tick(&mut self, scene: &mut Scene, dt: f32) -> usize {
        let spin = self.spin;
        let mut affected = 0;

        for index in 0..scene.animated().len() {
            let entity = scene.animated()[index];
            match spin.mode {
                SpinMode::Integrate => {
                    if let Some(transform) = scene.transform_mut(entity) {
                        transform.rotation.y += spin.rate * dt;
                        affected += 1;
                    }
                }
                SpinMode::Guarded | SpinMode::Legacy => {
                    let property = Property::RotationY(entity);
                    if spin.mode == SpinMode::Guarded && self.tweener.is_active(property) {
                        continue;
                    }
                    let Some(current) = scene.transform(entity).map(|t| t.rotation.y) else {
                        continue;
                    };
                    self.tweener
                        .to(property, TweenValue::Scalar(current + spin.step), spin.duration);
                    affected += 1;
                }
            }
        }

        affected
    }

    /// Advances all running tweens against the scene and camera.
    pub fn advance(&mut self, dt: f32, scene: &mut Scene, camera: &mut PerspectiveCamera) -> usize {
        self.tweener.advance(dt, &mut Stage { scene, camera })
    }

    pub fn is_flying(&self) -> bool {
        self.tweener.is_active(Property::CameraPosition)
    }

    pub fn active_tweens(&self) -> usize {
        self.tweener.active_count()
    }
}

/// The things tweens may touch.
struct Stage<'a> {
    scene: &'a mut Scene,
    camera: &'a mut PerspectiveCamera,
}

impl TweenHost for Stage<'_> {
    fn read(&self, property: Property) -> Option<TweenValue> {
        match property {
            Property::CameraPosition => Some(TweenValue::Vector(self.camera.position)),
            Property::RotationY(entity) => self
                .scene
                .transform(entity)
                .map(|t| TweenValue::Scalar(t.rotation.y)),
        }
    }

    fn write(&mut self, property: Property, value: TweenValue) {
        match (property, value) {
            (Property::CameraPosition, TweenValue::Vector(position)) => {
                self.camera.position = position;
            }
            (Property::RotationY(entity), TweenValue::Scalar(angle)) => {
                if let Some(transform) = self.scene.transform_mut(entity) {
                    transform.rotation.y = angle;
                }
            }
            _ => log::warn!("tween value {value:?} does not fit {property:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Transform;

    fn scene_with(count: usize) -> Scene {
        let mut scene = Scene::new();
        for _ in 0..count {
            scene.add((Transform::new(),));
        }
        scene
    }

    fn director(mode: SpinMode) -> AnimationDirector {
        AnimationDirector::new(
            SpinParams {
                mode,
                ..SpinParams::default()
            },
            FlyInParams::default(),
        )
    }

    #[test]
    fn spin_mode_parses_case_insensitively() {
        assert_eq!("Legacy".parse::<SpinMode>(), Ok(SpinMode::Legacy));
        assert_eq!("guarded".parse::<SpinMode>(), Ok(SpinMode::Guarded));
        assert!("spin".parse::<SpinMode>().is_err());
        assert_eq!(SpinMode::Integrate.to_string(), "integrate");
    }

    #[test]
    fn fly_in_target_depends_on_compact() {
        let mut camera = PerspectiveCamera::default().at(Vec3::ONE);
        let mut scene = Scene::new();

        let mut wide = director(SpinMode::Integrate);
        wide.fly_in(false);
        assert!(wide.is_flying());
        for _ in 0..200 {
            wide.advance(1.0 / 60.0, &mut scene, &mut camera);
        }
        assert!(!wide.is_flying());
        assert!((camera.position - Vec3::new(5.0, -1.0, 5.0)).length() < 1e-4);

        let mut compact = director(SpinMode::Integrate);
        compact.fly_in(true);
        compact.advance(3.0, &mut scene, &mut camera);
        assert!((camera.position - Vec3::new(7.0, -1.0, 10.0)).length() < 1e-4);
    }

    #[test]
    fn integrate_skips_reserved_entities() {
        let mut scene = scene_with(5);
        let mut director = director(SpinMode::Integrate);

        assert_eq!(director.rotate_tick(&mut scene, 0.5), 3);
        let children = scene.children().to_vec();
        assert_eq!(scene.transform(children[0]).unwrap().rotation.y, 0.0);
        assert_eq!(scene.transform(children[1]).unwrap().rotation.y, 0.0);
        for &entity in &children[2..] {
            assert!((scene.transform(entity).unwrap().rotation.y - 0.4).abs() < 1e-6);
        }
        assert_eq!(director.active_tweens(), 0);
    }

    #[test]
    fn legacy_stacks_a_tween_every_frame() {
        let mut scene = scene_with(4);
        let mut camera = PerspectiveCamera::default();
        let mut director = director(SpinMode::Legacy);

        for _ in 0..3 {
            assert_eq!(director.rotate_tick(&mut scene, 1.0 / 60.0), 2);
            director.advance(1.0 / 60.0, &mut scene, &mut camera);
        }
        assert_eq!(director.active_tweens(), 6);
    }

    #[test]
    fn guarded_waits_for_the_running_step() {
        let mut scene = scene_with(3);
        let mut camera = PerspectiveCamera::default();
        let mut director = director(SpinMode::Guarded);
        let spinner = scene.children()[2];

        assert_eq!(director.rotate_tick(&mut scene, 0.25), 1);
        for _ in 0..3 {
            director.advance(0.25, &mut scene, &mut camera);
            assert_eq!(director.rotate_tick(&mut scene, 0.25), 0);
        }
        director.advance(0.25, &mut scene, &mut camera);
        assert!((scene.transform(spinner).unwrap().rotation.y - 0.4).abs() < 1e-5);
        assert_eq!(director.rotate_tick(&mut scene, 0.25), 1);
    }

    #[test]
    fn legacy_spin_keeps_accelerating_past_one_step() {
        let mut scene = scene_with(3);
        let mut camera = PerspectiveCamera::default();
        let mut director = director(SpinMode::Legacy);
        let spinner = scene.children()[2];

        let dt = 1.0 / 60.0;
        let mut previous = 0.0;
        for _ in 0..60 {
            director.rotate_tick(&mut scene, dt);
            director.advance(dt, &mut scene, &mut camera);
            let angle = scene.transform(spinner).unwrap().rotation.y;
            assert!(angle > previous);
            previous = angle;
        }
        // Overlapping steps compound: one second covers well over a single 0.4 step.
        assert!(previous > 1.0, "angle after 1s: {previous}");
    }
}
