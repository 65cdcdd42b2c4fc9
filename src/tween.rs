//! Easing curves and a small fire-and-forget tween engine.
//!
//! A [`Tween`] moves one [`Property`] from wherever it happens to be when the
//! tween first runs to a fixed target. Tweens never hold references to what
//! they animate; the [`Tweener`] reads and writes values through a
//! [`TweenHost`] each time it advances.
//!
//! Several tweens may target the same property at once. They are all advanced
//! every frame in creation order, so the newest one has the last word.

use std::collections::HashMap;

use glam::Vec3;
use hecs::Entity;
use serde::{Deserialize, Serialize};

/// Easing functions for smooth transitions.
///
/// These control the acceleration curve of an animation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// Constant speed throughout.
    Linear,
    /// Start slow, accelerate.
    EaseIn,
    /// Start fast, decelerate.
    #[default]
    EaseOut,
    /// Start slow, speed up, then slow down.
    EaseInOut,
}

impl Easing {
    /// Apply the easing function to a linear progress value (0.0 to 1.0).
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

/// A value a tween can interpolate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TweenValue {
    Scalar(f32),
    Vector(Vec3),
}

impl TweenValue {
    /// Linear blend towards `to`. Mismatched kinds snap to `to`.
    pub fn lerp(self, to: TweenValue, t: f32) -> TweenValue {
        match (self, to) {
            (TweenValue::Scalar(a), TweenValue::Scalar(b)) => TweenValue::Scalar(a + (b - a) * t),
            (TweenValue::Vector(a), TweenValue::Vector(b)) => TweenValue::Vector(a.lerp(b, t)),
            (_, to) => to,
        }
    }
}

/// Something a tween can drive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Property {
    /// World-space camera position.
    CameraPosition,
    /// Y Euler angle of an entity's transform.
    RotationY(Entity),
}

/// Where tweened values are read from and written to.
pub trait TweenHost {
    /// Current value, or `None` if the property no longer exists.
    fn read(&self, property: Property) -> Option<TweenValue>;
    fn write(&mut self, property: Property, value: TweenValue);
}

#[derive(Clone, Debug)]
struct Tween {
    property: Property,
    from: Option<TweenValue>,
    to: TweenValue,
    duration: f32,
    elapsed: f32,
    easing: Easing,
}

impl Tween {
    fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        }
    }
}

/// Runs every active tween.
#[derive(Debug, Default)]
pub struct Tweener {
    tweens: Vec<Tween>,
    in_flight: HashMap<Property, usize>,
}

impl Tweener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a tween with the default easing.
    pub fn to(&mut self, property: Property, target: TweenValue, duration: f32) {
        self.to_with(property, target, duration, Easing::default())
    }

    /// Starts a tween. Its start value is captured on the first [`advance`](Self::advance).
    pub fn to_with(
        &mut self,
        property: Property,
        target: TweenValue,
        duration: f32,
        easing: Easing,
    ) {
        self.tweens.push(Tween {
            property,
            from: None,
            to: target,
            duration,
            elapsed: 0.0,
            easing,
        });
        *self.in_flight.entry(property).or_default() += 1;
    }

    /// True while at least one tween targets `property`.
    pub fn is_active(&self, property: Property) -> bool {
        self.in_flight.contains_key(&property)
    }

    pub fn active_count(&self) -> usize {
        self.tweens.len()
    }

    /// Moves every tween forward by `dt` seconds and writes the results.
    ///
    /// Finished tweens, and tweens whose property has disappeared, are dropped.
    /// Returns how many tweens ended.
    pub fn advance(&mut self, dt: f32, host: &mut impl TweenHost) -> usize {
        let before = self.tweens.len();
        let in_flight = &mut self.in_flight;

        self.tweens.retain_mut(|tween| {
            let from = match tween.from {
                Some(from) => from,
                None => match host.read(tween.property) {
                    Some(current) => {
                        tween.from = Some(current);
                        current
                    }
                    None => {
                        release(in_flight, tween.property);
                        return false;
                    }
                },
            };

            tween.elapsed += dt;
            let t = tween.progress();
            host.write(tween.property, from.lerp(tween.to, tween.easing.apply(t)));

            let keep = t < 1.0;
            if !keep {
                release(in_flight, tween.property);
            }
            keep
        });

        before - self.tweens.len()
    }
}

fn release(in_flight: &mut HashMap<Property, usize>, property: Property) {
    if let Some(count) = in_flight.get_mut(&property) {
        *count -= 1;
        if *count == 0 {
            in_flight.remove(&property);
        }
    }
}
