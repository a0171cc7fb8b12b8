//! Fling recognition: a quick directional flick.

use std::time::Duration;

use bitflags::bitflags;
use horizon_gesture_core::{HandlerState, Point, PointerId, Vector};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::config::millis;
use super::recognizer::{Decision, PointerAction, StepContext};
use crate::error::{GestureError, Result};
use crate::event::GesturePayload;

pub const DEFAULT_MAX_DURATION: Duration = Duration::from_millis(800);

/// Default minimum speed of the key pointer, in units per second.
pub const DEFAULT_MIN_VELOCITY: f32 = 700.0;

/// Half-angle in degrees of the cone accepted around an axis direction.
pub const DEFAULT_MIN_DIRECTION_ALIGNMENT: f32 = 20.0;

bitflags! {
    /// Directions a fling may travel in. Setting two adjacent bits also
    /// accepts the diagonal between them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Directions: u8 {
        const RIGHT = 0b0001;
        const LEFT  = 0b0010;
        const UP    = 0b0100;
        const DOWN  = 0b1000;
    }
}

impl Default for Directions {
    fn default() -> Self {
        Directions::RIGHT
    }
}

impl Directions {
    /// Unit vector in screen coordinates (y grows downwards).
    fn unit(self) -> Vector {
        let mut v = Vector::ZERO;
        if self.contains(Directions::RIGHT) {
            v.dx += 1.0;
        }
        if self.contains(Directions::LEFT) {
            v.dx -= 1.0;
        }
        if self.contains(Directions::UP) {
            v.dy -= 1.0;
        }
        if self.contains(Directions::DOWN) {
            v.dy += 1.0;
        }
        v.normalized()
    }

    const AXES: [Directions; 4] = [
        Directions::RIGHT,
        Directions::LEFT,
        Directions::UP,
        Directions::DOWN,
    ];

    const DIAGONALS: [Directions; 4] = [
        Directions::UP.union(Directions::RIGHT),
        Directions::DOWN.union(Directions::RIGHT),
        Directions::UP.union(Directions::LEFT),
        Directions::DOWN.union(Directions::LEFT),
    ];
}

impl Serialize for Directions {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.bits())
    }
}

impl<'de> Deserialize<'de> for Directions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let bits = u8::deserialize(deserializer)?;
        Directions::from_bits(bits)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown direction bits {bits:#06b}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlingConfig {
    pub direction: Directions,
    pub number_of_pointers: usize,
    #[serde(with = "millis")]
    pub max_duration: Duration,
    pub min_velocity: f32,
    /// Degrees. The diagonal cone is `45 - min_direction_alignment`.
    pub min_direction_alignment: f32,
}

impl Default for FlingConfig {
    fn default() -> Self {
        Self {
            direction: Directions::default(),
            number_of_pointers: 1,
            max_duration: DEFAULT_MAX_DURATION,
            min_velocity: DEFAULT_MIN_VELOCITY,
            min_direction_alignment: DEFAULT_MIN_DIRECTION_ALIGNMENT,
        }
    }
}

impl FlingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.direction.is_empty() {
            return Err(GestureError::invalid_config(
                "direction",
                "at least one direction is required",
            ));
        }
        if self.number_of_pointers == 0 {
            return Err(GestureError::invalid_config(
                "numberOfPointers",
                "must be at least 1",
            ));
        }
        if !self.min_velocity.is_finite() || self.min_velocity < 0.0 {
            return Err(GestureError::invalid_config(
                "minVelocity",
                "must be a finite, non-negative speed",
            ));
        }
        if !(0.0..=45.0).contains(&self.min_direction_alignment) {
            return Err(GestureError::invalid_config(
                "minDirectionAlignment",
                "must be between 0 and 45 degrees",
            ));
        }
        Ok(())
    }

    /// Whether `velocity` points into one of the accepted cones.
    pub fn is_aligned(&self, velocity: Vector) -> bool {
        let heading = velocity.normalized();
        let axis_cos = self.min_direction_alignment.to_radians().cos();
        let diagonal_cos = (45.0 - self.min_direction_alignment).to_radians().cos();
        let accepts = |dir: Directions, min_cos: f32| {
            self.direction.contains(dir) && heading.dot(dir.unit()) > min_cos
        };
        Directions::AXES.iter().any(|&d| accepts(d, axis_cos))
            || Directions::DIAGONALS.iter().any(|&d| accepts(d, diagonal_cos))
    }
}

/// Completes as soon as the key pointer moves fast enough in an accepted
/// direction with the configured number of pointers down; fails on release or
/// when the window closes first.
#[derive(Debug, Clone)]
pub struct FlingRecognizer {
    pub(crate) config: FlingConfig,
    key_pointer: Option<PointerId>,
    max_pointers_seen: usize,
    position: Point,
    deadline: Option<Duration>,
}

impl FlingRecognizer {
    pub fn new(config: FlingConfig) -> Self {
        Self {
            config,
            key_pointer: None,
            max_pointers_seen: 0,
            position: Point::ZERO,
            deadline: None,
        }
    }

    fn try_finish(&mut self, cx: &StepContext<'_>) -> bool {
        let Some(key) = self.key_pointer else {
            return false;
        };
        let velocity = cx.tracker.velocity(key);
        let fast = velocity.length() > self.config.min_velocity;
        fast && self.max_pointers_seen == self.config.number_of_pointers
            && self.config.is_aligned(velocity)
    }

    fn finish_or_stay(&mut self, cx: &StepContext<'_>) -> Decision {
        if self.try_finish(cx) {
            Decision::Complete
        } else {
            Decision::Stay
        }
    }

    pub(crate) fn step(&mut self, cx: &StepContext<'_>) -> Decision {
        self.position = cx.event.position;
        if cx.state != HandlerState::Began {
            return Decision::Stay;
        }
        match cx.action {
            PointerAction::Down => {
                self.key_pointer = Some(cx.event.pointer_id);
                self.max_pointers_seen = 1;
                self.deadline = Some(cx.timestamp() + self.config.max_duration);
                Decision::Stay
            }
            PointerAction::Add => {
                self.max_pointers_seen = self.max_pointers_seen.max(cx.tracker.len());
                self.finish_or_stay(cx)
            }
            PointerAction::Move => self.finish_or_stay(cx),
            PointerAction::Remove | PointerAction::Up => {
                if self.try_finish(cx) {
                    Decision::Complete
                } else {
                    Decision::Fail
                }
            }
            PointerAction::HoverEnter | PointerAction::HoverMove | PointerAction::HoverLeave => {
                Decision::Stay
            }
        }
    }

    pub(crate) fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    pub(crate) fn on_deadline(&mut self, _now: Duration, state: HandlerState) -> Decision {
        self.deadline = None;
        if state == HandlerState::Began {
            Decision::Fail
        } else {
            Decision::Stay
        }
    }

    pub(crate) fn payload(&self) -> GesturePayload {
        GesturePayload::Fling {
            position: self.position,
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }
}
