//! Rotation recognition over a pair of pointers.

use std::f32::consts::{PI, TAU};
use std::time::Duration;

use horizon_gesture_core::{HandlerState, Point, PointerId, PointerTracker};
use serde::{Deserialize, Serialize};

use super::recognizer::{Decision, PointerAction, StepContext};
use crate::error::{GestureError, Result};
use crate::event::GesturePayload;

/// Default rotation needed before the handler activates (5 degrees).
pub const DEFAULT_MIN_ROTATION: f32 = PI / 36.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RotationConfig {
    /// Absolute rotation in radians needed to activate.
    pub min_rotation: f32,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            min_rotation: DEFAULT_MIN_ROTATION,
        }
    }
}

impl RotationConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.min_rotation.is_finite() || self.min_rotation < 0.0 {
            return Err(GestureError::invalid_config(
                "minRotation",
                "must be a finite, non-negative angle",
            ));
        }
        Ok(())
    }
}

/// Wrap an angle difference into `(-PI, PI]`.
fn normalize(delta: f32) -> f32 {
    let wrapped = delta.rem_euclid(TAU);
    if wrapped > PI { wrapped - TAU } else { wrapped }
}

fn angle(a: Point, b: Point) -> f32 {
    (b.y - a.y).atan2(b.x - a.x)
}

#[derive(Debug, Clone)]
pub struct RotationRecognizer {
    pub(crate) config: RotationConfig,
    pair: Option<(PointerId, PointerId)>,
    rotation: f32,
    velocity: f32,
    prev_angle: f32,
    prev_time: Duration,
    anchor: Point,
}

impl RotationRecognizer {
    pub fn new(config: RotationConfig) -> Self {
        Self {
            config,
            pair: None,
            rotation: 0.0,
            velocity: 0.0,
            prev_angle: 0.0,
            prev_time: Duration::ZERO,
            anchor: Point::ZERO,
        }
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    fn pair_positions(&self, tracker: &PointerTracker) -> Option<(Point, Point)> {
        let (a, b) = self.pair?;
        Some((tracker.get(a)?.position(), tracker.get(b)?.position()))
    }

    /// Pick the first two tracked pointers that are not `excluded` and restart
    /// angle measurement from their current positions.
    fn pick_pair(&mut self, cx: &StepContext<'_>, excluded: Option<PointerId>) {
        let mut ids = cx.tracker.ids().filter(|id| Some(*id) != excluded);
        self.pair = match (ids.next(), ids.next()) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        };
        if let Some((a, b)) = self.pair_positions(cx.tracker) {
            self.prev_angle = angle(a, b);
            self.prev_time = cx.timestamp();
            self.anchor = a.midpoint(b);
        }
    }

    pub(crate) fn step(&mut self, cx: &StepContext<'_>) -> Decision {
        match cx.action {
            PointerAction::Down => {
                self.anchor = cx.event.position;
                Decision::Stay
            }
            PointerAction::Add => {
                if self.pair.is_none() {
                    self.pick_pair(cx, None);
                }
                Decision::Stay
            }
            PointerAction::Move => {
                let Some((a, b)) = self.pair_positions(cx.tracker) else {
                    return Decision::Stay;
                };
                let current = angle(a, b);
                let delta = normalize(current - self.prev_angle);
                let dt = cx.timestamp().saturating_sub(self.prev_time).as_secs_f32();
                if dt > 0.0 {
                    self.velocity = delta / dt;
                }
                self.rotation += delta;
                self.prev_angle = current;
                self.prev_time = cx.timestamp();
                self.anchor = a.midpoint(b);

                if cx.state == HandlerState::Began && self.rotation.abs() >= self.config.min_rotation {
                    Decision::Activate
                } else {
                    Decision::Stay
                }
            }
            PointerAction::Remove => {
                let leaving = cx.event.pointer_id;
                let in_pair = self.pair.is_some_and(|(a, b)| a == leaving || b == leaving);
                if !in_pair {
                    return Decision::Stay;
                }
                self.pick_pair(cx, Some(leaving));
                if self.pair.is_none() && cx.state == HandlerState::Active {
                    Decision::End
                } else {
                    Decision::Stay
                }
            }
            PointerAction::Up => {
                self.pair = None;
                if cx.state == HandlerState::Active {
                    Decision::End
                } else {
                    Decision::Fail
                }
            }
            PointerAction::HoverEnter | PointerAction::HoverMove | PointerAction::HoverLeave => {
                Decision::Stay
            }
        }
    }

    pub(crate) fn payload(&self) -> GesturePayload {
        GesturePayload::Rotation {
            anchor: self.anchor,
            rotation: self.rotation,
            velocity: self.velocity,
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }
}
