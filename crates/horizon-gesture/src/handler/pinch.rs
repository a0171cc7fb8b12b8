//! Pinch (scale) recognition.

use std::time::Duration;

use horizon_gesture_core::{HandlerState, Point, PointerId, PointerTracker};
use serde::{Deserialize, Serialize};

use super::config::check_distance;
use super::recognizer::{Decision, PointerAction, StepContext};
use crate::error::Result;
use crate::event::GesturePayload;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PinchConfig {
    /// Span change needed to activate. Defaults to the engine touch slop.
    pub min_span_delta: Option<f32>,
}

impl PinchConfig {
    pub fn validate(&self) -> Result<()> {
        check_distance("minSpanDelta", self.min_span_delta)
    }
}

/// Focal point and span of the tracked pointers.
///
/// The span is the diameter of the pointer cloud: twice the mean absolute
/// deviation from the focal point on each axis, combined.
fn span(tracker: &PointerTracker, excluded: Option<PointerId>) -> Option<(Point, f32)> {
    let points: Vec<Point> = tracker
        .pointers()
        .filter(|p| Some(p.id()) != excluded)
        .map(|p| p.position())
        .collect();
    let focal = Point::centroid(points.iter().copied())?;
    let n = points.len() as f32;
    let dev_x = points.iter().map(|p| (p.x - focal.x).abs()).sum::<f32>() / n;
    let dev_y = points.iter().map(|p| (p.y - focal.y).abs()).sum::<f32>() / n;
    Some((focal, (2.0 * dev_x).hypot(2.0 * dev_y)))
}

#[derive(Debug, Clone)]
pub struct PinchRecognizer {
    pub(crate) config: PinchConfig,
    scale: f32,
    velocity: f32,
    starting_span: f32,
    prev_span: f32,
    prev_time: Duration,
    focal: Point,
    in_progress: bool,
}

impl PinchRecognizer {
    pub fn new(config: PinchConfig) -> Self {
        Self {
            config,
            scale: 1.0,
            velocity: 0.0,
            starting_span: 0.0,
            prev_span: 0.0,
            prev_time: Duration::ZERO,
            focal: Point::ZERO,
            in_progress: false,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    fn anchor(&mut self, cx: &StepContext<'_>, excluded: Option<PointerId>) {
        let remaining = cx.tracker.len().saturating_sub(usize::from(excluded.is_some()));
        match span(cx.tracker, excluded) {
            Some((focal, span)) if remaining >= 2 => {
                if !self.in_progress {
                    self.starting_span = span;
                }
                self.prev_span = span;
                self.prev_time = cx.timestamp();
                self.focal = focal;
                self.in_progress = true;
            }
            _ => self.in_progress = false,
        }
    }

    pub(crate) fn step(&mut self, cx: &StepContext<'_>) -> Decision {
        match cx.action {
            PointerAction::Down => {
                self.focal = cx.event.position;
                Decision::Stay
            }
            PointerAction::Add => {
                self.anchor(cx, None);
                Decision::Stay
            }
            PointerAction::Move => {
                if !self.in_progress {
                    return Decision::Stay;
                }
                let Some((focal, span)) = span(cx.tracker, None) else {
                    return Decision::Stay;
                };
                if self.prev_span > f32::EPSILON {
                    let scale = self.scale * span / self.prev_span;
                    let dt = cx.timestamp().saturating_sub(self.prev_time).as_secs_f32();
                    if dt > 0.0 {
                        self.velocity = (scale - self.scale) / dt;
                    }
                    self.scale = scale;
                }
                self.prev_span = span;
                self.prev_time = cx.timestamp();
                self.focal = focal;

                let slop = self.config.min_span_delta.unwrap_or(cx.touch_slop);
                if cx.state == HandlerState::Began && (span - self.starting_span).abs() >= slop {
                    Decision::Activate
                } else {
                    Decision::Stay
                }
            }
            PointerAction::Remove => {
                self.anchor(cx, Some(cx.event.pointer_id));
                if !self.in_progress && cx.state == HandlerState::Active {
                    Decision::End
                } else {
                    Decision::Stay
                }
            }
            PointerAction::Up => {
                self.in_progress = false;
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
        GesturePayload::Pinch {
            focal: self.focal,
            scale: self.scale,
            velocity: self.velocity,
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }
}
