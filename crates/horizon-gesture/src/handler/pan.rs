//! Pan (drag) recognition.
//!
//! Activation criteria are evaluated against the translation of the pointer
//! centroid since the press, carried across pointer additions and removals:
//!
//! - `active_offset_*`: activate once the translation leaves the range.
//! - `min_dist`: activate once the translation is at least this long. Without
//!   any custom criterion the engine touch slop applies.
//! - `min_velocity*`: activate once the pointer moves fast enough.
//! - `fail_offset_*`: fail if the translation leaves the range first.
//! - `activate_after_long_press`: only activate after holding still that long.

use std::time::Duration;

use horizon_gesture_core::{HandlerState, Point, Vector, DEFAULT_MAX_POINTERS};
use serde::{Deserialize, Serialize};

use super::config::{check_distance, millis};
use super::recognizer::{Decision, PointerAction, StepContext};
use crate::error::{GestureError, Result};
use crate::event::GesturePayload;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PanConfig {
    #[serde(alias = "minDistance")]
    pub min_dist: Option<f32>,
    pub active_offset_x_start: Option<f32>,
    pub active_offset_x_end: Option<f32>,
    pub active_offset_y_start: Option<f32>,
    pub active_offset_y_end: Option<f32>,
    pub fail_offset_x_start: Option<f32>,
    pub fail_offset_x_end: Option<f32>,
    pub fail_offset_y_start: Option<f32>,
    pub fail_offset_y_end: Option<f32>,
    pub min_velocity: Option<f32>,
    pub min_velocity_x: Option<f32>,
    pub min_velocity_y: Option<f32>,
    pub min_pointers: usize,
    pub max_pointers: usize,
    #[serde(with = "millis")]
    pub activate_after_long_press: Duration,
}

impl Default for PanConfig {
    fn default() -> Self {
        Self {
            min_dist: None,
            active_offset_x_start: None,
            active_offset_x_end: None,
            active_offset_y_start: None,
            active_offset_y_end: None,
            fail_offset_x_start: None,
            fail_offset_x_end: None,
            fail_offset_y_start: None,
            fail_offset_y_end: None,
            min_velocity: None,
            min_velocity_x: None,
            min_velocity_y: None,
            min_pointers: 1,
            max_pointers: DEFAULT_MAX_POINTERS,
            activate_after_long_press: Duration::ZERO,
        }
    }
}

impl PanConfig {
    /// A pan that activates after `distance` units of travel.
    pub fn min_distance(distance: f32) -> Self {
        Self {
            min_dist: Some(distance),
            ..Self::new()
        }
    }

    pub fn new() -> Self {
        Self::default()
    }

    fn has_custom_activation_criteria(&self) -> bool {
        [
            self.active_offset_x_start,
            self.active_offset_x_end,
            self.active_offset_y_start,
            self.active_offset_y_end,
            self.min_velocity,
            self.min_velocity_x,
            self.min_velocity_y,
            self.min_dist,
        ]
        .iter()
        .any(Option::is_some)
    }

    pub fn validate(&self) -> Result<()> {
        check_distance("minDist", self.min_dist)?;
        check_distance("minVelocity", self.min_velocity)?;
        let starts = [
            ("activeOffsetXStart", self.active_offset_x_start),
            ("activeOffsetYStart", self.active_offset_y_start),
            ("failOffsetXStart", self.fail_offset_x_start),
            ("failOffsetYStart", self.fail_offset_y_start),
        ];
        for (field, value) in starts {
            if value.is_some_and(|v| !v.is_finite() || v > 0.0) {
                return Err(GestureError::invalid_config(field, "must be zero or negative"));
            }
        }
        let ends = [
            ("activeOffsetXEnd", self.active_offset_x_end),
            ("activeOffsetYEnd", self.active_offset_y_end),
            ("failOffsetXEnd", self.fail_offset_x_end),
            ("failOffsetYEnd", self.fail_offset_y_end),
        ];
        for (field, value) in ends {
            if value.is_some_and(|v| !v.is_finite() || v < 0.0) {
                return Err(GestureError::invalid_config(field, "must be zero or positive"));
            }
        }
        if self.min_pointers == 0 {
            return Err(GestureError::invalid_config("minPointers", "must be at least 1"));
        }
        if self.max_pointers < self.min_pointers {
            return Err(GestureError::invalid_config(
                "maxPointers",
                "must not be lower than minPointers",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PanRecognizer {
    pub(crate) config: PanConfig,
    start: Point,
    last: Point,
    offset: Vector,
    velocity: Vector,
    deadline: Option<Duration>,
}

impl PanRecognizer {
    pub fn new(config: PanConfig) -> Self {
        Self {
            config,
            start: Point::ZERO,
            last: Point::ZERO,
            offset: Vector::ZERO,
            velocity: Vector::ZERO,
            deadline: None,
        }
    }

    /// Translation of the centroid since the press.
    pub fn translation(&self) -> Vector {
        self.last - self.start + self.offset
    }

    fn should_activate(&self, touch_slop: f32) -> bool {
        let t = self.translation();
        let c = &self.config;

        if c.active_offset_x_start.is_some_and(|s| t.dx < s)
            || c.active_offset_x_end.is_some_and(|e| t.dx > e)
            || c.active_offset_y_start.is_some_and(|s| t.dy < s)
            || c.active_offset_y_end.is_some_and(|e| t.dy > e)
        {
            return true;
        }

        let min_dist = c
            .min_dist
            .or((!c.has_custom_activation_criteria()).then_some(touch_slop));
        if min_dist.is_some_and(|d| t.length_squared() >= d * d) {
            return true;
        }

        let v = self.velocity;
        let past = |min: f32, value: f32| {
            if min < 0.0 { value <= min } else { value >= min }
        };
        if c.min_velocity_x.is_some_and(|m| past(m, v.dx))
            || c.min_velocity_y.is_some_and(|m| past(m, v.dy))
        {
            return true;
        }
        c.min_velocity
            .is_some_and(|m| v.length_squared() >= m * m)
    }

    fn should_fail(&self, touch_slop: f32) -> bool {
        let t = self.translation();
        let c = &self.config;

        if !c.activate_after_long_press.is_zero() && t.length_squared() > touch_slop * touch_slop {
            return true;
        }
        c.fail_offset_x_start.is_some_and(|s| t.dx < s)
            || c.fail_offset_x_end.is_some_and(|e| t.dx > e)
            || c.fail_offset_y_start.is_some_and(|s| t.dy < s)
            || c.fail_offset_y_end.is_some_and(|e| t.dy > e)
    }

    fn check_began(&self, cx: &StepContext<'_>) -> Decision {
        if cx.state != HandlerState::Began {
            return Decision::Stay;
        }
        if self.should_fail(cx.touch_slop) {
            return Decision::Fail;
        }
        if !self.config.activate_after_long_press.is_zero()
            || cx.tracker.len() < self.config.min_pointers
        {
            return Decision::Stay;
        }
        if self.should_activate(cx.touch_slop) {
            Decision::Activate
        } else {
            Decision::Stay
        }
    }

    pub(crate) fn step(&mut self, cx: &StepContext<'_>) -> Decision {
        let centroid = cx.tracker.centroid().unwrap_or(cx.event.position);
        match cx.action {
            PointerAction::Down => {
                self.start = centroid;
                self.last = centroid;
                self.offset = Vector::ZERO;
                self.velocity = Vector::ZERO;
                if !self.config.activate_after_long_press.is_zero() {
                    self.deadline = Some(cx.timestamp() + self.config.activate_after_long_press);
                }
                self.check_began(cx)
            }
            PointerAction::Add => {
                self.offset += self.last - self.start;
                self.start = centroid;
                self.last = centroid;
                if cx.tracker.len() > self.config.max_pointers {
                    if cx.state == HandlerState::Active {
                        Decision::Cancel
                    } else {
                        Decision::Fail
                    }
                } else {
                    self.check_began(cx)
                }
            }
            PointerAction::Move => {
                self.last = centroid;
                self.velocity = cx.tracker.velocity(cx.event.pointer_id);
                self.check_began(cx)
            }
            PointerAction::Remove => {
                self.offset += self.last - self.start;
                let rest = cx
                    .tracker
                    .centroid_excluding(cx.event.pointer_id)
                    .unwrap_or(centroid);
                self.start = rest;
                self.last = rest;
                Decision::Stay
            }
            PointerAction::Up => {
                self.last = centroid;
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

    pub(crate) fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    pub(crate) fn on_deadline(&mut self, _now: Duration, state: HandlerState) -> Decision {
        self.deadline = None;
        if state == HandlerState::Began {
            Decision::Activate
        } else {
            Decision::Stay
        }
    }

    pub(crate) fn payload(&self) -> GesturePayload {
        GesturePayload::Pan {
            position: self.last,
            translation: self.translation(),
            velocity: self.velocity,
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::testing::Harness;

    #[test]
    fn test_short_move_then_up_fails() {
        let mut h = Harness::new(PanConfig::min_distance(10.0));
        h.down(1, 0.0, 0.0, 0);
        assert_eq!(h.move_to(1, 5.0, 0.0, 50), Decision::Stay);
        assert_eq!(h.up(1, 5.0, 0.0, 80), Decision::Fail);
        assert_eq!(h.state, HandlerState::Failed);
    }

    #[test]
    fn test_activates_past_min_distance() {
        let mut h = Harness::new(PanConfig::min_distance(10.0));
        h.down(1, 0.0, 0.0, 0);
        assert_eq!(h.move_to(1, 6.0, 8.0, 50), Decision::Activate);
        assert_eq!(h.state, HandlerState::Active);
        h.move_to(1, 30.0, 8.0, 60);
        let GesturePayload::Pan { translation, .. } = h.recognizer.payload(&h.tracker, Duration::ZERO) else {
            panic!("expected pan payload");
        };
        assert_eq!(translation, Vector::new(30.0, 8.0));
        assert_eq!(h.up(1, 30.0, 8.0, 70), Decision::End);
    }

    #[test]
    fn test_zero_min_distance_activates_on_down() {
        let mut h = Harness::new(PanConfig::min_distance(0.0));
        assert_eq!(h.down(1, 0.0, 0.0, 0), Decision::Activate);
    }

    #[test]
    fn test_default_uses_touch_slop() {
        let mut h = Harness::new(PanConfig::new());
        h.down(1, 0.0, 0.0, 0);
        assert_eq!(h.move_to(1, 9.0, 0.0, 10), Decision::Stay);
        assert_eq!(h.move_to(1, 10.0, 0.0, 20), Decision::Activate);
    }

    #[test]
    fn test_active_offset_x_only() {
        let config = PanConfig {
            active_offset_x_start: Some(-20.0),
            active_offset_x_end: Some(20.0),
            ..PanConfig::new()
        };
        let mut h = Harness::new(config);
        h.down(1, 0.0, 0.0, 0);
        // Vertical travel alone never activates a horizontal pan.
        assert_eq!(h.move_to(1, 0.0, 100.0, 10), Decision::Stay);
        assert_eq!(h.move_to(1, -21.0, 100.0, 20), Decision::Activate);
    }

    #[test]
    fn test_fail_offset_wins_first() {
        let config = PanConfig {
            active_offset_x_start: Some(-20.0),
            active_offset_x_end: Some(20.0),
            fail_offset_y_start: Some(-5.0),
            fail_offset_y_end: Some(5.0),
            ..PanConfig::new()
        };
        let mut h = Harness::new(config);
        h.down(1, 0.0, 0.0, 0);
        assert_eq!(h.move_to(1, 2.0, 6.0, 10), Decision::Fail);
    }

    #[test]
    fn test_min_pointers() {
        let config = PanConfig {
            min_pointers: 2,
            ..PanConfig::min_distance(10.0)
        };
        let mut h = Harness::new(config);
        h.down(1, 0.0, 0.0, 0);
        assert_eq!(h.move_to(1, 5.0, 0.0, 10), Decision::Stay);
        assert_eq!(h.down(2, 0.0, 50.0, 20), Decision::Stay);
        assert_eq!(h.move_to(2, 20.0, 50.0, 30), Decision::Activate);
    }

    #[test]
    fn test_too_many_pointers() {
        let config = PanConfig {
            max_pointers: 1,
            ..PanConfig::new()
        };
        let mut h = Harness::new(config);
        h.down(1, 0.0, 0.0, 0);
        assert_eq!(h.down(2, 10.0, 0.0, 10), Decision::Fail);
    }

    #[test]
    fn test_translation_survives_pointer_change() {
        let mut h = Harness::new(PanConfig::min_distance(0.0));
        h.down(1, 0.0, 0.0, 0);
        h.move_to(1, 10.0, 0.0, 10);
        h.down(2, 100.0, 0.0, 20);
        h.move_to(2, 110.0, 0.0, 30);
        // centroid moved 5 since the second pointer joined
        assert_eq!(h.recognizer_translation(), Vector::new(15.0, 0.0));
        h.up(2, 110.0, 0.0, 40);
        h.move_to(1, 20.0, 0.0, 50);
        assert_eq!(h.recognizer_translation(), Vector::new(25.0, 0.0));
    }

    #[test]
    fn test_min_velocity_x() {
        let config = PanConfig {
            min_velocity_x: Some(500.0),
            ..PanConfig::new()
        };
        let mut h = Harness::new(config);
        h.down(1, 0.0, 0.0, 0);
        assert_eq!(h.move_to(1, 2.0, 0.0, 100), Decision::Stay);
        assert_eq!(h.move_to(1, 80.0, 0.0, 150), Decision::Activate);
    }

    #[test]
    fn test_activate_after_long_press() {
        let config = PanConfig {
            activate_after_long_press: Duration::from_millis(300),
            ..PanConfig::new()
        };
        let mut h = Harness::new(config);
        h.down(1, 0.0, 0.0, 0);
        assert_eq!(h.move_to(1, 3.0, 0.0, 100), Decision::Stay);
        assert_eq!(h.fire_deadline(), Some(Decision::Activate));

        let mut early = Harness::new(PanConfig {
            activate_after_long_press: Duration::from_millis(300),
            ..PanConfig::new()
        });
        early.down(1, 0.0, 0.0, 0);
        assert_eq!(early.move_to(1, 30.0, 0.0, 100), Decision::Fail);
    }

    #[test]
    fn test_validate_offsets() {
        let config = PanConfig {
            active_offset_x_start: Some(5.0),
            ..PanConfig::new()
        };
        assert!(config.validate().is_err());
        let config = PanConfig {
            min_pointers: 3,
            max_pointers: 2,
            ..PanConfig::new()
        };
        assert!(config.validate().is_err());
        assert!(PanConfig::new().validate().is_ok());
    }

    impl Harness {
        fn recognizer_translation(&self) -> Vector {
            match &self.recognizer {
                crate::handler::Recognizer::Pan(pan) => pan.translation(),
                _ => panic!("not a pan recognizer"),
            }
        }
    }
}
