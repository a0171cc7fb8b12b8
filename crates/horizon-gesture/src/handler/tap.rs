//! Tap recognition.
//!
//! A tap succeeds when the requested number of taps completes, each press
//! shorter than `max_duration`, consecutive taps closer than `max_delay`, and
//! the pointer centroid never drifting past the movement limits. Movement is
//! measured from the first tap's press, so later taps must land near it.

use std::time::Duration;

use horizon_gesture_core::{HandlerState, Point, Vector};
use serde::{Deserialize, Serialize};

use super::config::{check_distance, millis};
use super::recognizer::{Decision, PointerAction, StepContext};
use crate::error::{GestureError, Result};
use crate::event::GesturePayload;

/// Default maximum press duration of a single tap.
pub const DEFAULT_MAX_DURATION: Duration = Duration::from_millis(500);

/// Default maximum delay between consecutive taps.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(500);

/// Default movement tolerance.
pub const DEFAULT_MAX_DIST: f32 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TapConfig {
    pub number_of_taps: u32,
    #[serde(with = "millis")]
    pub max_duration: Duration,
    #[serde(with = "millis")]
    pub max_delay: Duration,
    pub max_delta_x: Option<f32>,
    pub max_delta_y: Option<f32>,
    pub max_dist: Option<f32>,
    /// Fewest simultaneous pointers the tap must have seen.
    pub min_pointers: usize,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            number_of_taps: 1,
            max_duration: DEFAULT_MAX_DURATION,
            max_delay: DEFAULT_MAX_DELAY,
            max_delta_x: None,
            max_delta_y: None,
            max_dist: Some(DEFAULT_MAX_DIST),
            min_pointers: 1,
        }
    }
}

impl TapConfig {
    pub fn taps(number_of_taps: u32) -> Self {
        Self {
            number_of_taps,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.number_of_taps == 0 {
            return Err(GestureError::invalid_config(
                "numberOfTaps",
                "must be at least 1",
            ));
        }
        if self.min_pointers == 0 {
            return Err(GestureError::invalid_config(
                "minPointers",
                "must be at least 1",
            ));
        }
        check_distance("maxDeltaX", self.max_delta_x)?;
        check_distance("maxDeltaY", self.max_delta_y)?;
        check_distance("maxDist", self.max_dist)
    }
}

#[derive(Debug, Clone)]
pub struct TapRecognizer {
    pub(crate) config: TapConfig,
    taps: u32,
    max_pointers_seen: usize,
    start: Point,
    last: Point,
    /// Translation accumulated before the pointer set last changed.
    offset: Vector,
    press_started: Duration,
    deadline: Option<Duration>,
}

impl TapRecognizer {
    pub fn new(config: TapConfig) -> Self {
        Self {
            config,
            taps: 0,
            max_pointers_seen: 0,
            start: Point::ZERO,
            last: Point::ZERO,
            offset: Vector::ZERO,
            press_started: Duration::ZERO,
            deadline: None,
        }
    }

    pub fn config(&self) -> &TapConfig {
        &self.config
    }

    /// Taps completed in the current episode.
    pub fn taps(&self) -> u32 {
        self.taps
    }

    pub(crate) fn step(&mut self, cx: &StepContext<'_>) -> Decision {
        let ts = cx.timestamp();
        let centroid = cx.tracker.centroid().unwrap_or(cx.event.position);
        match cx.action {
            PointerAction::Down => {
                if self.taps == 0 {
                    self.start = centroid;
                    self.offset = Vector::ZERO;
                }
                self.last = centroid;
                self.press_started = ts;
                self.max_pointers_seen = self.max_pointers_seen.max(cx.tracker.len());
                self.deadline = Some(ts + self.config.max_duration);
                self.check_movement()
            }
            PointerAction::Add => {
                self.offset += self.last - self.start;
                self.start = centroid;
                self.last = centroid;
                self.max_pointers_seen = self.max_pointers_seen.max(cx.tracker.len());
                self.check_movement()
            }
            PointerAction::Move => {
                self.last = centroid;
                self.check_movement()
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
                if self.check_movement() == Decision::Fail {
                    return Decision::Fail;
                }
                if ts.saturating_sub(self.press_started) > self.config.max_duration {
                    return Decision::Fail;
                }
                self.taps += 1;
                if self.taps >= self.config.number_of_taps {
                    self.deadline = None;
                    if self.max_pointers_seen >= self.config.min_pointers {
                        Decision::Complete
                    } else {
                        Decision::Fail
                    }
                } else {
                    self.deadline = Some(ts + self.config.max_delay);
                    Decision::Stay
                }
            }
            PointerAction::HoverEnter | PointerAction::HoverMove | PointerAction::HoverLeave => {
                Decision::Stay
            }
        }
    }

    fn check_movement(&self) -> Decision {
        let delta = self.last - self.start + self.offset;
        let too_far = self.config.max_delta_x.is_some_and(|m| delta.dx.abs() > m)
            || self.config.max_delta_y.is_some_and(|m| delta.dy.abs() > m)
            || self.config.max_dist.is_some_and(|m| delta.length_squared() > m * m);
        if too_far {
            Decision::Fail
        } else {
            Decision::Stay
        }
    }

    pub(crate) fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Either the press lasted too long or the next tap never came.
    pub(crate) fn on_deadline(&mut self, _now: Duration, state: HandlerState) -> Decision {
        self.deadline = None;
        if state.is_in_progress() {
            Decision::Fail
        } else {
            Decision::Stay
        }
    }

    pub(crate) fn payload(&self) -> GesturePayload {
        GesturePayload::Tap {
            position: self.last,
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }
}
