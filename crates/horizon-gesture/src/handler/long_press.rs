//! Long-press recognition.

use std::time::Duration;

use horizon_gesture_core::{HandlerState, Point};
use serde::{Deserialize, Serialize};

use super::config::{check_distance, millis};
use super::recognizer::{Decision, PointerAction, StepContext};
use crate::error::{GestureError, Result};
use crate::event::GesturePayload;

pub const DEFAULT_MIN_DURATION: Duration = Duration::from_millis(500);

pub const DEFAULT_MAX_DIST: f32 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LongPressConfig {
    #[serde(with = "millis")]
    pub min_duration: Duration,
    pub max_dist: f32,
    pub number_of_pointers: usize,
}

impl Default for LongPressConfig {
    fn default() -> Self {
        Self {
            min_duration: DEFAULT_MIN_DURATION,
            max_dist: DEFAULT_MAX_DIST,
            number_of_pointers: 1,
        }
    }
}

impl LongPressConfig {
    pub fn validate(&self) -> Result<()> {
        check_distance("maxDist", Some(self.max_dist))?;
        if self.number_of_pointers == 0 {
            return Err(GestureError::invalid_config(
                "numberOfPointers",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Activates once the required pointers have rested within `max_dist` of
/// their press for `min_duration`. Lifting early fails; drifting fails, or
/// cancels once active.
#[derive(Debug, Clone)]
pub struct LongPressRecognizer {
    pub(crate) config: LongPressConfig,
    start: Point,
    last: Point,
    started_at: Duration,
    deadline: Option<Duration>,
}

impl LongPressRecognizer {
    pub fn new(config: LongPressConfig) -> Self {
        Self {
            config,
            start: Point::ZERO,
            last: Point::ZERO,
            started_at: Duration::ZERO,
            deadline: None,
        }
    }

    fn give_up(state: HandlerState) -> Decision {
        if state == HandlerState::Active {
            Decision::Cancel
        } else {
            Decision::Fail
        }
    }

    /// Restart the hold timer once the pointer count matches.
    fn arm(&mut self, cx: &StepContext<'_>) -> Decision {
        let centroid = cx.tracker.centroid().unwrap_or(cx.event.position);
        self.start = centroid;
        self.last = centroid;
        self.started_at = cx.timestamp();
        if cx.tracker.len() != self.config.number_of_pointers {
            return Decision::Stay;
        }
        if self.config.min_duration.is_zero() {
            self.deadline = None;
            return Decision::Activate;
        }
        self.deadline = Some(cx.timestamp() + self.config.min_duration);
        Decision::Stay
    }

    pub(crate) fn step(&mut self, cx: &StepContext<'_>) -> Decision {
        match cx.action {
            PointerAction::Down => self.arm(cx),
            PointerAction::Add => {
                if cx.tracker.len() > self.config.number_of_pointers {
                    return Self::give_up(cx.state);
                }
                if cx.state == HandlerState::Began {
                    self.arm(cx)
                } else {
                    Decision::Stay
                }
            }
            PointerAction::Move => {
                self.last = cx.tracker.centroid().unwrap_or(cx.event.position);
                let max = self.config.max_dist;
                if (self.last - self.start).length_squared() > max * max {
                    Self::give_up(cx.state)
                } else {
                    Decision::Stay
                }
            }
            PointerAction::Remove => {
                if cx.state != HandlerState::Active
                    && cx.remaining_pointers() < self.config.number_of_pointers
                {
                    Decision::Fail
                } else {
                    Decision::Stay
                }
            }
            PointerAction::Up => {
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

    pub(crate) fn payload(&self, now: Duration) -> GesturePayload {
        GesturePayload::LongPress {
            position: self.last,
            duration: now.saturating_sub(self.started_at),
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }
}
