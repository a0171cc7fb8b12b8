//! Hover recognition on the hover stream.

use horizon_gesture_core::{Point, PointerTracker};
use serde::{Deserialize, Serialize};

use super::recognizer::{Decision, PointerAction, StepContext};
use crate::event::GesturePayload;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HoverConfig {}

/// Activates when a hovering pointer enters the view, reports every move and
/// ends when it leaves.
#[derive(Debug, Clone, Default)]
pub struct HoverRecognizer {
    last: Point,
}

impl HoverRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn step(&mut self, cx: &StepContext<'_>) -> Decision {
        self.last = cx.event.position;
        match cx.action {
            PointerAction::HoverEnter => Decision::Activate,
            PointerAction::HoverLeave => Decision::End,
            _ => Decision::Stay,
        }
    }

    pub(crate) fn payload(&self, tracker: &PointerTracker) -> GesturePayload {
        GesturePayload::Hover {
            position: tracker.centroid().unwrap_or(self.last),
        }
    }

    pub(crate) fn reset(&mut self) {
        self.last = Point::ZERO;
    }
}
