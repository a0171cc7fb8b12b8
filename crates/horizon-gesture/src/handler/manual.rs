//! Recognizer driven entirely by explicit state calls.

use horizon_gesture_core::{Point, PointerTracker};
use serde::{Deserialize, Serialize};

use super::recognizer::{Decision, StepContext};
use crate::event::GesturePayload;

/// Manual handlers have no recognition parameters; only the common
/// configuration applies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ManualConfig {}

/// Never decides anything by itself. The consumer moves it through its states
/// with the orchestrator's `begin`, `activate`, `end` and `fail` calls, usually
/// from touch events.
#[derive(Debug, Clone, Default)]
pub struct ManualRecognizer;

impl ManualRecognizer {
    pub fn new() -> Self {
        Self
    }

    pub(crate) fn step(&mut self, _cx: &StepContext<'_>) -> Decision {
        Decision::Stay
    }

    pub(crate) fn payload(&self, tracker: &PointerTracker) -> GesturePayload {
        GesturePayload::Manual {
            position: tracker.centroid().unwrap_or(Point::ZERO),
        }
    }

    pub(crate) fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::testing::Harness;
    use horizon_gesture_core::HandlerState;

    #[test]
    fn test_never_decides() {
        let mut h = Harness::new(ManualConfig::default());
        assert_eq!(h.down(1, 0.0, 0.0, 0), Decision::Stay);
        assert_eq!(h.move_to(1, 300.0, 0.0, 10), Decision::Stay);
        assert_eq!(h.state, HandlerState::Began);
        assert_eq!(
            h.recognizer.payload(&h.tracker, std::time::Duration::ZERO),
            GesturePayload::Manual {
                position: Point::new(300.0, 0.0)
            }
        );
        assert_eq!(h.up(1, 300.0, 0.0, 20), Decision::Stay);
    }
}
