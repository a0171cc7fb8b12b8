//! Passthrough recognizer standing in for a hosted native component.
//!
//! It has no real recognition criteria. It exists so the native component's
//! own touch handling can take part in relations and exclusivity like any
//! other handler.

use horizon_gesture_core::{HandlerState, Point};
use serde::{Deserialize, Serialize};

use super::recognizer::{Decision, PointerAction, StepContext};
use crate::event::GesturePayload;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NativeConfig {
    /// Activate on the first pointer instead of after moving past the touch
    /// slop.
    pub should_activate_on_start: bool,
    /// While ACTIVE, no other handler may activate on the same pointers.
    pub disallow_interruption: bool,
}

impl Default for NativeConfig {
    fn default() -> Self {
        Self {
            should_activate_on_start: true,
            disallow_interruption: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NativeRecognizer {
    pub(crate) config: NativeConfig,
    start: Point,
    position: Point,
    pointer_inside: bool,
}

impl NativeRecognizer {
    pub fn new(config: NativeConfig) -> Self {
        Self {
            config,
            start: Point::ZERO,
            position: Point::ZERO,
            pointer_inside: true,
        }
    }

    pub(crate) fn step(&mut self, cx: &StepContext<'_>) -> Decision {
        self.position = cx.tracker.centroid().unwrap_or(cx.event.position);
        self.pointer_inside = cx.inside;
        match cx.action {
            PointerAction::Down | PointerAction::Add => {
                self.start = self.position;
                if cx.state == HandlerState::Began && self.config.should_activate_on_start {
                    Decision::Activate
                } else {
                    Decision::Stay
                }
            }
            PointerAction::Move => {
                let moved = self.start.distance_to(self.position) >= cx.touch_slop;
                if cx.state == HandlerState::Began && moved {
                    Decision::Activate
                } else {
                    Decision::Stay
                }
            }
            PointerAction::Remove => Decision::Stay,
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

    pub(crate) fn payload(&self) -> GesturePayload {
        GesturePayload::Native {
            position: self.position,
            pointer_inside: self.pointer_inside,
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
    fn test_activates_on_start() {
        let mut h = Harness::new(NativeConfig::default());
        assert_eq!(h.down(1, 5.0, 5.0, 0), Decision::Activate);
        assert_eq!(h.up(1, 5.0, 5.0, 10), Decision::End);
    }

    #[test]
    fn test_deferred_activation_needs_slop() {
        let mut h = Harness::new(NativeConfig {
            should_activate_on_start: false,
            ..NativeConfig::default()
        });
        assert_eq!(h.down(1, 0.0, 0.0, 0), Decision::Stay);
        assert_eq!(h.move_to(1, 5.0, 0.0, 10), Decision::Stay);
        assert_eq!(h.move_to(1, 12.0, 0.0, 20), Decision::Activate);
    }

    #[test]
    fn test_release_without_activation_fails() {
        let mut h = Harness::new(NativeConfig {
            should_activate_on_start: false,
            ..NativeConfig::default()
        });
        h.down(1, 0.0, 0.0, 0);
        assert_eq!(h.up(1, 0.0, 0.0, 10), Decision::Fail);
    }

    #[test]
    fn test_payload_reports_inside() {
        let mut h = Harness::new(NativeConfig::default());
        h.down(1, 0.0, 0.0, 0);
        h.inside = false;
        h.move_to(1, 500.0, 0.0, 10);
        let GesturePayload::Native { pointer_inside, position } =
            h.recognizer.payload(&h.tracker, std::time::Duration::ZERO)
        else {
            panic!("expected native payload");
        };
        assert!(!pointer_inside);
        assert_eq!(position, Point::new(500.0, 0.0));
    }
}
