//! Per-kind recognition dispatch.
//!
//! Every recognizer is a plain struct holding its configuration and the
//! accumulators of the current episode. [`Recognizer`] is the closed set of
//! them; the orchestrator calls [`Recognizer::step`] once per pointer action and
//! commits whatever [`Decision`] comes back after consulting the relation
//! graph. Recognizers never touch engine state.

use std::time::Duration;

use horizon_gesture_core::{HandlerState, PointerEvent, PointerTracker};

use super::config::RecognizerConfig;
use super::fling::FlingRecognizer;
use super::force_touch::ForceTouchRecognizer;
use super::hover::HoverRecognizer;
use super::long_press::LongPressRecognizer;
use super::manual::ManualRecognizer;
use super::native::NativeRecognizer;
use super::pan::PanRecognizer;
use super::pinch::PinchRecognizer;
use super::rotation::RotationRecognizer;
use super::tap::TapRecognizer;
use super::HandlerKind;
use crate::error::{GestureError, Result, StepError};
use crate::event::GesturePayload;

/// What happened to a pointer from the handler's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerAction {
    /// First pointer of the handler went down.
    Down,
    /// Another pointer joined while the handler already tracks some.
    Add,
    Move,
    /// A pointer lifted while others remain.
    Remove,
    /// The handler's last pointer lifted.
    Up,
    HoverEnter,
    HoverMove,
    HoverLeave,
}

impl PointerAction {
    /// Whether the acting pointer leaves the handler with this action.
    pub fn is_release(self) -> bool {
        matches!(
            self,
            PointerAction::Remove | PointerAction::Up | PointerAction::HoverLeave
        )
    }

    /// Whether the acting pointer starts being tracked with this action.
    pub fn is_press(self) -> bool {
        matches!(
            self,
            PointerAction::Down | PointerAction::Add | PointerAction::HoverEnter
        )
    }
}

/// Input to one recognition step.
///
/// `tracker` is the handler's own view of its pointers and already reflects
/// `event`. On release actions the lifting pointer is still present.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub action: PointerAction,
    pub event: &'a PointerEvent,
    pub state: HandlerState,
    pub tracker: &'a PointerTracker,
    pub touch_slop: f32,
    /// Whether the pointer lies inside the handler's view.
    pub inside: bool,
}

impl StepContext<'_> {
    pub fn timestamp(&self) -> Duration {
        self.event.timestamp
    }

    /// Pointers that stay tracked once this step is over.
    pub fn remaining_pointers(&self) -> usize {
        if self.action.is_release() {
            self.tracker.len().saturating_sub(1)
        } else {
            self.tracker.len()
        }
    }
}

/// The outcome a recognizer requests for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Keep the current state.
    Stay,
    /// Move to `ACTIVE`.
    Activate,
    /// Move to `ACTIVE` and immediately to `END` (discrete gestures).
    Complete,
    /// Finish successfully from `ACTIVE`; from `BEGAN` this fails.
    End,
    /// Give up; from `ACTIVE` this cancels.
    Fail,
    /// Abort the gesture.
    Cancel,
}

/// A recognizer of any kind.
#[derive(Debug, Clone)]
pub enum Recognizer {
    Tap(TapRecognizer),
    LongPress(LongPressRecognizer),
    Pan(PanRecognizer),
    Pinch(PinchRecognizer),
    Rotation(RotationRecognizer),
    Fling(FlingRecognizer),
    ForceTouch(ForceTouchRecognizer),
    Native(NativeRecognizer),
    Manual(ManualRecognizer),
    Hover(HoverRecognizer),
}

impl Recognizer {
    pub fn new(config: &RecognizerConfig) -> Self {
        match config {
            RecognizerConfig::Tap(c) => Recognizer::Tap(TapRecognizer::new(c.clone())),
            RecognizerConfig::LongPress(c) => {
                Recognizer::LongPress(LongPressRecognizer::new(c.clone()))
            }
            RecognizerConfig::Pan(c) => Recognizer::Pan(PanRecognizer::new(c.clone())),
            RecognizerConfig::Pinch(c) => Recognizer::Pinch(PinchRecognizer::new(c.clone())),
            RecognizerConfig::Rotation(c) => {
                Recognizer::Rotation(RotationRecognizer::new(c.clone()))
            }
            RecognizerConfig::Fling(c) => Recognizer::Fling(FlingRecognizer::new(c.clone())),
            RecognizerConfig::ForceTouch(c) => {
                Recognizer::ForceTouch(ForceTouchRecognizer::new(c.clone()))
            }
            RecognizerConfig::Native(c) => Recognizer::Native(NativeRecognizer::new(c.clone())),
            RecognizerConfig::Manual(_) => Recognizer::Manual(ManualRecognizer::new()),
            RecognizerConfig::Hover(_) => Recognizer::Hover(HoverRecognizer::new()),
        }
    }

    pub fn kind(&self) -> HandlerKind {
        match self {
            Recognizer::Tap(_) => HandlerKind::Tap,
            Recognizer::LongPress(_) => HandlerKind::LongPress,
            Recognizer::Pan(_) => HandlerKind::Pan,
            Recognizer::Pinch(_) => HandlerKind::Pinch,
            Recognizer::Rotation(_) => HandlerKind::Rotation,
            Recognizer::Fling(_) => HandlerKind::Fling,
            Recognizer::ForceTouch(_) => HandlerKind::ForceTouch,
            Recognizer::Native(_) => HandlerKind::Native,
            Recognizer::Manual(_) => HandlerKind::Manual,
            Recognizer::Hover(_) => HandlerKind::Hover,
        }
    }

    /// Run one recognition step.
    pub fn step(&mut self, cx: &StepContext<'_>) -> std::result::Result<Decision, StepError> {
        let position = cx.event.position;
        if !position.is_finite() {
            return Err(StepError::NonFinitePosition {
                pointer: cx.event.pointer_id.0,
                x: position.x,
                y: position.y,
            });
        }
        Ok(match self {
            Recognizer::Tap(r) => r.step(cx),
            Recognizer::LongPress(r) => r.step(cx),
            Recognizer::Pan(r) => r.step(cx),
            Recognizer::Pinch(r) => r.step(cx),
            Recognizer::Rotation(r) => r.step(cx),
            Recognizer::Fling(r) => r.step(cx),
            Recognizer::ForceTouch(r) => r.step(cx)?,
            Recognizer::Native(r) => r.step(cx),
            Recognizer::Manual(r) => r.step(cx),
            Recognizer::Hover(r) => r.step(cx),
        })
    }

    /// The time at which the recognizer wants [`Recognizer::on_deadline`] to
    /// run, if any.
    pub fn deadline(&self) -> Option<Duration> {
        match self {
            Recognizer::Tap(r) => r.deadline(),
            Recognizer::LongPress(r) => r.deadline(),
            Recognizer::Pan(r) => r.deadline(),
            Recognizer::Fling(r) => r.deadline(),
            _ => None,
        }
    }

    /// React to the clock passing the requested deadline.
    pub fn on_deadline(&mut self, now: Duration, state: HandlerState) -> Decision {
        match self {
            Recognizer::Tap(r) => r.on_deadline(now, state),
            Recognizer::LongPress(r) => r.on_deadline(now, state),
            Recognizer::Pan(r) => r.on_deadline(now, state),
            Recognizer::Fling(r) => r.on_deadline(now, state),
            _ => Decision::Stay,
        }
    }

    /// Event payload derived from the current accumulators.
    pub fn payload(&self, tracker: &PointerTracker, now: Duration) -> GesturePayload {
        match self {
            Recognizer::Tap(r) => r.payload(),
            Recognizer::LongPress(r) => r.payload(now),
            Recognizer::Pan(r) => r.payload(),
            Recognizer::Pinch(r) => r.payload(),
            Recognizer::Rotation(r) => r.payload(),
            Recognizer::Fling(r) => r.payload(),
            Recognizer::ForceTouch(r) => r.payload(),
            Recognizer::Native(r) => r.payload(),
            Recognizer::Manual(r) => r.payload(tracker),
            Recognizer::Hover(r) => r.payload(tracker),
        }
    }

    /// Clear episode accumulators, keeping the configuration.
    pub fn reset(&mut self) {
        match self {
            Recognizer::Tap(r) => r.reset(),
            Recognizer::LongPress(r) => r.reset(),
            Recognizer::Pan(r) => r.reset(),
            Recognizer::Pinch(r) => r.reset(),
            Recognizer::Rotation(r) => r.reset(),
            Recognizer::Fling(r) => r.reset(),
            Recognizer::ForceTouch(r) => r.reset(),
            Recognizer::Native(r) => r.reset(),
            Recognizer::Manual(r) => r.reset(),
            Recognizer::Hover(r) => r.reset(),
        }
    }

    /// Swap in a new configuration of the same kind. Accumulators are kept so an
    /// in-flight episode continues under the new parameters.
    pub fn reconfigure(&mut self, config: &RecognizerConfig) -> Result<()> {
        match (self, config) {
            (Recognizer::Tap(r), RecognizerConfig::Tap(c)) => r.config = c.clone(),
            (Recognizer::LongPress(r), RecognizerConfig::LongPress(c)) => r.config = c.clone(),
            (Recognizer::Pan(r), RecognizerConfig::Pan(c)) => r.config = c.clone(),
            (Recognizer::Pinch(r), RecognizerConfig::Pinch(c)) => r.config = c.clone(),
            (Recognizer::Rotation(r), RecognizerConfig::Rotation(c)) => r.config = c.clone(),
            (Recognizer::Fling(r), RecognizerConfig::Fling(c)) => r.config = c.clone(),
            (Recognizer::ForceTouch(r), RecognizerConfig::ForceTouch(c)) => r.config = c.clone(),
            (Recognizer::Native(r), RecognizerConfig::Native(c)) => r.config = c.clone(),
            (Recognizer::Manual(_), RecognizerConfig::Manual(_))
            | (Recognizer::Hover(_), RecognizerConfig::Hover(_)) => {}
            (recognizer, config) => {
                return Err(GestureError::KindMismatch {
                    expected: recognizer.kind(),
                    actual: config.kind(),
                });
            }
        }
        Ok(())
    }
}
