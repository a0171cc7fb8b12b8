//! Events the engine produces for consumers.
//!
//! Every committed transition yields one [`GestureEvent::StateChange`]. While a
//! handler is `ACTIVE` each pointer update it consumes yields a
//! [`GestureEvent::Update`]. Payloads are computed at the moment the event is
//! produced and never recomputed afterwards.

use std::time::Duration;

use horizon_gesture_core::{HandlerState, Point, PointerSnapshot, Vector};

use crate::error::StepError;
use crate::handler::HandlerTag;

/// Recognizer-specific data attached to state-change and update events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GesturePayload {
    Tap {
        position: Point,
    },
    LongPress {
        position: Point,
        /// Time since the press started.
        duration: Duration,
    },
    Pan {
        position: Point,
        /// Displacement of the pointer centroid since the gesture started.
        translation: Vector,
        velocity: Vector,
    },
    Pinch {
        focal: Point,
        scale: f32,
        /// Scale change per second.
        velocity: f32,
    },
    Rotation {
        anchor: Point,
        /// Accumulated rotation in radians, clockwise positive in screen space.
        rotation: f32,
        /// Radians per second.
        velocity: f32,
    },
    Fling {
        position: Point,
    },
    ForceTouch {
        position: Point,
        force: f32,
    },
    Native {
        position: Point,
        pointer_inside: bool,
    },
    Manual {
        position: Point,
    },
    Hover {
        position: Point,
    },
}

impl GesturePayload {
    /// Position the payload refers to (centroid, focal point or anchor).
    pub fn position(&self) -> Point {
        match *self {
            GesturePayload::Tap { position }
            | GesturePayload::LongPress { position, .. }
            | GesturePayload::Pan { position, .. }
            | GesturePayload::Fling { position }
            | GesturePayload::ForceTouch { position, .. }
            | GesturePayload::Native { position, .. }
            | GesturePayload::Manual { position }
            | GesturePayload::Hover { position } => position,
            GesturePayload::Pinch { focal, .. } => focal,
            GesturePayload::Rotation { anchor, .. } => anchor,
        }
    }
}

/// Kind of a raw touch event forwarded to handlers that need pointer data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchEventKind {
    Down,
    Move,
    Up,
    Cancelled,
}

/// An event produced by the engine for one handler.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent {
    /// A committed state transition.
    StateChange {
        tag: HandlerTag,
        old_state: HandlerState,
        new_state: HandlerState,
        timestamp: Duration,
        number_of_pointers: usize,
        payload: GesturePayload,
    },
    /// Progress of an `ACTIVE` handler.
    Update {
        tag: HandlerTag,
        state: HandlerState,
        timestamp: Duration,
        number_of_pointers: usize,
        payload: GesturePayload,
    },
    /// Raw pointer data for handlers configured with `needs_pointer_data`.
    Touch {
        tag: HandlerTag,
        kind: TouchEventKind,
        changed: Vec<PointerSnapshot>,
        all: Vec<PointerSnapshot>,
        timestamp: Duration,
    },
    /// A recognizer step failed; the handler has been failed or cancelled.
    Error {
        tag: HandlerTag,
        error: StepError,
        timestamp: Duration,
    },
}

impl GestureEvent {
    /// The handler this event belongs to.
    pub fn tag(&self) -> HandlerTag {
        match self {
            GestureEvent::StateChange { tag, .. }
            | GestureEvent::Update { tag, .. }
            | GestureEvent::Touch { tag, .. }
            | GestureEvent::Error { tag, .. } => *tag,
        }
    }

    pub fn timestamp(&self) -> Duration {
        match self {
            GestureEvent::StateChange { timestamp, .. }
            | GestureEvent::Update { timestamp, .. }
            | GestureEvent::Touch { timestamp, .. }
            | GestureEvent::Error { timestamp, .. } => *timestamp,
        }
    }

    /// `(old, new)` for state-change events.
    pub fn transition(&self) -> Option<(HandlerState, HandlerState)> {
        match self {
            GestureEvent::StateChange {
                old_state,
                new_state,
                ..
            } => Some((*old_state, *new_state)),
            _ => None,
        }
    }

    pub fn payload(&self) -> Option<&GesturePayload> {
        match self {
            GestureEvent::StateChange { payload, .. } | GestureEvent::Update { payload, .. } => {
                Some(payload)
            }
            _ => None,
        }
    }
}

/// Callback invoked with every event of one handler, in emission order.
pub type Listener = Box<dyn FnMut(&GestureEvent) + Send>;
