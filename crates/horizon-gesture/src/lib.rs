//! Gesture recognition and interaction resolution for Horizon Gesture.
//!
//! This crate turns raw pointer events into gesture state changes:
//!
//! - **Handlers**: ten recognizer kinds (tap, long press, pan, pinch, rotation,
//!   fling, force touch, native, manual, hover) walking one shared lifecycle
//! - **Relations**: simultaneous, require-to-fail, wait-for and sequence edges
//!   between handlers
//! - **Composition**: race, simultaneous, exclusive and sequence combinators
//!   lowered into relations
//! - **Orchestrator**: hit-testing, pointer ownership, exclusivity and event
//!   delivery
//!
//! The engine is driven by the host: feed it pointer events and advance its
//! clock. It never reads wall-clock time and never spawns threads.
//!
//! # Tap Example
//!
//! ```
//! use std::time::Duration;
//! use horizon_gesture::{
//!     HandlerConfig, HandlerState, InteractionOrchestrator, Rect, TapConfig, ViewId, ViewTree,
//! };
//!
//! let mut views = ViewTree::new();
//! views.insert(ViewId(1), None, Rect::new(0.0, 0.0, 100.0, 100.0))?;
//!
//! let mut engine = InteractionOrchestrator::new(views);
//! let tap = engine.create(ViewId(1), HandlerConfig::new(TapConfig::default()))?;
//!
//! engine.on_pointer_down(1, 10.0, 10.0, Duration::ZERO);
//! let events = engine.on_pointer_up(1, 11.0, 10.0, Duration::from_millis(60));
//!
//! let states: Vec<HandlerState> = events
//!     .iter()
//!     .filter(|e| e.tag() == tap)
//!     .filter_map(|e| e.transition())
//!     .map(|(_, new)| new)
//!     .collect();
//! assert_eq!(states, vec![HandlerState::Active, HandlerState::End]);
//! # Ok::<(), horizon_gesture::GestureError>(())
//! ```
//!
//! # Composition Example
//!
//! ```
//! use horizon_gesture::{
//!     Gesture, HandlerConfig, InteractionOrchestrator, TapConfig, ViewId, ViewTree,
//! };
//!
//! let mut engine = InteractionOrchestrator::new(ViewTree::new());
//! let double = engine.create(ViewId(1), HandlerConfig::new(TapConfig::taps(2)))?;
//! let single = engine.create(ViewId(1), HandlerConfig::new(TapConfig::default()))?;
//!
//! // The single tap only fires once the double tap has failed.
//! engine.apply_composition(&Gesture::exclusive([double, single]))?;
//! assert_eq!(engine.relations().blocked_by(double), vec![single]);
//! # Ok::<(), horizon_gesture::GestureError>(())
//! ```

pub mod composition;
mod error;
pub mod event;
pub mod handler;
pub mod hit_test;
pub mod orchestrator;
pub mod relation;
pub mod shared;

pub use composition::Gesture;
pub use error::{GestureError, Result, StepError};
pub use event::{GestureEvent, GesturePayload, Listener, TouchEventKind};
pub use handler::fling::{Directions, FlingConfig};
pub use handler::force_touch::ForceTouchConfig;
pub use handler::hover::HoverConfig;
pub use handler::long_press::LongPressConfig;
pub use handler::manual::ManualConfig;
pub use handler::native::NativeConfig;
pub use handler::pan::PanConfig;
pub use handler::pinch::PinchConfig;
pub use handler::rotation::RotationConfig;
pub use handler::tap::TapConfig;
pub use handler::{
    CommonConfig, Decision, HandlerConfig, HandlerKind, HandlerTag, HitSlop, PointerAction,
    Recognizer, RecognizerConfig, StepContext,
};
pub use hit_test::{HitTest, ViewId, ViewTree};
pub use orchestrator::InteractionOrchestrator;
pub use relation::{Relation, RelationGraph, RelationKind, Resolution, Verdict};
pub use shared::SharedOrchestrator;

pub use horizon_gesture_core::{
    is_legal_path, EngineConfig, HandlerState, Point, PointerEvent, PointerId, PointerKind,
    PointerPhase, PointerSnapshot, PointerTracker, Rect, Vector,
};
