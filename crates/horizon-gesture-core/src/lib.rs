//! Core building blocks for Horizon Gesture.
//!
//! This crate holds the policy-free pieces the gesture engine is built from:
//!
//! - **Geometry**: points, vectors and rectangles in logical units
//! - **Pointer tracking**: the live pointer table with bounded history and
//!   velocity estimation
//! - **Handler states**: the lifecycle graph every recognizer walks
//! - **Deadlines**: a clock-driven queue for recognizer timeouts
//! - **Configuration**: engine-wide settings loaded from TOML
//!
//! # Tracking Example
//!
//! ```
//! use std::time::Duration;
//! use horizon_gesture_core::{PointerEvent, PointerId, PointerPhase, PointerTracker};
//!
//! let mut tracker = PointerTracker::new();
//! tracker.add_pointer(&PointerEvent::new(1, PointerPhase::Down, 0.0, 0.0, Duration::ZERO));
//! tracker.update_pointer(&PointerEvent::new(
//!     1,
//!     PointerPhase::Move,
//!     10.0,
//!     0.0,
//!     Duration::from_millis(100),
//! ));
//!
//! let velocity = tracker.velocity(PointerId(1));
//! assert!((velocity.dx - 100.0).abs() < 0.01);
//! ```

pub mod config;
pub mod deadline;
mod error;
pub mod geometry;
pub mod logging;
pub mod pointer;
pub mod state;

pub use config::{EngineConfig, DEFAULT_MAX_POINTERS, DEFAULT_TOUCH_SLOP};
pub use deadline::{DeadlineId, DeadlineQueue};
pub use error::{ConfigError, Result};
pub use geometry::{Point, Rect, Vector};
pub use logging::PerfSpan;
pub use pointer::{
    Pointer, PointerEvent, PointerId, PointerKind, PointerPhase, PointerSnapshot, PointerTracker,
    Sample, DEFAULT_HISTORY_CAPACITY, DEFAULT_VELOCITY_WINDOW,
};
pub use state::{is_legal_path, HandlerState};
