//! Logging facilities for Horizon Gesture.
//!
//! The engine is instrumented with the `tracing` crate. Install a subscriber in
//! the host application to see the output:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_gesture=debug")
//!     .init();
//! ```
//!
//! Every subsystem logs under its own target (see [`targets`]), so a filter such
//! as `horizon_gesture::relation=trace` isolates relation verdicts.

/// Span names used by the dispatch loop.
pub mod span_names {
    /// One full pointer event pass.
    pub const DISPATCH: &str = "horizon_gesture::dispatch";
    /// Deadline processing triggered by a clock advance.
    pub const DEADLINES: &str = "horizon_gesture::deadlines";
    /// Re-evaluation of handlers waiting on relations.
    pub const SETTLE: &str = "horizon_gesture::settle";
}

/// Target names for log filtering.
pub mod targets {
    /// Core building blocks target.
    pub const CORE: &str = "horizon_gesture_core";
    /// Pointer tracker target.
    pub const TRACKER: &str = "horizon_gesture::tracker";
    /// Deadline queue target.
    pub const DEADLINE: &str = "horizon_gesture::deadline";
    /// Configuration loading target.
    pub const CONFIG: &str = "horizon_gesture::config";
    /// Handler state machine target.
    pub const HANDLER: &str = "horizon_gesture::handler";
    /// Relation graph target.
    pub const RELATION: &str = "horizon_gesture::relation";
    /// Interaction orchestrator target.
    pub const ORCHESTRATOR: &str = "horizon_gesture::orchestrator";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Used to time a whole dispatch pass.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create and enter a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::debug_span!(target: "horizon_gesture::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}
