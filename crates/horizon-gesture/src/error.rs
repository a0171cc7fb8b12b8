//! Error types for the gesture engine.

use horizon_gesture_core::ConfigError;

use crate::handler::{HandlerKind, HandlerTag};
use crate::hit_test::ViewId;
use crate::relation::RelationKind;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, GestureError>;

/// Configuration and registration errors, reported synchronously to the caller.
///
/// Nothing is installed when one of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum GestureError {
    /// The handler kind name is not recognized.
    #[error("Unknown handler kind '{0}'")]
    UnknownKind(String),

    /// A relation or composition refers to a handler that does not exist.
    #[error("Unknown handler {0}")]
    UnknownHandler(HandlerTag),

    /// A view was referenced that the hit tester does not know.
    #[error("Unknown view {0}")]
    UnknownView(ViewId),

    /// The view is already registered.
    #[error("View {0} already exists")]
    DuplicateView(ViewId),

    /// Re-parenting a view would create a cycle.
    #[error("Setting the parent of view {view} would create a cycle")]
    CircularViewParentage { view: ViewId },

    /// A handler cannot relate to itself.
    #[error("Handler {tag} cannot have a '{kind}' relation with itself")]
    SelfRelation { tag: HandlerTag, kind: RelationKind },

    /// The relation would close a cycle of blocking or ordering edges.
    #[error("Relation {from} -{kind}-> {to} would create a cycle")]
    CyclicRelation {
        from: HandlerTag,
        to: HandlerTag,
        kind: RelationKind,
    },

    /// A handler configuration field is out of range or inconsistent.
    #[error("Invalid configuration for '{field}': {message}")]
    InvalidConfig { field: String, message: String },

    /// A configuration of one kind was applied to a handler of another.
    #[error("Configuration for {actual} cannot be applied to a {expected} handler")]
    KindMismatch {
        expected: HandlerKind,
        actual: HandlerKind,
    },

    /// A configuration payload was not valid JSON for the handler kind.
    #[error("Invalid configuration payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Engine-wide configuration error.
    #[error("Engine configuration error: {0}")]
    Engine(#[from] ConfigError),
}

impl GestureError {
    /// Create an invalid configuration error.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A failure inside a single recognizer step.
///
/// These never abort a dispatch pass: the failing handler is forced to
/// `FAILED` (or `CANCELLED` when it was `ACTIVE`) and the error is reported to
/// its listener.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StepError {
    /// The pointer event carried NaN or infinite coordinates.
    #[error("Pointer {pointer} reported a non-finite position ({x}, {y})")]
    NonFinitePosition { pointer: u32, x: f32, y: f32 },

    /// A force recognizer received a pointer without pressure data.
    #[error("Pointer {pointer} does not report force")]
    ForceUnavailable { pointer: u32 },

    /// The force reading is not a usable number.
    #[error("Pointer {pointer} reported an invalid force reading {force}")]
    InvalidForce { pointer: u32, force: f32 },
}
