//! Gesture handlers.
//!
//! A handler is one armed recognizer attached to a view. It is identified by a
//! [`HandlerTag`] (a generational arena key, so a dropped tag is never confused
//! with a later handler) and carries its configuration, its recognizer and the
//! bookkeeping of the current episode.

mod config;
pub mod fling;
pub mod force_touch;
pub mod hover;
pub mod long_press;
pub mod manual;
pub mod native;
pub mod pan;
pub mod pinch;
mod recognizer;
pub mod rotation;
pub mod tap;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use horizon_gesture_core::{DeadlineId, HandlerState, PointerEvent, PointerId, PointerTracker};
use slotmap::new_key_type;

pub use config::{CommonConfig, HandlerConfig, HitSlop, RecognizerConfig};
pub use recognizer::{Decision, PointerAction, Recognizer, StepContext};

use crate::error::GestureError;
use crate::hit_test::ViewId;

new_key_type! {
    /// A unique identifier for a handler.
    ///
    /// Tags stay valid until the handler is dropped. Slots are reused, but the
    /// generation counter makes a stale tag miss instead of aliasing.
    pub struct HandlerTag;
}

impl HandlerTag {
    /// Convert the tag to a raw u64 value for platform bridges.
    #[inline]
    pub fn as_raw(self) -> u64 {
        use slotmap::Key;
        self.data().as_ffi()
    }

    /// Rebuild a tag from a raw u64 value.
    ///
    /// This does not check that the handler exists.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self::from(slotmap::KeyData::from_ffi(raw))
    }
}

impl fmt::Display for HandlerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler#{:x}", self.as_raw())
    }
}

/// The recognizer variant of a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    Tap,
    LongPress,
    Pan,
    Pinch,
    Rotation,
    Fling,
    ForceTouch,
    Native,
    Manual,
    Hover,
}

impl HandlerKind {
    pub const ALL: [HandlerKind; 10] = [
        HandlerKind::Tap,
        HandlerKind::LongPress,
        HandlerKind::Pan,
        HandlerKind::Pinch,
        HandlerKind::Rotation,
        HandlerKind::Fling,
        HandlerKind::ForceTouch,
        HandlerKind::Native,
        HandlerKind::Manual,
        HandlerKind::Hover,
    ];

    /// Canonical camelCase name.
    pub const fn name(self) -> &'static str {
        match self {
            HandlerKind::Tap => "tap",
            HandlerKind::LongPress => "longPress",
            HandlerKind::Pan => "pan",
            HandlerKind::Pinch => "pinch",
            HandlerKind::Rotation => "rotation",
            HandlerKind::Fling => "fling",
            HandlerKind::ForceTouch => "forceTouch",
            HandlerKind::Native => "native",
            HandlerKind::Manual => "manual",
            HandlerKind::Hover => "hover",
        }
    }

    /// Hover handlers follow hovering pointers; every other kind follows
    /// contacts.
    pub const fn is_hover(self) -> bool {
        matches!(self, HandlerKind::Hover)
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HandlerKind {
    type Err = GestureError;

    /// Accepts the canonical name and the `XxxGestureHandler` spelling used by
    /// platform bridges.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_suffix("GestureHandler").unwrap_or(s);
        HandlerKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| GestureError::UnknownKind(s.to_string()))
    }
}

/// A pointer action held back while the handler waits on a relation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BufferedInput {
    pub action: PointerAction,
    pub event: PointerEvent,
}

/// Registry entry for one handler.
#[derive(Debug)]
pub(crate) struct Handler {
    pub tag: HandlerTag,
    pub view: ViewId,
    pub config: HandlerConfig,
    pub recognizer: Recognizer,
    pub state: HandlerState,
    /// Pointers currently attached to this handler.
    pub owned: BTreeSet<PointerId>,
    /// Every pointer attached during the current episode.
    pub episode_pointers: BTreeSet<PointerId>,
    /// The handler's own view of its pointers, fed only by recognition steps.
    pub tracker: PointerTracker,
    /// Actions received while blocked in `UNDETERMINED`.
    pub buffered: Vec<BufferedInput>,
    /// An activation waiting on a relation; `true` when it completes on commit.
    pub pending_activation: Option<bool>,
    pub deadline: Option<DeadlineId>,
    /// Armed by a sequence predecessor ending.
    pub armed: bool,
}

impl Handler {
    pub fn new(tag: HandlerTag, view: ViewId, config: HandlerConfig, tracker: PointerTracker) -> Self {
        let recognizer = Recognizer::new(&config.recognizer);
        Self {
            tag,
            view,
            config,
            recognizer,
            state: HandlerState::Undetermined,
            owned: BTreeSet::new(),
            episode_pointers: BTreeSet::new(),
            tracker,
            buffered: Vec::new(),
            pending_activation: None,
            deadline: None,
            armed: false,
        }
    }

    pub fn kind(&self) -> HandlerKind {
        self.config.kind()
    }

    /// Whether the handler takes part in the current episode.
    pub fn is_participating(&self) -> bool {
        self.state != HandlerState::Undetermined
            || !self.owned.is_empty()
            || !self.buffered.is_empty()
    }

    /// Waiting in `UNDETERMINED` for a relation to resolve.
    pub fn is_blocked(&self) -> bool {
        self.state == HandlerState::Undetermined && !self.buffered.is_empty()
    }

    pub fn shares_pointers_with(&self, other: &Handler) -> bool {
        !self.episode_pointers.is_disjoint(&other.episode_pointers)
    }

    /// Return to `UNDETERMINED` for the next episode.
    pub fn reset(&mut self) {
        self.state = HandlerState::Undetermined;
        self.tracker.clear();
        self.recognizer.reset();
        self.episode_pointers = self.owned.clone();
        self.buffered.clear();
        self.pending_activation = None;
    }
}
