//! Pressure-driven recognition.

use horizon_gesture_core::{HandlerState, Point};
use serde::{Deserialize, Serialize};

use super::recognizer::{Decision, PointerAction, StepContext};
use crate::error::{GestureError, Result, StepError};
use crate::event::GesturePayload;

pub const DEFAULT_MIN_FORCE: f32 = 0.2;

pub const DEFAULT_MAX_FORCE: f32 = 1.0;

/// Force thresholds on the normalized `0.0..=1.0` pressure scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ForceTouchConfig {
    pub min_force: f32,
    /// Pressing harder than this gives up.
    pub max_force: f32,
}

impl Default for ForceTouchConfig {
    fn default() -> Self {
        Self {
            min_force: DEFAULT_MIN_FORCE,
            max_force: DEFAULT_MAX_FORCE,
        }
    }
}

impl ForceTouchConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.min_force.is_finite() || self.min_force < 0.0 {
            return Err(GestureError::invalid_config(
                "minForce",
                "must be a finite, non-negative force",
            ));
        }
        if !self.max_force.is_finite() || self.max_force < self.min_force {
            return Err(GestureError::invalid_config(
                "maxForce",
                "must be finite and not below minForce",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ForceTouchRecognizer {
    pub(crate) config: ForceTouchConfig,
    position: Point,
    force: f32,
}

impl ForceTouchRecognizer {
    pub fn new(config: ForceTouchConfig) -> Self {
        Self {
            config,
            position: Point::ZERO,
            force: 0.0,
        }
    }

    fn read_force(cx: &StepContext<'_>) -> std::result::Result<f32, StepError> {
        let pointer = cx.event.pointer_id.0;
        let force = cx
            .event
            .force
            .ok_or(StepError::ForceUnavailable { pointer })?;
        if !force.is_finite() || force < 0.0 {
            return Err(StepError::InvalidForce { pointer, force });
        }
        Ok(force)
    }

    pub(crate) fn step(&mut self, cx: &StepContext<'_>) -> std::result::Result<Decision, StepError> {
        self.position = cx.event.position;
        match cx.action {
            PointerAction::Up if cx.state == HandlerState::Active => return Ok(Decision::End),
            PointerAction::Up => return Ok(Decision::Fail),
            PointerAction::Remove | PointerAction::HoverLeave => return Ok(Decision::Stay),
            _ => {}
        }

        self.force = Self::read_force(cx)?;
        if self.force > self.config.max_force {
            return Ok(Decision::Fail);
        }
        if cx.state == HandlerState::Began && self.force >= self.config.min_force {
            return Ok(Decision::Activate);
        }
        Ok(Decision::Stay)
    }

    pub(crate) fn payload(&self) -> GesturePayload {
        GesturePayload::ForceTouch {
            position: self.position,
            force: self.force,
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }
}
