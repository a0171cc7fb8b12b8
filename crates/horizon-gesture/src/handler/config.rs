//! Handler configuration.
//!
//! A [`HandlerConfig`] pairs settings shared by every recognizer
//! ([`CommonConfig`]) with the recognizer-specific parameters
//! ([`RecognizerConfig`]). Platform bridges exchange configurations as flat JSON
//! objects with camelCase keys, e.g.
//!
//! ```json
//! { "enabled": true, "numberOfTaps": 2, "maxDelay": 300 }
//! ```
//!
//! Durations are expressed in milliseconds. Unknown keys are ignored so that a
//! bridge may pass through props meant for other layers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use horizon_gesture_core::Rect;

use super::fling::FlingConfig;
use super::force_touch::ForceTouchConfig;
use super::hover::HoverConfig;
use super::long_press::LongPressConfig;
use super::manual::ManualConfig;
use super::native::NativeConfig;
use super::pan::PanConfig;
use super::pinch::PinchConfig;
use super::rotation::RotationConfig;
use super::tap::TapConfig;
use super::HandlerKind;
use crate::error::{GestureError, Result};

/// Serde helpers for durations stored as whole milliseconds.
pub(crate) mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let ms = f64::deserialize(deserializer)?;
        if !ms.is_finite() || ms < 0.0 {
            return Err(serde::de::Error::custom(
                "duration must be a non-negative number of milliseconds",
            ));
        }
        Ok(Duration::from_nanos((ms * 1_000_000.0).round() as u64))
    }
}

/// Reject a distance-like value that is negative or not a number.
pub(crate) fn check_distance(field: &str, value: Option<f32>) -> Result<()> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(GestureError::invalid_config(
            field,
            "must be a finite, non-negative number",
        )),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum HitSlopRepr {
    Uniform(f32),
    Edges(HitSlopEdges),
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HitSlopEdges {
    left: Option<f32>,
    top: Option<f32>,
    right: Option<f32>,
    bottom: Option<f32>,
    horizontal: Option<f32>,
    vertical: Option<f32>,
    width: Option<f32>,
    height: Option<f32>,
}

impl From<HitSlopRepr> for HitSlop {
    fn from(repr: HitSlopRepr) -> Self {
        match repr {
            HitSlopRepr::Uniform(v) => HitSlop {
                horizontal: Some(v),
                vertical: Some(v),
                ..HitSlop::default()
            },
            HitSlopRepr::Edges(e) => HitSlop {
                left: e.left,
                top: e.top,
                right: e.right,
                bottom: e.bottom,
                horizontal: e.horizontal,
                vertical: e.vertical,
                width: e.width,
                height: e.height,
            },
        }
    }
}

/// Adjustment of the region in which a pointer-down attaches to a handler.
///
/// Positive edge values grow the view's bounds outward, negative values shrink
/// them. `width`/`height` pin the region's size relative to the given edge.
/// A bare number in JSON is shorthand for equal `horizontal` and `vertical`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "HitSlopRepr", rename_all = "camelCase")]
pub struct HitSlop {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
}

impl HitSlop {
    /// Same slop on every edge.
    pub fn uniform(value: f32) -> Self {
        HitSlopRepr::Uniform(value).into()
    }

    pub fn validate(&self) -> Result<()> {
        let all = [
            self.left,
            self.top,
            self.right,
            self.bottom,
            self.horizontal,
            self.vertical,
            self.width,
            self.height,
        ];
        if all.iter().flatten().any(|v| !v.is_finite()) {
            return Err(GestureError::invalid_config(
                "hitSlop",
                "values must be finite",
            ));
        }
        if self.width.is_some() {
            match (self.left.is_some(), self.right.is_some()) {
                (true, true) => {
                    return Err(GestureError::invalid_config(
                        "hitSlop",
                        "cannot define left, right and width at the same time",
                    ));
                }
                (false, false) => {
                    return Err(GestureError::invalid_config(
                        "hitSlop",
                        "width requires left or right",
                    ));
                }
                _ => {}
            }
        }
        if self.height.is_some() {
            match (self.top.is_some(), self.bottom.is_some()) {
                (true, true) => {
                    return Err(GestureError::invalid_config(
                        "hitSlop",
                        "cannot define top, bottom and height at the same time",
                    ));
                }
                (false, false) => {
                    return Err(GestureError::invalid_config(
                        "hitSlop",
                        "height requires top or bottom",
                    ));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// The attach region for a view with the given bounds.
    pub fn apply(&self, bounds: Rect) -> Rect {
        let mut left = 0.0;
        let mut top = 0.0;
        let mut right = bounds.width;
        let mut bottom = bounds.height;

        if let Some(h) = self.horizontal {
            left -= h;
            right += h;
        }
        if let Some(v) = self.vertical {
            top -= v;
            bottom += v;
        }
        if let Some(l) = self.left {
            left = -l;
        }
        if let Some(r) = self.right {
            right = bounds.width + r;
        }
        if let Some(t) = self.top {
            top = -t;
        }
        if let Some(b) = self.bottom {
            bottom = bounds.height + b;
        }
        if let Some(w) = self.width {
            if self.left.is_some() {
                right = left + w;
            } else if self.right.is_some() {
                left = right - w;
            }
        }
        if let Some(h) = self.height {
            if self.top.is_some() {
                bottom = top + h;
            } else if self.bottom.is_some() {
                top = bottom - h;
            }
        }

        Rect::new(
            bounds.x + left,
            bounds.y + top,
            right - left,
            bottom - top,
        )
    }
}

/// Settings every handler understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CommonConfig {
    /// Disabled handlers never become candidates.
    pub enabled: bool,
    /// Moving outside the view cancels an active handler and fails a began one.
    pub should_cancel_when_outside: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hit_slop: Option<HitSlop>,
    /// Forward raw touch events to the handler's listener.
    pub needs_pointer_data: bool,
    /// The recognizer's own activation requests are ignored; the consumer
    /// activates the handler explicitly.
    pub manual_activation: bool,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            should_cancel_when_outside: false,
            hit_slop: None,
            needs_pointer_data: false,
            manual_activation: false,
        }
    }
}

impl CommonConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(slop) = &self.hit_slop {
            slop.validate()?;
        }
        Ok(())
    }
}

/// Recognizer-specific configuration, one variant per handler kind.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognizerConfig {
    Tap(TapConfig),
    LongPress(LongPressConfig),
    Pan(PanConfig),
    Pinch(PinchConfig),
    Rotation(RotationConfig),
    Fling(FlingConfig),
    ForceTouch(ForceTouchConfig),
    Native(NativeConfig),
    Manual(ManualConfig),
    Hover(HoverConfig),
}

impl RecognizerConfig {
    /// Default parameters for a kind.
    pub fn default_for(kind: HandlerKind) -> Self {
        match kind {
            HandlerKind::Tap => RecognizerConfig::Tap(TapConfig::default()),
            HandlerKind::LongPress => RecognizerConfig::LongPress(LongPressConfig::default()),
            HandlerKind::Pan => RecognizerConfig::Pan(PanConfig::default()),
            HandlerKind::Pinch => RecognizerConfig::Pinch(PinchConfig::default()),
            HandlerKind::Rotation => RecognizerConfig::Rotation(RotationConfig::default()),
            HandlerKind::Fling => RecognizerConfig::Fling(FlingConfig::default()),
            HandlerKind::ForceTouch => RecognizerConfig::ForceTouch(ForceTouchConfig::default()),
            HandlerKind::Native => RecognizerConfig::Native(NativeConfig::default()),
            HandlerKind::Manual => RecognizerConfig::Manual(ManualConfig::default()),
            HandlerKind::Hover => RecognizerConfig::Hover(HoverConfig::default()),
        }
    }

    pub fn kind(&self) -> HandlerKind {
        match self {
            RecognizerConfig::Tap(_) => HandlerKind::Tap,
            RecognizerConfig::LongPress(_) => HandlerKind::LongPress,
            RecognizerConfig::Pan(_) => HandlerKind::Pan,
            RecognizerConfig::Pinch(_) => HandlerKind::Pinch,
            RecognizerConfig::Rotation(_) => HandlerKind::Rotation,
            RecognizerConfig::Fling(_) => HandlerKind::Fling,
            RecognizerConfig::ForceTouch(_) => HandlerKind::ForceTouch,
            RecognizerConfig::Native(_) => HandlerKind::Native,
            RecognizerConfig::Manual(_) => HandlerKind::Manual,
            RecognizerConfig::Hover(_) => HandlerKind::Hover,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            RecognizerConfig::Tap(c) => c.validate(),
            RecognizerConfig::LongPress(c) => c.validate(),
            RecognizerConfig::Pan(c) => c.validate(),
            RecognizerConfig::Pinch(c) => c.validate(),
            RecognizerConfig::Rotation(c) => c.validate(),
            RecognizerConfig::Fling(c) => c.validate(),
            RecognizerConfig::ForceTouch(c) => c.validate(),
            RecognizerConfig::Native(_) | RecognizerConfig::Manual(_) | RecognizerConfig::Hover(_) => {
                Ok(())
            }
        }
    }

    fn from_json(kind: HandlerKind, value: Value) -> Result<Self> {
        Ok(match kind {
            HandlerKind::Tap => RecognizerConfig::Tap(serde_json::from_value(value)?),
            HandlerKind::LongPress => RecognizerConfig::LongPress(serde_json::from_value(value)?),
            HandlerKind::Pan => RecognizerConfig::Pan(serde_json::from_value(value)?),
            HandlerKind::Pinch => RecognizerConfig::Pinch(serde_json::from_value(value)?),
            HandlerKind::Rotation => RecognizerConfig::Rotation(serde_json::from_value(value)?),
            HandlerKind::Fling => RecognizerConfig::Fling(serde_json::from_value(value)?),
            HandlerKind::ForceTouch => {
                RecognizerConfig::ForceTouch(serde_json::from_value(value)?)
            }
            HandlerKind::Native => RecognizerConfig::Native(serde_json::from_value(value)?),
            HandlerKind::Manual => RecognizerConfig::Manual(serde_json::from_value(value)?),
            HandlerKind::Hover => RecognizerConfig::Hover(serde_json::from_value(value)?),
        })
    }

    fn to_json(&self) -> Result<Value> {
        Ok(match self {
            RecognizerConfig::Tap(c) => serde_json::to_value(c)?,
            RecognizerConfig::LongPress(c) => serde_json::to_value(c)?,
            RecognizerConfig::Pan(c) => serde_json::to_value(c)?,
            RecognizerConfig::Pinch(c) => serde_json::to_value(c)?,
            RecognizerConfig::Rotation(c) => serde_json::to_value(c)?,
            RecognizerConfig::Fling(c) => serde_json::to_value(c)?,
            RecognizerConfig::ForceTouch(c) => serde_json::to_value(c)?,
            RecognizerConfig::Native(c) => serde_json::to_value(c)?,
            RecognizerConfig::Manual(c) => serde_json::to_value(c)?,
            RecognizerConfig::Hover(c) => serde_json::to_value(c)?,
        })
    }
}

macro_rules! impl_from_config {
    ($($config:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$config> for RecognizerConfig {
                fn from(config: $config) -> Self {
                    RecognizerConfig::$variant(config)
                }
            }
        )*
    };
}

impl_from_config! {
    TapConfig => Tap,
    LongPressConfig => LongPress,
    PanConfig => Pan,
    PinchConfig => Pinch,
    RotationConfig => Rotation,
    FlingConfig => Fling,
    ForceTouchConfig => ForceTouch,
    NativeConfig => Native,
    ManualConfig => Manual,
    HoverConfig => Hover,
}

/// Full configuration of one handler.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerConfig {
    pub common: CommonConfig,
    pub recognizer: RecognizerConfig,
}

impl HandlerConfig {
    /// A configuration with default common settings.
    pub fn new(recognizer: impl Into<RecognizerConfig>) -> Self {
        Self {
            common: CommonConfig::default(),
            recognizer: recognizer.into(),
        }
    }

    /// Default configuration for a kind.
    pub fn default_for(kind: HandlerKind) -> Self {
        Self::new(RecognizerConfig::default_for(kind))
    }

    pub fn kind(&self) -> HandlerKind {
        self.recognizer.kind()
    }

    /// Replace the common settings.
    pub fn with_common(mut self, common: CommonConfig) -> Self {
        self.common = common;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.common.enabled = enabled;
        self
    }

    pub fn should_cancel_when_outside(mut self, value: bool) -> Self {
        self.common.should_cancel_when_outside = value;
        self
    }

    pub fn hit_slop(mut self, slop: HitSlop) -> Self {
        self.common.hit_slop = Some(slop);
        self
    }

    pub fn needs_pointer_data(mut self, value: bool) -> Self {
        self.common.needs_pointer_data = value;
        self
    }

    pub fn manual_activation(mut self, value: bool) -> Self {
        self.common.manual_activation = value;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.common.validate()?;
        self.recognizer.validate()
    }

    /// Parse a flat JSON object for `kind`. `null` yields the defaults.
    pub fn from_json(kind: HandlerKind, value: &Value) -> Result<Self> {
        let value = match value {
            Value::Null => Value::Object(Map::new()),
            Value::Object(_) => value.clone(),
            _ => {
                return Err(GestureError::invalid_config(
                    "config",
                    "expected a JSON object",
                ));
            }
        };
        let config = Self {
            common: serde_json::from_value(value.clone())?,
            recognizer: RecognizerConfig::from_json(kind, value)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Flatten to a JSON object.
    pub fn to_json(&self) -> Result<Value> {
        let mut merged = Map::new();
        if let Value::Object(common) = serde_json::to_value(&self.common)? {
            merged.extend(common);
        }
        if let Value::Object(specific) = self.recognizer.to_json()? {
            merged.extend(specific);
        }
        Ok(Value::Object(merged))
    }

    /// Apply a JSON object delta on top of this configuration. A `null` value
    /// for a key restores that key's default.
    pub fn merged(&self, delta: &Value) -> Result<Self> {
        let Value::Object(delta) = delta else {
            return Err(GestureError::invalid_config(
                "delta",
                "expected a JSON object",
            ));
        };
        let Value::Object(mut current) = self.to_json()? else {
            return Err(GestureError::invalid_config(
                "config",
                "configuration did not serialize to an object",
            ));
        };
        for (key, value) in delta {
            if value.is_null() {
                current.remove(key);
            } else {
                current.insert(key.clone(), value.clone());
            }
        }
        Self::from_json(self.kind(), &Value::Object(current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_from_json_defaults() {
        let config = HandlerConfig::from_json(HandlerKind::Tap, &Value::Null).unwrap();
        assert!(config.common.enabled);
        assert_eq!(config.recognizer, RecognizerConfig::Tap(TapConfig::default()));
    }

    #[test]
    fn test_from_json_mixed_keys() {
        let config = HandlerConfig::from_json(
            HandlerKind::Tap,
            &json!({ "enabled": false, "numberOfTaps": 2, "maxDelay": 250, "onGestureEvent": "ignored" }),
        )
        .unwrap();
        assert!(!config.common.enabled);
        let RecognizerConfig::Tap(tap) = config.recognizer else {
            panic!("expected tap config");
        };
        assert_eq!(tap.number_of_taps, 2);
        assert_eq!(tap.max_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        assert!(HandlerConfig::from_json(HandlerKind::Pan, &json!([1, 2])).is_err());
        assert!(matches!(
            HandlerConfig::from_json(HandlerKind::Pan, &json!({ "maxPointers": "many" })),
            Err(GestureError::Json(_))
        ));
    }

    #[test]
    fn test_merged_keeps_unrelated_fields() {
        let base = HandlerConfig::from_json(HandlerKind::Tap, &json!({ "numberOfTaps": 3 })).unwrap();
        let updated = base.merged(&json!({ "maxDuration": 900 })).unwrap();
        let RecognizerConfig::Tap(tap) = updated.recognizer else {
            panic!("expected tap config");
        };
        assert_eq!(tap.number_of_taps, 3);
        assert_eq!(tap.max_duration, Duration::from_millis(900));
    }

    #[test]
    fn test_merged_null_restores_default() {
        let base = HandlerConfig::from_json(HandlerKind::Tap, &json!({ "numberOfTaps": 3 })).unwrap();
        let updated = base.merged(&json!({ "numberOfTaps": null })).unwrap();
        let RecognizerConfig::Tap(tap) = updated.recognizer else {
            panic!("expected tap config");
        };
        assert_eq!(tap.number_of_taps, 1);
    }

    #[test]
    fn test_merged_validates() {
        let base = HandlerConfig::default_for(HandlerKind::Tap);
        assert!(matches!(
            base.merged(&json!({ "numberOfTaps": 0 })),
            Err(GestureError::InvalidConfig { .. })
        ));
    }

    // ===== Hit Slop Tests =====

    #[test]
    fn test_hit_slop_uniform_from_number() {
        let config = HandlerConfig::from_json(HandlerKind::Tap, &json!({ "hitSlop": 5 })).unwrap();
        let slop = config.common.hit_slop.unwrap();
        let region = slop.apply(Rect::new(10.0, 10.0, 20.0, 20.0));
        assert_eq!(region, Rect::new(5.0, 5.0, 30.0, 30.0));
    }

    #[test]
    fn test_hit_slop_negative_shrinks() {
        let slop = HitSlop {
            left: Some(-5.0),
            right: Some(-5.0),
            ..HitSlop::default()
        };
        let region = slop.apply(Rect::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(region, Rect::new(5.0, 0.0, 90.0, 50.0));
    }

    #[test]
    fn test_hit_slop_width_from_left() {
        let slop = HitSlop {
            left: Some(0.0),
            width: Some(30.0),
            ..HitSlop::default()
        };
        assert!(slop.validate().is_ok());
        let region = slop.apply(Rect::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(region, Rect::new(0.0, 0.0, 30.0, 50.0));
    }

    #[test]
    fn test_hit_slop_validation() {
        let both = HitSlop {
            left: Some(0.0),
            right: Some(0.0),
            width: Some(10.0),
            ..HitSlop::default()
        };
        assert!(both.validate().is_err());
        let neither = HitSlop {
            height: Some(10.0),
            ..HitSlop::default()
        };
        assert!(neither.validate().is_err());
    }

    #[test]
    fn test_to_json_round_trip_through_merge() {
        let config = HandlerConfig::default_for(HandlerKind::Pan)
            .manual_activation(true)
            .hit_slop(HitSlop::uniform(4.0));
        let json = config.to_json().unwrap();
        assert_eq!(json["manualActivation"], json!(true));
        let back = HandlerConfig::from_json(HandlerKind::Pan, &json).unwrap();
        assert_eq!(back, config);
    }
}
