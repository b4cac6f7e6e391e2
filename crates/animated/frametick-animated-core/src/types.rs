//! Node configuration as received from the script layer.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::error::AnimatedError;

pub type NodeId = i32;

/// Container key for the composed transform props.
pub const DECOMPOSED_MATRIX_KEY: &str = "decomposedMatrix";

/// Construction payload for graph nodes, tagged by `"type"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeConfig {
    Value {
        #[serde(default)]
        value: f64,
    },
    Transform {
        /// Output key -> id of the node supplying its value.
        #[serde(default)]
        animated: IndexMap<String, NodeId>,
        /// Output key -> number or array of numbers. Entries of any other type are ignored.
        #[serde(default)]
        statics: JsonMap<String, JsonValue>,
    },
}

impl NodeConfig {
    pub fn from_json(value: JsonValue) -> Result<Self, AnimatedError> {
        serde_json::from_value(value).map_err(|e| AnimatedError::InvalidConfig(e.to_string()))
    }
}

/// Spring driver parameters (tension/friction form).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpringConfig {
    pub overshoot_clamping: bool,
    pub rest_displacement_threshold: f64,
    pub rest_speed_threshold: f64,
    pub tension: f64,
    pub friction: f64,
    pub initial_velocity: f64,
    pub to_value: f64,
}

impl SpringConfig {
    pub fn from_json(value: JsonValue) -> Result<Self, AnimatedError> {
        let cfg: Self = serde_json::from_value(value)
            .map_err(|e| AnimatedError::InvalidConfig(format!("spring: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), AnimatedError> {
        let non_negative = [
            ("tension", self.tension),
            ("friction", self.friction),
            ("restDisplacementThreshold", self.rest_displacement_threshold),
            ("restSpeedThreshold", self.rest_speed_threshold),
        ];
        for (name, v) in non_negative {
            if !v.is_finite() || v < 0.0 {
                return Err(AnimatedError::InvalidConfig(format!(
                    "spring: {name} must be a finite non-negative number, got {v}"
                )));
            }
        }
        for (name, v) in [
            ("initialVelocity", self.initial_velocity),
            ("toValue", self.to_value),
        ] {
            if !v.is_finite() {
                return Err(AnimatedError::InvalidConfig(format!(
                    "spring: {name} must be finite, got {v}"
                )));
            }
        }
        Ok(())
    }
}

/// Static transform entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StaticValue {
    Number(f64),
    Array(Vec<f64>),
}

impl StaticValue {
    /// Numbers and arrays of numbers are kept, other JSON types yield `None`.
    /// An array holding anything but numbers is an error.
    pub fn from_json(key: &str, value: &JsonValue) -> Result<Option<Self>, AnimatedError> {
        match value {
            JsonValue::Number(n) => Ok(n.as_f64().map(StaticValue::Number)),
            JsonValue::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    match item.as_f64() {
                        Some(v) => out.push(v),
                        None => {
                            return Err(AnimatedError::UnsupportedArrayElement {
                                key: key.to_string(),
                                index,
                                found: json_type_name(item).to_string(),
                            })
                        }
                    }
                }
                Ok(Some(StaticValue::Array(out)))
            }
            _ => Ok(None),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            StaticValue::Number(v) => JsonValue::from(*v),
            StaticValue::Array(items) => {
                JsonValue::Array(items.iter().copied().map(JsonValue::from).collect())
            }
        }
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
