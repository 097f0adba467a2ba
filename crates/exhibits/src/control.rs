//! Control schema an exhibit declares for its adjustable parameters, plus the
//! tagged value union those parameters hold at runtime.
//!
//! Types:
//!
//! - `ParameterValue` is the number/boolean/string union stored per control key.
//! - `ControlDefinition` pairs a key and label with a `ControlKind` and the
//!   default the parameter store seeds from.
//! - `ControlKind` carries the kind-specific bounds (slider range, select
//!   options).
//! - `ValueRejection` explains why a write did not match its control.
//!
//! Functions:
//!
//! - `ControlDefinition::coerce` checks a candidate value against the control
//!   and returns the value the store should keep (sliders clamp into range).
//! - `ControlDefinition::issues` lists schema problems for manifest validation.
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl ParameterValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Text(_) => "string",
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{}", if *value { "on" } else { "off" }),
            Self::Number(value) => write!(f, "{value:.2}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ControlKind {
    Slider { min: f64, max: f64, step: f64 },
    Toggle,
    Select { options: Vec<SelectOption> },
}

impl ControlKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Slider { .. } => "slider",
            Self::Toggle => "toggle",
            Self::Select { .. } => "select",
        }
    }

    fn expected_value(&self) -> &'static str {
        match self {
            Self::Slider { .. } => "number",
            Self::Toggle => "boolean",
            Self::Select { .. } => "string",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlDefinition {
    pub key: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: ControlKind,
    #[serde(rename = "default")]
    pub default_value: ParameterValue,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueRejection {
    #[error("control '{key}' expects a {expected} value, got {found}")]
    KindMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("control '{key}' rejects non-finite number {value}")]
    NonFinite { key: String, value: f64 },

    #[error("'{value}' is not an option of control '{key}'")]
    UnknownOption { key: String, value: String },
}

impl ControlDefinition {
    pub fn coerce(&self, value: ParameterValue) -> Result<ParameterValue, ValueRejection> {
        match (&self.kind, value) {
            (ControlKind::Slider { min, max, .. }, ParameterValue::Number(number)) => {
                if !number.is_finite() {
                    return Err(ValueRejection::NonFinite {
                        key: self.key.clone(),
                        value: number,
                    });
                }
                Ok(ParameterValue::Number(number.clamp(*min, *max)))
            }
            (ControlKind::Toggle, value @ ParameterValue::Bool(_)) => Ok(value),
            (ControlKind::Select { options }, ParameterValue::Text(text)) => {
                if options.iter().any(|option| option.value == text) {
                    Ok(ParameterValue::Text(text))
                } else {
                    Err(ValueRejection::UnknownOption {
                        key: self.key.clone(),
                        value: text,
                    })
                }
            }
            (kind, other) => Err(ValueRejection::KindMismatch {
                key: self.key.clone(),
                expected: kind.expected_value(),
                found: other.kind_name(),
            }),
        }
    }

    /// Position of `value` among a select control's options.
    pub fn option_index(&self, value: &str) -> Option<usize> {
        match &self.kind {
            ControlKind::Select { options } => {
                options.iter().position(|option| option.value == value)
            }
            _ => None,
        }
    }

    pub fn issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.key.trim().is_empty() {
            issues.push(format!("control '{}' has an empty key", self.label));
        }
        match &self.kind {
            ControlKind::Slider { min, max, step } => {
                if !(min.is_finite() && max.is_finite() && min < max) {
                    issues.push(format!(
                        "slider '{}' range {min}..{max} is empty",
                        self.key
                    ));
                }
                if !(step.is_finite() && *step > 0.0) {
                    issues.push(format!("slider '{}' step must be positive", self.key));
                }
                match self.default_value.as_number() {
                    Some(default) if default >= *min && default <= *max => {}
                    Some(default) => issues.push(format!(
                        "slider '{}' default {default} lies outside {min}..{max}",
                        self.key
                    )),
                    None => issues.push(format!("slider '{}' default must be a number", self.key)),
                }
            }
            ControlKind::Toggle => {
                if self.default_value.as_bool().is_none() {
                    issues.push(format!("toggle '{}' default must be a boolean", self.key));
                }
            }
            ControlKind::Select { options } => {
                if options.is_empty() {
                    issues.push(format!("select '{}' declares no options", self.key));
                }
                let default_known = self
                    .default_value
                    .as_text()
                    .and_then(|value| self.option_index(value))
                    .is_some();
                if !default_known {
                    issues.push(format!(
                        "select '{}' default is not one of its options",
                        self.key
                    ));
                }
            }
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slider(key: &str, default: f64, min: f64, max: f64) -> ControlDefinition {
        ControlDefinition {
            key: key.into(),
            label: key.into(),
            kind: ControlKind::Slider {
                min,
                max,
                step: 0.1,
            },
            default_value: ParameterValue::Number(default),
        }
    }

    fn palette() -> ControlDefinition {
        ControlDefinition {
            key: "palette".into(),
            label: "Palette".into(),
            kind: ControlKind::Select {
                options: vec![
                    SelectOption {
                        label: "Ember".into(),
                        value: "ember".into(),
                    },
                    SelectOption {
                        label: "Tide".into(),
                        value: "tide".into(),
                    },
                ],
            },
            default_value: ParameterValue::from("tide"),
        }
    }

    #[test]
    fn slider_clamps_into_range() {
        let control = slider("speed", 1.0, 0.2, 2.0);
        assert_eq!(
            control.coerce(ParameterValue::Number(5.0)),
            Ok(ParameterValue::Number(2.0))
        );
        assert_eq!(
            control.coerce(ParameterValue::Number(1.7)),
            Ok(ParameterValue::Number(1.7))
        );
    }

    #[test]
    fn slider_rejects_nan_and_booleans() {
        let control = slider("speed", 1.0, 0.2, 2.0);
        assert!(matches!(
            control.coerce(ParameterValue::Number(f64::NAN)),
            Err(ValueRejection::NonFinite { .. })
        ));
        assert!(matches!(
            control.coerce(ParameterValue::Bool(true)),
            Err(ValueRejection::KindMismatch {
                expected: "number",
                found: "boolean",
                ..
            })
        ));
    }

    #[test]
    fn select_accepts_known_options_only() {
        let control = palette();
        assert_eq!(control.option_index("tide"), Some(1));
        assert!(control.coerce(ParameterValue::from("ember")).is_ok());
        assert!(matches!(
            control.coerce(ParameterValue::from("neon")),
            Err(ValueRejection::UnknownOption { .. })
        ));
    }

    #[test]
    fn reports_default_outside_bounds() {
        let issues = slider("zoom", 9.0, 1.0, 8.0).issues();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("outside"));
        assert!(palette().issues().is_empty());
    }

    #[test]
    fn parses_flattened_kind_from_toml() {
        let raw = r#"
            key = "turbulence"
            label = "Turbulence"
            type = "slider"
            min = 1
            max = 6.0
            step = 0.5
            default = 6
        "#;
        let control: ControlDefinition = toml::from_str(raw).expect("control parses");
        assert_eq!(
            control.kind,
            ControlKind::Slider {
                min: 1.0,
                max: 6.0,
                step: 0.5
            }
        );
        assert_eq!(control.default_value, ParameterValue::Number(6.0));
    }
}
