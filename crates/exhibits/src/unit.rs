use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::control::ControlDefinition;
use crate::ExhibitId;

/// Descriptive metadata copied upward for display once an exhibit mounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExhibitMetadata {
    pub id: ExhibitId,
    pub title: String,
    pub description: String,
    #[serde(rename = "date")]
    pub release_date: NaiveDate,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum UniformRole {
    /// Seconds since the exhibit mounted.
    Time,
    /// Drawing buffer size in device pixels.
    Resolution,
    /// Smoothed pointer position in `[0, 1]²`.
    Pointer,
    /// Live value of control `key`, or `default` when the store has none.
    Parameter { key: String, default: f64 },
}

impl UniformRole {
    pub fn components(&self) -> usize {
        match self {
            Self::Resolution | Self::Pointer => 2,
            Self::Time | Self::Parameter { .. } => 1,
        }
    }
}

/// A named shader input together with the runtime source that feeds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniformBinding {
    pub name: String,
    #[serde(flatten)]
    pub role: UniformRole,
}

/// Render entry point of an exhibit: the fragment source and the inputs it
/// reads each frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ExhibitProgram {
    pub fragment_source: String,
    pub uniforms: Vec<UniformBinding>,
    /// Fraction of the remaining pointer distance covered per frame.
    pub pointer_responsiveness: f32,
}

impl ExhibitProgram {
    pub fn binding(&self, name: &str) -> Option<&UniformBinding> {
        self.uniforms.iter().find(|binding| binding.name == name)
    }

    /// Control keys this program actually reads.
    pub fn parameter_keys(&self) -> impl Iterator<Item = &str> {
        self.uniforms.iter().filter_map(|binding| match &binding.role {
            UniformRole::Parameter { key, .. } => Some(key.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExhibitUnit {
    pub program: ExhibitProgram,
    pub metadata: ExhibitMetadata,
    pub controls: Vec<ControlDefinition>,
}

impl ExhibitUnit {
    pub fn id(&self) -> &ExhibitId {
        &self.metadata.id
    }

    pub fn control(&self, key: &str) -> Option<&ControlDefinition> {
        self.controls.iter().find(|control| control.key == key)
    }
}
