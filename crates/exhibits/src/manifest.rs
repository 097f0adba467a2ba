//! TOML manifest schema every exhibit ships next to its fragment shader.
//!
//! A manifest holds the `[metadata]` table, the `[program]` tuning, the
//! `[[uniforms]]` the shader reads and the `[[controls]]` exposed to viewers.
//! `validate` returns human-readable issues instead of failing fast so the
//! registry can report every problem in one load error.
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::control::ControlDefinition;
use crate::unit::{ExhibitMetadata, ExhibitProgram, ExhibitUnit, UniformBinding, UniformRole};

/// Identifiers the shader wrapper reserves for its own declarations.
const RESERVED_PREFIXES: &[&str] = &["gl_", "nova_"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExhibitManifest {
    pub metadata: ExhibitMetadata,
    #[serde(default)]
    pub program: ProgramSection,
    #[serde(default)]
    pub uniforms: Vec<UniformBinding>,
    #[serde(default)]
    pub controls: Vec<ControlDefinition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgramSection {
    #[serde(default = "default_responsiveness")]
    pub pointer_responsiveness: f32,
}

fn default_responsiveness() -> f32 {
    0.05
}

impl Default for ProgramSection {
    fn default() -> Self {
        Self {
            pointer_responsiveness: default_responsiveness(),
        }
    }
}

impl ExhibitManifest {
    pub fn from_toml_str(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.metadata.id.is_well_formed() {
            issues.push(format!("exhibit id '{}' is not a dashed lowercase key", self.metadata.id));
        }
        if self.metadata.title.trim().is_empty() {
            issues.push("exhibit title must not be empty".to_string());
        }

        let k = self.program.pointer_responsiveness;
        if !(k > 0.0 && k <= 1.0) {
            issues.push(format!("pointer_responsiveness {k} must lie in (0, 1]"));
        }

        let mut control_keys = HashSet::new();
        for control in &self.controls {
            if !control_keys.insert(control.key.as_str()) {
                issues.push(format!("control key '{}' is declared twice", control.key));
            }
            issues.extend(control.issues());
        }

        let mut uniform_names = HashSet::new();
        for binding in &self.uniforms {
            if !uniform_names.insert(binding.name.as_str()) {
                issues.push(format!("uniform '{}' is declared twice", binding.name));
            }
            if !is_glsl_identifier(&binding.name) {
                issues.push(format!("uniform '{}' is not a usable GLSL identifier", binding.name));
            }
            if let UniformRole::Parameter { key, default } = &binding.role {
                if key.trim().is_empty() {
                    issues.push(format!("uniform '{}' names an empty parameter key", binding.name));
                }
                if !default.is_finite() {
                    issues.push(format!("uniform '{}' default must be finite", binding.name));
                }
            }
        }

        issues
    }

    pub fn into_unit(self, fragment_source: impl Into<String>) -> ExhibitUnit {
        ExhibitUnit {
            program: ExhibitProgram {
                fragment_source: fragment_source.into(),
                uniforms: self.uniforms,
                pointer_responsiveness: self.program.pointer_responsiveness,
            },
            metadata: self.metadata,
            controls: self.controls,
        }
    }
}

fn is_glsl_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let leading_ok = matches!(chars.next(), Some(ch) if ch.is_ascii_alphabetic() || ch == '_');
    leading_ok
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        && !name.contains("__")
        && !RESERVED_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}
