mod builtin;
mod control;
mod manifest;
mod registry;
mod unit;

pub use control::{ControlDefinition, ControlKind, ParameterValue, SelectOption, ValueRejection};
pub use manifest::{ExhibitManifest, ProgramSection};
pub use registry::{ExhibitError, ExhibitPreview, ExhibitRegistry, PendingUnit, UnitLoader};
pub use unit::{ExhibitMetadata, ExhibitProgram, ExhibitUnit, UniformBinding, UniformRole};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable key addressing one exhibit across the registry, the loader, and the
/// session controller.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExhibitId(String);

impl ExhibitId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Ids are lowercase ASCII words joined by single dashes.
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty()
            && !self.0.starts_with('-')
            && !self.0.ends_with('-')
            && !self.0.contains("--")
            && self
                .0
                .chars()
                .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-')
    }
}

impl fmt::Display for ExhibitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for ExhibitId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ExhibitId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_dashed_ids() {
        assert!(ExhibitId::from("flow-fields").is_well_formed());
        assert!(ExhibitId::from("emergence").is_well_formed());
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(!ExhibitId::from("").is_well_formed());
        assert!(!ExhibitId::from("Flow Fields").is_well_formed());
        assert!(!ExhibitId::from("-flow").is_well_formed());
        assert!(!ExhibitId::from("flow--fields").is_well_formed());
    }

    #[test]
    fn displays_raw_key() {
        assert_eq!(ExhibitId::from("tessellations").to_string(), "tessellations");
    }
}
