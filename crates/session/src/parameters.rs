use std::collections::BTreeMap;

use exhibits::{ControlDefinition, ParameterValue, ValueRejection};
use tracing::{debug, warn};

/// Point-in-time copy of every parameter, keyed by control key.
pub type ParameterSnapshot = BTreeMap<String, ParameterValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum SetOutcome {
    /// The store now holds this value (sliders may have been clamped).
    Applied(ParameterValue),
    /// The key was never seeded; nothing changed.
    Unseeded,
    /// The value did not match the control; nothing changed.
    Rejected(ValueRejection),
}

/// Live values of the active exhibit's controls.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    controls: BTreeMap<String, ControlDefinition>,
    values: BTreeMap<String, ParameterValue>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all state with the defaults declared by `controls`.
    pub fn seed(&mut self, controls: &[ControlDefinition]) {
        self.clear();
        for control in controls {
            self.values
                .insert(control.key.clone(), control.default_value.clone());
            self.controls.insert(control.key.clone(), control.clone());
        }
        debug!(keys = self.values.len(), "seeded parameter store");
    }

    pub fn set(&mut self, key: &str, value: ParameterValue) -> SetOutcome {
        let Some(control) = self.controls.get(key) else {
            debug!(key, "ignoring write to unseeded parameter");
            return SetOutcome::Unseeded;
        };
        match control.coerce(value) {
            Ok(accepted) => {
                self.values.insert(key.to_string(), accepted.clone());
                SetOutcome::Applied(accepted)
            }
            Err(rejection) => {
                warn!(%rejection, "rejected parameter write");
                SetOutcome::Rejected(rejection)
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParameterValue> {
        self.values.get(key)
    }

    pub fn snapshot(&self) -> ParameterSnapshot {
        self.values.clone()
    }

    pub fn clear(&mut self) {
        self.controls.clear();
        self.values.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use exhibits::ControlKind;

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

    fn toggle(key: &str, default: bool) -> ControlDefinition {
        ControlDefinition {
            key: key.into(),
            label: key.into(),
            kind: ControlKind::Toggle,
            default_value: ParameterValue::Bool(default),
        }
    }

    #[test]
    fn seeds_every_declared_key() {
        let controls = [slider("speed", 1.0, 0.2, 2.0), toggle("mirror", false)];
        let mut store = ParameterStore::new();
        store.seed(&controls);
        let keys: Vec<_> = store.keys().collect();
        assert_eq!(keys, ["mirror", "speed"]);
        assert_eq!(store.get("speed"), Some(&ParameterValue::Number(1.0)));
    }

    #[test]
    fn seeding_twice_equals_seeding_once() {
        let controls = [slider("speed", 1.0, 0.2, 2.0)];
        let mut once = ParameterStore::new();
        once.seed(&controls);
        let mut twice = ParameterStore::new();
        twice.seed(&controls);
        twice.set("speed", ParameterValue::Number(1.9));
        twice.seed(&controls);
        assert_eq!(once.snapshot(), twice.snapshot());
    }

    #[test]
    fn reseeding_drops_previous_keys() {
        let mut store = ParameterStore::new();
        store.seed(&[slider("density", 0.3, 0.2, 1.0)]);
        store.seed(&[slider("zoom", 3.0, 1.0, 8.0)]);
        assert!(store.get("density").is_none());
        assert_eq!(
            store.set("density", ParameterValue::Number(0.5)),
            SetOutcome::Unseeded
        );
    }

    #[test]
    fn set_is_visible_in_next_snapshot_only() {
        let mut store = ParameterStore::new();
        store.seed(&[slider("speed", 1.0, 0.2, 2.0)]);
        let before = store.snapshot();
        assert_eq!(
            store.set("speed", ParameterValue::Number(1.7)),
            SetOutcome::Applied(ParameterValue::Number(1.7))
        );
        assert_eq!(before.get("speed"), Some(&ParameterValue::Number(1.0)));
        assert_eq!(
            store.snapshot(),
            ParameterSnapshot::from([("speed".to_string(), ParameterValue::Number(1.7))])
        );
    }

    #[test]
    fn unseeded_write_is_a_no_op() {
        let mut store = ParameterStore::new();
        assert_eq!(
            store.set("speed", ParameterValue::Number(1.0)),
            SetOutcome::Unseeded
        );
        assert!(store.is_empty());
    }

    #[test]
    fn mismatched_kind_keeps_previous_value() {
        let mut store = ParameterStore::new();
        store.seed(&[toggle("mirror", true)]);
        assert!(matches!(
            store.set("mirror", ParameterValue::Number(0.0)),
            SetOutcome::Rejected(_)
        ));
        assert_eq!(store.get("mirror"), Some(&ParameterValue::Bool(true)));
    }

    #[test]
    fn out_of_range_slider_is_clamped() {
        let mut store = ParameterStore::new();
        store.seed(&[slider("zoom", 3.0, 1.0, 8.0)]);
        store.set("zoom", ParameterValue::Number(-4.0));
        assert_eq!(store.get("zoom"), Some(&ParameterValue::Number(1.0)));
    }

    #[test]
    fn clear_empties_the_store() {
        let mut store = ParameterStore::new();
        store.seed(&[slider("speed", 1.0, 0.2, 2.0)]);
        store.clear();
        assert!(store.is_empty());
        assert!(store.snapshot().is_empty());
    }
}
