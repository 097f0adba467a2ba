use exhibits::{ControlDefinition, ExhibitId, ExhibitMetadata, ParameterValue};
use tracing::{debug, info};

use crate::overlay::{compose_overlays, OverlayLayout};
use crate::parameters::{ParameterSnapshot, ParameterStore, SetOutcome};

/// Which screen is showing and which overlays the viewer asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub active_exhibit: Option<ExhibitId>,
    pub controls_visible: bool,
    pub info_visible: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            active_exhibit: None,
            controls_visible: false,
            info_visible: true,
        }
    }
}

/// Work the host must apply to the exhibit loader after an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    None,
    Activate(ExhibitId),
    Deactivate,
}

/// Keys the session controller may intercept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPress {
    Character(char),
    Escape,
}

#[derive(Debug, Default)]
pub struct SessionController {
    state: SessionState,
    metadata: Option<ExhibitMetadata>,
    controls: Vec<ControlDefinition>,
    parameters: ParameterStore,
}

impl SessionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn metadata(&self) -> Option<&ExhibitMetadata> {
        self.metadata.as_ref()
    }

    pub fn controls(&self) -> &[ControlDefinition] {
        &self.controls
    }

    pub fn parameters(&self) -> &ParameterStore {
        &self.parameters
    }

    pub fn select_exhibit(&mut self, id: ExhibitId) -> SessionEffect {
        self.state.info_visible = true;
        if self.state.active_exhibit.as_ref() == Some(&id) {
            return SessionEffect::None;
        }

        info!(exhibit = %id, "opening exhibit");
        self.metadata = None;
        self.controls.clear();
        self.parameters.clear();
        self.state.active_exhibit = Some(id.clone());
        SessionEffect::Activate(id)
    }

    pub fn go_home(&mut self) -> SessionEffect {
        info!("returning to gallery");
        self.state.active_exhibit = None;
        self.metadata = None;
        self.controls.clear();
        self.parameters.clear();
        SessionEffect::Deactivate
    }

    pub fn toggle_controls(&mut self) {
        self.state.controls_visible = !self.state.controls_visible;
        debug!(visible = self.state.controls_visible, "toggled controls");
    }

    pub fn toggle_info(&mut self) {
        self.state.info_visible = !self.state.info_visible;
        debug!(visible = self.state.info_visible, "toggled info");
    }

    /// Global key handling. `None` means the key was not intercepted and may
    /// be offered to the gallery or controls surface.
    pub fn handle_key(&mut self, key: KeyPress) -> Option<SessionEffect> {
        match key {
            KeyPress::Character('c' | 'C') => {
                self.toggle_controls();
                Some(SessionEffect::None)
            }
            KeyPress::Character('i' | 'I') => {
                self.toggle_info();
                Some(SessionEffect::None)
            }
            KeyPress::Escape if self.state.active_exhibit.is_some() => Some(self.go_home()),
            _ => None,
        }
    }

    /// Stores what the loader reported for a fresh mount and seeds the
    /// parameter store. Reports for an exhibit that is no longer active are
    /// ignored; returns whether the report was accepted.
    pub fn on_metadata_loaded(
        &mut self,
        metadata: ExhibitMetadata,
        controls: Vec<ControlDefinition>,
    ) -> bool {
        if self.state.active_exhibit.as_ref() != Some(&metadata.id) {
            debug!(exhibit = %metadata.id, "ignoring metadata for inactive exhibit");
            return false;
        }
        self.parameters.seed(&controls);
        self.metadata = Some(metadata);
        self.controls = controls;
        true
    }

    pub fn set_parameter(&mut self, key: &str, value: ParameterValue) -> SetOutcome {
        self.parameters.set(key, value)
    }

    pub fn snapshot(&self) -> ParameterSnapshot {
        self.parameters.snapshot()
    }

    pub fn overlays(&self, viewport_width: f64, small_viewport_max: f64) -> OverlayLayout {
        compose_overlays(
            &self.state,
            self.metadata.is_some(),
            !self.controls.is_empty(),
            viewport_width,
            small_viewport_max,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use exhibits::{ExhibitRegistry, ParameterValue};

    use super::*;

    fn loaded(controller: &mut SessionController, id: &str) {
        let unit = ExhibitRegistry::builtin()
            .resolve_now(&ExhibitId::from(id))
            .expect("builtin resolves");
        assert!(controller.on_metadata_loaded(unit.metadata, unit.controls));
    }

    #[test]
    fn starts_on_gallery_with_info_enabled() {
        let controller = SessionController::new();
        assert_eq!(controller.state(), &SessionState::default());
        assert!(controller.state().info_visible);
        assert!(!controller.state().controls_visible);
    }

    #[test]
    fn select_forces_info_visible() {
        let mut controller = SessionController::new();
        controller.toggle_info();
        let effect = controller.select_exhibit(ExhibitId::from("emergence"));
        assert_eq!(effect, SessionEffect::Activate(ExhibitId::from("emergence")));
        assert!(controller.state().info_visible);
    }

    #[test]
    fn reselecting_active_exhibit_does_not_reload() {
        let mut controller = SessionController::new();
        controller.select_exhibit(ExhibitId::from("emergence"));
        loaded(&mut controller, "emergence");
        controller.toggle_info();
        assert_eq!(
            controller.select_exhibit(ExhibitId::from("emergence")),
            SessionEffect::None
        );
        assert!(controller.state().info_visible);
        assert!(controller.metadata().is_some());
    }

    #[test]
    fn escape_on_gallery_changes_nothing() {
        let mut controller = SessionController::new();
        let before = controller.state().clone();
        assert_eq!(controller.handle_key(KeyPress::Escape), None);
        assert_eq!(controller.state(), &before);
    }

    #[test]
    fn escape_in_exhibit_goes_home_and_clears_parameters() {
        let mut controller = SessionController::new();
        controller.select_exhibit(ExhibitId::from("flow-fields"));
        loaded(&mut controller, "flow-fields");
        assert!(!controller.parameters().is_empty());

        assert_eq!(
            controller.handle_key(KeyPress::Escape),
            Some(SessionEffect::Deactivate)
        );
        assert_eq!(controller.state().active_exhibit, None);
        assert!(controller.parameters().is_empty());
        assert!(controller.metadata().is_none());
    }

    #[test]
    fn c_toggles_controls_independent_of_info() {
        let mut controller = SessionController::new();
        controller.toggle_info();
        let info = controller.state().info_visible;

        assert!(controller.handle_key(KeyPress::Character('c')).is_some());
        assert!(controller.state().controls_visible);
        assert!(controller.handle_key(KeyPress::Character('C')).is_some());
        assert!(!controller.state().controls_visible);
        assert_eq!(controller.state().info_visible, info);
    }

    #[test]
    fn i_toggles_info() {
        let mut controller = SessionController::new();
        controller.handle_key(KeyPress::Character('I'));
        assert!(!controller.state().info_visible);
    }

    #[test]
    fn other_keys_are_not_intercepted() {
        let mut controller = SessionController::new();
        assert_eq!(controller.handle_key(KeyPress::Character('1')), None);
        assert_eq!(controller.handle_key(KeyPress::Character('x')), None);
    }

    #[test]
    fn stale_metadata_report_is_ignored() {
        let mut controller = SessionController::new();
        controller.select_exhibit(ExhibitId::from("tessellations"));
        let stale = ExhibitRegistry::builtin()
            .resolve_now(&ExhibitId::from("flow-fields"))
            .expect("builtin resolves");
        assert!(!controller.on_metadata_loaded(stale.metadata, stale.controls));
        assert!(controller.metadata().is_none());
        assert!(controller.parameters().is_empty());
    }

    #[test]
    fn metadata_seeds_every_control_key() {
        let registry = ExhibitRegistry::builtin();
        let ids: Vec<ExhibitId> = registry
            .available()
            .map(|preview| preview.id.clone())
            .collect();
        assert!(!ids.is_empty());

        let mut controller = SessionController::new();
        for id in ids {
            let unit = registry.resolve_now(&id).expect("builtin resolves");
            let expected: BTreeSet<String> =
                unit.controls.iter().map(|control| control.key.clone()).collect();

            controller.select_exhibit(id.clone());
            assert!(controller.on_metadata_loaded(unit.metadata, unit.controls));
            let seeded: BTreeSet<String> =
                controller.parameters().keys().map(str::to_owned).collect();
            assert_eq!(seeded, expected, "{id} seeds a different key set");
        }
    }

    #[test]
    fn shared_keys_do_not_leak_across_exhibits() {
        let mut controller = SessionController::new();
        controller.select_exhibit(ExhibitId::from("flow-fields"));
        loaded(&mut controller, "flow-fields");
        controller.set_parameter("speed", ParameterValue::Number(0.4));
        controller.set_parameter("colorShift", ParameterValue::Number(0.9));

        controller.select_exhibit(ExhibitId::from("emergence"));
        assert!(controller.snapshot().is_empty());
        loaded(&mut controller, "emergence");
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.get("speed"), Some(&ParameterValue::Number(1.0)));
        assert_eq!(snapshot.get("colorShift"), Some(&ParameterValue::Number(0.0)));
    }

    #[test]
    fn overlays_follow_state_and_viewport() {
        let mut controller = SessionController::new();
        controller.select_exhibit(ExhibitId::from("flow-fields"));
        loaded(&mut controller, "flow-fields");
        controller.toggle_controls();

        let wide = controller.overlays(1440.0, 768.0);
        assert!(wide.controls && wide.info);
        let narrow = controller.overlays(500.0, 768.0);
        assert!(narrow.controls && !narrow.info);
    }
}
