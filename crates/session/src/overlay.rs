use crate::controller::SessionState;

/// Overlays the host should draw this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayLayout {
    pub controls: bool,
    pub info: bool,
}

/// Decides which overlays are composed. On a small viewport the controls
/// panel wins over the info panel; `info_visible` itself is left alone.
pub fn compose_overlays(
    state: &SessionState,
    has_metadata: bool,
    has_controls: bool,
    viewport_width: f64,
    small_viewport_max: f64,
) -> OverlayLayout {
    if state.active_exhibit.is_none() {
        return OverlayLayout::default();
    }

    let controls = state.controls_visible && has_controls;
    let small_viewport = viewport_width <= small_viewport_max;
    let info = state.info_visible && has_metadata && !(small_viewport && controls);

    OverlayLayout { controls, info }
}

#[cfg(test)]
mod tests {
    use exhibits::ExhibitId;

    use super::*;

    fn exhibit_state(controls_visible: bool, info_visible: bool) -> SessionState {
        SessionState {
            active_exhibit: Some(ExhibitId::from("flow-fields")),
            controls_visible,
            info_visible,
        }
    }

    #[test]
    fn gallery_composes_nothing() {
        let layout = compose_overlays(&SessionState::default(), true, true, 1920.0, 768.0);
        assert_eq!(layout, OverlayLayout::default());
    }

    #[test]
    fn wide_viewport_shows_both() {
        let layout = compose_overlays(&exhibit_state(true, true), true, true, 1280.0, 768.0);
        assert_eq!(
            layout,
            OverlayLayout {
                controls: true,
                info: true
            }
        );
    }

    #[test]
    fn small_viewport_suppresses_info_behind_controls() {
        let state = exhibit_state(true, true);
        let layout = compose_overlays(&state, true, true, 768.0, 768.0);
        assert_eq!(
            layout,
            OverlayLayout {
                controls: true,
                info: false
            }
        );
        assert!(state.info_visible);

        let hidden_controls = compose_overlays(&exhibit_state(false, true), true, true, 400.0, 768.0);
        assert!(hidden_controls.info);
    }

    #[test]
    fn waits_for_metadata_and_controls() {
        let state = exhibit_state(true, true);
        let layout = compose_overlays(&state, false, false, 400.0, 768.0);
        assert_eq!(layout, OverlayLayout::default());
    }
}
