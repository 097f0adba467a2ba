use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use exhibits::{
    ControlDefinition, ExhibitError, ExhibitId, ExhibitMetadata, ExhibitPreview, ExhibitRegistry,
    ParameterValue,
};
use session::{
    ControlInput, ControlsSurface, ExhibitLoader, FrameOutcome, KeyPress, LoaderState, RawPointer,
    SessionController, SessionEffect,
};
use tracing::{debug, error, info, warn};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::gpu::GpuSurface;
use crate::runtime::{FrameDecision, FramePacer};
use crate::types::RendererConfig;

const APP_NAME: &str = "NOVA";

/// Everything the event loop touches between callbacks.
struct GalleryWindow {
    // Declared first so the surface drops before the window it points into.
    loader: ExhibitLoader<GpuSurface>,
    window: Arc<Window>,
    controller: SessionController,
    controls: ControlsSurface,
    pointer: Option<PhysicalPosition<f64>>,
    occluded: bool,
    small_viewport_width: f64,
    title: String,
}

impl GalleryWindow {
    fn new(window: Arc<Window>, config: &RendererConfig, registry: ExhibitRegistry) -> Result<Self> {
        let surface = GpuSurface::new(
            window.as_ref(),
            window.inner_size(),
            window.scale_factor(),
            config.quality,
        )?;
        let loader = ExhibitLoader::new(registry, surface, config.load_strategy);

        Ok(Self {
            loader,
            window,
            controller: SessionController::new(),
            controls: ControlsSurface::new(),
            pointer: None,
            occluded: false,
            small_viewport_width: config.small_viewport_width,
            title: String::new(),
        })
    }

    fn window(&self) -> &Window {
        &self.window
    }

    fn apply(&mut self, effect: SessionEffect) {
        match effect {
            SessionEffect::None => {}
            SessionEffect::Activate(id) => {
                self.controls.reset();
                self.loader.activate(id);
            }
            SessionEffect::Deactivate => {
                self.controls.reset();
                self.loader.deactivate();
            }
        }
    }

    fn open(&mut self, id: ExhibitId) {
        let effect = self.controller.select_exhibit(id);
        self.apply(effect);
    }

    fn handle_key(&mut self, event: &KeyEvent) {
        if let Some(press) = key_press(&event.logical_key) {
            if let Some(effect) = self.controller.handle_key(press) {
                self.apply(effect);
                return;
            }
        }

        if self.controller.state().active_exhibit.is_none() {
            self.handle_gallery_key(&event.logical_key);
            return;
        }

        if let LoaderState::Failed { id, .. } = self.loader.state() {
            if matches!(&event.logical_key, Key::Character(value) if value.eq_ignore_ascii_case("r"))
            {
                info!(exhibit = %id, "retrying exhibit");
                self.loader.activate(id);
            }
            return;
        }

        let overlays = self
            .controller
            .overlays(self.logical_width(), self.small_viewport_width);
        let mounted = matches!(self.loader.state(), LoaderState::Mounted { .. });
        if !(overlays.controls && mounted) {
            return;
        }
        let Some(input) = control_input(&event.logical_key) else {
            return;
        };
        let snapshot = self.controller.snapshot();
        if let Some((key, value)) = self
            .controls
            .handle(input, self.controller.controls(), &snapshot)
        {
            debug!(%key, %value, "control changed");
            self.controller.set_parameter(&key, value);
        }
    }

    fn handle_gallery_key(&mut self, key: &Key) {
        let Key::Character(value) = key else {
            return;
        };
        let Some(slot) = value.chars().next().and_then(gallery_slot) else {
            return;
        };
        let choice = self
            .loader
            .registry()
            .available()
            .nth(slot)
            .map(|preview| preview.id.clone());
        match choice {
            Some(id) => self.open(id),
            None => debug!(slot = slot + 1, "no exhibit in gallery slot"),
        }
    }

    fn logical_width(&self) -> f64 {
        self.loader.target().logical_width()
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.loader.target_mut().resize(size);
    }

    fn render_frame(&mut self) -> Result<FrameOutcome> {
        if let Some(report) = self.loader.poll() {
            if self
                .controller
                .on_metadata_loaded(report.metadata, report.controls)
            {
                self.controls.reset();
            }
        }

        let pointer = self.pointer.map(|position| {
            let (x, y) = self.loader.target().to_buffer_pixels(position);
            RawPointer::DevicePixels { x, y }
        });
        let snapshot = self.controller.snapshot();
        let outcome = self.loader.tick(pointer, &snapshot, !self.occluded)?;
        self.refresh_title();
        Ok(outcome)
    }

    fn refresh_title(&mut self) {
        let previews: Vec<ExhibitPreview>;
        let loader_state = self.loader.state();
        let view = match (&self.controller.state().active_exhibit, &loader_state) {
            (None, _) => {
                previews = self.loader.registry().available().cloned().collect();
                TitleView::Gallery(&previews)
            }
            (Some(_), LoaderState::Failed { error, .. }) => TitleView::Failed(error),
            (Some(_), LoaderState::Mounted { .. }) => {
                let overlays = self
                    .controller
                    .overlays(self.logical_width(), self.small_viewport_width);
                let focused = if overlays.controls {
                    self.controls
                        .focused(self.controller.controls())
                        .and_then(|control| {
                            self.controller
                                .parameters()
                                .get(&control.key)
                                .map(|value| (control, value))
                        })
                } else {
                    None
                };
                TitleView::Exhibit {
                    metadata: self.controller.metadata().filter(|_| overlays.info),
                    focused,
                }
            }
            (Some(id), _) => TitleView::Loading(id),
        };
        let title = window_title(&view);
        if title != self.title {
            self.window.set_title(&title);
            self.title = title;
        }
    }
}

/// What the window title describes for the current frame.
enum TitleView<'a> {
    Gallery(&'a [ExhibitPreview]),
    Loading(&'a ExhibitId),
    Failed(&'a ExhibitError),
    Exhibit {
        metadata: Option<&'a ExhibitMetadata>,
        focused: Option<(&'a ControlDefinition, &'a ParameterValue)>,
    },
}

fn window_title(view: &TitleView<'_>) -> String {
    match view {
        TitleView::Gallery(previews) => {
            let cards: Vec<String> = previews
                .iter()
                .take(9)
                .enumerate()
                .map(|(index, preview)| format!("{} {}", index + 1, preview.title))
                .collect();
            format!("{APP_NAME} · Gallery · {}", cards.join("  "))
        }
        TitleView::Loading(id) => format!("{APP_NAME} · Loading {id}…"),
        TitleView::Failed(error) => {
            format!("{APP_NAME} · {error} · R to retry, Esc for gallery")
        }
        TitleView::Exhibit { metadata, focused } => {
            let mut title = match metadata {
                Some(metadata) => format!("{} · {}", metadata.title, metadata.description),
                None => APP_NAME.to_string(),
            };
            if let Some((control, value)) = focused {
                title.push_str(&format!(" · [{}: {}]", control.label, value));
            }
            title
        }
    }
}

/// Keys the session controller gets first look at.
fn key_press(key: &Key) -> Option<KeyPress> {
    match key {
        Key::Named(NamedKey::Escape) => Some(KeyPress::Escape),
        Key::Character(value) => {
            let mut chars = value.chars();
            let ch = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            Some(KeyPress::Character(ch))
        }
        _ => None,
    }
}

fn control_input(key: &Key) -> Option<ControlInput> {
    match key {
        Key::Named(NamedKey::ArrowUp) => Some(ControlInput::FocusPrevious),
        Key::Named(NamedKey::ArrowDown) => Some(ControlInput::FocusNext),
        Key::Named(NamedKey::ArrowLeft) => Some(ControlInput::Decrease),
        Key::Named(NamedKey::ArrowRight) => Some(ControlInput::Increase),
        Key::Named(NamedKey::Space | NamedKey::Enter) => Some(ControlInput::Activate),
        Key::Character(value) if value.as_str() == " " => Some(ControlInput::Activate),
        _ => None,
    }
}

/// Cursor position after `event`. Leaving the window keeps the last
/// position, so the smoothed pointer stays where the visitor left it.
fn track_pointer(
    current: Option<PhysicalPosition<f64>>,
    event: &WindowEvent,
) -> Option<PhysicalPosition<f64>> {
    match event {
        WindowEvent::CursorMoved { position, .. } => Some(*position),
        _ => current,
    }
}

/// Zero-based gallery card for the digits `1`..`9`.
fn gallery_slot(ch: char) -> Option<usize> {
    match ch.to_digit(10)? {
        0 => None,
        digit => Some(digit as usize - 1),
    }
}

/// Opens the gallery window and runs the event loop until it closes.
pub(crate) fn run_gallery_window(config: &RendererConfig, registry: ExhibitRegistry) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to initialize event loop")?;
    let window_size = winit::dpi::LogicalSize::new(config.surface_size.0, config.surface_size.1);
    let window = WindowBuilder::new()
        .with_title(APP_NAME)
        .with_inner_size(window_size)
        .build(&event_loop)
        .context("failed to create gallery window")?;
    let window = Arc::new(window);

    let mut state = GalleryWindow::new(window, config, registry)?;
    if let Some(id) = config.initial_exhibit.clone() {
        if state.loader.registry().contains(&id) {
            state.open(id);
        } else {
            warn!(exhibit = %id, "start exhibit is not in the registry; showing the gallery");
        }
    }
    state.refresh_title();

    let mut pacer = FramePacer::new(config.target_fps);
    pacer.reset();
    state.window().request_redraw();

    let mut result = Ok(());
    let run_result = event_loop.run(|event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
            match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    elwt.exit();
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if event.state == ElementState::Pressed && !event.repeat {
                        state.handle_key(&event);
                    }
                }
                WindowEvent::CursorMoved { .. } | WindowEvent::CursorLeft { .. } => {
                    state.pointer = track_pointer(state.pointer, &event);
                }
                WindowEvent::Resized(new_size) => {
                    state.resize(new_size);
                }
                WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                    state.loader.target_mut().set_scale_factor(scale_factor);
                }
                WindowEvent::Occluded(occluded) => {
                    debug!(occluded, "window visibility changed");
                    state.occluded = occluded;
                    if !occluded {
                        state.window().request_redraw();
                    }
                }
                WindowEvent::RedrawRequested => {
                    if let Err(err) = state.render_frame() {
                        error!("render failed: {err:#}");
                        result = Err(err);
                        elwt.exit();
                    }
                }
                _ => {}
            }
        }
        Event::AboutToWait => match pacer.decide(!state.occluded) {
            FrameDecision::Render => {
                state.window().request_redraw();
                elwt.set_control_flow(ControlFlow::Wait);
            }
            FrameDecision::WaitUntil(deadline) => {
                let ms = deadline.saturating_duration_since(Instant::now()).as_millis();
                tracing::trace!(deadline_ms = ms, "waiting until next frame");
                elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
            }
            FrameDecision::Idle => {
                tracing::trace!("window hidden; idling");
                elwt.set_control_flow(ControlFlow::Wait);
            }
        },
        _ => {}
    });

    if let Err(err) = run_result {
        result = Err(anyhow!("window event loop error: {err}"));
    }

    result
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use exhibits::ControlKind;
    use winit::keyboard::SmolStr;

    use super::*;

    fn character(value: &str) -> Key {
        Key::Character(SmolStr::new(value))
    }

    #[test]
    fn global_keys_map_to_key_presses() {
        assert_eq!(key_press(&character("c")), Some(KeyPress::Character('c')));
        assert_eq!(key_press(&Key::Named(NamedKey::Escape)), Some(KeyPress::Escape));
        assert_eq!(key_press(&Key::Named(NamedKey::ArrowUp)), None);
        assert_eq!(key_press(&character("ab")), None);
    }

    #[test]
    fn arrows_and_activation_drive_controls() {
        assert_eq!(
            control_input(&Key::Named(NamedKey::ArrowDown)),
            Some(ControlInput::FocusNext)
        );
        assert_eq!(
            control_input(&Key::Named(NamedKey::ArrowLeft)),
            Some(ControlInput::Decrease)
        );
        assert_eq!(control_input(&character(" ")), Some(ControlInput::Activate));
        assert_eq!(control_input(&character("c")), None);
    }

    #[test]
    fn pointer_survives_the_cursor_leaving() {
        // SAFETY: a placeholder id for synthesised events; never handed back to winit.
        let device_id = unsafe { winit::event::DeviceId::dummy() };
        let moved = WindowEvent::CursorMoved {
            device_id,
            position: PhysicalPosition::new(120.0, 48.0),
        };
        let pointer = track_pointer(None, &moved);
        assert_eq!(pointer, Some(PhysicalPosition::new(120.0, 48.0)));

        let left = WindowEvent::CursorLeft { device_id };
        assert_eq!(track_pointer(pointer, &left), pointer);
        assert_eq!(track_pointer(None, &left), None);
    }

    #[test]
    fn digits_pick_gallery_cards() {
        assert_eq!(gallery_slot('1'), Some(0));
        assert_eq!(gallery_slot('9'), Some(8));
        assert_eq!(gallery_slot('0'), None);
        assert_eq!(gallery_slot('x'), None);
    }

    #[test]
    fn gallery_title_numbers_available_cards() {
        let previews: Vec<_> = ExhibitRegistry::builtin().available().cloned().collect();
        assert_eq!(
            window_title(&TitleView::Gallery(&previews)),
            "NOVA · Gallery · 1 Flow Fields  2 Tessellations  3 Emergence"
        );
    }

    #[test]
    fn exhibit_title_shows_info_and_focused_control() {
        let metadata = ExhibitMetadata {
            id: ExhibitId::from("flow-fields"),
            title: "Flow Fields".into(),
            description: "Currents".into(),
            release_date: NaiveDate::from_ymd_opt(2025, 11, 30).expect("valid date"),
            tags: Vec::new(),
        };
        let control = ControlDefinition {
            key: "speed".into(),
            label: "Speed".into(),
            kind: ControlKind::Slider {
                min: 0.2,
                max: 2.0,
                step: 0.1,
            },
            default_value: ParameterValue::Number(1.0),
        };
        let value = ParameterValue::Number(1.4);

        assert_eq!(
            window_title(&TitleView::Exhibit {
                metadata: Some(&metadata),
                focused: Some((&control, &value)),
            }),
            "Flow Fields · Currents · [Speed: 1.40]"
        );
        assert_eq!(
            window_title(&TitleView::Exhibit {
                metadata: None,
                focused: None,
            }),
            "NOVA"
        );
    }

    #[test]
    fn failure_title_offers_retry() {
        let error = ExhibitError::NotFound(ExhibitId::from("missing"));
        assert!(window_title(&TitleView::Failed(&error)).ends_with("R to retry, Esc for gallery"));
    }
}
