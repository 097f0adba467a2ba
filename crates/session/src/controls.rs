use exhibits::{ControlDefinition, ControlKind, ParameterValue};

use crate::parameters::ParameterSnapshot;

/// Keyboard intents understood by the controls surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlInput {
    FocusPrevious,
    FocusNext,
    Decrease,
    Increase,
    Activate,
}

/// Keyboard-driven control panel. Tracks focus and turns inputs into
/// `(key, value)` changes for the parameter store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlsSurface {
    focus: usize,
}

impl ControlsSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.focus = 0;
    }

    pub fn focus_index(&self) -> usize {
        self.focus
    }

    pub fn focused<'a>(&self, controls: &'a [ControlDefinition]) -> Option<&'a ControlDefinition> {
        controls.get(self.focus.min(controls.len().saturating_sub(1)))
    }

    pub fn handle(
        &mut self,
        input: ControlInput,
        controls: &[ControlDefinition],
        values: &ParameterSnapshot,
    ) -> Option<(String, ParameterValue)> {
        if controls.is_empty() {
            return None;
        }
        self.focus = self.focus.min(controls.len() - 1);

        match input {
            ControlInput::FocusPrevious => {
                self.focus = self.focus.checked_sub(1).unwrap_or(controls.len() - 1);
                None
            }
            ControlInput::FocusNext => {
                self.focus = (self.focus + 1) % controls.len();
                None
            }
            ControlInput::Decrease | ControlInput::Increase | ControlInput::Activate => {
                let control = &controls[self.focus];
                let current = values.get(&control.key).unwrap_or(&control.default_value);
                adjust(control, current, input).map(|value| (control.key.clone(), value))
            }
        }
    }
}

fn adjust(
    control: &ControlDefinition,
    current: &ParameterValue,
    input: ControlInput,
) -> Option<ParameterValue> {
    match &control.kind {
        ControlKind::Slider { min, max, step } => {
            let direction = match input {
                ControlInput::Decrease => -1.0,
                ControlInput::Increase => 1.0,
                _ => return None,
            };
            let value = current.as_number()?;
            let steps = ((value - min) / step).round() + direction;
            let next = (min + steps * step).clamp(*min, *max);
            // Keeps 0.1-style steps from accumulating binary noise.
            let rounded = (next * 1e6).round() / 1e6;
            Some(ParameterValue::Number(rounded))
        }
        ControlKind::Toggle => current.as_bool().map(|flag| ParameterValue::Bool(!flag)),
        ControlKind::Select { options } => {
            if options.is_empty() {
                return None;
            }
            let index = current
                .as_text()
                .and_then(|value| control.option_index(value))
                .unwrap_or(0);
            let next = match input {
                ControlInput::Decrease => index.checked_sub(1).unwrap_or(options.len() - 1),
                _ => (index + 1) % options.len(),
            };
            Some(ParameterValue::Text(options[next].value.clone()))
        }
    }
}
