//! Turns the frame clock, pointer and parameter snapshot into the named uniform
//! values an exhibit program declares. Re-synced once per drawn frame.
use exhibits::{ControlDefinition, ExhibitProgram, ParameterValue, UniformBinding, UniformRole};

use crate::parameters::ParameterSnapshot;

/// Smoothed pointer value before any input arrives: the centre of the surface.
pub const POINTER_REST: [f32; 2] = [0.5, 0.5];

/// Pointer position as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawPointer {
    /// Normalized device coordinates, `[-1, 1]²`, y up.
    Ndc { x: f32, y: f32 },
    /// Device pixels relative to the surface's top-left corner.
    DevicePixels { x: f64, y: f64 },
}

impl RawPointer {
    pub fn to_ndc(self, resolution: Resolution) -> [f32; 2] {
        match self {
            RawPointer::Ndc { x, y } => [x.clamp(-1.0, 1.0), y.clamp(-1.0, 1.0)],
            RawPointer::DevicePixels { x, y } => {
                if resolution.is_empty() {
                    return [0.0, 0.0];
                }
                let nx = (x / resolution.width as f64) * 2.0 - 1.0;
                let ny = 1.0 - (y / resolution.height as f64) * 2.0;
                [(nx as f32).clamp(-1.0, 1.0), (ny as f32).clamp(-1.0, 1.0)]
            }
        }
    }
}

/// Drawing buffer size in device pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub width: f32,
    pub height: f32,
}

impl Resolution {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Physical size for a logical size at the given (already capped) ratio.
    pub fn from_logical(width: f64, height: f64, pixel_ratio: f64) -> Self {
        Self {
            width: (width * pixel_ratio).round() as f32,
            height: (height * pixel_ratio).round() as f32,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
}

impl UniformValue {
    /// Value laid out in the first lanes of a four-float slot.
    pub fn to_slot(self) -> [f32; 4] {
        match self {
            UniformValue::Float(value) => [value, 0.0, 0.0, 0.0],
            UniformValue::Vec2([x, y]) => [x, y, 0.0, 0.0],
        }
    }
}

/// Uniform values in the order the program declared them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformSet {
    entries: Vec<(String, UniformValue)>,
}

impl UniformSet {
    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, value)| *value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, UniformValue)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-frame inputs sampled inside one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInputs {
    pub elapsed: f32,
    pub pointer: Option<RawPointer>,
    pub resolution: Resolution,
}

/// Exponential pointer follower: `smoothed += (target - smoothed) * k`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSmoother {
    smoothed: [f32; 2],
    responsiveness: f32,
}

impl PointerSmoother {
    pub fn new(responsiveness: f32) -> Self {
        Self {
            smoothed: POINTER_REST,
            responsiveness: responsiveness.clamp(f32::EPSILON, 1.0),
        }
    }

    pub fn update(&mut self, target: [f32; 2]) -> [f32; 2] {
        for (current, goal) in self.smoothed.iter_mut().zip(target) {
            *current += (goal - *current) * self.responsiveness;
        }
        self.smoothed
    }

    pub fn value(&self) -> [f32; 2] {
        self.smoothed
    }
}

pub struct UniformBridge {
    bindings: Vec<UniformBinding>,
    controls: Vec<ControlDefinition>,
    pointer: PointerSmoother,
}

impl UniformBridge {
    pub fn new(program: &ExhibitProgram, controls: &[ControlDefinition]) -> Self {
        Self {
            bindings: program.uniforms.clone(),
            controls: controls.to_vec(),
            pointer: PointerSmoother::new(program.pointer_responsiveness),
        }
    }

    pub fn pointer(&self) -> [f32; 2] {
        self.pointer.value()
    }

    /// Produces the value of every declared binding. Advances pointer
    /// smoothing by one step; never fails on absent parameters.
    pub fn sync(&mut self, inputs: &FrameInputs, parameters: &ParameterSnapshot) -> UniformSet {
        let ndc = inputs
            .pointer
            .map(|raw| raw.to_ndc(inputs.resolution))
            .unwrap_or([0.0, 0.0]);
        let pointer = self.pointer.update([(ndc[0] + 1.0) * 0.5, (ndc[1] + 1.0) * 0.5]);

        let entries = self
            .bindings
            .iter()
            .map(|binding| {
                let value = match &binding.role {
                    UniformRole::Time => UniformValue::Float(inputs.elapsed),
                    UniformRole::Resolution => UniformValue::Vec2([
                        inputs.resolution.width,
                        inputs.resolution.height,
                    ]),
                    UniformRole::Pointer => UniformValue::Vec2(pointer),
                    UniformRole::Parameter { key, default } => UniformValue::Float(
                        self.parameter_value(key, parameters)
                            .unwrap_or(*default as f32),
                    ),
                };
                (binding.name.clone(), value)
            })
            .collect();

        UniformSet { entries }
    }

    fn parameter_value(&self, key: &str, parameters: &ParameterSnapshot) -> Option<f32> {
        match parameters.get(key)? {
            ParameterValue::Number(value) => Some(*value as f32),
            ParameterValue::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
            ParameterValue::Text(choice) => self
                .controls
                .iter()
                .find(|control| control.key == key)
                .and_then(|control| control.option_index(choice))
                .map(|index| index as f32),
        }
    }
}

#[cfg(test)]
mod tests {
    use exhibits::{ControlKind, SelectOption};

    use super::*;

    fn binding(name: &str, role: UniformRole) -> UniformBinding {
        UniformBinding {
            name: name.into(),
            role,
        }
    }

    fn parameter(name: &str, key: &str, default: f64) -> UniformBinding {
        binding(
            name,
            UniformRole::Parameter {
                key: key.into(),
                default,
            },
        )
    }

    fn program(uniforms: Vec<UniformBinding>, k: f32) -> ExhibitProgram {
        ExhibitProgram {
            fragment_source: String::new(),
            uniforms,
            pointer_responsiveness: k,
        }
    }

    fn inputs(pointer: Option<RawPointer>) -> FrameInputs {
        FrameInputs {
            elapsed: 2.5,
            pointer,
            resolution: Resolution::new(800.0, 600.0),
        }
    }

    #[test]
    fn pointer_starts_at_rest_and_eases_toward_target() {
        let mut bridge = UniformBridge::new(
            &program(vec![binding("u_mouse", UniformRole::Pointer)], 0.5),
            &[],
        );
        assert_eq!(bridge.pointer(), POINTER_REST);

        let corner = Some(RawPointer::Ndc { x: 1.0, y: 1.0 });
        let first = bridge.sync(&inputs(corner), &ParameterSnapshot::new());
        assert_eq!(first.get("u_mouse"), Some(UniformValue::Vec2([0.75, 0.75])));
        let second = bridge.sync(&inputs(corner), &ParameterSnapshot::new());
        assert_eq!(second.get("u_mouse"), Some(UniformValue::Vec2([0.875, 0.875])));
    }

    #[test]
    fn absent_pointer_holds_the_centre() {
        let mut bridge = UniformBridge::new(
            &program(vec![binding("u_mouse", UniformRole::Pointer)], 0.08),
            &[],
        );
        let set = bridge.sync(&inputs(None), &ParameterSnapshot::new());
        assert_eq!(set.get("u_mouse"), Some(UniformValue::Vec2(POINTER_REST)));
    }

    #[test]
    fn device_pixels_map_with_y_up() {
        let resolution = Resolution::new(800.0, 600.0);
        assert_eq!(
            RawPointer::DevicePixels { x: 0.0, y: 0.0 }.to_ndc(resolution),
            [-1.0, 1.0]
        );
        assert_eq!(
            RawPointer::DevicePixels { x: 400.0, y: 300.0 }.to_ndc(resolution),
            [0.0, 0.0]
        );
        assert_eq!(
            RawPointer::DevicePixels { x: 800.0, y: 600.0 }.to_ndc(resolution),
            [1.0, -1.0]
        );
    }

    #[test]
    fn missing_parameter_falls_back_to_binding_default() {
        let mut bridge = UniformBridge::new(
            &program(
                vec![parameter("u_speed", "speed", 1.0), parameter("u_size", "size", 0.5)],
                0.08,
            ),
            &[],
        );
        let snapshot =
            ParameterSnapshot::from([("speed".to_string(), ParameterValue::Number(1.7))]);
        let set = bridge.sync(&inputs(None), &snapshot);
        assert_eq!(set.get("u_speed"), Some(UniformValue::Float(1.7)));
        assert_eq!(set.get("u_size"), Some(UniformValue::Float(0.5)));
    }

    #[test]
    fn maps_toggles_and_selects_to_floats() {
        let palette = ControlDefinition {
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
            default_value: ParameterValue::from("ember"),
        };
        let mut bridge = UniformBridge::new(
            &program(
                vec![
                    parameter("u_mirror", "mirror", 0.0),
                    parameter("u_palette", "palette", 0.0),
                ],
                0.1,
            ),
            &[palette],
        );
        let snapshot = ParameterSnapshot::from([
            ("mirror".to_string(), ParameterValue::Bool(true)),
            ("palette".to_string(), ParameterValue::from("tide")),
        ]);
        let set = bridge.sync(&inputs(None), &snapshot);
        assert_eq!(set.get("u_mirror"), Some(UniformValue::Float(1.0)));
        assert_eq!(set.get("u_palette"), Some(UniformValue::Float(1.0)));
    }

    #[test]
    fn undeclared_inputs_are_never_emitted() {
        let mut bridge = UniformBridge::new(
            &program(
                vec![
                    binding("u_time", UniformRole::Time),
                    binding("u_resolution", UniformRole::Resolution),
                ],
                0.1,
            ),
            &[],
        );
        let snapshot =
            ParameterSnapshot::from([("speed".to_string(), ParameterValue::Number(1.2))]);
        let set = bridge.sync(&inputs(None), &snapshot);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("u_time"), Some(UniformValue::Float(2.5)));
        assert_eq!(
            set.get("u_resolution"),
            Some(UniformValue::Vec2([800.0, 600.0]))
        );
        assert!(set.get("u_speed").is_none());
    }

    #[test]
    fn logical_resolution_scales_by_ratio() {
        assert_eq!(
            Resolution::from_logical(1280.0, 720.0, 1.5),
            Resolution::new(1920.0, 1080.0)
        );
    }
}
