use exhibits::{ExhibitProgram, UniformBinding};
use session::UniformSet;

/// One std140 `vec4` lane group.
pub(crate) type Slot = [f32; 4];

/// Maps declared bindings onto `vec4` slots. Slot 0 is reserved for the
/// surface; binding `i` lives in slot `i + 1`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SlotLayout {
    bindings: Vec<UniformBinding>,
}

impl SlotLayout {
    pub fn for_program(program: &ExhibitProgram) -> Self {
        Self {
            bindings: program.uniforms.clone(),
        }
    }

    pub fn slot_count(&self) -> usize {
        self.bindings.len() + 1
    }

    pub fn slots(&self) -> impl Iterator<Item = (usize, &UniformBinding)> {
        self.bindings
            .iter()
            .enumerate()
            .map(|(index, binding)| (index + 1, binding))
    }

    pub fn byte_size(&self) -> u64 {
        (self.slot_count() * std::mem::size_of::<Slot>()) as u64
    }

    /// Lays `uniforms` out for upload. Names the set does not carry stay zero.
    pub fn pack(&self, surface: SurfaceSlot, uniforms: &UniformSet) -> Vec<Slot> {
        let mut slots = vec![[0.0; 4]; self.slot_count()];
        slots[0] = surface.to_slot();
        for (index, binding) in self.slots() {
            if let Some(value) = uniforms.get(&binding.name) {
                slots[index] = value.to_slot();
            }
        }
        slots
    }
}

/// Contents of slot 0: the drawing buffer the exhibit pass renders into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SurfaceSlot {
    pub width: f32,
    pub height: f32,
}

impl SurfaceSlot {
    fn to_slot(self) -> Slot {
        [self.width, self.height, 0.0, 0.0]
    }
}

#[cfg(test)]
mod tests {
    use exhibits::UniformRole;
    use session::{FrameInputs, ParameterSnapshot, RawPointer, Resolution, UniformBridge};

    use super::*;

    fn program() -> ExhibitProgram {
        ExhibitProgram {
            fragment_source: String::new(),
            uniforms: vec![
                UniformBinding {
                    name: "u_time".into(),
                    role: UniformRole::Time,
                },
                UniformBinding {
                    name: "u_resolution".into(),
                    role: UniformRole::Resolution,
                },
                UniformBinding {
                    name: "u_speed".into(),
                    role: UniformRole::Parameter {
                        key: "speed".into(),
                        default: 1.0,
                    },
                },
            ],
            pointer_responsiveness: 1.0,
        }
    }

    #[test]
    fn slot_zero_is_reserved_for_the_surface() {
        let layout = SlotLayout::for_program(&program());
        assert_eq!(layout.slot_count(), 4);
        assert_eq!(layout.byte_size(), 64);
        let names: Vec<_> = layout
            .slots()
            .map(|(slot, binding)| (slot, binding.name.as_str()))
            .collect();
        assert_eq!(names, vec![(1, "u_time"), (2, "u_resolution"), (3, "u_speed")]);
    }

    #[test]
    fn packs_bridge_output_in_declared_order() {
        let program = program();
        let layout = SlotLayout::for_program(&program);
        let mut bridge = UniformBridge::new(&program, &[]);
        let uniforms = bridge.sync(
            &FrameInputs {
                elapsed: 2.5,
                pointer: Some(RawPointer::Ndc { x: 0.0, y: 0.0 }),
                resolution: Resolution::new(800.0, 600.0),
            },
            &ParameterSnapshot::new(),
        );

        let surface = SurfaceSlot {
            width: 800.0,
            height: 600.0,
        };
        let slots = layout.pack(surface, &uniforms);
        assert_eq!(slots[0], [800.0, 600.0, 0.0, 0.0]);
        assert_eq!(slots[1], [2.5, 0.0, 0.0, 0.0]);
        assert_eq!(slots[2], [800.0, 600.0, 0.0, 0.0]);
        assert_eq!(slots[3], [1.0, 0.0, 0.0, 0.0]);
    }
}
