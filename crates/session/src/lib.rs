//! Exhibit runtime independent of any GPU: the parameter store, the uniform
//! bridge, the exhibit loader and the session controller that ties gallery
//! navigation to them.
mod bridge;
mod clock;
mod controller;
mod controls;
mod loader;
mod overlay;
mod parameters;

pub use bridge::{
    FrameInputs, PointerSmoother, RawPointer, Resolution, UniformBridge, UniformSet, UniformValue,
    POINTER_REST,
};
pub use clock::{BoxedTimeSource, SteppedTimeSource, SystemTimeSource, TimeSample, TimeSource};
pub use controller::{KeyPress, SessionController, SessionEffect, SessionState};
pub use controls::{ControlInput, ControlsSurface};
pub use loader::{ExhibitLoader, FrameOutcome, LoaderState, MountReport, RenderTarget};
pub use overlay::{compose_overlays, OverlayLayout};
pub use parameters::{ParameterSnapshot, ParameterStore, SetOutcome};
