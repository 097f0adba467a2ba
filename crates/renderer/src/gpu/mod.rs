//! GPU side of the exhibit runtime.
//!
//! - `context` owns wgpu instance/device/surface wiring and rebuilds the
//!   swapchain when the window resizes.
//! - `pipeline` compiles a wrapped exhibit into a render pipeline with a
//!   single uniform bind group, under a validation error scope.
//! - `uniforms` maps declared bindings onto std140 `vec4` slots.
//! - `target` sizes the drawing buffer from the quality tier and owns the
//!   MSAA and reduced-size textures behind it.
//! - `state` glues everything together as `GpuSurface`, the
//!   `session::RenderTarget` the exhibit loader drives.

mod context;
mod pipeline;
mod state;
mod target;
mod uniforms;

pub(crate) use state::GpuSurface;
pub(crate) use uniforms::SlotLayout;
