//! Renderer crate for NOVA, the generative-art gallery.
//!
//! The crate glues the winit window, the `wgpu` pipeline and exhibit shader
//! wrapping onto the GPU-free session runtime. The overall flow is:
//!
//! ```text
//!   nova CLI
//!          │ RendererConfig + ExhibitRegistry
//!          ▼
//!   Renderer::run ──▶ GalleryWindow ──▶ winit event loop ──▶ render_frame()
//!                          │                                     │
//!                          │ keys ─▶ SessionController            ├─▶ ExhibitLoader::poll
//!                          │                                     └─▶ ExhibitLoader::tick ─▶ GpuSurface
//! ```
//!
//! `GpuSurface` owns every GPU resource and is the `RenderTarget` the exhibit
//! loader mounts programs onto. Exhibit fragment shaders are wrapped at mount
//! time so their declared uniforms read from a single std140 block.

mod compile;
mod gpu;
mod runtime;
mod types;
mod window;

use anyhow::Result;
use exhibits::ExhibitRegistry;

pub use compile::{validate_fragment, wrap_exhibit_fragment, CompileError};
pub use types::{Antialiasing, RendererConfig};

/// High-level entry point that owns the chosen configuration.
///
/// The heavy lifting lives inside the window module; `Renderer` only carries
/// the configuration and the registry into it.
pub struct Renderer {
    config: RendererConfig,
    registry: ExhibitRegistry,
}

impl Renderer {
    pub fn new(config: RendererConfig, registry: ExhibitRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Opens the gallery window and blocks until it is closed.
    pub fn run(self) -> Result<()> {
        window::run_gallery_window(&self.config, self.registry)
    }
}
