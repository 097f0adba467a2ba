use exhibits::ExhibitId;
use galleryconfig::{GalleryConfig, LoadStrategy, QualityTier, DEFAULT_SMALL_VIEWPORT_WIDTH};

/// Anti-aliasing policy for the render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Antialiasing {
    /// Pick the highest sample count supported by the surface format.
    #[default]
    Auto,
    /// Disable MSAA and render directly into the swapchain.
    Off,
    /// Request a specific MSAA sample count (clamped to what the device supports).
    Samples(u32),
}

impl Antialiasing {
    /// Only the high tier multisamples.
    pub fn for_quality(quality: QualityTier) -> Self {
        if quality.antialias() {
            Self::Auto
        } else {
            Self::Off
        }
    }
}

/// Immutable configuration passed to the renderer at start-up.
///
/// `RendererConfig` is assembled from the gallery config file plus CLI
/// overrides and is fixed for the lifetime of the window.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Initial window size in logical pixels.
    pub surface_size: (u32, u32),
    /// Quality tier; caps the pixel ratio and decides MSAA.
    pub quality: QualityTier,
    /// Exhibit to open instead of the gallery.
    pub initial_exhibit: Option<ExhibitId>,
    /// Optional FPS cap; None = render every vblank.
    pub target_fps: Option<f32>,
    /// Logical widths at or below this count as a small viewport.
    pub small_viewport_width: f64,
    /// How exhibits are resolved after activation.
    pub load_strategy: LoadStrategy,
}

impl RendererConfig {
    pub fn antialiasing(&self) -> Antialiasing {
        Antialiasing::for_quality(self.quality)
    }
}

impl Default for RendererConfig {
    /// Provides a 720p window on the gallery at the high tier.
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            quality: QualityTier::High,
            initial_exhibit: None,
            target_fps: None,
            small_viewport_width: DEFAULT_SMALL_VIEWPORT_WIDTH,
            load_strategy: LoadStrategy::Threaded,
        }
    }
}

impl From<&GalleryConfig> for RendererConfig {
    fn from(config: &GalleryConfig) -> Self {
        Self {
            surface_size: (config.window.width, config.window.height),
            quality: config.quality,
            initial_exhibit: config.start_exhibit.as_deref().map(ExhibitId::from),
            target_fps: config.fps,
            small_viewport_width: config.small_viewport_width,
            load_strategy: config.load_strategy,
        }
    }
}
