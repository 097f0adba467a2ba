use galleryconfig::QualityTier;
use winit::dpi::PhysicalSize;

use super::pipeline::BlitPipeline;

/// Size of the drawing buffer for a surface of `surface` physical pixels.
///
/// The buffer is the logical window size times the tier's capped pixel
/// ratio, never larger than the surface itself and never empty.
pub(crate) fn drawing_buffer_size(
    surface: PhysicalSize<u32>,
    scale_factor: f64,
    quality: QualityTier,
) -> PhysicalSize<u32> {
    let scale_factor = scale_factor.max(f64::EPSILON);
    let ratio = quality.effective_pixel_ratio(scale_factor) / scale_factor;
    let scaled = |pixels: u32| ((pixels as f64 * ratio).round() as u32).clamp(1, pixels.max(1));
    PhysicalSize::new(scaled(surface.width), scaled(surface.height))
}

struct MultisampleTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl MultisampleTarget {
    fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: PhysicalSize<u32>,
        sample_count: u32,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("msaa color target"),
            size: extent(size),
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

/// Reduced-size frame the blit pass stretches over the swapchain.
struct ScaledFrame {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
}

/// Where the exhibit pass draws. At full size that is the swapchain image
/// itself; below it, an offscreen texture of the capped size.
pub(crate) struct DrawTarget {
    size: PhysicalSize<u32>,
    multisample: Option<MultisampleTarget>,
    scaled: Option<ScaledFrame>,
}

impl DrawTarget {
    pub(crate) fn new(
        device: &wgpu::Device,
        blit: &BlitPipeline,
        format: wgpu::TextureFormat,
        surface: PhysicalSize<u32>,
        buffer: PhysicalSize<u32>,
        sample_count: u32,
    ) -> Self {
        let multisample = (sample_count > 1)
            .then(|| MultisampleTarget::new(device, format, buffer, sample_count));
        let scaled = (buffer != surface).then(|| {
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some("scaled exhibit frame"),
                size: extent(buffer),
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            let bind_group = blit.bind(device, &view);
            ScaledFrame {
                _texture: texture,
                view,
                bind_group,
            }
        });

        Self {
            size: buffer,
            multisample,
            scaled,
        }
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// Colour attachment and resolve target for the exhibit pass, given the
    /// swapchain view of this frame.
    pub(crate) fn attachments<'a>(
        &'a self,
        frame: &'a wgpu::TextureView,
    ) -> (&'a wgpu::TextureView, Option<&'a wgpu::TextureView>) {
        let output = self.scaled.as_ref().map_or(frame, |scaled| &scaled.view);
        match &self.multisample {
            Some(target) => (&target.view, Some(output)),
            None => (output, None),
        }
    }

    /// Bind group for the blit pass, present only when the buffer is smaller
    /// than the swapchain.
    pub(crate) fn blit_source(&self) -> Option<&wgpu::BindGroup> {
        self.scaled.as_ref().map(|scaled| &scaled.bind_group)
    }
}

fn extent(size: PhysicalSize<u32>) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: size.width.max(1),
        height: size.height.max(1),
        depth_or_array_layers: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_tier_draws_at_full_resolution() {
        let surface = PhysicalSize::new(2560, 1440);
        assert_eq!(drawing_buffer_size(surface, 2.0, QualityTier::High), surface);
    }

    #[test]
    fn capped_tiers_shrink_the_buffer() {
        let surface = PhysicalSize::new(2560, 1440);
        assert_eq!(
            drawing_buffer_size(surface, 2.0, QualityTier::Low),
            PhysicalSize::new(1280, 720)
        );
        assert_eq!(
            drawing_buffer_size(surface, 2.0, QualityTier::Medium),
            PhysicalSize::new(1920, 1080)
        );
    }

    #[test]
    fn caps_above_the_device_ratio_change_nothing() {
        let surface = PhysicalSize::new(1280, 720);
        assert_eq!(drawing_buffer_size(surface, 1.0, QualityTier::Medium), surface);
        assert_eq!(drawing_buffer_size(surface, 1.0, QualityTier::Low), surface);
    }

    #[test]
    fn buffer_is_never_empty() {
        assert_eq!(
            drawing_buffer_size(PhysicalSize::new(1, 1), 3.0, QualityTier::Low),
            PhysicalSize::new(1, 1)
        );
        assert_eq!(
            drawing_buffer_size(PhysicalSize::new(0, 0), 2.0, QualityTier::Low),
            PhysicalSize::new(1, 1)
        );
    }
}
