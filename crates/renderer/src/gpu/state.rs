use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use exhibits::{ExhibitError, ExhibitUnit};
use galleryconfig::QualityTier;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use session::{RenderTarget, Resolution, UniformSet};
use tracing::{debug, info, warn};
use winit::dpi::{PhysicalPosition, PhysicalSize};

use crate::types::Antialiasing;

use super::context::GpuContext;
use super::pipeline::{BlitPipeline, ExhibitPipeline, PipelineLayouts};
use super::target::{drawing_buffer_size, DrawTarget};
use super::uniforms::SurfaceSlot;

/// Frame counters reported once a second at debug level.
struct FrameStats {
    frames: u32,
    since: Instant,
}

impl FrameStats {
    fn new() -> Self {
        Self {
            frames: 0,
            since: Instant::now(),
        }
    }

    fn record(&mut self, exhibit_mounted: bool) {
        self.frames += 1;
        let elapsed = self.since.elapsed();
        if elapsed >= Duration::from_secs(1) {
            debug!(
                fps = (self.frames as f32 / elapsed.as_secs_f32()).round(),
                exhibit_mounted,
                "render stats"
            );
            self.frames = 0;
            self.since = Instant::now();
        }
    }
}

/// The window's render surface. Owns the device and hands out one
/// `ExhibitPipeline` per mounted exhibit.
///
/// Exhibits draw into a buffer sized by the quality tier's pixel-ratio cap;
/// when that is smaller than the swapchain a blit pass stretches it over.
pub(crate) struct GpuSurface {
    context: GpuContext,
    layouts: PipelineLayouts,
    blit: BlitPipeline,
    target: DrawTarget,
    quality: QualityTier,
    scale_factor: f64,
    stats: FrameStats,
}

impl GpuSurface {
    pub(crate) fn new<T>(
        window: &T,
        size: PhysicalSize<u32>,
        scale_factor: f64,
        quality: QualityTier,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(window, size, Antialiasing::for_quality(quality))?;
        let layouts = PipelineLayouts::new(&context.device);
        let blit = BlitPipeline::new(&context.device, &layouts, context.surface_format);
        let scale_factor = scale_factor.max(f64::EPSILON);
        let target = Self::target_for(&context, &blit, scale_factor, quality);
        info!(
            quality = %quality,
            sample_count = context.sample_count,
            width = context.size.width,
            height = context.size.height,
            buffer_width = target.size().width,
            buffer_height = target.size().height,
            "render surface ready"
        );

        Ok(Self {
            context,
            layouts,
            blit,
            target,
            quality,
            scale_factor,
            stats: FrameStats::new(),
        })
    }

    fn target_for(
        context: &GpuContext,
        blit: &BlitPipeline,
        scale_factor: f64,
        quality: QualityTier,
    ) -> DrawTarget {
        DrawTarget::new(
            &context.device,
            blit,
            context.surface_format,
            context.size,
            drawing_buffer_size(context.size, scale_factor, quality),
            context.sample_count,
        )
    }

    fn rebuild_target(&mut self) {
        self.target = Self::target_for(&self.context, &self.blit, self.scale_factor, self.quality);
        debug!(
            width = self.target.size().width,
            height = self.target.size().height,
            "rebuilt drawing buffer"
        );
    }

    /// Width of the window in logical pixels.
    pub(crate) fn logical_width(&self) -> f64 {
        self.context.size.width as f64 / self.scale_factor
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 || new_size == self.context.size {
            return;
        }
        self.context.resize(new_size);
        debug!(width = new_size.width, height = new_size.height, "resized surface");
        self.rebuild_target();
    }

    pub(crate) fn set_scale_factor(&mut self, scale_factor: f64) {
        let scale_factor = scale_factor.max(f64::EPSILON);
        if scale_factor != self.scale_factor {
            self.scale_factor = scale_factor;
            self.rebuild_target();
        }
    }

    pub(crate) fn recover(&mut self) {
        self.context.reconfigure();
    }

    /// Converts a cursor position on the window into drawing-buffer pixels.
    pub(crate) fn to_buffer_pixels(&self, position: PhysicalPosition<f64>) -> (f64, f64) {
        let buffer = self.target.size();
        let surface = self.context.size;
        (
            position.x * buffer.width as f64 / surface.width.max(1) as f64,
            position.y * buffer.height as f64 / surface.height.max(1) as f64,
        )
    }

    fn present_frame<F>(&mut self, encode: F) -> Result<(), wgpu::SurfaceError>
    where
        F: FnOnce(&mut wgpu::RenderPass<'_>),
    {
        let frame = self.context.surface.get_current_texture()?;
        let frame_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("exhibit frame encoder"),
                });
        {
            let (view, resolve_target) = self.target.attachments(&frame_view);
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("exhibit pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    depth_slice: None,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            encode(&mut pass);
        }
        if let Some(source) = self.target.blit_source() {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("blit pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame_view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.blit.encode(&mut pass, source);
        }

        self.context.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    /// Lost and outdated surfaces are reconfigured and the frame dropped;
    /// only running out of memory is fatal.
    fn settle_surface_error(&mut self, error: wgpu::SurfaceError) -> Result<()> {
        match error {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                warn!(?error, "surface needs reconfiguring; dropping frame");
                self.recover();
                Ok(())
            }
            wgpu::SurfaceError::Timeout => {
                warn!("timed out acquiring surface texture; dropping frame");
                Ok(())
            }
            wgpu::SurfaceError::OutOfMemory => bail!("GPU is out of memory"),
            wgpu::SurfaceError::Other => {
                warn!("surface reported an unknown error; retrying next frame");
                Ok(())
            }
        }
    }
}

impl RenderTarget for GpuSurface {
    type Program = ExhibitPipeline;

    fn mount(&mut self, unit: &ExhibitUnit) -> Result<ExhibitPipeline, ExhibitError> {
        ExhibitPipeline::new(
            &self.context.device,
            &self.layouts,
            self.context.surface_format,
            self.context.sample_count,
            &unit.program,
        )
        .map_err(|err| ExhibitError::load(unit.id(), format!("{err:#}")))
    }

    fn unmount(&mut self, program: ExhibitPipeline) {
        program.release();
    }

    fn draw(&mut self, program: &mut ExhibitPipeline, uniforms: &UniformSet) -> Result<()> {
        let buffer = self.target.size();
        let surface = SurfaceSlot {
            width: buffer.width as f32,
            height: buffer.height as f32,
        };
        program.upload(&self.context.queue, surface, uniforms);
        let result = self.present_frame(|pass| program.encode(pass));
        self.stats.record(true);
        match result {
            Ok(()) => Ok(()),
            Err(error) => self.settle_surface_error(error),
        }
    }

    fn present_blank(&mut self) -> Result<()> {
        let result = self.present_frame(|_| {});
        self.stats.record(false);
        match result {
            Ok(()) => Ok(()),
            Err(error) => self.settle_surface_error(error),
        }
    }

    fn resolution(&self) -> Resolution {
        let buffer = self.target.size();
        Resolution::new(buffer.width as f32, buffer.height as f32)
    }
}
