use anyhow::{anyhow, bail, Context as AnyhowContext, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, warn};
use wgpu::TextureFormatFeatureFlags;
use winit::dpi::PhysicalSize;

use crate::types::Antialiasing;

/// Four samples is the widely supported ceiling for resolve targets.
const AUTO_SAMPLE_CEILING: u32 = 4;

pub(crate) struct GpuContext {
    pub _instance: wgpu::Instance,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: PhysicalSize<u32>,
    pub sample_count: u32,
    pub surface_format: wgpu::TextureFormat,
}

impl GpuContext {
    /// Creates the surface for `target` and a device able to present to it.
    ///
    /// The surface borrows raw handles, so `target` must outlive the context;
    /// the window layer keeps it in an `Arc` for that reason.
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        antialiasing: Antialiasing,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let window_handle = target
            .window_handle()
            .map_err(|err| anyhow!("failed to acquire window handle: {err}"))?;
        let display_handle = target
            .display_handle()
            .map_err(|err| anyhow!("failed to acquire display handle: {err}"))?;

        let surface = unsafe {
            instance.create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
                raw_display_handle: display_handle.as_raw(),
                raw_window_handle: window_handle.as_raw(),
            })
        }
        .context("failed to create rendering surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("failed to find a suitable GPU adapter")?;

        let adapter_info = adapter.get_info();
        let limits = adapter.limits();
        debug!(
            name = %adapter_info.name,
            backend = ?adapter_info.backend,
            device_type = ?adapter_info.device_type,
            "selected GPU adapter"
        );

        let size = PhysicalSize::new(initial_size.width.max(1), initial_size.height.max(1));
        let max_dimension = limits.max_texture_dimension_2d;
        if size.width > max_dimension || size.height > max_dimension {
            bail!(
                "GPU max texture dimension is {max_dimension}, window is {}x{}",
                size.width,
                size.height
            );
        }

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = pick_surface_format(&surface_caps.formats)
            .ok_or_else(|| anyhow!("surface reports no supported formats"))?;
        if surface_format.is_srgb() {
            warn!(
                ?surface_format,
                "no non-sRGB surface format available; exhibit colors will be re-encoded"
            );
        }

        let format_flags = adapter.get_texture_format_features(surface_format).flags;
        let support = SampleSupport {
            counts: format_flags.supported_sample_counts(),
            resolve: format_flags.contains(TextureFormatFeatureFlags::MULTISAMPLE_RESOLVE),
            software: adapter_info.device_type == wgpu::DeviceType::Cpu,
        };
        let sample_count = choose_sample_count(antialiasing, &support);

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("nova device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits,
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::default(),
        }))
        .context("failed to create GPU device")?;

        let present_mode = pick_present_mode(&surface_caps.present_modes);
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        debug!(?present_mode, sample_count, ?surface_format, "configuring surface");

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            size,
            sample_count,
            surface_format,
        })
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    /// Reapplies the current configuration after a lost or outdated surface.
    pub(crate) fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }
}

/// Exhibits write display-ready colour, so a non-sRGB format keeps them
/// from being encoded twice.
fn pick_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .copied()
        .find(|format| !format.is_srgb())
        .or_else(|| formats.first().copied())
}

fn pick_present_mode(modes: &[wgpu::PresentMode]) -> wgpu::PresentMode {
    if modes.contains(&wgpu::PresentMode::Fifo) {
        return wgpu::PresentMode::Fifo;
    }
    modes.first().copied().unwrap_or(wgpu::PresentMode::Fifo)
}

/// What the adapter can do with the chosen surface format.
struct SampleSupport {
    counts: Vec<u32>,
    resolve: bool,
    software: bool,
}

fn choose_sample_count(antialiasing: Antialiasing, support: &SampleSupport) -> u32 {
    let mut counts = support.counts.clone();
    counts.push(1);
    counts.sort_unstable();
    counts.dedup();
    let best_up_to = |ceiling: u32| {
        counts
            .iter()
            .copied()
            .filter(|&count| count <= ceiling)
            .max()
            .unwrap_or(1)
    };

    let wanted = match antialiasing {
        Antialiasing::Off => 1,
        Antialiasing::Auto => best_up_to(AUTO_SAMPLE_CEILING),
        Antialiasing::Samples(requested) if counts.contains(&requested) => requested,
        Antialiasing::Samples(requested) => {
            let fallback = best_up_to(requested);
            warn!(
                requested,
                fallback,
                supported = ?counts,
                "requested MSAA sample count not supported; falling back"
            );
            fallback
        }
    };
    if wanted == 1 {
        return 1;
    }
    if !support.resolve {
        warn!("surface format does not support MSAA resolve; disabling MSAA");
        return 1;
    }
    if support.software {
        warn!(
            sample_count = wanted,
            "software rasterizer detected; disabling MSAA for performance"
        );
        return 1;
    }
    wanted
}
