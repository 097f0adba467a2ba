//! Per-activation lifecycle of one exhibit: resolve through the registry,
//! mount onto the render target, then drive one draw per tick.
//!
//! Types:
//!
//! - `RenderTarget` is the seam to the GPU surface. The loader owns it
//!   exclusively and is the only caller of `mount`/`draw`/`unmount`.
//! - `ExhibitLoader` holds the in-flight resolve, the mounted program and the
//!   generation counter that makes superseded resolves inert.
//! - `LoaderState` is the observable Idle/Loading/Mounted/Failed view.
//! - `MountReport` carries metadata and controls upward, once per mount.
//!
//! Functions:
//!
//! - `activate` tears down whatever is mounted, bumps the generation and
//!   starts resolving the new id.
//! - `poll` settles a finished resolve and returns the report on success.
//! - `tick` runs one frame; inactive ticks touch nothing, unmounted ticks
//!   present a blank frame.
use std::time::{Duration, Instant};

use exhibits::{
    ControlDefinition, ExhibitError, ExhibitId, ExhibitMetadata, ExhibitRegistry, ExhibitUnit,
    PendingUnit,
};
use galleryconfig::LoadStrategy;
use tracing::{debug, info, warn};

use crate::bridge::{FrameInputs, RawPointer, Resolution, UniformBridge, UniformSet};
use crate::clock::{BoxedTimeSource, SystemTimeSource};
use crate::parameters::ParameterSnapshot;

/// GPU-facing half of the loader.
pub trait RenderTarget {
    /// Compiled program plus whatever per-program resources it owns.
    type Program;

    /// Builds the program for `unit`. Compile failures surface as
    /// `ExhibitError::Load`.
    fn mount(&mut self, unit: &ExhibitUnit) -> Result<Self::Program, ExhibitError>;

    /// Releases the program's resources before returning.
    fn unmount(&mut self, program: Self::Program);

    /// Issues exactly one draw call with the given uniforms and presents it.
    fn draw(&mut self, program: &mut Self::Program, uniforms: &UniformSet) -> anyhow::Result<()>;

    fn present_blank(&mut self) -> anyhow::Result<()>;

    /// Current drawing buffer size in device pixels.
    fn resolution(&self) -> Resolution;
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoaderState {
    Idle,
    Loading { id: ExhibitId, generation: u64 },
    Mounted { id: ExhibitId, generation: u64 },
    Failed { id: ExhibitId, error: ExhibitError },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MountReport {
    pub metadata: ExhibitMetadata,
    pub controls: Vec<ControlDefinition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Drawn,
    Blank,
    Skipped,
}

struct InFlight {
    id: ExhibitId,
    generation: u64,
    pending: PendingUnit,
}

struct MountedExhibit<P> {
    unit: ExhibitUnit,
    generation: u64,
    program: P,
    bridge: UniformBridge,
}

pub struct ExhibitLoader<R: RenderTarget> {
    registry: ExhibitRegistry,
    target: R,
    strategy: LoadStrategy,
    clock: BoxedTimeSource,
    generation: u64,
    in_flight: Option<InFlight>,
    mounted: Option<MountedExhibit<R::Program>>,
    failure: Option<ExhibitError>,
}

impl<R: RenderTarget> ExhibitLoader<R> {
    pub fn new(registry: ExhibitRegistry, target: R, strategy: LoadStrategy) -> Self {
        Self::with_clock(registry, target, strategy, Box::new(SystemTimeSource::new()))
    }

    pub fn with_clock(
        registry: ExhibitRegistry,
        target: R,
        strategy: LoadStrategy,
        clock: BoxedTimeSource,
    ) -> Self {
        Self {
            registry,
            target,
            strategy,
            clock,
            generation: 0,
            in_flight: None,
            mounted: None,
            failure: None,
        }
    }

    pub fn registry(&self) -> &ExhibitRegistry {
        &self.registry
    }

    pub fn target(&self) -> &R {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut R {
        &mut self.target
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> LoaderState {
        if let Some(mounted) = &self.mounted {
            return LoaderState::Mounted {
                id: mounted.unit.id().clone(),
                generation: mounted.generation,
            };
        }
        if let Some(in_flight) = &self.in_flight {
            return LoaderState::Loading {
                id: in_flight.id.clone(),
                generation: in_flight.generation,
            };
        }
        match &self.failure {
            Some(error) => LoaderState::Failed {
                id: error.id().clone(),
                error: error.clone(),
            },
            None => LoaderState::Idle,
        }
    }

    pub fn active_unit(&self) -> Option<&ExhibitUnit> {
        self.mounted.as_ref().map(|mounted| &mounted.unit)
    }

    pub fn activate(&mut self, id: ExhibitId) {
        self.teardown();
        self.generation += 1;
        info!(exhibit = %id, generation = self.generation, "activating exhibit");

        let pending = match self.strategy {
            LoadStrategy::Threaded => self.registry.resolve(&id),
            LoadStrategy::Immediate => PendingUnit::ready(self.registry.resolve_now(&id)),
        };
        self.in_flight = Some(InFlight {
            id,
            generation: self.generation,
            pending,
        });
    }

    pub fn deactivate(&mut self) {
        self.teardown();
        self.generation += 1;
        debug!(generation = self.generation, "loader idle");
    }

    fn teardown(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            debug!(exhibit = %in_flight.id, "abandoning in-flight resolve");
        }
        if let Some(mounted) = self.mounted.take() {
            debug!(exhibit = %mounted.unit.id(), "unmounting exhibit");
            self.target.unmount(mounted.program);
        }
        self.failure = None;
    }

    /// Settles a finished resolve. Returns the mount report exactly once per
    /// successful mount.
    pub fn poll(&mut self) -> Option<MountReport> {
        let in_flight = self.in_flight.as_mut()?;
        let result = in_flight.pending.poll()?;
        let in_flight = self.in_flight.take()?;
        self.settle(in_flight, result)
    }

    /// Blocks up to `timeout` for the in-flight resolve, then settles it.
    pub fn wait_for_settle(&mut self, timeout: Duration) -> Option<MountReport> {
        let deadline = Instant::now() + timeout;
        loop {
            let in_flight = self.in_flight.as_mut()?;
            let remaining = deadline.saturating_duration_since(Instant::now());
            if let Some(result) = in_flight.pending.wait(remaining) {
                let in_flight = self.in_flight.take()?;
                return self.settle(in_flight, result);
            }
            if remaining.is_zero() {
                return None;
            }
        }
    }

    fn settle(
        &mut self,
        in_flight: InFlight,
        result: Result<ExhibitUnit, ExhibitError>,
    ) -> Option<MountReport> {
        if in_flight.generation != self.generation {
            debug!(exhibit = %in_flight.id, "discarding superseded resolve");
            return None;
        }

        let mounted = result.and_then(|unit| {
            let program = self.target.mount(&unit)?;
            Ok((unit, program))
        });

        match mounted {
            Ok((unit, program)) => {
                let bridge = UniformBridge::new(&unit.program, &unit.controls);
                let report = MountReport {
                    metadata: unit.metadata.clone(),
                    controls: unit.controls.clone(),
                };
                info!(exhibit = %unit.id(), title = %unit.metadata.title, "exhibit mounted");
                self.clock.reset();
                self.mounted = Some(MountedExhibit {
                    unit,
                    generation: in_flight.generation,
                    program,
                    bridge,
                });
                Some(report)
            }
            Err(error) => {
                warn!(%error, "exhibit failed to load");
                self.failure = Some(error);
                None
            }
        }
    }

    /// Runs one frame. Inactive ticks skip uniform updates and draw calls.
    pub fn tick(
        &mut self,
        pointer: Option<RawPointer>,
        parameters: &ParameterSnapshot,
        is_active: bool,
    ) -> anyhow::Result<FrameOutcome> {
        let Some(mounted) = self.mounted.as_mut() else {
            self.target.present_blank()?;
            return Ok(FrameOutcome::Blank);
        };
        if !is_active {
            return Ok(FrameOutcome::Skipped);
        }

        let sample = self.clock.sample();
        let inputs = FrameInputs {
            elapsed: sample.seconds,
            pointer,
            resolution: self.target.resolution(),
        };
        let uniforms = mounted.bridge.sync(&inputs, parameters);
        self.target.draw(&mut mounted.program, &uniforms)?;
        Ok(FrameOutcome::Drawn)
    }
}

impl<R: RenderTarget> Drop for ExhibitLoader<R> {
    fn drop(&mut self) {
        self.teardown();
    }
}
