//! The blend engine: lifecycle, per-tick pipeline, and configuration
//! validation.
//!
//! Lifecycle is Uninitialized -> Active -> Disabled. Activation captures the
//! baseline heightmap and the grid-to-world mapping exactly once; any
//! configuration problem found there disables the engine before a single
//! blended cell is written. Deactivation writes the baseline back, so an
//! engine that ran for a thousand ticks leaves the terrain exactly as it
//! found it.

use std::fmt;

use crate::blend::{advance_towards, compose_target};
use crate::grid::Grid;
use crate::mapping::GridMapping;
use crate::region::InfluenceRegion;
use crate::terrain::TerrainPatch;

/// Configuration errors detected at activation (or region replacement).
/// Terminal for the engine instance: the caller builds a new engine after
/// fixing the configuration.
#[derive(Debug)]
pub enum BlendError {
    /// The terrain patch has no cells.
    EmptyGrid,
    /// A paint-weighted region references a layer the patch does not have.
    InvalidPaintLayer { layer: usize, layer_count: usize },
    /// Change speed must be positive for the terrain to ever move.
    NonPositiveChangeSpeed(f32),
    /// A radial mound with no area.
    NonPositiveRadius { index: usize, radius: f32 },
}

impl fmt::Display for BlendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlendError::EmptyGrid => write!(f, "terrain patch has an empty height grid"),
            BlendError::InvalidPaintLayer { layer, layer_count } => write!(
                f,
                "paint layer index {} out of range ({} layers available)",
                layer, layer_count
            ),
            BlendError::NonPositiveChangeSpeed(speed) => {
                write!(f, "change speed must be positive, got {}", speed)
            }
            BlendError::NonPositiveRadius { index, radius } => write!(
                f,
                "region {} has non-positive radius {}",
                index, radius
            ),
        }
    }
}

impl std::error::Error for BlendError {}

/// Engine configuration, validated at activation.
#[derive(Clone, Debug)]
pub struct BlendConfig {
    pub regions: Vec<InfluenceRegion>,
    /// Maximum height change per cell per world-time unit.
    pub change_speed: f32,
    /// Blend factor before any slider input arrives.
    pub initial_blend: f32,
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self {
            regions: Vec::new(),
            change_speed: 1.5,
            initial_blend: 0.0,
        }
    }
}

/// Observable lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Active,
    Disabled,
}

/// Everything captured at activation. Baseline is never written again.
struct ActiveState {
    baseline: Grid<f32>,
    /// Scratch target grid, rebuilt from baseline every tick.
    target: Grid<f32>,
    mapping: GridMapping,
    paint_layer_count: usize,
}

enum State {
    Uninitialized,
    Active(Box<ActiveState>),
    Disabled,
}

/// Blends a live heightmap toward region-defined targets at a bounded rate.
pub struct BlendEngine {
    regions: Vec<InfluenceRegion>,
    change_speed: f32,
    blend_factor: f32,
    state: State,
}

impl BlendEngine {
    pub fn new(config: BlendConfig) -> Self {
        Self {
            regions: config.regions,
            change_speed: config.change_speed,
            blend_factor: config.initial_blend.clamp(0.0, 1.0),
            state: State::Uninitialized,
        }
    }

    pub fn state(&self) -> EngineState {
        match self.state {
            State::Uninitialized => EngineState::Uninitialized,
            State::Active(_) => EngineState::Active,
            State::Disabled => EngineState::Disabled,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, State::Active(_))
    }

    /// The global blend factor, driven externally (typically a UI slider).
    /// Clamped on write so every read is already valid.
    pub fn set_blend_factor(&mut self, value: f32) {
        self.blend_factor = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
    }

    pub fn blend_factor(&self) -> f32 {
        self.blend_factor
    }

    pub fn regions(&self) -> &[InfluenceRegion] {
        &self.regions
    }

    /// Baseline captured at activation, if active.
    pub fn baseline(&self) -> Option<&Grid<f32>> {
        match &self.state {
            State::Active(active) => Some(&active.baseline),
            _ => None,
        }
    }

    /// Capture the baseline and the grid-to-world mapping, validating the
    /// configuration against the patch. One-shot: repeated calls on an
    /// already activated (or disabled) engine do nothing.
    ///
    /// On any configuration error the engine transitions straight to
    /// Disabled and never blends a cell.
    pub fn activate(&mut self, patch: &TerrainPatch) -> Result<(), BlendError> {
        if !matches!(self.state, State::Uninitialized) {
            return Ok(());
        }

        match self.capture(patch) {
            Ok(active) => {
                self.state = State::Active(Box::new(active));
                Ok(())
            }
            Err(err) => {
                self.state = State::Disabled;
                Err(err)
            }
        }
    }

    fn capture(&self, patch: &TerrainPatch) -> Result<ActiveState, BlendError> {
        if patch.width() == 0 || patch.height() == 0 {
            return Err(BlendError::EmptyGrid);
        }
        if !(self.change_speed > 0.0) {
            return Err(BlendError::NonPositiveChangeSpeed(self.change_speed));
        }
        validate_regions(&self.regions, patch.paint_layer_count())?;

        Ok(ActiveState {
            baseline: patch.heights().clone(),
            target: patch.heights().clone(),
            mapping: GridMapping::new(
                patch.width(),
                patch.height(),
                patch.world_size,
                patch.origin,
            ),
            paint_layer_count: patch.paint_layer_count(),
        })
    }

    /// Swap in a new region snapshot. Validated up front; takes effect on
    /// the next tick, never mid-iteration. The target is rebuilt from the
    /// baseline each tick, so removed regions release their cells
    /// immediately and the terrain eases back at the usual bounded rate.
    pub fn replace_regions(&mut self, regions: Vec<InfluenceRegion>) -> Result<(), BlendError> {
        if let State::Active(active) = &self.state {
            validate_regions(&regions, active.paint_layer_count)?;
        } else {
            validate_radii(&regions)?;
        }
        self.regions = regions;
        Ok(())
    }

    /// One blend step: recompose the target grid from the baseline and the
    /// current regions, then move every live cell toward it by at most
    /// `change_speed * dt`. Does nothing unless Active.
    pub fn tick(&mut self, patch: &mut TerrainPatch, dt: f32) {
        let State::Active(active) = &mut self.state else {
            return;
        };

        compose_target(
            &mut active.target,
            &active.baseline,
            &self.regions,
            patch.paint_layers(),
            &active.mapping,
            self.blend_factor,
        );

        let step = self.change_speed * dt.max(0.0);
        advance_towards(patch.heights_mut(), &active.target, step);
    }

    /// Restore the baseline into the live grid and go inert. After this the
    /// terrain carries no residual deformation from this engine.
    pub fn deactivate(&mut self, patch: &mut TerrainPatch) {
        if let State::Active(active) = &self.state {
            patch.heights_mut().copy_from(&active.baseline);
        }
        self.state = State::Disabled;
    }
}

fn validate_regions(
    regions: &[InfluenceRegion],
    layer_count: usize,
) -> Result<(), BlendError> {
    validate_radii(regions)?;
    for region in regions {
        if let InfluenceRegion::PaintWeighted(painted) = region {
            if painted.layer >= layer_count {
                return Err(BlendError::InvalidPaintLayer {
                    layer: painted.layer,
                    layer_count,
                });
            }
        }
    }
    Ok(())
}

fn validate_radii(regions: &[InfluenceRegion]) -> Result<(), BlendError> {
    for (index, region) in regions.iter().enumerate() {
        if let InfluenceRegion::RadialMound(mound) = region {
            if !(mound.radius > 0.0) {
                return Err(BlendError::NonPositiveRadius {
                    index,
                    radius: mound.radius,
                });
            }
        }
    }
    Ok(())
}
