//! Terrain storage: the height grid and paint layers the blend engine reads
//! and writes.
//!
//! The patch owns its arrays; the engine borrows them for the duration of
//! one tick and never keeps a reference across ticks. Heights are
//! normalized to [0,1], paint weights likewise.

use noise::{NoiseFn, Perlin, Seedable};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::grid::Grid;
use crate::region::smoothstep01;

/// A rectangular terrain patch: height samples plus optional paint layers,
/// spanning a fixed world-space extent.
pub struct TerrainPatch {
    heights: Grid<f32>,
    paint: Vec<Grid<f32>>,
    /// World-space extent (x, z) the height grid spans.
    pub world_size: (f32, f32),
    /// World-space position of grid cell (0, 0).
    pub origin: (f32, f32),
}

impl TerrainPatch {
    pub fn new(heights: Grid<f32>, world_size: (f32, f32)) -> Self {
        Self {
            heights,
            paint: Vec::new(),
            world_size,
            origin: (0.0, 0.0),
        }
    }

    pub fn width(&self) -> usize {
        self.heights.width
    }

    pub fn height(&self) -> usize {
        self.heights.height
    }

    pub fn heights(&self) -> &Grid<f32> {
        &self.heights
    }

    pub fn heights_mut(&mut self) -> &mut Grid<f32> {
        &mut self.heights
    }

    /// Append a paint layer. Its resolution may differ from the height
    /// grid; lookups resample nearest-neighbor.
    pub fn add_paint_layer(&mut self, weights: Grid<f32>) {
        self.paint.push(weights);
    }

    pub fn paint_layers(&self) -> &[Grid<f32>] {
        &self.paint
    }

    pub fn paint_layer_count(&self) -> usize {
        self.paint.len()
    }

    /// Build a patch with a gently rolling fBm baseline, for demos and
    /// profiling.
    pub fn synthetic(width: usize, height: usize, world_size: (f32, f32), seed: u64) -> Self {
        Self::new(rolling_baseline(width, height, seed), world_size)
    }
}

/// Generate a rolling baseline heightmap in roughly the 0.15-0.30 band,
/// leaving headroom for mounds to raise terrain toward their targets.
pub fn rolling_baseline(width: usize, height: usize, seed: u64) -> Grid<f32> {
    let perlin = Perlin::new(1).set_seed(seed as u32);

    Grid::from_fn(width, height, |x, z| {
        let nx = x as f64 / width.max(1) as f64;
        let nz = z as f64 / height.max(1) as f64;
        let n = fbm(&perlin, nx * 3.0, nz * 3.0, 4, 0.5, 2.0) as f32;
        (0.22 + 0.075 * n).clamp(0.0, 1.0)
    })
}

/// Paint a weight layer with soft circular blobs, for demo scenes that
/// exercise the paint-weighted path.
pub fn painted_blobs(
    width: usize,
    height: usize,
    blobs: usize,
    rng: &mut ChaCha8Rng,
) -> Grid<f32> {
    let mut layer = Grid::new_with(width, height, 0.0f32);
    if width == 0 || height == 0 {
        return layer;
    }

    for _ in 0..blobs {
        let cx = rng.gen_range(0..width) as f32;
        let cz = rng.gen_range(0..height) as f32;
        let radius = rng.gen_range(0.08..0.2) * width.min(height) as f32;

        let x0 = ((cx - radius).floor().max(0.0)) as usize;
        let x1 = ((cx + radius).ceil() as usize).min(width - 1);
        let z0 = ((cz - radius).floor().max(0.0)) as usize;
        let z1 = ((cz + radius).ceil() as usize).min(height - 1);

        for z in z0..=z1 {
            for x in x0..=x1 {
                let dx = x as f32 - cx;
                let dz = z as f32 - cz;
                let nd = (dx * dx + dz * dz).sqrt() / radius;
                if nd > 1.0 {
                    continue;
                }
                let weight = 1.0 - smoothstep01(nd);
                if weight > *layer.get(x, z) {
                    layer.set(x, z, weight);
                }
            }
        }
    }

    layer
}

/// Fractional Brownian Motion - multi-octave noise
fn fbm(
    noise: &Perlin,
    x: f64,
    y: f64,
    octaves: u32,
    persistence: f64,
    lacunarity: f64,
) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_value = 0.0;

    for _ in 0..octaves {
        total += amplitude * noise.get([x * frequency, y * frequency]);
        max_value += amplitude;
        amplitude *= persistence;
        frequency *= lacunarity;
    }

    total / max_value
}
