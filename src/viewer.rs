use minifb::{Key, Window, WindowOptions};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Instant;

use crate::engine::{BlendEngine, BlendError};
use crate::export::spectral_colormap;
use crate::scene::Scene;
use crate::terrain::{painted_blobs, TerrainPatch};

/// View modes for the interactive viewer
#[derive(Clone, Copy, Debug, PartialEq)]
enum ViewMode {
    Height,   // 1 - Grayscale heights
    Spectral, // 2 - Spectral colormap
    Delta,    // 3 - Deformation relative to the baseline
}

impl ViewMode {
    fn label(&self) -> &'static str {
        match self {
            ViewMode::Height => "Heights (grayscale)",
            ViewMode::Spectral => "Heights (spectral)",
            ViewMode::Delta => "Delta from baseline",
        }
    }

    fn next(self) -> Self {
        match self {
            ViewMode::Height => ViewMode::Spectral,
            ViewMode::Spectral => ViewMode::Delta,
            ViewMode::Delta => ViewMode::Height,
        }
    }
}

/// How fast holding Up/Down sweeps the blend factor, per second.
const SLIDER_RATE: f32 = 0.5;

/// Run the interactive blend viewer.
/// Up/Down drive the blend slider, Tab switches views, Space toggles the
/// engine (deactivating restores the baseline), R reseeds, Esc exits.
pub fn run_viewer(scene: Scene, resolution: usize, initial_seed: u64) {
    let target_size = 900;
    let scale = (target_size / resolution.max(1)).max(1);
    let window_width = resolution * scale;
    let window_height = resolution * scale;

    let mut window = Window::new(
        "Terrain Sculptor - Up/Down: Blend, Tab: View, Space: Toggle, R: Reseed, Esc: Exit",
        window_width,
        window_height,
        WindowOptions {
            resize: false,
            scale: minifb::Scale::X1,
            ..WindowOptions::default()
        },
    )
    .expect("Failed to create window");

    window.set_target_fps(60);

    let mut seed = initial_seed;
    let (mut patch, mut engine) = match build_world(&scene, resolution, seed) {
        Ok(world) => world,
        Err(err) => {
            println!("Cannot start viewer: {}", err);
            return;
        }
    };
    let mut view_mode = ViewMode::Spectral;

    println!("Viewer started. Controls:");
    println!("  Up/Down: Blend factor");
    println!("  Tab: Cycle view ({})", view_mode.label());
    println!("  Space: Deactivate (restore baseline) / reactivate");
    println!("  R: Reseed terrain");
    println!("  Esc: Exit");

    let mut last_frame = Instant::now();

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let dt = last_frame.elapsed().as_secs_f32();
        last_frame = Instant::now();

        if window.is_key_down(Key::Up) {
            engine.set_blend_factor(engine.blend_factor() + SLIDER_RATE * dt);
        }
        if window.is_key_down(Key::Down) {
            engine.set_blend_factor(engine.blend_factor() - SLIDER_RATE * dt);
        }

        if window.is_key_pressed(Key::Tab, minifb::KeyRepeat::No) {
            view_mode = view_mode.next();
            println!("View: {}", view_mode.label());
        }

        if window.is_key_pressed(Key::Space, minifb::KeyRepeat::No) {
            if engine.is_active() {
                let blend = engine.blend_factor();
                engine.deactivate(&mut patch);
                println!("Engine deactivated, baseline restored (blend was {:.2})", blend);
            } else {
                match rebuild_engine(&scene, &patch) {
                    Ok(fresh) => {
                        engine = fresh;
                        println!("Engine reactivated");
                    }
                    Err(err) => println!("Reactivation failed: {}", err),
                }
            }
        }

        if window.is_key_pressed(Key::R, minifb::KeyRepeat::No) {
            seed = rand::random();
            println!("Reseeding terrain with seed: {}", seed);
            match build_world(&scene, resolution, seed) {
                Ok(world) => (patch, engine) = world,
                Err(err) => println!("Reseed failed: {}", err),
            }
        }

        engine.tick(&mut patch, dt);

        let buffer = render_view(&patch, &engine, view_mode, scale);
        window
            .update_with_buffer(&buffer, window_width, window_height)
            .expect("Failed to update window");
    }
}

fn build_world(
    scene: &Scene,
    resolution: usize,
    seed: u64,
) -> Result<(TerrainPatch, BlendEngine), BlendError> {
    let mut patch = TerrainPatch::synthetic(resolution, resolution, scene.world_size, seed);

    if let Some(max_layer) = scene.max_paint_layer() {
        // Half-resolution paint layers exercise the nearest-neighbor resample
        let paint_res = (resolution / 2).max(1);
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(1));
        for _ in 0..=max_layer {
            patch.add_paint_layer(painted_blobs(paint_res, paint_res, 5, &mut rng));
        }
    }

    let engine = rebuild_engine(scene, &patch)?;
    Ok((patch, engine))
}

fn rebuild_engine(scene: &Scene, patch: &TerrainPatch) -> Result<BlendEngine, BlendError> {
    let mut engine = BlendEngine::new(scene.clone().into_config());
    engine.activate(patch)?;
    Ok(engine)
}

fn render_view(
    patch: &TerrainPatch,
    engine: &BlendEngine,
    mode: ViewMode,
    scale: usize,
) -> Vec<u32> {
    let heights = patch.heights();
    let window_width = heights.width * scale;
    let window_height = heights.height * scale;
    let mut buffer = vec![0u32; window_width * window_height];

    // Delta mode normalizes by the largest current deviation
    let delta_scale = match (mode, engine.baseline()) {
        (ViewMode::Delta, Some(baseline)) => {
            let mut max_delta = 0.0f32;
            for (x, z, &h) in heights.iter() {
                max_delta = max_delta.max((h - baseline.get(x, z)).abs());
            }
            Some(1.0 / max_delta.max(1e-6))
        }
        _ => None,
    };

    for wy in 0..window_height {
        let z = wy / scale;
        for wx in 0..window_width {
            let x = wx / scale;
            let h = heights.get(x, z).clamp(0.0, 1.0);

            let [r, g, b] = match mode {
                ViewMode::Height => {
                    let v = (h * 255.0) as u8;
                    [v, v, v]
                }
                ViewMode::Spectral => spectral_colormap(h),
                ViewMode::Delta => match (engine.baseline(), delta_scale) {
                    (Some(baseline), Some(scale)) => {
                        let delta = (h - baseline.get(x, z)) * scale;
                        if delta >= 0.0 {
                            let t = delta.min(1.0);
                            [(30.0 + 225.0 * t) as u8, (30.0 + 110.0 * t) as u8, 30]
                        } else {
                            let t = (-delta).min(1.0);
                            [30, (30.0 + 80.0 * t) as u8, (30.0 + 225.0 * t) as u8]
                        }
                    }
                    // No baseline while deactivated: fall back to grayscale
                    _ => {
                        let v = (h * 255.0) as u8;
                        [v, v, v]
                    }
                },
            };

            buffer[wy * window_width + wx] =
                ((r as u32) << 16) | ((g as u32) << 8) | (b as u32);
        }
    }

    buffer
}
