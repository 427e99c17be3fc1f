//! Profiling tool for the blend pipeline on a large grid

use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use terrain_sculptor::engine::BlendEngine;
use terrain_sculptor::scene::Scene;
use terrain_sculptor::terrain::TerrainPatch;

fn main() {
    let resolution = 1025;
    let mounds = 64;
    let seed = 1337u64;
    let ticks = 120;

    println!("=== Blend Pipeline Profiling ===");
    println!(
        "Grid: {}x{} ({} cells), {} mounds",
        resolution,
        resolution,
        resolution * resolution,
        mounds
    );
    println!();

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let world_extent = (resolution - 1) as f32;
    let scene = Scene::random((world_extent, world_extent), mounds, 1.5, &mut rng);

    // Profile synthetic terrain generation
    let start = Instant::now();
    let mut patch = TerrainPatch::synthetic(resolution, resolution, scene.world_size, seed);
    println!("Terrain generation: {:?}", start.elapsed());

    // Profile activation (baseline capture + validation)
    let mut engine = BlendEngine::new(scene.into_config());
    let start = Instant::now();
    engine
        .activate(&patch)
        .expect("profiling scene should activate");
    engine.set_blend_factor(1.0);
    println!("Activation: {:?}", start.elapsed());

    // First tick pays for target composition across all mound footprints
    let start = Instant::now();
    engine.tick(&mut patch, 1.0 / 60.0);
    println!("First tick: {:?}", start.elapsed());

    // Steady-state ticking
    let start = Instant::now();
    for _ in 0..ticks {
        engine.tick(&mut patch, 1.0 / 60.0);
    }
    let elapsed = start.elapsed();
    println!(
        "{} ticks: {:?} ({:.2} ms/tick)",
        ticks,
        elapsed,
        elapsed.as_secs_f64() * 1000.0 / ticks as f64
    );

    // Restore pass
    let start = Instant::now();
    engine.deactivate(&mut patch);
    println!("Deactivation (baseline restore): {:?}", start.elapsed());
}
