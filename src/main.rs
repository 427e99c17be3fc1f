use std::path::Path;

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use terrain_sculptor::engine::BlendEngine;
use terrain_sculptor::export;
use terrain_sculptor::region::{InfluenceRegion, PaintWeighted};
use terrain_sculptor::scene::Scene;
use terrain_sculptor::terrain::{painted_blobs, TerrainPatch};
use terrain_sculptor::viewer;

#[derive(Parser, Debug)]
#[command(name = "terrain_sculptor")]
#[command(about = "Blend a heightmap toward sculpted mound and paint regions")]
struct Args {
    /// Heightmap resolution (samples per side)
    #[arg(short = 'r', long, default_value = "257")]
    resolution: usize,

    /// Random seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of random mounds when no scene file is given
    #[arg(short, long, default_value = "4")]
    mounds: usize,

    /// Add a paint-weighted region backed by a painted blob layer
    #[arg(long)]
    paint: bool,

    /// Maximum height change per second
    #[arg(long, default_value = "1.5")]
    change_speed: f32,

    /// Blend factor the slider ramps to over the first half of the run
    #[arg(short, long, default_value = "1.0")]
    blend: f32,

    /// Simulated frames to run
    #[arg(short, long, default_value = "240")]
    frames: usize,

    /// Fixed timestep per frame (seconds)
    #[arg(long, default_value = "0.016666668")]
    dt: f32,

    /// Load a scene JSON file instead of generating a random scene
    #[arg(long)]
    scene: Option<String>,

    /// Write the scene to a JSON file
    #[arg(long)]
    save_scene: Option<String>,

    /// Export PNG snapshots with this path prefix
    #[arg(long)]
    export: Option<String>,

    /// Export a snapshot every N frames (requires --export)
    #[arg(long)]
    export_every: Option<usize>,

    /// Launch the interactive viewer instead of the batch run
    #[arg(long)]
    view: bool,
}

fn main() {
    let args = Args::parse();

    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    // World units match cell intervals, so one cell per world unit
    let world_extent = (args.resolution.saturating_sub(1)) as f32;

    let scene = match &args.scene {
        Some(path) => match Scene::load(Path::new(path)) {
            Ok(scene) => {
                println!("Loaded scene from {} ({} regions)", path, scene.regions.len());
                scene
            }
            Err(err) => {
                eprintln!("Failed to load scene {}: {}", path, err);
                std::process::exit(1);
            }
        },
        None => {
            let mut scene = Scene::random(
                (world_extent, world_extent),
                args.mounds,
                args.change_speed,
                &mut rng,
            );
            if args.paint {
                scene.regions.push(InfluenceRegion::PaintWeighted(PaintWeighted {
                    layer: 0,
                    target_height: 0.75,
                }));
            }
            scene
        }
    };

    if let Some(path) = &args.save_scene {
        match scene.save(Path::new(path)) {
            Ok(()) => println!("Saved scene to {}", path),
            Err(err) => eprintln!("Failed to save scene {}: {}", path, err),
        }
    }

    println!("Seed: {}", seed);
    println!(
        "Grid: {}x{} over {}x{} world units",
        args.resolution, args.resolution, scene.world_size.0, scene.world_size.1
    );
    println!("Regions: {}", scene.regions.len());

    if args.view {
        viewer::run_viewer(scene, args.resolution, seed);
        return;
    }

    // Build the terrain patch
    let mut patch =
        TerrainPatch::synthetic(args.resolution, args.resolution, scene.world_size, seed);
    if let Some(max_layer) = scene.max_paint_layer() {
        let paint_res = (args.resolution / 2).max(1);
        for _ in 0..=max_layer {
            patch.add_paint_layer(painted_blobs(paint_res, paint_res, 5, &mut rng));
        }
        println!("Paint layers: {} ({}x{})", max_layer + 1, paint_res, paint_res);
    }
    let baseline = patch.heights().clone();

    let mut engine = BlendEngine::new(scene.into_config());
    if let Err(err) = engine.activate(&patch) {
        eprintln!("Activation failed: {}", err);
        std::process::exit(1);
    }

    // Ramp the blend factor over the first half of the run, then hold,
    // standing in for a user dragging the slider
    let target_blend = args.blend.clamp(0.0, 1.0);
    let ramp_frames = (args.frames / 2).max(1);

    println!("Running {} frames at dt={}s...", args.frames, args.dt);
    for frame in 0..args.frames {
        let t = (frame as f32 / ramp_frames as f32).min(1.0);
        engine.set_blend_factor(target_blend * t);
        engine.tick(&mut patch, args.dt);

        if let (Some(prefix), Some(every)) = (&args.export, args.export_every) {
            if every > 0 && frame % every == 0 {
                let path = format!("{}_frame{:04}.png", prefix, frame);
                if let Err(err) = export::export_heights(patch.heights(), &path) {
                    eprintln!("Export failed for {}: {}", path, err);
                }
            }
        }
    }

    // Report how far the terrain moved
    let mut max_delta = 0.0f32;
    let mut raised_cells = 0usize;
    for (x, z, &h) in patch.heights().iter() {
        let delta = h - baseline.get(x, z);
        max_delta = max_delta.max(delta);
        if delta > 1e-6 {
            raised_cells += 1;
        }
    }
    let total_cells = args.resolution * args.resolution;
    println!(
        "Raised {} of {} cells ({:.1}%), max raise {:.3}",
        raised_cells,
        total_cells,
        100.0 * raised_cells as f64 / total_cells.max(1) as f64,
        max_delta
    );

    if let Some(prefix) = &args.export {
        let final_path = format!("{}_final.png", prefix);
        let delta_path = format!("{}_delta.png", prefix);
        let baseline_path = format!("{}_baseline.png", prefix);
        if let Err(err) = export::export_heights_spectral(patch.heights(), &final_path) {
            eprintln!("Export failed for {}: {}", final_path, err);
        } else {
            println!("Saved final heights: {}", final_path);
        }
        if let Err(err) = export::export_delta(patch.heights(), &baseline, &delta_path) {
            eprintln!("Export failed for {}: {}", delta_path, err);
        } else {
            println!("Saved deformation map: {}", delta_path);
        }
        if let Err(err) = export::export_heights_spectral(&baseline, &baseline_path) {
            eprintln!("Export failed for {}: {}", baseline_path, err);
        } else {
            println!("Saved baseline: {}", baseline_path);
        }
    }

    // Deactivation must leave no residual deformation
    engine.deactivate(&mut patch);
    let restored = *patch.heights() == baseline;
    println!("Baseline restored on deactivation: {}", restored);
}
