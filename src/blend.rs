//! The per-tick blend pipeline: compose a target grid from the baseline and
//! the active regions, then advance the live grid toward it at a bounded
//! rate.
//!
//! The target is rebuilt from the baseline every tick, never accumulated, so
//! removing or editing a region takes effect immediately: the terrain simply
//! starts moving toward the new target.
//!
//! Parallelization: the interpolation pass is per-cell independent, so rayon
//! splits it over rows.

use rayon::prelude::*;

use crate::grid::Grid;
use crate::mapping::GridMapping;
use crate::region::{paint_cell, InfluenceRegion};

/// Step a value toward a target by at most `max_step`, snapping exactly onto
/// the target when the remaining distance is within the step.
pub fn move_towards(current: f32, target: f32, max_step: f32) -> f32 {
    let max_step = max_step.max(0.0);
    let delta = target - current;
    if delta.abs() <= max_step {
        target
    } else {
        current + max_step.copysign(delta)
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Rebuild the target grid: baseline, raised by every region's candidate
/// height.
///
/// Per cell, each region contributes `lerp(baseline, region target, blend)`
/// where `blend = blend_factor * mask`. Overlapping regions resolve by
/// maximum over baseline and all candidates — not sum, not last writer — so
/// regions only ever raise terrain relative to baseline.
pub fn compose_target(
    target: &mut Grid<f32>,
    baseline: &Grid<f32>,
    regions: &[InfluenceRegion],
    paint_layers: &[Grid<f32>],
    mapping: &GridMapping,
    blend_factor: f32,
) {
    let blend_factor = blend_factor.clamp(0.0, 1.0);
    target.copy_from(baseline);

    let (width, height) = (baseline.width, baseline.height);

    for region in regions {
        match region {
            InfluenceRegion::RadialMound(mound) => {
                let fp = mound.footprint(mapping, width, height);
                if fp.radius_cells <= 0.0 {
                    continue;
                }
                let target_height = mound.target_height.clamp(0.0, 1.0);

                for z in fp.bounds.z0..=fp.bounds.z1 {
                    for x in fp.bounds.x0..=fp.bounds.x1 {
                        let dx = x as f32 - fp.center_x as f32;
                        let dz = z as f32 - fp.center_z as f32;
                        let nd = (dx * dx + dz * dz).sqrt() / fp.radius_cells;
                        if nd > 1.0 {
                            continue;
                        }

                        let mask = mound.mask_at(nd);
                        if mask <= 0.0 {
                            continue;
                        }

                        let blend = blend_factor * mask;
                        let candidate = lerp(*baseline.get(x, z), target_height, blend);
                        if candidate > *target.get(x, z) {
                            target.set(x, z, candidate);
                        }
                    }
                }
            }
            InfluenceRegion::PaintWeighted(painted) => {
                let Some(paint) = paint_layers.get(painted.layer) else {
                    continue;
                };
                let target_height = painted.target_height.clamp(0.0, 1.0);

                for z in 0..height {
                    for x in 0..width {
                        let (px, pz) =
                            paint_cell(x, z, width, height, paint.width, paint.height);
                        let mask = paint.get(px, pz).clamp(0.0, 1.0);
                        if mask <= 0.0 {
                            continue;
                        }

                        let blend = blend_factor * mask;
                        let candidate = lerp(*baseline.get(x, z), target_height, blend);
                        if candidate > *target.get(x, z) {
                            target.set(x, z, candidate);
                        }
                    }
                }
            }
        }
    }
}

/// Move every live cell toward its target by at most `max_step`.
pub fn advance_towards(live: &mut Grid<f32>, target: &Grid<f32>, max_step: f32) {
    assert_eq!(live.width, target.width);
    assert_eq!(live.height, target.height);
    let width = live.width;
    if width == 0 {
        return;
    }

    live.as_mut_slice()
        .par_chunks_mut(width)
        .zip(target.as_slice().par_chunks(width))
        .for_each(|(live_row, target_row)| {
            for (cell, &goal) in live_row.iter_mut().zip(target_row) {
                *cell = move_towards(*cell, goal, max_step);
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{PaintWeighted, RadialMound};

    fn uniform_mapping(size: usize) -> GridMapping {
        GridMapping::new(size, size, ((size - 1) as f32, (size - 1) as f32), (0.0, 0.0))
    }

    fn mound_at(center: (f32, f32), radius: f32, target_height: f32) -> InfluenceRegion {
        InfluenceRegion::RadialMound(RadialMound {
            center,
            radius,
            target_height,
            plateau_fraction: 0.6,
            edge_feather: 0.3,
        })
    }

    #[test]
    fn test_move_towards_steps_and_snaps() {
        assert_eq!(move_towards(0.0, 1.0, 0.25), 0.25);
        assert_eq!(move_towards(0.9, 1.0, 0.25), 1.0);
        assert_eq!(move_towards(1.0, 0.0, 0.25), 0.75);
        assert_eq!(move_towards(0.5, 0.5, 0.25), 0.5);
    }

    #[test]
    fn test_move_towards_never_overshoots() {
        let mut v = 0.0f32;
        for _ in 0..100 {
            v = move_towards(v, 0.73, 0.05);
            assert!(v <= 0.73);
        }
        assert_eq!(v, 0.73);
        // Once reached, further steps hold exactly
        assert_eq!(move_towards(v, 0.73, 0.05), 0.73);
    }

    #[test]
    fn test_target_never_below_baseline() {
        let baseline = Grid::new_with(33, 33, 0.2f32);
        let mut target = Grid::new_with(33, 33, 0.0f32);
        // A mound whose target height is below the baseline must not dig
        let regions = vec![mound_at((16.0, 16.0), 10.0, 0.05)];
        compose_target(&mut target, &baseline, &regions, &[], &uniform_mapping(33), 1.0);
        for (_, _, &t) in target.iter() {
            assert_eq!(t, 0.2);
        }
    }

    #[test]
    fn test_target_bounded_by_region_heights() {
        let baseline = Grid::new_with(33, 33, 0.2f32);
        let mut target = Grid::new_with(33, 33, 0.0f32);
        let regions = vec![
            mound_at((10.0, 10.0), 8.0, 0.7),
            mound_at((20.0, 20.0), 8.0, 0.9),
        ];
        compose_target(&mut target, &baseline, &regions, &[], &uniform_mapping(33), 1.0);
        for (x, z, &t) in target.iter() {
            assert!(t >= 0.2, "target below baseline at ({}, {})", x, z);
            assert!(t <= 0.9, "target above any region height at ({}, {})", x, z);
        }
        assert!((*target.get(10, 10) - 0.7).abs() < 1e-6);
        assert!((*target.get(20, 20) - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_overlap_takes_max_not_sum() {
        let baseline = Grid::new_with(33, 33, 0.2f32);
        let mut target = Grid::new_with(33, 33, 0.0f32);
        // Both mounds have full mask at (16, 16)
        let regions = vec![
            mound_at((16.0, 16.0), 10.0, 0.5),
            mound_at((16.0, 16.0), 10.0, 0.8),
        ];
        compose_target(&mut target, &baseline, &regions, &[], &uniform_mapping(33), 1.0);
        assert!((*target.get(16, 16) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_zero_blend_factor_leaves_baseline() {
        let baseline = Grid::from_fn(17, 17, |x, z| 0.1 + 0.01 * (x + z) as f32);
        let mut target = Grid::new_with(17, 17, 0.0f32);
        let regions = vec![mound_at((8.0, 8.0), 6.0, 0.9)];
        compose_target(&mut target, &baseline, &regions, &[], &uniform_mapping(17), 0.0);
        assert_eq!(target, baseline);
    }

    #[test]
    fn test_paint_weighted_masks_from_layer() {
        let baseline = Grid::new_with(8, 8, 0.2f32);
        let mut target = Grid::new_with(8, 8, 0.0f32);
        // Half-resolution paint layer: only its (0, 0) cell is painted,
        // covering heightmap cells 0..4 on each axis
        let mut paint = Grid::new_with(4, 4, 0.0f32);
        paint.set(0, 0, 1.0);
        let regions = vec![InfluenceRegion::PaintWeighted(PaintWeighted {
            layer: 0,
            target_height: 0.8,
        })];
        compose_target(&mut target, &baseline, &regions, &[paint], &uniform_mapping(8), 1.0);

        assert!((*target.get(0, 0) - 0.8).abs() < 1e-6);
        assert!((*target.get(1, 1) - 0.8).abs() < 1e-6);
        assert_eq!(*target.get(2, 0), 0.2);
        assert_eq!(*target.get(7, 7), 0.2);
    }

    #[test]
    fn test_paint_weight_scales_blend() {
        let baseline = Grid::new_with(4, 4, 0.2f32);
        let mut target = Grid::new_with(4, 4, 0.0f32);
        let mut paint = Grid::new_with(4, 4, 0.0f32);
        paint.set(1, 1, 0.5);
        let regions = vec![InfluenceRegion::PaintWeighted(PaintWeighted {
            layer: 0,
            target_height: 0.8,
        })];
        compose_target(&mut target, &baseline, &regions, &[paint], &uniform_mapping(4), 1.0);
        // Half weight: halfway between baseline and target height
        assert!((*target.get(1, 1) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_advance_bounds_per_tick_change() {
        let mut live = Grid::new_with(16, 16, 0.2f32);
        let mut target = Grid::new_with(16, 16, 0.9f32);
        target.set(3, 3, 0.0);

        let before = live.clone();
        let step = 0.07;
        advance_towards(&mut live, &target, step);

        for (x, z, &after) in live.iter() {
            let delta = (after - before.get(x, z)).abs();
            assert!(delta <= step + 1e-7, "cell ({}, {}) moved {}", x, z, delta);
        }
        // Moving down is bounded too
        assert!((*live.get(3, 3) - (0.2 - step)).abs() < 1e-6);
    }

    #[test]
    fn test_advance_converges_and_holds() {
        let mut live = Grid::new_with(8, 8, 0.1f32);
        let target = Grid::new_with(8, 8, 0.65f32);

        let mut prev_gap = f32::MAX;
        for _ in 0..20 {
            advance_towards(&mut live, &target, 0.05);
            let gap = (0.65 - *live.get(4, 4)).abs();
            assert!(gap <= prev_gap, "distance to target grew");
            prev_gap = gap;
        }
        assert_eq!(*live.get(0, 0), 0.65);

        // Fixed point: another tick changes nothing
        let settled = live.clone();
        advance_towards(&mut live, &target, 0.05);
        assert_eq!(live, settled);
    }
}
