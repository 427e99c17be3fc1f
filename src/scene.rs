//! Scene files for the demo binary: world extents, blend parameters, and
//! the region list, saved as hand-editable JSON.

use std::fs;
use std::io;
use std::path::Path;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::engine::BlendConfig;
use crate::region::{InfluenceRegion, RadialMound};

/// Format version for forward compatibility
const SCENE_VERSION: u32 = 1;

/// A saved demo scene.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scene {
    pub version: u32,
    /// World-space extent (x, z) the height grid spans.
    pub world_size: (f32, f32),
    pub change_speed: f32,
    pub initial_blend: f32,
    pub regions: Vec<InfluenceRegion>,
}

impl Scene {
    /// Scatter random mounds across the world extent.
    pub fn random(
        world_size: (f32, f32),
        mounds: usize,
        change_speed: f32,
        rng: &mut ChaCha8Rng,
    ) -> Self {
        let min_extent = world_size.0.min(world_size.1);
        let regions = (0..mounds)
            .map(|_| {
                InfluenceRegion::RadialMound(RadialMound {
                    center: (
                        rng.gen_range(0.0..world_size.0),
                        rng.gen_range(0.0..world_size.1),
                    ),
                    radius: rng.gen_range(0.08..0.22) * min_extent,
                    target_height: rng.gen_range(0.5..0.9),
                    plateau_fraction: rng.gen_range(0.4..0.7),
                    edge_feather: rng.gen_range(0.2..0.4),
                })
            })
            .collect();

        Self {
            version: SCENE_VERSION,
            world_size,
            change_speed,
            initial_blend: 0.0,
            regions,
        }
    }

    pub fn into_config(self) -> BlendConfig {
        BlendConfig {
            regions: self.regions,
            change_speed: self.change_speed,
            initial_blend: self.initial_blend,
        }
    }

    /// Highest paint layer index any region references, if any region is
    /// paint-weighted. Drives how many layers the demo patch needs.
    pub fn max_paint_layer(&self) -> Option<usize> {
        self.regions
            .iter()
            .filter_map(|region| match region {
                InfluenceRegion::PaintWeighted(painted) => Some(painted.layer),
                InfluenceRegion::RadialMound(_) => None,
            })
            .max()
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            io::Error::new(io::ErrorKind::Other, format!("Serialization failed: {}", e))
        })?;
        fs::write(path, json)
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        let json = fs::read_to_string(path)?;
        let scene: Scene = serde_json::from_str(&json).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Deserialization failed: {}", e),
            )
        })?;
        if scene.version != SCENE_VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unsupported scene version {}", scene.version),
            ));
        }
        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::PaintWeighted;
    use rand::SeedableRng;

    #[test]
    fn test_json_round_trip() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let mut scene = Scene::random((256.0, 256.0), 3, 1.5, &mut rng);
        scene.regions.push(InfluenceRegion::PaintWeighted(PaintWeighted {
            layer: 1,
            target_height: 0.7,
        }));

        let json = serde_json::to_string(&scene).unwrap();
        let loaded: Scene = serde_json::from_str(&json).unwrap();

        assert_eq!(loaded.version, SCENE_VERSION);
        assert_eq!(loaded.regions.len(), 4);
        assert_eq!(loaded.world_size, scene.world_size);
        assert_eq!(loaded.max_paint_layer(), Some(1));
    }

    #[test]
    fn test_random_scene_is_valid_config() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let scene = Scene::random((128.0, 64.0), 6, 2.0, &mut rng);
        assert_eq!(scene.regions.len(), 6);
        for region in &scene.regions {
            let InfluenceRegion::RadialMound(mound) = region else {
                panic!("random scenes contain only mounds");
            };
            assert!(mound.radius > 0.0);
            assert!(mound.center.0 >= 0.0 && mound.center.0 <= 128.0);
            assert!(mound.center.1 >= 0.0 && mound.center.1 <= 64.0);
            assert!((0.0..=1.0).contains(&mound.target_height));
        }
        assert_eq!(scene.max_paint_layer(), None);
    }

    #[test]
    fn test_into_config_preserves_parameters() {
        let scene = Scene {
            version: SCENE_VERSION,
            world_size: (64.0, 64.0),
            change_speed: 3.0,
            initial_blend: 0.25,
            regions: vec![InfluenceRegion::RadialMound(RadialMound::default())],
        };
        let config = scene.into_config();
        assert_eq!(config.change_speed, 3.0);
        assert_eq!(config.initial_blend, 0.25);
        assert_eq!(config.regions.len(), 1);
    }
}
