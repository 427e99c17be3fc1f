//! Grid-to-world mapping.
//!
//! A heightmap of `resolution` samples spans a world extent with
//! `resolution - 1` cell intervals, so the conversion factor is
//! `(resolution - 1) / extent` per axis. The mapping is computed once at
//! activation and stays fixed for the engine's lifetime.

/// Fixed affine transform between world coordinates and grid indices.
#[derive(Clone, Copy, Debug)]
pub struct GridMapping {
    /// Grid cells per world unit along X.
    pub cells_per_world_x: f32,
    /// Grid cells per world unit along Z.
    pub cells_per_world_z: f32,
    /// World-space position of grid cell (0, 0).
    pub origin_x: f32,
    pub origin_z: f32,
}

impl GridMapping {
    pub fn new(
        grid_width: usize,
        grid_height: usize,
        world_size: (f32, f32),
        origin: (f32, f32),
    ) -> Self {
        Self {
            cells_per_world_x: (grid_width.saturating_sub(1)) as f32 / world_size.0.max(1e-6),
            cells_per_world_z: (grid_height.saturating_sub(1)) as f32 / world_size.1.max(1e-6),
            origin_x: origin.0,
            origin_z: origin.1,
        }
    }

    /// Nearest grid cell for a world-space position. May fall outside the
    /// grid; callers clamp when they need a valid index.
    pub fn world_to_cell(&self, world_x: f32, world_z: f32) -> (i32, i32) {
        (
            ((world_x - self.origin_x) * self.cells_per_world_x).round() as i32,
            ((world_z - self.origin_z) * self.cells_per_world_z).round() as i32,
        )
    }

    /// Project a world-space radius into grid cells.
    ///
    /// When the two axes have different world-to-grid scale factors the
    /// radius is projected per axis and averaged. The distance test stays
    /// circular in grid space, so on anisotropic grids the footprint is an
    /// approximation rather than an exact ellipse. Existing region
    /// placements rely on this footprint; do not "fix" it.
    pub fn radius_to_cells(&self, world_radius: f32) -> f32 {
        let rx = world_radius * self.cells_per_world_x;
        let rz = world_radius * self.cells_per_world_z;
        (rx + rz) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_to_cell_rounds() {
        // 11 samples over 10 world units: one cell per unit
        let mapping = GridMapping::new(11, 11, (10.0, 10.0), (0.0, 0.0));
        assert_eq!(mapping.world_to_cell(0.0, 0.0), (0, 0));
        assert_eq!(mapping.world_to_cell(3.4, 6.6), (3, 7));
        // Positions off the patch still convert; callers clamp
        assert_eq!(mapping.world_to_cell(-2.0, 14.0), (-2, 14));
    }

    #[test]
    fn test_origin_offset() {
        let mapping = GridMapping::new(11, 11, (10.0, 10.0), (100.0, -50.0));
        assert_eq!(mapping.world_to_cell(105.0, -45.0), (5, 5));
    }

    #[test]
    fn test_radius_averaging_on_anisotropic_grid() {
        // X axis: 1 cell per unit, Z axis: 2 cells per unit
        let mapping = GridMapping::new(11, 21, (10.0, 10.0), (0.0, 0.0));
        // radius 2 projects to 2 cells on X, 4 on Z; averaged to 3
        assert_eq!(mapping.radius_to_cells(2.0), 3.0);
    }

    #[test]
    fn test_uniform_radius_is_exact() {
        let mapping = GridMapping::new(101, 101, (50.0, 50.0), (0.0, 0.0));
        assert_eq!(mapping.radius_to_cells(5.0), 10.0);
    }
}
