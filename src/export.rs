use image::{ImageBuffer, Rgb, RgbImage};

use crate::grid::Grid;

/// Export a height grid as a grayscale PNG. Values are expected to be
/// normalized (0.0-1.0).
pub fn export_heights(grid: &Grid<f32>, path: &str) -> Result<(), image::ImageError> {
    let mut img: RgbImage = ImageBuffer::new(grid.width as u32, grid.height as u32);

    for (x, z, &h) in grid.iter() {
        let v = (h.clamp(0.0, 1.0) * 255.0) as u8;
        img.put_pixel(x as u32, z as u32, Rgb([v, v, v]));
    }

    img.save(path)
}

/// Export a height grid using the spectral colormap.
pub fn export_heights_spectral(grid: &Grid<f32>, path: &str) -> Result<(), image::ImageError> {
    let mut img: RgbImage = ImageBuffer::new(grid.width as u32, grid.height as u32);

    for (x, z, &h) in grid.iter() {
        img.put_pixel(x as u32, z as u32, Rgb(spectral_colormap(h.clamp(0.0, 1.0))));
    }

    img.save(path)
}

/// Export the deformation relative to a baseline: raised cells warm,
/// lowered cells blue, scaled by the largest deviation present.
pub fn export_delta(
    live: &Grid<f32>,
    baseline: &Grid<f32>,
    path: &str,
) -> Result<(), image::ImageError> {
    let mut max_delta = 0.0f32;
    for (x, z, &h) in live.iter() {
        max_delta = max_delta.max((h - baseline.get(x, z)).abs());
    }
    let scale = 1.0 / max_delta.max(1e-6);

    let mut img: RgbImage = ImageBuffer::new(live.width as u32, live.height as u32);
    for (x, z, &h) in live.iter() {
        let delta = (h - baseline.get(x, z)) * scale;
        let color = if delta >= 0.0 {
            let t = delta.min(1.0);
            [(30.0 + 225.0 * t) as u8, (30.0 + 110.0 * t) as u8, 30u8]
        } else {
            let t = (-delta).min(1.0);
            [30u8, (30.0 + 80.0 * t) as u8, (30.0 + 225.0 * t) as u8]
        };
        img.put_pixel(x as u32, z as u32, Rgb(color));
    }

    img.save(path)
}

/// Spectral colormap (matplotlib style): dark blue -> cyan -> green ->
/// yellow -> orange -> red.
pub fn spectral_colormap(t: f32) -> [u8; 3] {
    let colors: [[f32; 3]; 11] = [
        [0.37, 0.31, 0.64],
        [0.20, 0.53, 0.74],
        [0.40, 0.76, 0.65],
        [0.67, 0.87, 0.64],
        [0.90, 0.96, 0.60],
        [1.00, 1.00, 0.75],
        [1.00, 0.88, 0.55],
        [0.99, 0.68, 0.38],
        [0.96, 0.43, 0.26],
        [0.84, 0.24, 0.31],
        [0.62, 0.00, 0.26],
    ];

    let t_scaled = t * 10.0;
    let idx = (t_scaled as usize).min(9);
    let frac = t_scaled - idx as f32;

    let c1 = colors[idx];
    let c2 = colors[idx + 1];

    [
        ((c1[0] + (c2[0] - c1[0]) * frac) * 255.0) as u8,
        ((c1[1] + (c2[1] - c1[1]) * frac) * 255.0) as u8,
        ((c1[2] + (c2[2] - c1[2]) * frac) * 255.0) as u8,
    ]
}
