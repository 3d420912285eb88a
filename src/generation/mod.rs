use crate::ElevationGrid;

use ndarray::prelude::*;
use noise::{NoiseFn, Perlin};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseSettings {
    pub scale: f32,
    pub octaves: u32,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            scale: 5e-3,
            octaves: 8,
        }
    }
}

/// Layered Perlin noise quantized to an 8-bit, single channel elevation grid,
/// for when there is no height map image to load.
///
/// Panics if either dimension is zero.
pub fn perlin_terrain(
    (width, height): (usize, usize),
    seed: u32,
    noise_settings: NoiseSettings,
) -> ElevationGrid {
    assert!(width > 0 && height > 0, "Terrain must not be empty");

    let octaves = noise_settings.octaves;
    let scale_start = noise_settings.scale;

    let perlin = Perlin::new(seed);

    let mut data: Array2<f32> = Array::zeros((height, width));

    for row in 0..height {
        for col in 0..width {
            let mut scale = 1.;

            for i in 0..octaves {
                data[[row, col]] += scale
                    * perlin.get([
                        (i as f32 * 1000. + scale_start / scale * col as f32) as f64,
                        (scale_start / scale * row as f32) as f64,
                    ]) as f32;
                scale /= 2.;
            }
        }
    }

    // Sum of every octave's amplitude
    let (max_magnitude, _) = (0..octaves).fold((0f32, 1f32), |(max_magnitude, scale), _| {
        (max_magnitude + scale, scale / 2.0)
    });

    // -max_magnitude..max_magnitude to 0..=255
    let bytes = data
        .iter()
        .map(|v| (255. * ((*v / max_magnitude + 1.) / 2.).clamp(0., 1.)) as u8)
        .collect();

    ElevationGrid::new(width, height, 1, bytes)
        .unwrap_or_else(|err| panic!("generated {width}x{height} terrain is invalid: {err}"))
}
