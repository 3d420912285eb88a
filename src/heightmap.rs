use std::path::{Path, PathBuf};

use bevy::log::debug;
use image::DynamicImage;
use ndarray::{s, Array3};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("height map has zero size ({width}x{height})")]
    ZeroDimension { width: usize, height: usize },
    #[error("height map has zero channels per pixel")]
    ZeroChannels,
    #[error("height map needs {expected} sample bytes but only {actual} were given")]
    TooShort { expected: usize, actual: usize },
    #[error("height map {width}x{height} has more cells than a u32 index can address")]
    TooLarge { width: usize, height: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to load height map {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("height map {} is malformed: {source}", .path.display())]
    Grid {
        path: PathBuf,
        #[source]
        source: GridError,
    },
}

/// Grayscale elevation samples decoded from an image, stored as
/// `(row, column, channel)`. Only channel 0 is ever read.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationGrid(Array3<u8>);

impl ElevationGrid {
    /// Wraps a row-major byte buffer of `width * height` pixels with
    /// `channels` bytes each. Bytes past the last pixel are ignored.
    pub fn new(
        width: usize,
        height: usize,
        channels: usize,
        mut bytes: Vec<u8>,
    ) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::ZeroDimension { width, height });
        }
        if channels == 0 {
            return Err(GridError::ZeroChannels);
        }

        let cells = width
            .checked_mul(height)
            .filter(|&cells| cells as u64 <= u32::MAX as u64 + 1)
            .ok_or(GridError::TooLarge { width, height })?;

        let expected = cells
            .checked_mul(channels)
            .ok_or(GridError::TooLarge { width, height })?;
        if bytes.len() < expected {
            return Err(GridError::TooShort {
                expected,
                actual: bytes.len(),
            });
        }
        bytes.truncate(expected);

        let samples = Array3::from_shape_vec((height, width, channels), bytes)
            .map_err(|_| GridError::TooShort {
                expected,
                actual: expected,
            })?;

        Ok(Self(samples))
    }

    /// Decodes an image file into a grid.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();

        let image = image::open(path).map_err(|source| LoadError::Image {
            path: path.to_owned(),
            source,
        })?;

        let grid = Self::from_image(image).map_err(|source| LoadError::Grid {
            path: path.to_owned(),
            source,
        })?;

        debug!(
            "decoded {} as {}x{} with {} channel(s)",
            path.display(),
            grid.width(),
            grid.height(),
            grid.channels()
        );

        Ok(grid)
    }

    /// 8-bit images keep their channel layout. Wider formats are narrowed to
    /// 8 bits per channel without mixing channels, so channel 0 is still the
    /// first channel of the file.
    pub fn from_image(image: DynamicImage) -> Result<Self, GridError> {
        let (width, height) = (image.width() as usize, image.height() as usize);

        let (channels, bytes) = match image {
            DynamicImage::ImageLuma8(buf) => (1, buf.into_raw()),
            DynamicImage::ImageLumaA8(buf) => (2, buf.into_raw()),
            DynamicImage::ImageRgb8(buf) => (3, buf.into_raw()),
            DynamicImage::ImageRgba8(buf) => (4, buf.into_raw()),
            other => match other.color().channel_count() {
                1 => (1, other.to_luma8().into_raw()),
                2 => (2, other.to_luma_alpha8().into_raw()),
                3 => (3, other.to_rgb8().into_raw()),
                _ => (4, other.to_rgba8().into_raw()),
            },
        };

        Self::new(width, height, channels, bytes)
    }

    pub fn width(&self) -> usize {
        self.0.dim().1
    }

    pub fn height(&self) -> usize {
        self.0.dim().0
    }

    pub fn channels(&self) -> usize {
        self.0.dim().2
    }

    /// `(width, height)`
    pub fn dim(&self) -> (usize, usize) {
        (self.width(), self.height())
    }

    /// Raw elevation at a cell. Panics if the cell is outside the grid.
    pub fn sample(&self, row: usize, col: usize) -> u8 {
        self.0[[row, col, 0]]
    }

    pub fn get(&self, row: usize, col: usize) -> Option<u8> {
        self.0.get([row, col, 0]).copied()
    }

    /// Iterates channel 0 in row-major order.
    pub fn samples(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.slice(s![.., .., 0]).into_iter().copied()
    }
}
