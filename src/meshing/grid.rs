use bevy::prelude::Vec3;

use super::{HeightScale, TerrainMesh, TriangleStrips};
use crate::ElevationGrid;

/// One vertex per grid cell, row-major, so vertex `row * width + col`
/// belongs to cell `(row, col)`.
pub fn build_vertices(grid: &ElevationGrid, scale: HeightScale) -> Vec<Vec3> {
    let (width, height) = grid.dim();
    let mut vertices = Vec::with_capacity(width * height);

    for row in 0..height {
        for col in 0..width {
            vertices.push(Vec3 {
                x: col as f32 - width as f32 / 2.,
                y: scale.apply(grid.sample(row, col)),
                z: row as f32 - height as f32 / 2.,
            });
        }
    }

    vertices
}

/// Triangle-strip indices for a `width` x `height` vertex grid: one strip per
/// pair of adjacent rows, each alternating between the upper and lower row
/// from left to right.
///
/// Panics if the grid has more vertices than a `u32` can index.
pub fn build_indices(width: usize, height: usize) -> TriangleStrips {
    assert!(
        (width as u64) * (height as u64) <= u32::MAX as u64 + 1,
        "{width}x{height} grid does not fit u32 indices"
    );

    let strip_count = height.saturating_sub(1);
    let verts_per_strip = 2 * width;

    let mut indices = Vec::with_capacity(strip_count * verts_per_strip);
    let idx = |row: usize, col: usize| -> u32 { (col + width * row) as u32 };

    for row in 0..strip_count {
        for col in 0..width {
            indices.extend([idx(row, col), idx(row + 1, col)]);
        }
    }

    TriangleStrips {
        indices,
        strip_count,
        verts_per_strip,
    }
}

pub fn heightmap_to_strip_mesh(grid: &ElevationGrid, scale: HeightScale) -> TerrainMesh {
    let (width, height) = grid.dim();

    TerrainMesh {
        vertices: build_vertices(grid, scale),
        strips: build_indices(width, height),
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(width: usize, height: usize, bytes: Vec<u8>) -> ElevationGrid {
        ElevationGrid::new(width, height, 1, bytes).unwrap()
    }

    fn assert_close(a: Vec3, b: Vec3) {
        assert!((a - b).abs().max_element() < 1e-3, "{a} != {b}");
    }

    #[test]
    fn vertex_positions_are_centered() {
        for (width, height) in [(1, 1), (1, 4), (3, 2), (4, 5), (7, 3)] {
            let vertices = build_vertices(
                &grid(width, height, vec![0; width * height]),
                HeightScale::default(),
            );

            assert_eq!(vertices.len(), width * height);
            for (k, v) in vertices.iter().enumerate() {
                assert_eq!(v.x, (k % width) as f32 - width as f32 / 2.);
                assert_eq!(v.z, (k / width) as f32 - height as f32 / 2.);
            }
        }
    }

    #[test]
    fn elevation_is_scaled_then_shifted() {
        let scale = HeightScale {
            y_scale: 0.25,
            y_shift: 16.,
        };
        let samples = vec![0, 1, 64, 128, 200, 255];
        let vertices = build_vertices(&grid(3, 2, samples.clone()), scale);

        for (v, s) in vertices.iter().zip(samples) {
            assert!((v.y - (s as f32 * 0.25 - 16.)).abs() < 1e-5);
        }
    }

    #[test]
    fn three_by_three_strips() {
        let strips = build_indices(3, 3);

        assert_eq!(strips.strip_count, 2);
        assert_eq!(strips.verts_per_strip, 6);
        assert_eq!(strips.indices, vec![0, 3, 1, 4, 2, 5, 3, 6, 4, 7, 5, 8]);
        assert_eq!(strips.strip(0), Some(&[0, 3, 1, 4, 2, 5][..]));
        assert_eq!(strips.strip(1), Some(&[3, 6, 4, 7, 5, 8][..]));
    }

    #[test]
    fn index_count_and_range() {
        for (width, height) in [(1, 2), (2, 2), (5, 3), (3, 8), (16, 16)] {
            let strips = build_indices(width, height);

            assert_eq!(strips.indices.len(), (height - 1) * width * 2);
            assert_eq!(strips.strip_count, height - 1);
            assert_eq!(strips.verts_per_strip, 2 * width);
            assert!(strips
                .indices
                .iter()
                .all(|&i| (i as usize) < width * height));
        }
    }

    #[test]
    fn single_row_has_no_strips() {
        let strips = build_indices(5, 1);

        assert!(strips.indices.is_empty());
        assert_eq!(strips.strip_count, 0);
        assert_eq!(strips.strips().count(), 0);
    }

    #[test]
    fn empty_grid_has_no_strips() {
        assert!(build_indices(0, 0).indices.is_empty());
        assert!(build_indices(0, 3).indices.is_empty());
    }

    #[test]
    #[should_panic(expected = "does not fit u32 indices")]
    fn oversized_grid_panics() {
        build_indices(1 << 17, 1 << 16);
    }

    #[test]
    fn builds_are_idempotent() {
        let g = grid(4, 3, (0..12).map(|v| v * 20).collect());

        let a = heightmap_to_strip_mesh(&g, HeightScale::default());
        let b = heightmap_to_strip_mesh(&g, HeightScale::default());

        assert_eq!(a.strips.indices, b.strips.indices);
        assert!(a
            .vertices
            .iter()
            .zip(&b.vertices)
            .all(|(a, b)| a.to_array().map(f32::to_bits) == b.to_array().map(f32::to_bits)));
    }

    #[test]
    fn two_by_two_end_to_end() {
        let scale = HeightScale {
            y_scale: 1. / 255.,
            y_shift: 0.,
        };
        let mesh = heightmap_to_strip_mesh(&grid(2, 2, vec![0, 255, 128, 64]), scale);

        let expected = [
            Vec3::new(-1., 0., -1.),
            Vec3::new(0., 1., -1.),
            Vec3::new(-1., 0.502, 0.),
            Vec3::new(0., 0.251, 0.),
        ];
        assert_eq!(mesh.vertices.len(), 4);
        for (v, e) in mesh.vertices.iter().zip(expected) {
            assert_close(*v, e);
        }

        assert_eq!(mesh.strips.indices, vec![0, 2, 1, 3]);
        assert_eq!(mesh.strips.strip_count, 1);
        assert_eq!(mesh.strips.verts_per_strip, 4);
    }
}
