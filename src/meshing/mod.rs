mod grid;

pub use grid::{build_indices, build_vertices, heightmap_to_strip_mesh};

use bevy::{
    prelude::*,
    render::{mesh::Indices, render_resource::PrimitiveTopology},
};

/// Maps a raw 0..=255 sample to a world-space height: `sample * y_scale - y_shift`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeightScale {
    pub y_scale: f32,
    pub y_shift: f32,
}

impl Default for HeightScale {
    // Puts 0..=255 in -16..48
    fn default() -> Self {
        Self {
            y_scale: 64. / 256.,
            y_shift: 16.,
        }
    }
}

impl HeightScale {
    pub fn apply(&self, sample: u8) -> f32 {
        sample as f32 * self.y_scale - self.y_shift
    }
}

/// Index buffer made of `strip_count` triangle strips of `verts_per_strip`
/// indices each, stored back to back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TriangleStrips {
    pub indices: Vec<u32>,
    pub strip_count: usize,
    pub verts_per_strip: usize,
}

impl TriangleStrips {
    /// Element offset of the first index of `strip`.
    pub fn strip_offset(&self, strip: usize) -> usize {
        strip * self.verts_per_strip
    }

    /// Byte offset of the first index of `strip`, for APIs that address the
    /// index buffer in bytes.
    pub fn strip_byte_offset(&self, strip: usize) -> usize {
        self.strip_offset(strip) * std::mem::size_of::<u32>()
    }

    pub fn strip(&self, strip: usize) -> Option<&[u32]> {
        if strip >= self.strip_count {
            return None;
        }
        let start = self.strip_offset(strip);
        self.indices.get(start..start + self.verts_per_strip)
    }

    pub fn strips(&self) -> impl Iterator<Item = &[u32]> + '_ {
        (0..self.strip_count).filter_map(move |s| self.strip(s))
    }

    /// Expands every strip into the triangles a strip draw would rasterize.
    /// Odd triangles swap their first two corners so all faces keep the
    /// winding of the first one. Strips are never joined to each other.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.strips().flat_map(|strip| {
            strip.windows(3).enumerate().map(|(k, w)| {
                if k % 2 == 0 {
                    [w[0], w[1], w[2]]
                } else {
                    [w[1], w[0], w[2]]
                }
            })
        })
    }

    pub fn num_triangles(&self) -> usize {
        self.strip_count * self.verts_per_strip.saturating_sub(2)
    }
}

pub struct TerrainMesh {
    vertices: Vec<Vec3>,
    strips: TriangleStrips,
    width: usize,
    height: usize,
}

impl TerrainMesh {
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn strips(&self) -> &TriangleStrips {
        &self.strips
    }

    /// `(width, height)` of the grid the mesh was built from
    pub fn dim(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Lowest and highest vertex elevation.
    pub fn height_range(&self) -> Option<(f32, f32)> {
        self.vertices.iter().map(|v| v.y).fold(None, |range, y| match range {
            None => Some((y, y)),
            Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
        })
    }

    fn vertex(&self, row: usize, col: usize) -> Vec3 {
        self.vertices[col + row * self.width]
    }

    fn normal_at(&self, row: usize, col: usize) -> Vec3 {
        // Central differences inside, one-sided on the border
        let slope = |prev: Option<Vec3>, next: Option<Vec3>| match (prev, next) {
            (Some(p), Some(n)) => (n.y - p.y) / 2.,
            (None, Some(n)) => n.y - self.vertex(row, col).y,
            (Some(p), None) => self.vertex(row, col).y - p.y,
            (None, None) => 0.,
        };

        let dx = slope(
            col.checked_sub(1).map(|c| self.vertex(row, c)),
            (col + 1 < self.width).then(|| self.vertex(row, col + 1)),
        );
        let dz = slope(
            row.checked_sub(1).map(|r| self.vertex(r, col)),
            (row + 1 < self.height).then(|| self.vertex(row + 1, col)),
        );

        Vec3 {
            x: -dx,
            y: 1.,
            z: -dz,
        }
        .normalize()
    }

    /// Per-vertex normals, in vertex order. Only used for lighting; the
    /// mesh itself is position-only.
    pub fn normals(&self) -> Vec<Vec3> {
        let mut normals = Vec::with_capacity(self.vertices.len());

        for row in 0..self.height {
            for col in 0..self.width {
                normals.push(self.normal_at(row, col));
            }
        }

        normals
    }

    pub fn into_render_mesh(self) -> Mesh {
        let mut mesh = Mesh::new(PrimitiveTopology::TriangleList);

        let normals = self.normals();
        let triangles: Vec<u32> = self.strips.triangles().flatten().collect();

        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.vertices);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);

        mesh.set_indices(Some(Indices::U32(triangles)));

        mesh
    }
}
