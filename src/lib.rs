pub mod generation;
pub mod heightmap;
pub mod meshing;

pub use heightmap::{ElevationGrid, GridError, LoadError};
pub use meshing::{HeightScale, TerrainMesh, TriangleStrips};
