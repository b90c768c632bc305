use tessera_geom::Vec3;

use super::coord::{CellCoord, CellRegion, ChunkCoord};

/// Grid geometry shared by the store and the rebuild passes: chunk extent in
/// cells, cell extent in world units, and per-axis centering.
#[derive(Clone, Copy, Debug)]
pub struct GridLayout {
    pub chunk_size: (i32, i32, i32),
    pub cell_size: Vec3,
    pub cell_centered: [bool; 3],
}

impl Default for GridLayout {
    fn default() -> Self {
        Self::with_chunk_size(16, 16, 16)
    }
}

impl GridLayout {
    pub fn with_chunk_size(sx: i32, sy: i32, sz: i32) -> Self {
        assert!(
            sx > 0 && sy > 0 && sz > 0,
            "chunk size must be positive, got ({sx}, {sy}, {sz})"
        );
        Self {
            chunk_size: (sx, sy, sz),
            cell_size: Vec3::ONE,
            cell_centered: [true; 3],
        }
    }

    #[inline]
    pub fn chunk_of(&self, cell: CellCoord) -> ChunkCoord {
        ChunkCoord::new(
            cell.x.div_euclid(self.chunk_size.0),
            cell.y.div_euclid(self.chunk_size.1),
            cell.z.div_euclid(self.chunk_size.2),
        )
    }

    /// World-space origin of a cell: cell size times the coordinate, shifted
    /// half a cell on each centered axis.
    pub fn cell_origin(&self, cell: CellCoord) -> Vec3 {
        let half = |centered: bool| if centered { 0.5 } else { 0.0 };
        Vec3::new(
            self.cell_size.x * (cell.x as f32 + half(self.cell_centered[0])),
            self.cell_size.y * (cell.y as f32 + half(self.cell_centered[1])),
            self.cell_size.z * (cell.z as f32 + half(self.cell_centered[2])),
        )
    }

    /// Inclusive cell bounds of a chunk. The outermost chunk on an axis may
    /// extend past `i32::MAX`; its bound saturates to the addressable grid.
    pub fn chunk_region(&self, chunk: ChunkCoord) -> CellRegion {
        let min = CellCoord::new(
            chunk.cx * self.chunk_size.0,
            chunk.cy * self.chunk_size.1,
            chunk.cz * self.chunk_size.2,
        );
        let max = CellCoord::new(
            min.x.saturating_add(self.chunk_size.0 - 1),
            min.y.saturating_add(self.chunk_size.1 - 1),
            min.z.saturating_add(self.chunk_size.2 - 1),
        );
        CellRegion { min, max }
    }
}
