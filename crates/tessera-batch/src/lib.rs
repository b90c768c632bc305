//! Per-chunk rebuild passes: instance batching for the renderer and
//! collision aggregation for the physics host.
#![forbid(unsafe_code)]

pub mod collision;
pub mod instance;

pub use collision::{ChunkBody, CollisionAggregator};
pub use instance::{ChunkBatches, InstanceBatcher};

use tessera_geom::Affine3;
use tessera_map::{CellCoord, CellStore, ChunkCoord, GridLayout, PlacedTile};
use tessera_tiles::{TileDefinition, TileId};

/// A placed tile whose definition id did not resolve during a rebuild. The
/// tile is skipped, never a hard failure; one bad reference must not take a
/// whole chunk down with it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RebuildWarning {
    pub chunk: ChunkCoord,
    pub cell: CellCoord,
    pub tile: TileId,
}

/// Resolved world transform of one placed tile:
/// map transform, then cell translation, then the definition's local
/// transform, then orientation, then the per-instance override.
pub(crate) fn world_transform(
    layout: &GridLayout,
    map_transform: &Affine3,
    cell: CellCoord,
    placed: &PlacedTile,
    def: &TileDefinition,
) -> Affine3 {
    let cell_t = Affine3::from_translation(layout.cell_origin(cell));
    let orient = Affine3::from_basis(placed.orientation.basis());
    let over = placed.transform_override.unwrap_or(Affine3::IDENTITY);
    *map_transform * cell_t * def.transform * orient * over
}

/// Placed tiles of one chunk in a deterministic order, so repeated rebuilds
/// of the same state produce identical batches.
pub(crate) fn chunk_cells<'a>(
    store: &'a CellStore,
    chunk: ChunkCoord,
) -> Vec<(CellCoord, &'a PlacedTile)> {
    let region = store.layout().chunk_region(chunk);
    let mut cells: Vec<_> = store.cells_in(region).collect();
    cells.sort_by_key(|(cell, _)| *cell);
    cells
}
