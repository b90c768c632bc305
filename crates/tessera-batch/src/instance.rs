use std::sync::Arc;

use hashbrown::HashMap;
use log::warn;

use tessera_geom::Affine3;
use tessera_map::{CellStore, ChunkCoord, DirtyTracker};
use tessera_tiles::{TileCollection, TileId};

use super::{RebuildWarning, chunk_cells, world_transform};

/// Instance transforms of one chunk, grouped by definition id. Consumed by
/// the host renderer as one instanced draw per (chunk, id).
#[derive(Default, Clone, Debug)]
pub struct ChunkBatches {
    batches: HashMap<TileId, Vec<Affine3>>,
}

impl ChunkBatches {
    #[inline]
    pub fn get(&self, tile: TileId) -> Option<&[Affine3]> {
        self.batches.get(&tile).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TileId, &[Affine3])> + '_ {
        self.batches.iter().map(|(id, t)| (*id, t.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Total instances across all definitions.
    pub fn instance_count(&self) -> usize {
        self.batches.values().map(Vec::len).sum()
    }
}

/// Lazily rebuilds per-chunk instance batches from dirty chunks. Batch state
/// is always a pure function of (store, collection, map transform); a chunk
/// is rebuilt from scratch whenever its tracker entry says it changed.
pub struct InstanceBatcher {
    dirty: Arc<DirtyTracker>,
    chunks: HashMap<ChunkCoord, ChunkBatches>,
    warnings: Vec<RebuildWarning>,
}

impl InstanceBatcher {
    pub fn new(dirty: Arc<DirtyTracker>) -> Self {
        Self {
            dirty,
            chunks: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    /// Drains the dirty set and rebuilds each drained chunk. Returns the
    /// number of chunks rebuilt. Cost is proportional to the cells in dirty
    /// chunks, never to the whole map.
    pub fn sync(
        &mut self,
        store: &CellStore,
        tiles: &TileCollection,
        map_transform: &Affine3,
    ) -> usize {
        let dirty = self.dirty.drain();
        for &chunk in &dirty {
            let batches = self.rebuild_chunk(store, tiles, map_transform, chunk);
            // An emptied chunk keeps its entry: chunk identity stays stable
            // across transient emptiness.
            self.chunks.insert(chunk, batches);
        }
        dirty.len()
    }

    fn rebuild_chunk(
        &mut self,
        store: &CellStore,
        tiles: &TileCollection,
        map_transform: &Affine3,
        chunk: ChunkCoord,
    ) -> ChunkBatches {
        let mut out = ChunkBatches::default();
        for (cell, placed) in chunk_cells(store, chunk) {
            let Some(def) = tiles.get(placed.tile) else {
                warn!(
                    "tile {} at ({}, {}, {}) has no definition in the collection; skipping",
                    placed.tile, cell.x, cell.y, cell.z
                );
                self.warnings.push(RebuildWarning {
                    chunk,
                    cell,
                    tile: placed.tile,
                });
                continue;
            };
            let t = world_transform(store.layout(), map_transform, cell, placed, def);
            out.batches.entry(placed.tile).or_default().push(t);
        }
        out
    }

    /// Batches of a chunk as of the last `sync`. `None` for chunks never
    /// rebuilt; `Some` with empty batches for chunks rebuilt down to zero
    /// tiles.
    #[inline]
    pub fn get_batches(&self, chunk: ChunkCoord) -> Option<&ChunkBatches> {
        self.chunks.get(&chunk)
    }

    /// Warnings accumulated since the last call. One warning is recorded per
    /// unresolved tile per rebuild, so a cell whose chunk is rebuilt again
    /// warns again; the count is not a distinct-tile count.
    pub fn take_warnings(&mut self) -> Vec<RebuildWarning> {
        std::mem::take(&mut self.warnings)
    }
}
