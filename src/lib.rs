//! tessera: a 3D tile-placement grid with dirty-chunk instance rebuilds.
//!
//! Edits land in a sparse [`CellStore`], mark their chunk dirty, and the
//! next [`TileMap::sync`] rebuilds only those chunks into per-definition
//! instance batches (for the host renderer) and per-chunk composite
//! collision bodies (for the host physics system).
#![forbid(unsafe_code)]

use log::debug;

pub use tessera_batch::{
    ChunkBatches, ChunkBody, CollisionAggregator, InstanceBatcher, RebuildWarning,
};
pub use tessera_geom::{Affine3, Basis, Vec3};
pub use tessera_io as io;
pub use tessera_map::{
    CellCoord, CellRegion, CellStore, CellStoreStats, ChunkCoord, DirtyTracker, EditOp, GridLayout,
    MapError, Orientation, PlacedTile,
};
pub use tessera_tiles::{
    CatalogError, MaterialRef, MeshRef, ShapeRef, TileCatalog, TileCollection, TileDefinition,
    TileId,
};

/// Outcome of one [`TileMap::sync`] pass.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Chunks whose batches were rebuilt.
    pub rebuilt: usize,
    /// Placed tiles skipped because their definition id did not resolve.
    pub warnings: Vec<RebuildWarning>,
}

/// A tile map: cell storage, tile collection, world transform, and the two
/// rebuild passes, wired together.
///
/// Edit and query methods mirror the store's; `sync` is the once-per-frame
/// point where dirty chunks become fresh batches. `sync` takes `&mut self`,
/// so overlapping syncs cannot be expressed.
pub struct TileMap {
    store: CellStore,
    batcher: InstanceBatcher,
    collision: CollisionAggregator,
    tiles: TileCollection,
    transform: Affine3,
}

impl TileMap {
    pub fn new(layout: GridLayout, tiles: TileCollection) -> Self {
        let store = CellStore::new(layout);
        let batcher = InstanceBatcher::new(store.render_dirty());
        let collision = CollisionAggregator::new(store.collision_dirty());
        Self {
            store,
            batcher,
            collision,
            tiles,
            transform: Affine3::IDENTITY,
        }
    }

    #[inline]
    pub fn layout(&self) -> &GridLayout {
        self.store.layout()
    }

    #[inline]
    pub fn store(&self) -> &CellStore {
        &self.store
    }

    #[inline]
    pub fn tiles(&self) -> &TileCollection {
        &self.tiles
    }

    /// Swaps the tile collection and re-dirties every occupied chunk, since
    /// any resolved batch may now be stale.
    pub fn set_tiles(&mut self, tiles: TileCollection) {
        self.tiles = tiles;
        self.dirty_occupied();
    }

    #[inline]
    pub fn transform(&self) -> &Affine3 {
        &self.transform
    }

    /// Sets the map's world transform (supplied by the host scene graph).
    /// All occupied chunks are re-dirtied; their batches bake the transform
    /// in.
    pub fn set_transform(&mut self, transform: Affine3) {
        if self.transform != transform {
            self.transform = transform;
            self.dirty_occupied();
        }
    }

    fn dirty_occupied(&self) {
        let render = self.store.render_dirty();
        let collision = self.store.collision_dirty();
        for chunk in self.store.occupied_chunks() {
            render.mark(chunk);
            collision.mark(chunk);
        }
    }

    // --- edits ---

    pub fn place(
        &mut self,
        cell: CellCoord,
        placed: PlacedTile,
    ) -> Result<Option<PlacedTile>, MapError> {
        self.store.place(cell, placed)
    }

    pub fn erase(&mut self, cell: CellCoord) -> Option<PlacedTile> {
        self.store.erase(cell)
    }

    pub fn apply_batch(&mut self, ops: &[EditOp]) -> Result<Vec<Option<PlacedTile>>, MapError> {
        self.store.apply_batch(ops)
    }

    /// Removes every placed tile.
    pub fn clear(&mut self) {
        let touched = self.store.clear();
        debug!("cleared map, {} chunks touched", touched.len());
    }

    // --- queries ---

    pub fn get(&self, cell: CellCoord) -> Option<&PlacedTile> {
        self.store.get(cell)
    }

    pub fn cells_in(
        &self,
        region: CellRegion,
    ) -> impl Iterator<Item = (CellCoord, &PlacedTile)> + '_ {
        self.store.cells_in(region)
    }

    pub fn stats(&self) -> CellStoreStats {
        self.store.stats()
    }

    // --- rebuild ---

    /// Rebuilds render batches and collision bodies for every chunk dirtied
    /// since the last call. Cost is bounded by the cells in those chunks.
    pub fn sync(&mut self) -> SyncReport {
        let rebuilt = self.batcher.sync(&self.store, &self.tiles, &self.transform);
        self.collision.sync(&self.store, &self.tiles, &self.transform);
        let warnings = self.batcher.take_warnings();
        if rebuilt > 0 {
            debug!(
                "sync rebuilt {rebuilt} chunk(s), {} warning(s)",
                warnings.len()
            );
        }
        SyncReport { rebuilt, warnings }
    }

    /// Per-definition instance transforms of a chunk, as of the last `sync`.
    #[inline]
    pub fn batches(&self, chunk: ChunkCoord) -> Option<&ChunkBatches> {
        self.batcher.get_batches(chunk)
    }

    /// Composite collision body of a chunk, as of the last `sync`.
    #[inline]
    pub fn collision_body(&self, chunk: ChunkCoord) -> Option<&ChunkBody> {
        self.collision.body(chunk)
    }
}
