use std::sync::Arc;

use hashbrown::HashMap;
use log::debug;

use tessera_geom::Affine3;
use tessera_map::{CellStore, ChunkCoord, DirtyTracker};
use tessera_tiles::{ShapeRef, TileCollection};

use super::{chunk_cells, world_transform};

/// Aggregated collision body of one chunk: every constituent shape with its
/// world transform. The physics host treats the list as one composite body.
#[derive(Default, Clone, Debug)]
pub struct ChunkBody {
    pub shapes: Vec<(ShapeRef, Affine3)>,
}

impl ChunkBody {
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

/// Collision-side mirror of the instance batcher: same dirty-chunk-driven
/// rebuild, but only tiles whose definition carries a collision shape
/// contribute. Visual-only tiles are legal and contribute nothing.
pub struct CollisionAggregator {
    dirty: Arc<DirtyTracker>,
    chunks: HashMap<ChunkCoord, ChunkBody>,
}

impl CollisionAggregator {
    pub fn new(dirty: Arc<DirtyTracker>) -> Self {
        Self {
            dirty,
            chunks: HashMap::new(),
        }
    }

    /// Drains the dirty set and rebuilds each drained chunk's body. Returns
    /// the number of chunks rebuilt.
    pub fn sync(
        &mut self,
        store: &CellStore,
        tiles: &TileCollection,
        map_transform: &Affine3,
    ) -> usize {
        let dirty = self.dirty.drain();
        for &chunk in &dirty {
            let mut body = ChunkBody::default();
            for (cell, placed) in chunk_cells(store, chunk) {
                let Some(def) = tiles.get(placed.tile) else {
                    // The instance batcher already records a warning for
                    // this tile; don't double-report.
                    debug!("skipping unresolved tile {} in collision pass", placed.tile);
                    continue;
                };
                if let Some(shape) = &def.collision {
                    let t = world_transform(store.layout(), map_transform, cell, placed, def);
                    body.shapes.push((shape.clone(), t));
                }
            }
            self.chunks.insert(chunk, body);
        }
        dirty.len()
    }

    /// Composite body of a chunk as of the last `sync`.
    #[inline]
    pub fn body(&self, chunk: ChunkCoord) -> Option<&ChunkBody> {
        self.chunks.get(&chunk)
    }
}
