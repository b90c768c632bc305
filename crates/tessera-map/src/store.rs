use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use tessera_geom::{Affine3, Basis};
use tessera_tiles::TileId;

use super::coord::{CellCoord, CellRegion, ChunkCoord};
use super::dirty::DirtyTracker;
use super::layout::GridLayout;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    #[error("orientation index {0} is out of range 0..24")]
    OrientationOutOfRange(u8),
}

/// Tile orientation: an index into the 24 cube rotations, or a free basis
/// for non-orthogonal placements.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Orientation {
    Index(u8),
    Free(Basis),
}

impl Default for Orientation {
    fn default() -> Self {
        Orientation::Index(0)
    }
}

impl Orientation {
    pub const IDENTITY: Orientation = Orientation::Index(0);

    pub fn basis(&self) -> Basis {
        match self {
            Orientation::Index(i) => Basis::orthogonal(*i).unwrap_or(Basis::IDENTITY),
            Orientation::Free(b) => *b,
        }
    }

    fn validate(&self) -> Result<(), MapError> {
        match self {
            Orientation::Index(i) if *i >= Basis::ORTHO_COUNT => {
                Err(MapError::OrientationOutOfRange(*i))
            }
            _ => Ok(()),
        }
    }
}

/// One placed tile instance, keyed by its cell in the store.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedTile {
    pub tile: TileId,
    pub orientation: Orientation,
    pub transform_override: Option<Affine3>,
}

impl PlacedTile {
    pub fn new(tile: TileId) -> Self {
        Self {
            tile,
            orientation: Orientation::IDENTITY,
            transform_override: None,
        }
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_override(mut self, transform: Affine3) -> Self {
        self.transform_override = Some(transform);
        self
    }
}

/// One entry of a bulk edit.
#[derive(Clone, Debug)]
pub enum EditOp {
    Place { cell: CellCoord, placed: PlacedTile },
    Erase { cell: CellCoord },
}

#[derive(Default, Debug, Clone, Copy)]
pub struct CellStoreStats {
    pub chunk_entries: usize,
    pub placed_tiles: usize,
}

/// Sparse chunk-keyed cell storage; the single source of truth for a map.
///
/// Every mutation marks the touched chunk in two shared dirty sets, one
/// drained by the instance batcher and one by the collision aggregator, so
/// both consumers see every edit exactly once.
pub struct CellStore {
    layout: GridLayout,
    inner: HashMap<ChunkCoord, HashMap<CellCoord, PlacedTile>>,
    render_dirty: Arc<DirtyTracker>,
    collision_dirty: Arc<DirtyTracker>,
}

impl CellStore {
    pub fn new(layout: GridLayout) -> Self {
        Self {
            layout,
            inner: HashMap::new(),
            render_dirty: Arc::new(DirtyTracker::new()),
            collision_dirty: Arc::new(DirtyTracker::new()),
        }
    }

    #[inline]
    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Shared handle for the render-side consumer.
    pub fn render_dirty(&self) -> Arc<DirtyTracker> {
        Arc::clone(&self.render_dirty)
    }

    /// Shared handle for the collision-side consumer.
    pub fn collision_dirty(&self) -> Arc<DirtyTracker> {
        Arc::clone(&self.collision_dirty)
    }

    fn mark(&self, chunk: ChunkCoord) {
        self.render_dirty.mark(chunk);
        self.collision_dirty.mark(chunk);
    }

    /// Places a tile, overwriting any existing one at `cell`. Returns the
    /// previous tile so callers can build undo externally.
    pub fn place(
        &mut self,
        cell: CellCoord,
        placed: PlacedTile,
    ) -> Result<Option<PlacedTile>, MapError> {
        placed.orientation.validate()?;
        let chunk = self.layout.chunk_of(cell);
        let prev = self.inner.entry(chunk).or_default().insert(cell, placed);
        self.mark(chunk);
        Ok(prev)
    }

    /// Removes the tile at `cell`. No-op (and no dirty mark) when empty.
    pub fn erase(&mut self, cell: CellCoord) -> Option<PlacedTile> {
        let chunk = self.layout.chunk_of(cell);
        let prev = self.inner.get_mut(&chunk)?.remove(&cell);
        if prev.is_some() {
            self.mark(chunk);
        }
        prev
    }

    #[inline]
    pub fn get(&self, cell: CellCoord) -> Option<&PlacedTile> {
        self.inner.get(&self.layout.chunk_of(cell))?.get(&cell)
    }

    /// Lazy pass over placed tiles inside `region`. Cost is bounded by
    /// occupied chunks, not region volume; order is unspecified but stable
    /// while the store is unmutated.
    pub fn cells_in(
        &self,
        region: CellRegion,
    ) -> impl Iterator<Item = (CellCoord, &PlacedTile)> + '_ {
        let layout = self.layout;
        self.inner
            .iter()
            .filter(move |(chunk, _)| layout.chunk_region(**chunk).intersects(&region))
            .flat_map(move |(_, cells)| {
                cells
                    .iter()
                    .filter(move |(cell, _)| region.contains(**cell))
                    .map(|(cell, placed)| (*cell, placed))
            })
    }

    /// Applies a list of edits. Validates every op up front, so on error the
    /// store is untouched. Dirty marks coalesce to one per touched chunk
    /// regardless of how many ops land in it. Returns the previous value per
    /// op, aligned with the input.
    pub fn apply_batch(&mut self, ops: &[EditOp]) -> Result<Vec<Option<PlacedTile>>, MapError> {
        for op in ops {
            if let EditOp::Place { placed, .. } = op {
                placed.orientation.validate()?;
            }
        }
        let mut previous = Vec::with_capacity(ops.len());
        for op in ops {
            match op {
                EditOp::Place { cell, placed } => {
                    let chunk = self.layout.chunk_of(*cell);
                    let prev = self
                        .inner
                        .entry(chunk)
                        .or_default()
                        .insert(*cell, placed.clone());
                    self.mark(chunk);
                    previous.push(prev);
                }
                EditOp::Erase { cell } => previous.push(self.erase(*cell)),
            }
        }
        Ok(previous)
    }

    /// Empties the store, returning the chunks that held tiles.
    pub fn clear(&mut self) -> Vec<ChunkCoord> {
        let mut touched = Vec::new();
        for (chunk, cells) in self.inner.drain() {
            if !cells.is_empty() {
                self.render_dirty.mark(chunk);
                self.collision_dirty.mark(chunk);
                touched.push(chunk);
            }
        }
        touched
    }

    /// Chunks currently holding at least one tile.
    pub fn occupied_chunks(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.inner
            .iter()
            .filter(|(_, cells)| !cells.is_empty())
            .map(|(chunk, _)| *chunk)
    }

    pub fn len(&self) -> usize {
        self.inner.values().map(|m| m.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CellStoreStats {
        CellStoreStats {
            chunk_entries: self.inner.len(),
            placed_tiles: self.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CellStore {
        CellStore::new(GridLayout::with_chunk_size(16, 16, 16))
    }

    #[test]
    fn place_overwrites_and_returns_previous() {
        let mut s = store();
        let cell = CellCoord::new(3, -2, 7);
        assert_eq!(s.place(cell, PlacedTile::new(1)).unwrap(), None);
        let prev = s.place(cell, PlacedTile::new(2)).unwrap();
        assert_eq!(prev, Some(PlacedTile::new(1)));
        assert_eq!(s.get(cell).unwrap().tile, 2);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn erase_empty_cell_leaves_no_dirty_mark() {
        let mut s = store();
        let render = s.render_dirty();
        assert_eq!(s.erase(CellCoord::new(0, 0, 0)), None);
        assert!(render.is_empty());
    }

    #[test]
    fn edits_mark_both_dirty_sets() {
        let mut s = store();
        let render = s.render_dirty();
        let collision = s.collision_dirty();
        s.place(CellCoord::new(20, 0, 0), PlacedTile::new(1)).unwrap();
        let expected = ChunkCoord::new(1, 0, 0);
        assert_eq!(render.drain().into_iter().collect::<Vec<_>>(), vec![expected]);
        assert_eq!(
            collision.drain().into_iter().collect::<Vec<_>>(),
            vec![expected]
        );
        s.erase(CellCoord::new(20, 0, 0));
        assert!(!render.is_empty());
        assert!(!collision.is_empty());
    }

    #[test]
    fn place_rejects_out_of_range_orientation() {
        let mut s = store();
        let cell = CellCoord::new(0, 0, 0);
        let bad = PlacedTile::new(1).with_orientation(Orientation::Index(24));
        assert_eq!(s.place(cell, bad), Err(MapError::OrientationOutOfRange(24)));
        assert!(s.get(cell).is_none());
    }

    #[test]
    fn apply_batch_coalesces_dirty_marks() {
        let mut s = store();
        let render = s.render_dirty();
        render.drain();
        let ops: Vec<EditOp> = (0..10)
            .map(|i| EditOp::Place {
                cell: CellCoord::new(i, 0, 0),
                placed: PlacedTile::new(1),
            })
            .chain(std::iter::once(EditOp::Erase {
                cell: CellCoord::new(0, 0, 0),
            }))
            .collect();
        let previous = s.apply_batch(&ops).unwrap();
        assert_eq!(previous.len(), 11);
        assert_eq!(previous[10], Some(PlacedTile::new(1)));
        // Ten places and one erase, all in chunk (0,0,0): one mark.
        let drained = render.drain();
        assert_eq!(drained.len(), 1);
        assert!(drained.contains(&ChunkCoord::new(0, 0, 0)));
        assert_eq!(s.len(), 9);
    }

    #[test]
    fn apply_batch_invalid_op_leaves_store_untouched() {
        let mut s = store();
        let render = s.render_dirty();
        let ops = vec![
            EditOp::Place {
                cell: CellCoord::new(0, 0, 0),
                placed: PlacedTile::new(1),
            },
            EditOp::Place {
                cell: CellCoord::new(1, 0, 0),
                placed: PlacedTile::new(2).with_orientation(Orientation::Index(99)),
            },
        ];
        assert!(s.apply_batch(&ops).is_err());
        assert!(s.is_empty());
        assert!(render.is_empty());
    }

    #[test]
    fn cells_in_filters_by_region() {
        let mut s = store();
        s.place(CellCoord::new(0, 0, 0), PlacedTile::new(1)).unwrap();
        s.place(CellCoord::new(5, 0, 0), PlacedTile::new(2)).unwrap();
        s.place(CellCoord::new(40, 0, 0), PlacedTile::new(3)).unwrap();
        let region = CellRegion::new(CellCoord::new(0, 0, 0), CellCoord::new(8, 8, 8));
        let mut hits: Vec<TileId> = s.cells_in(region).map(|(_, p)| p.tile).collect();
        hits.sort();
        assert_eq!(hits, vec![1, 2]);
        assert_eq!(s.cells_in(CellRegion::ALL).count(), 3);
    }

    #[test]
    fn clear_dirties_every_occupied_chunk() {
        let mut s = store();
        let render = s.render_dirty();
        s.place(CellCoord::new(0, 0, 0), PlacedTile::new(1)).unwrap();
        s.place(CellCoord::new(100, 0, 0), PlacedTile::new(1)).unwrap();
        render.drain();
        let touched = s.clear();
        assert_eq!(touched.len(), 2);
        assert!(s.is_empty());
        assert_eq!(render.drain().len(), 2);
    }
}
