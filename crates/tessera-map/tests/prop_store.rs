use std::collections::{HashMap, HashSet};

use proptest::prelude::*;
use tessera_map::{CellCoord, CellStore, ChunkCoord, EditOp, GridLayout, PlacedTile};

fn arb_cell() -> impl Strategy<Value = CellCoord> {
    (-24i32..24, -24i32..24, -24i32..24).prop_map(|(x, y, z)| CellCoord::new(x, y, z))
}

fn arb_op() -> impl Strategy<Value = EditOp> {
    prop_oneof![
        (arb_cell(), 0u32..8).prop_map(|(cell, tile)| EditOp::Place {
            cell,
            placed: PlacedTile::new(tile),
        }),
        arb_cell().prop_map(|cell| EditOp::Erase { cell }),
    ]
}

proptest! {
    // After any edit sequence, get(cell) equals the last non-erased
    // placement at that cell.
    #[test]
    fn get_reflects_last_write(ops in prop::collection::vec(arb_op(), 0..64)) {
        let mut store = CellStore::new(GridLayout::with_chunk_size(16, 16, 16));
        let mut model: HashMap<CellCoord, PlacedTile> = HashMap::new();
        for op in &ops {
            match op {
                EditOp::Place { cell, placed } => {
                    store.place(*cell, placed.clone()).unwrap();
                    model.insert(*cell, placed.clone());
                }
                EditOp::Erase { cell } => {
                    store.erase(*cell);
                    model.remove(cell);
                }
            }
        }
        prop_assert_eq!(store.len(), model.len());
        for (cell, expected) in &model {
            prop_assert_eq!(store.get(*cell), Some(expected));
        }
    }

    // apply_batch dirties each touched chunk exactly once, no matter how
    // many ops land in it.
    #[test]
    fn apply_batch_dirty_set_matches_touched_chunks(ops in prop::collection::vec(arb_op(), 0..64)) {
        let layout = GridLayout::with_chunk_size(16, 16, 16);
        let mut store = CellStore::new(layout);
        let render = store.render_dirty();
        let collision = store.collision_dirty();

        // Model which chunks an op sequence actually touches: places always
        // mark, erases only when they remove something.
        let mut occupied: HashSet<CellCoord> = HashSet::new();
        let mut expected: HashSet<ChunkCoord> = HashSet::new();
        for op in &ops {
            match op {
                EditOp::Place { cell, .. } => {
                    occupied.insert(*cell);
                    expected.insert(layout.chunk_of(*cell));
                }
                EditOp::Erase { cell } => {
                    if occupied.remove(cell) {
                        expected.insert(layout.chunk_of(*cell));
                    }
                }
            }
        }

        let previous = store.apply_batch(&ops).unwrap();
        prop_assert_eq!(previous.len(), ops.len());
        prop_assert_eq!(render.drain(), expected.clone());
        prop_assert_eq!(collision.drain(), expected);
    }

    // cells_in over the full grid agrees with per-cell lookups.
    #[test]
    fn cells_in_full_space_matches_len(ops in prop::collection::vec(arb_op(), 0..64)) {
        let mut store = CellStore::new(GridLayout::with_chunk_size(16, 16, 16));
        for op in &ops {
            match op {
                EditOp::Place { cell, placed } => {
                    store.place(*cell, placed.clone()).unwrap();
                }
                EditOp::Erase { cell } => {
                    store.erase(*cell);
                }
            }
        }
        let listed: Vec<_> = store
            .cells_in(tessera_map::CellRegion::ALL)
            .map(|(c, p)| (c, p.clone()))
            .collect();
        prop_assert_eq!(listed.len(), store.len());
        for (cell, placed) in listed {
            prop_assert_eq!(store.get(cell), Some(&placed));
        }
    }
}
