//! Sparse cell storage and chunk dirty tracking for 3D tile maps.
#![forbid(unsafe_code)]

pub mod coord;
pub mod dirty;
pub mod layout;
pub mod store;

pub use coord::{CellCoord, CellRegion, ChunkCoord};
pub use dirty::DirtyTracker;
pub use layout::GridLayout;
pub use store::{CellStore, CellStoreStats, EditOp, MapError, Orientation, PlacedTile};
