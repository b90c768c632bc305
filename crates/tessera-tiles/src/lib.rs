//! Tile definitions, catalogs, and catalog collections.
#![forbid(unsafe_code)]

pub mod catalog;
pub mod config;
pub mod types;

pub use catalog::{CatalogError, TileCatalog, TileCollection};
pub use types::{MaterialRef, MeshRef, ShapeRef, TileDefinition, TileId};
