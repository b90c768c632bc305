//! Persisted layout: TOML save/load for tile catalogs and maps.
//!
//! Asset handles (mesh, shape, material) are round-tripped verbatim; their
//! contents are the host asset system's business, never interpreted here.
#![forbid(unsafe_code)]

use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tessera_geom::{Basis, Vec3};
use tessera_map::{CellCoord, CellRegion, CellStore, GridLayout, MapError, Orientation, PlacedTile};
use tessera_tiles::config::{TileEntry, TileSetConfig, TransformDef};
use tessera_tiles::{CatalogError, TileCatalog, TileId};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("encode error: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("map error: {0}")]
    Map(#[from] MapError),
    #[error("chunk size {0:?} must be positive on every axis")]
    InvalidChunkSize([i32; 3]),
}

/// Serialized orientation: an index into the 24 cube rotations, or basis
/// rows for a free rotation.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrientationDef {
    Index(u8),
    Basis([[f32; 3]; 3]),
}

impl OrientationDef {
    fn to_orientation(&self) -> Orientation {
        match self {
            OrientationDef::Index(i) => Orientation::Index(*i),
            OrientationDef::Basis(rows) => Orientation::Free(Basis::from_rows(*rows)),
        }
    }

    fn from_orientation(o: &Orientation) -> Option<Self> {
        match o {
            // Identity is the default; keep the document terse.
            Orientation::Index(0) => None,
            Orientation::Index(i) => Some(OrientationDef::Index(*i)),
            Orientation::Free(b) => Some(OrientationDef::Basis(b.rows)),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct CellEntry {
    pub cell: [i32; 3],
    pub tile: TileId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<OrientationDef>,
    // Keyed on presence, not on the value: an explicit identity override is
    // a different placement than no override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform_override: Option<TransformDef>,
}

#[derive(Serialize, Deserialize)]
pub struct MapDoc {
    /// Opaque handles of the catalogs this map was authored against, in
    /// collection order. Resolved by the host, never interpreted here.
    #[serde(default)]
    pub catalogs: Vec<String>,
    pub chunk_size: [i32; 3],
    pub cell_size: [f32; 3],
    pub cell_centered: [bool; 3],
    #[serde(default)]
    pub cells: Vec<CellEntry>,
}

/// A map document pulled back into memory: the rebuilt store plus the
/// catalog handles it was saved with.
pub struct LoadedMap {
    pub store: CellStore,
    pub catalogs: Vec<String>,
}

// --- Catalog ---

pub fn save_catalog(catalog: &TileCatalog) -> Result<String, IoError> {
    let tiles = catalog
        .ids()
        .filter_map(|id| {
            let def = catalog.get(id)?;
            Some(TileEntry {
                id: Some(id),
                mesh: def.mesh.0.clone(),
                transform: TransformDef::from_affine(&def.transform),
                collision: def.collision.as_ref().map(|s| s.0.clone()),
                material: def.material.as_ref().map(|m| m.0.clone()),
            })
        })
        .collect();
    Ok(toml::to_string_pretty(&TileSetConfig { tiles })?)
}

pub fn load_catalog(toml_str: &str) -> Result<TileCatalog, IoError> {
    let cfg: TileSetConfig = toml::from_str(toml_str)?;
    let mut catalog = TileCatalog::new();
    for entry in &cfg.tiles {
        let def = entry.to_definition();
        match entry.id {
            Some(id) => catalog.insert(id, def)?,
            None => {
                catalog.add(def)?;
            }
        }
    }
    debug!("loaded catalog with {} tile definitions", catalog.len());
    Ok(catalog)
}

pub fn save_catalog_to_path(catalog: &TileCatalog, path: impl AsRef<Path>) -> Result<(), IoError> {
    Ok(fs::write(path, save_catalog(catalog)?)?)
}

pub fn load_catalog_from_path(path: impl AsRef<Path>) -> Result<TileCatalog, IoError> {
    load_catalog(&fs::read_to_string(path)?)
}

// --- Map ---

pub fn save_map(store: &CellStore, catalogs: &[String]) -> Result<String, IoError> {
    let layout = store.layout();
    let mut cells: Vec<(CellCoord, &PlacedTile)> = store.cells_in(CellRegion::ALL).collect();
    cells.sort_by_key(|(cell, _)| *cell);
    let doc = MapDoc {
        catalogs: catalogs.to_vec(),
        chunk_size: [
            layout.chunk_size.0,
            layout.chunk_size.1,
            layout.chunk_size.2,
        ],
        cell_size: [layout.cell_size.x, layout.cell_size.y, layout.cell_size.z],
        cell_centered: layout.cell_centered,
        cells: cells
            .into_iter()
            .map(|(cell, placed)| CellEntry {
                cell: [cell.x, cell.y, cell.z],
                tile: placed.tile,
                orientation: OrientationDef::from_orientation(&placed.orientation),
                transform_override: placed
                    .transform_override
                    .as_ref()
                    .map(TransformDef::from_affine),
            })
            .collect(),
    };
    Ok(toml::to_string_pretty(&doc)?)
}

pub fn load_map(toml_str: &str) -> Result<LoadedMap, IoError> {
    let doc: MapDoc = toml::from_str(toml_str)?;
    if doc.chunk_size.iter().any(|&s| s <= 0) {
        return Err(IoError::InvalidChunkSize(doc.chunk_size));
    }
    let mut layout =
        GridLayout::with_chunk_size(doc.chunk_size[0], doc.chunk_size[1], doc.chunk_size[2]);
    layout.cell_size = Vec3::new(doc.cell_size[0], doc.cell_size[1], doc.cell_size[2]);
    layout.cell_centered = doc.cell_centered;
    let mut store = CellStore::new(layout);
    for entry in &doc.cells {
        let orientation = entry
            .orientation
            .as_ref()
            .map(|o| o.to_orientation())
            .unwrap_or_default();
        let mut placed = PlacedTile::new(entry.tile).with_orientation(orientation);
        if let Some(t) = &entry.transform_override {
            placed = placed.with_override(t.to_affine());
        }
        store.place(
            CellCoord::new(entry.cell[0], entry.cell[1], entry.cell[2]),
            placed,
        )?;
    }
    debug!("loaded map with {} placed tiles", store.len());
    Ok(LoadedMap {
        store,
        catalogs: doc.catalogs,
    })
}

pub fn save_map_to_path(
    store: &CellStore,
    catalogs: &[String],
    path: impl AsRef<Path>,
) -> Result<(), IoError> {
    Ok(fs::write(path, save_map(store, catalogs)?)?)
}

pub fn load_map_from_path(path: impl AsRef<Path>) -> Result<LoadedMap, IoError> {
    load_map(&fs::read_to_string(path)?)
}
