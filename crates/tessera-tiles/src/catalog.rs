use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use super::types::{TileDefinition, TileId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("tile definition has no mesh handle")]
    InvalidDefinition,
    #[error("no tile definition with id {0}")]
    NotFound(TileId),
}

/// Ordered, id-indexed collection of tile definitions.
///
/// Removal is tombstone-style: a removed id simply stops resolving, and any
/// placed tile still referencing it is skipped (with a warning) at the next
/// rebuild. Nothing here tracks which maps reference which ids.
#[derive(Default, Clone, Debug)]
pub struct TileCatalog {
    tiles: HashMap<TileId, TileDefinition>,
    order: Vec<TileId>,
    next_id: TileId,
}

impl TileCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a definition under the next free id.
    pub fn add(&mut self, def: TileDefinition) -> Result<TileId, CatalogError> {
        validate(&def)?;
        let id = self.next_id;
        self.next_id += 1;
        self.tiles.insert(id, def);
        self.order.push(id);
        Ok(id)
    }

    /// Publishes a definition under an explicit id (deserialization path).
    /// Replaces silently if the id is already present; keeps `next_id` above
    /// every id ever inserted so `add` never collides.
    pub fn insert(&mut self, id: TileId, def: TileDefinition) -> Result<(), CatalogError> {
        validate(&def)?;
        if self.tiles.insert(id, def).is_none() {
            self.order.push(id);
        }
        self.next_id = self.next_id.max(id + 1);
        Ok(())
    }

    /// Replace-by-id. Returns the previous definition.
    pub fn replace(
        &mut self,
        id: TileId,
        def: TileDefinition,
    ) -> Result<TileDefinition, CatalogError> {
        validate(&def)?;
        match self.tiles.get_mut(&id) {
            Some(slot) => Ok(std::mem::replace(slot, def)),
            None => Err(CatalogError::NotFound(id)),
        }
    }

    /// Removes a definition. Returns it for undo support.
    pub fn remove(&mut self, id: TileId) -> Result<TileDefinition, CatalogError> {
        let def = self.tiles.remove(&id).ok_or(CatalogError::NotFound(id))?;
        self.order.retain(|&o| o != id);
        Ok(def)
    }

    #[inline]
    pub fn get(&self, id: TileId) -> Option<&TileDefinition> {
        self.tiles.get(&id)
    }

    /// Ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = TileId> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

fn validate(def: &TileDefinition) -> Result<(), CatalogError> {
    if def.mesh.0.is_empty() {
        return Err(CatalogError::InvalidDefinition);
    }
    Ok(())
}

/// Read-only ordered sequence of catalogs shared across maps. Lookups probe
/// members in order; the first catalog containing an id wins, so collection
/// order is override precedence.
#[derive(Default, Clone, Debug)]
pub struct TileCollection {
    catalogs: Vec<Arc<TileCatalog>>,
}

impl TileCollection {
    pub fn new(catalogs: Vec<Arc<TileCatalog>>) -> Self {
        Self { catalogs }
    }

    pub fn single(catalog: Arc<TileCatalog>) -> Self {
        Self {
            catalogs: vec![catalog],
        }
    }

    pub fn get(&self, id: TileId) -> Option<&TileDefinition> {
        self.catalogs.iter().find_map(|c| c.get(id))
    }

    pub fn catalogs(&self) -> &[Arc<TileCatalog>] {
        &self.catalogs
    }
}
