use std::error::Error;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tessera_geom::{Affine3, Basis, Vec3};

use super::catalog::TileCatalog;
use super::types::{MaterialRef, MeshRef, ShapeRef, TileDefinition, TileId};

/// Serialized affine transform: optional basis rows and origin, both
/// defaulting to identity so simple tiles stay terse on disk.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TransformDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basis: Option<[[f32; 3]; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<[f32; 3]>,
}

impl TransformDef {
    pub fn to_affine(&self) -> Affine3 {
        let basis = self.basis.map(Basis::from_rows).unwrap_or(Basis::IDENTITY);
        let origin = self
            .origin
            .map(|o| Vec3::new(o[0], o[1], o[2]))
            .unwrap_or(Vec3::ZERO);
        Affine3::new(basis, origin)
    }

    pub fn from_affine(t: &Affine3) -> Self {
        let basis = (t.basis != Basis::IDENTITY).then_some(t.basis.rows);
        let origin = (t.origin != Vec3::ZERO).then_some([t.origin.x, t.origin.y, t.origin.z]);
        Self { basis, origin }
    }

    pub fn is_identity(&self) -> bool {
        self.basis.is_none() && self.origin.is_none()
    }
}

#[derive(Serialize, Deserialize)]
pub struct TileSetConfig {
    #[serde(default)]
    pub tiles: Vec<TileEntry>,
}

#[derive(Serialize, Deserialize)]
pub struct TileEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TileId>,
    pub mesh: String,
    #[serde(default, skip_serializing_if = "TransformDef::is_identity")]
    pub transform: TransformDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
}

impl TileEntry {
    pub fn to_definition(&self) -> TileDefinition {
        TileDefinition {
            mesh: MeshRef::new(self.mesh.clone()),
            transform: self.transform.to_affine(),
            collision: self.collision.clone().map(ShapeRef),
            material: self.material.clone().map(MaterialRef),
        }
    }
}

impl TileCatalog {
    pub fn from_config(cfg: TileSetConfig) -> Result<Self, Box<dyn Error>> {
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
        Ok(catalog)
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: TileSetConfig = toml::from_str(toml_str)?;
        Self::from_config(cfg)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }
}
