use serde::{Deserialize, Serialize};
use tessera_geom::Affine3;

pub type TileId = u32;

/// Opaque handle to a mesh asset; resolved by the host asset system.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeshRef(pub String);

/// Opaque handle to a collision shape asset.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeRef(pub String);

/// Opaque handle to a material asset.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialRef(pub String);

impl MeshRef {
    #[inline]
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }
}

impl ShapeRef {
    #[inline]
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }
}

impl MaterialRef {
    #[inline]
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }
}

/// One placeable tile variant. Immutable once published to a catalog; edits
/// go through `TileCatalog::replace`, never in-place mutation, so batches
/// built against an id stay valid until the next rebuild.
#[derive(Clone, Debug, PartialEq)]
pub struct TileDefinition {
    pub mesh: MeshRef,
    /// Mesh placement relative to the cell origin.
    pub transform: Affine3,
    pub collision: Option<ShapeRef>,
    pub material: Option<MaterialRef>,
}

impl TileDefinition {
    pub fn new(mesh: MeshRef) -> Self {
        Self {
            mesh,
            transform: Affine3::IDENTITY,
            collision: None,
            material: None,
        }
    }

    pub fn with_transform(mut self, transform: Affine3) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_collision(mut self, shape: ShapeRef) -> Self {
        self.collision = Some(shape);
        self
    }

    pub fn with_material(mut self, material: MaterialRef) -> Self {
        self.material = Some(material);
        self
    }
}
