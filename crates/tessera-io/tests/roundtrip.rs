use std::sync::Arc;

use tessera_batch::InstanceBatcher;
use tessera_geom::{Affine3, Vec3};
use tessera_io::{IoError, load_catalog, load_map, save_catalog, save_map};
use tessera_map::{
    CellCoord, CellRegion, CellStore, ChunkCoord, GridLayout, Orientation, PlacedTile,
};
use tessera_tiles::{MaterialRef, MeshRef, ShapeRef, TileCatalog, TileCollection, TileDefinition};

fn sample_catalog() -> TileCatalog {
    let mut cat = TileCatalog::new();
    cat.insert(
        1,
        TileDefinition::new(MeshRef::new("meshes/floor.glb"))
            .with_collision(ShapeRef::new("shapes/floor.box")),
    )
    .unwrap();
    cat.insert(
        4,
        TileDefinition::new(MeshRef::new("meshes/arch.glb"))
            .with_transform(Affine3::from_translation(Vec3::new(0.0, 1.0, 0.0)))
            .with_material(MaterialRef::new("materials/sandstone.mat")),
    )
    .unwrap();
    cat
}

fn sample_store() -> CellStore {
    let mut layout = GridLayout::with_chunk_size(16, 16, 16);
    layout.cell_size = Vec3::new(2.0, 2.0, 2.0);
    let mut store = CellStore::new(layout);
    store.place(CellCoord::new(0, 0, 0), PlacedTile::new(1)).unwrap();
    store
        .place(
            CellCoord::new(3, 1, -2),
            PlacedTile::new(4).with_orientation(Orientation::Index(7)),
        )
        .unwrap();
    store
        .place(
            CellCoord::new(17, 0, 0),
            PlacedTile::new(1).with_override(Affine3::from_translation(Vec3::new(0.0, 0.5, 0.0))),
        )
        .unwrap();
    store
}

#[test]
fn catalog_roundtrip_preserves_definitions() {
    let cat = sample_catalog();
    let doc = save_catalog(&cat).unwrap();
    let reloaded = load_catalog(&doc).unwrap();
    assert_eq!(
        cat.ids().collect::<Vec<_>>(),
        reloaded.ids().collect::<Vec<_>>()
    );
    for id in cat.ids() {
        assert_eq!(cat.get(id), reloaded.get(id), "tile {id}");
    }
}

#[test]
fn map_roundtrip_preserves_cells_and_catalog_refs() {
    let store = sample_store();
    let refs = vec!["tilesets/dungeon.toml".to_string()];
    let doc = save_map(&store, &refs).unwrap();
    let loaded = load_map(&doc).unwrap();
    assert_eq!(loaded.catalogs, refs);
    let reloaded = loaded.store;

    let mut before: Vec<_> = store
        .cells_in(CellRegion::ALL)
        .map(|(c, p)| (c, p.clone()))
        .collect();
    let mut after: Vec<_> = reloaded
        .cells_in(CellRegion::ALL)
        .map(|(c, p)| (c, p.clone()))
        .collect();
    before.sort_by_key(|(c, _)| *c);
    after.sort_by_key(|(c, _)| *c);
    assert_eq!(before, after);
}

#[test]
fn map_roundtrip_produces_identical_batches() {
    let tiles = TileCollection::single(Arc::new(sample_catalog()));
    let store = sample_store();
    let reloaded = load_map(&save_map(&store, &[]).unwrap()).unwrap().store;

    let mut b1 = InstanceBatcher::new(store.render_dirty());
    let mut b2 = InstanceBatcher::new(reloaded.render_dirty());
    b1.sync(&store, &tiles, &Affine3::IDENTITY);
    b2.sync(&reloaded, &tiles, &Affine3::IDENTITY);

    for chunk in [
        ChunkCoord::new(0, 0, 0),
        ChunkCoord::new(0, 0, -1),
        ChunkCoord::new(1, 0, 0),
    ] {
        let lhs = b1.get_batches(chunk);
        let rhs = b2.get_batches(chunk);
        match (lhs, rhs) {
            (Some(lhs), Some(rhs)) => {
                let mut lhs: Vec<_> = lhs.iter().map(|(id, t)| (id, t.to_vec())).collect();
                let mut rhs: Vec<_> = rhs.iter().map(|(id, t)| (id, t.to_vec())).collect();
                lhs.sort_by_key(|(id, _)| *id);
                rhs.sort_by_key(|(id, _)| *id);
                assert_eq!(lhs, rhs, "chunk {chunk:?}");
            }
            (None, None) => {}
            other => panic!("chunk {chunk:?} mismatch: {other:?}"),
        }
    }
}

#[test]
fn explicit_identity_override_survives_roundtrip() {
    let mut store = CellStore::new(GridLayout::with_chunk_size(16, 16, 16));
    store
        .place(
            CellCoord::new(0, 0, 0),
            PlacedTile::new(1).with_override(Affine3::IDENTITY),
        )
        .unwrap();
    let reloaded = load_map(&save_map(&store, &[]).unwrap()).unwrap().store;
    let placed = reloaded.get(CellCoord::new(0, 0, 0)).unwrap();
    assert_eq!(placed.transform_override, Some(Affine3::IDENTITY));
    assert_eq!(placed, store.get(CellCoord::new(0, 0, 0)).unwrap());
}

#[test]
fn load_rejects_nonpositive_chunk_size() {
    let doc = r#"
        chunk_size = [0, 16, 16]
        cell_size = [1.0, 1.0, 1.0]
        cell_centered = [true, true, true]
    "#;
    let err = load_map(doc).map(|m| m.catalogs).unwrap_err();
    assert!(matches!(err, IoError::InvalidChunkSize([0, 16, 16])));
}

#[test]
fn load_rejects_out_of_range_orientation() {
    let doc = r#"
        chunk_size = [16, 16, 16]
        cell_size = [1.0, 1.0, 1.0]
        cell_centered = [true, true, true]

        [[cells]]
        cell = [0, 0, 0]
        tile = 1
        orientation = 42
    "#;
    assert!(load_map(doc).is_err());
}
