use std::fmt;
use std::path::{Path, PathBuf};

use bevy::math::Vec2;

use crate::config::SimConfig;
use crate::tilemap::{CollisionGrid, MapDefinition, MapObject};
use crate::zones::{Zone, ZoneRegistry, ZoneShape};

/// Everything the load phase hands to the simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedWorld {
    pub grid: CollisionGrid,
    pub zones: ZoneRegistry,
    pub spawn: Vec2,
    /// False when the map had no spawn object and `spawn` is the `(0, 0)` fallback.
    pub spawn_found: bool,
}

/// Fatal load-phase failures. Missing optional objects are not errors.
#[derive(Debug)]
pub enum LoadError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    InvalidDimensions { width: u32, height: u32 },
    InvalidCellSize { tile_width: u32, tile_height: u32 },
    NonSquareCells { tile_width: u32, tile_height: u32 },
    NoTileLayers,
    UnsupportedEncoding { layer: String, encoding: String },
    MissingLayerData { layer: String },
    LayerSizeMismatch { layer: String, expected: usize, actual: usize },
    ExternalTileset { source: String },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { path, source } => {
                write!(f, "failed to read map {}: {source}", path.display())
            }
            LoadError::Parse(e) => write!(f, "malformed map definition: {e}"),
            LoadError::InvalidDimensions { width, height } => {
                write!(f, "map dimensions must be positive, got {width}x{height}")
            }
            LoadError::InvalidCellSize {
                tile_width,
                tile_height,
            } => write!(f, "tile size must be positive, got {tile_width}x{tile_height}"),
            LoadError::NonSquareCells {
                tile_width,
                tile_height,
            } => write!(f, "tiles must be square, got {tile_width}x{tile_height}"),
            LoadError::NoTileLayers => write!(f, "map has no tile layer"),
            LoadError::UnsupportedEncoding { layer, encoding } => {
                write!(f, "tile layer '{layer}' uses unsupported encoding '{encoding}'")
            }
            LoadError::MissingLayerData { layer } => {
                write!(f, "tile layer '{layer}' has no data (infinite maps are not supported)")
            }
            LoadError::LayerSizeMismatch {
                layer,
                expected,
                actual,
            } => write!(f, "tile layer '{layer}' has {actual} cells, expected {expected}"),
            LoadError::ExternalTileset { source } => {
                write!(f, "external tileset '{source}' is not supported, embed it in the map")
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            LoadError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(e: serde_json::Error) -> Self {
        LoadError::Parse(e)
    }
}

pub fn load_file(path: impl AsRef<Path>, config: &SimConfig) -> Result<LoadedWorld, LoadError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_str(&source, config)
}

pub fn load_str(source: &str, config: &SimConfig) -> Result<LoadedWorld, LoadError> {
    let definition: MapDefinition = serde_json::from_str(source)?;
    load_definition(&definition, config)
}

pub fn load_definition(def: &MapDefinition, config: &SimConfig) -> Result<LoadedWorld, LoadError> {
    let grid = build_collision_grid(def)?;

    let objects: Vec<&MapObject> = def
        .object_layers()
        .flat_map(|layer| layer.objects.iter())
        .collect();

    let spawn_object = objects
        .iter()
        .find(|obj| obj.name == config.spawn_object_name);
    let spawn = spawn_object.map_or(Vec2::ZERO, |obj| Vec2::new(obj.x, obj.y));

    let zones = objects
        .iter()
        .filter(|obj| {
            obj.object_type()
                .is_some_and(|t| t.eq_ignore_ascii_case(&config.zone_type))
        })
        .enumerate()
        .map(|(idx, obj)| zone_from_object(obj, idx, config))
        .collect();

    Ok(LoadedWorld {
        grid,
        zones: ZoneRegistry::new(zones),
        spawn,
        spawn_found: spawn_object.is_some(),
    })
}

fn build_collision_grid(def: &MapDefinition) -> Result<CollisionGrid, LoadError> {
    if def.width == 0 || def.height == 0 {
        return Err(LoadError::InvalidDimensions {
            width: def.width,
            height: def.height,
        });
    }
    if def.tilewidth == 0 || def.tileheight == 0 {
        return Err(LoadError::InvalidCellSize {
            tile_width: def.tilewidth,
            tile_height: def.tileheight,
        });
    }
    if def.tilewidth != def.tileheight {
        return Err(LoadError::NonSquareCells {
            tile_width: def.tilewidth,
            tile_height: def.tileheight,
        });
    }

    if let Some(source) = def.tilesets.iter().find_map(|ts| ts.source.as_ref()) {
        return Err(LoadError::ExternalTileset {
            source: source.clone(),
        });
    }
    let expected = (def.width as usize)
        .checked_mul(def.height as usize)
        .ok_or(LoadError::InvalidDimensions {
            width: def.width,
            height: def.height,
        })?;

    // Validate every layer before sizing the grid, so dimensions are backed by real data.
    let mut layers = Vec::new();
    for layer in def.tile_layers() {
        if let Some(encoding) = layer.encoding.as_deref().filter(|e| *e != "csv") {
            return Err(LoadError::UnsupportedEncoding {
                layer: layer.name.clone(),
                encoding: encoding.to_string(),
            });
        }
        let Some(data) = layer.data.as_ref() else {
            return Err(LoadError::MissingLayerData {
                layer: layer.name.clone(),
            });
        };
        if data.len() != expected {
            return Err(LoadError::LayerSizeMismatch {
                layer: layer.name.clone(),
                expected,
                actual: data.len(),
            });
        }
        layers.push(data);
    }
    if layers.is_empty() {
        return Err(LoadError::NoTileLayers);
    }

    let mut solid = vec![false; expected];
    for data in layers {
        for (cell, gid) in solid.iter_mut().zip(data) {
            if !*cell && def.gid_collides(*gid) {
                *cell = true;
            }
        }
    }

    Ok(CollisionGrid::from_cells(
        def.width,
        def.height,
        def.tilewidth as f32,
        solid,
    ))
}

fn zone_from_object(obj: &MapObject, index: usize, config: &SimConfig) -> Zone {
    let shape_from_box = !obj.point && obj.width > 0.0 && obj.height > 0.0;
    let (position, shape) = if shape_from_box && obj.ellipse {
        let radius = obj.width.max(obj.height) * 0.5;
        (
            Vec2::new(obj.x + obj.width * 0.5, obj.y + obj.height * 0.5),
            ZoneShape::Circle { radius },
        )
    } else if shape_from_box {
        (
            Vec2::new(obj.x, obj.y),
            ZoneShape::Rect {
                width: obj.width,
                height: obj.height,
            },
        )
    } else {
        let radius = obj
            .properties
            .get_f32("radius")
            .filter(|r| r.is_finite() && *r >= 0.0)
            .unwrap_or(config.default_zone_radius);
        (Vec2::new(obj.x, obj.y), ZoneShape::Circle { radius })
    };

    Zone {
        id: obj.id.unwrap_or(index as u32 + 1),
        name: obj.name.clone(),
        position,
        shape,
        content_key: obj
            .properties
            .get_key("contentKey")
            .unwrap_or_else(|| obj.name.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collides_tileset() -> serde_json::Value {
        serde_json::json!([{
            "firstgid": 1,
            "name": "jeonwoochi-tileset",
            "tiles": [{ "id": 1, "properties": [{ "name": "collides", "type": "bool", "value": true }] }]
        }])
    }

    fn map_json(objects: serde_json::Value) -> String {
        // 3x2 map: gid 2 collides, gid 1 is open ground.
        serde_json::json!({
            "width": 3, "height": 2, "tilewidth": 32, "tileheight": 32,
            "layers": [
                { "type": "tilelayer", "name": "tiles1", "data": [2, 1, 1, 1, 1, 2] },
                { "type": "tilelayer", "name": "tiles2", "data": [0, 2, 0, 0, 0, 0] },
                { "type": "objectgroup", "name": "Objects", "objects": objects }
            ],
            "tilesets": collides_tileset()
        })
        .to_string()
    }

    #[test]
    fn solid_cells_are_unioned_across_layers() {
        let world = load_str(&map_json(serde_json::json!([])), &SimConfig::default()).unwrap();
        assert_eq!(world.grid.width(), 3);
        assert_eq!(world.grid.height(), 2);
        assert_eq!(world.grid.cell_size(), 32.0);
        assert!(world.grid.is_solid(0, 0));
        assert!(world.grid.is_solid(1, 0));
        assert!(!world.grid.is_solid(2, 0));
        assert!(!world.grid.is_solid(0, 1));
        assert!(world.grid.is_solid(2, 1));
        assert_eq!(world.grid.solid_count(), 3);
    }

    #[test]
    fn missing_spawn_point_falls_back_to_origin() {
        let world = load_str(&map_json(serde_json::json!([])), &SimConfig::default()).unwrap();
        assert_eq!(world.spawn, Vec2::ZERO);
        assert!(!world.spawn_found);
        assert!(world.zones.is_empty());
    }

    #[test]
    fn first_spawn_point_wins() {
        let objects = serde_json::json!([
            { "id": 1, "name": "Spawn Point", "x": 40.0, "y": 20.0, "point": true },
            { "id": 2, "name": "Spawn Point", "x": 90.0, "y": 90.0, "point": true }
        ]);
        let world = load_str(&map_json(objects), &SimConfig::default()).unwrap();
        assert_eq!(world.spawn, Vec2::new(40.0, 20.0));
        assert!(world.spawn_found);
    }

    #[test]
    fn zone_objects_become_zones() {
        let objects = serde_json::json!([
            { "id": 4, "name": "festival", "type": "zone", "x": 10.0, "y": 12.0, "point": true,
              "properties": [{ "name": "contentKey", "type": "int", "value": 1207 }] },
            { "id": 5, "name": "market", "class": "Zone", "x": 32.0, "y": 0.0, "width": 64.0, "height": 32.0 },
            { "id": 6, "name": "pond", "type": "zone", "x": 0.0, "y": 0.0, "width": 20.0, "height": 10.0, "ellipse": true,
              "properties": { "contentKey": "pond-tour" } },
            { "id": 7, "name": "lamp", "type": "decoration", "x": 1.0, "y": 1.0 },
            { "id": 8, "name": "stage", "type": "zone", "x": 3.0, "y": 4.0,
              "properties": [{ "name": "radius", "type": "float", "value": 40.0 }] }
        ]);
        let world = load_str(&map_json(objects), &SimConfig::default()).unwrap();
        assert_eq!(world.zones.len(), 4);

        let festival = world.zones.get(4).unwrap();
        assert_eq!(festival.content_key, "1207");
        assert_eq!(festival.shape, ZoneShape::Circle { radius: 16.0 });
        assert_eq!(festival.position, Vec2::new(10.0, 12.0));

        let market = world.zones.get(5).unwrap();
        assert_eq!(market.content_key, "market");
        assert_eq!(
            market.shape,
            ZoneShape::Rect {
                width: 64.0,
                height: 32.0
            }
        );

        let pond = world.zones.get(6).unwrap();
        assert_eq!(pond.content_key, "pond-tour");
        assert_eq!(pond.position, Vec2::new(10.0, 5.0));
        assert_eq!(pond.shape, ZoneShape::Circle { radius: 10.0 });

        let stage = world.zones.get(8).unwrap();
        assert_eq!(stage.shape, ZoneShape::Circle { radius: 40.0 });
    }

    #[test]
    fn zone_without_id_gets_its_order() {
        let objects = serde_json::json!([
            { "name": "a", "type": "zone", "x": 0.0, "y": 0.0 },
            { "name": "b", "type": "zone", "x": 0.0, "y": 0.0 }
        ]);
        let world = load_str(&map_json(objects), &SimConfig::default()).unwrap();
        let ids: Vec<_> = world.zones.iter().map(|z| z.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn loading_is_deterministic() {
        let source = map_json(serde_json::json!([
            { "id": 1, "name": "Spawn Point", "x": 40.0, "y": 20.0 }
        ]));
        let a = load_str(&source, &SimConfig::default()).unwrap();
        let b = load_str(&source, &SimConfig::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn missing_object_layer_is_fine() {
        let source = serde_json::json!({
            "width": 1, "height": 1, "tilewidth": 16, "tileheight": 16,
            "layers": [{ "type": "tilelayer", "name": "tiles1", "data": [0] }]
        })
        .to_string();
        let world = load_str(&source, &SimConfig::default()).unwrap();
        assert!(!world.spawn_found);
        assert!(!world.grid.is_solid(0, 0));
    }

    #[test]
    fn malformed_input_is_fatal() {
        assert!(matches!(
            load_str("{ \"width\": 3", &SimConfig::default()),
            Err(LoadError::Parse(_))
        ));
        assert!(matches!(
            load_str("{ \"layers\": [] }", &SimConfig::default()),
            Err(LoadError::Parse(_))
        ));
    }

    #[test]
    fn structural_problems_are_reported() {
        let cfg = SimConfig::default();
        let no_layers = serde_json::json!({
            "width": 2, "height": 2, "tilewidth": 16, "tileheight": 16, "layers": []
        });
        assert!(matches!(
            load_str(&no_layers.to_string(), &cfg),
            Err(LoadError::NoTileLayers)
        ));

        let zero = serde_json::json!({
            "width": 0, "height": 2, "tilewidth": 16, "tileheight": 16, "layers": []
        });
        assert!(matches!(
            load_str(&zero.to_string(), &cfg),
            Err(LoadError::InvalidDimensions { width: 0, height: 2 })
        ));

        let short = serde_json::json!({
            "width": 2, "height": 2, "tilewidth": 16, "tileheight": 16,
            "layers": [{ "type": "tilelayer", "name": "tiles1", "data": [0, 0, 0] }]
        });
        assert!(matches!(
            load_str(&short.to_string(), &cfg),
            Err(LoadError::LayerSizeMismatch { expected: 4, actual: 3, .. })
        ));

        let encoded = serde_json::json!({
            "width": 1, "height": 1, "tilewidth": 16, "tileheight": 16,
            "layers": [{ "type": "tilelayer", "name": "tiles1", "encoding": "base64", "data": [0] }]
        });
        assert!(matches!(
            load_str(&encoded.to_string(), &cfg),
            Err(LoadError::UnsupportedEncoding { .. })
        ));

        let oblong = serde_json::json!({
            "width": 1, "height": 1, "tilewidth": 16, "tileheight": 8,
            "layers": [{ "type": "tilelayer", "name": "tiles1", "data": [0] }]
        });
        assert!(matches!(
            load_str(&oblong.to_string(), &cfg),
            Err(LoadError::NonSquareCells { .. })
        ));
    }

    #[test]
    fn oversized_dimensions_fail_without_allocating() {
        let huge = serde_json::json!({
            "width": u32::MAX, "height": u32::MAX, "tilewidth": 16, "tileheight": 16,
            "layers": [{ "type": "tilelayer", "name": "tiles1", "data": [0] }]
        });
        let result = load_str(&huge.to_string(), &SimConfig::default());
        assert!(matches!(
            result,
            Err(LoadError::LayerSizeMismatch { actual: 1, .. }) | Err(LoadError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn external_tilesets_are_rejected() {
        let source = serde_json::json!({
            "width": 2, "height": 1, "tilewidth": 16, "tileheight": 16,
            "layers": [{ "type": "tilelayer", "name": "tiles1", "data": [1, 1] }],
            "tilesets": [{ "firstgid": 1, "source": "walls.tsx" }]
        });
        let err = load_str(&source.to_string(), &SimConfig::default()).unwrap_err();
        assert!(matches!(&err, LoadError::ExternalTileset { source } if source == "walls.tsx"));
        assert!(err.to_string().contains("walls.tsx"));
    }

    #[test]
    fn unreadable_file_is_an_io_error() {
        let err = load_file("definitely/not/here.json", &SimConfig::default()).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert!(err.to_string().contains("definitely/not/here.json"));
    }
}
