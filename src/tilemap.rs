use bevy::prelude::*;
use serde::Deserialize;

use crate::simulation::Simulation;

/// Tiled stores horizontal/vertical/diagonal flip flags in the top three gid bits.
const GID_FLIP_MASK: u32 = 0x1FFF_FFFF;

/// Tiled-compatible map document (JSON export).
#[derive(Clone, Debug, Deserialize)]
pub struct MapDefinition {
    pub width: u32,
    pub height: u32,
    pub tilewidth: u32,
    pub tileheight: u32,
    #[serde(default)]
    pub layers: Vec<MapLayer>,
    #[serde(default)]
    pub tilesets: Vec<TilesetDef>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type")]
pub enum MapLayer {
    #[serde(rename = "tilelayer")]
    Tiles(TileLayerDef),
    #[serde(rename = "objectgroup")]
    Objects(ObjectLayerDef),
    /// Image layers, groups and anything else the simulation has no use for.
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TileLayerDef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub data: Option<Vec<u32>>,
    #[serde(default)]
    pub encoding: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ObjectLayerDef {
    #[serde(default)]
    pub objects: Vec<MapObject>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MapObject {
    #[serde(default)]
    pub id: Option<u32>,
    #[serde(default)]
    pub name: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub ellipse: bool,
    #[serde(default)]
    pub point: bool,
    #[serde(default)]
    pub properties: Properties,
}

impl MapObject {
    /// `type` (Tiled <= 1.8) or `class` (Tiled >= 1.9), whichever is set.
    pub fn object_type(&self) -> Option<&str> {
        self.kind
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.class.as_deref().filter(|s| !s.is_empty()))
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct TilesetDef {
    pub firstgid: u32,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub tiles: Vec<TileDef>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TileDef {
    pub id: u32,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    pub value: serde_json::Value,
}

/// Custom properties, either as Tiled's `[{name, type, value}]` list or a plain mapping.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum Properties {
    List(Vec<PropertyDef>),
    Map(serde_json::Map<String, serde_json::Value>),
}

impl Default for Properties {
    fn default() -> Self {
        Properties::List(Vec::new())
    }
}

impl Properties {
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        match self {
            Properties::List(list) => list.iter().find(|p| p.name == name).map(|p| &p.value),
            Properties::Map(map) => map.get(name),
        }
    }

    /// Booleans, plus the `"true"` strings older exporters write.
    pub fn get_bool(&self, name: &str) -> bool {
        match self.get(name) {
            Some(serde_json::Value::Bool(b)) => *b,
            Some(serde_json::Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    pub fn get_f32(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            serde_json::Value::Number(n) => n.as_f64().map(|v| v as f32),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Strings as-is, numbers rendered to text.
    pub fn get_key(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl MapDefinition {
    /// Whether the tile referenced by `gid` carries `collides = true`.
    pub fn gid_collides(&self, gid: u32) -> bool {
        let gid = gid & GID_FLIP_MASK;
        if gid == 0 {
            return false;
        }
        let Some(tileset) = self
            .tilesets
            .iter()
            .filter(|ts| ts.firstgid <= gid)
            .max_by_key(|ts| ts.firstgid)
        else {
            return false;
        };
        let local_id = gid - tileset.firstgid;
        tileset
            .tiles
            .iter()
            .find(|t| t.id == local_id)
            .is_some_and(|t| t.properties.get_bool("collides"))
    }

    pub fn tile_layers(&self) -> impl Iterator<Item = &TileLayerDef> {
        self.layers.iter().filter_map(|layer| match layer {
            MapLayer::Tiles(t) => Some(t),
            _ => None,
        })
    }

    pub fn object_layers(&self) -> impl Iterator<Item = &ObjectLayerDef> {
        self.layers.iter().filter_map(|layer| match layer {
            MapLayer::Objects(o) => Some(o),
            _ => None,
        })
    }
}

/// Static solid/empty lookup per cell. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct CollisionGrid {
    width: u32,
    height: u32,
    cell_size: f32,
    solid: Vec<bool>,
}

impl CollisionGrid {
    /// `solid` is row-major, `width * height` long.
    pub(crate) fn from_cells(width: u32, height: u32, cell_size: f32, solid: Vec<bool>) -> Self {
        debug_assert_eq!(solid.len(), width as usize * height as usize);
        Self {
            width,
            height,
            cell_size,
            solid,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn pixel_width(&self) -> f32 {
        self.width as f32 * self.cell_size
    }

    pub fn pixel_height(&self) -> f32 {
        self.height as f32 * self.cell_size
    }

    pub fn pixel_size(&self) -> Vec2 {
        Vec2::new(self.pixel_width(), self.pixel_height())
    }

    /// Out-of-range cells count as solid, so the map edge is always walled.
    pub fn is_solid(&self, cell_x: i32, cell_y: i32) -> bool {
        if cell_x < 0 || cell_y < 0 || cell_x >= self.width as i32 || cell_y >= self.height as i32 {
            return true;
        }
        self.solid[cell_y as usize * self.width as usize + cell_x as usize]
    }

    pub fn solid_cells(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let width = self.width as usize;
        self.solid
            .iter()
            .enumerate()
            .filter(|(_, solid)| **solid)
            .map(move |(idx, _)| ((idx % width) as u32, (idx / width) as u32))
    }

    pub fn solid_count(&self) -> usize {
        self.solid.iter().filter(|s| **s).count()
    }
}

/// Map pixel space (y down) to Bevy world space (y up).
pub fn map_to_render(point: Vec2, world_height: f32) -> Vec2 {
    Vec2::new(point.x, world_height - point.y)
}

pub struct TilemapPlugin;

impl Plugin for TilemapPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_tilemap);
    }
}

/// Marker for solid-cell sprites (so they can be despawned on map reload)
#[derive(Component)]
pub struct TileEntity;

fn spawn_tilemap(mut commands: Commands, sim: Res<Simulation>) {
    spawn_solid_cells(&mut commands, sim.grid());
}

pub fn spawn_solid_cells(commands: &mut Commands, grid: &CollisionGrid) {
    let ts = grid.cell_size();
    for (cx, cy) in grid.solid_cells() {
        let center = Vec2::new((cx as f32 + 0.5) * ts, (cy as f32 + 0.5) * ts);
        let at = map_to_render(center, grid.pixel_height());
        commands.spawn((
            TileEntity,
            Sprite::from_color(Color::srgb(0.18, 0.42, 0.62), Vec2::splat(ts)),
            Transform::from_xyz(at.x, at.y, 0.0),
        ));
    }
}
