use bevy::prelude::*;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAP_PATH: &str = "assets/maps/festival-map.json";

/// Tunables for the world simulation (as a resource so they can be tweaked from game.json)
#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Avatar speed in pixels per second.
    pub move_speed: f32,
    pub avatar_width: f32,
    pub avatar_height: f32,
    /// Object-layer name that marks where the avatar starts.
    pub spawn_object_name: String,
    /// Object `type`/`class` that turns a map object into a trigger zone.
    pub zone_type: String,
    /// Radius used for point zones that carry no `radius` property.
    pub default_zone_radius: f32,
    /// Fire zone-enter once per transition instead of on every overlapping tick.
    pub edge_triggered: bool,
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub tick_hz: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            move_speed: 160.0,
            avatar_width: 20.0,
            avatar_height: 24.0,
            spawn_object_name: "Spawn Point".to_string(),
            zone_type: "zone".to_string(),
            default_zone_radius: 16.0,
            edge_triggered: true,
            viewport_width: 800.0,
            viewport_height: 600.0,
            tick_hz: 60.0,
        }
    }
}

impl SimConfig {
    /// Replace values the simulation cannot run with by their defaults.
    pub fn sanitized(&self) -> SimConfig {
        let defaults = SimConfig::default();
        let positive = |name: &str, value: f32, default: f32| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                warn!("[World config] Invalid {name} {value}, using {default}");
                default
            }
        };
        let non_negative = |name: &str, value: f32, default: f32| {
            if value.is_finite() && value >= 0.0 {
                value
            } else {
                warn!("[World config] Invalid {name} {value}, using {default}");
                default
            }
        };
        SimConfig {
            move_speed: non_negative("move_speed", self.move_speed, defaults.move_speed),
            avatar_width: positive("avatar_width", self.avatar_width, defaults.avatar_width),
            avatar_height: positive("avatar_height", self.avatar_height, defaults.avatar_height),
            default_zone_radius: non_negative(
                "default_zone_radius",
                self.default_zone_radius,
                defaults.default_zone_radius,
            ),
            viewport_width: positive("viewport_width", self.viewport_width, defaults.viewport_width),
            viewport_height: positive(
                "viewport_height",
                self.viewport_height,
                defaults.viewport_height,
            ),
            tick_hz: if self.tick_hz.is_finite() && self.tick_hz > 0.0 {
                self.tick_hz
            } else {
                warn!("[World config] Invalid tick_hz {}, using {}", self.tick_hz, defaults.tick_hz);
                defaults.tick_hz
            },
            ..self.clone()
        }
    }
}

#[derive(Deserialize, Default)]
pub struct StartupConfig {
    pub window_title: Option<String>,
    pub background_color: Option<[f32; 3]>,
    pub map_path: Option<String>,
    #[serde(default)]
    pub watch_map: bool,
    #[serde(default)]
    pub simulation: SimConfig,
}

impl StartupConfig {
    /// Map path with the `FESTIVAL_MAP_PATH` override applied.
    pub fn resolved_map_path(&self) -> String {
        std::env::var("FESTIVAL_MAP_PATH")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| self.map_path.clone())
            .unwrap_or_else(|| DEFAULT_MAP_PATH.to_string())
    }
}

pub fn load_startup_config() -> StartupConfig {
    let path = std::env::var("FESTIVAL_GAME_CONFIG")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "game.json".to_string());
    match std::fs::read_to_string(&path) {
        Ok(contents) => parse_startup_config(&contents).unwrap_or_else(|e| {
            eprintln!("[World config] Failed to parse {}: {}", path, e);
            StartupConfig::default()
        }),
        Err(_) => StartupConfig::default(),
    }
}

fn parse_startup_config(contents: &str) -> Result<StartupConfig, serde_json::Error> {
    let cfg = serde_json::from_str::<StartupConfig>(contents)?;
    println!("[World config] Loaded startup config");
    Ok(cfg)
}
