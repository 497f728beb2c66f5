pub mod avatar;
pub mod camera;
pub mod config;
pub mod events;
#[cfg(not(target_arch = "wasm32"))]
pub mod file_watcher;
pub mod input;
pub mod physics_core;
pub mod simulation;
pub mod tilemap;
pub mod triggers;
pub mod world_loader;
pub mod zones;
