use std::path::Path;

use bevy::prelude::*;

use crate::avatar::{Avatar, Intent};
use crate::camera::{CameraController, CameraView};
use crate::config::SimConfig;
use crate::events::GameEventBus;
use crate::input::VirtualInput;
use crate::physics_core::collides_solid;
use crate::tilemap::CollisionGrid;
use crate::triggers::{TriggerDispatcher, ZoneEventSink};
use crate::world_loader::{self, LoadError, LoadedWorld};
use crate::zones::ZoneRegistry;

/// A loaded scene: immutable world geometry plus the per-tick state driven over it.
///
/// Lifecycle is two phases. [`Simulation::load`] runs the whole load phase and either
/// yields a complete world or an error; nothing partial is ever exposed. After that
/// [`Simulation::tick`] runs `intent -> avatar step -> triggers -> camera`, in that
/// order, once per tick.
#[derive(Resource, Clone, Debug)]
pub struct Simulation {
    world: LoadedWorld,
    avatar: Avatar,
    triggers: TriggerDispatcher,
    camera: CameraController,
    ticks: u64,
}

impl Simulation {
    pub fn load(world: LoadedWorld, config: &SimConfig) -> Self {
        Self::from_world(world, &config.sanitized())
    }

    pub fn load_str(source: &str, config: &SimConfig) -> Result<Self, LoadError> {
        let config = config.sanitized();
        Ok(Self::from_world(world_loader::load_str(source, &config)?, &config))
    }

    pub fn load_file(path: impl AsRef<Path>, config: &SimConfig) -> Result<Self, LoadError> {
        let config = config.sanitized();
        Ok(Self::from_world(world_loader::load_file(path, &config)?, &config))
    }

    fn from_world(world: LoadedWorld, config: &SimConfig) -> Self {
        if !world.spawn_found {
            warn!(
                "[World loader] No '{}' object in map; spawning at (0, 0)",
                config.spawn_object_name
            );
        }
        let avatar = Avatar::new(
            world.spawn,
            Vec2::new(config.avatar_width, config.avatar_height),
            config.move_speed,
        );
        if collides_solid(&world.grid, &avatar.aabb()) {
            warn!(
                "[World loader] Spawn at ({}, {}) overlaps solid cells",
                world.spawn.x, world.spawn.y
            );
        }
        let triggers = TriggerDispatcher::new(&world.zones, config.edge_triggered);
        let camera = CameraController::new(
            Vec2::new(config.viewport_width, config.viewport_height),
            world.grid.pixel_size(),
        );
        Self {
            world,
            avatar,
            triggers,
            camera,
            ticks: 0,
        }
    }

    pub fn tick(&mut self, intent: Intent, dt: f32, sink: &mut dyn ZoneEventSink) -> CameraView {
        self.avatar.step(intent, dt, &self.world.grid);
        self.triggers.update(&self.avatar.aabb(), &self.world.zones, sink);
        self.ticks = self.ticks.saturating_add(1);
        self.camera.update(self.avatar.center())
    }

    /// Resize the camera viewport and re-clamp the current view.
    pub fn set_viewport(&mut self, viewport: Vec2) {
        if !(viewport.x > 0.0 && viewport.y > 0.0) || viewport == self.camera.viewport() {
            return;
        }
        self.camera = CameraController::new(viewport, self.world.grid.pixel_size());
        self.camera.update(self.avatar.center());
    }

    pub fn avatar(&self) -> &Avatar {
        &self.avatar
    }

    pub fn grid(&self) -> &CollisionGrid {
        &self.world.grid
    }

    pub fn zones(&self) -> &ZoneRegistry {
        &self.world.zones
    }

    pub fn triggers(&self) -> &TriggerDispatcher {
        &self.triggers
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn spawn(&self) -> Vec2 {
        self.world.spawn
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            run_simulation_tick.after(crate::events::tick_event_frame),
        );
    }
}

fn run_simulation_tick(
    time: Res<Time<Fixed>>,
    input: Res<VirtualInput>,
    mut sim: ResMut<Simulation>,
    mut bus: ResMut<GameEventBus>,
) {
    let dt = time.timestep().as_secs_f32();
    sim.tick(input.intent(), dt, &mut *bus);
}
