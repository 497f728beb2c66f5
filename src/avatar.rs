use bevy::prelude::*;

use crate::physics_core::{resolve_motion, Aabb, MotionParams};
use crate::simulation::Simulation;
use crate::tilemap::{map_to_render, CollisionGrid};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Facing {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

/// Directional movement request for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Intent {
    #[default]
    None,
    Up,
    Down,
    Left,
    Right,
}

impl Intent {
    /// Unit direction in map space (y down).
    pub fn direction(self) -> Vec2 {
        match self {
            Intent::None => Vec2::ZERO,
            Intent::Up => Vec2::NEG_Y,
            Intent::Down => Vec2::Y,
            Intent::Left => Vec2::NEG_X,
            Intent::Right => Vec2::X,
        }
    }

    pub fn facing(self) -> Option<Facing> {
        match self {
            Intent::None => None,
            Intent::Up => Some(Facing::Up),
            Intent::Down => Some(Facing::Down),
            Intent::Left => Some(Facing::Left),
            Intent::Right => Some(Facing::Right),
        }
    }
}

/// The player avatar. `position` is the top-left of its bounding box in map pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct Avatar {
    pub position: Vec2,
    pub facing: Facing,
    /// Whether the last step actually changed position.
    pub moving: bool,
    pub size: Vec2,
    /// Pixels per second.
    pub speed: f32,
}

impl Avatar {
    pub fn new(position: Vec2, size: Vec2, speed: f32) -> Self {
        Self {
            position,
            facing: Facing::default(),
            moving: false,
            size,
            speed,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_top_left(self.position, self.size)
    }

    pub fn center(&self) -> Vec2 {
        self.position + self.size * 0.5
    }

    /// Advance one tick. Facing follows any non-empty intent, even when blocked.
    pub fn step(&mut self, intent: Intent, dt: f32, grid: &CollisionGrid) -> Vec2 {
        if let Some(facing) = intent.facing() {
            self.facing = facing;
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let delta = intent.direction() * self.speed * dt;
        if delta == Vec2::ZERO {
            self.moving = false;
            return self.position;
        }

        let previous = self.position;
        let out = resolve_motion(
            grid,
            MotionParams {
                position: self.position,
                size: self.size,
                delta,
            },
        );
        self.position = out.position;
        self.moving = self.position != previous;
        self.position
    }
}

/// Marks the rendered avatar entity
#[derive(Component)]
pub struct Player;

pub struct AvatarPlugin;

impl Plugin for AvatarPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_player)
            .add_systems(Update, sync_player_transform);
    }
}

fn spawn_player(mut commands: Commands, sim: Res<Simulation>) {
    let avatar = sim.avatar();
    let at = map_to_render(avatar.center(), sim.grid().pixel_height());
    commands.spawn((
        Player,
        Sprite::from_color(Color::srgb(0.9, 0.45, 0.2), avatar.size),
        Transform::from_xyz(at.x, at.y, 10.0),
    ));
}

fn sync_player_transform(sim: Res<Simulation>, mut query: Query<&mut Transform, With<Player>>) {
    let at = map_to_render(sim.avatar().center(), sim.grid().pixel_height());
    for mut transform in query.iter_mut() {
        transform.translation.x = at.x;
        transform.translation.y = at.y;
    }
}
