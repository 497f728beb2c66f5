use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::simulation::Simulation;
use crate::tilemap::map_to_render;

/// Viewport rectangle in map pixel space, derived every tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraView {
    pub center: Vec2,
    pub viewport: Vec2,
    pub world: Vec2,
}

impl CameraView {
    pub fn min(&self) -> Vec2 {
        self.center - self.viewport * 0.5
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.viewport * 0.5
    }
}

/// Follows a target point and keeps the viewport inside the world.
#[derive(Clone, Debug)]
pub struct CameraController {
    viewport: Vec2,
    world: Vec2,
    last: Option<CameraView>,
}

impl CameraController {
    pub fn new(viewport: Vec2, world: Vec2) -> Self {
        Self {
            viewport,
            world,
            last: None,
        }
    }

    pub fn update(&mut self, target: Vec2) -> CameraView {
        let view = CameraView {
            center: Vec2::new(
                clamp_axis(target.x, self.viewport.x, self.world.x),
                clamp_axis(target.y, self.viewport.y, self.world.y),
            ),
            viewport: self.viewport,
            world: self.world,
        };
        self.last = Some(view);
        view
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn last_view(&self) -> Option<CameraView> {
        self.last
    }
}

/// A viewport wider than the world cannot be contained, so it sits on the world center.
fn clamp_axis(center: f32, view: f32, world: f32) -> f32 {
    let half = view * 0.5;
    if view >= world {
        world * 0.5
    } else {
        center.clamp(half, world - half)
    }
}

#[derive(Component)]
pub struct MainCamera;

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_camera)
            .add_systems(Update, fit_viewport_to_window)
            .add_systems(
                PostUpdate,
                apply_camera_view.before(bevy::transform::TransformSystem::TransformPropagate),
            );
    }
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn((MainCamera, Camera2d, Transform::from_xyz(0.0, 0.0, 100.0)));
}

/// The clamp follows the real window, including user resizes.
fn fit_viewport_to_window(
    window_query: Query<&Window, With<PrimaryWindow>>,
    mut sim: ResMut<Simulation>,
) {
    let Ok(window) = window_query.get_single() else {
        return;
    };
    let size = Vec2::new(window.width(), window.height());
    if size != sim.camera().viewport() {
        sim.set_viewport(size);
    }
}

fn apply_camera_view(sim: Res<Simulation>, mut camera_query: Query<&mut Transform, With<MainCamera>>) {
    let Ok(mut cam_transform) = camera_query.get_single_mut() else {
        return;
    };
    let Some(view) = sim.camera().last_view() else {
        return;
    };
    let at = map_to_render(view.center, view.world.y);
    cam_transform.translation.x = at.x;
    cam_transform.translation.y = at.y;
}
