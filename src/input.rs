use bevy::prelude::*;

use crate::avatar::Intent;

/// Abstraction layer between raw input and the simulation tick.
/// Keyboard (windowed) or a driver (headless/tests) writes held directions here.
#[derive(Resource, Default, Clone)]
pub struct VirtualInput {
    /// Held directions, most recently pressed last.
    held: Vec<Intent>,
}

impl VirtualInput {
    pub fn press(&mut self, intent: Intent) {
        if intent == Intent::None {
            return;
        }
        self.held.retain(|held| *held != intent);
        self.held.push(intent);
    }

    pub fn release(&mut self, intent: Intent) {
        self.held.retain(|held| *held != intent);
    }

    /// The newest held direction wins, so tapping a second key while holding one turns the avatar.
    pub fn intent(&self) -> Intent {
        self.held.last().copied().unwrap_or_default()
    }
}

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(VirtualInput::default()).add_systems(
            PreUpdate,
            keyboard_to_virtual.run_if(resource_exists::<ButtonInput<KeyCode>>),
        );
    }
}

const KEY_BINDINGS: [(KeyCode, Intent); 8] = [
    (KeyCode::ArrowUp, Intent::Up),
    (KeyCode::ArrowDown, Intent::Down),
    (KeyCode::ArrowLeft, Intent::Left),
    (KeyCode::ArrowRight, Intent::Right),
    (KeyCode::KeyW, Intent::Up),
    (KeyCode::KeyS, Intent::Down),
    (KeyCode::KeyA, Intent::Left),
    (KeyCode::KeyD, Intent::Right),
];

/// Translate keyboard input to held directions
fn keyboard_to_virtual(keyboard: Res<ButtonInput<KeyCode>>, mut vinput: ResMut<VirtualInput>) {
    for (key, intent) in KEY_BINDINGS {
        if keyboard.just_pressed(key) {
            vinput.press(intent);
        }
    }
    for (key, intent) in KEY_BINDINGS {
        let still_held = KEY_BINDINGS
            .iter()
            .any(|(other, i)| *i == intent && keyboard.pressed(*other));
        if keyboard.just_released(key) && !still_held {
            vinput.release(intent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_press_wins_and_release_falls_back() {
        let mut input = VirtualInput::default();
        assert_eq!(input.intent(), Intent::None);
        input.press(Intent::Left);
        input.press(Intent::Up);
        assert_eq!(input.intent(), Intent::Up);
        input.release(Intent::Up);
        assert_eq!(input.intent(), Intent::Left);
        input.press(Intent::Left);
        input.release(Intent::Left);
        assert_eq!(input.intent(), Intent::None);
    }

    #[test]
    fn keyboard_system_tracks_arrow_and_wasd() {
        let mut app = App::new();
        app.insert_resource(ButtonInput::<KeyCode>::default())
            .add_plugins(InputPlugin);

        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::ArrowRight);
        app.update();
        assert_eq!(app.world().resource::<VirtualInput>().intent(), Intent::Right);

        {
            let mut keys = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
            keys.clear();
            keys.press(KeyCode::KeyW);
        }
        app.update();
        assert_eq!(app.world().resource::<VirtualInput>().intent(), Intent::Up);

        {
            let mut keys = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
            keys.clear();
            keys.release(KeyCode::KeyW);
        }
        app.update();
        assert_eq!(app.world().resource::<VirtualInput>().intent(), Intent::Right);
    }
}
