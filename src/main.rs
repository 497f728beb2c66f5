use bevy::prelude::*;

use festival_world::config::load_startup_config;
use festival_world::simulation::{Simulation, SimulationPlugin};
use festival_world::{avatar, camera, events, input, tilemap};

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let headless = args.iter().any(|a| a == "--headless");
    let check_only = args.iter().any(|a| a == "--check-map");

    let startup_config = load_startup_config();
    let sim_config = startup_config.simulation.sanitized();
    let map_path = startup_config.resolved_map_path();

    // Load phase: a broken map never reaches the tick loop.
    let simulation = match Simulation::load_file(&map_path, &sim_config) {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("[World loader] Cannot start scene from {map_path}: {e}");
            std::process::exit(2);
        }
    };
    if check_only {
        print_map_summary(&map_path, &simulation);
        return;
    }

    let mut app = App::new();

    if headless {
        app.add_plugins(MinimalPlugins)
            .add_plugins(bevy::log::LogPlugin::default());
        println!("[World] Starting in HEADLESS mode");
    } else {
        let window_title = startup_config
            .window_title
            .clone()
            .unwrap_or_else(|| "Festival World".to_string());
        app.add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: window_title,
                        resolution: (sim_config.viewport_width, sim_config.viewport_height)
                            .into(),
                        present_mode: bevy::window::PresentMode::AutoVsync,
                        ..default()
                    }),
                    ..default()
                })
                .set(ImagePlugin::default_nearest()),
        );
        let bg = startup_config.background_color.unwrap_or([0.36, 0.62, 0.36]);
        app.insert_resource(ClearColor(Color::srgb(bg[0], bg[1], bg[2])))
            .add_plugins(tilemap::TilemapPlugin)
            .add_plugins(avatar::AvatarPlugin)
            .add_plugins(camera::CameraPlugin);

        #[cfg(not(target_arch = "wasm32"))]
        if startup_config.watch_map {
            app.add_plugins(festival_world::file_watcher::MapWatcherPlugin {
                map_path: map_path.clone().into(),
            });
        }
        println!("[World] Starting in WINDOWED mode");
    }

    app.insert_resource(Time::<Fixed>::from_hz(sim_config.tick_hz))
        .insert_resource(sim_config)
        .insert_resource(simulation)
        .add_plugins(input::InputPlugin)
        .add_plugins(events::GameEventsPlugin)
        .add_plugins(SimulationPlugin);

    app.run();
}

fn print_map_summary(map_path: &str, sim: &Simulation) {
    let grid = sim.grid();
    println!(
        "[World loader] {map_path}: {}x{} cells of {}px, {} solid, spawn ({}, {}), {} zones",
        grid.width(),
        grid.height(),
        grid.cell_size(),
        grid.solid_count(),
        sim.spawn().x,
        sim.spawn().y,
        sim.zones().len()
    );
    for zone in sim.zones() {
        println!(
            "[World loader]   zone {} '{}' -> {} at ({}, {})",
            zone.id, zone.name, zone.content_key, zone.position.x, zone.position.y
        );
    }
}
