use std::path::{Path, PathBuf};

use bevy::prelude::*;
use crossbeam_channel::Receiver;
use notify::{Event as NotifyEvent, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::SimConfig;
use crate::simulation::Simulation;
use crate::tilemap::{spawn_solid_cells, TileEntity};

/// Re-runs the load phase whenever the map file changes on disk.
pub struct MapWatcherPlugin {
    pub map_path: PathBuf,
}

pub struct MapChanged;

#[derive(Resource)]
pub struct MapWatcherReceiver {
    rx: Receiver<MapChanged>,
    map_path: PathBuf,
}

impl Plugin for MapWatcherPlugin {
    fn build(&self, app: &mut App) {
        let (tx, rx) = crossbeam_channel::unbounded::<MapChanged>();
        app.insert_resource(MapWatcherReceiver {
            rx,
            map_path: self.map_path.clone(),
        });

        let map_path = self.map_path.clone();
        std::thread::spawn(move || {
            run_watcher(map_path, tx);
        });

        app.add_systems(Update, reload_map_on_change);
    }
}

fn run_watcher(map_path: PathBuf, tx: crossbeam_channel::Sender<MapChanged>) {
    let watched = map_path.clone();
    let mut watcher: RecommendedWatcher =
        match notify::recommended_watcher(move |res: Result<NotifyEvent, notify::Error>| {
            if let Ok(event) = res {
                if is_map_change(&event, &watched) {
                    let _ = tx.send(MapChanged);
                }
            }
        }) {
            Ok(w) => w,
            Err(e) => {
                eprintln!("[World watcher] Failed to create watcher: {e}");
                return;
            }
        };

    // notify needs a directory to see editors that replace the file on save
    let dir = map_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    if let Err(e) = watcher.watch(dir, RecursiveMode::NonRecursive) {
        eprintln!("[World watcher] Failed to watch {}: {e}", dir.display());
        return;
    }
    println!("[World watcher] Watching map: {}", map_path.display());

    // Keep thread alive; the watcher is dropped when the thread exits
    loop {
        std::thread::sleep(std::time::Duration::from_secs(60));
    }
}

fn is_map_change(event: &NotifyEvent, map_path: &Path) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event.paths.iter().any(|p| path_matches(p, map_path))
}

fn path_matches(a: &Path, b: &Path) -> bool {
    let ca = std::fs::canonicalize(a).unwrap_or_else(|_| a.to_path_buf());
    let cb = std::fs::canonicalize(b).unwrap_or_else(|_| b.to_path_buf());
    ca == cb
}

/// A reload is a scene restart: the running world is replaced only by a fully loaded one.
fn reload_map_on_change(
    mut commands: Commands,
    watcher: Res<MapWatcherReceiver>,
    config: Res<SimConfig>,
    mut sim: ResMut<Simulation>,
    tiles: Query<Entity, With<TileEntity>>,
) {
    // Editors often emit several events per save; one reload covers them all.
    if watcher.rx.try_iter().count() == 0 {
        return;
    }

    match Simulation::load_file(&watcher.map_path, &config) {
        Ok(reloaded) => {
            info!(
                "[World watcher] Reloaded {} ({} zones)",
                watcher.map_path.display(),
                reloaded.zones().len()
            );
            *sim = reloaded;
            for entity in tiles.iter() {
                commands.entity(entity).despawn();
            }
            spawn_solid_cells(&mut commands, sim.grid());
        }
        Err(e) => {
            error!("[World watcher] Keeping current world, reload failed: {e}");
        }
    }
}
