use std::collections::VecDeque;

use bevy::prelude::*;
use serde::Serialize;

use crate::triggers::ZoneEventSink;
use crate::zones::ZoneId;

const MAX_EVENTS: usize = 500;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ZoneEventKind {
    Enter,
    Exit,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ZoneEvent {
    pub kind: ZoneEventKind,
    pub zone_id: ZoneId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_key: Option<String>,
    pub frame: u64,
}

/// Frame-stamped queue of zone transitions for the content layer to drain.
#[derive(Resource, Default)]
pub struct GameEventBus {
    pub recent: VecDeque<ZoneEvent>,
    pub frame: u64,
    pub dropped_events: u64,
    last_overflow_log_frame: u64,
}

impl GameEventBus {
    pub fn emit(&mut self, kind: ZoneEventKind, zone_id: ZoneId, content_key: Option<String>) {
        self.recent.push_back(ZoneEvent {
            kind,
            zone_id,
            content_key,
            frame: self.frame,
        });
        if self.recent.len() > MAX_EVENTS {
            let excess = self.recent.len() - MAX_EVENTS;
            for _ in 0..excess {
                self.recent.pop_front();
            }
            self.dropped_events = self.dropped_events.saturating_add(excess as u64);
            if self.frame.saturating_sub(self.last_overflow_log_frame) >= 60 {
                self.last_overflow_log_frame = self.frame;
                warn!(
                    "[World events] Dropped {} buffered events (total dropped: {})",
                    excess, self.dropped_events
                );
            }
        }
    }

    /// Hand every buffered event to the consumer, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = ZoneEvent> + '_ {
        self.recent.drain(..)
    }
}

impl ZoneEventSink for GameEventBus {
    fn on_zone_enter(&mut self, zone_id: ZoneId, content_key: &str) {
        info!("[World events] Entered zone {zone_id} ({content_key})");
        self.emit(ZoneEventKind::Enter, zone_id, Some(content_key.to_string()));
    }

    fn on_zone_exit(&mut self, zone_id: ZoneId) {
        info!("[World events] Left zone {zone_id}");
        self.emit(ZoneEventKind::Exit, zone_id, None);
    }
}

pub struct GameEventsPlugin;

impl Plugin for GameEventsPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(GameEventBus::default())
            .add_systems(FixedUpdate, tick_event_frame);
    }
}

/// Advances the bus frame once per simulation tick, independent of scene reloads.
pub fn tick_event_frame(mut bus: ResMut<GameEventBus>) {
    bus.frame = bus.frame.saturating_add(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_bus_tracks_dropped_events() {
        let mut bus = GameEventBus::default();
        for i in 0..(MAX_EVENTS + 25) {
            bus.emit(ZoneEventKind::Enter, i as ZoneId, None);
        }
        assert_eq!(bus.recent.len(), MAX_EVENTS);
        assert!(bus.dropped_events >= 25);
        assert_eq!(bus.recent.front().map(|e| e.zone_id), Some(25));
    }

    #[test]
    fn sink_calls_are_stamped_with_the_current_frame() {
        let mut bus = GameEventBus {
            frame: 7,
            ..Default::default()
        };
        bus.on_zone_enter(2, "fest-2");
        bus.frame = 9;
        bus.on_zone_exit(2);

        let events: Vec<_> = bus.drain().collect();
        assert_eq!(
            events,
            vec![
                ZoneEvent {
                    kind: ZoneEventKind::Enter,
                    zone_id: 2,
                    content_key: Some("fest-2".into()),
                    frame: 7,
                },
                ZoneEvent {
                    kind: ZoneEventKind::Exit,
                    zone_id: 2,
                    content_key: None,
                    frame: 9,
                },
            ]
        );
        assert!(bus.recent.is_empty());
        assert_eq!(
            serde_json::to_value(&events[1]).unwrap(),
            serde_json::json!({ "kind": "exit", "zone_id": 2, "frame": 9 })
        );
    }
}
