use crate::physics_core::Aabb;
use crate::zones::{ZoneId, ZoneRegistry};

/// Receives zone transitions. Implemented by whatever opens the content view.
pub trait ZoneEventSink {
    fn on_zone_enter(&mut self, zone_id: ZoneId, content_key: &str);
    fn on_zone_exit(&mut self, zone_id: ZoneId);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct TriggerState {
    overlapping: bool,
}

/// Tracks avatar/zone overlap per zone and reports transitions to a sink.
///
/// Edge-triggered: one enter per transition into a zone. Level-triggered: an
/// enter on every overlapping tick. Both report a single exit on leaving.
#[derive(Clone, Debug)]
pub struct TriggerDispatcher {
    edge_triggered: bool,
    /// Parallel to the registry's zone order.
    states: Vec<TriggerState>,
}

impl TriggerDispatcher {
    pub fn new(zones: &ZoneRegistry, edge_triggered: bool) -> Self {
        Self {
            edge_triggered,
            states: vec![TriggerState::default(); zones.len()],
        }
    }

    pub fn update(&mut self, avatar: &Aabb, zones: &ZoneRegistry, sink: &mut dyn ZoneEventSink) {
        if self.states.len() != zones.len() {
            self.states.resize(zones.len(), TriggerState::default());
        }
        for (zone, state) in zones.iter().zip(self.states.iter_mut()) {
            let now = zone.overlaps(avatar);
            match (state.overlapping, now) {
                (false, true) => sink.on_zone_enter(zone.id, &zone.content_key),
                (true, true) if !self.edge_triggered => {
                    sink.on_zone_enter(zone.id, &zone.content_key)
                }
                (true, false) => sink.on_zone_exit(zone.id),
                _ => {}
            }
            state.overlapping = now;
        }
    }

    pub fn is_overlapping(&self, zones: &ZoneRegistry, zone_id: ZoneId) -> bool {
        zones
            .index_of(zone_id)
            .and_then(|idx| self.states.get(idx))
            .is_some_and(|s| s.overlapping)
    }
}
