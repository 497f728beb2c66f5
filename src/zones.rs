use bevy::math::Vec2;

use crate::physics_core::Aabb;

pub type ZoneId = u32;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ZoneShape {
    /// Centered on the zone position.
    Circle { radius: f32 },
    /// Anchored at the zone position (top-left).
    Rect { width: f32, height: f32 },
}

/// A named trigger region from the object layer. Zones never block movement.
#[derive(Clone, Debug, PartialEq)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    pub position: Vec2,
    pub shape: ZoneShape,
    /// Routes the zone to its content (e.g. which festival page to open).
    pub content_key: String,
}

impl Zone {
    pub fn overlaps(&self, aabb: &Aabb) -> bool {
        match self.shape {
            ZoneShape::Circle { radius } => {
                aabb.closest_point(self.position).distance_squared(self.position) <= radius * radius
            }
            ZoneShape::Rect { width, height } => {
                Aabb::from_top_left(self.position, Vec2::new(width, height)).overlaps(aabb)
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ZoneRegistry {
    zones: Vec<Zone>,
}

impl ZoneRegistry {
    pub fn new(zones: Vec<Zone>) -> Self {
        Self { zones }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Zone> {
        self.zones.iter()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn get(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|z| z.id == id)
    }

    pub(crate) fn index_of(&self, id: ZoneId) -> Option<usize> {
        self.zones.iter().position(|z| z.id == id)
    }
}

impl<'a> IntoIterator for &'a ZoneRegistry {
    type Item = &'a Zone;
    type IntoIter = std::slice::Iter<'a, Zone>;

    fn into_iter(self) -> Self::IntoIter {
        self.zones.iter()
    }
}
