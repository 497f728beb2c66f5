use bevy::math::Vec2;

use crate::tilemap::CollisionGrid;

/// Gap kept between a blocked box and the cell it ran into.
const CONTACT_EPSILON: f32 = 0.01;

/// Axis-aligned box in map pixel space (y down).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Aabb {
    pub fn from_top_left(position: Vec2, size: Vec2) -> Self {
        Self {
            min_x: position.x,
            min_y: position.y,
            max_x: position.x + size.x,
            max_y: position.y + size.y,
        }
    }

    /// Strict overlap: boxes that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.max_x > other.min_x
            && self.min_x < other.max_x
            && self.max_y > other.min_y
            && self.min_y < other.max_y
    }

    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x.clamp(self.min_x, self.max_x), p.y.clamp(self.min_y, self.max_y))
    }
}

/// Inclusive cell range covered by `aabb`. The max edge is pulled in slightly so a box
/// sitting flush against a cell boundary does not count the next cell.
fn covered_cells(aabb: &Aabb, cell_size: f32) -> (i32, i32, i32, i32) {
    let min_tx = (aabb.min_x / cell_size).floor() as i32;
    let max_tx = ((aabb.max_x - CONTACT_EPSILON) / cell_size).floor() as i32;
    let min_ty = (aabb.min_y / cell_size).floor() as i32;
    let max_ty = ((aabb.max_y - CONTACT_EPSILON) / cell_size).floor() as i32;
    (min_tx, max_tx, min_ty, max_ty)
}

pub fn collides_solid(grid: &CollisionGrid, aabb: &Aabb) -> bool {
    let (min_tx, max_tx, min_ty, max_ty) = covered_cells(aabb, grid.cell_size());
    for ty in min_ty..=max_ty {
        for tx in min_tx..=max_tx {
            if grid.is_solid(tx, ty) {
                return true;
            }
        }
    }
    false
}

#[derive(Clone, Copy, Debug)]
pub struct MotionParams {
    /// Top-left of the moving box.
    pub position: Vec2,
    pub size: Vec2,
    pub delta: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionResult {
    pub position: Vec2,
    pub blocked_x: bool,
    pub blocked_y: bool,
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
}

/// Move a box through the grid, resolving X then Y independently so a blocked
/// axis still lets the other one slide along the wall.
///
/// The displacement is split into sub-steps no longer than half a cell, so a
/// single call never skips over a one-cell obstacle.
pub fn resolve_motion(grid: &CollisionGrid, params: MotionParams) -> MotionResult {
    let MotionParams {
        position,
        size,
        delta,
    } = params;
    let max_step_len = grid.cell_size() * 0.5;
    let max_component = delta.x.abs().max(delta.y.abs());
    let steps = if max_component > 0.0 {
        (max_component / max_step_len).ceil().max(1.0) as u32
    } else {
        1
    };
    let step = delta / steps as f32;

    let mut out = MotionResult {
        position,
        blocked_x: false,
        blocked_y: false,
    };
    for _ in 0..steps {
        if step.x != 0.0 && !out.blocked_x {
            let (x, blocked) = resolve_axis(grid, out.position, size, step.x, Axis::X);
            out.position.x = x;
            out.blocked_x = blocked;
        }
        if step.y != 0.0 && !out.blocked_y {
            let (y, blocked) = resolve_axis(grid, out.position, size, step.y, Axis::Y);
            out.position.y = y;
            out.blocked_y = blocked;
        }
    }
    out
}

/// Returns the new coordinate along `axis` and whether the move was blocked.
fn resolve_axis(grid: &CollisionGrid, position: Vec2, size: Vec2, d: f32, axis: Axis) -> (f32, bool) {
    let ts = grid.cell_size();
    let (current, extent) = match axis {
        Axis::X => (position.x, size.x),
        Axis::Y => (position.y, size.y),
    };
    let target = current + d;
    let candidate = match axis {
        Axis::X => Aabb::from_top_left(Vec2::new(target, position.y), size),
        Axis::Y => Aabb::from_top_left(Vec2::new(position.x, target), size),
    };
    if !collides_solid(grid, &candidate) {
        return (target, false);
    }

    let (min_edge, max_edge) = match axis {
        Axis::X => (candidate.min_x, candidate.max_x),
        Axis::Y => (candidate.min_y, candidate.max_y),
    };
    // Snap flush against the cell that was entered, but never backwards.
    let snapped = if d > 0.0 {
        let tile = ((max_edge - CONTACT_EPSILON) / ts).floor();
        let edge = tile * ts - extent - CONTACT_EPSILON;
        if edge > current { edge } else { current }
    } else {
        let tile = (min_edge / ts).floor();
        let edge = (tile + 1.0) * ts;
        if edge < current { edge } else { current }
    };
    (snapped, true)
}
