use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Overlap-amount difference below which the collision axis is considered
/// ambiguous and the center-separation tie-break kicks in.
pub const AXIS_EPSILON: f32 = 0.1;

/// Axis-aligned bounding box, stored as min corner + extent. Coordinates are
/// y-up; a "top surface" is the +Y face.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub size: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, size: Vec2) -> Self {
        Self { min, size }
    }

    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self { min: center - size * 0.5, size }
    }

    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    pub fn center(&self) -> Vec2 {
        self.min + self.size * 0.5
    }

    pub fn half_extents(&self) -> Vec2 {
        self.size * 0.5
    }

    /// A zero- or negative-area box. Degenerate boxes never overlap anything.
    pub fn is_degenerate(&self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    /// Strict interval overlap on both axes. Touching edges do not collide.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        if self.is_degenerate() || other.is_degenerate() {
            return false;
        }
        let a_max = self.max();
        let b_max = other.max();
        self.min.x < b_max.x
            && a_max.x > other.min.x
            && self.min.y < b_max.y
            && a_max.y > other.min.y
    }
}

/// Narrow-phase result for a pair of boxes.
///
/// `normal` has exactly one nonzero component in {-1, +1} for a colliding
/// pair and is the direction that pushes `a` out of `b`: its sign on the
/// resolved axis is the sign of `a.center() - b.center()`.
#[derive(Clone, Copy, Debug, Default)]
pub struct CollisionInfo {
    pub colliding: bool,
    /// Per-axis overlap amounts, both positive for a colliding pair.
    pub overlap: Vec2,
    pub normal: Vec2,
}

/// Overlap amounts and the resolved one-axis normal for `a` against `b`.
///
/// The collision axis is the one with the strictly smaller overlap. When the
/// overlaps are within [`AXIS_EPSILON`] of each other (a body wedged into a
/// corner), the axis choice would flip-flop frame to frame, so the tie-break
/// compares center-to-center separation instead and resolves along the axis
/// of larger separation. At exactly equal separations X wins.
pub fn collision_info(a: &Aabb, b: &Aabb) -> CollisionInfo {
    if !a.overlaps(b) {
        return CollisionInfo::default();
    }

    let overlap_x = (a.max().x - b.min.x).min(b.max().x - a.min.x);
    let overlap_y = (a.max().y - b.min.y).min(b.max().y - a.min.y);
    let sep = a.center() - b.center();

    let resolve_x = if (overlap_x - overlap_y).abs() <= AXIS_EPSILON {
        sep.x.abs() >= sep.y.abs()
    } else {
        overlap_x < overlap_y
    };

    let normal = if resolve_x {
        Vec2::new(if sep.x >= 0.0 { 1.0 } else { -1.0 }, 0.0)
    } else {
        Vec2::new(0.0, if sep.y >= 0.0 { 1.0 } else { -1.0 })
    };

    CollisionInfo {
        colliding: true,
        overlap: Vec2::new(overlap_x, overlap_y),
        normal,
    }
}

/// Time-of-impact result for a moving box against a stationary one.
///
/// `time` is in [0, 1] relative to the frame displacement. A miss (or zero
/// displacement) degenerates to `will_collide = false, time = 1.0` — full,
/// unimpeded movement. Boxes already overlapping report an immediate impact.
#[derive(Clone, Copy, Debug)]
pub struct SweptCollisionInfo {
    pub will_collide: bool,
    pub time: f32,
    pub point: Vec2,
    pub normal: Vec2,
}

impl Default for SweptCollisionInfo {
    fn default() -> Self {
        Self {
            will_collide: false,
            time: 1.0,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
        }
    }
}

/// Slab-method swept test: the moving box collapses to a point ray from its
/// center and `target` is expanded by the mover's half-extents (the Minkowski
/// sum), so ray-enters-box is exactly boxes-start-overlapping.
///
/// `displacement` is the full movement for the frame (velocity × dt).
pub fn swept_collision(moving: &Aabb, displacement: Vec2, target: &Aabb) -> SweptCollisionInfo {
    if moving.is_degenerate() || target.is_degenerate() {
        return SweptCollisionInfo::default();
    }

    if moving.overlaps(target) {
        let info = collision_info(moving, target);
        return SweptCollisionInfo {
            will_collide: true,
            time: 0.0,
            point: moving.center(),
            normal: info.normal,
        };
    }

    if displacement.length_squared() < f32::EPSILON {
        return SweptCollisionInfo::default();
    }

    let origin = moving.center();
    let expanded = Aabb {
        min: target.min - moving.half_extents(),
        size: target.size + moving.size,
    };
    let lo = expanded.min;
    let hi = expanded.max();

    let mut t_entry = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    let mut normal = Vec2::ZERO;

    for axis in 0..2 {
        let o = origin[axis];
        let d = displacement[axis];
        if d == 0.0 {
            // Parallel to the slab: either always inside it or never.
            if o <= lo[axis] || o >= hi[axis] {
                return SweptCollisionInfo::default();
            }
            continue;
        }
        let mut t1 = (lo[axis] - o) / d;
        let mut t2 = (hi[axis] - o) / d;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }
        if t1 > t_entry {
            t_entry = t1;
            normal = match axis {
                0 => Vec2::new(-d.signum(), 0.0),
                _ => Vec2::new(0.0, -d.signum()),
            };
        }
        t_exit = t_exit.min(t2);
    }

    if t_entry > t_exit || t_entry >= 1.0 || t_exit <= 0.0 {
        return SweptCollisionInfo::default();
    }

    let time = t_entry.clamp(0.0, 1.0);
    SweptCollisionInfo {
        will_collide: true,
        time,
        point: origin + displacement * time,
        normal,
    }
}
