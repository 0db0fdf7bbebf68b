use std::collections::HashSet;

use glam::Vec2;
use hecs::Entity;
use serde::{Deserialize, Serialize};

use crate::geometry::{Aabb, CollisionInfo, SweptCollisionInfo};

mod character;
mod combat;

pub use character::{
    AiState, DashState, EnemyAi, Facing, JumpPhase, JumpState, MovementState, SprintState,
    WallState,
};
pub use combat::{AttackKind, HitEvent, Hitbox, Hurtbox};

/// Collision layer names used by the prefab factory.
pub mod layer {
    pub const TERRAIN: &str = "terrain";
    pub const PLAYER: &str = "player";
    pub const ENEMY: &str = "enemy";
    pub const PROJECTILE: &str = "projectile";
}

/// Spatial position: the logical center of the entity in world space.
/// Mutated by the integrator and by collision resolution.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct LocalTransform {
    pub position: Vec2,
}

impl LocalTransform {
    pub fn new(position: Vec2) -> Self {
        Self { position }
    }
}

/// Linear velocity in units/second.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Velocity(pub Vec2);

/// Marker: entity gets gravity during integration. The controlled character
/// is **not** given this — its movement machine owns gravity so it can be
/// suppressed entirely while grounded.
pub struct GravityAffected;

/// Collision volume attached to an entity. `aabb()` converts the center-based
/// position (plus local offset) into a min-corner box.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollisionShape {
    pub size: Vec2,
    /// Local offset from the entity's transform.
    pub offset: Vec2,
    /// Detect-only: produces contacts but is never resolved against.
    pub is_trigger: bool,
    /// Never moved by resolution.
    pub is_static: bool,
    pub layer: String,
    /// Free-form tags for filtering (e.g. `one_way` platforms).
    pub tags: HashSet<String>,
}

impl CollisionShape {
    pub fn solid(size: Vec2, layer: &str) -> Self {
        Self {
            size,
            offset: Vec2::ZERO,
            is_trigger: false,
            is_static: false,
            layer: layer.to_string(),
            tags: HashSet::new(),
        }
    }

    pub fn fixed(size: Vec2, layer: &str) -> Self {
        Self {
            is_static: true,
            ..Self::solid(size, layer)
        }
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.insert(tag.to_string());
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn aabb(&self, position: Vec2) -> Aabb {
        Aabb::from_center(position + self.offset, self.size)
    }
}

/// Candidate pair emitted by the collision engine. `entity_a` is the moving
/// body the contact was generated for; `info.normal` pushes it out of
/// `entity_b`. No resolution has been applied.
pub struct Contact {
    pub entity_a: Entity,
    pub entity_b: Entity,
    pub info: CollisionInfo,
    /// Time-of-impact along `entity_a`'s next displacement, present when it
    /// was moving. Diagnostic — resolution stays discrete.
    pub swept: Option<SweptCollisionInfo>,
}
