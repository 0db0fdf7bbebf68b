use std::collections::HashSet;

use glam::Vec2;
use hecs::Entity;
use serde::{Deserialize, Serialize};

use crate::geometry::Aabb;
use crate::timer::Countdown;

/// Attack families. The family decides whether the volume rides its owner
/// and whether it is spent on the first successful hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackKind {
    Melee,
    Pogo,
    Upward,
    Projectile,
}

impl AttackKind {
    /// Owner-following kinds are re-synced to the attacker every frame;
    /// projectiles move under their own velocity.
    pub fn follows_owner(self) -> bool {
        !matches!(self, AttackKind::Projectile)
    }

    /// Single-use kinds deactivate after their first successful hit.
    pub fn single_use(self) -> bool {
        matches!(self, AttackKind::Projectile)
    }
}

/// An attack's damage-dealing volume, spawned as its own entity with a
/// `LocalTransform`. Active for `duration` frames, then culled by the driver.
pub struct Hitbox {
    pub size: Vec2,
    /// Attacker-relative offset, mirrored by the owner's facing for
    /// owner-following kinds.
    pub offset: Vec2,
    pub damage: f32,
    pub owner: Entity,
    pub active: bool,
    pub kind: AttackKind,
    pub duration: Countdown,
    pub knockback: f32,
    pub crit_chance: f32,
    /// Hurtbox owners this instance has already damaged. One hitbox never
    /// hits the same target twice, no matter how long they stay overlapped.
    pub already_hit: HashSet<Entity>,
}

impl Hitbox {
    pub fn new(owner: Entity, kind: AttackKind, size: Vec2, damage: f32) -> Self {
        Self {
            size,
            offset: Vec2::ZERO,
            damage,
            owner,
            active: true,
            kind,
            duration: Countdown::armed(1),
            knockback: 0.0,
            crit_chance: 0.0,
            already_hit: HashSet::new(),
        }
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_duration(mut self, frames: u32) -> Self {
        self.duration = Countdown::armed(frames);
        self
    }

    pub fn with_knockback(mut self, force: f32) -> Self {
        self.knockback = force;
        self
    }

    pub fn with_crit_chance(mut self, chance: f32) -> Self {
        self.crit_chance = chance.clamp(0.0, 1.0);
        self
    }

    pub fn aabb(&self, position: Vec2) -> Aabb {
        Aabb::from_center(position, self.size)
    }
}

/// A character's damage-receiving volume. Lives directly on its owner entity,
/// so position sync with the owner is the shared transform.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Hurtbox {
    pub size: Vec2,
    pub offset: Vec2,
    pub max_health: f32,
    pub health: f32,
    pub defense: f32,
    pub invincibility: Countdown,
}

impl Hurtbox {
    pub fn new(max_health: f32, size: Vec2) -> Self {
        Self {
            size,
            offset: Vec2::ZERO,
            max_health,
            health: max_health,
            defense: 0.0,
            invincibility: Countdown::default(),
        }
    }

    pub fn with_defense(mut self, defense: f32) -> Self {
        self.defense = defense;
        self
    }

    pub fn vulnerable(&self) -> bool {
        self.invincibility.finished()
    }

    pub fn alive(&self) -> bool {
        self.health > 0.0
    }

    /// Clamped damage application. Returns the amount actually dealt.
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        let actual = amount.min(self.health).max(0.0);
        self.health -= actual;
        actual
    }

    pub fn aabb(&self, position: Vec2) -> Aabb {
        Aabb::from_center(position + self.offset, self.size)
    }
}

/// One successful hit, reported to the caller for logging and presentation.
#[derive(Clone, Copy, Debug)]
pub struct HitEvent {
    pub attacker: Entity,
    pub target: Entity,
    pub damage: f32,
    pub crit: bool,
    pub lethal: bool,
}
