use glam::Vec2;
use hecs::{Entity, World};

use crate::components::{
    layer, AttackKind, CollisionShape, EnemyAi, GravityAffected, Hitbox, Hurtbox, LocalTransform,
    MovementState, Velocity,
};
use crate::systems::{MovementConfig, ONE_WAY_TAG};

// ---------------------------------------------------------------------------
// Prefab tuning
// ---------------------------------------------------------------------------

const PLAYER_SIZE: Vec2 = Vec2::new(16.0, 24.0);
const PLAYER_HEALTH: f32 = 100.0;

const ENEMY_SIZE: Vec2 = Vec2::new(18.0, 22.0);
const ENEMY_HEALTH: f32 = 40.0;
const ENEMY_DEFENSE: f32 = 2.0;

// Player slash: a short forward arc.
const SLASH_SIZE: Vec2 = Vec2::new(22.0, 18.0);
const SLASH_OFFSET: Vec2 = Vec2::new(16.0, 2.0);
const SLASH_DAMAGE: f32 = 10.0;
const SLASH_KNOCKBACK: f32 = 260.0;
const SLASH_FRAMES: u32 = 6;
const SLASH_CRIT_CHANCE: f32 = 0.15;

// Enemy swipe: slower, heavier.
const SWIPE_SIZE: Vec2 = Vec2::new(20.0, 16.0);
const SWIPE_OFFSET: Vec2 = Vec2::new(14.0, 0.0);
const SWIPE_DAMAGE: f32 = 8.0;
const SWIPE_KNOCKBACK: f32 = 320.0;
const SWIPE_FRAMES: u32 = 8;

const BOLT_SIZE: Vec2 = Vec2::new(8.0, 4.0);
const BOLT_SPEED: f32 = 420.0;
const BOLT_DAMAGE: f32 = 6.0;
const BOLT_KNOCKBACK: f32 = 180.0;
const BOLT_LIFETIME_FRAMES: u32 = 90;

// ---------------------------------------------------------------------------
// Factories
// ---------------------------------------------------------------------------

/// The controlled character. No `GravityAffected`: the movement machine owns
/// gravity so it can be suppressed while grounded.
pub fn spawn_player(world: &mut World, position: Vec2, config: &MovementConfig) -> Entity {
    world.spawn((
        LocalTransform::new(position),
        Velocity(Vec2::ZERO),
        CollisionShape::solid(PLAYER_SIZE, layer::PLAYER),
        MovementState::new(config.sprint_max_stamina),
        Hurtbox::new(PLAYER_HEALTH, PLAYER_SIZE),
    ))
}

/// Static terrain: floors, walls, ceilings.
pub fn spawn_platform(world: &mut World, center: Vec2, size: Vec2) -> Entity {
    world.spawn((
        LocalTransform::new(center),
        CollisionShape::fixed(size, layer::TERRAIN),
    ))
}

/// A platform that only catches bodies falling onto its top face.
pub fn spawn_one_way_platform(world: &mut World, center: Vec2, size: Vec2) -> Entity {
    world.spawn((
        LocalTransform::new(center),
        CollisionShape::fixed(size, layer::TERRAIN).with_tag(ONE_WAY_TAG),
    ))
}

/// A patrolling enemy with a damageable body.
pub fn spawn_enemy(world: &mut World, position: Vec2, patrol_range: f32) -> Entity {
    world.spawn((
        LocalTransform::new(position),
        Velocity(Vec2::ZERO),
        GravityAffected,
        CollisionShape::solid(ENEMY_SIZE, layer::ENEMY),
        Hurtbox::new(ENEMY_HEALTH, ENEMY_SIZE).with_defense(ENEMY_DEFENSE),
        EnemyAi::new(position.x, patrol_range),
    ))
}

/// The player's forward slash. Position is synced to the owner (offset
/// mirrored by facing) before any overlap test runs.
pub fn spawn_melee_attack(world: &mut World, owner: Entity) -> Entity {
    let position = world
        .get::<&LocalTransform>(owner)
        .map(|t| t.position)
        .unwrap_or(Vec2::ZERO);
    world.spawn((
        LocalTransform::new(position),
        Hitbox::new(owner, AttackKind::Melee, SLASH_SIZE, SLASH_DAMAGE)
            .with_offset(SLASH_OFFSET)
            .with_duration(SLASH_FRAMES)
            .with_knockback(SLASH_KNOCKBACK)
            .with_crit_chance(SLASH_CRIT_CHANCE),
    ))
}

/// Downward thrust for bouncing off targets below while airborne.
pub fn spawn_pogo_attack(world: &mut World, owner: Entity) -> Entity {
    let position = world
        .get::<&LocalTransform>(owner)
        .map(|t| t.position)
        .unwrap_or(Vec2::ZERO);
    world.spawn((
        LocalTransform::new(position),
        Hitbox::new(owner, AttackKind::Pogo, Vec2::new(18.0, 14.0), SLASH_DAMAGE)
            .with_offset(Vec2::new(0.0, -16.0))
            .with_duration(SLASH_FRAMES)
            .with_knockback(SLASH_KNOCKBACK)
            .with_crit_chance(SLASH_CRIT_CHANCE),
    ))
}

/// Overhead arc for clearing targets above.
pub fn spawn_upward_attack(world: &mut World, owner: Entity) -> Entity {
    let position = world
        .get::<&LocalTransform>(owner)
        .map(|t| t.position)
        .unwrap_or(Vec2::ZERO);
    world.spawn((
        LocalTransform::new(position),
        Hitbox::new(owner, AttackKind::Upward, Vec2::new(18.0, 16.0), SLASH_DAMAGE)
            .with_offset(Vec2::new(0.0, 18.0))
            .with_duration(SLASH_FRAMES)
            .with_knockback(SLASH_KNOCKBACK)
            .with_crit_chance(SLASH_CRIT_CHANCE),
    ))
}

/// An enemy's close-range swipe.
pub fn spawn_enemy_swipe(world: &mut World, owner: Entity) -> Entity {
    let position = world
        .get::<&LocalTransform>(owner)
        .map(|t| t.position)
        .unwrap_or(Vec2::ZERO);
    world.spawn((
        LocalTransform::new(position),
        Hitbox::new(owner, AttackKind::Melee, SWIPE_SIZE, SWIPE_DAMAGE)
            .with_offset(SWIPE_OFFSET)
            .with_duration(SWIPE_FRAMES)
            .with_knockback(SWIPE_KNOCKBACK),
    ))
}

/// A straight bolt. Collides with terrain like any small solid body; as a
/// single-use hitbox it is spent on its first successful hit.
pub fn spawn_projectile(world: &mut World, owner: Entity, position: Vec2, dir: Vec2) -> Entity {
    let dir = if dir.length_squared() > 0.0 {
        dir.normalize()
    } else {
        Vec2::X
    };
    world.spawn((
        LocalTransform::new(position),
        Velocity(dir * BOLT_SPEED),
        CollisionShape::solid(BOLT_SIZE, layer::PROJECTILE),
        Hitbox::new(owner, AttackKind::Projectile, BOLT_SIZE, BOLT_DAMAGE)
            .with_duration(BOLT_LIFETIME_FRAMES)
            .with_knockback(BOLT_KNOCKBACK),
    ))
}
