use hecs::World;

use super::player::MovementConfig;
use crate::components::{GravityAffected, LocalTransform, MovementState, Velocity};
use crate::engine::time::TICK_DT;

/// Integrate velocities into positions for the tick.
///
/// Plain dynamic bodies (enemies, dropped projectiles) get gravity here,
/// clamped to terminal velocity. The controlled character is excluded: its
/// movement machine owns gravity so it can be suppressed while grounded
/// instead of fighting resolution every frame.
///
/// Semi-implicit Euler: velocity first, then position.
pub fn physics_system(world: &mut World, config: &MovementConfig) {
    for (_entity, (transform, vel, gravity, movement)) in world.query_mut::<(
        &mut LocalTransform,
        &mut Velocity,
        Option<&GravityAffected>,
        Option<&MovementState>,
    )>() {
        if gravity.is_some() && movement.is_none() {
            vel.0.y = (vel.0.y - config.gravity * TICK_DT).max(-config.terminal_velocity);
        }
        transform.position += vel.0 * TICK_DT;
    }
}
