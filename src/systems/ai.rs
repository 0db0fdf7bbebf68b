use hecs::{Entity, World};

use crate::components::{AiState, EnemyAi, Facing, LocalTransform, MovementState, Velocity};

/// Hysteresis factor on the detection radius so the patrol/chase machine
/// doesn't flicker when the player hovers right at the boundary.
const LOSE_SIGHT_FACTOR: f32 = 1.25;
/// Frames between swipes while a target stays in range.
const SWIPE_COOLDOWN_FRAMES: u32 = 45;

/// Drive every enemy's patrol/chase machine for one tick.
///
/// Writes horizontal velocity and facing only — gravity and contact
/// resolution treat enemies as plain dynamic bodies. Returns the swipe
/// attacks requested this tick; the driver turns them into hitbox entities
/// through the prefab factory.
pub fn ai_system(world: &mut World) -> Vec<(Entity, Facing)> {
    let player_pos = world
        .query::<(&LocalTransform, &MovementState)>()
        .iter()
        .next()
        .map(|(_, (transform, _))| transform.position);

    let mut swipes = Vec::new();

    for (entity, (ai, transform, vel)) in
        world.query_mut::<(&mut EnemyAi, &LocalTransform, &mut Velocity)>()
    {
        ai.attack_cooldown.tick();
        ai.fsm.tick();

        let to_player = player_pos.map(|p| p - transform.position);

        let next = match ai.fsm.state {
            AiState::Patrol => to_player
                .filter(|d| d.length() < ai.detection_range)
                .map(|_| AiState::Chase),
            AiState::Chase => match to_player {
                Some(d) if d.length() <= ai.detection_range * LOSE_SIGHT_FACTOR => None,
                _ => Some(AiState::Patrol),
            },
        };
        if let Some(next) = next {
            ai.fsm.go(next);
        }

        match ai.fsm.state {
            AiState::Patrol => {
                let x = transform.position.x;
                if x > ai.patrol_origin + ai.patrol_range {
                    ai.patrol_dir = -1.0;
                } else if x < ai.patrol_origin - ai.patrol_range {
                    ai.patrol_dir = 1.0;
                } else if vel.0.x == 0.0 && ai.fsm.frames_in_state > 1 {
                    // A wall zeroed us out last tick: turn around.
                    ai.patrol_dir = -ai.patrol_dir;
                }
                vel.0.x = ai.patrol_dir * ai.move_speed * 0.5;
                ai.facing = Facing::from_sign(ai.patrol_dir);
            }
            AiState::Chase => {
                if let Some(d) = to_player {
                    let dir = if d.x < 0.0 { -1.0 } else { 1.0 };
                    vel.0.x = dir * ai.move_speed;
                    ai.facing = Facing::from_sign(dir);
                    if d.x.abs() <= ai.attack_range
                        && d.y.abs() <= ai.attack_range
                        && ai.attack_cooldown.finished()
                    {
                        ai.attack_cooldown.arm(SWIPE_COOLDOWN_FRAMES);
                        swipes.push((entity, ai.facing));
                    }
                }
            }
        }

        if ai.fsm.just_entered() {
            log::debug!(
                "enemy {entity:?}: {:?} -> {:?}",
                ai.fsm.previous,
                ai.fsm.state
            );
        }
    }

    swipes
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn spawn_enemy(world: &mut World, x: f32) -> Entity {
        world.spawn((
            LocalTransform::new(Vec2::new(x, 0.0)),
            Velocity(Vec2::ZERO),
            EnemyAi::new(x, 60.0),
        ))
    }

    fn spawn_player(world: &mut World, pos: Vec2) -> Entity {
        world.spawn((
            LocalTransform::new(pos),
            Velocity(Vec2::ZERO),
            MovementState::new(100.0),
        ))
    }

    #[test]
    fn patrol_turns_at_the_bounds() {
        let mut world = World::new();
        let enemy = spawn_enemy(&mut world, 0.0);

        ai_system(&mut world);
        assert!(world.get::<&Velocity>(enemy).unwrap().0.x > 0.0);

        // Past the right bound: direction flips.
        world.get::<&mut LocalTransform>(enemy).unwrap().position.x = 61.0;
        ai_system(&mut world);
        assert!(world.get::<&Velocity>(enemy).unwrap().0.x < 0.0);
        assert_eq!(world.get::<&EnemyAi>(enemy).unwrap().facing, Facing::Left);
    }

    #[test]
    fn chase_starts_in_range_and_stops_with_hysteresis() {
        let mut world = World::new();
        let enemy = spawn_enemy(&mut world, 0.0);
        let player = spawn_player(&mut world, Vec2::new(150.0, 0.0));

        ai_system(&mut world);
        assert_eq!(world.get::<&EnemyAi>(enemy).unwrap().fsm.state, AiState::Chase);
        assert!(world.get::<&Velocity>(enemy).unwrap().0.x > 0.0);

        // Inside the hysteresis band: still chasing.
        world.get::<&mut LocalTransform>(player).unwrap().position.x = 200.0;
        ai_system(&mut world);
        assert_eq!(world.get::<&EnemyAi>(enemy).unwrap().fsm.state, AiState::Chase);

        // Beyond it: back to patrol.
        world.get::<&mut LocalTransform>(player).unwrap().position.x = 300.0;
        ai_system(&mut world);
        assert_eq!(world.get::<&EnemyAi>(enemy).unwrap().fsm.state, AiState::Patrol);
    }

    #[test]
    fn swipes_in_range_respect_the_cooldown() {
        let mut world = World::new();
        let enemy = spawn_enemy(&mut world, 0.0);
        spawn_player(&mut world, Vec2::new(30.0, 0.0));

        let swipes = ai_system(&mut world);
        assert_eq!(swipes, vec![(enemy, Facing::Right)]);

        // Cooldown suppresses the follow-up.
        assert!(ai_system(&mut world).is_empty());
    }
}
