use hecs::{Entity, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::components::{HitEvent, Hitbox, MovementState};
use crate::engine::input::{Action, InputState};
use crate::engine::time::FixedStep;
use crate::scene::prefabs;
use crate::systems::{
    ai_system, collision_system, combat_system, physics_system, player_system, resolve_contacts,
    MovementConfig, SpatialHash,
};

/// What one tick did, for the caller's logging and presentation sync.
pub struct TickReport {
    pub contacts: usize,
    pub hits: Vec<HitEvent>,
}

/// The whole simulation: world, frame-buffered input, tuning, seeded RNG and
/// the broadphase scratch structure. One `tick()` advances everything in the
/// fixed order input → movement/AI → integration → collision → resolution →
/// combat, and runs to completion before the next begins.
pub struct Sim {
    pub world: World,
    pub input: InputState,
    pub config: MovementConfig,
    rng: ChaCha8Rng,
    hash: SpatialHash,
    step: FixedStep,
    pub ticks: u64,
}

impl Sim {
    pub fn new(config: MovementConfig, seed: u64) -> Self {
        Self {
            world: World::new(),
            input: InputState::new(),
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
            hash: SpatialHash::default(),
            step: FixedStep::new(),
            ticks: 0,
        }
    }

    /// Advance one fixed tick with the given actions held down.
    pub fn tick(&mut self, actions: &[Action]) -> TickReport {
        self.input.update(actions);

        // Movement intent and AI write velocities first.
        player_system(&mut self.world, &self.input, &self.config);
        let swipes = ai_system(&mut self.world);
        for (owner, _facing) in swipes {
            prefabs::spawn_enemy_swipe(&mut self.world, owner);
        }
        if self.input.just_pressed(Action::Attack) {
            if let Some(player) = self.player() {
                if self.input.is_held(Action::Down) {
                    prefabs::spawn_pogo_attack(&mut self.world, player);
                } else if self.input.is_held(Action::Up) {
                    prefabs::spawn_upward_attack(&mut self.world, player);
                } else {
                    prefabs::spawn_melee_attack(&mut self.world, player);
                }
            }
        }

        // Integrate, then detect and resolve against the fresh positions.
        physics_system(&mut self.world, &self.config);
        let contacts = collision_system(&mut self.world, &mut self.hash);
        for contact in &contacts {
            if let Some(swept) = &contact.swept {
                if swept.will_collide && swept.time > 0.0 {
                    log::trace!(
                        "{:?} impacts {:?} at t={:.2} near {:?}",
                        contact.entity_a,
                        contact.entity_b,
                        swept.time,
                        swept.point
                    );
                }
            }
        }
        resolve_contacts(&mut self.world, &contacts, &self.hash, &self.config);

        let hits = combat_system(&mut self.world, &mut self.rng);

        // Spent volumes are despawned here, between ticks — never mid-frame.
        self.cull_spent_hitboxes();
        self.ticks += 1;

        TickReport {
            contacts: contacts.len(),
            hits,
        }
    }

    /// Real-time host entry point: drains whole ticks from a variable frame
    /// dt, carrying the remainder. Returns how many ticks ran.
    #[allow(dead_code)]
    pub fn advance(&mut self, frame_dt: f32, actions: &[Action]) -> u32 {
        let ticks = self.step.advance(frame_dt);
        for _ in 0..ticks {
            self.tick(actions);
        }
        ticks
    }

    pub fn player(&self) -> Option<Entity> {
        self.world
            .query::<&MovementState>()
            .iter()
            .next()
            .map(|(entity, _)| entity)
    }

    fn cull_spent_hitboxes(&mut self) {
        let spent: Vec<Entity> = self
            .world
            .query::<&Hitbox>()
            .iter()
            .filter(|(_, hitbox)| !hitbox.active)
            .map(|(entity, _)| entity)
            .collect();
        for entity in spent {
            let _ = self.world.despawn(entity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Hurtbox, LocalTransform, Velocity};
    use crate::scene::test_scene::load_test_scene;
    use glam::Vec2;

    fn sim_with_scene() -> (Sim, Entity) {
        let mut sim = Sim::new(MovementConfig::default(), 0x5EED);
        let player = load_test_scene(&mut sim.world, &sim.config.clone());
        (sim, player)
    }

    fn pos(sim: &Sim, entity: Entity) -> Vec2 {
        sim.world.get::<&LocalTransform>(entity).unwrap().position
    }

    fn movement(sim: &Sim, entity: Entity) -> MovementState {
        *sim.world.get::<&MovementState>(entity).unwrap()
    }

    #[test]
    fn the_player_falls_and_comes_to_rest_on_the_floor() {
        let (mut sim, player) = sim_with_scene();

        for _ in 0..120 {
            sim.tick(&[]);
        }

        let movement = movement(&sim, player);
        assert!(movement.grounded);
        assert_eq!(sim.world.get::<&Velocity>(player).unwrap().0.y, 0.0);
        // Feet on the floor top (y = 0): center is half the body height up.
        let y = pos(&sim, player).y;
        assert!((y - 12.0).abs() < 0.5, "resting center was {y}");

        // And stays put: no landing/falling flicker at rest.
        for _ in 0..60 {
            sim.tick(&[]);
            assert!(movement_is_grounded(&sim, player));
        }
    }

    fn movement_is_grounded(sim: &Sim, player: Entity) -> bool {
        sim.world.get::<&MovementState>(player).unwrap().grounded
    }

    #[test]
    fn running_into_a_wall_stops_the_player() {
        let mut sim = Sim::new(MovementConfig::default(), 1);
        prefabs::spawn_platform(&mut sim.world, Vec2::new(0.0, -16.0), Vec2::new(800.0, 32.0));
        prefabs::spawn_platform(&mut sim.world, Vec2::new(300.0, 60.0), Vec2::new(32.0, 120.0));
        let config = sim.config.clone();
        let player = prefabs::spawn_player(&mut sim.world, Vec2::new(0.0, 12.0), &config);

        for _ in 0..200 {
            sim.tick(&[Action::Right, Action::Sprint]);
        }

        let movement = movement(&sim, player);
        assert!(movement.wall.touching_right);
        assert_eq!(sim.world.get::<&Velocity>(player).unwrap().0.x, 0.0);
        // Wall inner face is at x = 284; half the body width back from it.
        let x = pos(&sim, player).x;
        assert!(x <= 276.5, "stopped at {x}");
    }

    #[test]
    fn full_jump_cycle_restores_the_double_jump_only_on_landing() {
        let (mut sim, player) = sim_with_scene();
        for _ in 0..120 {
            sim.tick(&[]);
        }
        assert!(movement(&sim, player).grounded);

        // Ground jump...
        sim.tick(&[Action::Jump]);
        assert!(!movement(&sim, player).grounded);
        assert!(movement(&sim, player).jump.has_double_jump);

        // ...then a double jump mid-air...
        for _ in 0..10 {
            sim.tick(&[Action::Jump]);
        }
        sim.tick(&[]);
        sim.tick(&[Action::Jump]);
        assert!(!movement(&sim, player).jump.has_double_jump);

        // ...and only touching down restores the charge.
        for _ in 0..240 {
            sim.tick(&[]);
            if movement(&sim, player).grounded {
                break;
            }
            assert!(!movement(&sim, player).jump.has_double_jump);
        }
        assert!(movement(&sim, player).grounded, "never landed");
        assert!(movement(&sim, player).jump.has_double_jump);
    }

    #[test]
    fn slashing_the_enemy_costs_it_health_once_per_swing() {
        let mut sim = Sim::new(MovementConfig::default(), 7);
        prefabs::spawn_platform(&mut sim.world, Vec2::new(0.0, -16.0), Vec2::new(400.0, 32.0));
        let config = sim.config.clone();
        let player = prefabs::spawn_player(&mut sim.world, Vec2::new(0.0, 12.0), &config);
        let enemy = prefabs::spawn_enemy(&mut sim.world, Vec2::new(26.0, 12.0), 0.0);
        let start = sim.world.get::<&Hurtbox>(enemy).unwrap().health;

        let first = sim.tick(&[Action::Attack]);
        let mut hits = first.hits.iter().filter(|h| h.target == enemy).count();
        for _ in 0..8 {
            hits += sim.tick(&[]).hits.iter().filter(|h| h.target == enemy).count();
        }
        // The swing overlaps the enemy for several ticks but lands once.
        assert_eq!(hits, 1);
        assert!(sim.world.get::<&Hurtbox>(enemy).unwrap().health < start);
        let _ = player;
    }

    #[test]
    fn identical_seeds_and_input_scripts_stay_in_lockstep() {
        let script = |frame: u32| -> Vec<Action> {
            let mut actions = Vec::new();
            if frame < 200 {
                actions.push(Action::Right);
            }
            if (40..52).contains(&frame) || frame == 90 {
                actions.push(Action::Jump);
            }
            if frame == 130 {
                actions.push(Action::Dash);
            }
            if frame == 170 {
                actions.push(Action::Attack);
            }
            actions
        };

        let (mut a, player_a) = sim_with_scene();
        let (mut b, player_b) = sim_with_scene();
        for frame in 0..300 {
            a.tick(&script(frame));
            b.tick(&script(frame));
        }

        assert_eq!(pos(&a, player_a), pos(&b, player_b));
        let health_a: Vec<f32> = a
            .world
            .query::<&Hurtbox>()
            .iter()
            .map(|(_, h)| h.health)
            .collect();
        let health_b: Vec<f32> = b
            .world
            .query::<&Hurtbox>()
            .iter()
            .map(|(_, h)| h.health)
            .collect();
        assert_eq!(health_a, health_b);
    }
}
