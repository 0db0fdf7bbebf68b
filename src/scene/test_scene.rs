use glam::Vec2;
use hecs::{Entity, World};

use super::prefabs;
use crate::systems::MovementConfig;

/// A small arena exercising every body kind: solid floor and walls, two
/// hovering platforms, a one-way platform, the player, and a patrolling
/// enemy. Returns the player entity.
pub fn load_test_scene(world: &mut World, config: &MovementConfig) -> Entity {
    // Floor: top face at y = 0.
    prefabs::spawn_platform(world, Vec2::new(0.0, -16.0), Vec2::new(960.0, 32.0));

    // Arena walls.
    prefabs::spawn_platform(world, Vec2::new(-480.0, 120.0), Vec2::new(32.0, 320.0));
    prefabs::spawn_platform(world, Vec2::new(480.0, 120.0), Vec2::new(32.0, 320.0));

    // Hovering platforms.
    prefabs::spawn_platform(world, Vec2::new(160.0, 80.0), Vec2::new(120.0, 16.0));
    prefabs::spawn_platform(world, Vec2::new(-200.0, 140.0), Vec2::new(120.0, 16.0));
    prefabs::spawn_one_way_platform(world, Vec2::new(0.0, 60.0), Vec2::new(120.0, 10.0));

    let player = prefabs::spawn_player(world, Vec2::new(-60.0, 40.0), config);
    prefabs::spawn_enemy(world, Vec2::new(240.0, 20.0), 120.0);

    player
}
