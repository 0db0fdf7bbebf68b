use std::fs;
use std::path::Path;

use glam::Vec2;
use hecs::World;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::{
    CollisionShape, EnemyAi, GravityAffected, Hurtbox, LocalTransform, MovementState, Velocity,
};
use crate::systems::MovementConfig;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Spawn-level record of one entity: everything needed to reconstruct its
/// component state in a fresh world. Transient combat volumes are not
/// captured — entity identity is rebuilt by respawning, so hitboxes holding
/// `Entity` references would dangle anyway.
#[derive(Debug, Serialize, Deserialize)]
pub struct EntityRecord {
    pub position: Vec2,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub velocity: Option<Vec2>,
    #[serde(default)]
    pub gravity: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub shape: Option<CollisionShape>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hurtbox: Option<Hurtbox>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub movement: Option<MovementState>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ai: Option<AiRecord>,
}

/// The spawn parameters of an enemy brain. Live machine state (current
/// FSM phase, cooldown) restarts from scratch.
#[derive(Debug, Serialize, Deserialize)]
pub struct AiRecord {
    pub patrol_origin: f32,
    pub patrol_range: f32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub entities: Vec<EntityRecord>,
}

/// Capture every non-transient entity as a spawn record.
pub fn snapshot(world: &World) -> SceneSnapshot {
    let mut entities = Vec::new();
    for (entity, transform) in world.query::<&LocalTransform>().iter() {
        // Hitbox entities are transient; skip anything that carries one.
        if world.get::<&crate::components::Hitbox>(entity).is_ok() {
            continue;
        }
        entities.push(EntityRecord {
            position: transform.position,
            velocity: world.get::<&Velocity>(entity).ok().map(|v| v.0),
            gravity: world.get::<&GravityAffected>(entity).is_ok(),
            shape: world.get::<&CollisionShape>(entity).ok().map(|s| (*s).clone()),
            hurtbox: world.get::<&Hurtbox>(entity).ok().map(|h| (*h).clone()),
            movement: world.get::<&MovementState>(entity).ok().map(|m| *m),
            ai: world.get::<&EnemyAi>(entity).ok().map(|ai| AiRecord {
                patrol_origin: ai.patrol_origin,
                patrol_range: ai.patrol_range,
            }),
        });
    }
    SceneSnapshot { entities }
}

/// Spawn every record into `world`.
pub fn restore(world: &mut World, snapshot: &SceneSnapshot) {
    for record in &snapshot.entities {
        let entity = world.spawn((LocalTransform::new(record.position),));
        if let Some(velocity) = record.velocity {
            let _ = world.insert_one(entity, Velocity(velocity));
        }
        if record.gravity {
            let _ = world.insert_one(entity, GravityAffected);
        }
        if let Some(shape) = &record.shape {
            let _ = world.insert_one(entity, shape.clone());
        }
        if let Some(hurtbox) = &record.hurtbox {
            let _ = world.insert_one(entity, hurtbox.clone());
        }
        if let Some(movement) = &record.movement {
            let _ = world.insert_one(entity, *movement);
        }
        if let Some(ai) = &record.ai {
            let _ = world.insert_one(entity, EnemyAi::new(ai.patrol_origin, ai.patrol_range));
        }
    }
}

pub fn save_scene(path: &Path, world: &World) -> Result<(), PersistError> {
    let json = serde_json::to_string_pretty(&snapshot(world))?;
    fs::write(path, json)?;
    Ok(())
}

pub fn load_scene(path: &Path, world: &mut World) -> Result<(), PersistError> {
    let snapshot: SceneSnapshot = serde_json::from_str(&fs::read_to_string(path)?)?;
    restore(world, &snapshot);
    Ok(())
}

pub fn load_config(path: &Path) -> Result<MovementConfig, PersistError> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::prefabs;
    use crate::systems::MovementConfig;

    #[test]
    fn snapshot_round_trips_through_json() {
        let mut world = World::new();
        let config = MovementConfig::default();
        let player = prefabs::spawn_player(&mut world, Vec2::new(3.0, 7.0), &config);
        prefabs::spawn_platform(&mut world, Vec2::new(0.0, -10.0), Vec2::new(100.0, 20.0));
        prefabs::spawn_enemy(&mut world, Vec2::new(40.0, 0.0), 60.0);
        // Transient swing: must not survive the snapshot.
        prefabs::spawn_melee_attack(&mut world, player);

        let json = serde_json::to_string(&snapshot(&world)).unwrap();
        let parsed: SceneSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.entities.len(), 3);

        let mut restored = World::new();
        restore(&mut restored, &parsed);

        let round_trip = snapshot(&restored);
        assert_eq!(round_trip.entities.len(), 3);

        let players: Vec<_> = restored
            .query::<(&MovementState, &LocalTransform, &Hurtbox)>()
            .iter()
            .map(|(_, (_, t, h))| (t.position, h.max_health))
            .collect();
        assert_eq!(players, vec![(Vec2::new(3.0, 7.0), 100.0)]);

        let enemies = restored.query::<&EnemyAi>().iter().count();
        assert_eq!(enemies, 1);
        let statics = restored
            .query::<&CollisionShape>()
            .iter()
            .filter(|(_, s)| s.is_static)
            .count();
        assert_eq!(statics, 1);
    }

    #[test]
    fn config_round_trips_and_fills_defaults() {
        let config = MovementConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: MovementConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.dash_speed, config.dash_speed);
        assert_eq!(parsed.coyote_frames, config.coyote_frames);

        // Partial configs lean on Default for the rest.
        let parsed: MovementConfig = serde_json::from_str(r#"{"dash_speed": 900.0}"#).unwrap();
        assert_eq!(parsed.dash_speed, 900.0);
        assert_eq!(parsed.gravity, config.gravity);
    }
}
