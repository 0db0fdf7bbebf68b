mod app;
mod components;
mod engine;
mod fsm;
mod geometry;
mod persist;
mod scene;
mod systems;
mod timer;

use std::path::PathBuf;
use std::process;

use clap::Parser;

use app::Sim;
use components::{Hurtbox, LocalTransform, MovementState};
use engine::input::Action;
use glam::Vec2;
use scene::{prefabs, test_scene::load_test_scene};
use systems::MovementConfig;

#[derive(Parser)]
#[command(name = "ember", about = "Ember — headless 2D action-platformer simulation core")]
struct Args {
    /// Fixed 60 Hz ticks to simulate
    #[arg(long, default_value_t = 600)]
    frames: u32,

    /// Seed for combat RNG (crit rolls); same seed + same input = same run
    #[arg(long, default_value_t = 0x5EED)]
    seed: u64,

    /// Movement tuning overrides (JSON, partial files allowed)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Load the scene from a snapshot instead of the built-in arena
    #[arg(long)]
    load_scene: Option<PathBuf>,

    /// Write a scene snapshot when the run ends
    #[arg(long)]
    dump_state: Option<PathBuf>,
}

/// Scripted demo input: run right, hop onto the platform, dash at the enemy,
/// then trade a few slashes.
fn demo_input(frame: u32) -> Vec<Action> {
    let mut actions = Vec::new();
    if frame < 260 {
        actions.push(Action::Right);
    }
    if (40..52).contains(&frame) {
        actions.push(Action::Jump);
    }
    if frame == 150 {
        actions.push(Action::Dash);
    }
    if matches!(frame, 230 | 300 | 370) {
        actions.push(Action::Attack);
    }
    if frame == 370 {
        // Finish with an overhead arc.
        actions.push(Action::Up);
    }
    if (300..360).contains(&frame) {
        actions.push(Action::Sprint);
    }
    actions
}

/// Loose a bolt from just ahead of the player, along its facing.
fn fire_bolt(sim: &mut Sim) {
    let Some(player) = sim.player() else {
        return;
    };
    let (position, facing) = {
        let transform = sim.world.get::<&LocalTransform>(player);
        let movement = sim.world.get::<&MovementState>(player);
        match (transform, movement) {
            (Ok(transform), Ok(movement)) => (transform.position, movement.facing),
            _ => return,
        }
    };
    let dir = Vec2::new(facing.sign(), 0.0);
    prefabs::spawn_projectile(&mut sim.world, player, position + dir * 14.0, dir);
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match persist::load_config(path) {
            Ok(config) => config,
            Err(err) => {
                log::error!("failed to load config {}: {err}", path.display());
                process::exit(1);
            }
        },
        None => MovementConfig::default(),
    };

    let mut sim = Sim::new(config, args.seed);
    match &args.load_scene {
        Some(path) => {
            if let Err(err) = persist::load_scene(path, &mut sim.world) {
                log::error!("failed to load scene {}: {err}", path.display());
                process::exit(1);
            }
        }
        None => {
            let config = sim.config.clone();
            load_test_scene(&mut sim.world, &config);
        }
    }

    let mut total_hits = 0usize;
    for frame in 0..args.frames {
        if frame == 420 {
            fire_bolt(&mut sim);
        }
        let report = sim.tick(&demo_input(frame));
        log::trace!("tick {frame}: {} contacts", report.contacts);
        for hit in &report.hits {
            total_hits += 1;
            log::info!(
                "tick {frame}: {:?} hit {:?} for {}{}{}",
                hit.attacker,
                hit.target,
                hit.damage,
                if hit.crit { " (crit)" } else { "" },
                if hit.lethal { " (lethal)" } else { "" },
            );
        }
    }

    if let Some(player) = sim.player() {
        let position = sim
            .world
            .get::<&LocalTransform>(player)
            .map(|t| t.position)
            .unwrap_or_default();
        let health = sim.world.get::<&Hurtbox>(player).map(|h| h.health).unwrap_or(0.0);
        log::info!(
            "player finished at ({:.1}, {:.1}) with {health:.0} health",
            position.x,
            position.y
        );
    }
    log::info!("simulated {} ticks, {total_hits} hits landed", sim.ticks);

    if let Some(path) = &args.dump_state {
        if let Err(err) = persist::save_scene(path, &sim.world) {
            log::error!("failed to write snapshot {}: {err}", path.display());
            process::exit(1);
        }
        log::info!("snapshot written to {}", path.display());
    }
}
