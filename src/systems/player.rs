use glam::Vec2;
use hecs::World;
use serde::{Deserialize, Serialize};

use crate::components::{Facing, Hurtbox, JumpPhase, MovementState, Velocity};
use crate::engine::input::{Action, InputState};
use crate::engine::time::TICK_DT;

// ---------------------------------------------------------------------------
// Tuning
// ---------------------------------------------------------------------------

/// All movement tuning in one serializable record, loadable from JSON via
/// `--config`. Speeds are units/second; accelerations units/second²; every
/// `*_frames` field counts simulation ticks; friction values are per-frame
/// velocity retention factors.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    // Horizontal movement
    pub ground_accel: f32,
    /// Fraction of ground acceleration available in the air.
    pub air_control: f32,
    pub ground_friction: f32,
    pub air_friction: f32,
    /// Residual speed below which friction snaps to a full stop.
    pub stop_threshold: f32,
    pub max_run_speed: f32,
    pub air_max_speed: f32,

    // Vertical
    pub gravity: f32,
    pub terminal_velocity: f32,

    // Jump
    pub jump_min_speed: f32,
    pub jump_max_speed: f32,
    pub jump_hold_max_frames: u32,
    pub jump_cut_factor: f32,
    pub coyote_frames: u32,
    pub buffer_frames: u32,

    // Wall interactions
    pub wall_slide_speed: f32,
    /// (horizontal away from the wall, vertical up).
    pub wall_jump_velocity: Vec2,
    pub wall_lockout_frames: u32,
    pub wall_jump_cooldown_frames: u32,
    pub wall_coyote_frames: u32,

    // Dash
    pub dash_speed: f32,
    pub dash_frames: u32,
    pub dash_cooldown_frames: u32,
    pub dash_iframes: u32,

    // Sprint
    pub sprint_max_stamina: f32,
    pub sprint_drain_per_frame: f32,
    pub sprint_regen_per_frame: f32,
    /// Sprint cannot start below this, but keeps draining toward zero.
    pub sprint_min_stamina: f32,
    pub sprint_accel_mult: f32,
    pub sprint_speed_mult: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            ground_accel: 1800.0,
            air_control: 0.65,
            ground_friction: 0.82,
            air_friction: 0.98,
            stop_threshold: 4.0,
            max_run_speed: 260.0,
            air_max_speed: 220.0,

            gravity: 1500.0,
            terminal_velocity: 900.0,

            jump_min_speed: 360.0,
            jump_max_speed: 560.0,
            jump_hold_max_frames: 12,
            jump_cut_factor: 0.45,
            coyote_frames: 6,
            buffer_frames: 8,

            wall_slide_speed: 110.0,
            wall_jump_velocity: Vec2::new(300.0, 460.0),
            wall_lockout_frames: 10,
            wall_jump_cooldown_frames: 14,
            wall_coyote_frames: 5,

            dash_speed: 620.0,
            dash_frames: 9,
            dash_cooldown_frames: 28,
            dash_iframes: 10,

            sprint_max_stamina: 100.0,
            sprint_drain_per_frame: 0.9,
            sprint_regen_per_frame: 0.35,
            sprint_min_stamina: 25.0,
            sprint_accel_mult: 1.3,
            sprint_speed_mult: 1.45,
        }
    }
}

// ---------------------------------------------------------------------------
// The movement state machine
// ---------------------------------------------------------------------------

/// Advance the controlled character's movement machine by one tick.
///
/// Sub-steps run in a fixed order because later ones read flags written by
/// earlier ones: facing → sprint → dash → horizontal → gravity + wall slide →
/// jump resolution → countdown decrement. Input is read-only here — the edges
/// were computed once when the tick started. Ground/wall contact facts are
/// whatever collision resolution established at the end of the previous tick.
pub fn player_system(world: &mut World, input: &InputState, config: &MovementConfig) {
    for (_entity, (movement, vel, hurtbox)) in
        world.query_mut::<(&mut MovementState, &mut Velocity, Option<&mut Hurtbox>)>()
    {
        update_character(movement, &mut vel.0, hurtbox, input, config);
    }
}

fn update_character(
    movement: &mut MovementState,
    vel: &mut Vec2,
    hurtbox: Option<&mut Hurtbox>,
    input: &InputState,
    config: &MovementConfig,
) {
    let move_dir = input.move_dir();

    // Facing follows the last nonzero input, but never turns mid-dash.
    if move_dir != 0.0 && !movement.dash.active {
        movement.facing = Facing::from_sign(move_dir);
    }

    update_sprint(movement, input, config);
    update_dash(movement, vel, hurtbox, input, config);

    if movement.dash.active {
        // The dash owns velocity outright. A jump press is not lost, though:
        // it buffers and fires when normal physics resume.
        if input.just_pressed(Action::Jump) {
            movement.jump.buffer.arm(config.buffer_frames);
        }
    } else {
        update_horizontal(movement, vel, move_dir, config);
        update_gravity_and_slide(movement, vel, move_dir, config);
        update_jump(movement, vel, input, config);
    }

    movement.tick_countdowns();
}

fn update_sprint(movement: &mut MovementState, input: &InputState, config: &MovementConfig) {
    let sprint = &mut movement.sprint;
    let held = input.is_held(Action::Sprint);

    if held && !sprint.active && sprint.stamina >= config.sprint_min_stamina {
        sprint.active = true;
        log::debug!("sprint start ({} stamina)", sprint.stamina);
    }

    if sprint.active {
        if held {
            sprint.stamina = (sprint.stamina - config.sprint_drain_per_frame).max(0.0);
            if sprint.stamina == 0.0 {
                sprint.active = false;
                log::debug!("sprint exhausted");
            }
        } else {
            sprint.active = false;
        }
    } else {
        sprint.stamina = (sprint.stamina + config.sprint_regen_per_frame)
            .min(config.sprint_max_stamina);
    }
}

fn update_dash(
    movement: &mut MovementState,
    vel: &mut Vec2,
    hurtbox: Option<&mut Hurtbox>,
    input: &InputState,
    config: &MovementConfig,
) {
    if movement.dash.active {
        if movement.dash.duration.finished() {
            movement.dash.active = false;
            movement.dash.cooldown.arm(config.dash_cooldown_frames);
        } else {
            // Pin, don't add: the dash replaces whatever physics was doing.
            *vel = movement.dash.velocity;
            return;
        }
    }

    if input.just_pressed(Action::Dash) && movement.dash.cooldown.finished() {
        let dir = if input.is_held(Action::Down) {
            Vec2::new(0.0, -1.0)
        } else {
            Vec2::new(movement.facing.sign(), 0.0)
        };
        movement.dash.active = true;
        movement.dash.velocity = dir * config.dash_speed;
        movement.dash.duration.arm(config.dash_frames);
        movement.dash.iframes.arm(config.dash_iframes);
        if let Some(hurtbox) = hurtbox {
            hurtbox.invincibility.arm_at_least(config.dash_iframes);
        }
        *vel = movement.dash.velocity;
        log::debug!("dash {:?}", dir);
    }
}

fn update_horizontal(
    movement: &mut MovementState,
    vel: &mut Vec2,
    move_dir: f32,
    config: &MovementConfig,
) {
    let (mut accel, mut max_speed) = if movement.grounded {
        (config.ground_accel, config.max_run_speed)
    } else {
        (config.ground_accel * config.air_control, config.air_max_speed)
    };
    if movement.sprint.active {
        accel *= config.sprint_accel_mult;
        max_speed *= config.sprint_speed_mult;
    }

    if move_dir != 0.0 && movement.wall.lockout.finished() {
        // Acceleration never raises speed above the cap, but residual
        // momentum beyond it (a wall jump, a fading dash) is kept and left
        // to friction rather than chopped.
        let cap = max_speed.max(vel.x.abs());
        vel.x = (vel.x + move_dir * accel * TICK_DT).clamp(-cap, cap);
    } else {
        let retain = if movement.grounded {
            config.ground_friction
        } else {
            config.air_friction
        };
        vel.x *= retain;
        if vel.x.abs() < config.stop_threshold {
            vel.x = 0.0;
        }
    }
}

fn update_gravity_and_slide(
    movement: &mut MovementState,
    vel: &mut Vec2,
    move_dir: f32,
    config: &MovementConfig,
) {
    // Gravity only while airborne; while grounded it would just fight the
    // resolution push-out every frame.
    if !movement.grounded {
        vel.y = (vel.y - config.gravity * TICK_DT).max(-config.terminal_velocity);
    }

    let pressing_into = (movement.wall.touching_left && move_dir < 0.0)
        || (movement.wall.touching_right && move_dir > 0.0);
    let want_slide = !movement.grounded && vel.y < 0.0 && pressing_into;

    if want_slide {
        if !movement.wall.sliding {
            movement.wall.sliding = true;
            // The wall gifts a slowed fall; the double jump is the price.
            movement.jump.has_double_jump = false;
            log::debug!("wall slide");
        }
        // Fixed slide speed no matter how fast the entry was.
        vel.y = vel.y.max(-config.wall_slide_speed);
    } else {
        movement.wall.sliding = false;
    }
}

fn update_jump(
    movement: &mut MovementState,
    vel: &mut Vec2,
    input: &InputState,
    config: &MovementConfig,
) {
    // The wall-jump lockout doubles as the WallLocked phase duration.
    if movement.jump.phase == JumpPhase::WallLocked && movement.wall.lockout.finished() {
        movement.jump.phase = JumpPhase::Airborne;
    }

    // Variable height: holding keeps scaling the rise until the hold window
    // closes or the apex passes; an early release cuts the jump short.
    if movement.jump.phase == JumpPhase::Rising {
        if vel.y <= 0.0 {
            movement.jump.phase = JumpPhase::Airborne;
        } else if input.just_released(Action::Jump) {
            vel.y *= config.jump_cut_factor;
            movement.jump.phase = JumpPhase::Airborne;
        } else if input.is_held(Action::Jump)
            && movement.jump.hold_frames < config.jump_hold_max_frames
        {
            movement.jump.hold_frames += 1;
            let t = movement.jump.hold_frames as f32 / config.jump_hold_max_frames as f32;
            vel.y = config.jump_min_speed + (config.jump_max_speed - config.jump_min_speed) * t;
        }
    }

    let pressed = input.just_pressed(Action::Jump);
    let buffered = movement.jump.buffer.active();
    if !pressed && !buffered {
        return;
    }

    // Priority: wall jump, then ground jump, then double jump, else buffer.
    // Recent wall contact suppresses the ground/double paths so a jump right
    // at a wall corner is never ambiguous.
    let airborne = !movement.grounded;
    let wall_eligible =
        airborne && (movement.wall.touching() || movement.wall.recent_contact.active());
    let ground_eligible = (movement.grounded || movement.jump.coyote.active())
        && !movement.wall.recent_contact.active();
    let double_eligible = airborne
        && !movement.wall.touching()
        && movement.jump.has_double_jump
        && movement.wall.cooldown.finished();

    if wall_eligible {
        wall_jump(movement, vel, config);
    } else if ground_eligible {
        ground_jump(movement, vel, config);
    } else if double_eligible {
        double_jump(movement, vel, config);
    } else if pressed {
        movement.jump.buffer.arm(config.buffer_frames);
    }
}

fn ground_jump(movement: &mut MovementState, vel: &mut Vec2, config: &MovementConfig) {
    vel.y = config.jump_min_speed;
    movement.jump.phase = JumpPhase::Rising;
    movement.jump.hold_frames = 0;
    movement.grounded = false;
    movement.jump.coyote.clear();
    movement.jump.buffer.clear();
    log::debug!("jump");
}

/// Fixed mid-air impulse. Restored only by landing — wall jumps and wall
/// contact never give it back.
fn double_jump(movement: &mut MovementState, vel: &mut Vec2, config: &MovementConfig) {
    vel.y = config.jump_min_speed;
    movement.jump.phase = JumpPhase::Airborne;
    movement.jump.has_double_jump = false;
    movement.jump.buffer.clear();
    log::debug!("double jump");
}

fn wall_jump(movement: &mut MovementState, vel: &mut Vec2, config: &MovementConfig) {
    let side = if movement.wall.touching_left {
        Facing::Left
    } else if movement.wall.touching_right {
        Facing::Right
    } else {
        movement.wall.recent_side.unwrap_or(movement.facing)
    };
    let away = -side.sign();

    vel.x = away * config.wall_jump_velocity.x;
    vel.y = config.wall_jump_velocity.y;
    movement.jump.phase = JumpPhase::WallLocked;
    movement.jump.hold_frames = 0;
    movement.facing = Facing::from_sign(away);
    movement.wall.lockout.arm(config.wall_lockout_frames);
    movement.wall.cooldown.arm(config.wall_jump_cooldown_frames);
    movement.wall.sliding = false;
    movement.wall.recent_contact.clear();
    movement.wall.recent_side = None;
    movement.jump.coyote.clear();
    movement.jump.buffer.clear();
    log::debug!("wall jump off {side:?} wall");
}
