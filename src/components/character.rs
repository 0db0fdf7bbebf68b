use serde::{Deserialize, Serialize};

use crate::fsm::StateMachine;
use crate::timer::Countdown;

// ---------------------------------------------------------------------------
// Player movement state
// ---------------------------------------------------------------------------

/// Horizontal facing, flipped by the last nonzero move input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    pub fn from_sign(x: f32) -> Self {
        if x < 0.0 {
            Facing::Left
        } else {
            Facing::Right
        }
    }
}

/// Discrete states of the jump machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JumpPhase {
    /// On the ground, jump available.
    Grounded,
    /// Ascending with the button held; hold frames still scale the jump.
    Rising,
    /// Airborne with no active jump (fell off, apex passed, or jump cut).
    Airborne,
    /// Just wall-jumped; horizontal control suppressed until lockout ends.
    WallLocked,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct JumpState {
    pub phase: JumpPhase,
    /// Frames the jump button has been held since the jump started.
    pub hold_frames: u32,
    /// Grace window after walking off a ledge during which a jump still
    /// registers as grounded. Armed on ground loss, consumed on use.
    pub coyote: Countdown,
    /// An ineligible jump press is remembered here and fires automatically
    /// if eligibility arrives before it runs out.
    pub buffer: Countdown,
    /// One extra mid-air jump per airborne excursion. Restored only by
    /// landing — never by wall contact or wall jumps.
    pub has_double_jump: bool,
}

impl Default for JumpState {
    fn default() -> Self {
        Self {
            phase: JumpPhase::Airborne,
            hold_frames: 0,
            coyote: Countdown::default(),
            buffer: Countdown::default(),
            has_double_jump: true,
        }
    }
}

/// Wall interaction facts and timers. The touching flags are rewritten every
/// tick by collision resolution; everything else belongs to the machine.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct WallState {
    pub touching_left: bool,
    pub touching_right: bool,
    pub sliding: bool,
    /// Control lockout after a wall jump: player-directed horizontal
    /// acceleration is suppressed while this runs.
    pub lockout: Countdown,
    /// Blocks the double jump right after a wall jump, so wall jump →
    /// double jump → wall jump chains don't trivialize walls.
    pub cooldown: Countdown,
    /// Wall-coyote: a jump shortly after leaving a wall still wall-jumps.
    /// Also suppresses ground/double jumps right at a wall corner.
    pub recent_contact: Countdown,
    /// Which side `recent_contact` refers to.
    pub recent_side: Option<Facing>,
}

impl WallState {
    pub fn touching(&self) -> bool {
        self.touching_left || self.touching_right
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct DashState {
    pub active: bool,
    /// Velocity the dash pins every frame while active.
    pub velocity: glam::Vec2,
    pub duration: Countdown,
    pub cooldown: Countdown,
    /// Invincibility granted by the dash. Mirrored into the hurtbox window
    /// when the dash starts, so `Hurtbox::vulnerable` stays the single
    /// source of truth for the combat resolver.
    pub iframes: Countdown,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SprintState {
    pub stamina: f32,
    pub active: bool,
}

/// Kinematic state of the controlled character: the grounded fact plus the
/// four interacting sub-machines. Update order lives in `systems::player`;
/// this stays pure data, like the rest of the component set.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MovementState {
    pub grounded: bool,
    pub facing: Facing,
    pub jump: JumpState,
    pub wall: WallState,
    pub dash: DashState,
    pub sprint: SprintState,
}

impl MovementState {
    pub fn new(max_stamina: f32) -> Self {
        Self {
            grounded: false,
            facing: Facing::Right,
            jump: JumpState::default(),
            wall: WallState::default(),
            dash: DashState::default(),
            sprint: SprintState {
                stamina: max_stamina,
                active: false,
            },
        }
    }

    /// Decrement every frame-counted window exactly once. Called at the end
    /// of the movement update so a countdown armed on tick T is still worth
    /// its full N frames on ticks T+1..=T+N.
    pub fn tick_countdowns(&mut self) {
        self.jump.coyote.tick();
        self.jump.buffer.tick();
        self.wall.lockout.tick();
        self.wall.cooldown.tick();
        if self.wall.recent_contact.tick() {
            self.wall.recent_side = None;
        }
        self.dash.duration.tick();
        self.dash.cooldown.tick();
        self.dash.iframes.tick();
    }
}

// ---------------------------------------------------------------------------
// Enemy AI
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AiState {
    /// Walk back and forth around the patrol origin.
    Patrol,
    /// Player spotted: close the horizontal distance and swipe in range.
    Chase,
}

/// Patrol/chase brain attached to enemy entities. Drives horizontal velocity
/// and facing only; gravity and resolution treat enemies as plain bodies.
pub struct EnemyAi {
    pub fsm: StateMachine<AiState>,
    pub facing: Facing,
    pub patrol_origin: f32,
    pub patrol_range: f32,
    pub patrol_dir: f32,
    pub detection_range: f32,
    pub attack_range: f32,
    pub move_speed: f32,
    /// Minimum frames between swipes while in range.
    pub attack_cooldown: Countdown,
}

impl EnemyAi {
    pub fn new(patrol_origin: f32, patrol_range: f32) -> Self {
        Self {
            fsm: StateMachine::new(AiState::Patrol),
            facing: Facing::Right,
            patrol_origin,
            patrol_range,
            patrol_dir: 1.0,
            detection_range: 180.0,
            attack_range: 42.0,
            move_speed: 90.0,
            attack_cooldown: Countdown::default(),
        }
    }
}
