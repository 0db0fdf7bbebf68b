use std::collections::HashSet;

/// Logical input actions. Device bindings live outside the crate; the host
/// resolves keys/buttons into these before the tick starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Left,
    Right,
    Up,
    Down,
    Jump,
    Dash,
    Sprint,
    Attack,
}

/// Frame-buffered input state.
///
/// `update` consumes the set of actions held down this tick and computes the
/// press/release edges once, before any simulation logic runs. Queries during
/// the tick are read-only, so two systems asking "was jump just pressed?"
/// always agree — there is no consume-on-read flag to race on.
#[derive(Default)]
pub struct InputState {
    held: HashSet<Action>,
    pressed: HashSet<Action>,
    released: HashSet<Action>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the actions down for this tick. Call exactly once per tick.
    pub fn update(&mut self, down: &[Action]) {
        let now: HashSet<Action> = down.iter().copied().collect();
        self.pressed = now.difference(&self.held).copied().collect();
        self.released = self.held.difference(&now).copied().collect();
        self.held = now;
    }

    pub fn is_held(&self, action: Action) -> bool {
        self.held.contains(&action)
    }

    pub fn just_pressed(&self, action: Action) -> bool {
        self.pressed.contains(&action)
    }

    pub fn just_released(&self, action: Action) -> bool {
        self.released.contains(&action)
    }

    /// Net horizontal input direction: -1, 0, or +1.
    pub fn move_dir(&self) -> f32 {
        let mut dir = 0.0;
        if self.is_held(Action::Left) {
            dir -= 1.0;
        }
        if self.is_held(Action::Right) {
            dir += 1.0;
        }
        dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_last_exactly_one_tick() {
        let mut input = InputState::new();

        input.update(&[Action::Jump]);
        assert!(input.is_held(Action::Jump));
        assert!(input.just_pressed(Action::Jump));
        assert!(!input.just_released(Action::Jump));

        input.update(&[Action::Jump]);
        assert!(input.is_held(Action::Jump));
        assert!(!input.just_pressed(Action::Jump), "held is not a re-press");

        input.update(&[]);
        assert!(!input.is_held(Action::Jump));
        assert!(input.just_released(Action::Jump));

        input.update(&[]);
        assert!(!input.just_released(Action::Jump));
    }

    #[test]
    fn opposite_directions_cancel() {
        let mut input = InputState::new();
        input.update(&[Action::Left, Action::Right]);
        assert_eq!(input.move_dir(), 0.0);
        input.update(&[Action::Left]);
        assert_eq!(input.move_dir(), -1.0);
    }
}
