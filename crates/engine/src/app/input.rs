use crate::math::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    Pause,
    Restart,
    ToggleMetrics,
    Quit,
}

const ACTION_COUNT: usize = 4;

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::Pause => 0,
            InputAction::Restart => 1,
            InputAction::ToggleMetrics => 2,
            InputAction::Quit => 3,
        }
    }
}

/// Held state plus press edges for each action. Edges are cleared when a
/// tick snapshot is taken, so a press is seen by exactly one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
    pressed: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        let index = action.index();
        if is_down && !self.down[index] {
            self.pressed[index] = true;
        }
        self.down[index] = is_down;
    }

    pub(crate) fn clear_edges(&mut self) {
        self.pressed = [false; ACTION_COUNT];
    }
}

/// Pointer sample in framebuffer pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    pub position: Option<Vec2>,
    pub down: bool,
    pub pressed: bool,
    pub released: bool,
}

/// Input as seen by one simulation tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
    pointer: PointerState,
}

impl InputSnapshot {
    pub(crate) fn new(quit_requested: bool, actions: ActionStates, pointer: PointerState) -> Self {
        Self {
            quit_requested,
            actions,
            pointer,
        }
    }

    /// Snapshot with only pointer state set. Used to drive games headlessly.
    pub fn with_pointer(pointer: PointerState) -> Self {
        Self {
            pointer,
            ..Self::default()
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.down[action.index()]
    }

    pub fn pressed(&self, action: InputAction) -> bool {
        self.actions.pressed[action.index()]
    }

    pub fn pointer(&self) -> PointerState {
        self.pointer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_action_reports_one_press_edge() {
        let mut states = ActionStates::default();
        states.set(InputAction::Pause, true);
        let first = InputSnapshot::new(false, states, PointerState::default());
        states.clear_edges();
        states.set(InputAction::Pause, true);
        let second = InputSnapshot::new(false, states, PointerState::default());

        assert!(first.pressed(InputAction::Pause));
        assert!(!second.pressed(InputAction::Pause));
        assert!(second.is_down(InputAction::Pause));
    }
}
