#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimerState {
    #[default]
    Stopped,
    Running,
    /// Reached the target; stays here until `reset`.
    Completed,
}

/// Countdown advanced by tick deltas. Elapsed never passes the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timer {
    target: f32,
    elapsed: f32,
    state: TimerState,
}

impl Timer {
    pub fn new(target_seconds: f32) -> Self {
        Self {
            target: sanitize(target_seconds),
            elapsed: 0.0,
            state: TimerState::Stopped,
        }
    }

    /// Already running.
    pub fn started(target_seconds: f32) -> Self {
        let mut timer = Self::new(target_seconds);
        timer.start();
        timer
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    /// Keeps elapsed time; a running timer completes at once if the new
    /// target is already behind it.
    pub fn set_target(&mut self, target_seconds: f32) {
        self.target = sanitize(target_seconds);
        if self.elapsed >= self.target {
            self.elapsed = self.target;
            if self.state == TimerState::Running {
                self.state = TimerState::Completed;
            }
        }
    }

    /// Stopped to running. A completed timer stays completed until reset.
    pub fn start(&mut self) {
        if self.state != TimerState::Stopped {
            return;
        }
        if self.elapsed >= self.target {
            self.elapsed = self.target;
            self.state = TimerState::Completed;
        } else {
            self.state = TimerState::Running;
        }
    }

    pub fn update(&mut self, sync: f32) {
        if self.state != TimerState::Running || !sync.is_finite() || sync <= 0.0 {
            return;
        }
        self.elapsed += sync;
        if self.elapsed >= self.target {
            self.elapsed = self.target;
            self.state = TimerState::Completed;
        }
    }

    /// Halts without zeroing; `start` resumes.
    pub fn stop(&mut self) {
        if self.state == TimerState::Running {
            self.state = TimerState::Stopped;
        }
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.state = TimerState::Stopped;
    }

    pub fn restart(&mut self) {
        self.reset();
        self.start();
    }

    pub fn progress(&self) -> f32 {
        if self.target <= 0.0 {
            return if self.state == TimerState::Stopped && self.elapsed == 0.0 {
                0.0
            } else {
                1.0
            };
        }
        (self.elapsed / self.target).clamp(0.0, 1.0)
    }

    pub fn remaining(&self) -> f32 {
        self.target - self.elapsed
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn is_complete(&self) -> bool {
        self.state == TimerState::Completed
    }
}

fn sanitize(seconds: f32) -> f32 {
    if seconds.is_finite() {
        seconds.max(0.0)
    } else {
        0.0
    }
}
