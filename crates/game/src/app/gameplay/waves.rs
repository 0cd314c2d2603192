#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaveStage {
    Waiting,
    Spawning { remaining: u32 },
    /// Everything spawned; waiting for the field to empty.
    Clearing,
}

/// Starts waves on request and queues their enemies on a fixed cadence.
pub(crate) struct WaveDirector {
    stage: WaveStage,
    spawn_timer: Timer,
    rules: Option<WaveRules>,
}

impl Default for WaveDirector {
    fn default() -> Self {
        Self::new()
    }
}

impl WaveDirector {
    pub(crate) fn new() -> Self {
        Self {
            stage: WaveStage::Waiting,
            spawn_timer: Timer::new(0.0),
            rules: None,
        }
    }

    pub(crate) fn stage(&self) -> WaveStage {
        self.stage
    }

    fn start_wave(&mut self, world: &mut World) {
        world.wave += 1;
        world.wave_in_progress = true;
        let rules = world.rules.wave_rules(world.wave);
        self.rules = Some(rules);
        self.stage = WaveStage::Spawning {
            remaining: rules.count,
        };
        // First enemy leaves on the next tick.
        self.spawn_timer = Timer::started(0.0);
        world.push_event(WorldEvent::WaveStarted(world.wave));
        world.banner_requests.push_back(format!("WAVE {}", world.wave));
        info!(
            wave = world.wave,
            count = rules.count,
            health = rules.health,
            "wave_started"
        );
    }

    fn finish_wave(&mut self, world: &mut World) {
        self.stage = WaveStage::Waiting;
        self.rules = None;
        world.wave_in_progress = false;
        world.gold = world.gold.saturating_add(world.rules.wave_bonus);
        world.push_event(WorldEvent::WaveCleared(world.wave));
        world.banner_requests.push_back(format!("WAVE {} CLEAR", world.wave));
        info!(wave = world.wave, gold = world.gold, "wave_cleared");
    }
}

impl Actor<World> for WaveDirector {
    fn update(&mut self, sync: f32, world: &mut World) {
        if world.resetting {
            *self = Self::new();
        }
        let start_requested = std::mem::take(&mut world.start_wave_requested);
        if world.game_over {
            return;
        }
        match self.stage {
            WaveStage::Waiting => {
                if start_requested && world.can_start_wave() {
                    self.start_wave(world);
                }
            }
            WaveStage::Spawning { remaining } => {
                self.spawn_timer.update(sync);
                let Some(rules) = self.rules else {
                    self.stage = WaveStage::Clearing;
                    return;
                };
                if !self.spawn_timer.is_complete() {
                    return;
                }
                world.enemy_requests.push(EnemyRequest::from(rules));
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    self.stage = WaveStage::Clearing;
                } else {
                    self.stage = WaveStage::Spawning { remaining };
                    self.spawn_timer.set_target(rules.spawn_interval);
                    self.spawn_timer.restart();
                }
            }
            WaveStage::Clearing => {
                if world.enemies_alive() == 0 && world.enemy_requests.is_empty() {
                    self.finish_wave(world);
                }
            }
        }
    }

    fn priority(&self) -> i32 {
        WAVE_PRIORITY
    }

    fn name(&self) -> &'static str {
        "waves"
    }
}
