/// Text nodes owned by the driver rather than by an actor.
struct Overlay {
    paused: NodeId,
    metrics: NodeId,
    best: NodeId,
}

impl Overlay {
    fn build(world: &mut World) -> Self {
        let layer = world.layers.overlay;
        let mut paused = SceneNode::new(
            TextSprite::new("PAUSED", TEXT_COLOR, 3.0)
                .aligned(TextAlign::Center)
                .with_shadow(SHADOW_COLOR)
                .into(),
        )
        .named("paused_label")
        .at(FRAME_WIDTH as f32 * 0.5, 100.0);
        paused.set_culled(true);
        let paused = world.spawn_under(layer, paused);

        let mut metrics = SceneNode::new(
            TextSprite::new("", TEXT_COLOR, 1.0)
                .with_shadow(SHADOW_COLOR)
                .into(),
        )
        .named("metrics_label")
        .at(6.0, FRAME_HEIGHT as f32 - 12.0);
        metrics.set_culled(true);
        let metrics = world.spawn_under(layer, metrics);

        let best = world.spawn_under(
            layer,
            SceneNode::new(
                TextSprite::new("", GOLD_COLOR, 1.0)
                    .aligned(TextAlign::Right)
                    .with_shadow(SHADOW_COLOR)
                    .into(),
            )
            .named("best_label")
            .at(FRAME_WIDTH as f32 - 6.0, FRAME_HEIGHT as f32 - 12.0),
        );

        Self {
            paused,
            metrics,
            best,
        }
    }
}

/// The running game: owns the world, the actor scheduler and everything
/// that outlives a single round.
pub(crate) struct Bastion {
    world: World,
    scheduler: Scheduler<World>,
    towers: Vec<(ActorId, NodeId)>,
    overlay: Overlay,
    paused: bool,
    show_metrics: bool,
    metrics: MetricsHandle,
    scores: ScoreBoard,
    best: Option<HighScore>,
    score_recorded: bool,
}

impl Bastion {
    pub(crate) fn new(
        rules: GameConfig,
        store: &mut AssetStore,
        scores: ScoreBoard,
        metrics: MetricsHandle,
    ) -> Result<Self, ArtError> {
        let art = Art::load(store)?;
        let mut world = World::new(rules, art);

        let mut scheduler: Scheduler<World> = Scheduler::new();
        scheduler.add(Box::new(Hud::build(&mut world)));
        scheduler.add(Box::new(WaveDirector::new()));
        scheduler.add(Box::new(Spawner::<Projectile>::new(&mut world)));
        scheduler.add(Box::new(Spawner::<Enemy>::new(&mut world)));
        scheduler.add(Box::new(Spawner::<ImpactText>::new(&mut world)));
        scheduler.add(Box::new(Castle::build(&mut world)));
        scheduler.add(Box::new(Banner::build(&mut world)));
        let overlay = Overlay::build(&mut world);

        let best = match scores.best() {
            Ok(best) => best,
            Err(error) => {
                warn!(error = %error, "highscore_read_failed");
                None
            }
        };
        info!(
            actors = scheduler.len(),
            nodes = world.scene.len(),
            best = best.as_ref().map_or(0, |entry| entry.score),
            scores = %scores.path().display(),
            "session_ready"
        );

        let mut session = Self {
            world,
            scheduler,
            towers: Vec::new(),
            overlay,
            paused: false,
            show_metrics: false,
            metrics,
            scores,
            best,
            score_recorded: false,
        };
        session.refresh_best_label();
        Ok(session)
    }

    fn restart(&mut self) {
        for (actor, node) in self.towers.drain(..) {
            self.scheduler.remove(actor);
            if let Err(error) = self.world.scene.destroy(node) {
                warn!(error = %error, "tower_destroy_failed");
            }
        }
        self.world.reset_state();
        self.paused = false;
        self.score_recorded = false;
        let paused = self.overlay.paused;
        self.world.edit_node(paused, |node| {
            node.set_culled(true);
        });
        info!(actors = self.scheduler.len(), "session_restarted");
    }

    fn build_requested_towers(&mut self) {
        for cell in std::mem::take(&mut self.world.tower_requests) {
            if !self.world.can_build(cell) {
                continue;
            }
            self.world.gold -= self.world.rules.tower_cost;
            self.world.map.occupy(cell);
            let tower = Tower::build(cell, &mut self.world);
            let node = tower.node();
            let actor = self.scheduler.add(Box::new(tower));
            self.towers.push((actor, node));
            self.world.push_event(WorldEvent::TowerBuilt(cell));
            info!(
                column = cell.0,
                row = cell.1,
                gold = self.world.gold,
                towers = self.towers.len(),
                "tower_built"
            );
        }
    }

    fn record_score_if_over(&mut self) {
        if !self.world.game_over || self.score_recorded {
            return;
        }
        self.score_recorded = true;
        let name = self.world.rules.player_name.to_ascii_uppercase();
        let score = self.world.score;
        match self.scores.record(&name, score) {
            Ok(true) => {
                info!(score, "highscore_beaten");
                self.best = Some(HighScore { name, score });
                self.refresh_best_label();
            }
            Ok(false) => {}
            Err(error) => warn!(error = %error, "highscore_write_failed"),
        }
    }

    fn refresh_best_label(&mut self) {
        let text = match &self.best {
            Some(best) => format!("BEST {} {}", best.name.to_ascii_uppercase(), best.score),
            None => String::new(),
        };
        if let Err(error) = self.world.scene.set_text(self.overlay.best, text) {
            warn!(error = %error, "best_label_failed");
        }
    }

    fn refresh_metrics_label(&mut self) {
        let snapshot = self.metrics.snapshot();
        let text = format!(
            "FPS {:.0}  TPS {:.0}  FRAME {:.1}MS  NODES {:.0}/{:.0}",
            snapshot.fps,
            snapshot.tps,
            snapshot.frame_time_ms,
            snapshot.nodes_drawn,
            snapshot.nodes_skipped
        );
        if let Err(error) = self.world.scene.set_text(self.overlay.metrics, text) {
            warn!(error = %error, "metrics_label_failed");
        }
    }

    fn toggle_node(&mut self, id: NodeId, visible: bool) {
        self.world.edit_node(id, |node| {
            node.set_culled(!visible);
        });
    }
}

impl Game for Bastion {
    fn update(&mut self, sync: f32, input: &InputSnapshot) -> LoopCommand {
        if input.quit_requested() || input.pressed(InputAction::Quit) {
            return LoopCommand::Quit;
        }
        if input.pressed(InputAction::Restart) {
            self.restart();
        }
        if input.pressed(InputAction::Pause) && !self.world.game_over {
            self.paused = !self.paused;
            self.toggle_node(self.overlay.paused, self.paused);
            info!(paused = self.paused, "pause_toggled");
        }
        if input.pressed(InputAction::ToggleMetrics) {
            self.show_metrics = !self.show_metrics;
            self.toggle_node(self.overlay.metrics, self.show_metrics);
        }
        if self.show_metrics {
            self.refresh_metrics_label();
        }
        if self.paused {
            return LoopCommand::Continue;
        }

        self.world.begin_tick(input.pointer());
        self.scheduler.update(sync, &mut self.world);
        self.world.resetting = false;
        self.build_requested_towers();
        self.world.scene.update(sync);
        self.record_score_if_over();
        LoopCommand::Continue
    }

    fn draw(&mut self, surface: &mut dyn DrawSurface) -> DrawStats {
        let (width, height) = surface.size();
        self.world
            .scene
            .draw(surface, &DrawContext::new(width, height), Affine2::IDENTITY)
    }

    fn clear_color(&self) -> Color {
        [12, 14, 20, 255]
    }

    fn title(&self) -> Option<String> {
        Some(format!(
            "Bastion | wave {} | score {}",
            self.world.wave, self.world.score
        ))
    }

    fn shutdown(&mut self) {
        info!(
            wave = self.world.wave,
            score = self.world.score,
            towers = self.towers.len(),
            "session_ended"
        );
    }
}
