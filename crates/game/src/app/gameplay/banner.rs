const BANNER_WIDTH: f32 = 220.0;
const BANNER_HEIGHT: f32 = 36.0;
const BANNER_Y: f32 = 150.0;
const BANNER_TEXT_SCALE: f32 = 2.0;
const SLIDE_IN_SECONDS: f32 = 0.4;
const HOLD_SECONDS: f32 = 1.2;
const SLIDE_OUT_SECONDS: f32 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BannerStage {
    SlideIn,
    Hold,
    SlideOut,
    Done,
}

impl BannerStage {
    fn seconds(self) -> f32 {
        match self {
            Self::SlideIn => SLIDE_IN_SECONDS,
            Self::Hold => HOLD_SECONDS,
            Self::SlideOut => SLIDE_OUT_SECONDS,
            Self::Done => 0.0,
        }
    }

    fn next(self) -> Self {
        match self {
            Self::SlideIn => Self::Hold,
            Self::Hold => Self::SlideOut,
            Self::SlideOut | Self::Done => Self::Done,
        }
    }
}

/// Centered message strip that slides across the playfield. Queued messages
/// play one after another.
pub(crate) struct Banner {
    node: NodeId,
    label: NodeId,
    stage: BannerStage,
    timer: Timer,
}

impl Banner {
    pub(crate) fn build(world: &mut World) -> Self {
        let layer = world.layers.overlay;
        let mut group = SceneNode::group()
            .named("banner")
            .at(-BANNER_WIDTH, BANNER_Y);
        group.set_culled(true);
        let node = world.spawn_under(layer, group);

        let back = SceneNode::new(ColorLayer::new([14, 16, 24, 210]).into())
            .named("banner_back")
            .with_size(BANNER_WIDTH, BANNER_HEIGHT);
        world.spawn_under(node, back);
        let text_top = (BANNER_HEIGHT - GLYPH_HEIGHT as f32 * BANNER_TEXT_SCALE) * 0.5;
        let label = TextSprite::new("", TEXT_COLOR, BANNER_TEXT_SCALE)
            .aligned(TextAlign::Center)
            .with_shadow(SHADOW_COLOR);
        let label = world.spawn_under(
            node,
            SceneNode::new(label.into())
                .named("banner_label")
                .at(BANNER_WIDTH * 0.5, text_top),
        );

        Self {
            node,
            label,
            stage: BannerStage::Done,
            timer: Timer::new(0.0),
        }
    }

    pub(crate) fn stage(&self) -> BannerStage {
        self.stage
    }

    fn center_x() -> f32 {
        (FRAME_WIDTH as f32 - BANNER_WIDTH) * 0.5
    }

    fn show(&mut self, text: String, world: &mut World) -> Result<(), SceneError> {
        world.scene.set_text(self.label, text)?;
        world
            .scene
            .node_mut(self.node)?
            .set_culled(false)
            .set_position(-BANNER_WIDTH, BANNER_Y);
        self.enter(BannerStage::SlideIn);
        Ok(())
    }

    fn enter(&mut self, stage: BannerStage) {
        self.stage = stage;
        self.timer.set_target(stage.seconds());
        self.timer.restart();
    }

    fn advance(&mut self, sync: f32, world: &mut World) -> Result<(), SceneError> {
        self.timer.update(sync);
        let t = self.timer.progress();
        let center = Self::center_x();
        let x = match self.stage {
            BannerStage::SlideIn => easing::back_out(t, -BANNER_WIDTH, center),
            BannerStage::Hold => center,
            BannerStage::SlideOut => easing::sin_lerp_in(t, center, FRAME_WIDTH as f32),
            BannerStage::Done => -BANNER_WIDTH,
        };
        world.scene.node_mut(self.node)?.set_position(x, BANNER_Y);

        if self.timer.is_complete() {
            let next = self.stage.next();
            if next == BannerStage::Done {
                self.stage = BannerStage::Done;
                world.scene.node_mut(self.node)?.set_culled(true);
            } else {
                self.enter(next);
            }
        }
        Ok(())
    }

    fn step(&mut self, sync: f32, world: &mut World) -> Result<(), SceneError> {
        if world.resetting {
            self.stage = BannerStage::Done;
            world.scene.node_mut(self.node)?.set_culled(true);
        }
        if self.stage == BannerStage::Done {
            let Some(text) = world.banner_requests.pop_front() else {
                return Ok(());
            };
            self.show(text, world)?;
        }
        self.advance(sync, world)
    }
}

impl Actor<World> for Banner {
    fn update(&mut self, sync: f32, world: &mut World) {
        if let Err(error) = self.step(sync, world) {
            warn!(error = %error, "banner_update_failed");
        }
    }

    fn priority(&self) -> i32 {
        BANNER_PRIORITY
    }

    fn name(&self) -> &'static str {
        "banner"
    }
}
