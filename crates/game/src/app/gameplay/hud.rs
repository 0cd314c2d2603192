const HUD_BAR_HEIGHT: f32 = TILE_SIZE * HUD_ROWS as f32;
const START_BUTTON_ORIGIN: Vec2 = Vec2::new(544.0, 2.0);
const START_BUTTON_SIZE: Vec2 = Vec2::new(92.0, 16.0);
const RANGE_RING_SEGMENTS: usize = 32;

/// Outline of a tower's reach, centered in its node.
struct RangeRing {
    radius: f32,
    color: Color,
}

impl DrawHook for RangeRing {
    fn draw(&self, surface: &mut dyn DrawSurface, size: Vec2) {
        let center = size * 0.5;
        let points: Vec<Vec2> = (0..RANGE_RING_SEGMENTS)
            .map(|i| {
                let angle = i as f32 * TAU / RANGE_RING_SEGMENTS as f32;
                center + Vec2::from_angle(angle) * self.radius
            })
            .collect();
        surface.stroke_path(&points, true, self.color, 1.0);
    }
}

/// Status bar, start-wave button and the build cursor.
pub(crate) struct Hud {
    status: NodeId,
    wave_label: NodeId,
    start_button: NodeId,
    marker: NodeId,
    shown: Option<(u32, u32, u32, u32)>,
    button_enabled: bool,
}

impl Hud {
    pub(crate) fn build(world: &mut World) -> Self {
        let layer = world.layers.hud;

        let mut marker = SceneNode::new(TileMarker::default().into())
            .named("build_marker")
            .with_size(TILE_SIZE, TILE_SIZE);
        marker.set_culled(true);
        let marker = world.spawn_under(layer, marker);
        let radius = world.rules.tower.range;
        let mut ring = SceneNode::new(NodeContent::Custom(Box::new(RangeRing {
            radius,
            color: [255, 255, 255, 90],
        })))
        .named("range_ring")
        .with_size(radius * 2.0, radius * 2.0)
        .at(TILE_SIZE * 0.5, TILE_SIZE * 0.5);
        ring.set_offset(radius, radius);
        world.spawn_under(marker, ring);

        let bar = SceneNode::new(ColorLayer::new([20, 22, 30, 230]).into())
            .named("hud_bar")
            .with_size(FRAME_WIDTH as f32, HUD_BAR_HEIGHT);
        world.spawn_under(layer, bar);
        let status = world.spawn_under(
            layer,
            SceneNode::new(TextSprite::new("", TEXT_COLOR, 1.0).into())
                .named("hud_status")
                .at(6.0, 7.0),
        );
        let wave_label = world.spawn_under(
            layer,
            SceneNode::new(
                TextSprite::new("", GOLD_COLOR, 1.0)
                    .aligned(TextAlign::Right)
                    .into(),
            )
            .named("hud_wave")
            .at(START_BUTTON_ORIGIN.x - 8.0, 7.0),
        );
        let mut button = SoftButton::new("START WAVE");
        button.label_scale = 1.0;
        let start_button = world.spawn_under(
            layer,
            SceneNode::new(button.into())
                .named("start_button")
                .with_size(START_BUTTON_SIZE.x, START_BUTTON_SIZE.y)
                .at(START_BUTTON_ORIGIN.x, START_BUTTON_ORIGIN.y),
        );

        Self {
            status,
            wave_label,
            start_button,
            marker,
            shown: None,
            button_enabled: true,
        }
    }

    pub(crate) fn start_button(&self) -> NodeId {
        self.start_button
    }

    fn refresh(&mut self, world: &mut World) -> Result<(), SceneError> {
        let values = (world.lives, world.gold, world.score, world.wave);
        if self.shown != Some(values) {
            let (lives, gold, score, wave) = values;
            world
                .scene
                .set_text(self.status, format!("LIVES {lives}  GOLD {gold}  SCORE {score}"))?;
            world.scene.set_text(self.wave_label, format!("WAVE {wave}"))?;
            self.shown = Some(values);
        }

        let enabled = world.can_start_wave();
        if enabled != self.button_enabled {
            world.scene.button_mut(self.start_button)?.set_enabled(enabled);
            self.button_enabled = enabled;
        }
        let pointer = world.pointer;
        let event = world
            .scene
            .handle_button_pointer(self.start_button, pointer.position, pointer.down)?;
        if event == ButtonEvent::Clicked {
            info!(wave = world.wave + 1, "start_wave_clicked");
            world.start_wave_requested = true;
        }

        self.track_build_cursor(world)
    }

    fn track_build_cursor(&mut self, world: &mut World) -> Result<(), SceneError> {
        let pointer = world.pointer;
        let hovered = pointer
            .position
            .and_then(|point| MapGrid::cell_at(point).map(|cell| (point, cell)))
            .filter(|(_, (_, row))| *row >= HUD_ROWS);
        let Some((point, cell)) = hovered else {
            world.scene.node_mut(self.marker)?.set_culled(true);
            return Ok(());
        };

        let valid = world.can_build(cell);
        let origin = MapGrid::cell_origin(cell);
        let marker = world.scene.node_mut(self.marker)?;
        marker.set_culled(false).set_position(origin.x, origin.y);
        if let NodeContent::TileMarker(tile) = &mut marker.content {
            tile.valid = valid;
        }

        let on_button = world.scene.hit_test(point) == Some(self.start_button);
        if pointer.pressed && valid && !on_button {
            world.tower_requests.push(cell);
        }
        Ok(())
    }
}

impl Actor<World> for Hud {
    fn update(&mut self, _sync: f32, world: &mut World) {
        if world.resetting {
            self.shown = None;
        }
        if let Err(error) = self.refresh(world) {
            warn!(error = %error, "hud_update_failed");
        }
    }

    fn priority(&self) -> i32 {
        HUD_PRIORITY
    }

    fn name(&self) -> &'static str {
        "hud"
    }
}
