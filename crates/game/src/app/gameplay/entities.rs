const HEALTH_BAR_WIDTH: f32 = 14.0;
const HEALTH_BAR_HEIGHT: f32 = 2.0;
const PROJECTILE_HIT_RADIUS: f32 = 4.0;
const PROJECTILE_LIFETIME_SECONDS: f32 = 2.0;
const IMPACT_SECONDS: f32 = 0.8;
const IMPACT_RISE: f32 = 16.0;
const CASTLE_FLASH_SECONDS: f32 = 0.45;

/// A pooled entity launched from requests queued on the world.
pub(crate) trait Spawnable: Poolable<World> + Sized {
    type Request;

    const NAME: &'static str;
    const PRIORITY: i32;

    /// Builds an idle instance with its nodes culled.
    fn create(world: &mut World) -> Self;

    fn take_requests(world: &mut World) -> Vec<Self::Request>;

    fn launch(&mut self, id: PoolId, request: Self::Request, world: &mut World);

    /// Hides the instance; called before it returns to the free list.
    fn retire(&mut self, world: &mut World);
}

/// Schedules one pool: drains its requests into instances, then updates
/// every active one.
pub(crate) struct Spawner<T> {
    pool: ActorPool<T>,
}

impl<T: Spawnable> Spawner<T> {
    pub(crate) fn new(world: &mut World) -> Self {
        let mut pool = ActorPool::new(T::NAME).with_priority(T::PRIORITY);
        pool.init(|| T::create(world));
        Self { pool }
    }

    pub(crate) fn pool(&self) -> &ActorPool<T> {
        &self.pool
    }
}

impl<T: Spawnable> Actor<World> for Spawner<T> {
    fn update(&mut self, sync: f32, world: &mut World) {
        if world.resetting {
            self.pool.reset_with(|_, instance| instance.retire(world));
        }
        for request in T::take_requests(world) {
            let id = self.pool.get(|| T::create(world));
            if let Some(instance) = self.pool.instance_mut(id) {
                instance.launch(id, request, world);
            }
            self.pool.set_active(id, true);
        }
        if self.pool.has_active() {
            <ActorPool<T> as Actor<World>>::update(&mut self.pool, sync, world);
        }
    }

    fn priority(&self) -> i32 {
        T::PRIORITY
    }

    fn name(&self) -> &'static str {
        T::NAME
    }
}

pub(crate) struct Enemy {
    id: Option<PoolId>,
    node: NodeId,
    body: NodeId,
    bar_fill: NodeId,
    position: Vec2,
    next_waypoint: usize,
    travelled: f32,
    health: f32,
    max_health: f32,
    speed: f32,
    reward: u32,
}

impl Enemy {
    fn sync_nodes(&self, world: &mut World) {
        let position = self.position;
        world.edit_node(self.node, |node| {
            node.set_position(position.x, position.y);
        });
        let fraction = if self.max_health > 0.0 {
            (self.health / self.max_health).clamp(0.0, 1.0)
        } else {
            0.0
        };
        world.edit_node(self.bar_fill, |node| {
            node.set_size(HEALTH_BAR_WIDTH * fraction, HEALTH_BAR_HEIGHT);
        });
    }
}

impl Spawnable for Enemy {
    type Request = EnemyRequest;

    const NAME: &'static str = "enemies";
    const PRIORITY: i32 = ENEMY_PRIORITY;

    fn create(world: &mut World) -> Self {
        let units = world.layers.units;
        let mut group = SceneNode::group().named("enemy");
        group.set_culled(true);
        let node = world.spawn_under(units, group);

        let mut body = SceneNode::new(world.art.grunt.clone().into()).named("enemy_body");
        body.center_offset();
        let body = world.spawn_under(node, body);

        let bar_y = -(GRUNT_FRAME_SIZE as f32) * 0.5 - 4.0;
        let back = SceneNode::new(ColorLayer::new([50, 10, 10, 220]).into())
            .named("enemy_bar")
            .with_size(HEALTH_BAR_WIDTH, HEALTH_BAR_HEIGHT)
            .at(-HEALTH_BAR_WIDTH * 0.5, bar_y);
        world.spawn_under(node, back);
        let fill = SceneNode::new(ColorLayer::new([90, 220, 90, 255]).into())
            .named("enemy_bar_fill")
            .with_size(HEALTH_BAR_WIDTH, HEALTH_BAR_HEIGHT)
            .at(-HEALTH_BAR_WIDTH * 0.5, bar_y);
        let bar_fill = world.spawn_under(node, fill);

        Self {
            id: None,
            node,
            body,
            bar_fill,
            position: Vec2::ZERO,
            next_waypoint: 0,
            travelled: 0.0,
            health: 0.0,
            max_health: 0.0,
            speed: 0.0,
            reward: 0,
        }
    }

    fn take_requests(world: &mut World) -> Vec<EnemyRequest> {
        std::mem::take(&mut world.enemy_requests)
    }

    fn launch(&mut self, id: PoolId, request: EnemyRequest, world: &mut World) {
        self.id = Some(id);
        self.position = world.map.waypoint(0).unwrap_or(Vec2::ZERO);
        self.next_waypoint = 1;
        self.travelled = 0.0;
        self.health = request.health;
        self.max_health = request.health;
        self.speed = request.speed;
        self.reward = request.reward;
        world.edit_node(self.node, |node| {
            node.set_culled(false);
        });
        if let Ok(sprite) = world.scene.sprite_mut(self.body) {
            if let Ok(animation) = sprite.animation_mut() {
                animation.rewind();
            }
        }
        self.sync_nodes(world);
        world.track_enemy(
            id,
            EnemyTrack {
                position: self.position,
                travelled: 0.0,
            },
        );
    }

    fn retire(&mut self, world: &mut World) {
        world.edit_node(self.node, |node| {
            node.set_culled(true);
        });
        if let Some(id) = self.id.take() {
            world.forget_enemy(id);
        }
    }
}

impl Poolable<World> for Enemy {
    fn update(&mut self, sync: f32, world: &mut World) -> PoolStep {
        let Some(id) = self.id else {
            return PoolStep::Release;
        };

        let damage = world.take_damage(id);
        if damage > 0.0 {
            self.health -= damage;
        }
        if self.health <= 0.0 {
            debug!(enemy = id.index(), reward = self.reward, "enemy_killed");
            world.enemy_killed(id, self.position, self.reward);
            self.retire(world);
            return PoolStep::Release;
        }

        let Some(target) = world.map.waypoint(self.next_waypoint) else {
            world.castle_hit();
            self.retire(world);
            return PoolStep::Release;
        };
        let step = self.speed * sync.max(0.0);
        let next = self.position.move_toward(target, step);
        self.travelled += next.distance(self.position);
        let heading = next.x - self.position.x;
        self.position = next;
        if next == target {
            self.next_waypoint += 1;
        }
        if heading != 0.0 {
            let facing = heading.signum();
            world.edit_node(self.body, |node| {
                node.set_scale(facing, 1.0);
            });
        }

        self.sync_nodes(world);
        world.track_enemy(
            id,
            EnemyTrack {
                position: self.position,
                travelled: self.travelled,
            },
        );
        PoolStep::Continue
    }
}

pub(crate) struct Projectile {
    node: NodeId,
    target: Option<PoolId>,
    position: Vec2,
    aim: Vec2,
    speed: f32,
    damage: f32,
    lifetime: Timer,
}

impl Spawnable for Projectile {
    type Request = ProjectileRequest;

    const NAME: &'static str = "projectiles";
    const PRIORITY: i32 = PROJECTILE_PRIORITY;

    fn create(world: &mut World) -> Self {
        let layer = world.layers.projectiles;
        let mut bolt = SceneNode::new(world.art.bolt.clone().into()).named("projectile");
        bolt.center_offset()
            .set_draw_mode(Some(DrawMode::Additive))
            .set_culled(true);
        let node = world.spawn_under(layer, bolt);
        Self {
            node,
            target: None,
            position: Vec2::ZERO,
            aim: Vec2::ZERO,
            speed: 0.0,
            damage: 0.0,
            lifetime: Timer::new(PROJECTILE_LIFETIME_SECONDS),
        }
    }

    fn take_requests(world: &mut World) -> Vec<ProjectileRequest> {
        std::mem::take(&mut world.projectile_requests)
    }

    fn launch(&mut self, _id: PoolId, request: ProjectileRequest, world: &mut World) {
        self.target = Some(request.target);
        self.position = request.origin;
        self.aim = world
            .enemy(request.target)
            .map_or(request.origin, |track| track.position);
        self.speed = request.speed;
        self.damage = request.damage;
        self.lifetime.restart();
        let (position, angle) = (self.position, (self.aim - self.position).angle());
        world.edit_node(self.node, |node| {
            node.set_culled(false)
                .set_position(position.x, position.y)
                .set_rotation(angle);
        });
    }

    fn retire(&mut self, world: &mut World) {
        self.target = None;
        world.edit_node(self.node, |node| {
            node.set_culled(true);
        });
    }
}

impl Poolable<World> for Projectile {
    fn update(&mut self, sync: f32, world: &mut World) -> PoolStep {
        self.lifetime.update(sync);
        let tracked = self.target.and_then(|target| world.enemy(target));
        if let Some(track) = tracked {
            self.aim = track.position;
        }

        let next = self.position.move_toward(self.aim, self.speed * sync.max(0.0));
        let angle = (self.aim - self.position).angle();
        self.position = next;

        if next.distance(self.aim) <= PROJECTILE_HIT_RADIUS {
            if let (Some(target), Some(_)) = (self.target, tracked) {
                world.apply_damage(target, self.damage);
                world.impact_requests.push(ImpactRequest {
                    position: self.aim,
                    text: format!("-{}", self.damage),
                    color: DAMAGE_COLOR,
                });
            }
            self.retire(world);
            return PoolStep::Release;
        }
        if self.lifetime.is_complete() {
            self.retire(world);
            return PoolStep::Release;
        }

        world.edit_node(self.node, |node| {
            node.set_position(next.x, next.y).set_rotation(angle);
        });
        PoolStep::Continue
    }
}

/// Floating number that rises and fades out.
pub(crate) struct ImpactText {
    node: NodeId,
    origin: Vec2,
    timer: Timer,
}

impl Spawnable for ImpactText {
    type Request = ImpactRequest;

    const NAME: &'static str = "impact_texts";
    const PRIORITY: i32 = IMPACT_PRIORITY;

    fn create(world: &mut World) -> Self {
        let layer = world.layers.effects;
        let text = TextSprite::new("", TEXT_COLOR, 1.0)
            .aligned(TextAlign::Center)
            .with_shadow(SHADOW_COLOR);
        let mut node = SceneNode::new(text.into()).named("impact_text");
        node.set_culled(true);
        let node = world.spawn_under(layer, node);
        Self {
            node,
            origin: Vec2::ZERO,
            timer: Timer::new(IMPACT_SECONDS),
        }
    }

    fn take_requests(world: &mut World) -> Vec<ImpactRequest> {
        std::mem::take(&mut world.impact_requests)
    }

    fn launch(&mut self, _id: PoolId, request: ImpactRequest, world: &mut World) {
        self.origin = request.position;
        self.timer.restart();
        match world.scene.text_mut(self.node) {
            Ok(text) => {
                text.set_text(request.text);
                text.color = request.color;
            }
            Err(error) => warn!(error = %error, "impact_text_missing"),
        }
        let origin = self.origin;
        world.edit_node(self.node, |node| {
            node.set_culled(false)
                .set_position(origin.x, origin.y)
                .set_opacity(1.0)
                .set_scale(0.6, 0.6);
        });
    }

    fn retire(&mut self, world: &mut World) {
        world.edit_node(self.node, |node| {
            node.set_culled(true);
        });
    }
}

impl Poolable<World> for ImpactText {
    fn update(&mut self, sync: f32, world: &mut World) -> PoolStep {
        self.timer.update(sync);
        if self.timer.is_complete() {
            self.retire(world);
            return PoolStep::Release;
        }
        let t = self.timer.progress();
        let y = self.origin.y - easing::quad_out(t, 0.0, IMPACT_RISE);
        let opacity = easing::sin_lerp_in(t, 1.0, 0.0);
        let pop = easing::back_out((t * 4.0).min(1.0), 0.6, 1.0);
        let x = self.origin.x;
        world.edit_node(self.node, |node| {
            node.set_position(x, y).set_opacity(opacity).set_scale(pop, pop);
        });
        PoolStep::Continue
    }
}

/// Fixed turret on a build cell. Fires at the lead enemy in range whenever
/// its cooldown has run out.
pub(crate) struct Tower {
    node: NodeId,
    turret: NodeId,
    position: Vec2,
    rules: TowerRules,
    cooldown: Timer,
}

impl Tower {
    pub(crate) fn build(cell: Cell, world: &mut World) -> Self {
        let position = MapGrid::cell_center(cell);
        let layer = world.layers.towers;
        let node = world.spawn_under(
            layer,
            SceneNode::group().named("tower").at(position.x, position.y),
        );
        let mut base = SceneNode::new(world.art.tower_base.clone().into()).named("tower_base");
        base.center_offset();
        world.spawn_under(node, base);
        let mut turret = SceneNode::new(world.art.turret.clone().into()).named("tower_turret");
        turret.center_offset();
        let turret = world.spawn_under(node, turret);

        let rules = world.rules.tower;
        Self {
            node,
            turret,
            position,
            rules,
            cooldown: Timer::started(rules.cooldown_seconds),
        }
    }

    pub(crate) fn node(&self) -> NodeId {
        self.node
    }
}

impl Actor<World> for Tower {
    fn update(&mut self, sync: f32, world: &mut World) {
        self.cooldown.update(sync);
        let Some((target, track)) = world.target_in_range(self.position, self.rules.range) else {
            return;
        };
        let angle = (track.position - self.position).angle();
        world.edit_node(self.turret, |node| {
            node.set_rotation(angle);
        });
        if self.cooldown.is_complete() {
            world.projectile_requests.push(ProjectileRequest {
                origin: self.position + Vec2::from_angle(angle) * (TILE_SIZE * 0.5),
                target,
                damage: self.rules.damage,
                speed: self.rules.projectile_speed,
            });
            self.cooldown.restart();
        }
    }

    fn priority(&self) -> i32 {
        TOWER_PRIORITY
    }

    fn name(&self) -> &'static str {
        "tower"
    }
}

/// The path's goal. Flashes red each time an enemy gets through.
pub(crate) struct Castle {
    node: NodeId,
    flash: NodeId,
    flash_timer: Timer,
}

impl Castle {
    pub(crate) fn build(world: &mut World) -> Self {
        let position = world.map.last_waypoint();
        let layer = world.layers.towers;
        let node = world.spawn_under(
            layer,
            SceneNode::group().named("castle").at(position.x, position.y),
        );
        let mut body = SceneNode::new(world.art.castle.clone().into()).named("castle_body");
        body.center_offset();
        world.spawn_under(node, body);

        let half = CASTLE_SIZE as f32 * 0.5;
        let mut flash = SceneNode::new(ColorLayer::new([255, 40, 30, 255]).into())
            .named("castle_flash")
            .with_size(CASTLE_SIZE as f32, CASTLE_SIZE as f32)
            .at(-half, -half);
        flash
            .set_draw_mode(Some(DrawMode::Additive))
            .set_opacity(0.0);
        let flash = world.spawn_under(node, flash);

        Self {
            node,
            flash,
            flash_timer: Timer::new(CASTLE_FLASH_SECONDS),
        }
    }
}

impl Actor<World> for Castle {
    fn update(&mut self, sync: f32, world: &mut World) {
        if world.resetting {
            self.flash_timer.reset();
        }
        if world.events().contains(&WorldEvent::CastleHit) {
            self.flash_timer.restart();
        }
        self.flash_timer.update(sync);

        let (opacity, scale) = if self.flash_timer.is_running() {
            let t = self.flash_timer.progress();
            (easing::pulse(t, 0.0, 0.85), easing::pulse(t, 1.0, 1.08))
        } else {
            (0.0, 1.0)
        };
        world.edit_node(self.flash, |node| {
            node.set_opacity(opacity);
        });
        world.edit_node(self.node, |node| {
            node.set_scale(scale, scale);
        });
    }

    fn priority(&self) -> i32 {
        CASTLE_PRIORITY
    }

    fn name(&self) -> &'static str {
        "castle"
    }
}
