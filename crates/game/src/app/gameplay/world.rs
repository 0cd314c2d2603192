/// Grid cell as `(column, row)`.
pub(crate) type Cell = (i32, i32);

/// Road layout and build occupancy on the tile grid.
#[derive(Debug, Clone)]
pub(crate) struct MapGrid {
    waypoints: Vec<Vec2>,
    road: HashSet<Cell>,
    occupied: HashSet<Cell>,
}

impl MapGrid {
    /// `path` must already be validated as axis-aligned steps.
    pub(crate) fn from_path(path: &[[i32; 2]]) -> Self {
        let mut road = HashSet::new();
        for pair in path.windows(2) {
            let ([c0, r0], [c1, r1]) = (pair[0], pair[1]);
            let (dc, dr) = ((c1 - c0).signum(), (r1 - r0).signum());
            let (mut column, mut row) = (c0, r0);
            road.insert((column, row));
            while (column, row) != (c1, r1) {
                column += dc;
                row += dr;
                road.insert((column, row));
            }
        }
        if let [[column, row]] = path {
            road.insert((*column, *row));
        }
        Self {
            waypoints: path
                .iter()
                .map(|&[column, row]| Self::cell_center((column, row)))
                .collect(),
            road,
            occupied: HashSet::new(),
        }
    }

    pub(crate) fn cell_center((column, row): Cell) -> Vec2 {
        Vec2::new(
            column as f32 * TILE_SIZE + TILE_SIZE * 0.5,
            row as f32 * TILE_SIZE + TILE_SIZE * 0.5,
        )
    }

    pub(crate) fn cell_origin((column, row): Cell) -> Vec2 {
        Vec2::new(column as f32 * TILE_SIZE, row as f32 * TILE_SIZE)
    }

    pub(crate) fn cell_at(point: Vec2) -> Option<Cell> {
        let column = (point.x / TILE_SIZE).floor() as i32;
        let row = (point.y / TILE_SIZE).floor() as i32;
        let inside = point.x >= 0.0
            && point.y >= 0.0
            && (0..GRID_COLUMNS).contains(&column)
            && (0..GRID_ROWS).contains(&row);
        inside.then_some((column, row))
    }

    pub(crate) fn waypoint(&self, index: usize) -> Option<Vec2> {
        self.waypoints.get(index).copied()
    }

    pub(crate) fn last_waypoint(&self) -> Vec2 {
        self.waypoints.last().copied().unwrap_or(Vec2::ZERO)
    }

    pub(crate) fn road_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.road.iter().copied()
    }

    pub(crate) fn is_road(&self, cell: Cell) -> bool {
        self.road.contains(&cell)
    }

    pub(crate) fn is_buildable(&self, cell: Cell) -> bool {
        let (column, row) = cell;
        (0..GRID_COLUMNS).contains(&column)
            && (HUD_ROWS..GRID_ROWS).contains(&row)
            && !self.road.contains(&cell)
            && !self.occupied.contains(&cell)
    }

    pub(crate) fn occupy(&mut self, cell: Cell) {
        self.occupied.insert(cell);
    }

    pub(crate) fn clear_occupied(&mut self) {
        self.occupied.clear();
    }
}

/// Draw-order groups under the scene root.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Layers {
    pub(crate) ground: NodeId,
    pub(crate) towers: NodeId,
    pub(crate) units: NodeId,
    pub(crate) projectiles: NodeId,
    pub(crate) effects: NodeId,
    pub(crate) hud: NodeId,
    pub(crate) overlay: NodeId,
}

/// Things that happened this tick. Cleared when the next tick begins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum WorldEvent {
    CastleHit,
    EnemyKilled { reward: u32 },
    WaveStarted(u32),
    WaveCleared(u32),
    TowerBuilt(Cell),
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct EnemyTrack {
    pub(crate) position: Vec2,
    /// Distance walked along the path; towers prefer the leader.
    pub(crate) travelled: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct EnemyRequest {
    pub(crate) health: f32,
    pub(crate) speed: f32,
    pub(crate) reward: u32,
}

impl From<WaveRules> for EnemyRequest {
    fn from(rules: WaveRules) -> Self {
        Self {
            health: rules.health,
            speed: rules.speed,
            reward: rules.reward,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ProjectileRequest {
    pub(crate) origin: Vec2,
    pub(crate) target: PoolId,
    pub(crate) damage: f32,
    pub(crate) speed: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ImpactRequest {
    pub(crate) position: Vec2,
    pub(crate) text: String,
    pub(crate) color: Color,
}

/// Shared state handed to every actor update. Actors never reach each other
/// directly; they read tracks and queue requests here.
pub(crate) struct World {
    pub(crate) scene: SceneGraph,
    pub(crate) layers: Layers,
    pub(crate) art: Art,
    pub(crate) rules: GameConfig,
    pub(crate) map: MapGrid,
    pub(crate) pointer: PointerState,
    pub(crate) lives: u32,
    pub(crate) gold: u32,
    pub(crate) score: u32,
    pub(crate) wave: u32,
    pub(crate) wave_in_progress: bool,
    pub(crate) game_over: bool,
    /// Set for the one tick in which pooled actors release everything.
    pub(crate) resetting: bool,
    pub(crate) start_wave_requested: bool,
    pub(crate) enemy_requests: Vec<EnemyRequest>,
    pub(crate) projectile_requests: Vec<ProjectileRequest>,
    pub(crate) impact_requests: Vec<ImpactRequest>,
    pub(crate) tower_requests: Vec<Cell>,
    pub(crate) banner_requests: VecDeque<String>,
    enemies: HashMap<PoolId, EnemyTrack>,
    damage: HashMap<PoolId, f32>,
    events: Vec<WorldEvent>,
}

impl World {
    pub(crate) fn new(rules: GameConfig, art: Art) -> Self {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let mut layer = |name: &'static str| {
            let id = scene.insert(SceneNode::group().named(name));
            if let Err(error) = scene.add_child(root, id) {
                warn!(error = %error, layer = name, "layer_attach_failed");
            }
            id
        };
        let layers = Layers {
            ground: layer("ground"),
            towers: layer("towers"),
            units: layer("units"),
            projectiles: layer("projectiles"),
            effects: layer("effects"),
            hud: layer("hud"),
            overlay: layer("overlay"),
        };
        let map = MapGrid::from_path(&rules.path);
        let mut world = Self {
            scene,
            layers,
            art,
            lives: rules.starting_lives,
            gold: rules.starting_gold,
            score: 0,
            wave: 0,
            rules,
            map,
            pointer: PointerState::default(),
            wave_in_progress: false,
            game_over: false,
            resetting: false,
            start_wave_requested: false,
            enemy_requests: Vec::new(),
            projectile_requests: Vec::new(),
            impact_requests: Vec::new(),
            tower_requests: Vec::new(),
            banner_requests: VecDeque::new(),
            enemies: HashMap::new(),
            damage: HashMap::new(),
            events: Vec::new(),
        };
        world.build_ground();
        world
    }

    fn build_ground(&mut self) {
        let ground = self.layers.ground;
        let grass = SceneNode::new(ColorLayer::new([62, 122, 58, 255]).into())
            .named("grass")
            .with_size(FRAME_WIDTH as f32, FRAME_HEIGHT as f32);
        self.spawn_under(ground, grass);

        let mut cells: Vec<Cell> = self.map.road_cells().collect();
        cells.sort_unstable_by_key(|&(column, row)| (row, column));
        for cell in cells {
            let origin = MapGrid::cell_origin(cell);
            let tile = SceneNode::new(self.art.road.clone().into())
                .named("road")
                .at(origin.x, origin.y);
            self.spawn_under(ground, tile);
        }
    }

    /// Attaches a new node under `parent`, logging when the parent is gone.
    pub(crate) fn spawn_under(&mut self, parent: NodeId, node: SceneNode) -> NodeId {
        let id = self.scene.insert(node);
        if let Err(error) = self.scene.add_child(parent, id) {
            warn!(error = %error, "node_attach_failed");
        }
        id
    }

    pub(crate) fn edit_node(&mut self, id: NodeId, edit: impl FnOnce(&mut SceneNode)) {
        match self.scene.node_mut(id) {
            Ok(node) => edit(node),
            Err(error) => warn!(error = %error, "node_edit_failed"),
        }
    }

    pub(crate) fn begin_tick(&mut self, pointer: PointerState) {
        self.events.clear();
        self.pointer = pointer;
    }

    pub(crate) fn events(&self) -> &[WorldEvent] {
        &self.events
    }

    pub(crate) fn push_event(&mut self, event: WorldEvent) {
        self.events.push(event);
    }

    pub(crate) fn track_enemy(&mut self, id: PoolId, track: EnemyTrack) {
        self.enemies.insert(id, track);
    }

    pub(crate) fn forget_enemy(&mut self, id: PoolId) {
        self.enemies.remove(&id);
        self.damage.remove(&id);
    }

    pub(crate) fn enemy(&self, id: PoolId) -> Option<EnemyTrack> {
        self.enemies.get(&id).copied()
    }

    pub(crate) fn enemies_alive(&self) -> usize {
        self.enemies.len()
    }

    /// Enemy furthest along the path within `range` of `from`.
    pub(crate) fn target_in_range(&self, from: Vec2, range: f32) -> Option<(PoolId, EnemyTrack)> {
        let range_squared = range * range;
        self.enemies
            .iter()
            .filter(|(_, track)| track.position.distance_squared(from) <= range_squared)
            .max_by(|(a_id, a), (b_id, b)| {
                a.travelled
                    .total_cmp(&b.travelled)
                    .then_with(|| b_id.cmp(a_id))
            })
            .map(|(id, track)| (*id, *track))
    }

    pub(crate) fn apply_damage(&mut self, id: PoolId, amount: f32) {
        if self.enemies.contains_key(&id) {
            *self.damage.entry(id).or_insert(0.0) += amount;
        }
    }

    pub(crate) fn take_damage(&mut self, id: PoolId) -> f32 {
        self.damage.remove(&id).unwrap_or(0.0)
    }

    pub(crate) fn enemy_killed(&mut self, id: PoolId, position: Vec2, reward: u32) {
        self.forget_enemy(id);
        self.gold = self.gold.saturating_add(reward);
        self.score = self.score.saturating_add(reward * 10);
        self.events.push(WorldEvent::EnemyKilled { reward });
        self.impact_requests.push(ImpactRequest {
            position,
            text: format!("+{reward}"),
            color: GOLD_COLOR,
        });
    }

    /// An enemy reached the castle.
    pub(crate) fn castle_hit(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        self.events.push(WorldEvent::CastleHit);
        if self.lives == 0 && !self.game_over {
            self.game_over = true;
            self.wave_in_progress = false;
            self.events.push(WorldEvent::GameOver);
            self.banner_requests.push_back("GAME OVER".to_string());
            info!(score = self.score, wave = self.wave, "game_over");
        }
    }

    pub(crate) fn can_build(&self, cell: Cell) -> bool {
        !self.game_over && self.gold >= self.rules.tower_cost && self.map.is_buildable(cell)
    }

    pub(crate) fn can_start_wave(&self) -> bool {
        !self.wave_in_progress && !self.game_over
    }

    /// Back to the opening state. Pooled actors release on the next tick.
    pub(crate) fn reset_state(&mut self) {
        self.lives = self.rules.starting_lives;
        self.gold = self.rules.starting_gold;
        self.score = 0;
        self.wave = 0;
        self.wave_in_progress = false;
        self.game_over = false;
        self.resetting = true;
        self.start_wave_requested = false;
        self.enemy_requests.clear();
        self.projectile_requests.clear();
        self.impact_requests.clear();
        self.tower_requests.clear();
        self.banner_requests.clear();
        self.enemies.clear();
        self.damage.clear();
        self.events.clear();
        self.map.clear_occupied();
    }
}
