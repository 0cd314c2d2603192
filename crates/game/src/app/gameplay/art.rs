const TERRAIN_TILES: [&str; 4] = ["grass", "road", "tower_base", "turret"];
const GRUNT_FRAME_SIZE: u32 = 12;
const GRUNT_FRAME_SECONDS: f32 = 0.18;
const CASTLE_SIZE: u32 = 40;

#[derive(Debug, Error)]
pub(crate) enum ArtError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Sprites for every entity, built once. Files under the asset root win over
/// the procedural fallbacks.
pub(crate) struct Art {
    pub(crate) road: Sprite,
    pub(crate) tower_base: Sprite,
    pub(crate) turret: Sprite,
    pub(crate) grunt: Sprite,
    pub(crate) bolt: Sprite,
    pub(crate) castle: Sprite,
}

impl Art {
    pub(crate) fn load(store: &mut AssetStore) -> Result<Self, ArtError> {
        let terrain = on_disk_or(store.load_tileset("terrain"), || {
            let tileset = procedural_terrain().map_err(|source| AssetError::Source {
                key: "terrain".to_string(),
                source,
            })?;
            store.insert_tileset("terrain", tileset)
        })?;
        let grunt = on_disk_or(store.load_animation("grunt_walk"), || {
            let image = store.insert_bitmap("grunt", grunt_strip())?;
            let animation = Animation::strip(
                Some(image),
                GRUNT_FRAME_SIZE,
                2,
                GRUNT_FRAME_SECONDS,
                true,
            )
            .map_err(|source| AssetError::Source {
                key: "grunt_walk".to_string(),
                source,
            })?;
            store.insert_animation("grunt_walk", animation.clone())?;
            Ok(animation)
        })?;
        let bolt = on_disk_or(store.load_bitmap("bolt"), || {
            store.insert_bitmap("bolt", bolt_image())
        })?;
        let castle = on_disk_or(store.load_bitmap("castle"), || {
            store.insert_bitmap("castle", castle_image())
        })?;

        let (bitmaps, animations, tilesets) = store.counts();
        info!(bitmaps, animations, tilesets, "art_ready");
        Ok(Self {
            road: Sprite::from_tile_name(Arc::clone(&terrain), "road")?,
            tower_base: Sprite::from_tile_name(Arc::clone(&terrain), "tower_base")?,
            turret: Sprite::from_tile_name(terrain, "turret")?,
            grunt: Sprite::new(grunt)?,
            bolt: bitmap_sprite(bolt)?,
            castle: bitmap_sprite(castle)?,
        })
    }
}

fn on_disk_or<T>(
    loaded: Result<T, AssetError>,
    fallback: impl FnOnce() -> Result<T, AssetError>,
) -> Result<T, AssetError> {
    match loaded {
        Err(AssetError::Io { path, .. }) => {
            debug!(path = %path.display(), "asset_procedural_fallback");
            fallback()
        }
        other => other,
    }
}

fn bitmap_sprite(image: ImageHandle) -> Result<Sprite, SceneError> {
    Sprite::new(Bitmap::new(Some(image))?)
}

fn procedural_terrain() -> Result<Tileset, engine::graphics::ImageSourceError> {
    let tile = TILE_SIZE as u32;
    let image = ImageData::from_fn(tile * TERRAIN_TILES.len() as u32, tile, |x, y| {
        let (index, lx, ly) = (x / tile, x % tile, y);
        match index {
            0 => {
                let speckle = ((lx * 7 + ly * 13) % 5) as u8 * 5;
                [58 + speckle, 118 + speckle, 56, 255]
            }
            1 => {
                let edge = ly == 0 || ly == tile - 1 || lx == 0 || lx == tile - 1;
                if edge {
                    [150, 124, 84, 255]
                } else {
                    [184, 158, 110, 255]
                }
            }
            2 => {
                if lx < 2 || ly < 2 || lx >= tile - 2 || ly >= tile - 2 {
                    [0, 0, 0, 0]
                } else if lx < 4 || ly < 4 || lx >= tile - 4 || ly >= tile - 4 {
                    [70, 72, 84, 255]
                } else {
                    [120, 122, 136, 255]
                }
            }
            _ => {
                let (dx, dy) = (lx as f32 - 9.5, ly as f32 - 9.5);
                let barrel = lx >= 10 && (9..=10).contains(&ly);
                if dx * dx + dy * dy <= 25.0 {
                    [200, 200, 210, 255]
                } else if barrel {
                    [90, 90, 100, 255]
                } else {
                    [0, 0, 0, 0]
                }
            }
        }
    });
    let mut tileset = Tileset::grid(Some(Arc::new(image)), tile, tile)?;
    for (index, name) in TERRAIN_TILES.iter().enumerate() {
        tileset.name_tile(*name, index)?;
    }
    Ok(tileset)
}

/// Two walk frames side by side; only the legs differ.
fn grunt_strip() -> ImageData {
    let size = GRUNT_FRAME_SIZE;
    ImageData::from_fn(size * 2, size, |x, y| {
        let (frame, lx) = (x / size, x % size);
        let (dx, dy) = (lx as f32 - 5.5, y as f32 - 5.0);
        let legs = if frame == 0 { [3, 8] } else { [4, 7] };
        if dx * dx + dy * dy <= 16.0 {
            if dy < -1.0 && dx.abs() < 2.5 {
                [250, 230, 120, 255]
            } else {
                [150, 60, 170, 255]
            }
        } else if y >= 9 && legs.contains(&lx) {
            [60, 30, 70, 255]
        } else {
            [0, 0, 0, 0]
        }
    })
}

fn bolt_image() -> ImageData {
    ImageData::from_fn(6, 6, |x, y| {
        let (dx, dy) = (x as f32 - 2.5, y as f32 - 2.5);
        let d = (dx * dx + dy * dy).sqrt();
        let alpha = (255.0 * (1.0 - d / 3.2)).clamp(0.0, 255.0) as u8;
        [255, 236, 140, alpha]
    })
}

fn castle_image() -> ImageData {
    let size = CASTLE_SIZE;
    ImageData::from_fn(size, size, |x, y| {
        let crenel = y < 6 && (x / 5) % 2 == 1;
        let door = (15..25).contains(&x) && y >= 26;
        if crenel {
            [0, 0, 0, 0]
        } else if door {
            [60, 40, 30, 255]
        } else if x == 0 || x == size - 1 || y == size - 1 || y == 6 {
            [90, 90, 100, 255]
        } else {
            [150, 150, 160, 255]
        }
    })
}
