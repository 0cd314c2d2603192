mod atlas;
mod keys;
mod manifest;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use thiserror::Error;
use tracing::{debug, info};

use crate::graphics::{Animation, ImageData, ImageHandle, ImageSourceError, Tileset};

pub use atlas::{parse_atlas, AtlasDefinition};
pub use keys::{validate_asset_key, AssetKeyError};
pub use manifest::{AnimationManifest, FrameEntry};

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("invalid asset key '{key}': {source}")]
    InvalidKey {
        key: String,
        #[source]
        source: AssetKeyError,
    },
    #[error("failed to read asset file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("atlas {path} is invalid: {message}")]
    Atlas { path: PathBuf, message: String },
    #[error("animation manifest {path} is invalid: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("asset '{key}' cannot be built: {source}")]
    Source {
        key: String,
        #[source]
        source: ImageSourceError,
    },
    #[error("no {kind} named '{key}' is loaded")]
    NotFound { kind: &'static str, key: String },
}

/// Named decoded assets rooted at one directory:
///
/// - `images/<key>.png` bitmaps
/// - `atlases/<key>.xml` tilesets
/// - `animations/<key>.json` animations
///
/// Everything is resolved when loaded, so lookups at draw time cannot fail
/// on missing files.
#[derive(Debug, Default)]
pub struct AssetStore {
    root: PathBuf,
    bitmaps: HashMap<String, ImageHandle>,
    animations: HashMap<String, Animation>,
    tilesets: HashMap<String, Arc<Tileset>>,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn insert_bitmap(&mut self, key: &str, image: ImageData) -> Result<ImageHandle, AssetError> {
        checked(key)?;
        let handle = Arc::new(image);
        self.bitmaps.insert(key.to_string(), Arc::clone(&handle));
        Ok(handle)
    }

    pub fn insert_animation(&mut self, key: &str, animation: Animation) -> Result<(), AssetError> {
        checked(key)?;
        self.animations.insert(key.to_string(), animation);
        Ok(())
    }

    pub fn insert_tileset(&mut self, key: &str, tileset: Tileset) -> Result<Arc<Tileset>, AssetError> {
        checked(key)?;
        let tileset = Arc::new(tileset);
        self.tilesets.insert(key.to_string(), Arc::clone(&tileset));
        Ok(tileset)
    }

    /// Decodes `images/<key>.png` once; later calls return the cached handle.
    pub fn load_bitmap(&mut self, key: &str) -> Result<ImageHandle, AssetError> {
        checked(key)?;
        if let Some(handle) = self.bitmaps.get(key) {
            return Ok(Arc::clone(handle));
        }
        let path = self.asset_path("images", key, "png");
        let reader = ImageReader::open(&path).map_err(|source| AssetError::Io {
            path: path.clone(),
            source,
        })?;
        let decoded = reader.decode().map_err(|source| AssetError::Decode {
            path: path.clone(),
            source,
        })?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        let image = ImageData::new(width, height, rgba.into_raw()).ok_or_else(|| {
            AssetError::Source {
                key: key.to_string(),
                source: ImageSourceError::InvalidSource,
            }
        })?;
        info!(key, width, height, path = %path.display(), "bitmap_loaded");
        self.insert_bitmap(key, image)
    }

    /// Reads `atlases/<key>.xml` and the bitmap it names.
    pub fn load_tileset(&mut self, key: &str) -> Result<Arc<Tileset>, AssetError> {
        checked(key)?;
        if let Some(tileset) = self.tilesets.get(key) {
            return Ok(Arc::clone(tileset));
        }
        let path = self.asset_path("atlases", key, "xml");
        let raw = read_text(&path)?;
        let atlas = parse_atlas(&raw).map_err(|message| AssetError::Atlas {
            path: path.clone(),
            message,
        })?;
        let image = self.load_bitmap(&atlas.image)?;
        let tile_count = atlas.regions.len();
        let tileset = Tileset::from_regions(Some(image), atlas.regions)
            .map_err(|source| source_error(key, source))?;
        info!(key, tile_count, "tileset_loaded");
        self.insert_tileset(key, tileset)
    }

    /// Reads `animations/<key>.json` and the bitmap it names.
    pub fn load_animation(&mut self, key: &str) -> Result<Animation, AssetError> {
        checked(key)?;
        if let Some(animation) = self.animations.get(key) {
            return Ok(fresh(animation));
        }
        let path = self.asset_path("animations", key, "json");
        let raw = read_text(&path)?;
        let manifest: AnimationManifest =
            serde_json::from_str(&raw).map_err(|source| AssetError::Manifest {
                path: path.clone(),
                source,
            })?;
        let image = self.load_bitmap(&manifest.image)?;
        let animation = Animation::new(Some(image), manifest.frames(), manifest.looping)
            .map_err(|source| source_error(key, source))?;
        info!(
            key,
            frames = animation.frame_count(),
            looping = animation.looping(),
            "animation_loaded"
        );
        self.insert_animation(key, animation.clone())?;
        Ok(animation)
    }

    pub fn bitmap(&self, key: &str) -> Result<ImageHandle, AssetError> {
        self.bitmaps
            .get(key)
            .cloned()
            .ok_or_else(|| not_found("bitmap", key))
    }

    /// Each call returns an independent playback state at frame 0.
    pub fn animation(&self, key: &str) -> Result<Animation, AssetError> {
        self.animations
            .get(key)
            .map(fresh)
            .ok_or_else(|| not_found("animation", key))
    }

    pub fn tileset(&self, key: &str) -> Result<Arc<Tileset>, AssetError> {
        self.tilesets
            .get(key)
            .cloned()
            .ok_or_else(|| not_found("tileset", key))
    }

    pub fn counts(&self) -> (usize, usize, usize) {
        (self.bitmaps.len(), self.animations.len(), self.tilesets.len())
    }

    fn asset_path(&self, dir: &str, key: &str, extension: &str) -> PathBuf {
        let path = self.root.join(dir).join(format!("{key}.{extension}"));
        debug!(key, path = %path.display(), "asset_path_resolved");
        path
    }
}

fn checked(key: &str) -> Result<(), AssetError> {
    validate_asset_key(key).map_err(|source| AssetError::InvalidKey {
        key: key.to_string(),
        source,
    })
}

fn read_text(path: &Path) -> Result<String, AssetError> {
    fs::read_to_string(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn fresh(animation: &Animation) -> Animation {
    let mut animation = animation.clone();
    animation.rewind();
    animation
}

fn source_error(key: &str, source: ImageSourceError) -> AssetError {
    AssetError::Source {
        key: key.to_string(),
        source,
    }
}

fn not_found(kind: &'static str, key: &str) -> AssetError {
    AssetError::NotFound {
        kind,
        key: key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(root: &Path, key: &str, width: u32, height: u32) {
        let path = root.join("images").join(format!("{key}.png"));
        fs::create_dir_all(path.parent().expect("parent")).expect("images dir");
        image::RgbaImage::from_pixel(width, height, image::Rgba([200, 10, 10, 255]))
            .save(&path)
            .expect("write png");
    }

    fn write_file(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().expect("parent")).expect("dir");
        fs::write(path, contents).expect("write");
    }

    #[test]
    fn load_bitmap_decodes_and_caches() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_png(dir.path(), "castle", 6, 3);
        let mut store = AssetStore::new(dir.path());

        let first = store.load_bitmap("castle").expect("load");
        assert_eq!((first.width(), first.height()), (6, 3));
        assert_eq!(first.pixel(0, 0), Some([200, 10, 10, 255]));
        let second = store.load_bitmap("castle").expect("cached");
        assert!(Arc::ptr_eq(&first, &second));
        assert!(store.bitmap("castle").is_ok());
    }

    #[test]
    fn missing_file_is_io_error_and_lookup_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = AssetStore::new(dir.path());
        assert!(matches!(store.load_bitmap("ghost"), Err(AssetError::Io { .. })));
        assert!(matches!(
            store.bitmap("ghost"),
            Err(AssetError::NotFound { kind: "bitmap", .. })
        ));
        assert!(matches!(
            store.load_bitmap("../escape"),
            Err(AssetError::InvalidKey { .. })
        ));
    }

    #[test]
    fn load_tileset_from_atlas() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_png(dir.path(), "tiles", 32, 16);
        write_file(
            dir.path(),
            "atlases/tiles.xml",
            r#"<TextureAtlas imagePath="tiles.png">
                <SubTexture name="grass" x="0" y="0" width="16" height="16"/>
                <SubTexture name="road" x="16" y="0" width="16" height="16"/>
            </TextureAtlas>"#,
        );
        let mut store = AssetStore::new(dir.path());
        let tiles = store.load_tileset("tiles").expect("tileset");
        assert_eq!(tiles.tile_count(), 2);
        assert_eq!(tiles.tile_index("road"), Ok(1));
        assert!(store.tileset("tiles").is_ok());
    }

    #[test]
    fn atlas_region_outside_image_fails_at_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_png(dir.path(), "tiles", 16, 16);
        write_file(
            dir.path(),
            "atlases/tiles.xml",
            r#"<TextureAtlas imagePath="tiles"><SubTexture name="big" x="8" y="0" width="16" height="16"/></TextureAtlas>"#,
        );
        let mut store = AssetStore::new(dir.path());
        assert!(matches!(
            store.load_tileset("tiles"),
            Err(AssetError::Source {
                source: ImageSourceError::RegionOutOfBounds { .. },
                ..
            })
        ));
    }

    #[test]
    fn load_animation_from_manifest_returns_fresh_copies() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_png(dir.path(), "grunt", 16, 8);
        write_file(
            dir.path(),
            "animations/grunt_walk.json",
            r#"{"image":"grunt","looping":false,"frames":[
                {"x":0,"y":0,"width":8,"height":8,"duration":0.1},
                {"x":8,"y":0,"width":8,"height":8,"duration":0.1}
            ]}"#,
        );
        let mut store = AssetStore::new(dir.path());
        let mut walk = store.load_animation("grunt_walk").expect("animation");
        assert!(!walk.looping());
        walk.update(1.0);
        assert!(walk.is_finished());
        let again = store.animation("grunt_walk").expect("lookup");
        assert_eq!(again.current_frame(), 0);
        assert!(!again.is_finished());
    }

    #[test]
    fn bad_manifest_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_file(dir.path(), "animations/bad.json", r#"{"image": 3}"#);
        let mut store = AssetStore::new(dir.path());
        let error = store.load_animation("bad").unwrap_err();
        assert!(matches!(error, AssetError::Manifest { .. }));
        assert!(error.to_string().contains("bad.json"));
    }
}
