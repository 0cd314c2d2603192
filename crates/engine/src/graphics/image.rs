use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use super::{DrawSurface, ImageHandle};
use crate::math::Rect;

/// Frames shorter than this are stretched so a zero-duration strip cannot
/// spin the advance loop forever.
const MIN_FRAME_SECONDS: f32 = 0.001;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageSourceError {
    #[error("image source requires a decoded image handle")]
    InvalidSource,
    #[error("animation requires at least one frame")]
    EmptyAnimation,
    #[error("unknown tile name '{name}'")]
    UnknownTile { name: String },
    #[error("tile index {index} out of range for tileset with {count} tiles")]
    TileOutOfRange { index: usize, count: usize },
    #[error("source region {region:?} exceeds image bounds {width}x{height}")]
    RegionOutOfBounds {
        region: SourceRect,
        width: u32,
        height: u32,
    },
}

/// Decoded RGBA8 pixels, row-major, no padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl ImageData {
    /// Returns `None` when the buffer length does not match `width * height * 4`.
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            rgba,
        })
    }

    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        Self::from_fn(width, height, |_, _| color)
    }

    pub fn from_fn(width: u32, height: u32, mut pixel: impl FnMut(u32, u32) -> [u8; 4]) -> Self {
        let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                rgba.extend_from_slice(&pixel(x, y));
            }
        }
        Self {
            width,
            height,
            rgba,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn full_rect(&self) -> SourceRect {
        SourceRect::new(0, 0, self.width, self.height)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.rgba.get(offset..offset + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    pub fn as_rgba(&self) -> &[u8] {
        &self.rgba
    }
}

/// Pixel rectangle inside an `ImageData`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl SourceRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn fits_within(&self, image: &ImageData) -> bool {
        let right = self.x as u64 + self.width as u64;
        let bottom = self.y as u64 + self.height as u64;
        right <= image.width() as u64 && bottom <= image.height() as u64
    }

    pub(crate) fn dest_at(&self, x: f32, y: f32) -> Rect {
        Rect::new(x, y, self.width as f32, self.height as f32)
    }
}

fn validate_region(image: &ImageData, region: SourceRect) -> Result<SourceRect, ImageSourceError> {
    if region.fits_within(image) {
        Ok(region)
    } else {
        Err(ImageSourceError::RegionOutOfBounds {
            region,
            width: image.width(),
            height: image.height(),
        })
    }
}

/// One fixed rectangle over a decoded image.
#[derive(Debug, Clone)]
pub struct Bitmap {
    image: ImageHandle,
    region: SourceRect,
}

impl Bitmap {
    pub fn new(image: Option<ImageHandle>) -> Result<Self, ImageSourceError> {
        let image = image.ok_or(ImageSourceError::InvalidSource)?;
        let region = image.full_rect();
        Ok(Self { image, region })
    }

    pub fn region(image: Option<ImageHandle>, region: SourceRect) -> Result<Self, ImageSourceError> {
        let image = image.ok_or(ImageSourceError::InvalidSource)?;
        let region = validate_region(&image, region)?;
        Ok(Self { image, region })
    }

    pub fn width(&self) -> u32 {
        self.region.width
    }

    pub fn height(&self) -> u32 {
        self.region.height
    }

    pub fn image(&self) -> &ImageHandle {
        &self.image
    }

    pub fn source_rect(&self) -> SourceRect {
        self.region
    }

    pub fn draw(&self, surface: &mut dyn DrawSurface, x: f32, y: f32) {
        surface.draw_image(&self.image, self.region, self.region.dest_at(x, y));
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationFrame {
    pub region: SourceRect,
    pub duration_seconds: f32,
}

/// Frame strip over one image. Timing state is per instance; the frame list
/// is shared between clones.
#[derive(Debug, Clone)]
pub struct Animation {
    image: ImageHandle,
    frames: Arc<[AnimationFrame]>,
    looping: bool,
    current: usize,
    frame_elapsed: f32,
    finished: bool,
}

impl Animation {
    pub fn new(
        image: Option<ImageHandle>,
        frames: Vec<AnimationFrame>,
        looping: bool,
    ) -> Result<Self, ImageSourceError> {
        let image = image.ok_or(ImageSourceError::InvalidSource)?;
        if frames.is_empty() {
            return Err(ImageSourceError::EmptyAnimation);
        }
        let mut validated = Vec::with_capacity(frames.len());
        for frame in frames {
            validated.push(AnimationFrame {
                region: validate_region(&image, frame.region)?,
                duration_seconds: frame.duration_seconds.max(MIN_FRAME_SECONDS),
            });
        }
        Ok(Self {
            image,
            frames: validated.into(),
            looping,
            current: 0,
            frame_elapsed: 0.0,
            finished: false,
        })
    }

    /// Horizontal strip of equally sized frames starting at the image origin.
    pub fn strip(
        image: Option<ImageHandle>,
        frame_width: u32,
        frame_count: u32,
        frame_seconds: f32,
        looping: bool,
    ) -> Result<Self, ImageSourceError> {
        let height = image.as_ref().map(|img| img.height()).unwrap_or(0);
        let frames = (0..frame_count)
            .map(|index| AnimationFrame {
                region: SourceRect::new(index * frame_width, 0, frame_width, height),
                duration_seconds: frame_seconds,
            })
            .collect();
        Self::new(image, frames, looping)
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
        if looping {
            self.finished = false;
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn current_frame(&self) -> usize {
        self.current
    }

    /// Non-looping animations hold their last frame once finished.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn rewind(&mut self) {
        self.current = 0;
        self.frame_elapsed = 0.0;
        self.finished = false;
    }

    /// Largest frame extents; sprites size themselves from this.
    pub fn width(&self) -> u32 {
        self.frames.iter().map(|f| f.region.width).max().unwrap_or(0)
    }

    pub fn height(&self) -> u32 {
        self.frames.iter().map(|f| f.region.height).max().unwrap_or(0)
    }

    /// Advances by `sync` seconds. Steps taken per call are bounded by the
    /// frame count however large `sync` is.
    pub fn update(&mut self, sync: f32) {
        if self.finished || !sync.is_finite() || sync <= 0.0 {
            return;
        }
        self.frame_elapsed += sync;
        let total = self.total_seconds();
        if !self.frame_elapsed.is_finite() || self.frame_elapsed >= total {
            if !self.looping {
                self.finish();
                return;
            }
            // Whole cycles land back on the current frame.
            self.frame_elapsed = if self.frame_elapsed.is_finite() {
                self.frame_elapsed % total
            } else {
                0.0
            };
        }
        for _ in 0..2 * self.frames.len() {
            let duration = self.frames[self.current].duration_seconds;
            if self.frame_elapsed < duration {
                break;
            }
            self.frame_elapsed -= duration;
            if self.current + 1 < self.frames.len() {
                self.current += 1;
            } else if self.looping {
                self.current = 0;
            } else {
                self.finish();
                break;
            }
        }
    }

    fn total_seconds(&self) -> f32 {
        self.frames.iter().map(|frame| frame.duration_seconds).sum()
    }

    fn finish(&mut self) {
        self.current = self.frames.len() - 1;
        self.frame_elapsed = 0.0;
        self.finished = true;
    }

    pub fn draw(&self, surface: &mut dyn DrawSurface, x: f32, y: f32) {
        let frame = self.frames[self.current];
        surface.draw_image(&self.image, frame.region, frame.region.dest_at(x, y));
    }
}

/// Indexed and optionally named sub-rectangles over one image.
#[derive(Debug, Clone)]
pub struct Tileset {
    image: ImageHandle,
    tiles: Vec<SourceRect>,
    names: HashMap<String, usize>,
}

impl Tileset {
    /// Row-major uniform grid; partial tiles at the right or bottom edge are dropped.
    pub fn grid(
        image: Option<ImageHandle>,
        tile_width: u32,
        tile_height: u32,
    ) -> Result<Self, ImageSourceError> {
        let image = image.ok_or(ImageSourceError::InvalidSource)?;
        if tile_width == 0 || tile_height == 0 {
            return Err(ImageSourceError::InvalidSource);
        }
        let columns = image.width() / tile_width;
        let rows = image.height() / tile_height;
        let mut tiles = Vec::with_capacity((columns * rows) as usize);
        for row in 0..rows {
            for column in 0..columns {
                tiles.push(SourceRect::new(
                    column * tile_width,
                    row * tile_height,
                    tile_width,
                    tile_height,
                ));
            }
        }
        Ok(Self {
            image,
            tiles,
            names: HashMap::new(),
        })
    }

    /// Explicit named regions, indexed in the order given.
    pub fn from_regions(
        image: Option<ImageHandle>,
        regions: Vec<(String, SourceRect)>,
    ) -> Result<Self, ImageSourceError> {
        let image = image.ok_or(ImageSourceError::InvalidSource)?;
        let mut tiles = Vec::with_capacity(regions.len());
        let mut names = HashMap::with_capacity(regions.len());
        for (name, region) in regions {
            let region = validate_region(&image, region)?;
            names.insert(name, tiles.len());
            tiles.push(region);
        }
        Ok(Self {
            image,
            tiles,
            names,
        })
    }

    pub fn name_tile(&mut self, name: impl Into<String>, index: usize) -> Result<(), ImageSourceError> {
        self.tile(index)?;
        self.names.insert(name.into(), index);
        Ok(())
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn tile(&self, index: usize) -> Result<SourceRect, ImageSourceError> {
        self.tiles
            .get(index)
            .copied()
            .ok_or(ImageSourceError::TileOutOfRange {
                index,
                count: self.tiles.len(),
            })
    }

    pub fn tile_index(&self, name: &str) -> Result<usize, ImageSourceError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| ImageSourceError::UnknownTile {
                name: name.to_string(),
            })
    }

    pub fn image(&self) -> &ImageHandle {
        &self.image
    }

    pub fn draw_tile(
        &self,
        index: usize,
        surface: &mut dyn DrawSurface,
        x: f32,
        y: f32,
    ) -> Result<(), ImageSourceError> {
        let region = self.tile(index)?;
        surface.draw_image(&self.image, region, region.dest_at(x, y));
        Ok(())
    }
}

/// Where a sprite's pixels come from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Bitmap(Bitmap),
    Animation(Animation),
    Tileset(Arc<Tileset>),
}

impl From<Bitmap> for ImageSource {
    fn from(value: Bitmap) -> Self {
        Self::Bitmap(value)
    }
}

impl From<Animation> for ImageSource {
    fn from(value: Animation) -> Self {
        Self::Animation(value)
    }
}

impl From<Arc<Tileset>> for ImageSource {
    fn from(value: Arc<Tileset>) -> Self {
        Self::Tileset(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::{DrawOp, RecordingSurface};

    fn strip_image(frames: u32) -> ImageHandle {
        Arc::new(ImageData::solid(frames * 4, 4, [255, 0, 0, 255]))
    }

    #[test]
    fn bitmap_without_handle_is_invalid_source() {
        assert_eq!(Bitmap::new(None).unwrap_err(), ImageSourceError::InvalidSource);
    }

    #[test]
    fn bitmap_dimensions_follow_image() {
        let bitmap = Bitmap::new(Some(Arc::new(ImageData::solid(7, 3, [0; 4])))).expect("bitmap");
        assert_eq!((bitmap.width(), bitmap.height()), (7, 3));
    }

    #[test]
    fn bitmap_region_rejects_out_of_bounds() {
        let image = Arc::new(ImageData::solid(8, 8, [0; 4]));
        let err = Bitmap::region(Some(image), SourceRect::new(4, 4, 5, 1)).unwrap_err();
        assert!(matches!(err, ImageSourceError::RegionOutOfBounds { .. }));
    }

    #[test]
    fn image_data_rejects_wrong_buffer_length() {
        assert!(ImageData::new(2, 2, vec![0; 15]).is_none());
        assert!(ImageData::new(2, 2, vec![0; 16]).is_some());
    }

    #[test]
    fn looping_animation_wraps() {
        let mut anim = Animation::strip(Some(strip_image(3)), 4, 3, 0.1, true).expect("anim");
        anim.update(0.25);
        assert_eq!(anim.current_frame(), 2);
        anim.update(0.1);
        assert_eq!(anim.current_frame(), 0);
        assert!(!anim.is_finished());
    }

    #[test]
    fn one_shot_animation_holds_last_frame() {
        let mut anim = Animation::strip(Some(strip_image(3)), 4, 3, 0.1, false).expect("anim");
        anim.update(5.0);
        assert_eq!(anim.current_frame(), 2);
        assert!(anim.is_finished());
        anim.rewind();
        assert_eq!(anim.current_frame(), 0);
        assert!(!anim.is_finished());
    }

    #[test]
    fn zero_duration_frames_do_not_hang() {
        let mut anim = Animation::strip(Some(strip_image(2)), 4, 2, 0.0, true).expect("anim");
        anim.update(0.0105);
        assert!(anim.current_frame() < 2);
    }

    #[test]
    fn huge_or_infinite_sync_returns_on_a_valid_frame() {
        let mut anim = Animation::strip(Some(strip_image(2)), 4, 2, 0.1, true).expect("anim");
        anim.update(1.0e7);
        assert!(anim.current_frame() < 2);
        assert!(!anim.is_finished());

        let before = anim.current_frame();
        anim.update(f32::INFINITY);
        anim.update(f32::NAN);
        assert_eq!(anim.current_frame(), before);

        let mut once = Animation::strip(Some(strip_image(2)), 4, 2, 0.1, false).expect("anim");
        once.update(1.0e7);
        assert!(once.is_finished());
        assert_eq!(once.current_frame(), 1);
    }

    #[test]
    fn looping_overshoot_wraps_by_whole_cycles() {
        let mut anim = Animation::strip(Some(strip_image(2)), 4, 2, 0.1, true).expect("anim");
        anim.update(0.75);
        assert_eq!(anim.current_frame(), 1);
    }

    #[test]
    fn empty_animation_is_rejected() {
        let err = Animation::new(Some(strip_image(1)), Vec::new(), true).unwrap_err();
        assert_eq!(err, ImageSourceError::EmptyAnimation);
    }

    #[test]
    fn animation_draws_current_frame_region() {
        let mut anim = Animation::strip(Some(strip_image(3)), 4, 3, 0.1, true).expect("anim");
        anim.update(0.15);
        let mut surface = RecordingSurface::new(64, 64);
        anim.draw(&mut surface, 0.0, 0.0);
        match &surface.commands()[0].op {
            DrawOp::Image { src, .. } => assert_eq!(*src, SourceRect::new(4, 0, 4, 4)),
            other => panic!("unexpected op {other:?}"),
        }
    }

    #[test]
    fn tileset_grid_and_names() {
        let image = Arc::new(ImageData::solid(16, 8, [0; 4]));
        let mut tiles = Tileset::grid(Some(image), 8, 8).expect("tileset");
        assert_eq!(tiles.tile_count(), 2);
        tiles.name_tile("grass", 1).expect("name");
        assert_eq!(tiles.tile_index("grass"), Ok(1));
        assert_eq!(
            tiles.tile_index("lava"),
            Err(ImageSourceError::UnknownTile {
                name: "lava".to_string()
            })
        );
        assert!(matches!(
            tiles.name_tile("oops", 9),
            Err(ImageSourceError::TileOutOfRange { index: 9, count: 2 })
        ));
    }

    #[test]
    fn draw_tile_out_of_range_fails_without_drawing() {
        let image = Arc::new(ImageData::solid(8, 8, [0; 4]));
        let tiles = Tileset::grid(Some(image), 8, 8).expect("tileset");
        let mut surface = RecordingSurface::new(16, 16);
        assert!(tiles.draw_tile(3, &mut surface, 0.0, 0.0).is_err());
        assert!(surface.commands().is_empty());
        tiles.draw_tile(0, &mut surface, 2.0, 3.0).expect("draw");
        assert_eq!(surface.commands().len(), 1);
    }
}
