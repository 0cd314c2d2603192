use std::sync::Arc;

use super::SceneError;
use crate::graphics::{Animation, Bitmap, DrawSurface, ImageSource, Tileset};
use crate::math::Vec2;

/// Blit strategy chosen once from the image source variant.
#[derive(Debug, Clone)]
pub enum SpriteStrategy {
    Plain(Bitmap),
    Animated(Animation),
    Tile { tileset: Arc<Tileset>, index: usize },
}

impl SpriteStrategy {
    fn kind_name(&self) -> &'static str {
        match self {
            Self::Plain(_) => "bitmap",
            Self::Animated(_) => "animation",
            Self::Tile { .. } => "tileset",
        }
    }
}

/// Image-backed node content painted at the local origin.
#[derive(Debug, Clone)]
pub struct Sprite {
    strategy: SpriteStrategy,
}

impl Sprite {
    /// A tileset source starts on tile 0, which must exist.
    pub fn new(source: impl Into<ImageSource>) -> Result<Self, SceneError> {
        let strategy = match source.into() {
            ImageSource::Bitmap(bitmap) => SpriteStrategy::Plain(bitmap),
            ImageSource::Animation(animation) => SpriteStrategy::Animated(animation),
            ImageSource::Tileset(tileset) => {
                tileset.tile(0)?;
                SpriteStrategy::Tile { tileset, index: 0 }
            }
        };
        Ok(Self { strategy })
    }

    pub fn from_tile(tileset: Arc<Tileset>, index: usize) -> Result<Self, SceneError> {
        tileset.tile(index)?;
        Ok(Self {
            strategy: SpriteStrategy::Tile { tileset, index },
        })
    }

    pub fn from_tile_name(tileset: Arc<Tileset>, name: &str) -> Result<Self, SceneError> {
        let index = tileset.tile_index(name)?;
        Self::from_tile(tileset, index)
    }

    pub fn strategy(&self) -> &SpriteStrategy {
        &self.strategy
    }

    pub fn set_tile(&mut self, name: &str) -> Result<(), SceneError> {
        let found = self.strategy.kind_name();
        match &mut self.strategy {
            SpriteStrategy::Tile { tileset, index } => {
                *index = tileset.tile_index(name)?;
                Ok(())
            }
            _ => Err(SceneError::CapabilityMismatch {
                operation: "set_tile",
                expected: "tileset",
                found,
            }),
        }
    }

    pub fn set_tile_index(&mut self, new_index: usize) -> Result<(), SceneError> {
        let found = self.strategy.kind_name();
        match &mut self.strategy {
            SpriteStrategy::Tile { tileset, index } => {
                tileset.tile(new_index)?;
                *index = new_index;
                Ok(())
            }
            _ => Err(SceneError::CapabilityMismatch {
                operation: "set_tile_index",
                expected: "tileset",
                found,
            }),
        }
    }

    pub fn animation_mut(&mut self) -> Result<&mut Animation, SceneError> {
        let found = self.strategy.kind_name();
        match &mut self.strategy {
            SpriteStrategy::Animated(animation) => Ok(animation),
            _ => Err(SceneError::CapabilityMismatch {
                operation: "animation_mut",
                expected: "animation",
                found,
            }),
        }
    }

    pub fn update(&mut self, sync: f32) {
        if let SpriteStrategy::Animated(animation) = &mut self.strategy {
            animation.update(sync);
        }
    }

    pub fn width(&self) -> f32 {
        self.size().x
    }

    pub fn height(&self) -> f32 {
        self.size().y
    }

    pub fn size(&self) -> Vec2 {
        match &self.strategy {
            SpriteStrategy::Plain(bitmap) => {
                Vec2::new(bitmap.width() as f32, bitmap.height() as f32)
            }
            SpriteStrategy::Animated(animation) => {
                Vec2::new(animation.width() as f32, animation.height() as f32)
            }
            SpriteStrategy::Tile { tileset, index } => tileset
                .tile(*index)
                .map(|r| Vec2::new(r.width as f32, r.height as f32))
                .unwrap_or(Vec2::ZERO),
        }
    }

    pub fn draw(&self, surface: &mut dyn DrawSurface) {
        match &self.strategy {
            SpriteStrategy::Plain(bitmap) => bitmap.draw(surface, 0.0, 0.0),
            SpriteStrategy::Animated(animation) => animation.draw(surface, 0.0, 0.0),
            SpriteStrategy::Tile { tileset, index } => {
                if let Ok(region) = tileset.tile(*index) {
                    surface.draw_image(tileset.image(), region, region.dest_at(0.0, 0.0));
                }
            }
        }
    }
}
