mod font;
mod frame;
mod image;
mod recording;
mod surface;

use std::sync::Arc;

pub use font::{glyph_rows, text_width, GLYPH_HEIGHT, GLYPH_WIDTH};
pub use frame::FrameSurface;
pub use image::{
    Animation, AnimationFrame, Bitmap, ImageData, ImageSource, ImageSourceError, SourceRect,
    Tileset,
};
pub use recording::{DrawCommand, DrawOp, RecordingSurface};
pub use surface::{Color, DrawMode, DrawSurface};

/// Shared decoded image. Cloned freely by sprites and tilesets.
pub type ImageHandle = Arc<ImageData>;
