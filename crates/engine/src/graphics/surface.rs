use super::{ImageData, SourceRect};
use crate::math::{Affine2, Rect, Vec2};

pub type Color = [u8; 4];

/// Compositing operator for subsequent paint calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DrawMode {
    /// Source-over alpha blending.
    #[default]
    Normal,
    /// Adds source color scaled by alpha, saturating. Used for glows and hits.
    Additive,
}

/// Immediate-mode 2D paint context. Geometry passed to paint calls is in the
/// local space of the current transform.
pub trait DrawSurface {
    fn size(&self) -> (u32, u32);

    fn set_transform(&mut self, transform: Affine2);

    fn transform(&self) -> Affine2;

    /// Global alpha multiplier in [0, 1] applied to every paint call.
    fn set_alpha(&mut self, alpha: f32);

    fn set_draw_mode(&mut self, mode: DrawMode);

    /// Fills the whole surface ignoring transform, alpha and draw mode.
    fn clear(&mut self, color: Color);

    fn fill_rect(&mut self, rect: Rect, color: Color);

    fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f32) {
        self.stroke_path(&rect.corners(), true, color, line_width);
    }

    fn draw_image(&mut self, image: &ImageData, src: SourceRect, dst: Rect);

    fn fill_path(&mut self, points: &[Vec2], color: Color);

    fn stroke_path(&mut self, points: &[Vec2], closed: bool, color: Color, line_width: f32);

    /// `(x, y)` is the top-left of the first glyph; `scale` is pixels per font cell.
    fn fill_text(&mut self, text: &str, x: f32, y: f32, scale: f32, color: Color);

    fn text_width(&self, text: &str, scale: f32) -> f32 {
        super::text_width(text, scale)
    }
}
