use super::{Color, DrawMode, DrawSurface, ImageData, SourceRect};
use crate::math::{Affine2, Rect, Vec2};

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear(Color),
    FillRect {
        rect: Rect,
        color: Color,
    },
    StrokeRect {
        rect: Rect,
        color: Color,
        line_width: f32,
    },
    Image {
        image_size: (u32, u32),
        src: SourceRect,
        dst: Rect,
    },
    FillPath {
        points: Vec<Vec2>,
        color: Color,
    },
    StrokePath {
        points: Vec<Vec2>,
        closed: bool,
        color: Color,
        line_width: f32,
    },
    Text {
        text: String,
        x: f32,
        y: f32,
        scale: f32,
        color: Color,
    },
}

/// One paint call with the surface state it was issued under.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub op: DrawOp,
    pub transform: Affine2,
    pub alpha: f32,
    pub mode: DrawMode,
}

/// Surface that records paint calls instead of rasterizing them.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    transform: Affine2,
    alpha: f32,
    mode: DrawMode,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            transform: Affine2::IDENTITY,
            alpha: 1.0,
            mode: DrawMode::Normal,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Fill colors of every `FillRect` in paint order.
    pub fn fill_colors(&self) -> Vec<Color> {
        self.commands
            .iter()
            .filter_map(|command| match command.op {
                DrawOp::FillRect { color, .. } => Some(color),
                _ => None,
            })
            .collect()
    }

    /// Strings of every `Text` op in paint order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|command| match &command.op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn push(&mut self, op: DrawOp) {
        self.commands.push(DrawCommand {
            op,
            transform: self.transform,
            alpha: self.alpha,
            mode: self.mode,
        });
    }
}

impl DrawSurface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn set_transform(&mut self, transform: Affine2) {
        self.transform = transform;
    }

    fn transform(&self) -> Affine2 {
        self.transform
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha;
    }

    fn set_draw_mode(&mut self, mode: DrawMode) {
        self.mode = mode;
    }

    fn clear(&mut self, color: Color) {
        self.push(DrawOp::Clear(color));
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.push(DrawOp::FillRect { rect, color });
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f32) {
        self.push(DrawOp::StrokeRect {
            rect,
            color,
            line_width,
        });
    }

    fn draw_image(&mut self, image: &ImageData, src: SourceRect, dst: Rect) {
        self.push(DrawOp::Image {
            image_size: (image.width(), image.height()),
            src,
            dst,
        });
    }

    fn fill_path(&mut self, points: &[Vec2], color: Color) {
        self.push(DrawOp::FillPath {
            points: points.to_vec(),
            color,
        });
    }

    fn stroke_path(&mut self, points: &[Vec2], closed: bool, color: Color, line_width: f32) {
        self.push(DrawOp::StrokePath {
            points: points.to_vec(),
            closed,
            color,
            line_width,
        });
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, scale: f32, color: Color) {
        self.push(DrawOp::Text {
            text: text.to_string(),
            x,
            y,
            scale,
            color,
        });
    }
}
