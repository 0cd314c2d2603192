pub mod easing;
mod matrix;
mod rect;
mod vector2;

pub use matrix::Affine2;
pub use rect::Rect;
pub use vector2::Vec2;
