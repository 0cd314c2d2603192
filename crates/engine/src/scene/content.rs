use super::{ColorLayer, SoftButton, Sprite, TextSprite, TileMarker};
use crate::graphics::DrawSurface;
use crate::math::{Rect, Vec2};

/// Game-defined drawable. `size` is the owning node's unscaled size.
pub trait DrawHook {
    fn draw(&self, surface: &mut dyn DrawSurface, size: Vec2);

    fn update(&mut self, _sync: f32) {}
}

/// Per-pass draw settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawContext {
    /// Surface-space rectangle considered visible.
    pub viewport: Rect,
    /// Skip draw hooks whose world bounds miss the viewport. Children are
    /// still visited.
    pub viewport_culling: bool,
}

impl DrawContext {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            viewport: Rect::from_size(width as f32, height as f32),
            viewport_culling: true,
        }
    }
}

/// Counters from one draw traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub drawn: usize,
    pub culled: usize,
    pub offscreen: usize,
}

/// What a node paints. Traversal and transform composition are identical for
/// every variant; only the draw hook differs.
pub enum NodeContent {
    Group,
    Sprite(Sprite),
    Text(TextSprite),
    Button(SoftButton),
    Layer(ColorLayer),
    TileMarker(TileMarker),
    Custom(Box<dyn DrawHook>),
}

impl NodeContent {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Sprite(_) => "sprite",
            Self::Text(_) => "text",
            Self::Button(_) => "button",
            Self::Layer(_) => "layer",
            Self::TileMarker(_) => "tile_marker",
            Self::Custom(_) => "custom",
        }
    }

    /// Size dictated by the content itself, if any.
    pub fn intrinsic_size(&self) -> Option<Vec2> {
        match self {
            Self::Sprite(sprite) => Some(sprite.size()),
            Self::Text(text) => Some(text.size()),
            _ => None,
        }
    }

    pub fn local_bounds(&self, size: Vec2) -> Rect {
        match self {
            Self::Text(text) => text.bounds(),
            _ => Rect::from_size(size.x, size.y),
        }
    }

    pub fn paints(&self) -> bool {
        !matches!(self, Self::Group)
    }

    pub fn update(&mut self, sync: f32) {
        match self {
            Self::Sprite(sprite) => sprite.update(sync),
            Self::TileMarker(marker) => marker.update(sync),
            Self::Custom(hook) => hook.update(sync),
            _ => {}
        }
    }

    pub fn draw(&self, surface: &mut dyn DrawSurface, size: Vec2) {
        match self {
            Self::Group => {}
            Self::Sprite(sprite) => sprite.draw(surface),
            Self::Text(text) => text.draw(surface),
            Self::Button(button) => button.draw(surface, size),
            Self::Layer(layer) => layer.draw(surface, size),
            Self::TileMarker(marker) => marker.draw(surface, size),
            Self::Custom(hook) => hook.draw(surface, size),
        }
    }
}

impl From<Sprite> for NodeContent {
    fn from(value: Sprite) -> Self {
        Self::Sprite(value)
    }
}

impl From<TextSprite> for NodeContent {
    fn from(value: TextSprite) -> Self {
        Self::Text(value)
    }
}

impl From<SoftButton> for NodeContent {
    fn from(value: SoftButton) -> Self {
        Self::Button(value)
    }
}

impl From<ColorLayer> for NodeContent {
    fn from(value: ColorLayer) -> Self {
        Self::Layer(value)
    }
}

impl From<TileMarker> for NodeContent {
    fn from(value: TileMarker) -> Self {
        Self::TileMarker(value)
    }
}
