use super::NodeContent;
use crate::graphics::DrawMode;
use crate::math::{Affine2, Rect, Vec2};

/// Generational handle into a `SceneGraph`. A handle to a destroyed node
/// never aliases a node created later in the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

/// Local state of one node in the tree. Hierarchy links live in the graph.
pub struct SceneNode {
    position: Vec2,
    rotation: f32,
    scale: Vec2,
    offset: Vec2,
    opacity: f32,
    size: Vec2,
    draw_mode: Option<DrawMode>,
    culled: bool,
    pickable: bool,
    pub debug_name: &'static str,
    pub content: NodeContent,
}

impl std::fmt::Debug for SceneNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneNode")
            .field("debug_name", &self.debug_name)
            .field("kind", &self.content.kind_name())
            .field("position", &self.position)
            .field("rotation", &self.rotation)
            .field("scale", &self.scale)
            .field("opacity", &self.opacity)
            .field("culled", &self.culled)
            .finish()
    }
}

impl Default for SceneNode {
    fn default() -> Self {
        Self::new(NodeContent::Group)
    }
}

impl SceneNode {
    pub fn new(content: NodeContent) -> Self {
        let pickable = matches!(content, NodeContent::Button(_) | NodeContent::TileMarker(_));
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
            offset: Vec2::ZERO,
            opacity: 1.0,
            size: Vec2::ZERO,
            draw_mode: None,
            culled: false,
            pickable,
            debug_name: "node",
            content,
        }
    }

    pub fn group() -> Self {
        Self::default()
    }

    pub fn named(mut self, debug_name: &'static str) -> Self {
        self.debug_name = debug_name;
        self
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.size = Vec2::new(width.max(0.0), height.max(0.0));
        self
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.position = Vec2::new(x, y);
        self
    }

    pub fn set_position(&mut self, x: f32, y: f32) -> &mut Self {
        self.position = Vec2::new(x, y);
        self
    }

    pub fn set_rotation(&mut self, radians: f32) -> &mut Self {
        self.rotation = radians;
        self
    }

    pub fn set_scale(&mut self, sx: f32, sy: f32) -> &mut Self {
        self.scale = Vec2::new(sx, sy);
        self
    }

    /// Pivot in local units; rotation and scale happen around it and it lands
    /// on `position`.
    pub fn set_offset(&mut self, ox: f32, oy: f32) -> &mut Self {
        self.offset = Vec2::new(ox, oy);
        self
    }

    pub fn set_opacity(&mut self, alpha: f32) -> &mut Self {
        self.opacity = if alpha.is_nan() { 0.0 } else { alpha.clamp(0.0, 1.0) };
        self
    }

    pub fn set_size(&mut self, width: f32, height: f32) -> &mut Self {
        self.size = Vec2::new(width.max(0.0), height.max(0.0));
        self
    }

    /// `None` inherits the parent's mode.
    pub fn set_draw_mode(&mut self, mode: Option<DrawMode>) -> &mut Self {
        self.draw_mode = mode;
        self
    }

    /// Culled nodes skip their own and their subtree's draw hooks but keep
    /// receiving update traversal.
    pub fn set_culled(&mut self, culled: bool) -> &mut Self {
        self.culled = culled;
        self
    }

    pub fn set_pickable(&mut self, pickable: bool) -> &mut Self {
        self.pickable = pickable;
        self
    }

    /// Centers the pivot on the node's bounds.
    pub fn center_offset(&mut self) -> &mut Self {
        let (w, h) = (self.width(), self.height());
        self.set_offset(w * 0.5, h * 0.5)
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn draw_mode(&self) -> Option<DrawMode> {
        self.draw_mode
    }

    pub fn is_culled(&self) -> bool {
        self.culled
    }

    pub fn is_pickable(&self) -> bool {
        self.pickable
    }

    /// Sprites and text report their intrinsic size; other variants use the
    /// size set on the node.
    pub fn width(&self) -> f32 {
        self.content
            .intrinsic_size()
            .map_or(self.size.x, |size| size.x)
    }

    pub fn height(&self) -> f32 {
        self.content
            .intrinsic_size()
            .map_or(self.size.y, |size| size.y)
    }

    pub fn real_width(&self) -> f32 {
        self.width() * self.scale.x
    }

    pub fn real_height(&self) -> f32 {
        self.height() * self.scale.y
    }

    pub fn local_transform(&self) -> Affine2 {
        Affine2::from_components(self.position, self.rotation, self.scale, self.offset)
    }

    /// Bounds in local space before the node's own transform.
    pub fn local_bounds(&self) -> Rect {
        self.content
            .local_bounds(Vec2::new(self.width(), self.height()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::ColorLayer;

    #[test]
    fn setters_chain() {
        let mut node = SceneNode::group();
        node.set_position(3.0, 4.0)
            .set_rotation(0.5)
            .set_scale(2.0, 3.0)
            .set_offset(1.0, 1.0)
            .set_opacity(0.25);
        assert_eq!(node.position(), Vec2::new(3.0, 4.0));
        assert_eq!(node.rotation(), 0.5);
        assert_eq!(node.scale(), Vec2::new(2.0, 3.0));
        assert_eq!(node.offset(), Vec2::new(1.0, 1.0));
        assert_eq!(node.opacity(), 0.25);
    }

    #[test]
    fn opacity_is_clamped() {
        let mut node = SceneNode::group();
        assert_eq!(node.set_opacity(4.0).opacity(), 1.0);
        assert_eq!(node.set_opacity(-1.0).opacity(), 0.0);
    }

    #[test]
    fn real_size_applies_scale() {
        let mut node = SceneNode::new(NodeContent::Layer(ColorLayer::new([0; 4])))
            .with_size(10.0, 20.0);
        node.set_scale(2.0, 0.5);
        assert_eq!(node.real_width(), 20.0);
        assert_eq!(node.real_height(), 10.0);
    }

    #[test]
    fn center_offset_uses_bounds() {
        let mut node = SceneNode::group().with_size(8.0, 6.0);
        node.center_offset();
        assert_eq!(node.offset(), Vec2::new(4.0, 3.0));
    }
}
