use tracing::debug;

use super::{
    ButtonEvent, DrawContext, DrawStats, NodeContent, NodeId, SceneError, SceneNode, SoftButton,
    Sprite, TextSprite,
};
use crate::graphics::{DrawMode, DrawSurface};
use crate::math::{Affine2, Rect, Vec2};

struct Entry {
    node: SceneNode,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

/// Arena-backed node tree. Children are drawn in list order, so later
/// siblings paint over earlier ones.
pub struct SceneGraph {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    live: usize,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        let mut graph = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            live: 0,
        };
        graph.root = graph.insert(SceneNode::group().named("root"));
        graph
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.entry(id).is_ok()
    }

    /// Adds a detached node. It is not drawn until attached under the root.
    pub fn insert(&mut self, node: SceneNode) -> NodeId {
        let entry = Entry {
            node,
            parent: None,
            children: Vec::new(),
        };
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            entry: Some(entry),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    pub fn spawn(&mut self, parent: NodeId, node: SceneNode) -> Result<NodeId, SceneError> {
        self.entry(parent)?;
        let id = self.insert(node);
        self.add_child(parent, id)?;
        Ok(id)
    }

    pub fn node(&self, id: NodeId) -> Result<&SceneNode, SceneError> {
        self.entry(id).map(|entry| &entry.node)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut SceneNode, SceneError> {
        self.entry_mut(id).map(|entry| &mut entry.node)
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, SceneError> {
        self.entry(id).map(|entry| entry.parent)
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId], SceneError> {
        self.entry(id).map(|entry| entry.children.as_slice())
    }

    /// Appends `child` to `parent`'s list, detaching it from any previous
    /// parent first.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.entry(parent)?;
        self.entry(child)?;
        if child == self.root {
            return Err(SceneError::RootNode);
        }
        if self.is_ancestor_or_self(child, parent)? {
            return Err(SceneError::CycleDetected { parent, child });
        }
        self.remove_from_parent(child)?;
        self.entry_mut(parent)?.children.push(child);
        self.entry_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// No-op for nodes without a parent.
    pub fn remove_from_parent(&mut self, id: NodeId) -> Result<(), SceneError> {
        let Some(parent) = self.entry_mut(id)?.parent.take() else {
            return Ok(());
        };
        let siblings = &mut self.entry_mut(parent)?.children;
        siblings.retain(|&sibling| sibling != id);
        Ok(())
    }

    /// Moves a node to the end of its parent's list so it paints last.
    pub fn raise_to_top(&mut self, id: NodeId) -> Result<(), SceneError> {
        let Some(parent) = self.parent(id)? else {
            return Ok(());
        };
        let siblings = &mut self.entry_mut(parent)?.children;
        siblings.retain(|&sibling| sibling != id);
        siblings.push(id);
        Ok(())
    }

    /// Detaches a node and frees its whole subtree. Returns the number of
    /// nodes freed. Handles into the subtree become stale.
    pub fn destroy(&mut self, id: NodeId) -> Result<usize, SceneError> {
        if id == self.root {
            return Err(SceneError::RootNode);
        }
        self.remove_from_parent(id)?;
        let mut stack = vec![id];
        let mut freed = 0;
        while let Some(next) = stack.pop() {
            let slot = &mut self.slots[next.index as usize];
            if let Some(entry) = slot.entry.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(next.index);
                stack.extend(entry.children);
                freed += 1;
            }
        }
        self.live -= freed;
        debug!(freed, "scene_subtree_destroyed");
        Ok(freed)
    }

    /// Composition of every ancestor's local transform, root first.
    pub fn world_transform(&self, id: NodeId) -> Result<Affine2, SceneError> {
        let entry = self.entry(id)?;
        let mut world = entry.node.local_transform();
        let mut cursor = entry.parent;
        while let Some(ancestor) = cursor {
            let entry = self.entry(ancestor)?;
            world = entry.node.local_transform() * world;
            cursor = entry.parent;
        }
        Ok(world)
    }

    /// False when the node or any ancestor is culled.
    pub fn is_visible(&self, id: NodeId) -> Result<bool, SceneError> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let entry = self.entry(current)?;
            if entry.node.is_culled() {
                return Ok(false);
            }
            cursor = entry.parent;
        }
        Ok(true)
    }

    /// Maps a surface-space point into the node's local space.
    pub fn pointer_to_local(&self, id: NodeId, point: Vec2) -> Result<Option<Vec2>, SceneError> {
        Ok(self
            .world_transform(id)?
            .inverse()
            .map(|inverse| inverse.transform_point(point)))
    }

    pub fn sprite_mut(&mut self, id: NodeId) -> Result<&mut Sprite, SceneError> {
        match &mut self.node_mut(id)?.content {
            NodeContent::Sprite(sprite) => Ok(sprite),
            other => Err(mismatch("sprite_mut", "sprite", other)),
        }
    }

    pub fn text_mut(&mut self, id: NodeId) -> Result<&mut TextSprite, SceneError> {
        match &mut self.node_mut(id)?.content {
            NodeContent::Text(text) => Ok(text),
            other => Err(mismatch("text_mut", "text", other)),
        }
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<(), SceneError> {
        self.text_mut(id)?.set_text(text);
        Ok(())
    }

    pub fn button_mut(&mut self, id: NodeId) -> Result<&mut SoftButton, SceneError> {
        match &mut self.node_mut(id)?.content {
            NodeContent::Button(button) => Ok(button),
            other => Err(mismatch("button_mut", "button", other)),
        }
    }

    /// Routes one surface-space pointer sample to a button node. Hidden
    /// buttons see the pointer as absent.
    pub fn handle_button_pointer(
        &mut self,
        id: NodeId,
        point: Option<Vec2>,
        down: bool,
    ) -> Result<ButtonEvent, SceneError> {
        let local = match point {
            Some(point) if self.is_visible(id)? => self.pointer_to_local(id, point)?,
            _ => None,
        };
        let node = self.node(id)?;
        let size = Vec2::new(node.width(), node.height());
        Ok(self.button_mut(id)?.handle_pointer(local, down, size))
    }

    /// Topmost visible pickable node under a surface-space point.
    pub fn hit_test(&self, point: Vec2) -> Option<NodeId> {
        let mut hit = None;
        let mut stack = vec![(self.root, Affine2::IDENTITY)];
        while let Some((id, parent_world)) = stack.pop() {
            let Ok(entry) = self.entry(id) else {
                continue;
            };
            if entry.node.is_culled() {
                continue;
            }
            let world = parent_world * entry.node.local_transform();
            if entry.node.is_pickable() {
                let inside = world
                    .inverse()
                    .map(|inverse| entry.node.local_bounds().contains(inverse.transform_point(point)))
                    .unwrap_or(false);
                if inside {
                    hit = Some(id);
                }
            }
            // Reverse push so the first child pops first and later ones win.
            stack.extend(entry.children.iter().rev().map(|&child| (child, world)));
        }
        hit
    }

    /// Advances animations and effects of every node reachable from the
    /// root, culled subtrees included.
    pub fn update(&mut self, sync: f32) {
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Ok(entry) = self.entry_mut(id) else {
                continue;
            };
            entry.node.content.update(sync);
            stack.extend(entry.children.iter().copied());
        }
    }

    /// Draws the whole tree under `parent_world`.
    pub fn draw(
        &self,
        surface: &mut dyn DrawSurface,
        ctx: &DrawContext,
        parent_world: Affine2,
    ) -> DrawStats {
        let mut stats = DrawStats::default();
        self.draw_node(
            self.root,
            surface,
            ctx,
            parent_world,
            1.0,
            DrawMode::Normal,
            &mut stats,
        );
        surface.set_transform(Affine2::IDENTITY);
        surface.set_alpha(1.0);
        surface.set_draw_mode(DrawMode::Normal);
        stats
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_node(
        &self,
        id: NodeId,
        surface: &mut dyn DrawSurface,
        ctx: &DrawContext,
        parent_world: Affine2,
        parent_alpha: f32,
        parent_mode: DrawMode,
        stats: &mut DrawStats,
    ) {
        let Ok(entry) = self.entry(id) else {
            return;
        };
        let node = &entry.node;
        if node.is_culled() {
            stats.culled += 1;
            return;
        }

        let world = parent_world * node.local_transform();
        let alpha = parent_alpha * node.opacity();
        let mode = node.draw_mode().unwrap_or(parent_mode);

        if node.content.paints() && alpha > 0.0 {
            let bounds = world_bounds(world, node.local_bounds());
            if ctx.viewport_culling && !bounds.intersects(&ctx.viewport) {
                stats.offscreen += 1;
            } else {
                surface.set_transform(world);
                surface.set_alpha(alpha);
                surface.set_draw_mode(mode);
                node.content
                    .draw(surface, Vec2::new(node.width(), node.height()));
                stats.drawn += 1;
            }
        }

        for &child in &entry.children {
            self.draw_node(child, surface, ctx, world, alpha, mode, stats);
        }
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, of: NodeId) -> Result<bool, SceneError> {
        let mut cursor = Some(of);
        while let Some(current) = cursor {
            if current == candidate {
                return Ok(true);
            }
            cursor = self.entry(current)?.parent;
        }
        Ok(false)
    }

    fn entry(&self, id: NodeId) -> Result<&Entry, SceneError> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
            .ok_or(SceneError::StaleNode(id))
    }

    fn entry_mut(&mut self, id: NodeId) -> Result<&mut Entry, SceneError> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_mut())
            .ok_or(SceneError::StaleNode(id))
    }
}

fn mismatch(operation: &'static str, expected: &'static str, found: &NodeContent) -> SceneError {
    SceneError::CapabilityMismatch {
        operation,
        expected,
        found: found.kind_name(),
    }
}

fn world_bounds(world: Affine2, local: Rect) -> Rect {
    let corners = local.corners().map(|corner| world.transform_point(corner));
    let (mut min, mut max) = (corners[0], corners[0]);
    for corner in &corners[1..] {
        min = Vec2::new(min.x.min(corner.x), min.y.min(corner.y));
        max = Vec2::new(max.x.max(corner.x), max.y.max(corner.y));
    }
    Rect::new(min.x, min.y, max.x - min.x, max.y - min.y)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::graphics::{Animation, ImageData, RecordingSurface};
    use crate::scene::ColorLayer;

    fn layer(color: [u8; 4]) -> SceneNode {
        SceneNode::new(ColorLayer::new(color).into()).with_size(4.0, 4.0)
    }

    fn draw_all(graph: &SceneGraph) -> (RecordingSurface, DrawStats) {
        let mut surface = RecordingSurface::new(64, 64);
        let stats = graph.draw(&mut surface, &DrawContext::new(64, 64), Affine2::IDENTITY);
        (surface, stats)
    }

    #[test]
    fn world_transform_is_ancestor_product() {
        let mut graph = SceneGraph::new();
        let a = graph.spawn(graph.root(), SceneNode::group().at(10.0, 0.0)).expect("a");
        let b = graph.spawn(a, SceneNode::group()).expect("b");
        graph.node_mut(b).expect("b").set_rotation(0.5).set_scale(2.0, 2.0);
        let c = graph.spawn(b, SceneNode::group().at(3.0, 4.0)).expect("c");
        graph.node_mut(c).expect("c").set_offset(1.0, 1.0);

        let local = |id| graph.node(id).expect("node").local_transform();
        let expected = local(graph.root()) * local(a) * local(b) * local(c);
        let world = graph.world_transform(c).expect("world");
        assert!(world.approx_eq(&expected, 1e-5));
    }

    #[test]
    fn reparenting_leaves_one_parent() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let first = graph.spawn(root, SceneNode::group()).expect("first");
        let second = graph.spawn(root, SceneNode::group()).expect("second");
        let child = graph.spawn(first, SceneNode::group()).expect("child");

        graph.remove_from_parent(child).expect("detach");
        graph.add_child(second, child).expect("attach");
        graph.add_child(second, child).expect("attach again");

        assert_eq!(graph.parent(child), Ok(Some(second)));
        assert!(graph.children(first).expect("first").is_empty());
        assert_eq!(graph.children(second).expect("second"), &[child]);
    }

    #[test]
    fn add_child_detaches_from_previous_parent() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let old = graph.spawn(root, SceneNode::group()).expect("old");
        let child = graph.spawn(old, SceneNode::group()).expect("child");
        graph.add_child(root, child).expect("move");
        assert!(graph.children(old).expect("old").is_empty());
        assert_eq!(graph.parent(child), Ok(Some(root)));
    }

    #[test]
    fn remove_from_parent_without_parent_is_noop() {
        let mut graph = SceneGraph::new();
        let loose = graph.insert(SceneNode::group());
        assert_eq!(graph.remove_from_parent(loose), Ok(()));
        assert_eq!(graph.parent(loose), Ok(None));
    }

    #[test]
    fn cycles_and_root_moves_are_rejected() {
        let mut graph = SceneGraph::new();
        let a = graph.spawn(graph.root(), SceneNode::group()).expect("a");
        let b = graph.spawn(a, SceneNode::group()).expect("b");
        assert_eq!(
            graph.add_child(b, a),
            Err(SceneError::CycleDetected { parent: b, child: a })
        );
        assert!(matches!(graph.add_child(a, a), Err(SceneError::CycleDetected { .. })));
        assert_eq!(graph.add_child(a, graph.root()), Err(SceneError::RootNode));
        assert_eq!(graph.parent(a), Ok(Some(graph.root())));
    }

    #[test]
    fn children_paint_in_list_order() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let parent = graph.spawn(root, SceneNode::group()).expect("parent");
        let other = graph.spawn(root, SceneNode::group()).expect("other");
        graph.spawn(parent, layer([1, 0, 0, 255])).expect("x");
        graph.spawn(parent, layer([2, 0, 0, 255])).expect("y");
        graph.spawn(parent, layer([3, 0, 0, 255])).expect("z");
        let o1 = graph.spawn(other, layer([9, 0, 0, 255])).expect("o1");
        graph.spawn(other, layer([8, 0, 0, 255])).expect("o2");
        graph.raise_to_top(o1).expect("raise");

        let (surface, stats) = draw_all(&graph);
        assert_eq!(
            surface.fill_colors(),
            vec![
                [1, 0, 0, 255],
                [2, 0, 0, 255],
                [3, 0, 0, 255],
                [8, 0, 0, 255],
                [9, 0, 0, 255]
            ]
        );
        assert_eq!(stats.drawn, 5);
    }

    #[test]
    fn culled_subtree_skips_draw_but_keeps_animating() {
        let mut graph = SceneGraph::new();
        let hidden = graph.spawn(graph.root(), SceneNode::group()).expect("hidden");
        graph.node_mut(hidden).expect("hidden").set_culled(true);
        let image = Arc::new(ImageData::solid(8, 4, [255; 4]));
        let sprite = Sprite::new(Animation::strip(Some(image), 4, 2, 0.1, true).expect("anim"))
            .expect("sprite");
        let animated = graph.spawn(hidden, SceneNode::new(sprite.into())).expect("sprite");

        graph.update(0.15);
        let (surface, stats) = draw_all(&graph);
        assert!(surface.commands().is_empty());
        assert_eq!(stats.culled, 1);
        let frame = graph
            .sprite_mut(animated)
            .expect("sprite")
            .animation_mut()
            .expect("animation")
            .current_frame();
        assert_eq!(frame, 1);
    }

    #[test]
    fn opacity_multiplies_and_draw_mode_inherits() {
        let mut graph = SceneGraph::new();
        let parent = graph.spawn(graph.root(), SceneNode::group()).expect("parent");
        graph
            .node_mut(parent)
            .expect("parent")
            .set_opacity(0.5)
            .set_draw_mode(Some(DrawMode::Additive));
        let child = graph.spawn(parent, layer([5; 4])).expect("child");
        graph.node_mut(child).expect("child").set_opacity(0.5);

        let (surface, _) = draw_all(&graph);
        let command = &surface.commands()[0];
        assert_eq!(command.alpha, 0.25);
        assert_eq!(command.mode, DrawMode::Additive);
    }

    #[test]
    fn offscreen_nodes_are_skipped_but_children_visited() {
        let mut graph = SceneGraph::new();
        let far = graph
            .spawn(graph.root(), layer([1; 4]).at(500.0, 500.0))
            .expect("far");
        graph.spawn(far, layer([2; 4]).at(-498.0, -498.0)).expect("near");
        let (surface, stats) = draw_all(&graph);
        assert_eq!(stats.offscreen, 1);
        assert_eq!(surface.fill_colors(), vec![[2; 4]]);
    }

    #[test]
    fn destroy_frees_subtree_and_stales_handles() {
        let mut graph = SceneGraph::new();
        let a = graph.spawn(graph.root(), SceneNode::group()).expect("a");
        let b = graph.spawn(a, SceneNode::group()).expect("b");
        assert_eq!(graph.destroy(a), Ok(2));
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.node(b).unwrap_err(), SceneError::StaleNode(b));
        assert!(graph.children(graph.root()).expect("root").is_empty());

        let reused = graph.insert(SceneNode::group());
        assert_ne!(reused, a);
        assert!(!graph.contains(a));
        assert_eq!(graph.destroy(graph.root()), Err(SceneError::RootNode));
    }

    #[test]
    fn hit_test_prefers_last_painted() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let lower = graph.spawn(root, layer([1; 4])).expect("lower");
        let upper = graph.spawn(root, layer([2; 4]).at(2.0, 2.0)).expect("upper");
        for id in [lower, upper] {
            graph.node_mut(id).expect("node").set_pickable(true);
        }
        assert_eq!(graph.hit_test(Vec2::new(3.0, 3.0)), Some(upper));
        assert_eq!(graph.hit_test(Vec2::new(1.0, 1.0)), Some(lower));
        assert_eq!(graph.hit_test(Vec2::new(30.0, 30.0)), None);
        graph.node_mut(upper).expect("upper").set_culled(true);
        assert_eq!(graph.hit_test(Vec2::new(3.0, 3.0)), Some(lower));
    }

    #[test]
    fn button_clicks_through_transformed_parent() {
        let mut graph = SceneGraph::new();
        let panel = graph
            .spawn(graph.root(), SceneNode::group().at(20.0, 10.0))
            .expect("panel");
        let button = graph
            .spawn(
                panel,
                SceneNode::new(SoftButton::new("OK").into()).with_size(10.0, 10.0),
            )
            .expect("button");
        let point = Some(Vec2::new(25.0, 15.0));
        graph.handle_button_pointer(button, point, true).expect("press");
        let event = graph
            .handle_button_pointer(button, point, false)
            .expect("release");
        assert_eq!(event, ButtonEvent::Clicked);
    }

    #[test]
    fn text_access_checks_capability() {
        let mut graph = SceneGraph::new();
        let label = graph
            .spawn(graph.root(), SceneNode::new(TextSprite::new("A", [255; 4], 1.0).into()))
            .expect("label");
        let plain = graph.spawn(graph.root(), SceneNode::group()).expect("plain");
        graph.set_text(label, "SCORE 10").expect("set");
        assert_eq!(graph.text_mut(label).expect("text").text, "SCORE 10");
        assert_eq!(
            graph.set_text(plain, "nope"),
            Err(SceneError::CapabilityMismatch {
                operation: "text_mut",
                expected: "text",
                found: "group",
            })
        );
    }
}
