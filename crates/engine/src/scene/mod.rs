mod content;
mod graph;
mod node;
mod sprite;
mod widgets;

use thiserror::Error;

use crate::graphics::ImageSourceError;

pub use content::{DrawContext, DrawHook, DrawStats, NodeContent};
pub use graph::SceneGraph;
pub use node::{NodeId, SceneNode};
pub use sprite::{Sprite, SpriteStrategy};
pub use widgets::{
    ButtonColors, ButtonEvent, ButtonState, ColorLayer, SoftButton, TextAlign, TextSprite,
    TileMarker,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("node {0:?} is not part of this scene graph")]
    StaleNode(NodeId),
    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    CycleDetected { parent: NodeId, child: NodeId },
    #[error("the root node cannot be re-parented or destroyed")]
    RootNode,
    #[error("{operation} requires a {expected} node, found {found}")]
    CapabilityMismatch {
        operation: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error(transparent)]
    Image(#[from] ImageSourceError),
}
