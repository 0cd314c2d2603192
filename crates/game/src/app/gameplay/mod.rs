use std::collections::{HashMap, HashSet, VecDeque};
use std::f32::consts::TAU;
use std::sync::Arc;

use engine::assets::AssetError;
use engine::graphics::{
    Animation, Bitmap, Color, DrawMode, DrawSurface, ImageData, ImageHandle, Tileset,
    GLYPH_HEIGHT,
};
use engine::math::{easing, Affine2, Vec2};
use engine::scene::{
    ButtonEvent, ColorLayer, DrawContext, DrawHook, DrawStats, NodeContent, NodeId, SceneError,
    SceneGraph, SceneNode, SoftButton, Sprite, TextAlign, TextSprite, TileMarker,
};
use engine::{
    Actor, ActorId, ActorPool, AssetStore, Game, InputAction, InputSnapshot, LoopCommand,
    MetricsHandle, PointerState, PoolId, PoolStep, Poolable, Scheduler, Timer,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::config::{GameConfig, TowerRules, WaveRules};
use super::scores::{HighScore, ScoreBoard};

pub(crate) const FRAME_WIDTH: u32 = 640;
pub(crate) const FRAME_HEIGHT: u32 = 360;
pub(crate) const TILE_SIZE: f32 = 20.0;
pub(crate) const GRID_COLUMNS: i32 = 32;
pub(crate) const GRID_ROWS: i32 = 18;
/// Rows at the top of the grid covered by the status bar.
pub(crate) const HUD_ROWS: i32 = 1;

const HUD_PRIORITY: i32 = 40;
const WAVE_PRIORITY: i32 = 35;
const TOWER_PRIORITY: i32 = 30;
const PROJECTILE_PRIORITY: i32 = 20;
const ENEMY_PRIORITY: i32 = 10;
const IMPACT_PRIORITY: i32 = 5;
const CASTLE_PRIORITY: i32 = 0;
const BANNER_PRIORITY: i32 = -10;

const TEXT_COLOR: Color = [240, 236, 220, 255];
const GOLD_COLOR: Color = [250, 210, 80, 255];
const DAMAGE_COLOR: Color = [255, 120, 90, 255];
const SHADOW_COLOR: Color = [0, 0, 0, 200];

include!("art.rs");
include!("world.rs");
include!("entities.rs");
include!("banner.rs");
include!("hud.rs");
include!("waves.rs");
include!("session.rs");

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
