use serde::Deserialize;

use crate::graphics::{AnimationFrame, SourceRect};

/// JSON animation description stored at `animations/<key>.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnimationManifest {
    /// Bitmap key of the frame sheet.
    pub image: String,
    #[serde(default = "default_looping")]
    pub looping: bool,
    pub frames: Vec<FrameEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameEntry {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Seconds.
    pub duration: f32,
}

fn default_looping() -> bool {
    true
}

impl AnimationManifest {
    pub fn frames(&self) -> Vec<AnimationFrame> {
        self.frames
            .iter()
            .map(|frame| AnimationFrame {
                region: SourceRect::new(frame.x, frame.y, frame.width, frame.height),
                duration_seconds: frame.duration,
            })
            .collect()
    }
}
