use crate::graphics::{text_width, Color, DrawSurface, GLYPH_HEIGHT};
use crate::math::{easing, Rect, Vec2};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Bitmap-font label. The node position anchors the top edge; `align`
/// picks which horizontal point of the text sits on it.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSprite {
    pub text: String,
    pub color: Color,
    pub scale: f32,
    pub align: TextAlign,
    pub shadow: Option<Color>,
}

impl TextSprite {
    pub fn new(text: impl Into<String>, color: Color, scale: f32) -> Self {
        Self {
            text: text.into(),
            color,
            scale: scale.max(1.0),
            align: TextAlign::Left,
            shadow: None,
        }
    }

    pub fn aligned(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    pub fn with_shadow(mut self, shadow: Color) -> Self {
        self.shadow = Some(shadow);
        self
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(
            text_width(&self.text, self.scale),
            GLYPH_HEIGHT as f32 * self.scale,
        )
    }

    pub fn bounds(&self) -> Rect {
        let size = self.size();
        let x = match self.align {
            TextAlign::Left => 0.0,
            TextAlign::Center => -size.x * 0.5,
            TextAlign::Right => -size.x,
        };
        Rect::new(x, 0.0, size.x, size.y)
    }

    pub fn draw(&self, surface: &mut dyn DrawSurface) {
        let x = self.bounds().x;
        if let Some(shadow) = self.shadow {
            surface.fill_text(&self.text, x + self.scale, self.scale, self.scale, shadow);
        }
        surface.fill_text(&self.text, x, 0.0, self.scale, self.color);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ButtonState {
    #[default]
    Idle,
    Hover,
    Pressed,
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    None,
    Pressed,
    Clicked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonColors {
    pub idle: Color,
    pub hover: Color,
    pub pressed: Color,
    pub disabled: Color,
    pub border: Color,
    pub label: Color,
}

impl Default for ButtonColors {
    fn default() -> Self {
        Self {
            idle: [52, 64, 84, 255],
            hover: [72, 90, 118, 255],
            pressed: [32, 40, 54, 255],
            disabled: [48, 48, 48, 200],
            border: [220, 220, 200, 255],
            label: [250, 250, 240, 255],
        }
    }
}

/// Rectangular push button filling the node's size.
#[derive(Debug, Clone, PartialEq)]
pub struct SoftButton {
    pub label: String,
    pub colors: ButtonColors,
    pub label_scale: f32,
    enabled: bool,
    state: ButtonState,
    armed: bool,
    pointer_was_down: bool,
}

impl SoftButton {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            colors: ButtonColors::default(),
            label_scale: 2.0,
            enabled: true,
            state: ButtonState::Idle,
            armed: false,
            pointer_was_down: false,
        }
    }

    pub fn state(&self) -> ButtonState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.armed = false;
        self.state = if enabled {
            ButtonState::Idle
        } else {
            ButtonState::Disabled
        };
    }

    /// Feeds one pointer sample in button-local coordinates (`None` when the
    /// pointer is outside the window or the node cannot be inverted).
    /// `Clicked` fires on release inside after a press that began inside.
    pub fn handle_pointer(&mut self, local: Option<Vec2>, down: bool, size: Vec2) -> ButtonEvent {
        let pressed_edge = down && !self.pointer_was_down;
        let released_edge = !down && self.pointer_was_down;
        self.pointer_was_down = down;

        if !self.enabled {
            self.state = ButtonState::Disabled;
            return ButtonEvent::None;
        }

        let inside = local.is_some_and(|p| Rect::from_size(size.x, size.y).contains(p));
        let mut event = ButtonEvent::None;
        if pressed_edge && inside {
            self.armed = true;
            event = ButtonEvent::Pressed;
        }
        if released_edge {
            if self.armed && inside {
                event = ButtonEvent::Clicked;
            }
            self.armed = false;
        }

        self.state = match (inside, self.armed) {
            (true, true) => ButtonState::Pressed,
            (true, false) => ButtonState::Hover,
            (false, _) => ButtonState::Idle,
        };
        event
    }

    pub fn draw(&self, surface: &mut dyn DrawSurface, size: Vec2) {
        let fill = match self.state {
            ButtonState::Idle => self.colors.idle,
            ButtonState::Hover => self.colors.hover,
            ButtonState::Pressed => self.colors.pressed,
            ButtonState::Disabled => self.colors.disabled,
        };
        let rect = Rect::from_size(size.x, size.y);
        surface.fill_rect(rect, fill);
        surface.stroke_rect(rect, self.colors.border, 1.0);

        let label_w = text_width(&self.label, self.label_scale);
        let label_h = GLYPH_HEIGHT as f32 * self.label_scale;
        let x = ((size.x - label_w) * 0.5).round();
        let y = ((size.y - label_h) * 0.5).round();
        surface.fill_text(&self.label, x, y, self.label_scale, self.colors.label);
    }
}

/// Solid rectangle covering the node's size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorLayer {
    pub color: Color,
}

impl ColorLayer {
    pub fn new(color: Color) -> Self {
        Self { color }
    }

    pub fn draw(&self, surface: &mut dyn DrawSurface, size: Vec2) {
        surface.fill_rect(Rect::from_size(size.x, size.y), self.color);
    }
}

const MARKER_PULSE_SECONDS: f32 = 1.2;

/// Placement highlight for one map tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileMarker {
    pub valid: bool,
    pub valid_color: Color,
    pub invalid_color: Color,
    phase: f32,
}

impl Default for TileMarker {
    fn default() -> Self {
        Self {
            valid: true,
            valid_color: [90, 220, 120, 255],
            invalid_color: [230, 70, 60, 255],
            phase: 0.0,
        }
    }
}

impl TileMarker {
    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn update(&mut self, sync: f32) {
        if sync.is_finite() && sync > 0.0 {
            self.phase = (self.phase + sync / MARKER_PULSE_SECONDS).fract();
        }
    }

    pub fn color(&self) -> Color {
        if self.valid {
            self.valid_color
        } else {
            self.invalid_color
        }
    }

    /// Fill alpha rises and falls once per pulse.
    pub fn fill_alpha(&self) -> u8 {
        easing::pulse(self.phase, 40.0, 120.0).round() as u8
    }

    pub fn draw(&self, surface: &mut dyn DrawSurface, size: Vec2) {
        let [r, g, b, _] = self.color();
        let rect = Rect::from_size(size.x, size.y);
        surface.fill_rect(rect, [r, g, b, self.fill_alpha()]);
        surface.stroke_rect(rect.inflate(-1.0), self.color(), 2.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::{DrawOp, RecordingSurface};

    const SIZE: Vec2 = Vec2::new(40.0, 20.0);

    #[test]
    fn click_requires_press_and_release_inside() {
        let mut button = SoftButton::new("GO");
        let inside = Some(Vec2::new(5.0, 5.0));
        assert_eq!(button.handle_pointer(inside, false, SIZE), ButtonEvent::None);
        assert_eq!(button.state(), ButtonState::Hover);
        assert_eq!(button.handle_pointer(inside, true, SIZE), ButtonEvent::Pressed);
        assert_eq!(button.state(), ButtonState::Pressed);
        assert_eq!(button.handle_pointer(inside, false, SIZE), ButtonEvent::Clicked);
        assert_eq!(button.state(), ButtonState::Hover);
    }

    #[test]
    fn release_outside_cancels_click() {
        let mut button = SoftButton::new("GO");
        button.handle_pointer(Some(Vec2::new(5.0, 5.0)), true, SIZE);
        let event = button.handle_pointer(Some(Vec2::new(50.0, 5.0)), false, SIZE);
        assert_eq!(event, ButtonEvent::None);
        assert_eq!(button.state(), ButtonState::Idle);
    }

    #[test]
    fn press_that_started_outside_never_clicks() {
        let mut button = SoftButton::new("GO");
        button.handle_pointer(Some(Vec2::new(-3.0, 5.0)), true, SIZE);
        let event = button.handle_pointer(Some(Vec2::new(5.0, 5.0)), false, SIZE);
        assert_eq!(event, ButtonEvent::None);
    }

    #[test]
    fn disabled_button_ignores_pointer() {
        let mut button = SoftButton::new("GO");
        button.set_enabled(false);
        let inside = Some(Vec2::new(5.0, 5.0));
        button.handle_pointer(inside, true, SIZE);
        assert_eq!(button.handle_pointer(inside, false, SIZE), ButtonEvent::None);
        assert_eq!(button.state(), ButtonState::Disabled);
    }

    #[test]
    fn text_alignment_shifts_bounds() {
        let text = TextSprite::new("ABC", [255; 4], 1.0);
        assert_eq!(text.bounds(), Rect::new(0.0, 0.0, 11.0, 5.0));
        let centered = text.clone().aligned(TextAlign::Center);
        assert_eq!(centered.bounds().x, -5.5);
        let right = text.aligned(TextAlign::Right);
        assert_eq!(right.bounds().x, -11.0);
    }

    #[test]
    fn shadow_paints_before_text() {
        let text = TextSprite::new("HI", [255; 4], 2.0).with_shadow([0, 0, 0, 255]);
        let mut surface = RecordingSurface::new(32, 32);
        text.draw(&mut surface);
        let colors: Vec<_> = surface
            .commands()
            .iter()
            .filter_map(|c| match &c.op {
                DrawOp::Text { color, .. } => Some(*color),
                _ => None,
            })
            .collect();
        assert_eq!(colors, vec![[0, 0, 0, 255], [255; 4]]);
    }

    #[test]
    fn marker_pulse_wraps_phase() {
        let mut marker = TileMarker::default();
        marker.update(MARKER_PULSE_SECONDS * 0.5);
        assert_eq!(marker.fill_alpha(), 120);
        marker.update(MARKER_PULSE_SECONDS * 0.5);
        assert!(marker.phase() < 1e-4);
        assert_eq!(marker.fill_alpha(), 40);
        marker.valid = false;
        assert_eq!(marker.color(), marker.invalid_color);
    }
}
