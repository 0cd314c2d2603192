//! Stateless time-to-value curves. `t` is normalized progress; inputs outside
//! [0, 1] are clamped so callers can feed raw `Timer::progress` values.

use std::f32::consts::FRAC_PI_2;

fn clamp01(t: f32) -> f32 {
    if t.is_nan() {
        return 0.0;
    }
    t.clamp(0.0, 1.0)
}

pub fn lerp(t: f32, from: f32, to: f32) -> f32 {
    from + (to - from) * clamp01(t)
}

/// Starts slow, ends fast.
pub fn sin_lerp_in(t: f32, from: f32, to: f32) -> f32 {
    let t = clamp01(t);
    from + (to - from) * (1.0 - (t * FRAC_PI_2).cos())
}

/// Starts fast, ends slow.
pub fn sin_lerp_out(t: f32, from: f32, to: f32) -> f32 {
    let t = clamp01(t);
    from + (to - from) * (t * FRAC_PI_2).sin()
}

pub fn sin_lerp_in_out(t: f32, from: f32, to: f32) -> f32 {
    let t = clamp01(t);
    from + (to - from) * (0.5 - 0.5 * (t * std::f32::consts::PI).cos())
}

pub fn quad_in(t: f32, from: f32, to: f32) -> f32 {
    let t = clamp01(t);
    from + (to - from) * t * t
}

pub fn quad_out(t: f32, from: f32, to: f32) -> f32 {
    let t = clamp01(t);
    from + (to - from) * t * (2.0 - t)
}

/// Overshoots past `to` and settles back. Used for pop-in effects.
pub fn back_out(t: f32, from: f32, to: f32) -> f32 {
    const OVERSHOOT: f32 = 1.70158;
    let t = clamp01(t) - 1.0;
    from + (to - from) * (t * t * ((OVERSHOOT + 1.0) * t + OVERSHOOT) + 1.0)
}

/// Rises to `to` at the midpoint and returns to `from`.
pub fn pulse(t: f32, from: f32, to: f32) -> f32 {
    let t = clamp01(t);
    from + (to - from) * (t * std::f32::consts::PI).sin()
}
