use std::ops::Mul;

use super::Vec2;

/// 2D affine transform in the column layout used by immediate-mode canvases:
///
/// ```text
/// | a c e |
/// | b d f |
/// | 0 0 1 |
/// ```
///
/// `x' = a*x + c*y + e`, `y' = b*x + d*y + f`. `lhs * rhs` applies `rhs`
/// first, so a world transform is `parent_world * local`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine2 {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Affine2 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine2 {
    pub const IDENTITY: Affine2 = Affine2 {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translation(x: f32, y: f32) -> Self {
        Self {
            e: x,
            f: y,
            ..Self::IDENTITY
        }
    }

    pub fn rotation(radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn scaling(sx: f32, sy: f32) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    /// Local node transform. A point is shifted by `-offset` (pivot), then
    /// rotated, then scaled, then translated to `position`.
    pub fn from_components(position: Vec2, rotation: f32, scale: Vec2, offset: Vec2) -> Self {
        Self::translation(position.x, position.y)
            * Self::scaling(scale.x, scale.y)
            * Self::rotation(rotation)
            * Self::translation(-offset.x, -offset.y)
    }

    pub fn then(self, next: Affine2) -> Affine2 {
        next * self
    }

    pub fn transform_point(&self, p: Vec2) -> Vec2 {
        Vec2 {
            x: self.a * p.x + self.c * p.y + self.e,
            y: self.b * p.x + self.d * p.y + self.f,
        }
    }

    pub fn transform_vector(&self, v: Vec2) -> Vec2 {
        Vec2 {
            x: self.a * v.x + self.c * v.y,
            y: self.b * v.x + self.d * v.y,
        }
    }

    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    /// `None` for degenerate transforms (zero scale on any axis).
    pub fn inverse(&self) -> Option<Affine2> {
        let det = self.determinant();
        if det.abs() <= f32::EPSILON {
            return None;
        }
        let inv = det.recip();
        Some(Affine2 {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }

    pub fn translation_part(&self) -> Vec2 {
        Vec2::new(self.e, self.f)
    }

    pub fn approx_eq(&self, other: &Affine2, epsilon: f32) -> bool {
        (self.a - other.a).abs() <= epsilon
            && (self.b - other.b).abs() <= epsilon
            && (self.c - other.c).abs() <= epsilon
            && (self.d - other.d).abs() <= epsilon
            && (self.e - other.e).abs() <= epsilon
            && (self.f - other.f).abs() <= epsilon
    }
}

impl Mul for Affine2 {
    type Output = Affine2;

    fn mul(self, rhs: Affine2) -> Affine2 {
        Affine2 {
            a: self.a * rhs.a + self.c * rhs.b,
            b: self.b * rhs.a + self.d * rhs.b,
            c: self.a * rhs.c + self.c * rhs.d,
            d: self.b * rhs.c + self.d * rhs.d,
            e: self.a * rhs.e + self.c * rhs.f + self.e,
            f: self.b * rhs.e + self.d * rhs.f + self.f,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    fn approx_eq_vec2(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < 1e-4 && (a.y - b.y).abs() < 1e-4
    }

    #[test]
    fn multiplication_applies_rhs_first() {
        let m = Affine2::translation(10.0, 0.0) * Affine2::scaling(2.0, 2.0);
        let p = m.transform_point(Vec2::new(1.0, 1.0));
        assert!(approx_eq_vec2(p, Vec2::new(12.0, 2.0)));
        assert!(m.approx_eq(&Affine2::scaling(2.0, 2.0).then(Affine2::translation(10.0, 0.0)), 1e-6));
    }

    #[test]
    fn components_pivot_rotate_scale_translate() {
        let m = Affine2::from_components(
            Vec2::new(100.0, 50.0),
            FRAC_PI_2,
            Vec2::new(2.0, 3.0),
            Vec2::new(1.0, 0.0),
        );
        // pivot maps onto position
        assert!(approx_eq_vec2(m.transform_point(Vec2::new(1.0, 0.0)), Vec2::new(100.0, 50.0)));
        // (2,0) -> pivot (1,0) -> rotate (0,1) -> scale (0,3) -> translate
        assert!(approx_eq_vec2(m.transform_point(Vec2::new(2.0, 0.0)), Vec2::new(100.0, 53.0)));
    }

    #[test]
    fn inverse_round_trips_points() {
        let m = Affine2::from_components(
            Vec2::new(-4.0, 9.0),
            0.7,
            Vec2::new(1.5, 0.5),
            Vec2::new(3.0, 2.0),
        );
        let inv = m.inverse().expect("invertible");
        let p = Vec2::new(12.5, -3.25);
        assert!(approx_eq_vec2(inv.transform_point(m.transform_point(p)), p));
        assert!((m * inv).approx_eq(&Affine2::IDENTITY, 1e-4));
    }

    #[test]
    fn zero_scale_has_no_inverse() {
        assert!(Affine2::scaling(0.0, 1.0).inverse().is_none());
    }

    #[test]
    fn vectors_ignore_translation() {
        let m = Affine2::translation(5.0, 5.0) * Affine2::scaling(2.0, 1.0);
        assert!(approx_eq_vec2(m.transform_vector(Vec2::new(1.0, 1.0)), Vec2::new(2.0, 1.0)));
    }
}
