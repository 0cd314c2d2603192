use super::font::{glyph_advance, glyph_rows, GLYPH_WIDTH};
use super::{Color, DrawMode, DrawSurface, ImageData, SourceRect};
use crate::math::{Affine2, Rect, Vec2};

/// Software rasterizer over an RGBA8 frame such as the one `pixels` hands
/// out each frame. All writes are clipped to the frame.
pub struct FrameSurface<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
    transform: Affine2,
    alpha: f32,
    mode: DrawMode,
}

impl<'a> FrameSurface<'a> {
    /// Returns `None` when the buffer is smaller than `width * height * 4`.
    pub fn new(frame: &'a mut [u8], width: u32, height: u32) -> Option<Self> {
        let required = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        if frame.len() < required {
            return None;
        }
        Some(Self {
            frame,
            width,
            height,
            transform: Affine2::IDENTITY,
            alpha: 1.0,
            mode: DrawMode::Normal,
        })
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.frame.get(offset..offset + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    fn blend_pixel(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let alpha = (color[3] as f32 / 255.0) * self.alpha;
        if alpha <= 0.0 {
            return;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let Some(dst) = self.frame.get_mut(offset..offset + 4) else {
            return;
        };
        match self.mode {
            DrawMode::Normal => {
                let inv = 1.0 - alpha;
                for channel in 0..3 {
                    let blended = color[channel] as f32 * alpha + dst[channel] as f32 * inv;
                    dst[channel] = blended.round().clamp(0.0, 255.0) as u8;
                }
                let out_alpha = alpha * 255.0 + dst[3] as f32 * inv;
                dst[3] = out_alpha.round().clamp(0.0, 255.0) as u8;
            }
            DrawMode::Additive => {
                for channel in 0..3 {
                    let added = dst[channel] as f32 + color[channel] as f32 * alpha;
                    dst[channel] = added.round().min(255.0) as u8;
                }
                dst[3] = dst[3].max((alpha * 255.0).round() as u8);
            }
        }
    }

    /// Pixel rows and columns whose centers may lie inside `points`.
    fn clipped_bounds(&self, points: &[Vec2]) -> Option<(i32, i32, i32, i32)> {
        let mut min_x = f32::INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        for p in points {
            if !p.x.is_finite() || !p.y.is_finite() {
                return None;
            }
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        let left = (min_x.floor() as i32).max(0);
        let top = (min_y.floor() as i32).max(0);
        let right = (max_x.ceil() as i32).min(self.width as i32);
        let bottom = (max_y.ceil() as i32).min(self.height as i32);
        if left >= right || top >= bottom {
            return None;
        }
        Some((left, top, right, bottom))
    }

    /// Even-odd scanline fill of a polygon already in surface space.
    fn fill_polygon_surface(&mut self, points: &[Vec2], color: Color) {
        if points.len() < 3 {
            return;
        }
        let Some((left, top, right, bottom)) = self.clipped_bounds(points) else {
            return;
        };
        let mut crossings: Vec<f32> = Vec::with_capacity(points.len());
        for py in top..bottom {
            let sample_y = py as f32 + 0.5;
            crossings.clear();
            for i in 0..points.len() {
                let a = points[i];
                let b = points[(i + 1) % points.len()];
                if (a.y <= sample_y) == (b.y <= sample_y) {
                    continue;
                }
                let t = (sample_y - a.y) / (b.y - a.y);
                crossings.push(a.x + t * (b.x - a.x));
            }
            crossings.sort_by(f32::total_cmp);
            for span in crossings.chunks_exact(2) {
                // pixel centers inside [span0, span1)
                let start = ((span[0] - 0.5).ceil() as i32).max(left);
                let end = ((span[1] - 0.5).ceil() as i32).min(right);
                for px in start..end {
                    self.blend_pixel(px, py, color);
                }
            }
        }
    }

    fn stroke_segments_surface(&mut self, points: &[Vec2], closed: bool, color: Color, width: f32) {
        if points.len() < 2 {
            return;
        }
        let half = (width * 0.5).max(0.5);
        let segment_count = if closed { points.len() } else { points.len() - 1 };
        for i in 0..segment_count {
            let a = points[i];
            let b = points[(i + 1) % points.len()];
            let dir = (b - a).normalize();
            if dir == Vec2::ZERO {
                continue;
            }
            let normal = Vec2::new(-dir.y, dir.x) * half;
            // extend along the segment so corners join without gaps
            let a = a - dir * half;
            let b = b + dir * half;
            self.fill_polygon_surface(&[a + normal, b + normal, b - normal, a - normal], color);
        }
    }

    fn line_scale(&self) -> f32 {
        self.transform.determinant().abs().sqrt()
    }
}

impl DrawSurface for FrameSurface<'_> {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn set_transform(&mut self, transform: Affine2) {
        self.transform = transform;
    }

    fn transform(&self) -> Affine2 {
        self.transform
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.alpha = if alpha.is_nan() { 0.0 } else { alpha.clamp(0.0, 1.0) };
    }

    fn set_draw_mode(&mut self, mode: DrawMode) {
        self.mode = mode;
    }

    fn clear(&mut self, color: Color) {
        let len = self.width as usize * self.height as usize * 4;
        for chunk in self.frame[..len].chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let corners = rect.corners().map(|p| self.transform.transform_point(p));
        self.fill_polygon_surface(&corners, color);
    }

    fn draw_image(&mut self, image: &ImageData, src: SourceRect, dst: Rect) {
        if src.width == 0 || src.height == 0 || dst.width == 0.0 || dst.height == 0.0 {
            return;
        }
        if !src.fits_within(image) {
            return;
        }
        let placement = self.transform
            * Affine2::translation(dst.x, dst.y)
            * Affine2::scaling(dst.width / src.width as f32, dst.height / src.height as f32);
        let Some(inverse) = placement.inverse() else {
            return;
        };
        let corners = Rect::from_size(src.width as f32, src.height as f32)
            .corners()
            .map(|p| placement.transform_point(p));
        let Some((left, top, right, bottom)) = self.clipped_bounds(&corners) else {
            return;
        };

        for py in top..bottom {
            for px in left..right {
                let local = inverse.transform_point(Vec2::new(px as f32 + 0.5, py as f32 + 0.5));
                if local.x < 0.0 || local.y < 0.0 {
                    continue;
                }
                let u = local.x.floor() as u32;
                let v = local.y.floor() as u32;
                if u >= src.width || v >= src.height {
                    continue;
                }
                let Some(texel) = image.pixel(src.x + u, src.y + v) else {
                    continue;
                };
                if texel[3] == 0 {
                    continue;
                }
                self.blend_pixel(px, py, texel);
            }
        }
    }

    fn fill_path(&mut self, points: &[Vec2], color: Color) {
        let transformed: Vec<Vec2> = points
            .iter()
            .map(|p| self.transform.transform_point(*p))
            .collect();
        self.fill_polygon_surface(&transformed, color);
    }

    fn stroke_path(&mut self, points: &[Vec2], closed: bool, color: Color, line_width: f32) {
        let transformed: Vec<Vec2> = points
            .iter()
            .map(|p| self.transform.transform_point(*p))
            .collect();
        let width = line_width * self.line_scale();
        self.stroke_segments_surface(&transformed, closed, color, width);
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, scale: f32, color: Color) {
        if scale <= 0.0 {
            return;
        }
        let mut pen_x = x;
        for ch in text.chars() {
            let rows = glyph_rows(ch);
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                        continue;
                    }
                    let cell = Rect::new(
                        pen_x + col as f32 * scale,
                        y + row as f32 * scale,
                        scale,
                        scale,
                    );
                    self.fill_rect(cell, color);
                }
            }
            pen_x += glyph_advance(scale);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = [255, 0, 0, 255];
    const BLACK: Color = [0, 0, 0, 255];

    fn blank(width: u32, height: u32) -> Vec<u8> {
        vec![0; width as usize * height as usize * 4]
    }

    #[test]
    fn rejects_short_buffers() {
        let mut frame = vec![0; 10];
        assert!(FrameSurface::new(&mut frame, 4, 4).is_none());
    }

    #[test]
    fn fill_rect_covers_exact_pixels() {
        let mut frame = blank(8, 8);
        let mut surface = FrameSurface::new(&mut frame, 8, 8).expect("surface");
        surface.clear(BLACK);
        surface.fill_rect(Rect::new(2.0, 2.0, 3.0, 2.0), RED);
        assert_eq!(surface.pixel(2, 2), Some(RED));
        assert_eq!(surface.pixel(4, 3), Some(RED));
        assert_eq!(surface.pixel(5, 3), Some(BLACK));
        assert_eq!(surface.pixel(2, 4), Some(BLACK));
    }

    #[test]
    fn translated_rect_is_offset() {
        let mut frame = blank(8, 8);
        let mut surface = FrameSurface::new(&mut frame, 8, 8).expect("surface");
        surface.set_transform(Affine2::translation(4.0, 4.0));
        surface.fill_rect(Rect::from_size(2.0, 2.0), RED);
        assert_eq!(surface.pixel(4, 4), Some(RED));
        assert_eq!(surface.pixel(1, 1), Some([0, 0, 0, 0]));
    }

    #[test]
    fn half_alpha_blends_toward_source() {
        let mut frame = blank(2, 2);
        let mut surface = FrameSurface::new(&mut frame, 2, 2).expect("surface");
        surface.clear(BLACK);
        surface.set_alpha(0.5);
        surface.fill_rect(Rect::from_size(2.0, 2.0), RED);
        let px = surface.pixel(0, 0).expect("pixel");
        assert!((126..=129).contains(&px[0]));
        assert_eq!(px[1], 0);
    }

    #[test]
    fn additive_mode_saturates() {
        let mut frame = blank(1, 1);
        let mut surface = FrameSurface::new(&mut frame, 1, 1).expect("surface");
        surface.clear([200, 10, 0, 255]);
        surface.set_draw_mode(DrawMode::Additive);
        surface.fill_rect(Rect::from_size(1.0, 1.0), [100, 100, 0, 255]);
        assert_eq!(surface.pixel(0, 0), Some([255, 110, 0, 255]));
    }

    #[test]
    fn scaled_image_blit_uses_nearest_texels() {
        let image = ImageData::from_fn(2, 1, |x, _| if x == 0 { RED } else { [0, 0, 255, 255] });
        let mut frame = blank(4, 2);
        let mut surface = FrameSurface::new(&mut frame, 4, 2).expect("surface");
        surface.draw_image(&image, image.full_rect(), Rect::new(0.0, 0.0, 4.0, 2.0));
        assert_eq!(surface.pixel(0, 0), Some(RED));
        assert_eq!(surface.pixel(1, 1), Some(RED));
        assert_eq!(surface.pixel(2, 0), Some([0, 0, 255, 255]));
        assert_eq!(surface.pixel(3, 1), Some([0, 0, 255, 255]));
    }

    #[test]
    fn transparent_texels_are_skipped() {
        let image = ImageData::solid(2, 2, [9, 9, 9, 0]);
        let mut frame = blank(2, 2);
        let mut surface = FrameSurface::new(&mut frame, 2, 2).expect("surface");
        surface.clear(BLACK);
        surface.draw_image(&image, image.full_rect(), Rect::from_size(2.0, 2.0));
        assert_eq!(surface.pixel(1, 1), Some(BLACK));
    }

    #[test]
    fn offscreen_geometry_is_clipped_without_panic() {
        let mut frame = blank(4, 4);
        let mut surface = FrameSurface::new(&mut frame, 4, 4).expect("surface");
        surface.fill_rect(Rect::new(-100.0, -100.0, 50.0, 50.0), RED);
        surface.fill_rect(Rect::new(2.0, 2.0, 1000.0, 1000.0), RED);
        surface.stroke_path(
            &[Vec2::new(-5.0, 1.5), Vec2::new(50.0, 1.5)],
            false,
            RED,
            1.0,
        );
        assert_eq!(surface.pixel(3, 3), Some(RED));
        assert_eq!(surface.pixel(0, 1), Some(RED));
        assert_eq!(surface.pixel(0, 3), Some([0, 0, 0, 0]));
    }

    #[test]
    fn text_lights_glyph_cells() {
        let mut frame = blank(8, 8);
        let mut surface = FrameSurface::new(&mut frame, 8, 8).expect("surface");
        surface.fill_text("I", 0.0, 0.0, 1.0, RED);
        // 'I' top row is fully lit, second row only the middle column
        assert_eq!(surface.pixel(0, 0), Some(RED));
        assert_eq!(surface.pixel(2, 0), Some(RED));
        assert_eq!(surface.pixel(1, 1), Some(RED));
        assert_eq!(surface.pixel(0, 1), Some([0, 0, 0, 0]));
    }
}
