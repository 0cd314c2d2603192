use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::graphics::{Color, DrawSurface, FrameSurface};
use crate::math::Vec2;
use crate::scene::DrawStats;

/// Fixed-resolution framebuffer scaled onto the window by `pixels`.
pub(crate) struct Presenter {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    width: u32,
    height: u32,
}

impl Presenter {
    pub(crate) fn new(window: Arc<Window>, width: u32, height: u32) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = build_pixels(Arc::clone(&window), size.width, size.height, width, height)?;
        Ok(Self {
            window,
            pixels,
            width,
            height,
        })
    }

    /// Zero-sized windows (minimized) keep the previous surface.
    pub(crate) fn resize(&mut self, window_width: u32, window_height: u32) -> Result<(), Error> {
        if window_width == 0 || window_height == 0 {
            return Ok(());
        }
        self.pixels = build_pixels(
            Arc::clone(&self.window),
            window_width,
            window_height,
            self.width,
            self.height,
        )?;
        Ok(())
    }

    /// Window position to framebuffer pixel, `None` outside the letterboxed
    /// image.
    pub(crate) fn window_to_frame(&self, x: f32, y: f32) -> Option<Vec2> {
        self.pixels
            .window_pos_to_pixel((x, y))
            .ok()
            .map(|(px, py)| Vec2::new(px as f32 + 0.5, py as f32 + 0.5))
    }

    pub(crate) fn present(
        &mut self,
        clear: Color,
        draw: impl FnOnce(&mut FrameSurface<'_>) -> DrawStats,
    ) -> Result<DrawStats, Error> {
        let (width, height) = (self.width, self.height);
        let stats = match FrameSurface::new(self.pixels.frame_mut(), width, height) {
            Some(mut surface) => {
                surface.clear(clear);
                draw(&mut surface)
            }
            None => DrawStats::default(),
        };
        self.pixels.render()?;
        Ok(stats)
    }
}

fn build_pixels(
    window: Arc<Window>,
    window_width: u32,
    window_height: u32,
    width: u32,
    height: u32,
) -> Result<Pixels<'static>, Error> {
    let surface = SurfaceTexture::new(window_width, window_height, window);
    Pixels::new(width, height, surface)
}
