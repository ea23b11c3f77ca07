use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture, TextureError};
use winit::window::Window;

use super::FrameCanvas;
use crate::app::Scene;

/// Owns the pixel surface. The logical buffer size is fixed; window resizes
/// only rescale the presentation surface.
pub struct Renderer {
    pixels: Pixels<'static>,
    logical_width: u32,
    logical_height: u32,
}

impl Renderer {
    pub fn new(window: Arc<Window>, logical_width: u32, logical_height: u32) -> Result<Self, Error> {
        let size = window.inner_size();
        let surface = SurfaceTexture::new(size.width.max(1), size.height.max(1), window);
        let pixels = Pixels::new(logical_width, logical_height, surface)?;
        Ok(Self {
            pixels,
            logical_width,
            logical_height,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), TextureError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels.resize_surface(width, height)
    }

    pub fn logical_size(&self) -> (u32, u32) {
        (self.logical_width, self.logical_height)
    }

    pub(crate) fn render_scene(&mut self, scene: &mut dyn Scene) -> Result<(), Error> {
        let (width, height) = self.logical_size();
        {
            let mut canvas = FrameCanvas::new(self.pixels.frame_mut(), width, height);
            scene.render(&mut canvas);
        }
        self.pixels.render()
    }
}
