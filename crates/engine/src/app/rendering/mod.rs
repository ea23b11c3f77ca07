mod canvas;
mod image;
mod renderer;
mod text;

pub use canvas::{Canvas, FrameCanvas, Rgba, ScreenRect, TEXT_BLOCK_PADDING};
pub use image::PixelImage;
pub use renderer::Renderer;
pub use text::{TextStyle, DEFAULT_TEXT_SCALE, GLYPH_ADVANCE, LINE_ADVANCE};
