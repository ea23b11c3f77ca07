mod audio;
mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;

#[cfg(feature = "audio")]
pub use audio::RodioAudio;
pub use audio::{AudioService, SilentAudio};
pub use input::{InputAction, InputSampler, InputSnapshot};
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use rendering::{
    Canvas, FrameCanvas, PixelImage, Renderer, Rgba, ScreenRect, TextStyle, DEFAULT_TEXT_SCALE,
    GLYPH_ADVANCE, LINE_ADVANCE, TEXT_BLOCK_PADDING,
};
pub use scene::{Scene, SceneCommand};
