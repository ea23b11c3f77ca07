use super::{AudioService, Canvas, InputSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Quit,
}

/// A top-level scene driven by the fixed-step loop.
///
/// `update` runs once per simulation tick with that tick's input sample;
/// `render` runs once per presented frame and must not mutate game state.
pub trait Scene {
    fn load(&mut self, audio: &mut dyn AudioService);
    fn update(&mut self, input: &InputSnapshot, audio: &mut dyn AudioService) -> SceneCommand;
    fn render(&mut self, canvas: &mut dyn Canvas);
    fn unload(&mut self, audio: &mut dyn AudioService);
}
